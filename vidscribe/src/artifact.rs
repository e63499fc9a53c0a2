//! Downloadable transcript artifacts: table rows, CSV bytes, flattened text.

use crate::types::TimedLine;

/// Derived representations of one transcript. Pure data, no error conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Ordered `(formatted start, text)` rows.
    pub table: Vec<(String, String)>,
    /// UTF-8 CSV with header `start,text`, one row per segment, no index
    /// column.
    pub csv: Vec<u8>,
    /// Segment texts concatenated in order, no separator inserted.
    pub text: String,
}

/// Build all artifacts from ordered timed lines.
pub fn build(lines: &[TimedLine]) -> Artifacts {
    let table: Vec<(String, String)> = lines
        .iter()
        .map(|l| (format_clock(l.start_secs), l.text.clone()))
        .collect();

    let mut csv = String::from("start,text\n");
    for (start, text) in &table {
        // The start column is always H:MM:SS, never needs quoting
        csv.push_str(start);
        csv.push(',');
        push_csv_field(&mut csv, text);
        csv.push('\n');
    }

    let text = lines.iter().map(|l| l.text.as_str()).collect();

    Artifacts {
        table,
        csv: csv.into_bytes(),
        text,
    }
}

/// Format whole seconds as `H:MM:SS`, hours unpadded.
pub fn format_clock(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h}:{m:02}:{s:02}")
}

/// Append a CSV field with minimal quoting: quote only when the field
/// contains a delimiter, quote, or line break; embedded quotes are doubled.
fn push_csv_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
