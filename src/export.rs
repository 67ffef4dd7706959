//! CSV export of the report table.
//!
//! Column order is fixed and every field value is HTML-entity escaped
//! before CSV quoting. The HTML escaping of CSV cells is the established
//! output format of this system and is kept as-is.

use crate::report::Report;

pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Category",
    "Location",
    "Status",
    "Created At",
    "Description",
    "Image URL",
];

/// Render all reports as a CSV document: one header row plus one row per
/// report, CRLF terminated.
pub fn render_csv(reports: &[Report]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|s| s.to_string()));

    for report in reports {
        push_row(
            &mut out,
            [
                report.id.clone(),
                report
                    .category
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
                report.location.clone().unwrap_or_default(),
                report.status.as_str().to_string(),
                report.created_at.to_rfc3339(),
                report.description.clone(),
                report.image_url.clone().unwrap_or_default(),
            ]
            .into_iter(),
        );
    }

    out
}

fn push_row(out: &mut String, values: impl Iterator<Item = String>) {
    let row: Vec<String> = values.map(|v| csv_field(&html_escape(&v))).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// HTML-entity escape `& < > " '`.
pub fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
