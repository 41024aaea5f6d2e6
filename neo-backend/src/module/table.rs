//! HTML table view of flattened records

use neo_core::ApproachRecord;
use std::fmt::Write;

const COLUMNS: [&str; 5] = [
    "id",
    "name",
    "close_approach_date",
    "miss_distance_km",
    "velocity_kph",
];

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NaN".to_string(),
    }
}

/// Render records as a data-frame style table with a leading row index.
pub fn render_table(records: &[ApproachRecord]) -> String {
    let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n  <thead>\n    <tr style=\"text-align: right;\">\n      <th></th>\n");
    for column in COLUMNS {
        let _ = writeln!(html, "      <th>{}</th>", column);
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for (index, record) in records.iter().enumerate() {
        let cells = [
            escape_html(&record.id),
            escape_html(&record.name),
            escape_html(&record.close_approach_date),
            format_number(record.miss_distance_km),
            format_number(record.velocity_kph),
        ];

        html.push_str("    <tr>\n");
        let _ = writeln!(html, "      <th>{}</th>", index);
        for cell in cells {
            let _ = writeln!(html, "      <td>{}</td>", cell);
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}
