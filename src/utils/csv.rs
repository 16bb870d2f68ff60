use chrono::DateTime;

use crate::models::visitor::Visitor;

/// CSV column order for the visitor export. Fixed; the dashboard and any
/// downstream spreadsheets rely on it.
pub const EXPORT_COLUMNS: [&str; 18] = [
    "Timestamp",
    "IP Address",
    "Country",
    "City",
    "Region",
    "Timezone",
    "Device Type",
    "Browser",
    "Browser Version",
    "OS",
    "OS Version",
    "ISP",
    "Platform",
    "Language",
    "Screen Resolution",
    "Viewport",
    "Referrer",
    "Page URL",
];

/// Quote a field when it contains a separator, quote, or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

pub fn header_row() -> String {
    write_row(&EXPORT_COLUMNS)
}

/// Format a visit timestamp for export, UTC.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// One export row. Absent fields become empty cells, not "Unknown".
pub fn visitor_row(visitor: &Visitor) -> String {
    let timestamp = format_timestamp(visitor.created_at);
    let cell = |v: &Option<String>| v.clone().unwrap_or_default();

    write_row(&[
        &timestamp,
        &cell(&visitor.ip_address),
        &cell(&visitor.country),
        &cell(&visitor.city),
        &cell(&visitor.region),
        &cell(&visitor.timezone),
        &cell(&visitor.device_type),
        &cell(&visitor.browser),
        &cell(&visitor.browser_version),
        &cell(&visitor.os),
        &cell(&visitor.os_version),
        &cell(&visitor.isp),
        &cell(&visitor.platform),
        &cell(&visitor.language),
        &cell(&visitor.screen_resolution),
        &cell(&visitor.viewport),
        &cell(&visitor.referrer),
        &cell(&visitor.page_url),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::track_request::TrackVisitorRequest;

    fn sample_visitor() -> Visitor {
        let req = TrackVisitorRequest {
            country: Some("USA".to_string()),
            city: Some("Austin, TX".to_string()),
            isp: Some("Example \"Fiber\"".to_string()),
            ..Default::default()
        };
        Visitor::from_request(req, "203.0.113.7".to_string())
    }

    #[test]
    fn header_has_exactly_18_columns() {
        let header = header_row();
        assert_eq!(header.trim_end().split(',').count(), 18);
        assert!(header.starts_with("Timestamp,IP Address,"));
        assert!(header.trim_end().ends_with("Referrer,Page URL"));
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        let row = visitor_row(&sample_visitor());
        assert!(row.contains("\"Austin, TX\""));
        assert!(row.contains("\"Example \"\"Fiber\"\"\""));
    }

    #[test]
    fn missing_fields_are_empty_cells() {
        let visitor = Visitor::from_request(
            TrackVisitorRequest::default(),
            "203.0.113.7".to_string(),
        );
        let row = visitor_row(&visitor);
        // timestamp + ip present, all 16 remaining cells empty
        assert!(row.trim_end().ends_with(",,,,,,,,,,,,,,,,"));
    }

    #[test]
    fn timestamp_format_matches_export_contract() {
        // 2026-01-05 12:34:56 UTC
        let millis = 1_767_616_496_000;
        assert_eq!(format_timestamp(millis), "2026-01-05 12:34:56");
    }
}
