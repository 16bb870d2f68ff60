use crate::models::visitor::Visitor;
use crate::structs::analytics_response::{
    ChartDataResponse, IspsResponse, LocationsResponse, StatsResponse, VisitorPage,
};
use crate::utils::csv::format_timestamp;

/// Everything the dashboard currently knows, passed explicitly into the
/// render functions. A section that failed to refresh keeps its previous
/// value.
#[derive(Default)]
pub struct RenderState {
    pub stats: Option<StatsResponse>,
    pub visitors: Option<VisitorPage>,
    pub locations: Option<LocationsResponse>,
    pub charts: Option<ChartDataResponse>,
    pub isps: Option<IspsResponse>,
    /// Local row filter, applied at render time. Independent of the
    /// server-side search.
    pub filter: String,
}

fn display(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("Unknown")
}

/// Case-insensitive substring match over the fields shown in the table.
pub fn filter_rows<'a>(visitors: &'a [Visitor], term: &str) -> Vec<&'a Visitor> {
    if term.is_empty() {
        return visitors.iter().collect();
    }
    let needle = term.to_lowercase();
    visitors
        .iter()
        .filter(|v| {
            [
                &v.ip_address,
                &v.country,
                &v.city,
                &v.browser,
                &v.os,
                &v.isp,
            ]
            .into_iter()
            .any(|field| {
                field
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
        })
        .collect()
}

/// A proportional bar for the terminal charts, `width` cells at max count.
pub fn bar(count: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((count as f64 / max as f64) * width as f64).round() as usize;
    "#".repeat(filled.min(width))
}

pub fn render_overview(state: &RenderState) {
    let Some(stats) = &state.stats else { return };
    println!("== Overview ==");
    println!(
        "  visitors: {}  growth: {}{}%  countries: {}",
        stats.total_visitors,
        if stats.growth > 0.0 { "+" } else { "" },
        stats.growth,
        stats.countries
    );
    println!(
        "  desktop: {}  mobile: {}  tablet: {}",
        stats.desktop_users, stats.mobile_users, stats.tablet_users
    );
}

pub fn render_visitors(state: &RenderState) {
    let Some(page) = &state.visitors else { return };
    let rows = filter_rows(&page.data, &state.filter);
    println!(
        "== Visitors (page {}/{}, {} of {} shown) ==",
        page.current_page,
        page.last_page,
        rows.len(),
        page.total
    );
    for visitor in rows {
        println!(
            "  {}  {:<15}  {:<12}  {:<10}  {}",
            format_timestamp(visitor.created_at),
            display(&visitor.ip_address),
            display(&visitor.country),
            display(&visitor.browser),
            display(&visitor.os),
        );
    }
}

pub fn render_locations(state: &RenderState) {
    let Some(locations) = &state.locations else { return };
    println!("== Top locations ==");
    for location in &locations.locations {
        let pct = if locations.total > 0 {
            location.count as f64 / locations.total as f64 * 100.0
        } else {
            0.0
        };
        println!("  {:<20} {:>6}  {:.1}%", location.country, location.count, pct);
    }
}

pub fn render_charts(state: &RenderState) {
    let Some(charts) = &state.charts else { return };

    println!("== Last 7 days ==");
    let max = charts.trends.iter().map(|t| t.count).max().unwrap_or(0);
    for point in &charts.trends {
        println!("  {} {:>5}  {}", point.date, point.count, bar(point.count, max, 30));
    }

    println!("== Devices ==");
    for device in &charts.devices {
        println!("  {:<10} {:>6}", device.device_type, device.count);
    }

    println!("== Browsers ==");
    for browser in &charts.browsers {
        println!("  {:<10} {:>6}", browser.browser, browser.count);
    }

    println!("== Operating systems ==");
    for os in &charts.oses {
        println!("  {:<10} {:>6}", os.os, os.count);
    }
}

pub fn render_isps(state: &RenderState) {
    let Some(isps) = &state.isps else { return };
    println!("== Top ISPs ==");
    for isp in &isps.isps {
        println!("  {:<30} {:>6}", isp.isp, isp.count);
    }
}

/// Redraw every section from the current state.
pub fn render_all(state: &RenderState) {
    render_overview(state);
    render_visitors(state);
    render_locations(state);
    render_charts(state);
    render_isps(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::track_request::TrackVisitorRequest;

    fn visitor(country: &str, browser: &str) -> Visitor {
        let req = TrackVisitorRequest {
            country: Some(country.to_string()),
            browser: Some(browser.to_string()),
            ..Default::default()
        };
        Visitor::from_request(req, "203.0.113.7".to_string())
    }

    #[test]
    fn empty_filter_keeps_all_rows() {
        let rows = vec![visitor("USA", "Chrome"), visitor("France", "Firefox")];
        assert_eq!(filter_rows(&rows, "").len(), 2);
    }

    #[test]
    fn filter_matches_case_insensitively_across_fields() {
        let rows = vec![visitor("USA", "Chrome"), visitor("France", "Firefox")];
        assert_eq!(filter_rows(&rows, "fraNCE").len(), 1);
        assert_eq!(filter_rows(&rows, "fox").len(), 1);
        assert_eq!(filter_rows(&rows, "203.0").len(), 2); // ip matches both
        assert_eq!(filter_rows(&rows, "nohit").len(), 0);
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(10, 10, 30).len(), 30);
        assert_eq!(bar(5, 10, 30).len(), 15);
        assert_eq!(bar(0, 10, 30).len(), 0);
        assert_eq!(bar(0, 0, 30), "");
    }
}
