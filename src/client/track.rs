use log::{info, warn};

use crate::client::device::parse_user_agent;
use crate::client::geo::resolve_location;
use crate::structs::track_request::TrackVisitorRequest;

/// Enrich and submit one tracking event. Fire-and-forget: every failure is
/// logged and swallowed; enrichment failures degrade to "Unknown" fields
/// and the submission still goes out.
pub async fn submit_visit(
    http: &reqwest::Client,
    base_url: &str,
    user_agent: &str,
    page_url: &str,
) {
    let device = parse_user_agent(user_agent);
    let location = resolve_location(http).await;

    let payload = TrackVisitorRequest {
        ip_address: Some(location.ip),
        country: Some(location.country),
        city: Some(location.city),
        region: Some(location.region),
        timezone: Some(location.timezone),
        isp: Some(location.isp),
        latitude: location.latitude,
        longitude: location.longitude,
        device_type: Some(device.device_type),
        browser: Some(device.browser),
        browser_version: Some(device.browser_version),
        os: Some(device.os),
        os_version: Some(device.os_version),
        platform: Some(std::env::consts::OS.to_string()),
        language: std::env::var("LANG").ok(),
        screen_resolution: None,
        viewport: None,
        user_agent: Some(user_agent.to_string()),
        referrer: None,
        page_url: Some(page_url.to_string()),
    };

    let result = http
        .post(format!("{}/api/track-visitor", base_url))
        .json(&payload)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            info!("visit tracked");
        }
        Ok(response) => warn!("visit tracking rejected: {}", response.status()),
        Err(e) => warn!("visit tracking failed: {}", e),
    }
}
