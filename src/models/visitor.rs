use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::structs::track_request::TrackVisitorRequest;

/// One recorded visit. Documents are write-once: inserted by the tracking
/// endpoint and never updated or deleted afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Visitor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub created_at: i64, // When the visit occurred (UTC millis)
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_type: Option<String>, // Desktop / Mobile / Tablet / Unknown
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub screen_resolution: Option<String>, // "WxH"
    pub viewport: Option<String>,          // "WxH"
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub page_url: Option<String>,
}

impl Visitor {
    /// Build a new document from a validated tracking payload. `fallback_ip`
    /// is the caller's observed network address, used when the payload
    /// carries no ip_address of its own.
    pub fn from_request(req: TrackVisitorRequest, fallback_ip: String) -> Self {
        let ip_address = match req.ip_address {
            Some(ip) if !ip.is_empty() => Some(ip),
            _ => Some(fallback_ip),
        };

        Self {
            id: None,
            created_at: chrono::Utc::now().timestamp_millis(),
            ip_address,
            country: req.country,
            city: req.city,
            region: req.region,
            timezone: req.timezone,
            isp: req.isp,
            latitude: req.latitude,
            longitude: req.longitude,
            device_type: req.device_type,
            browser: req.browser,
            browser_version: req.browser_version,
            os: req.os,
            os_version: req.os_version,
            platform: req.platform,
            language: req.language,
            screen_resolution: req.screen_resolution,
            viewport: req.viewport,
            user_agent: req.user_agent,
            referrer: req.referrer,
            page_url: req.page_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_takes_caller_ip() {
        let visitor =
            Visitor::from_request(TrackVisitorRequest::default(), "203.0.113.7".to_string());
        assert_eq!(visitor.ip_address.as_deref(), Some("203.0.113.7"));
        assert!(visitor.country.is_none());
        assert!(visitor.latitude.is_none());
        assert!(visitor.created_at > 0);
    }

    #[test]
    fn payload_ip_wins_over_caller_ip() {
        let req = TrackVisitorRequest {
            ip_address: Some("198.51.100.4".to_string()),
            ..Default::default()
        };
        let visitor = Visitor::from_request(req, "203.0.113.7".to_string());
        assert_eq!(visitor.ip_address.as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn empty_string_ip_is_replaced() {
        let req = TrackVisitorRequest {
            ip_address: Some(String::new()),
            ..Default::default()
        };
        let visitor = Visitor::from_request(req, "203.0.113.7".to_string());
        assert_eq!(visitor.ip_address.as_deref(), Some("203.0.113.7"));
    }
}
