use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::{Validate, ValidationErrors};

/// Inbound tracking payload. Every field is optional; an empty body is a
/// valid visit carrying nothing but the caller's address.
#[derive(Deserialize, Serialize, Validate, Default, Debug, Clone)]
pub struct TrackVisitorRequest {
    #[validate(length(max = 45, message = "must not exceed 45 characters"))]
    pub ip_address: Option<String>,
    #[validate(length(max = 255, message = "must not exceed 255 characters"))]
    pub country: Option<String>,
    #[validate(length(max = 255, message = "must not exceed 255 characters"))]
    pub city: Option<String>,
    #[validate(length(max = 255, message = "must not exceed 255 characters"))]
    pub region: Option<String>,
    #[validate(length(max = 255, message = "must not exceed 255 characters"))]
    pub timezone: Option<String>,
    #[validate(length(max = 255, message = "must not exceed 255 characters"))]
    pub isp: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub device_type: Option<String>,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub browser: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub browser_version: Option<String>,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub os: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub os_version: Option<String>,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub platform: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub language: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub screen_resolution: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub viewport: Option<String>,
    pub user_agent: Option<String>,
    #[validate(length(max = 500, message = "must not exceed 500 characters"))]
    pub referrer: Option<String>,
    pub page_url: Option<String>,
}

/// Flatten validator output into `{field: [message, ..]}` for the response
/// envelope.
pub fn validation_error_map(errors: &ValidationErrors) -> Value {
    let mut map = Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(msg) => json!(msg),
                None => json!(e.code.as_ref()),
            })
            .collect();
        map.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_valid() {
        assert!(TrackVisitorRequest::default().validate().is_ok());
    }

    #[test]
    fn latitude_out_of_range_is_rejected() {
        let req = TrackVisitorRequest {
            latitude: Some(95.0),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        let map = validation_error_map(&errors);
        assert!(map.get("latitude").is_some());
    }

    #[test]
    fn boundary_coordinates_are_accepted() {
        let req = TrackVisitorRequest {
            latitude: Some(-90.0),
            longitude: Some(180.0),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn overlong_ip_is_rejected() {
        let req = TrackVisitorRequest {
            ip_address: Some("x".repeat(46)),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        assert!(validation_error_map(&errors).get("ip_address").is_some());
    }
}
