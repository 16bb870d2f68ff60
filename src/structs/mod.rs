pub mod analytics_response;
pub mod track_request;
pub mod user;
