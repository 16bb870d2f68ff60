pub mod analytics_handlers;
pub mod auth_handlers;
pub mod export_handlers;
pub mod health_handlers;
pub mod tracking_handlers;
