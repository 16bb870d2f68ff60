use actix_web::web;

use crate::handlers::analytics_handlers::{
    get_chart_data, get_isp_data, get_stats, get_top_locations, get_visitors,
};
use crate::handlers::auth_handlers::{create_admin, login};
use crate::handlers::export_handlers::export_csv;
use crate::handlers::health_handlers::health_check;
use crate::handlers::tracking_handlers::{track_visitor, visitor_stats};
use crate::middlewares::authmw::JwtAuth;
use crate::middlewares::rate_limit::RateLimiter;

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Public tracking surface, rate limited per client IP
    cfg.service(
        web::resource("/api/track-visitor")
            .wrap(RateLimiter::per_minute(60))
            .route(web::post().to(track_visitor)),
    );
    cfg.service(
        web::resource("/api/visitor-stats")
            .wrap(RateLimiter::per_minute(30))
            .route(web::get().to(visitor_stats)),
    );

    // Authentication routes - no auth required
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/init", web::post().to(create_admin)),
    );

    cfg.route("/api/health/check", web::get().to(health_check));

    // Admin analytics - requires a valid admin token
    cfg.service(
        web::scope("/admin/analytics")
            .wrap(JwtAuth)
            .route("/stats", web::get().to(get_stats))
            .route("/visitors", web::get().to(get_visitors))
            .route("/locations", web::get().to(get_top_locations))
            .route("/charts", web::get().to(get_chart_data))
            .route("/isps", web::get().to(get_isp_data))
            .route("/export", web::get().to(export_csv)),
    );
}
