use actix_web::{HttpResponse, Responder, Result, error, web};
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use mongodb::bson::{Bson, Document, doc, from_document};
use serde::Deserialize;

use crate::models::visitor::Visitor;
use crate::state::app_state::AppState;
use crate::structs::analytics_response::{
    BrowserCount, ChartDataResponse, DeviceCount, IspCount, IspsResponse, LocationCount,
    LocationsResponse, OsCount, StatsResponse, TrendPoint, VisitorPage, VisitorQueryParams,
};
use crate::utils::stats::{day_bounds_millis, growth_rate, trailing_days, trend_label};

const PAGE_SIZE: u64 = 50;

/// Offset of a 1-based page. Saturates so an absurd `?page=` value yields
/// an empty page rather than an arithmetic panic.
fn page_offset(page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(PAGE_SIZE)
}

/// Output shape of a `$group`/`$sort` pipeline stage.
#[derive(Deserialize)]
struct GroupBucket {
    #[serde(rename = "_id")]
    name: String,
    count: u64,
}

/// Run a group-by-count pipeline over the visitors collection, excluding
/// documents where the grouping field is null. `exclude_unknown`
/// additionally drops the literal "Unknown" bucket. `limit` of 0 means no
/// truncation.
async fn grouped_counts(
    app_state: &AppState,
    field: &str,
    exclude_unknown: bool,
    limit: i64,
) -> Result<Vec<GroupBucket>, actix_web::Error> {
    let match_filter = if exclude_unknown {
        doc! { field: { "$nin": [Bson::Null, "Unknown"] } }
    } else {
        doc! { field: { "$ne": Bson::Null } }
    };

    let mut pipeline = vec![
        doc! { "$match": match_filter },
        doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
    ];
    if limit > 0 {
        pipeline.push(doc! { "$limit": limit });
    }

    let mut cursor = app_state
        .db
        .collection::<Document>("visitors")
        .aggregate(pipeline)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let mut buckets = Vec::new();
    while let Some(result) = cursor.next().await {
        let document =
            result.map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
        let bucket: GroupBucket = from_document(document)
            .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
        buckets.push(bucket);
    }

    Ok(buckets)
}

/// Overview stats: total, 24h-over-24h growth, distinct countries, device
/// split restricted to Desktop/Mobile/Tablet.
pub async fn get_stats(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    let total_visitors = visitors_collection
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let now = Utc::now().timestamp_millis();
    let day = Duration::days(1).num_milliseconds();

    let last_24h = visitors_collection
        .count_documents(doc! { "created_at": { "$gte": now - day } })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let previous_24h = visitors_collection
        .count_documents(doc! { "created_at": { "$gte": now - 2 * day, "$lt": now - day } })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let countries = visitors_collection
        .distinct(
            "country",
            doc! { "country": { "$nin": [Bson::Null, "Unknown"] } },
        )
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?
        .len();

    let devices = grouped_counts(&app_state, "device_type", false, 0).await?;
    let device_count = |name: &str| {
        devices
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.count)
            .unwrap_or(0)
    };

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_visitors,
        growth: growth_rate(last_24h, previous_24h),
        countries,
        desktop_users: device_count("Desktop"),
        mobile_users: device_count("Mobile"),
        tablet_users: device_count("Tablet"),
    }))
}

/// Escape a user-supplied search term so it matches literally inside a
/// `$regex` filter.
fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if ".^$*+?()[]{}|\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Paginated visitor log, newest first, with optional free-text search over
/// IP, country, city, browser, OS and ISP.
pub async fn get_visitors(
    app_state: web::Data<AppState>,
    query: web::Query<VisitorQueryParams>,
) -> Result<impl Responder> {
    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    let filter = match &query.search {
        Some(term) if !term.is_empty() => {
            let pattern = escape_regex(term);
            let regex = |field: &str| {
                doc! { field: { "$regex": pattern.as_str(), "$options": "i" } }
            };
            doc! {
                "$or": [
                    regex("ip_address"),
                    regex("country"),
                    regex("city"),
                    regex("browser"),
                    regex("os"),
                    regex("isp"),
                ]
            }
        }
        _ => doc! {},
    };

    let total = visitors_collection
        .count_documents(filter.clone())
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let page = query.page.unwrap_or(1).max(1);

    let mut cursor = visitors_collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(page_offset(page))
        .limit(PAGE_SIZE as i64)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let mut data = Vec::new();
    while let Some(result) = cursor.next().await {
        let visitor =
            result.map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
        data.push(visitor);
    }

    Ok(HttpResponse::Ok().json(VisitorPage {
        data,
        current_page: page,
        per_page: PAGE_SIZE,
        total,
        last_page: total.div_ceil(PAGE_SIZE).max(1),
    }))
}

/// Top 10 countries by visit count, plus the overall total so the caller
/// can derive percentages.
pub async fn get_top_locations(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let locations = grouped_counts(&app_state, "country", false, 10)
        .await?
        .into_iter()
        .map(|b| LocationCount {
            country: b.name,
            count: b.count,
        })
        .collect();

    let total = app_state
        .db
        .collection::<Visitor>("visitors")
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    Ok(HttpResponse::Ok().json(LocationsResponse { locations, total }))
}

/// Chart payload: 7-day trend (zero-filled, oldest first), device split,
/// top 5 browsers, OS split.
pub async fn get_chart_data(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    let mut trends = Vec::with_capacity(7);
    for day in trailing_days(Utc::now().date_naive(), 7) {
        let (start, end) = day_bounds_millis(day);
        let count = visitors_collection
            .count_documents(doc! { "created_at": { "$gte": start, "$lt": end } })
            .await
            .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
        trends.push(TrendPoint {
            date: trend_label(day),
            count,
        });
    }

    let devices = grouped_counts(&app_state, "device_type", false, 0)
        .await?
        .into_iter()
        .map(|b| DeviceCount {
            device_type: b.name,
            count: b.count,
        })
        .collect();

    let browsers = grouped_counts(&app_state, "browser", false, 5)
        .await?
        .into_iter()
        .map(|b| BrowserCount {
            browser: b.name,
            count: b.count,
        })
        .collect();

    let oses = grouped_counts(&app_state, "os", false, 0)
        .await?
        .into_iter()
        .map(|b| OsCount {
            os: b.name,
            count: b.count,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ChartDataResponse {
        trends,
        devices,
        browsers,
        oses,
    }))
}

/// Top 10 ISPs by count, skipping null and the "Unknown" placeholder that
/// the client-side enrichment writes when geolocation failed.
pub async fn get_isp_data(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let isps = grouped_counts(&app_state, "isp", true, 10)
        .await?
        .into_iter()
        .map(|b| IspCount {
            isp: b.name,
            count: b.count,
        })
        .collect();

    let total = app_state
        .db
        .collection::<Visitor>("visitors")
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    Ok(HttpResponse::Ok().json(IspsResponse { isps, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("10.0.0.1"), "10\\.0\\.0\\.1");
        assert_eq!(escape_regex("a(b)*c"), "a\\(b\\)\\*c");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn page_offset_saturates_instead_of_overflowing() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), PAGE_SIZE);
        assert_eq!(page_offset(u64::MAX), u64::MAX);
        assert_eq!(page_offset(0), 0);
    }
}
