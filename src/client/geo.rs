use anyhow::{Result, bail};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::warn;
use serde::Deserialize;
use std::future::Future;

const UNKNOWN: &str = "Unknown";

/// Geolocation metadata for the caller's own address, as resolved by a
/// public IP lookup service.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationData {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub isp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for LocationData {
    fn default() -> Self {
        Self {
            ip: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            timezone: UNKNOWN.to_string(),
            isp: UNKNOWN.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

/// Outcome of trying an ordered list of providers.
#[derive(Debug, PartialEq)]
pub enum Resolved<T> {
    Found(T),
    AllFailed,
}

/// Await each attempt in order and short-circuit on the first success.
/// Later attempts are never started once one has succeeded.
pub async fn first_success<T, I, F>(attempts: I) -> Resolved<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    for attempt in attempts {
        match attempt.await {
            Ok(value) => return Resolved::Found(value),
            Err(e) => warn!("location provider failed: {}", e),
        }
    }
    Resolved::AllFailed
}

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    timezone: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    query: Option<String>,
}

/// ip-api.com, free tier, 45 req/min.
async fn ip_api_lookup(http: &reqwest::Client) -> Result<LocationData> {
    let url = "http://ip-api.com/json/?fields=status,message,country,region,\
               regionName,city,lat,lon,timezone,isp,org,query";
    let body: IpApiResponse = http.get(url).send().await?.error_for_status()?.json().await?;

    if body.status != "success" {
        bail!("ip-api.com returned status {:?}", body.status);
    }

    let unknown = || UNKNOWN.to_string();
    Ok(LocationData {
        ip: body.query.unwrap_or_else(unknown),
        country: body.country.unwrap_or_else(unknown),
        city: body.city.unwrap_or_else(unknown),
        region: body.region_name.unwrap_or_else(unknown),
        timezone: body.timezone.unwrap_or_else(unknown),
        isp: body.isp.or(body.org).unwrap_or_else(unknown),
        latitude: body.lat,
        longitude: body.lon,
    })
}

#[derive(Deserialize)]
struct IpapiCoResponse {
    ip: Option<String>,
    country_name: Option<String>,
    region: Option<String>,
    city: Option<String>,
    timezone: Option<String>,
    org: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
}

/// ipapi.co, free tier, 1000 req/day.
async fn ipapi_co_lookup(http: &reqwest::Client) -> Result<LocationData> {
    let body: IpapiCoResponse = http
        .get("https://ipapi.co/json/")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if body.error || body.ip.is_none() {
        bail!("ipapi.co returned an error payload");
    }

    let unknown = || UNKNOWN.to_string();
    Ok(LocationData {
        ip: body.ip.unwrap_or_else(unknown),
        country: body.country_name.unwrap_or_else(unknown),
        city: body.city.unwrap_or_else(unknown),
        region: body.region.unwrap_or_else(unknown),
        timezone: body.timezone.unwrap_or_else(unknown),
        isp: body.org.unwrap_or_else(unknown),
        latitude: body.latitude,
        longitude: body.longitude,
    })
}

/// Resolve the caller's location, trying providers in preference order.
/// When every provider fails the default "Unknown" fields come back and
/// tracking proceeds regardless.
pub async fn resolve_location(http: &reqwest::Client) -> LocationData {
    let attempts: Vec<BoxFuture<'_, Result<LocationData>>> = vec![
        ip_api_lookup(http).boxed(),
        ipapi_co_lookup(http).boxed(),
    ];

    match first_success(attempts).await {
        Resolved::Found(location) => location,
        Resolved::AllFailed => {
            warn!("all location providers failed, tracking with Unknown location");
            LocationData::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::LocalBoxFuture;
    use std::cell::Cell;

    async fn ok_after_marking(flag: &Cell<bool>, value: &str) -> Result<String> {
        flag.set(true);
        Ok(value.to_string())
    }

    async fn failing(flag: &Cell<bool>) -> Result<String> {
        flag.set(true);
        bail!("provider down")
    }

    #[tokio::test]
    async fn first_provider_success_short_circuits() {
        let first = Cell::new(false);
        let second = Cell::new(false);

        let attempts: Vec<LocalBoxFuture<'_, Result<String>>> = vec![
            ok_after_marking(&first, "a").boxed_local(),
            ok_after_marking(&second, "b").boxed_local(),
        ];

        let resolved = first_success(attempts).await;
        assert_eq!(resolved, Resolved::Found("a".to_string()));
        assert!(first.get());
        assert!(!second.get(), "second provider must not be tried");
    }

    #[tokio::test]
    async fn falls_through_to_second_provider() {
        let first = Cell::new(false);
        let second = Cell::new(false);

        let attempts: Vec<LocalBoxFuture<'_, Result<String>>> = vec![
            failing(&first).boxed_local(),
            ok_after_marking(&second, "b").boxed_local(),
        ];

        assert_eq!(first_success(attempts).await, Resolved::Found("b".to_string()));
        assert!(first.get());
        assert!(second.get());
    }

    #[tokio::test]
    async fn all_failures_reported_as_all_failed() {
        let first = Cell::new(false);
        let second = Cell::new(false);

        let attempts: Vec<LocalBoxFuture<'_, Result<String>>> =
            vec![failing(&first).boxed_local(), failing(&second).boxed_local()];

        assert_eq!(first_success(attempts).await, Resolved::AllFailed);
    }

    #[test]
    fn default_location_is_unknown_everywhere() {
        let location = LocationData::default();
        assert_eq!(location.country, "Unknown");
        assert_eq!(location.isp, "Unknown");
        assert!(location.latitude.is_none());
    }
}
