use anyhow::{Context, Result, bail};
use log::warn;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::client::render::{RenderState, render_all};
use crate::structs::analytics_response::{
    ChartDataResponse, IspsResponse, LocationsResponse, StatsResponse, VisitorPage,
};

/// How often the dashboard re-fetches everything.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound for a single section fetch. A stalled endpoint becomes a
/// logged per-section failure instead of freezing the refresh loop.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

async fn with_deadline<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(FETCH_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => bail!("request did not complete within {:?}", FETCH_TIMEOUT),
    }
}

/// Authenticated client for the admin analytics endpoints.
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DashboardClient {
    pub fn new(http: reqwest::Client, base_url: String, token: String) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("request to {} failed", path))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", path))?
            .json()
            .await
            .with_context(|| format!("decoding {} response failed", path))
    }

    pub async fn fetch_stats(&self) -> Result<StatsResponse> {
        self.fetch("/admin/analytics/stats").await
    }

    pub async fn fetch_visitors(&self) -> Result<VisitorPage> {
        self.fetch("/admin/analytics/visitors").await
    }

    pub async fn fetch_locations(&self) -> Result<LocationsResponse> {
        self.fetch("/admin/analytics/locations").await
    }

    pub async fn fetch_charts(&self) -> Result<ChartDataResponse> {
        self.fetch("/admin/analytics/charts").await
    }

    pub async fn fetch_isps(&self) -> Result<IspsResponse> {
        self.fetch("/admin/analytics/isps").await
    }

    /// Fetch all five sections concurrently, each under its own deadline.
    /// A failed or stalled section is logged and keeps its previous data;
    /// it never blocks the others.
    pub async fn refresh(&self, state: &mut RenderState) {
        let (stats, visitors, locations, charts, isps) = tokio::join!(
            with_deadline(self.fetch_stats()),
            with_deadline(self.fetch_visitors()),
            with_deadline(self.fetch_locations()),
            with_deadline(self.fetch_charts()),
            with_deadline(self.fetch_isps()),
        );

        match stats {
            Ok(value) => state.stats = Some(value),
            Err(e) => warn!("stats refresh failed: {}", e),
        }
        match visitors {
            Ok(value) => state.visitors = Some(value),
            Err(e) => warn!("visitors refresh failed: {}", e),
        }
        match locations {
            Ok(value) => state.locations = Some(value),
            Err(e) => warn!("locations refresh failed: {}", e),
        }
        match charts {
            Ok(value) => state.charts = Some(value),
            Err(e) => warn!("charts refresh failed: {}", e),
        }
        match isps {
            Ok(value) => state.isps = Some(value),
            Err(e) => warn!("isps refresh failed: {}", e),
        }
    }

    /// Refresh-and-render loop on a fixed interval. The timer fires whether
    /// or not the previous batch has finished; each call is idempotent so
    /// overlap is harmless.
    pub async fn run(&self, mut state: RenderState) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            self.refresh(&mut state).await;
            render_all(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_hits_its_deadline() {
        let result: Result<()> = with_deadline(std::future::pending()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn one_stalled_section_does_not_starve_the_others() {
        let (stalled, quick) = tokio::join!(
            with_deadline(std::future::pending::<Result<()>>()),
            with_deadline(async { Ok::<_, anyhow::Error>(7) }),
        );
        assert!(stalled.is_err());
        assert_eq!(quick.unwrap(), 7);
    }

    #[tokio::test]
    async fn fast_fetch_passes_through() {
        let result = with_deadline(async { Ok::<_, anyhow::Error>("ok") }).await;
        assert_eq!(result.unwrap(), "ok");
    }
}
