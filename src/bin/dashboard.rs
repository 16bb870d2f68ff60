use dotenv::dotenv;
use env_logger::Env;
use std::env;

use visitlog::client::poller::{DashboardClient, FETCH_TIMEOUT};
use visitlog::client::render::RenderState;
use visitlog::client::track::submit_visit;

const DEFAULT_USER_AGENT: &str = "visitlog-dashboard/0.1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let base_url =
        env::var("API_URL").unwrap_or_else(|_| String::from("http://127.0.0.1:8080"));
    let token = env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN not set.");
    let filter = env::var("DASHBOARD_FILTER").unwrap_or_default();
    let user_agent =
        env::var("DASHBOARD_USER_AGENT").unwrap_or_else(|_| String::from(DEFAULT_USER_AGENT));

    // A stalled server connection must never hang a fetch indefinitely
    let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

    // Fire-and-forget tracking ping for this dashboard session
    {
        let http = http.clone();
        let base_url = base_url.clone();
        tokio::spawn(async move {
            submit_visit(&http, &base_url, &user_agent, "/admin/analytics").await;
        });
    }

    let state = RenderState {
        filter,
        ..Default::default()
    };

    let client = DashboardClient::new(http, base_url, token);
    client.run(state).await;

    Ok(())
}
