use serde::{Deserialize, Serialize};

use crate::models::visitor::Visitor;

// These shapes are shared by the admin handlers and the dashboard client,
// so they derive both Serialize and Deserialize.

/// Overview card numbers.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatsResponse {
    pub total_visitors: u64,
    pub growth: f64,
    pub countries: usize,
    pub desktop_users: u64,
    pub mobile_users: u64,
    pub tablet_users: u64,
}

/// One page of the visitor log, newest first.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VisitorPage {
    pub data: Vec<Visitor>,
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
}

#[derive(Deserialize, Debug)]
pub struct VisitorQueryParams {
    pub search: Option<String>,
    pub page: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceCount {
    pub device_type: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrowserCount {
    pub browser: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OsCount {
    pub os: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationCount {
    pub country: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationsResponse {
    pub locations: Vec<LocationCount>,
    pub total: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrendPoint {
    pub date: String, // "Jan 05" style label
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChartDataResponse {
    pub trends: Vec<TrendPoint>,
    pub devices: Vec<DeviceCount>,
    pub browsers: Vec<BrowserCount>,
    pub oses: Vec<OsCount>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IspCount {
    pub isp: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IspsResponse {
    pub isps: Vec<IspCount>,
    pub total: u64,
}

/// Public summary for the unauthenticated stats endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublicStatsResponse {
    pub total_visitors: u64,
    pub today_visitors: u64,
    pub countries: usize,
}
