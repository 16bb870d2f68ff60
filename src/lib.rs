pub mod client;
pub mod db;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod state;
pub mod structs;
pub mod utils;
