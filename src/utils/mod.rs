pub mod csv;
pub mod jwt;
pub mod stats;
