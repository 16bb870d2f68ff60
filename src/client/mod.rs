pub mod device;
pub mod geo;
pub mod poller;
pub mod render;
pub mod track;
