pub mod user;
pub mod visitor;
