pub mod auth;
pub mod report;
pub mod user;

pub use auth::*;
