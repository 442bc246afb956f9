pub mod auth;
pub mod email;
pub mod lifecycle;
pub mod notification;
pub mod policy;
pub mod report;
pub mod sms;
pub mod user;
