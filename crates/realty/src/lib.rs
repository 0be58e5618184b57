pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod inquiries;
pub mod listings;
pub mod media;
pub mod notify;
pub mod sessions;
pub mod store;
pub mod telemetry;
pub mod validation;
