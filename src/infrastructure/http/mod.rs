//! HTTP layer

pub mod handlers;
pub mod models;
pub mod rejections;
pub mod routes;
pub mod server;
