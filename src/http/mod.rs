// HTTP surface
// Thin axum layer over the query gate

pub mod routes;
pub mod server;

pub use routes::{database_routes, status_for, DatabaseState, ErrorResponse, QueryRequest};
pub use server::HttpServer;
