// PubMed Navigator - paginated PubMed search sessions over NCBI E-utilities

pub mod api;       // Typed client for the gateway's search and detail endpoints
pub mod browse;    // Line-oriented front end driving a session
pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;    // Gateway HTTP routes
pub mod search;    // NCBI E-utilities client and PubMed XML parsing
pub mod session;   // Search session controller, detail coordinator, snapshot store
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
