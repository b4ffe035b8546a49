// HTTP middleware for the gateway

pub mod cors;

pub use cors::cors_layer;
