// Infrastructure layer - Configuration and transport adapters
pub mod chunked_json;
pub mod config;
pub mod http_response;
