//! Concrete data sources: the WebSocket stream and the REST API

pub mod http;
pub mod websocket;

pub use http::HttpSource;
pub use websocket::WebSocketTransport;
