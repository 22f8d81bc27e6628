//! Streaming connection layer

pub mod stream;


pub use stream::StreamConnection;
