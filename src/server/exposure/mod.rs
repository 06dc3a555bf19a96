//! API exposure modules
//!
//! Each exposure consumes a `ServerHost` and produces a Router.

pub mod rest;
pub mod websocket;

pub use rest::RestExposure;
pub use websocket::WebSocketExposure;
