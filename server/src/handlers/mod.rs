//! Request handlers shared by the HTTP routes and the WebSocket session.

mod admin;
mod cart;
mod websocket;

pub use admin::*;
pub use cart::*;
pub use websocket::*;

use stockroom_engine::Timestamp;

/// Current wall-clock time in milliseconds.
pub fn now() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}
