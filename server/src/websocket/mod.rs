//! WebSocket support for live cart sessions.
//!
//! Customers connect via WebSocket to drive their cart and receive
//! notifications (expired carts, order updates). Operators connect to
//! receive new-order notices.

mod manager;
mod notifier;
mod protocol;

pub use manager::ConnectionManager;
pub use notifier::SocketNotifier;
pub use protocol::*;
