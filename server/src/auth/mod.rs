//! Admin authentication.

mod admin;

pub use admin::*;
