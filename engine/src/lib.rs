//! # Stockroom Engine
//!
//! The cart and inventory consistency engine behind the Stockroom storefront.
//!
//! Customers browse a catalog of products, each product carrying a set of
//! named variants ("flavors") with a finite stock count. Adding a variant to a
//! cart reserves stock immediately; removing it, clearing the cart, letting
//! the cart expire or cancelling the order it became releases the stock again.
//! The engine guarantees that stock and carts never drift apart and that
//! stock is never silently lost.
//!
//! ## Design Principles
//!
//! - **No IO of its own**: persistence sits behind the store traits in
//!   [`store`]; the engine ships an in-memory implementation ([`MemoryStore`])
//! - **Explicit time**: every operation takes the current [`Timestamp`], so the
//!   same inputs always produce the same outputs under test
//! - **One serialization point**: stock only ever changes through
//!   [`InventoryStore::adjust_stock`], an atomic filter-matched increment
//! - **Safe-direction failures**: reserving stock never outruns the cart write
//!   without compensation; releasing stock is allowed to
//!
//! ## Core Concepts
//!
//! ### Reservations
//!
//! [`Reservations`] adds, removes and clears cart lines. Every add is checked
//! against the [`ModeGate`] first, then validated against the current variant
//! stock, then applied as "decrement stock, then write cart" with a
//! compensating increment on any later failure.
//!
//! ### Operational mode
//!
//! The [`ModeGate`] tracks whether the shop is temporarily closed. Reading it
//! auto-engages the closed mode once too many orders are open.
//!
//! ### Orders and expiry
//!
//! The [`OrderFinalizer`] turns carts into orders and hands stock back on
//! cancellation. The [`Sweeper`] releases carts whose time-to-live has passed.
//! Both go through the same release path as removing a line.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stockroom_engine::{AdminGate, MemoryStore, Product, Shop, ShopConfig, Variant};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let shop = Shop::new(store.clone(), ShopConfig::default());
//!
//! let now = 1_706_745_600_000;
//! let grant = AdminGate::trusted(now);
//! shop.catalog()
//!     .upsert_product(&grant, Product::new(
//!         "pod-1",
//!         "Pod",
//!         1500,
//!         "pods",
//!         vec![Variant::new("Mint", 2)],
//!     ))
//!     .await
//!     .unwrap();
//!
//! let cart = shop
//!     .reservations()
//!     .add_line(42, "pod-1", "Mint", 1, now)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(cart.item_count(), 1);
//! assert!(cart.expires_at.is_some());
//! # });
//! ```

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod finalizer;
pub mod memory;
pub mod mode;
pub mod notify;
pub mod order;
pub mod reservation;
pub mod seed;
pub mod settings;
pub mod shop;
pub mod store;
pub mod sweeper;

// Re-export main types at crate root
pub use admin::{AdminGate, AdminGrant};
pub use cart::{Cart, CartLine};
pub use catalog::{Product, Variant};
pub use error::{Error, StoreError};
pub use finalizer::OrderFinalizer;
pub use memory::MemoryStore;
pub use mode::{ModeGate, ModeStatus};
pub use notify::{
    respond, Delivery, Interaction, Notifier, NotifyError, NullNotifier, Recipient,
    RecordingNotifier,
};
pub use order::{Order, OrderStatus};
pub use reservation::Reservations;
pub use seed::{CatalogSeed, SEED_FORMAT_VERSION};
pub use settings::SleepMode;
pub use shop::{Catalog, Shop, ShopConfig};
pub use store::{CartStore, InventoryStore, OrderStore, SettingsStore, SharedStore, ShopStore};
pub use sweeper::{SweepReport, Sweeper};

/// Type aliases for clarity
pub type ProductId = String;
pub type OrderId = String;
pub type CustomerId = i64;
pub type Price = u64;
pub type Timestamp = u64;

/// Milliseconds in one second, for converting configured durations.
pub const MILLIS_PER_SECOND: u64 = 1_000;
