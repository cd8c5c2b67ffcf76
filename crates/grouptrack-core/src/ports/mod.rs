//! Port definitions (hexagonal architecture interfaces)
//!
//! - [`IIndexStore`] - Durable storage for the membership indexes
//! - [`INotifier`] - Delivery of outbound notifications

pub mod index_store;
pub mod notification;

pub use index_store::IIndexStore;
pub use notification::{AlertField, INotifier, Notification};
