//! Cross-chain order lifecycle.
//!
//! [`OrderLifecycleClient`] turns an [`OrderRequest`] into a submitted router
//! order: it validates the request against the chain configuration, manages
//! the ERC-20 approval, quotes the bridging gas, reads the router nonce,
//! encodes the order and waits a bounded time for confirmation. Status is
//! observed separately, either once through
//! [`OrderLifecycleClient::get_order_status`] or continuously through an
//! [`OrderWatcher`].

mod client;
mod error;
mod status;
mod types;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use client::{ClientBuilder, OrderLifecycleClient};
pub use error::{describe_revert, LifecycleError};
pub use types::{OrderRequest, OrderResult};
pub use watcher::{OrderWatcher, PollOptions, PollOutcome, StatusSource, WatchHandle};
