//! Ordered fallback over contract reads.
//!
//! Several router values can be read through more than one accessor (the
//! domain through `localDomain` or `GTX_HOST_CHAIN_ID`, the gas payment through
//! `quoteGasPayment` or `destinationGas`). [`Fallback`] tries each tier in the
//! order it was added, bounds every attempt with a timeout, logs the failures
//! and finally returns a static default when every tier failed.

use crate::ContractError;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	/// The named read succeeded.
	Tier(&'static str),
	/// Every read failed and the default was used.
	Default,
}

/// Outcome of a [`Fallback`] chain.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
	pub value: T,
	pub source: Source,
	/// Failures of the tiers tried before the value was found.
	pub failures: Vec<(&'static str, ContractError)>,
}

impl<T> Resolved<T> {
	pub fn used_default(&self) -> bool {
		self.source == Source::Default
	}
}

/// Ordered list of reads with a final default.
pub struct Fallback<'a, T> {
	what: &'static str,
	tiers: Vec<(&'static str, BoxFuture<'a, Result<T, ContractError>>)>,
	default: T,
	timeout: Option<Duration>,
}

impl<'a, T: Send + 'a> Fallback<'a, T> {
	/// Starts a chain resolving `what`, falling back to `default`.
	pub fn new(what: &'static str, default: T) -> Self {
		Self {
			what,
			tiers: Vec::new(),
			default,
			timeout: None,
		}
	}

	/// Adds the next read to try.
	pub fn tier<F>(mut self, name: &'static str, read: F) -> Self
	where
		F: Future<Output = Result<T, ContractError>> + Send + 'a,
	{
		self.tiers.push((name, Box::pin(read)));
		self
	}

	/// Bounds each tier individually.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Runs the tiers in order and returns the first success.
	///
	/// Tiers are lazy; a tier after the first success is never polled.
	pub async fn resolve(self) -> Resolved<T> {
		let mut failures = Vec::new();

		for (name, read) in self.tiers {
			let result = match self.timeout {
				Some(limit) => bounded(limit, read).await,
				None => read.await,
			};

			match result {
				Ok(value) => {
					tracing::debug!(what = self.what, source = name, "Resolved");
					return Resolved {
						value,
						source: Source::Tier(name),
						failures,
					};
				}
				Err(e) => {
					tracing::warn!(what = self.what, source = name, error = %e, "Read failed, trying next source");
					failures.push((name, e));
				}
			}
		}

		tracing::warn!(what = self.what, "All sources failed, using default");
		Resolved {
			value: self.default,
			source: Source::Default,
			failures,
		}
	}
}

/// Awaits `read` for at most `limit`.
pub async fn bounded<T, F>(limit: Duration, read: F) -> Result<T, ContractError>
where
	F: Future<Output = Result<T, ContractError>>,
{
	tokio::time::timeout(limit, read)
		.await
		.map_err(|_| ContractError::Timeout(limit))?
}
