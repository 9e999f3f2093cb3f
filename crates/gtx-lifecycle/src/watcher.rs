//! Cancellable order status polling.
//!
//! Each [`OrderWatcher`] polls a single order on its own task until the order
//! reaches a terminal status, the polling deadline passes, or the caller
//! cancels. Dropping the [`WatchHandle`] cancels the task, so a forgotten
//! watcher cannot keep polling.

use crate::OrderLifecycleClient;
use alloy::primitives::B256;
use async_trait::async_trait;
use gtx_types::{ClientSettings, OrderStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Anything that can report an order's status.
#[async_trait]
pub trait StatusSource: Send + Sync {
	async fn order_status(&self, order_or_tx: B256) -> OrderStatus;
}

#[async_trait]
impl StatusSource for OrderLifecycleClient {
	async fn order_status(&self, order_or_tx: B256) -> OrderStatus {
		self.get_order_status(order_or_tx).await
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
	pub interval: Duration,
	/// Polling stops after this long. The order is not failed, only unknown.
	pub max_duration: Duration,
}

impl From<&ClientSettings> for PollOptions {
	fn from(settings: &ClientSettings) -> Self {
		Self {
			interval: settings.poll_interval(),
			max_duration: settings.max_poll_duration(),
		}
	}
}

impl Default for PollOptions {
	fn default() -> Self {
		Self::from(&ClientSettings::default())
	}
}

/// Why polling stopped, with the last status seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
	Terminal(OrderStatus),
	/// Deadline passed; check the order manually.
	DeadlineReached(OrderStatus),
	Cancelled(OrderStatus),
}

impl PollOutcome {
	pub fn last_status(&self) -> OrderStatus {
		match self {
			PollOutcome::Terminal(status)
			| PollOutcome::DeadlineReached(status)
			| PollOutcome::Cancelled(status) => *status,
		}
	}
}

/// Handle to a running watcher.
pub struct WatchHandle {
	cancel: CancellationToken,
	status: watch::Receiver<OrderStatus>,
	task: Option<JoinHandle<PollOutcome>>,
}

impl WatchHandle {
	/// Last status observed so far.
	pub fn status(&self) -> OrderStatus {
		*self.status.borrow()
	}

	/// Receiver notified whenever the observed status changes.
	pub fn subscribe(&self) -> watch::Receiver<OrderStatus> {
		self.status.clone()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Waits for polling to stop.
	pub async fn finished(mut self) -> PollOutcome {
		let last = self.status();
		match self.task.take() {
			Some(task) => task.await.unwrap_or(PollOutcome::Cancelled(last)),
			None => PollOutcome::Cancelled(last),
		}
	}
}

impl Drop for WatchHandle {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

pub struct OrderWatcher;

impl OrderWatcher {
	/// Starts polling `order_or_tx` on a new task.
	pub fn spawn(
		source: Arc<dyn StatusSource>,
		order_or_tx: B256,
		options: PollOptions,
	) -> WatchHandle {
		let cancel = CancellationToken::new();
		let (tx, rx) = watch::channel(OrderStatus::Processing);
		let task = tokio::spawn(poll(source, order_or_tx, options, cancel.clone(), tx));

		WatchHandle {
			cancel,
			status: rx,
			task: Some(task),
		}
	}
}

async fn poll(
	source: Arc<dyn StatusSource>,
	order_or_tx: B256,
	options: PollOptions,
	cancel: CancellationToken,
	status_tx: watch::Sender<OrderStatus>,
) -> PollOutcome {
	let deadline = tokio::time::sleep(options.max_duration);
	tokio::pin!(deadline);

	let mut ticker = tokio::time::interval(options.interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	let mut last = *status_tx.borrow();

	loop {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => return PollOutcome::Cancelled(last),
			_ = &mut deadline => break,
			_ = ticker.tick() => {}
		}

		let status = tokio::select! {
			biased;
			_ = cancel.cancelled() => return PollOutcome::Cancelled(last),
			_ = &mut deadline => break,
			status = source.order_status(order_or_tx) => status,
		};

		if status != last {
			tracing::info!(key = %order_or_tx, from = %last, to = %status, "Order status changed");
			status_tx.send_replace(status);
			last = status;
		}

		if status.is_terminal() {
			return PollOutcome::Terminal(status);
		}
	}

	tracing::warn!(
		key = %order_or_tx,
		status = %last,
		waited = ?options.max_duration,
		"Stopped polling before the order settled, check it manually"
	);
	PollOutcome::DeadlineReached(last)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Replays a fixed sequence, repeating the last status forever.
	struct Scripted {
		statuses: Mutex<VecDeque<OrderStatus>>,
		polls: AtomicUsize,
	}

	impl Scripted {
		fn new(statuses: &[OrderStatus]) -> Arc<Self> {
			Arc::new(Self {
				statuses: Mutex::new(statuses.iter().copied().collect()),
				polls: AtomicUsize::new(0),
			})
		}
	}

	#[async_trait]
	impl StatusSource for Scripted {
		async fn order_status(&self, _order_or_tx: B256) -> OrderStatus {
			self.polls.fetch_add(1, Ordering::SeqCst);
			let mut statuses = self.statuses.lock().unwrap();
			if statuses.len() > 1 {
				statuses.pop_front().unwrap_or(OrderStatus::Unknown)
			} else {
				statuses.front().copied().unwrap_or(OrderStatus::Unknown)
			}
		}
	}

	fn options() -> PollOptions {
		PollOptions {
			interval: Duration::from_secs(10),
			max_duration: Duration::from_secs(35),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_stops_at_terminal_status() {
		let source = Scripted::new(&[
			OrderStatus::Processing,
			OrderStatus::Opened,
			OrderStatus::Filled,
			OrderStatus::Settled,
		]);
		let handle = OrderWatcher::spawn(source.clone(), B256::ZERO, PollOptions {
			max_duration: Duration::from_secs(300),
			..options()
		});

		assert_eq!(
			handle.finished().await,
			PollOutcome::Terminal(OrderStatus::Settled)
		);
		assert_eq!(source.polls.load(Ordering::SeqCst), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_deadline_reports_last_status() {
		let source = Scripted::new(&[OrderStatus::Opened]);
		let handle = OrderWatcher::spawn(source.clone(), B256::ZERO, options());

		assert_eq!(
			handle.finished().await,
			PollOutcome::DeadlineReached(OrderStatus::Opened)
		);
		// Polls at 0s, 10s, 20s and 30s.
		assert_eq!(source.polls.load(Ordering::SeqCst), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancel_stops_polling() {
		let source = Scripted::new(&[OrderStatus::Opened]);
		let handle = OrderWatcher::spawn(source.clone(), B256::ZERO, options());
		let mut updates = handle.subscribe();

		updates.changed().await.unwrap();
		assert_eq!(*updates.borrow(), OrderStatus::Opened);
		assert_eq!(handle.status(), OrderStatus::Opened);

		handle.cancel();
		assert_eq!(
			handle.finished().await,
			PollOutcome::Cancelled(OrderStatus::Opened)
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_dropping_handle_cancels_task() {
		let source = Scripted::new(&[OrderStatus::Opened]);
		let handle = OrderWatcher::spawn(source.clone(), B256::ZERO, options());
		let mut updates = handle.subscribe();

		updates.changed().await.unwrap();
		drop(handle);

		tokio::time::sleep(Duration::from_secs(120)).await;
		assert_eq!(source.polls.load(Ordering::SeqCst), 1);
		// The task exited and dropped its sender.
		assert!(updates.changed().await.is_err());
	}

	#[test]
	fn test_options_follow_settings() {
		let options = PollOptions::default();
		assert_eq!(options.interval, Duration::from_secs(10));
		assert_eq!(options.max_duration, Duration::from_secs(300));
	}
}
