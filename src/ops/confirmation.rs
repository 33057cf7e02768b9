//! src/ops/confirmation.rs
//!
//! Bounded polling for transaction confirmation.
//!
//! The poller asks a [`StatusSource`] whether a [`PendingAction`] is mined,
//! sleeping [`POLL_INTERVAL`] between attempts, until it sees a receipt or the
//! deadline computed at loop entry passes. A successful receipt is followed by
//! a [`SETTLE_INTERVAL`] pause so that reads issued right after confirmation
//! see the state the receipt describes, even on load-balanced RPC backends.
//!
//! Query errors count as "not mined yet". This also covers errors that will
//! never go away (wrong endpoint, ABI mismatch): those retry silently until
//! the deadline and end as [`ConfirmationResult::TimedOut`].

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::blockchain::traits::{InclusionStatus, PendingAction, StatusSource};
use crate::tools::async_support::BlockedWait;

/// Pause between two status queries.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after a successful receipt before reporting confirmation.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal outcome of a confirmation wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// Mined and executed successfully.
    Confirmed,
    /// Mined but reverted.
    Failed,
    /// No receipt before the deadline.
    TimedOut,
}

/// Timing knobs of the poll loop. Production code uses the defaults; tests
/// may shrink them, usually together with a paused tokio clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub settle_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { poll_interval: POLL_INTERVAL, settle_interval: SETTLE_INTERVAL }
    }
}

pub struct ConfirmationPoller<S: ?Sized> {
    source: Arc<S>,
    settings: PollSettings,
}

impl<S: ?Sized> Clone for ConfirmationPoller<S> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source), settings: self.settings }
    }
}

impl<S> ConfirmationPoller<S>
where
    S: StatusSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source, settings: PollSettings::default() }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Poll until `action` reaches a terminal state or `timeout` elapses.
    ///
    /// A zero timeout performs exactly one query and never sleeps.
    pub async fn confirm(&self, action: &PendingAction, timeout: Duration) -> ConfirmationResult {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.source.status(action).await {
                Ok(InclusionStatus::Included { success: true }) => {
                    debug!(tx_hash = %action, attempts, "Receipt found; settling");
                    sleep(self.settings.settle_interval).await;
                    info!(tx_hash = %action, attempts, elapsed = ?started.elapsed(), "Transaction confirmed");
                    return ConfirmationResult::Confirmed;
                }
                Ok(InclusionStatus::Included { success: false }) => {
                    warn!(tx_hash = %action, attempts, "Transaction reverted");
                    return ConfirmationResult::Failed;
                }
                Ok(InclusionStatus::Unknown) => {}
                Err(e) => {
                    debug!(tx_hash = %action, attempts, error = %e, "Status query failed; retrying");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(tx_hash = %action, attempts, ?timeout, "Timed out waiting for receipt");
                return ConfirmationResult::TimedOut;
            }
            sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }
}

impl<S> ConfirmationPoller<S>
where
    S: StatusSource + ?Sized + 'static,
{
    /// Run [`confirm`](Self::confirm) on its own task. The returned handle is
    /// joined with [`BlockedWait::wait`].
    pub fn spawn(&self, action: PendingAction, timeout: Duration) -> BlockedWait<ConfirmationResult> {
        let poller = self.clone();
        BlockedWait::exec("confirm transaction", async move {
            poller.confirm(&action, timeout).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{InMemoryLedger, ScriptedStatus};
    use ethers::types::TxHash;

    fn action() -> PendingAction {
        PendingAction::new(TxHash::repeat_byte(0x42))
    }

    // The paused clock may round each deadline up to the next millisecond tick.
    fn assert_elapsed(started: Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(5),
            "elapsed {:?}, expected {:?}",
            elapsed,
            expected
        );
    }

    fn poller(ledger: InMemoryLedger) -> (ConfirmationPoller<InMemoryLedger>, Arc<InMemoryLedger>) {
        let ledger = Arc::new(ledger);
        (ConfirmationPoller::new(Arc::clone(&ledger)), ledger)
    }

    #[test]
    fn default_settings_use_named_intervals() {
        let settings = PollSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.settle_interval, Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_checks_exactly_once() {
        let (poller, ledger) =
            poller(InMemoryLedger::new().with_default_status(ScriptedStatus::Unknown));
        let started = Instant::now();
        let result = poller.confirm(&action(), Duration::ZERO).await;
        assert_eq!(result, ConfirmationResult::TimedOut);
        assert_eq!(ledger.status_queries(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_sees_an_existing_receipt() {
        let (poller, _) = poller(InMemoryLedger::new().with_default_status(ScriptedStatus::Included(false)));
        assert_eq!(poller.confirm(&action(), Duration::ZERO).await, ConfirmationResult::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_at_the_fixed_interval() {
        let (poller, ledger) = poller(
            InMemoryLedger::new()
                .with_status_script([ScriptedStatus::Unknown, ScriptedStatus::Unknown])
                .with_default_status(ScriptedStatus::Included(true)),
        );
        let started = Instant::now();
        let result = poller.confirm(&action(), Duration::from_secs(5)).await;
        assert_eq!(result, ConfirmationResult::Confirmed);
        assert_eq!(ledger.status_queries(), 3);
        assert_elapsed(started, POLL_INTERVAL * 2 + SETTLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_after_the_deadline_still_time_out() {
        let (poller, _) = poller(InMemoryLedger::new().with_default_status(ScriptedStatus::Error));
        let started = Instant::now();
        let result = poller.confirm(&action(), Duration::from_millis(250)).await;
        assert_eq!(result, ConfirmationResult::TimedOut);
        assert_elapsed(started, Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_poll_is_joined() {
        let (poller, _) = poller(InMemoryLedger::new());
        let wait = poller.spawn(action(), Duration::from_secs(1));
        assert_eq!(wait.wait().await.unwrap(), ConfirmationResult::Confirmed);
    }
}
