//! Typed Feed Services
//!
//! Per-domain wrappers around the connection factory. Each feed decodes its
//! stream's payloads into typed domain values, maintains a store-backed
//! read model (`latest value + connected flag + error slot`), and hands the
//! subscriber a [`Subscription`] guard.
//!
//! Dropping a guard (or calling [`Subscription::unsubscribe`]) cancels
//! exactly the connection it was created with; a guard outliving a
//! resubscribe on the same channel is a silent no-op.

use crate::domain::registry::CleanupHandle;

/// Balance feed over a dedicated stream path.
pub mod balance;

/// Contract price quotes for proposed trades.
pub mod contract;

/// Spot price ticks per instrument.
pub mod market;

/// Open and closed position snapshots.
pub mod positions;

pub use balance::{BalanceFeed, BalanceSnapshot};
pub use contract::{ContractFeed, ContractQuote};
pub use market::{MarketFeed, MarketQuote};
pub use positions::{PositionsFeed, PositionsSnapshot};

/// Guard over one live feed subscription.
///
/// The subscription stays open while the guard is alive; dropping it tears
/// the connection down and clears the feed's connected flag. Teardown is
/// idempotent and stale-safe: it never cancels a newer subscription that
/// superseded this one on the same channel, and a stale guard's close hook
/// never touches the successor's read-model state.
pub struct Subscription {
    cleanup: CleanupHandle,
    on_close: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Subscription {
    pub(crate) const fn new(cleanup: CleanupHandle) -> Self {
        Self {
            cleanup,
            on_close: None,
        }
    }

    /// Attach a hook run when this guard itself performs the teardown.
    pub(crate) fn with_close(mut self, on_close: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(on_close));
        self
    }

    /// Tear the subscription down now instead of at drop.
    pub fn unsubscribe(&self) {
        self.teardown();
    }

    fn teardown(&self) {
        // A stale guard's teardown already fired during eviction; skipping
        // the hook keeps it from clobbering the successor's state.
        if self.cleanup.cancel()
            && let Some(on_close) = &self.on_close
        {
            on_close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}
