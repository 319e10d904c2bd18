//! Reconciliation state machine.
//!
//! [`StateChangeConf::wait_for_state`] drives an asynchronous remote
//! operation to completion by repeatedly calling a side-effect-free
//! refresh function until it reports the target state, an error, or the
//! timeout elapses.
//!
//! # Timing
//!
//! ```text
//! |-- initial_delay --| refresh |-- interval --| refresh |-- 2*interval --| ...
//! |<-------------------------------- timeout --------------------------------->|
//! ```
//!
//! The interval starts at `min_interval`, doubles after every pending
//! refresh and is capped at `max_interval`. It never drops below
//! `min_interval`. The deadline also bounds each refresh call, so a hung
//! refresh cannot outlive the wait.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::WaitConfig;
use crate::error::{NcloudError, NcloudResult};

/// Deadline used when `timeout` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Label of [`PollState::Pending`].
pub const STATE_PENDING: &str = "PENDING";

/// Label of [`PollState::Reached`].
pub const STATE_RESOLVE: &str = "RESOLVE";

/// Label of [`PollState::NotFound`].
pub const STATE_NOT_FOUND: &str = "NOT_FOUND";

/// Outcome of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// The operation is still in progress.
    Pending,
    /// The resource reached the requested state.
    Reached,
    /// The resource is gone.
    NotFound,
    /// Any other backend-reported state.
    Other(String),
}

impl PollState {
    /// Returns the state label used in logs and errors.
    pub fn label(&self) -> &str {
        match self {
            PollState::Pending => STATE_PENDING,
            PollState::Reached => STATE_RESOLVE,
            PollState::NotFound => STATE_NOT_FOUND,
            PollState::Other(label) => label,
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a refresh call: the observed state plus an optional payload
/// handed back to the caller once the target is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed<T> {
    /// Fetched object, if any.
    pub payload: Option<T>,
    /// Observed state.
    pub state: PollState,
}

impl<T> Refreshed<T> {
    /// Still in progress.
    pub fn pending(payload: Option<T>) -> Self {
        Self {
            payload,
            state: PollState::Pending,
        }
    }

    /// Target reached.
    pub fn reached(payload: T) -> Self {
        Self {
            payload: Some(payload),
            state: PollState::Reached,
        }
    }

    /// Resource is gone.
    pub fn not_found() -> Self {
        Self {
            payload: None,
            state: PollState::NotFound,
        }
    }

    /// Some other backend state.
    pub fn other(label: impl Into<String>, payload: Option<T>) -> Self {
        Self {
            payload,
            state: PollState::Other(label.into()),
        }
    }
}

/// Handling of refresh states that are neither pending nor the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnexpectedStatePolicy {
    /// Log a warning and keep polling until the timeout.
    #[default]
    Retry,
    /// Abort the wait with [`NcloudError::UnexpectedState`].
    Fail,
}

/// Configuration of one wait loop.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// Operation name used in logs and errors (e.g., "activation").
    pub operation: String,
    /// Resource identity used in logs and errors.
    pub identity: String,
    /// State that ends the wait successfully.
    pub target: PollState,
    /// Bound on the whole wait, initial delay included.
    pub timeout: Duration,
    /// Delay before the first refresh.
    pub initial_delay: Duration,
    /// Minimum spacing between refreshes.
    pub min_interval: Duration,
    /// Maximum spacing between refreshes.
    pub max_interval: Duration,
    /// Handling of unexpected states.
    pub unexpected: UnexpectedStatePolicy,
}

impl StateChangeConf {
    /// Creates a wait with the default polling settings.
    pub fn new(
        operation: impl Into<String>,
        identity: impl Into<String>,
        target: PollState,
        timeout: Duration,
    ) -> Self {
        Self {
            operation: operation.into(),
            identity: identity.into(),
            target,
            timeout,
            initial_delay: WaitConfig::default().initial_delay(),
            min_interval: WaitConfig::default().min_interval(),
            max_interval: WaitConfig::default().max_interval(),
            unexpected: UnexpectedStatePolicy::default(),
        }
    }

    /// Applies the polling settings of a provider configuration.
    pub fn with_settings(mut self, settings: &WaitConfig) -> Self {
        self.initial_delay = settings.initial_delay();
        self.min_interval = settings.min_interval();
        self.max_interval = settings.max_interval();
        self.unexpected = settings.unexpected_state;
        self
    }

    /// Sets the delay before the first refresh.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the interval bounds.
    pub fn with_intervals(mut self, min: Duration, max: Duration) -> Self {
        self.min_interval = min;
        self.max_interval = max.max(min);
        self
    }

    /// Sets the unexpected state policy.
    pub fn with_unexpected(mut self, policy: UnexpectedStatePolicy) -> Self {
        self.unexpected = policy;
        self
    }

    /// Polls `refresh` until the target state is observed.
    ///
    /// Returns the payload of the refresh that reached the target.
    /// A refresh error aborts immediately with [`NcloudError::WaitFailed`];
    /// running out of time fails with [`NcloudError::Timeout`] carrying the
    /// last observed state.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> NcloudResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = NcloudResult<Refreshed<T>>>,
    {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);
        let mut last_state: Option<String> = None;
        let mut interval = self.min_interval;
        let mut polls: u32 = 0;

        debug!(
            operation = %self.operation,
            identity = %self.identity,
            target = %self.target,
            timeout = ?self.timeout,
            "Waiting for state"
        );

        time::sleep(self.initial_delay.min(self.timeout)).await;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(last_state.as_deref()));
            }

            polls += 1;
            let refreshed = match time::timeout(remaining, refresh()).await {
                Ok(Ok(refreshed)) => refreshed,
                Ok(Err(e)) => {
                    return Err(NcloudError::wait_failed(&self.operation, &self.identity, e));
                }
                Err(_) => return Err(self.timed_out(last_state.as_deref())),
            };

            if refreshed.state == self.target {
                info!(
                    operation = %self.operation,
                    identity = %self.identity,
                    polls,
                    elapsed = ?start.elapsed(),
                    "Reached {}",
                    self.target
                );
                return Ok(refreshed.payload);
            }

            match refreshed.state {
                PollState::Pending => {
                    debug!(
                        operation = %self.operation,
                        identity = %self.identity,
                        polls,
                        "Still pending"
                    );
                }
                ref state => match self.unexpected {
                    UnexpectedStatePolicy::Retry => {
                        warn!(
                            operation = %self.operation,
                            identity = %self.identity,
                            state = %state,
                            "Unexpected state, treating as pending"
                        );
                    }
                    UnexpectedStatePolicy::Fail => {
                        return Err(NcloudError::UnexpectedState {
                            operation: self.operation.clone(),
                            identity: self.identity.clone(),
                            state: state.label().to_string(),
                            expected: self.target.label().to_string(),
                        });
                    }
                },
            }
            last_state = Some(refreshed.state.label().to_string());

            // Don't start a refresh that would land past the deadline.
            let remaining = deadline.saturating_duration_since(Instant::now());
            if interval >= remaining {
                time::sleep(remaining).await;
                return Err(self.timed_out(last_state.as_deref()));
            }
            time::sleep(interval).await;
            interval = interval
                .saturating_mul(2)
                .min(self.max_interval)
                .max(self.min_interval);
        }
    }

    fn timed_out(&self, last_state: Option<&str>) -> NcloudError {
        NcloudError::timeout(
            &self.operation,
            &self.identity,
            self.timeout,
            last_state.unwrap_or("none"),
        )
    }
}
