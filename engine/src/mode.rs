//! Operational mode gate.
//!
//! Tracks whether the shop is temporarily closed. Reading the gate has a side
//! effect: when the number of open orders has reached the configured
//! threshold, the read itself flips the shop into closed mode. There is no
//! timer; every customer-facing entry point runs the check.

use crate::error::Result;
use crate::settings::SleepMode;
use crate::{AdminGrant, Error, OrderStatus, SharedStore, Timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Format of the human-readable end time.
const END_TIME_FORMAT: &str = "%H:%M %d.%m.%Y";

/// Snapshot of the gate as seen by one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeStatus {
    pub closed: bool,
    pub end_time: Option<String>,
}

impl From<&SleepMode> for ModeStatus {
    fn from(mode: &SleepMode) -> Self {
        Self {
            closed: mode.enabled,
            end_time: mode.end_time.clone(),
        }
    }
}

/// Render a timestamp as an end-time label.
pub fn end_time_label(at: Timestamp) -> String {
    i64::try_from(at)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format(END_TIME_FORMAT).to_string())
        .unwrap_or_else(|| at.to_string())
}

/// The closed-mode gate consulted before every reservation.
#[derive(Clone)]
pub struct ModeGate {
    store: SharedStore,
    auto_close_threshold: Option<u64>,
    close_window_ms: u64,
}

impl ModeGate {
    /// Create a gate. `auto_close_threshold` of `None` never auto-closes.
    pub fn new(
        store: SharedStore,
        auto_close_threshold: Option<u64>,
        close_window_ms: u64,
    ) -> Self {
        Self {
            store,
            auto_close_threshold,
            close_window_ms,
        }
    }

    /// Read the current status, auto-closing the shop first if too many
    /// orders are open.
    ///
    /// The end time is advisory: the shop does not reopen by itself when it
    /// passes. Only [`ModeGate::disable`] reopens it.
    pub async fn check(&self, now: Timestamp) -> Result<ModeStatus> {
        let mode = self.store.sleep_mode().await?;
        if mode.enabled {
            return Ok(ModeStatus::from(&mode));
        }

        let Some(threshold) = self.auto_close_threshold else {
            return Ok(ModeStatus::from(&mode));
        };

        let open = self.store.count_orders(&OrderStatus::OPEN).await?;
        if open < threshold {
            return Ok(ModeStatus::from(&mode));
        }

        let end_time = end_time_label(now + self.close_window_ms);
        let engaged = self
            .store
            .update_sleep_mode(mode.version, true, Some(end_time.clone()))
            .await?;

        if engaged {
            tracing::info!(open_orders = open, threshold, end_time = %end_time, "Auto-closed shop");
            return Ok(ModeStatus {
                closed: true,
                end_time: Some(end_time),
            });
        }

        // Someone else changed the record first; report what they wrote.
        let current = self.store.sleep_mode().await?;
        Ok(ModeStatus::from(&current))
    }

    /// Fail with [`Error::OperationalModeClosed`] when the shop is closed.
    pub async fn ensure_open(&self, now: Timestamp) -> Result<()> {
        let status = self.check(now).await?;
        if status.closed {
            return Err(Error::OperationalModeClosed {
                end_time: status.end_time,
            });
        }
        Ok(())
    }

    /// Close the shop with an operator-chosen end time label.
    pub async fn enable(
        &self,
        _grant: &AdminGrant,
        end_time: Option<String>,
    ) -> Result<ModeStatus> {
        self.write(true, end_time).await
    }

    /// Reopen the shop.
    pub async fn disable(&self, _grant: &AdminGrant) -> Result<ModeStatus> {
        self.write(false, None).await
    }

    async fn write(&self, enabled: bool, end_time: Option<String>) -> Result<ModeStatus> {
        // An admin write wins over a concurrent auto-close: retry on a lost CAS.
        loop {
            let mode = self.store.sleep_mode().await?;
            if self
                .store
                .update_sleep_mode(mode.version, enabled, end_time.clone())
                .await?
            {
                tracing::info!(enabled, end_time = ?end_time, "Operational mode changed");
                return Ok(ModeStatus {
                    closed: enabled,
                    end_time,
                });
            }
        }
    }
}
