//! The operational-mode settings record.

use serde::{Deserialize, Serialize};

/// Key of the singleton settings document.
pub const SLEEP_MODE_SETTING: &str = "sleep_mode";

/// Singleton record tracking whether the shop is temporarily closed.
///
/// Lives in the shared store next to products and carts. Every change goes
/// through a compare-and-set on `version`, so two writers never overwrite
/// each other silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepMode {
    /// Whether new reservations are refused
    pub enabled: bool,
    /// Human-readable end of the closed window; advisory only
    pub end_time: Option<String>,
    /// Incremented on every successful update
    pub version: u64,
}

impl SleepMode {
    /// The record as it is before first boot writes anything.
    pub fn initial() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_open() {
        let mode = SleepMode::initial();
        assert!(!mode.enabled);
        assert_eq!(mode.end_time, None);
        assert_eq!(mode.version, 0);
    }
}
