#![forbid(unsafe_code)]

//! Runtime configuration.

use std::time::Duration;

/// Default minimum pause between two queued calls of one lane.
pub const DEFAULT_CALL_GAP: Duration = Duration::from_millis(10);

/// How queued calls are grouped into sequential lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueScope {
    /// One process-wide lane: every call waits for every earlier call.
    #[default]
    Global,
    /// One lane per bound key; different keys run independently.
    PerKey,
}

/// Settings of a [`ModalRuntime`](crate::ModalRuntime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Minimum time between the end of one call and the start of the next
    /// call in the same lane.
    pub call_gap: Duration,
    pub queue_scope: QueueScope,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            call_gap: DEFAULT_CALL_GAP,
            queue_scope: QueueScope::Global,
        }
    }
}

impl RuntimeConfig {
    pub fn call_gap(mut self, gap: Duration) -> Self {
        self.call_gap = gap;
        self
    }

    pub fn queue_scope(mut self, scope: QueueScope) -> Self {
        self.queue_scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let config = RuntimeConfig::default();
        assert_eq!(config.call_gap, Duration::from_millis(10));
        assert_eq!(config.queue_scope, QueueScope::Global);

        let config = config
            .call_gap(Duration::ZERO)
            .queue_scope(QueueScope::PerKey);
        assert_eq!(config.call_gap, Duration::ZERO);
        assert_eq!(config.queue_scope, QueueScope::PerKey);
    }
}
