//! Realtime tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and buffering for the fan-out layer. All durations are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// How often the stale sweep runs.
    pub sweep_interval_secs: u64,
    /// Connections untouched for longer than this are evicted by the sweep.
    pub stale_after_secs: u64,
    /// Upper bound on a single write to a connection.
    pub write_timeout_secs: u64,
    /// Keep-alive period. 0 disables keep-alives.
    pub heartbeat_interval_secs: u64,
    /// Frames buffered per connection before writes start waiting.
    pub sink_buffer: usize,
    /// Idle time after which a board's publish worker exits.
    pub queue_idle_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            stale_after_secs: 300,
            write_timeout_secs: 5,
            heartbeat_interval_secs: 30,
            sink_buffer: 64,
            queue_idle_secs: 60,
        }
    }
}

impl RealtimeConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs.max(1))
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        match self.heartbeat_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn sink_buffer(&self) -> usize {
        self.sink_buffer.max(1)
    }

    pub fn queue_idle(&self) -> Duration {
        Duration::from_secs(self.queue_idle_secs.max(1))
    }
}
