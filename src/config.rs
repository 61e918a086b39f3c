use std::fmt;
use std::time::Duration;

/// Color of a collectible sun, as rendered by the game.
pub const SUN_COLOR: [u8; 3] = [0xFE, 0xF6, 0x01];

/// Win32 virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualKey(pub i32);

impl VirtualKey {
    pub const K: VirtualKey = VirtualKey(0x4B);

    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match u8::try_from(self.0).ok().map(char::from) {
            Some(c) if c.is_ascii_uppercase() || c.is_ascii_digit() => write!(f, "{}", c),
            _ => write!(f, "VK 0x{:02X}", self.0),
        }
    }
}

/// Bounded exponential backoff for capture and input failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before the loop gives up, including the last one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub target_color: [u8; 3],
    /// Pause after each collection so the game can settle before the next capture.
    pub pacing_delay: Duration,
    pub exit_key: VirtualKey,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// How long a stop waits for the collector to finish its current cycle.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_color: SUN_COLOR,
            pacing_delay: Duration::from_millis(100),
            exit_key: VirtualKey::K,
            poll_interval: Duration::from_millis(10),
            retry: RetryPolicy::default(),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn with_target_color(mut self, color: [u8; 3]) -> Self {
        self.target_color = color;
        self
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    pub fn with_exit_key(mut self, key: VirtualKey) -> Self {
        self.exit_key = key;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
