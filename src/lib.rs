// src/lib.rs
pub mod capture;
pub mod collector;
pub mod config;
pub mod error;
pub mod locator;
pub mod mouse;
pub mod retry;
pub mod session;
pub mod watcher;

pub use capture::{Frame, ScreenSource};
pub use collector::{CancelToken, Collector, CollectorStats, CycleOutcome};
pub use config::{Config, RetryPolicy, VirtualKey, SUN_COLOR};
pub use error::CollectorError;
pub use locator::{first_match, locate, locate_iter, MatchCoordinate};
pub use mouse::{actuate, Point, Pointer};
pub use session::run_until_exit;
pub use watcher::{ExitWatcher, KeySource};

#[cfg(windows)]
pub use capture::{mark_dpi_aware, GdiScreen};
#[cfg(windows)]
pub use mouse::Win32Pointer;
#[cfg(windows)]
pub use watcher::AsyncKeyState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
