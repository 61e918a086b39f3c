use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::capture::ScreenSource;
use crate::config::Config;
use crate::error::{CollectorError, Result};
use crate::locator::{first_match, MatchCoordinate};
use crate::mouse::{actuate, Pointer};
use crate::retry::Backoff;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared stop flag. The collector only looks at it between cycles and while
/// it waits, never in the middle of a capture or a click.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<CancelState>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        *self.0.cancelled.lock() = true;
        self.0.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.cancelled.lock()
    }

    /// Blocks for `timeout` or until cancelled, whichever comes first.
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut cancelled = self.0.cancelled.lock();
        if !*cancelled {
            let _ = self
                .0
                .wake
                .wait_while_for(&mut cancelled, |cancelled| !*cancelled, timeout);
        }
        *cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing on screen had the target color.
    Idle,
    /// Clicked the first match and put the pointer back.
    Collected(MatchCoordinate),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub cycles: u64,
    pub collected: u64,
    pub retries: u64,
}

/// Scan-and-click engine: capture, find the first target pixel, click it.
pub struct Collector<S, P> {
    config: Config,
    screen: S,
    pointer: P,
    stats: CollectorStats,
}

impl<S: ScreenSource, P: Pointer> Collector<S, P> {
    pub fn new(config: Config, screen: S, pointer: P) -> Self {
        Self {
            config,
            screen,
            pointer,
            stats: CollectorStats::default(),
        }
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    /// One capture, one scan, and at most one click.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let frame = self.screen.capture()?;
        let Some(target) = first_match(&frame, self.config.target_color) else {
            return Ok(CycleOutcome::Idle);
        };
        drop(frame);

        actuate(&mut self.pointer, target.to_point())?;
        Ok(CycleOutcome::Collected(target))
    }

    /// Loops until `cancel` is set. Capture and input failures back off per
    /// the retry policy; anything else, or an exhausted budget, ends the loop.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<CollectorStats> {
        let mut backoff = Backoff::new(self.config.retry);
        info!(
            "[COLLECTOR] Scanning for color {:02X?} every cycle",
            self.config.target_color
        );

        while !cancel.is_cancelled() {
            self.stats.cycles += 1;
            match self.run_cycle() {
                Ok(CycleOutcome::Idle) => backoff.reset(),
                Ok(CycleOutcome::Collected(at)) => {
                    backoff.reset();
                    self.stats.collected += 1;
                    debug!("[COLLECTOR] Collected at x={} y={}", at.col, at.row);
                    cancel.wait_timeout(self.config.pacing_delay);
                }
                Err(e) if e.is_retryable() => match backoff.next_delay() {
                    Some(delay) => {
                        self.stats.retries += 1;
                        warn!(
                            "[COLLECTOR] {} (attempt {}), retrying in {:?}",
                            e,
                            backoff.failures(),
                            delay
                        );
                        cancel.wait_timeout(delay);
                    }
                    None => {
                        return Err(CollectorError::RetriesExhausted {
                            attempts: backoff.failures(),
                            last: Box::new(e),
                        })
                    }
                },
                Err(e) => return Err(e),
            }
        }

        info!(
            "[COLLECTOR] Stopped after {} cycles, {} collected",
            self.stats.cycles, self.stats.collected
        );
        Ok(self.stats)
    }
}
