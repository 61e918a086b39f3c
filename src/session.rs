//! Wires the collector worker and the exit watcher together for one run.

use std::time::Duration;

use log::{info, warn};
use tokio::task::{spawn_blocking, JoinError, JoinHandle};
use tokio::time::timeout;

use crate::capture::ScreenSource;
use crate::collector::{CancelToken, Collector, CollectorStats};
use crate::config::Config;
use crate::error::{CollectorError, Result};
use crate::mouse::Pointer;
use crate::watcher::{ExitWatcher, KeySource};

enum Stopped {
    ByWatcher(Result<()>),
    ByWorker(std::result::Result<Result<CollectorStats>, JoinError>),
}

/// Runs the collector on a blocking worker while the current task watches the
/// exit key.
///
/// Whichever side stops first cancels the other. On a key press the worker
/// gets `shutdown_grace` to finish the cycle in flight, so a click already
/// started still restores the pointer. A worker stuck past that is abandoned
/// with [`CollectorError::WorkerStalled`]; the caller should end the process
/// rather than wait on it.
pub async fn run_until_exit<S, P, K>(
    config: Config,
    screen: S,
    pointer: P,
    keys: K,
) -> Result<CollectorStats>
where
    S: ScreenSource + Send + 'static,
    P: Pointer + Send + 'static,
    K: KeySource,
{
    let grace = config.shutdown_grace;
    let cancel = CancelToken::new();
    let watcher = ExitWatcher::new(keys, &config);
    let mut collector = Collector::new(config, screen, pointer);

    let worker_cancel = cancel.clone();
    let mut worker: JoinHandle<Result<CollectorStats>> =
        spawn_blocking(move || collector.run(&worker_cancel));

    info!("[SESSION] Collector running; press {} to stop", watcher.key());

    let stopped = tokio::select! {
        watched = watcher.watch(&cancel) => Stopped::ByWatcher(watched),
        joined = &mut worker => Stopped::ByWorker(joined),
    };
    cancel.cancel();

    match stopped {
        Stopped::ByWatcher(watched) => {
            let stats = join_within(worker, grace).await;
            watched.and(stats)
        }
        Stopped::ByWorker(joined) => flatten(joined),
    }
}

async fn join_within(
    worker: JoinHandle<Result<CollectorStats>>,
    grace: Duration,
) -> Result<CollectorStats> {
    match timeout(grace, worker).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(
                "[SESSION] Collector did not stop within {:?}; abandoning it",
                grace
            );
            Err(CollectorError::WorkerStalled { grace })
        }
    }
}

fn flatten(joined: std::result::Result<Result<CollectorStats>, JoinError>) -> Result<CollectorStats> {
    joined.map_err(|e| CollectorError::Worker(e.to_string()))?
}
