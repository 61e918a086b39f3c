use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::Rgb;
use parking_lot::Mutex;
use sun_collector::error::Result;
use sun_collector::*;

/// Sun at (x=4, y=2) on the first capture only, blank afterwards.
struct OneSunScreen {
    captures: Arc<AtomicUsize>,
}

impl ScreenSource for OneSunScreen {
    fn capture(&mut self) -> Result<Frame> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        let mut frame = Frame::from_pixel(8, 8, Rgb([10, 20, 30]));
        if n == 0 {
            frame.put_pixel(4, 2, Rgb(SUN_COLOR));
        }
        Ok(frame)
    }
}

/// A capture that blocks far longer than any shutdown grace period.
struct HangingScreen {
    capturing: Arc<AtomicBool>,
}

impl ScreenSource for HangingScreen {
    fn capture(&mut self) -> Result<Frame> {
        self.capturing.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_secs(3));
        Ok(Frame::from_pixel(2, 2, Rgb([0, 0, 0])))
    }
}

/// Exit key goes down once the screen is stuck in a capture.
struct KeyWhileCapturing {
    capturing: Arc<AtomicBool>,
}

impl KeySource for KeyWhileCapturing {
    fn is_pressed(&self, _key: VirtualKey) -> Result<bool> {
        Ok(self.capturing.load(Ordering::SeqCst))
    }
}

struct BrokenScreen;

impl ScreenSource for BrokenScreen {
    fn capture(&mut self) -> Result<Frame> {
        Err(CollectorError::Capture("display session lost".to_string()))
    }
}

#[derive(Default)]
struct Desk {
    at: Point,
    clicks: Vec<Point>,
}

#[derive(Clone, Default)]
struct SharedPointer(Arc<Mutex<Desk>>);

impl Pointer for SharedPointer {
    fn position(&mut self) -> Result<Point> {
        Ok(self.0.lock().at)
    }

    fn move_to(&mut self, to: Point) -> Result<()> {
        self.0.lock().at = to;
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        let mut desk = self.0.lock();
        let at = desk.at;
        desk.clicks.push(at);
        Ok(())
    }
}

/// Exit key goes down once the screen has been captured `after` times.
struct KeyAfterCaptures {
    captures: Arc<AtomicUsize>,
    after: usize,
}

impl KeySource for KeyAfterCaptures {
    fn is_pressed(&self, _key: VirtualKey) -> Result<bool> {
        Ok(self.captures.load(Ordering::SeqCst) >= self.after)
    }
}

struct NeverPressed;

impl KeySource for NeverPressed {
    fn is_pressed(&self, _key: VirtualKey) -> Result<bool> {
        Ok(false)
    }
}

struct DeadKeyboard;

impl KeySource for DeadKeyboard {
    fn is_pressed(&self, _key: VirtualKey) -> Result<bool> {
        Err(CollectorError::KeyPoll("keyboard hook unavailable".to_string()))
    }
}

fn config() -> Config {
    Config::default()
        .with_pacing_delay(Duration::from_millis(1))
        .with_poll_interval(Duration::from_millis(1))
        .with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        })
}

#[tokio::test]
async fn exit_key_stops_after_collecting_and_restoring() {
    let captures = Arc::new(AtomicUsize::new(0));
    let pointer = SharedPointer::default();
    pointer.0.lock().at = Point::new(300, 150);

    let stats = run_until_exit(
        config(),
        OneSunScreen {
            captures: captures.clone(),
        },
        pointer.clone(),
        KeyAfterCaptures {
            captures: captures.clone(),
            after: 3,
        },
    )
    .await
    .unwrap();

    assert_eq!(stats.collected, 1);
    assert!(stats.cycles >= 3);
    let desk = pointer.0.lock();
    assert_eq!(desk.clicks, vec![Point::new(4, 2)]);
    assert_eq!(desk.at, Point::new(300, 150));
}

#[tokio::test]
async fn fatal_capture_failure_ends_the_session() {
    let err = run_until_exit(config(), BrokenScreen, SharedPointer::default(), NeverPressed)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CollectorError::RetriesExhausted { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn key_poll_failure_stops_the_worker_and_is_reported() {
    let captures = Arc::new(AtomicUsize::new(0));
    let pointer = SharedPointer::default();
    pointer.0.lock().at = Point::new(1, 1);

    let err = run_until_exit(
        config(),
        OneSunScreen { captures },
        pointer.clone(),
        DeadKeyboard,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CollectorError::KeyPoll(_)));
    assert_eq!(pointer.0.lock().at, Point::new(1, 1));
}

#[tokio::test]
async fn exit_key_is_honoured_while_capture_hangs() {
    let capturing = Arc::new(AtomicBool::new(false));
    let config = config().with_shutdown_grace(Duration::from_millis(100));

    let started = Instant::now();
    let err = run_until_exit(
        config,
        HangingScreen {
            capturing: capturing.clone(),
        },
        SharedPointer::default(),
        KeyWhileCapturing { capturing },
    )
    .await
    .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(err, CollectorError::WorkerStalled { .. }));
}
