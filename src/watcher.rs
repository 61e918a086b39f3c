use std::time::Duration;

use log::{error, info};
use tokio::time::sleep;

use crate::collector::CancelToken;
use crate::config::{Config, VirtualKey};
use crate::error::Result;

/// Synchronous "is this key held right now?" query.
pub trait KeySource {
    fn is_pressed(&self, key: VirtualKey) -> Result<bool>;
}

#[cfg(windows)]
pub use self::win32::AsyncKeyState;

#[cfg(windows)]
mod win32 {
    use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

    use super::KeySource;
    use crate::config::VirtualKey;
    use crate::error::Result;

    // High bit set while the key is down.
    const KEY_PRESSED_MASK: i16 = -32768i16;

    /// Global key state through `GetAsyncKeyState`; works without focus.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct AsyncKeyState;

    impl KeySource for AsyncKeyState {
        fn is_pressed(&self, key: VirtualKey) -> Result<bool> {
            let state = unsafe { GetAsyncKeyState(key.code()) };
            Ok(state & KEY_PRESSED_MASK != 0)
        }
    }
}

/// Polls the exit key and cancels the collector the first time it is seen down.
pub struct ExitWatcher<K> {
    keys: K,
    key: VirtualKey,
    poll_interval: Duration,
}

impl<K: KeySource> ExitWatcher<K> {
    pub fn new(keys: K, config: &Config) -> Self {
        Self {
            keys,
            key: config.exit_key,
            poll_interval: config.poll_interval,
        }
    }

    pub fn key(&self) -> VirtualKey {
        self.key
    }

    /// Returns once the key is pressed or the token is cancelled elsewhere.
    /// A failed key query cancels the token too, then surfaces the error.
    pub async fn watch(&self, cancel: &CancelToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            match self.keys.is_pressed(self.key) {
                Ok(true) => {
                    info!("[WATCHER] {} pressed, stopping", self.key);
                    cancel.cancel();
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    error!("[WATCHER] {}; stopping so the collector can't run unattended", e);
                    cancel.cancel();
                    return Err(e);
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}
