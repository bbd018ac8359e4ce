//! Polling helpers for tests that cross threads.

use std::time::{Duration, Instant};

/// Poll `condition` every millisecond until it holds or `timeout` elapses.
/// Returns the final value of the condition.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
