use std::time::Duration;

use jobwatch_core::Pacer;

/// Sleeps the calling thread. Browser work is blocking, so this is the
/// production pacer for sessions and pagination.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
