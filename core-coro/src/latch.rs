//! One-shot countdown used to hand completion across threads.

use parking_lot::{Condvar, Mutex};

/// A single-use countdown latch.
///
/// Threads calling [`Latch::wait`] block until the count reaches zero.
/// Once released, a latch stays released.
pub struct Latch {
    count: Mutex<usize>,
    released: Condvar,
}

impl Latch {
    /// Creates a latch that opens after `count` calls to [`Latch::count_down`].
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    /// Decrements the count, waking every waiter when it reaches zero.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.released.notify_all();
        }
    }

    /// Returns `true` if the latch has opened.
    pub fn try_wait(&self) -> bool {
        *self.count.lock() == 0
    }

    /// Blocks until the latch opens.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.released.wait(&mut count);
        }
    }
}
