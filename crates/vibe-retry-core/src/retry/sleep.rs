use std::time::Duration;

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Suspends the calling thread with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F> Sleeper for F
where
    F: Fn(Duration),
{
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}
