use std::time::Duration;

use rand::Rng;

use crate::pacing::{DelayRange, Pacer};

/// Wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `multiplier * 2^(attempt - 1)`, clamped to `[min, max]`.
    Exponential {
        multiplier: Duration,
        min: Duration,
        max: Duration,
    },
    Fixed(Duration),
    Jittered(DelayRange),
}

impl Backoff {
    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_after<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        match *self {
            Backoff::Exponential {
                multiplier,
                min,
                max,
            } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                multiplier.saturating_mul(factor).clamp(min, max)
            }
            Backoff::Fixed(delay) => delay,
            Backoff::Jittered(range) => range.sample(rng),
        }
    }
}

/// Bounded retry: which errors to retry is decided by the caller's
/// predicate, how long to wait by the backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Page loads: 3 attempts, exponential 1s base clamped to 4..10s.
    pub const fn navigation() -> Self {
        Self::new(
            3,
            Backoff::Exponential {
                multiplier: Duration::from_secs(1),
                min: Duration::from_secs(4),
                max: Duration::from_secs(10),
            },
        )
    }

    /// Whole-site attempts: 3, with a long jittered pause between them.
    pub const fn site() -> Self {
        Self::new(3, Backoff::Jittered(DelayRange::secs(5, 10)))
    }

    /// Detail-page date lookups: 3 attempts, 2..4s apart.
    pub const fn enhancement() -> Self {
        Self::new(3, Backoff::Jittered(DelayRange::secs(2, 4)))
    }

    /// Notification delivery: 3 attempts, 2s apart.
    pub const fn notification() -> Self {
        Self::new(3, Backoff::Fixed(Duration::from_secs(2)))
    }

    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Runs `op` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempts are used up. `op` receives the 1-based attempt number.
    pub fn run<T, E, F, P>(&self, pacer: &dyn Pacer, retryable: P, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if retryable(&err) && self.has_attempts_after(attempt) => {
                    pacer.pause(self.backoff.delay_after(attempt, &mut rand::thread_rng()));
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
