use std::cell::RefCell;
use std::time::Duration;

use jobwatch_core::{Backoff, DelayRange, Pacer, RetryPolicy};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingPacer {
    pauses: RefCell<Vec<Duration>>,
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

#[test]
fn navigation_backoff_is_exponential_and_clamped() {
    let policy = RetryPolicy::navigation();
    let mut rng = rand::thread_rng();
    let delays: Vec<_> = (1..=5)
        .map(|attempt| policy.backoff.delay_after(attempt, &mut rng))
        .collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(4),
            Duration::from_secs(4),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(10),
        ]
    );
}

#[test]
fn jittered_backoff_stays_in_range() {
    let range = DelayRange::secs(2, 4);
    let backoff = Backoff::Jittered(range);
    let mut rng = rand::thread_rng();
    for attempt in 1..50 {
        let delay = backoff.delay_after(attempt, &mut rng);
        assert!(delay >= range.min && delay <= range.max, "{delay:?}");
    }
}

#[test]
fn retries_retryable_errors_until_success() {
    let pacer = RecordingPacer::default();
    let policy = RetryPolicy::notification();
    let mut calls = Vec::new();

    let result: Result<&str, &str> = policy.run(&pacer, |_| true, |attempt| {
        calls.push(attempt);
        if attempt < 3 {
            Err("flaky")
        } else {
            Ok("sent")
        }
    });

    assert_eq!(result, Ok("sent"));
    assert_eq!(calls, vec![1, 2, 3]);
    assert_eq!(
        *pacer.pauses.borrow(),
        vec![Duration::from_secs(2), Duration::from_secs(2)]
    );
}

#[test]
fn gives_up_after_max_attempts() {
    let pacer = RecordingPacer::default();
    let mut calls = 0;
    let result: Result<(), &str> = RetryPolicy::navigation().run(&pacer, |_| true, |_| {
        calls += 1;
        Err("timeout")
    });
    assert_eq!(result, Err("timeout"));
    assert_eq!(calls, 3);
    assert_eq!(pacer.pauses.borrow().len(), 2);
}

#[test]
fn non_retryable_error_stops_immediately() {
    let pacer = RecordingPacer::default();
    let mut calls = 0;
    let result: Result<(), &str> = RetryPolicy::notification().run(
        &pacer,
        |err| *err != "message is too long",
        |_| {
            calls += 1;
            Err("message is too long")
        },
    );
    assert_eq!(result, Err("message is too long"));
    assert_eq!(calls, 1);
    assert!(pacer.pauses.borrow().is_empty());
}
