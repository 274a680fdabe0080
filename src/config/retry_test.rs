use std::time::Duration;

use super::*;
use crate::Error;

#[test]
fn backoff_should_return_exactly_max_retry_count_delays() {
    for count in 0..6 {
        assert_eq!(RetryPolicy::constant(100, count).backoff().unwrap().len(), count as usize);
        assert_eq!(RetryPolicy::exponential(100, count).backoff().unwrap().len(), count as usize);
    }
}

#[test]
fn constant_backoff_should_repeat_interval() {
    let delays = RetryPolicy::constant(250, 3).backoff().unwrap();

    assert_eq!(delays, vec![Duration::from_millis(250); 3]);
}

#[test]
fn exponential_backoff_should_double_each_wait() {
    let delays = RetryPolicy::exponential(100, 4).backoff().unwrap();

    assert_eq!(
        delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(800),
        ]
    );
}

#[test]
fn exponential_backoff_should_respect_max_interval() {
    let policy = RetryPolicy {
        max_interval: 300,
        ..RetryPolicy::exponential(100, 5)
    };

    let delays = policy.backoff().unwrap();
    assert_eq!(delays[2], Duration::from_millis(300));
    assert_eq!(delays[4], Duration::from_millis(300));
}

#[test]
fn exponential_backoff_should_not_overflow_for_long_sequences() {
    let delays = RetryPolicy::exponential(1, 40).backoff().unwrap();

    assert_eq!(delays.len(), 40);
    assert_eq!(delays[39], Duration::from_millis(30_000));
}

#[test]
fn unset_type_should_default_to_exponential() {
    let policy = RetryPolicy {
        interval: 10,
        max_retry_count: 3,
        policy_type: None,
        max_interval: 1000,
    };

    assert_eq!(policy.backoff_type(), BackoffType::Exponential);
    assert_eq!(policy.backoff().unwrap()[2], Duration::from_millis(40));
}

#[test]
fn zero_interval_should_be_valid() {
    let delays = RetryPolicy::exponential(0, 2).backoff().unwrap();
    assert_eq!(delays, vec![Duration::ZERO, Duration::ZERO]);
}

#[test]
fn negative_values_should_be_rejected() {
    assert!(matches!(
        RetryPolicy::constant(-1, 3).backoff(),
        Err(Error::InvalidRetryPolicy(_))
    ));
    assert!(matches!(
        RetryPolicy::exponential(10, -3).backoff(),
        Err(Error::InvalidRetryPolicy(_))
    ));
}
