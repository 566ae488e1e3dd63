// SPDX-License-Identifier: MPL-2.0

//! The common utils for the integration tests

use std::time::{Duration, Instant};

use sysv_sem::{Key, SemOptions, SemaphoreSet};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a fresh private set with `count` counters set to `initial`.
pub fn private_set(count: usize, initial: u16) -> SemaphoreSet {
    init_logger();
    SemOptions::new()
        .count(count)
        .initial_value(initial)
        .open(Key::PRIVATE)
        .unwrap()
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}
