//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod memory;
pub mod runtime;

pub use memory::InMemoryStore;
pub use runtime::{
    FixedClock, ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper, instant_retrier,
};
