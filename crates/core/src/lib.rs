// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-core: shared building blocks for the telemetry pipeline
//!
//! This crate provides:
//! - `Record<T>`, the unit of data passed between pipeline stages
//! - The exponential backoff sequence used by sink retries
//! - Configuration sections for the buffer, backoff, and processor state

pub mod backoff;
pub mod config;
pub mod record;

pub use backoff::ExponentialBackoff;
pub use config::{BackoffConfig, BufferConfig, ConfigError, CoreConfig, StateConfig};
pub use record::Record;
