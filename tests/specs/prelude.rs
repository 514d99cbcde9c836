//! Shared helpers for behavioral specs

#![allow(dead_code, unused_imports)]

pub use std::path::Path;
pub use std::sync::{Arc, Mutex};
pub use std::thread;
pub use std::time::Duration;
pub use tp_buffer::{BlockingBuffer, Buffer};
pub use tp_core::{BackoffConfig, BufferConfig, CoreConfig, Record, StateConfig};
pub use tp_sink::{
    BatchRequest, BulkRetry, DeliveryError, DeliveryReport, FailureCause, FailureObserver,
    FakeBulkSink, FakeFailure, FakeSinkError, FakeStep, ItemResponse, LogFailures, StatusPolicy,
    TracedBulkSink,
};
pub use tp_storage::{DurableState, JsonCodec, ProcessorState, StateError};

/// Install a test log writer once; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Observer collecting abandoned items with their cause text
#[derive(Clone)]
pub struct Abandoned<I> {
    items: Arc<Mutex<Vec<(I, String)>>>,
}

impl<I> Default for Abandoned<I> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<I: Clone> Abandoned<I> {
    pub fn items(&self) -> Vec<I> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .map(|(item, _)| item.clone())
            .collect()
    }

    pub fn causes(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cause)| cause.clone())
            .collect()
    }
}

impl<I, F, E> FailureObserver<I, F, E> for Abandoned<I>
where
    I: Send,
    F: std::fmt::Display,
    E: std::fmt::Display,
{
    fn on_failure(&self, item: I, cause: FailureCause<F, E>) {
        self.items.lock().unwrap().push((item, cause.to_string()));
    }
}

pub fn ok() -> ItemResponse<FakeFailure> {
    ItemResponse::Success
}

pub fn failed(status: u16) -> ItemResponse<FakeFailure> {
    ItemResponse::Failure(FakeFailure::new(status, format!("status {}", status)))
}

pub fn request<I>(items: impl IntoIterator<Item = I>) -> BatchRequest<I> {
    items.into_iter().collect()
}
