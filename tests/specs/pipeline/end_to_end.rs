//! End-to-end pipeline specs
//!
//! A source thread feeds the buffer, a consumer folds each batch into
//! processor state and ships it through the retrying sink.

use crate::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
struct Metric {
    name: &'static str,
    value: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Totals {
    count: u64,
    sum: u64,
}

const CONFIG: &str = r#"
[buffer]
capacity = 16
batch_size = 4

[backoff]
initial_delay = "10ms"
max_retries = 3

[state]
compact_after = 5
"#;

fn source(buffer: Arc<BlockingBuffer<Metric>>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for i in 0..12u64 {
            let name = if i % 2 == 0 { "cpu" } else { "mem" };
            buffer
                .write(Record::new(Metric { name, value: i }), Duration::from_secs(1))
                .unwrap();
        }
    })
}

#[tokio::test(start_paused = true)]
async fn metrics_are_aggregated_and_delivered() {
    init_tracing();
    let config = CoreConfig::from_toml_str(CONFIG).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let buffer = Arc::new(BlockingBuffer::from_config(&config.buffer).unwrap());
    source(Arc::clone(&buffer)).join().unwrap();

    let state: DurableState<Totals> =
        DurableState::open_with(dir.path(), "totals", JsonCodec, &config.state).unwrap();
    let sink = FakeBulkSink::with_script([
        FakeStep::Respond(vec![ok(), failed(400), ok(), ok()]),
        FakeStep::Respond(vec![failed(503), ok(), ok(), ok()]),
    ]);
    let abandoned = Abandoned::default();
    let engine = BulkRetry::new(
        TracedBulkSink::new(sink.clone()),
        StatusPolicy::default(),
        abandoned.clone(),
        config.backoff.clone(),
    );

    let mut reports = Vec::new();
    loop {
        let batch = buffer.read(Duration::ZERO);
        if batch.is_empty() {
            break;
        }
        let metrics: Vec<Metric> = batch.into_iter().map(Record::into_data).collect();

        for metric in &metrics {
            let key = metric.name.as_bytes();
            let mut totals = state.get(key).unwrap().unwrap_or_default();
            totals.count += 1;
            totals.sum += metric.value;
            state.put(key, &totals).unwrap();
        }

        reports.push(engine.execute(request(metrics)).await.unwrap());
    }

    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|r| r.attempts).collect::<Vec<_>>(),
        vec![1, 2, 1]
    );
    assert_eq!(reports.iter().map(|r| r.delivered).sum::<usize>(), 11);
    assert_eq!(abandoned.items(), vec![Metric { name: "mem", value: 1 }]);

    state.close().unwrap();
    let state: DurableState<Totals> = DurableState::open(dir.path(), "totals").unwrap();
    assert_eq!(
        state.get_all().unwrap().into_iter().collect::<Vec<_>>(),
        vec![
            (b"cpu".to_vec(), Totals { count: 6, sum: 30 }),
            (b"mem".to_vec(), Totals { count: 6, sum: 36 }),
        ]
    );
}
