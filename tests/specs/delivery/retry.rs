//! Bulk delivery specs
//!
//! Verify partial-failure retry behavior through the public engine API.

use crate::prelude::*;

fn engine(
    sink: FakeBulkSink<u32>,
    backoff: BackoffConfig,
) -> (
    BulkRetry<TracedBulkSink<FakeBulkSink<u32>>, StatusPolicy, Abandoned<u32>>,
    Abandoned<u32>,
) {
    init_tracing();
    let abandoned = Abandoned::default();
    let engine = BulkRetry::new(
        TracedBulkSink::new(sink),
        StatusPolicy::default(),
        abandoned.clone(),
        backoff,
    );
    (engine, abandoned)
}

#[tokio::test(start_paused = true)]
async fn healthy_sink_gets_one_attempt() {
    let sink = FakeBulkSink::new();
    let (engine, abandoned) = engine(sink.clone(), BackoffConfig::default());

    let report = engine.execute(request(1..=10)).await.unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(report.delivered, 10);
    assert!(abandoned.items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn errors_then_mixed_response_then_success() {
    let sink = FakeBulkSink::with_script([
        FakeStep::Fail(FakeSinkError::Transport("connection refused".into())),
        FakeStep::Fail(FakeSinkError::Rejected {
            status: 429,
            reason: "es_rejected_execution_exception".into(),
        }),
        FakeStep::Respond(vec![ok(), failed(400), failed(500), failed(429)]),
        FakeStep::Respond(vec![ok(), ok()]),
    ]);
    let (engine, abandoned) = engine(sink.clone(), BackoffConfig::default());

    let report = engine.execute(request([1, 2, 3, 4])).await.unwrap();

    assert_eq!(report.attempts, 4);
    assert_eq!(abandoned.items(), vec![2]);
    assert_eq!(abandoned.causes(), vec!["item failed: [400] status 400"]);
    assert_eq!(sink.requests().last().unwrap(), &vec![3, 4]);
}

#[tokio::test(start_paused = true)]
async fn bounded_backoff_abandons_stubborn_items() {
    let sink = FakeBulkSink::with_script([
        FakeStep::Respond(vec![ok(), failed(503)]),
        // Later attempts only carry the stubborn item
        FakeStep::Respond(vec![failed(503)]),
        FakeStep::Respond(vec![failed(503)]),
    ]);
    let backoff = BackoffConfig::default().with_max_retries(1);
    let (engine, abandoned) = engine(sink.clone(), backoff);

    let report = engine.execute(request([10, 20])).await.unwrap();

    assert_eq!(report.attempts, 2);
    assert_eq!(abandoned.items(), vec![20]);
    assert!(!report.is_success());
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_waiting_delivery() {
    let sink = FakeBulkSink::with_script([FakeStep::Fail(FakeSinkError::Transport(
        "timeout".into(),
    ))]);
    let (engine, abandoned) = engine(sink, BackoffConfig::new(Duration::from_secs(30)));
    let shutdown = engine.cancellation_token();

    let delivery = tokio::spawn(async move { engine.execute(request([1])).await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown.cancel();

    assert_eq!(delivery.await.unwrap(), Err(DeliveryError::Interrupted));
    assert!(abandoned.items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn logging_observer_accepts_failures() {
    init_tracing();
    let sink = FakeBulkSink::with_script([FakeStep::Respond(vec![failed(404)])]);
    let engine = BulkRetry::new(
        sink,
        StatusPolicy::default(),
        LogFailures,
        BackoffConfig::default(),
    );

    let report = engine.execute(request(["gone"])).await.unwrap();

    assert_eq!(report.failed, 1);
}
