use std::time::Duration;

use crate::support::helpers::{
    fetching, finished, init_tracing, stalled, MockRequest, MockResponse, StateRecorder, MOCK_ID,
};
use anyhow::Result;
use request_tracker::{Payload, RequestTracker, TrackerConfig};

fn tracker_for(
    requests: &[MockRequest],
    stalled_delay_ms: u64,
    recorder: &StateRecorder,
) -> Result<RequestTracker<MockResponse, MockResponse>> {
    let config = TrackerConfig::builder()
        .id(MOCK_ID)
        .requests(requests.iter().map(MockRequest::factory))
        .stalled_delay(Duration::from_millis(stalled_delay_ms))
        .on_state_change(recorder.callback())
        .build()?;
    Ok(RequestTracker::new(config))
}

fn three_requests() -> Vec<MockRequest> {
    vec![
        MockRequest::ok(50, MockResponse::new("first")),
        MockRequest::ok(60, MockResponse::new("second")),
        MockRequest::ok(40, MockResponse::new("third")),
    ]
}

fn expected_values() -> Vec<MockResponse> {
    vec![
        MockResponse::new("first"),
        MockResponse::new("second"),
        MockResponse::new("third"),
    ]
}

#[tokio::test(start_paused = true)]
async fn resolves_all_values_in_request_order_without_stall() -> Result<()> {
    init_tracing();
    let recorder = StateRecorder::new();
    let tracker = tracker_for(&three_requests(), 70, &recorder)?;

    let result = tracker.run().await;

    assert_eq!(recorder.calls(), vec![fetching(1), finished(1)]);
    assert_eq!(result, Ok(Payload::Many(expected_values())));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reports_stall_once_for_the_whole_set() -> Result<()> {
    init_tracing();
    let recorder = StateRecorder::new();
    let tracker = tracker_for(&three_requests(), 25, &recorder)?;

    let result = tracker.run().await;

    assert_eq!(recorder.calls(), vec![fetching(1), stalled(1), finished(1)]);
    assert_eq!(result, Ok(Payload::Many(expected_values())));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stall_is_measured_against_the_slowest_request() -> Result<()> {
    init_tracing();
    let recorder = StateRecorder::new();
    let requests = vec![
        MockRequest::ok(10, MockResponse::new("fast")),
        MockRequest::ok(80, MockResponse::new("slow")),
    ];
    let tracker = tracker_for(&requests, 50, &recorder)?;

    let result = tracker.run().await;

    assert_eq!(recorder.calls(), vec![fetching(1), stalled(1), finished(1)]);
    let values = result
        .map(Payload::into_vec)
        .map_err(|err| anyhow::anyhow!("{err:?}"))?;
    assert_eq!(
        values,
        vec![MockResponse::new("fast"), MockResponse::new("slow")]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn first_failure_wins() -> Result<()> {
    init_tracing();
    let recorder = StateRecorder::new();
    let requests = vec![
        MockRequest::ok(10, MockResponse::new("ok")),
        MockRequest::failing(30, MockResponse::new("late failure")),
        MockRequest::failing(20, MockResponse::new("early failure")),
    ];
    let tracker = tracker_for(&requests, 100, &recorder)?;

    let err = tracker
        .run()
        .await
        .expect_err("a failing request should fail the run");

    assert_eq!(err, MockResponse::new("early failure"));
    assert_eq!(recorder.calls(), vec![fetching(1), finished(1)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_factory_is_invoked_once_per_run() -> Result<()> {
    init_tracing();
    let recorder = StateRecorder::new();
    let requests = three_requests();
    let counters: Vec<_> = requests.iter().map(MockRequest::calls).collect();
    let tracker = tracker_for(&requests, 70, &recorder)?;

    for _ in 0..2 {
        let payload = tracker
            .run()
            .await
            .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(payload.len(), 3);
    }

    for counter in counters {
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
    Ok(())
}
