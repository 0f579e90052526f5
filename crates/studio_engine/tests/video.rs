mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    done_with, done_without_result, network_error, RecordingSink, ScriptedApi, StaticFetcher,
};
use studio_engine::{
    decode_data_uri, run_video_job, EngineEvent, FlowError, Stage, VideoFlowSettings, VideoJob,
};
use tokio_util::sync::CancellationToken;

fn settings() -> VideoFlowSettings {
    VideoFlowSettings {
        poll_interval: Duration::from_secs(10),
        caption_interval: Duration::from_secs(7),
    }
}

#[tokio::test(start_paused = true)]
async fn job_is_delivered_after_reschedules() {
    let api = ScriptedApi::with_polls(vec![
        Ok(VideoJob::pending("operations/op1")),
        Ok(VideoJob::pending("operations/op1")),
        Ok(done_with("https://files.example/clip")),
    ]);
    let fetcher = StaticFetcher::ok(b"mp4-bytes", None);
    let sink = RecordingSink::default();
    let cancel = CancellationToken::new();

    let delivery = run_video_job(&api, &fetcher, 1, "a drone shot", &settings(), &cancel, &sink)
        .await
        .unwrap();

    assert_eq!(delivery.polls, 3);
    assert_eq!(sink.poll_attempts(), vec![1, 2]);
    let decoded = decode_data_uri(&delivery.data_uri).unwrap();
    assert_eq!(decoded.mime_type, "video/mp4");
    assert_eq!(decoded.bytes, b"mp4-bytes");
    assert_eq!(fetcher.urls(), vec!["https://files.example/clip".to_string()]);

    // Pending for 20s: captions at 7s and 14s.
    assert_eq!(sink.caption_ticks(), 2);

    let stages: Vec<Stage> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress { stage, .. } => Some(stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages.first(), Some(&Stage::Submitting));
    assert_eq!(stages.last(), Some(&Stage::Done));
}

#[tokio::test(start_paused = true)]
async fn done_on_first_poll_is_never_rescheduled() {
    let api = ScriptedApi::with_polls(vec![Ok(done_with("https://files.example/clip"))]);
    let fetcher = StaticFetcher::ok(b"x", Some("video/webm"));
    let sink = RecordingSink::default();

    let delivery = run_video_job(
        &api,
        &fetcher,
        1,
        "p",
        &settings(),
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(delivery.polls, 1);
    assert!(sink.poll_attempts().is_empty());
    assert_eq!(sink.caption_ticks(), 0);
    assert!(delivery.data_uri.starts_with("data:video/webm;base64,"));
}

#[tokio::test(start_paused = true)]
async fn done_without_locator_fails_and_skips_fetch() {
    let api = ScriptedApi::with_polls(vec![
        Ok(VideoJob::pending("operations/op1")),
        Ok(done_without_result()),
    ]);
    let fetcher = StaticFetcher::ok(b"x", None);
    let sink = RecordingSink::default();

    let err = run_video_job(
        &api,
        &fetcher,
        1,
        "p",
        &settings(),
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap_err();

    assert_eq!(err, FlowError::NoResult);
    assert_eq!(err.to_string(), "no result produced despite completion");
    assert!(fetcher.urls().is_empty());
    assert_eq!(sink.poll_attempts(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn submission_failure_never_polls() {
    let api = ScriptedApi {
        submit_error: Some(network_error()),
        ..ScriptedApi::default()
    };
    let fetcher = StaticFetcher::ok(b"x", None);
    let sink = RecordingSink::default();

    let err = run_video_job(
        &api,
        &fetcher,
        1,
        "p",
        &settings(),
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlowError::SubmissionFailed(_)));
    assert_eq!(api.polls_made(), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_is_terminal() {
    let api = ScriptedApi::with_polls(vec![
        Ok(VideoJob::pending("operations/op1")),
        Err(network_error()),
    ]);
    let fetcher = StaticFetcher::ok(b"x", None);
    let sink = RecordingSink::default();

    let err = run_video_job(
        &api,
        &fetcher,
        1,
        "p",
        &settings(),
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlowError::PollFailed(_)));
    assert_eq!(api.polls_made(), 2);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_terminal() {
    let api = ScriptedApi::with_polls(vec![Ok(done_with("https://files.example/clip"))]);
    let fetcher = StaticFetcher::failing();
    let sink = RecordingSink::default();

    let err = run_video_job(
        &api,
        &fetcher,
        1,
        "p",
        &settings(),
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlowError::FetchFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling_and_captions() {
    let api = Arc::new(ScriptedApi::default());
    let fetcher = Arc::new(StaticFetcher::ok(b"x", None));
    let sink = Arc::new(RecordingSink::default());
    let cancel = CancellationToken::new();

    let task = {
        let (api, fetcher, sink, cancel) =
            (api.clone(), fetcher.clone(), sink.clone(), cancel.clone());
        tokio::spawn(async move {
            run_video_job(
                api.as_ref(),
                fetcher.as_ref(),
                1,
                "p",
                &settings(),
                &cancel,
                sink.as_ref(),
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_secs(25)).await;
    cancel.cancel();
    let result = task.await.unwrap();
    assert_eq!(result, Err(FlowError::Cancelled));

    let polls = api.polls_made();
    let ticks = sink.caption_ticks();
    assert!(polls >= 2);
    assert!(ticks >= 3);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.polls_made(), polls);
    assert_eq!(sink.caption_ticks(), ticks);
    assert!(fetcher.urls().is_empty());
}
