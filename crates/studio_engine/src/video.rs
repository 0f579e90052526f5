//! Long-running video job: submit, poll until done, download, encode.
//!
//! Phases:
//!
//! * pending: poll; a `done=false` snapshot schedules the next poll after
//!   [`VideoFlowSettings::poll_interval`].
//! * done: the snapshot must carry a locator, otherwise the job failed.
//! * fetching: download the locator and turn it into a `data:` URI.
//!
//! While pending, a caption tick is emitted every
//! [`VideoFlowSettings::caption_interval`]. Ticks are cosmetic. The poll
//! timer and the caption timer share the job's cancellation token, so
//! cancelling it stops both.

use std::future::Future;
use std::time::Duration;

use studio_logging::{studio_debug, studio_info};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::GenerationApi;
use crate::data_uri::{encode_data_uri, payload_mime};
use crate::fetch::{Fetcher, ProgressSink};
use crate::{EngineEvent, FlowError, JobResult, RequestId, Stage, VideoJob};

const FALLBACK_VIDEO_MIME: &str = "video/mp4";

#[derive(Debug, Clone)]
pub struct VideoFlowSettings {
    pub poll_interval: Duration,
    pub caption_interval: Duration,
}

impl Default for VideoFlowSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            caption_interval: Duration::from_secs(7),
        }
    }
}

/// Where a poll snapshot leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Pending(VideoJob),
    Fetching { locator: String },
    Failed(FlowError),
}

/// Classifies a poll snapshot. Only a `done` snapshot can leave the pending phase.
pub fn classify(job: VideoJob) -> JobPhase {
    if !job.done {
        return JobPhase::Pending(job);
    }
    match job.result {
        Some(JobResult::Locator(locator)) if !locator.trim().is_empty() => {
            JobPhase::Fetching { locator }
        }
        Some(JobResult::Error(message)) => JobPhase::Failed(FlowError::JobFailed(message)),
        Some(JobResult::Locator(_)) | None => JobPhase::Failed(FlowError::NoResult),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDelivery {
    pub data_uri: String,
    pub polls: u32,
    pub byte_len: u64,
}

/// Runs one video job to a terminal outcome.
pub async fn run_video_job(
    api: &dyn GenerationApi,
    fetcher: &dyn Fetcher,
    request_id: RequestId,
    prompt: &str,
    settings: &VideoFlowSettings,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
) -> Result<VideoDelivery, FlowError> {
    sink.emit(EngineEvent::Progress {
        request_id,
        stage: Stage::Submitting,
        bytes: None,
    });
    let mut captions = caption_timer(settings.caption_interval);

    let mut job = while_pending(
        api.submit_video(prompt),
        &mut captions,
        cancel,
        sink,
        request_id,
    )
    .await?
    .map_err(FlowError::SubmissionFailed)?;
    studio_info!("Video job {} submitted as {}", request_id, job.handle);

    let mut polls = 0u32;
    let locator = loop {
        sink.emit(EngineEvent::Progress {
            request_id,
            stage: Stage::Pending,
            bytes: None,
        });
        let snapshot = while_pending(api.poll_video(&job), &mut captions, cancel, sink, request_id)
            .await?
            .map_err(FlowError::PollFailed)?;
        polls += 1;

        match classify(snapshot) {
            JobPhase::Pending(next) => {
                job = next;
                studio_debug!(
                    "Video job {} not done after poll {}; next in {:?}",
                    request_id,
                    polls,
                    settings.poll_interval
                );
                sink.emit(EngineEvent::PollScheduled {
                    request_id,
                    attempt: polls,
                });
                while_pending(
                    tokio::time::sleep(settings.poll_interval),
                    &mut captions,
                    cancel,
                    sink,
                    request_id,
                )
                .await?;
            }
            JobPhase::Fetching { locator } => break locator,
            JobPhase::Failed(err) => return Err(err),
        }
    };
    drop(captions);
    studio_info!("Video job {} done after {} polls", request_id, polls);

    let url = api.result_url(&locator).map_err(FlowError::FetchFailed)?;
    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FlowError::Cancelled),
        fetched = fetcher.fetch(request_id, &url, sink) => fetched.map_err(FlowError::FetchFailed)?,
    };

    sink.emit(EngineEvent::Progress {
        request_id,
        stage: Stage::Encoding,
        bytes: Some(output.metadata.byte_len),
    });
    let mime = payload_mime(output.metadata.content_type.as_deref(), FALLBACK_VIDEO_MIME);
    let data_uri = encode_data_uri(&output.bytes, &mime);
    sink.emit(EngineEvent::Progress {
        request_id,
        stage: Stage::Done,
        bytes: Some(output.metadata.byte_len),
    });

    Ok(VideoDelivery {
        data_uri,
        polls,
        byte_len: output.metadata.byte_len,
    })
}

fn caption_timer(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Drives `fut` while emitting caption ticks, until it completes or the job is cancelled.
async fn while_pending<F: Future>(
    fut: F,
    captions: &mut Interval,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
    request_id: RequestId,
) -> Result<F::Output, FlowError> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FlowError::Cancelled),
            out = &mut fut => return Ok(out),
            _ = captions.tick() => sink.emit(EngineEvent::CaptionTick { request_id }),
        }
    }
}
