#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures_util::stream::{self, StreamExt};
use studio_engine::{
    ApiError, ChatRequest, ChunkStream, EditOutput, EngineEvent, FailureKind, FetchMetadata,
    FetchOutput, Fetcher, GenerationApi, Inspiration, JobResult, ProgressSink, RequestId,
    VideoJob,
};

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn caption_ticks(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, EngineEvent::CaptionTick { .. }))
            .count()
    }

    pub fn poll_attempts(&self) -> Vec<u32> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::PollScheduled { attempt, .. } => Some(*attempt),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn network_error() -> ApiError {
    ApiError::new(FailureKind::Network, "connection reset")
}

pub fn done_with(locator: &str) -> VideoJob {
    VideoJob {
        handle: "operations/op1".to_string(),
        done: true,
        result: Some(JobResult::Locator(locator.to_string())),
    }
}

pub fn done_without_result() -> VideoJob {
    VideoJob {
        handle: "operations/op1".to_string(),
        done: true,
        result: None,
    }
}

/// Scripted generation service. Poll results are consumed in order; once
/// exhausted every further poll reports "not done".
#[derive(Default)]
pub struct ScriptedApi {
    pub submit_error: Option<ApiError>,
    pub polls: Mutex<VecDeque<Result<VideoJob, ApiError>>>,
    pub poll_count: AtomicUsize,
    pub images: Option<Vec<String>>,
    pub chat_chunks: Vec<Result<String, ApiError>>,
    pub review_panics: bool,
}

impl ScriptedApi {
    pub fn with_polls(polls: Vec<Result<VideoJob, ApiError>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            ..Self::default()
        }
    }

    pub fn polls_made(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerationApi for ScriptedApi {
    async fn generate_images(&self, _prompt: &str) -> Result<Vec<String>, ApiError> {
        self.images.clone().ok_or_else(network_error)
    }

    async fn edit_image(
        &self,
        _image: &str,
        _mask: &str,
        _prompt: &str,
    ) -> Result<EditOutput, ApiError> {
        Err(network_error())
    }

    async fn submit_video(&self, _prompt: &str) -> Result<VideoJob, ApiError> {
        match &self.submit_error {
            Some(err) => Err(err.clone()),
            None => Ok(VideoJob::pending("operations/op1")),
        }
    }

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoJob, ApiError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(VideoJob::pending(job.handle.clone())))
    }

    async fn inspire(&self, _prompt: &str) -> Result<Inspiration, ApiError> {
        Err(network_error())
    }

    async fn review_code(&self, _code: &str, _language: &str) -> Result<String, ApiError> {
        if self.review_panics {
            panic!("review backend crashed");
        }
        Ok("Looks good.".to_string())
    }

    async fn stream_chat(&self, _request: ChatRequest) -> Result<ChunkStream, ApiError> {
        Ok(stream::iter(self.chat_chunks.clone()).boxed())
    }
}

/// Fetcher returning fixed bytes and recording requested URLs.
pub struct StaticFetcher {
    pub result: Result<(Vec<u8>, Option<String>), ApiError>,
    pub urls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn ok(bytes: &[u8], content_type: Option<&str>) -> Self {
        Self {
            result: Ok((bytes.to_vec(), content_type.map(str::to_string))),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(ApiError::new(FailureKind::HttpStatus(403), "Forbidden")),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(
        &self,
        _request_id: RequestId,
        url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, ApiError> {
        self.urls.lock().unwrap().push(url.to_string());
        let (bytes, content_type) = self.result.clone()?;
        Ok(FetchOutput {
            metadata: FetchMetadata {
                final_url: url.to_string(),
                redirect_count: 0,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}
