use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use studio_logging::{studio_debug, studio_error, studio_info, studio_warn};
use tokio_util::sync::CancellationToken;

use crate::api::{ClientSettings, GeminiClient, GenerationApi};
use crate::chat::ChatSession;
use crate::fetch::{ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
use crate::video::{run_video_job, VideoFlowSettings};
use crate::{ApiError, EngineEvent, FlowError, RequestId};

/// One remote operation, as requested by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRequest {
    Images { prompt: String },
    Edit { image: String, mask: String, prompt: String },
    Video { prompt: String },
    Chat { prompt: String },
    Inspire { prompt: String },
    Review { code: String, language: String },
}

impl EngineRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineRequest::Images { .. } => "images",
            EngineRequest::Edit { .. } => "edit",
            EngineRequest::Video { .. } => "video",
            EngineRequest::Chat { .. } => "chat",
            EngineRequest::Inspire { .. } => "inspiration",
            EngineRequest::Review { .. } => "review",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub client: ClientSettings,
    pub fetch: FetchSettings,
    pub video: VideoFlowSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to create API client: {0}")]
    Client(#[from] ApiError),
    #[error("engine worker stopped")]
    Disconnected,
}

enum EngineCommand {
    Submit {
        request_id: RequestId,
        request: EngineRequest,
    },
    Cancel {
        request_id: RequestId,
    },
    Shutdown,
}

/// Bridge between a synchronous front-end and the async request flows.
///
/// Requests run on a tokio runtime owned by a worker thread; results come
/// back as [`EngineEvent`]s. Dropping the handle cancels everything in flight.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let api = Arc::new(GeminiClient::new(config.client)?);
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch));
        Self::with_backends(api, fetcher, config.video)
    }

    pub fn with_backends(
        api: Arc<dyn GenerationApi>,
        fetcher: Arc<dyn Fetcher>,
        video: VideoFlowSettings,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();

        let ctx = TaskContext {
            api,
            fetcher,
            video,
            chat: Arc::new(tokio::sync::Mutex::new(ChatSession::design())),
            event_tx,
        };
        let root = shutdown.clone();
        let worker = thread::Builder::new()
            .name("studio-engine".to_string())
            .spawn(move || command_loop(runtime, cmd_rx, ctx, root))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn submit(&self, request_id: RequestId, request: EngineRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            request_id,
            request,
        });
    }

    /// Cancels a request. Unknown or finished ids are ignored.
    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { request_id });
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time; `Disconnected` means no event will ever arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                studio_error!("Engine worker panicked");
            }
        }
    }
}

#[derive(Clone)]
struct TaskContext {
    api: Arc<dyn GenerationApi>,
    fetcher: Arc<dyn Fetcher>,
    video: VideoFlowSettings,
    // One conversation per engine; turns are serialized on the lock.
    chat: Arc<tokio::sync::Mutex<ChatSession>>,
    event_tx: mpsc::Sender<EngineEvent>,
}

fn command_loop(
    runtime: tokio::runtime::Runtime,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    ctx: TaskContext,
    root: CancellationToken,
) {
    let mut in_flight: HashMap<RequestId, CancellationToken> = HashMap::new();

    while let Ok(command) = cmd_rx.recv() {
        in_flight.retain(|_, token| !token.is_cancelled());
        match command {
            EngineCommand::Submit {
                request_id,
                request,
            } => {
                studio_info!("Dispatching {} request {}", request.kind(), request_id);
                let token = root.child_token();
                if let Some(previous) = in_flight.insert(request_id, token.clone()) {
                    previous.cancel();
                }
                let kind = request.kind();
                let events = ctx.event_tx.clone();
                let task = runtime.spawn(run_request(ctx.clone(), request_id, request, token.clone()));
                runtime.spawn(async move {
                    let _done = token.drop_guard();
                    match task.await {
                        Ok(()) => {}
                        Err(err) if err.is_panic() => {
                            report_aborted(&events, kind, request_id, "request task panicked");
                        }
                        Err(_) => studio_debug!("Request {} dropped at shutdown", request_id),
                    }
                });
            }
            EngineCommand::Cancel { request_id } => {
                if let Some(token) = in_flight.remove(&request_id) {
                    studio_debug!("Cancelling request {}", request_id);
                    token.cancel();
                }
            }
            EngineCommand::Shutdown => break,
        }
    }

    root.cancel();
    runtime.shutdown_timeout(Duration::from_secs(1));
    studio_debug!("Engine worker stopped");
}

/// A request task that panicked never sent its terminal event; send a
/// failure in its place so the front-end stops waiting.
fn report_aborted(
    events: &mpsc::Sender<EngineEvent>,
    kind: &'static str,
    request_id: RequestId,
    reason: &str,
) {
    studio_error!("{} request {} aborted: {}", kind, request_id, reason);
    let error = FlowError::Aborted(reason.to_string());
    let _ = events.send(EngineEvent::Failed {
        request_id,
        user_message: user_message(kind, &error),
        error,
    });
}

async fn run_request(
    ctx: TaskContext,
    request_id: RequestId,
    request: EngineRequest,
    cancel: CancellationToken,
) {
    let sink = ChannelProgressSink::new(ctx.event_tx.clone());
    let kind = request.kind();
    let outcome = execute(&ctx, request_id, request, &cancel, &sink).await;

    let event = match outcome {
        Ok(event) => event,
        Err(FlowError::Cancelled) => {
            studio_debug!("{} request {} cancelled", kind, request_id);
            EngineEvent::Cancelled { request_id }
        }
        Err(error) => {
            studio_warn!("{} request {} failed: {}", kind, request_id, error);
            EngineEvent::Failed {
                request_id,
                user_message: user_message(kind, &error),
                error,
            }
        }
    };
    sink.emit(event);
}

async fn execute(
    ctx: &TaskContext,
    request_id: RequestId,
    request: EngineRequest,
    cancel: &CancellationToken,
    sink: &ChannelProgressSink,
) -> Result<EngineEvent, FlowError> {
    let api = ctx.api.as_ref();
    match request {
        EngineRequest::Images { prompt } => {
            let images = until_cancelled(cancel, api.generate_images(&prompt))
                .await?
                .map_err(FlowError::RequestFailed)?;
            Ok(EngineEvent::ImagesGenerated { request_id, images })
        }
        EngineRequest::Edit {
            image,
            mask,
            prompt,
        } => {
            let output = until_cancelled(cancel, api.edit_image(&image, &mask, &prompt))
                .await?
                .map_err(FlowError::RequestFailed)?;
            Ok(EngineEvent::ImageEdited { request_id, output })
        }
        EngineRequest::Video { prompt } => {
            let delivery = run_video_job(
                api,
                ctx.fetcher.as_ref(),
                request_id,
                &prompt,
                &ctx.video,
                cancel,
                sink,
            )
            .await?;
            Ok(EngineEvent::VideoDelivered {
                request_id,
                data_uri: delivery.data_uri,
            })
        }
        EngineRequest::Chat { prompt } => {
            let mut session = until_cancelled(cancel, ctx.chat.lock()).await?;
            session
                .send(api, &prompt, cancel, |delta| {
                    sink.emit(EngineEvent::ChatChunk {
                        request_id,
                        delta: delta.to_string(),
                    })
                })
                .await?;
            Ok(EngineEvent::ChatFinished { request_id })
        }
        EngineRequest::Inspire { prompt } => {
            let inspiration = until_cancelled(cancel, api.inspire(&prompt))
                .await?
                .map_err(FlowError::RequestFailed)?;
            Ok(EngineEvent::InspirationReady {
                request_id,
                inspiration,
            })
        }
        EngineRequest::Review { code, language } => {
            let text = until_cancelled(cancel, api.review_code(&code, &language))
                .await?
                .map_err(FlowError::RequestFailed)?;
            Ok(EngineEvent::ReviewReady { request_id, text })
        }
    }
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, FlowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Text shown to the user for a failed request.
pub fn user_message(kind: &str, error: &FlowError) -> String {
    match (kind, error) {
        ("video", FlowError::SubmissionFailed(_)) => "Failed to start video generation.".to_string(),
        ("video", FlowError::PollFailed(_)) => "Failed to get video generation status.".to_string(),
        ("video", FlowError::NoResult) => {
            "Video generation completed, but no video URI was found.".to_string()
        }
        ("video", FlowError::JobFailed(message) | FlowError::Aborted(message)) => {
            format!("Video generation failed: {message}")
        }
        ("video", _) => "Failed to download the generated video.".to_string(),
        ("images", _) => "Failed to generate images. Please try again.".to_string(),
        ("edit", _) => "Failed to edit image. Please check the inputs and try again.".to_string(),
        ("inspiration", _) => "Failed to get inspiration. The model may be unavailable or the request could be blocked.".to_string(),
        ("review", _) => "Failed to review the code. Please try again.".to_string(),
        ("chat", _) => "The chat response was interrupted.".to_string(),
        _ => error.to_string(),
    }
}
