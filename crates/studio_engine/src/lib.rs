//! Studio engine: remote generation calls, request flows and local persistence.
mod api;
mod chat;
mod data_uri;
mod engine;
mod export;
mod fetch;
mod filename;
mod gallery;
mod markdown;
mod persist;
mod sse;
mod store;
mod types;
mod video;
mod wire;

pub use api::{ChunkStream, ClientSettings, GeminiClient, GenerationApi, REVIEW_PERSONA};
pub use chat::{ChatRequest, ChatRole, ChatSession, ChatTurn, DESIGN_PERSONA, DESIGN_TEMPERATURE};
pub use data_uri::{
    base64_payload, data_uri_mime, decode_data_uri, encode_data_uri, payload_mime, DataUri,
    DataUriError,
};
pub use engine::{user_message, EngineConfig, EngineError, EngineHandle, EngineRequest};
pub use export::{export_gallery, ExportError, ExportSummary, MANIFEST_FILENAME};
pub use fetch::{ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
pub use filename::gallery_filename;
pub use gallery::{decode_gallery, load_gallery, save_gallery, GALLERY_KEY};
#[cfg(feature = "markdown")]
pub use markdown::RichRenderer;
pub use markdown::{escape_html, is_safe_url, select_renderer, MarkdownRenderer, PlainRenderer};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use sse::{decode_text_stream, SseDecoder};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, STORE_FILENAME};
pub use types::{
    ApiError, Citation, EditOutput, EngineEvent, FailureKind, FetchMetadata, FetchOutput,
    FlowError, Inspiration, JobResult, RequestId, Stage, VideoJob,
};
pub use video::{classify, run_video_job, JobPhase, VideoDelivery, VideoFlowSettings};
