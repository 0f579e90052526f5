use std::fmt;

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submitting,
    Pending,
    Fetching,
    Encoding,
    Done,
}

/// Snapshot of a remote long-running video job. Each poll yields a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub handle: String,
    pub done: bool,
    pub result: Option<JobResult>,
}

impl VideoJob {
    pub fn pending(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            done: false,
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Locator(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditOutput {
    pub text: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inspiration {
    pub text: String,
    pub sources: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        request_id: RequestId,
        stage: Stage,
        bytes: Option<u64>,
    },
    /// A video poll came back not done; the next one runs after the poll interval.
    PollScheduled {
        request_id: RequestId,
        attempt: u32,
    },
    CaptionTick {
        request_id: RequestId,
    },
    ImagesGenerated {
        request_id: RequestId,
        images: Vec<String>,
    },
    ImageEdited {
        request_id: RequestId,
        output: EditOutput,
    },
    InspirationReady {
        request_id: RequestId,
        inspiration: Inspiration,
    },
    ReviewReady {
        request_id: RequestId,
        text: String,
    },
    ChatChunk {
        request_id: RequestId,
        delta: String,
    },
    ChatFinished {
        request_id: RequestId,
    },
    VideoDelivered {
        request_id: RequestId,
        data_uri: String,
    },
    Failed {
        request_id: RequestId,
        error: FlowError,
        user_message: String,
    },
    Cancelled {
        request_id: RequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

/// Transport or protocol failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Terminal failure of a request flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("submission failed: {0}")]
    SubmissionFailed(ApiError),
    #[error("status check failed: {0}")]
    PollFailed(ApiError),
    #[error("no result produced despite completion")]
    NoResult,
    #[error("job reported an error: {0}")]
    JobFailed(String),
    #[error("result download failed: {0}")]
    FetchFailed(ApiError),
    #[error("response stream failed: {0}")]
    StreamFailed(ApiError),
    #[error("request failed: {0}")]
    RequestFailed(ApiError),
    #[error("request task aborted: {0}")]
    Aborted(String),
    #[error("cancelled")]
    Cancelled,
}
