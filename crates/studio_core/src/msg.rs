use crate::{Mode, RequestId, Source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked another mode. Ignored while a request is loading.
    ModeSelected(Mode),
    /// User submitted a prompt in Generate, Chat or Inspiration mode.
    PromptSubmitted(String),
    /// User submitted an image, a mask over it, and an edit instruction.
    EditSubmitted {
        image: String,
        mask: String,
        prompt: String,
    },
    /// User asked for a video.
    VideoSubmitted(String),
    /// User submitted a code snippet for review.
    ReviewSubmitted { code: String, language: String },
    /// Engine returned generated images as data URIs.
    ImagesReady {
        request_id: RequestId,
        images: Vec<String>,
    },
    /// Engine returned the result of an image edit.
    EditReady {
        request_id: RequestId,
        text: String,
        images: Vec<String>,
    },
    /// Engine returned a grounded answer.
    InspirationReady {
        request_id: RequestId,
        text: String,
        sources: Vec<Source>,
    },
    /// Engine returned a code review.
    ReviewReady { request_id: RequestId, text: String },
    /// One streamed chunk of a chat reply, in arrival order.
    ChatChunk { request_id: RequestId, delta: String },
    /// The chat reply stream ended.
    ChatFinished { request_id: RequestId },
    /// Cosmetic caption timer fired for a pending video job.
    CaptionTick { request_id: RequestId },
    /// The video job finished and its payload was downloaded.
    VideoDelivered {
        request_id: RequestId,
        data_uri: String,
    },
    /// A remote call failed; `message` is user-facing.
    RequestFailed {
        request_id: RequestId,
        message: String,
    },
    /// User saved a media reference.
    SaveToGallery(String),
    /// User deleted a media reference.
    RemoveFromGallery(String),
    /// Restore the gallery loaded from the persistent store.
    RestoreGallery(Vec<String>),
    /// User dismissed the error banner.
    DismissError,
    /// The hosting view went away; pending work must stop.
    ViewClosed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
