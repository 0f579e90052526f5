use crate::RequestId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GenerateImages {
        request_id: RequestId,
        prompt: String,
    },
    EditImage {
        request_id: RequestId,
        image: String,
        mask: String,
        prompt: String,
    },
    StartVideoJob {
        request_id: RequestId,
        prompt: String,
    },
    SendChat {
        request_id: RequestId,
        prompt: String,
    },
    Inspire {
        request_id: RequestId,
        prompt: String,
    },
    ReviewCode {
        request_id: RequestId,
        code: String,
        language: String,
    },
    /// Stop any outstanding work (poll timer, caption timer, stream) for the request.
    CancelRequest { request_id: RequestId },
    /// Write the full gallery to the persistent store.
    PersistGallery { items: Vec<String> },
}
