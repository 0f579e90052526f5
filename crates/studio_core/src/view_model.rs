use crate::{MediaKind, MessageId, Mode, Role, Source};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub mode: Mode,
    pub messages: Vec<MessageView>,
    pub gallery: Vec<GalleryItemView>,
    pub loading: bool,
    pub loading_status: Option<String>,
    pub error: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    /// Mode buttons are disabled while a request is in flight.
    pub fn can_switch_mode(&self) -> bool {
        !self.loading
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub attachments: Vec<AttachmentView>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentView {
    pub kind: MediaKind,
    pub data_uri: String,
    /// Already present in the gallery.
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItemView {
    pub index: usize,
    pub kind: MediaKind,
    pub data_uri: String,
}
