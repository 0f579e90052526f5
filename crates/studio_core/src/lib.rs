//! Studio core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    find_language, AppState, Attachment, Language, MediaKind, Message, MessageId, Mode, RequestId,
    RequestKind, Role, Source, SUPPORTED_LANGUAGES, VIDEO_CAPTIONS,
};
pub use update::update;
pub use view_model::{AppViewModel, AttachmentView, GalleryItemView, MessageView};
