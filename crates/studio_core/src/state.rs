use crate::view_model::{AppViewModel, AttachmentView, GalleryItemView, MessageView};

pub type RequestId = u64;
pub type MessageId = u64;

/// Rotating captions shown while a video job is pending.
pub const VIDEO_CAPTIONS: &[&str] = &[
    "Warming up the virtual cameras...",
    "Conceptualizing scenes...",
    "Rendering keyframes...",
    "Adding cinematic motion...",
    "Finalizing the visual effects...",
    "This is taking a bit longer than usual, but creativity can't be rushed!",
    "Almost there, adding the final touches...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub value: &'static str,
    pub label: &'static str,
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { value: "javascript", label: "JavaScript" },
    Language { value: "typescript", label: "TypeScript" },
    Language { value: "python", label: "Python" },
    Language { value: "java", label: "Java" },
    Language { value: "csharp", label: "C#" },
    Language { value: "cpp", label: "C++" },
    Language { value: "go", label: "Go" },
    Language { value: "rust", label: "Rust" },
    Language { value: "ruby", label: "Ruby" },
    Language { value: "php", label: "PHP" },
    Language { value: "swift", label: "Swift" },
    Language { value: "kotlin", label: "Kotlin" },
    Language { value: "sql", label: "SQL" },
    Language { value: "html", label: "HTML" },
    Language { value: "css", label: "CSS" },
];

pub fn find_language(value: &str) -> Option<Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|lang| lang.value.eq_ignore_ascii_case(value.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Generate,
    Edit,
    Video,
    Chat,
    Inspiration,
    Review,
    Gallery,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Generate,
        Mode::Edit,
        Mode::Video,
        Mode::Chat,
        Mode::Inspiration,
        Mode::Review,
        Mode::Gallery,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Generate => "Generate",
            Mode::Edit => "Edit Image",
            Mode::Video => "Generate Video",
            Mode::Chat => "Design Chat",
            Mode::Inspiration => "Inspiration",
            Mode::Review => "Code Review",
            Mode::Gallery => "Gallery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a media reference by its data URI prefix.
    pub fn of(data_uri: &str) -> Self {
        if data_uri.starts_with("data:video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: MediaKind,
    pub data_uri: String,
}

impl Attachment {
    pub fn new(data_uri: impl Into<String>) -> Self {
        let data_uri = data_uri.into();
        Self {
            kind: MediaKind::of(&data_uri),
            data_uri,
        }
    }
}

/// Web citation attached to a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Images,
    Edit,
    Video,
    Chat,
    Inspiration,
    Review,
}

/// The one in-flight remote request. Its id doubles as the staleness token:
/// engine results carrying any other id are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveRequest {
    pub(crate) id: RequestId,
    pub(crate) kind: RequestKind,
    pub(crate) prompt: String,
    pub(crate) user_message: MessageId,
    pub(crate) reply: Option<MessageId>,
    pub(crate) caption_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    mode: Mode,
    messages: Vec<Message>,
    gallery: Vec<String>,
    loading_status: Option<String>,
    error: Option<String>,
    active: Option<ActiveRequest>,
    last_request_id: RequestId,
    last_message_id: MessageId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let messages = self
            .messages
            .iter()
            .map(|msg| MessageView {
                id: msg.id,
                role: msg.role,
                text: msg.text.clone(),
                attachments: msg
                    .attachments
                    .iter()
                    .map(|att| AttachmentView {
                        kind: att.kind,
                        data_uri: att.data_uri.clone(),
                        saved: self.is_saved(&att.data_uri),
                    })
                    .collect(),
                sources: msg.sources.clone(),
            })
            .collect();
        let gallery = self
            .gallery
            .iter()
            .enumerate()
            .map(|(index, data_uri)| GalleryItemView {
                index,
                kind: MediaKind::of(data_uri),
                data_uri: data_uri.clone(),
            })
            .collect();

        AppViewModel {
            mode: self.mode,
            messages,
            gallery,
            loading: self.is_loading(),
            loading_status: self.loading_status.clone(),
            error: self.error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn gallery(&self) -> &[String] {
        &self.gallery
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_request(&self) -> Option<(RequestId, RequestKind)> {
        self.active.as_ref().map(|active| (active.id, active.kind))
    }

    pub fn is_saved(&self, data_uri: &str) -> bool {
        self.gallery.iter().any(|item| item == data_uri)
    }

    /// Returns true when the state changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Switches mode and resets the session view (log and error banner).
    pub(crate) fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.messages.clear();
        self.error = None;
        self.mark_dirty();
    }

    pub(crate) fn clear_log(&mut self) {
        self.messages.clear();
        self.mark_dirty();
    }

    pub(crate) fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.mark_dirty();
        }
    }

    fn next_message_id(&mut self) -> MessageId {
        self.last_message_id += 1;
        self.last_message_id
    }

    pub fn append_message(
        &mut self,
        role: Role,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
        sources: Vec<Source>,
    ) -> MessageId {
        let id = self.next_message_id();
        self.messages.push(Message {
            id,
            role,
            text: text.into(),
            attachments,
            sources,
        });
        self.mark_dirty();
        id
    }

    /// Concatenates `delta` onto the message with `id`. Unknown ids are ignored.
    pub fn append_streamed_chunk(&mut self, id: MessageId, delta: &str) {
        if let Some(msg) = self.messages.iter_mut().find(|msg| msg.id == id) {
            msg.text.push_str(delta);
            self.mark_dirty();
        }
    }

    pub(crate) fn remove_messages(&mut self, ids: &[MessageId]) {
        let before = self.messages.len();
        self.messages.retain(|msg| !ids.contains(&msg.id));
        if self.messages.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn message_text(&self, id: MessageId) -> Option<&str> {
        self.messages
            .iter()
            .find(|msg| msg.id == id)
            .map(|msg| msg.text.as_str())
    }

    /// Starts a new turn: appends the user message and makes the request active.
    pub(crate) fn begin_request(
        &mut self,
        kind: RequestKind,
        prompt: &str,
        user_text: String,
        loading_status: &str,
    ) -> RequestId {
        self.last_request_id += 1;
        let id = self.last_request_id;
        self.error = None;
        let user_message = self.append_message(Role::User, user_text, Vec::new(), Vec::new());
        self.active = Some(ActiveRequest {
            id,
            kind,
            prompt: prompt.to_string(),
            user_message,
            reply: None,
            caption_index: 0,
        });
        self.loading_status = Some(loading_status.to_string());
        self.mark_dirty();
        id
    }

    pub(crate) fn active(&self, id: RequestId, kind: RequestKind) -> Option<&ActiveRequest> {
        self.active
            .as_ref()
            .filter(|active| active.id == id && active.kind == kind)
    }

    pub(crate) fn active_any(&self, id: RequestId) -> Option<&ActiveRequest> {
        self.active.as_ref().filter(|active| active.id == id)
    }

    pub(crate) fn set_reply(&mut self, reply: MessageId) {
        if let Some(active) = self.active.as_mut() {
            active.reply = Some(reply);
        }
    }

    pub(crate) fn advance_caption(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.caption_index = (active.caption_index + 1) % VIDEO_CAPTIONS.len();
        self.loading_status = Some(VIDEO_CAPTIONS[active.caption_index].to_string());
        self.mark_dirty();
    }

    /// Ends the active request and stops the loading state.
    pub(crate) fn finish_request(&mut self) -> Option<ActiveRequest> {
        let finished = self.active.take();
        self.loading_status = None;
        self.mark_dirty();
        finished
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.mark_dirty();
    }

    /// Inserts at the front unless an equal reference is already saved.
    pub(crate) fn save_to_gallery(&mut self, data_uri: String) -> bool {
        if self.is_saved(&data_uri) {
            return false;
        }
        self.gallery.insert(0, data_uri);
        self.mark_dirty();
        true
    }

    pub(crate) fn remove_from_gallery(&mut self, data_uri: &str) -> bool {
        let before = self.gallery.len();
        self.gallery.retain(|item| item != data_uri);
        let removed = self.gallery.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn restore_gallery(&mut self, items: Vec<String>) {
        let mut restored: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            if !restored.contains(&item) {
                restored.push(item);
            }
        }
        self.gallery = restored;
        self.mark_dirty();
    }
}
