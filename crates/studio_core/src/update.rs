use crate::state::ActiveRequest;
use crate::{
    find_language, AppState, Attachment, Effect, Mode, Msg, RequestKind, Role, VIDEO_CAPTIONS,
};

const THINKING_STATUS: &str = "Your AI assistant is thinking...";
const EDITING_STATUS: &str = "Your AI assistant is editing the image...";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ModeSelected(mode) => {
            if !state.is_loading() {
                state.switch_mode(mode);
            }
            Vec::new()
        }
        Msg::PromptSubmitted(raw) => {
            let prompt = raw.trim();
            if prompt.is_empty() || state.is_loading() {
                return (state, Vec::new());
            }
            let kind = match state.mode() {
                Mode::Generate => RequestKind::Images,
                Mode::Chat => RequestKind::Chat,
                Mode::Inspiration => RequestKind::Inspiration,
                Mode::Edit | Mode::Video | Mode::Review | Mode::Gallery => {
                    return (state, Vec::new());
                }
            };
            let request_id = state.begin_request(kind, prompt, prompt.to_string(), THINKING_STATUS);
            let prompt = prompt.to_string();
            vec![match kind {
                RequestKind::Images => Effect::GenerateImages { request_id, prompt },
                RequestKind::Inspiration => Effect::Inspire { request_id, prompt },
                _ => {
                    let reply = state.append_message(Role::Assistant, "", Vec::new(), Vec::new());
                    state.set_reply(reply);
                    Effect::SendChat { request_id, prompt }
                }
            }]
        }
        Msg::EditSubmitted {
            image,
            mask,
            prompt,
        } => {
            let prompt = prompt.trim();
            if state.mode() != Mode::Edit
                || state.is_loading()
                || image.is_empty()
                || mask.is_empty()
                || prompt.is_empty()
            {
                return (state, Vec::new());
            }
            state.clear_log();
            let request_id = state.begin_request(
                RequestKind::Edit,
                prompt,
                format!("Edit request: \"{prompt}\""),
                EDITING_STATUS,
            );
            vec![Effect::EditImage {
                request_id,
                image,
                mask,
                prompt: prompt.to_string(),
            }]
        }
        Msg::VideoSubmitted(raw) => {
            let prompt = raw.trim();
            if state.mode() != Mode::Video || state.is_loading() || prompt.is_empty() {
                return (state, Vec::new());
            }
            state.clear_log();
            let request_id = state.begin_request(
                RequestKind::Video,
                prompt,
                format!("Video request: \"{prompt}\""),
                VIDEO_CAPTIONS[0],
            );
            vec![Effect::StartVideoJob {
                request_id,
                prompt: prompt.to_string(),
            }]
        }
        Msg::ReviewSubmitted { code, language } => {
            let Some(language) = find_language(&language) else {
                return (state, Vec::new());
            };
            if state.mode() != Mode::Review || state.is_loading() || code.trim().is_empty() {
                return (state, Vec::new());
            }
            let user_text = format!(
                "Review request ({}):\n```{}\n{}\n```",
                language.label,
                language.value,
                code.trim_end()
            );
            let request_id = state.begin_request(
                RequestKind::Review,
                language.value,
                user_text,
                THINKING_STATUS,
            );
            vec![Effect::ReviewCode {
                request_id,
                code,
                language: language.value.to_string(),
            }]
        }
        Msg::ImagesReady { request_id, images } => {
            let Some(active) = state.active(request_id, RequestKind::Images) else {
                return (state, Vec::new());
            };
            let text = format!(
                "Here are the images I generated for \"{}\". You can save your favorites to the gallery.",
                active.prompt
            );
            state.append_message(Role::Assistant, text, attachments(images), Vec::new());
            state.finish_request();
            Vec::new()
        }
        Msg::EditReady {
            request_id,
            text,
            images,
        } => {
            let Some(active) = state.active(request_id, RequestKind::Edit) else {
                return (state, Vec::new());
            };
            let text = if text.trim().is_empty() {
                format!(
                    "Here is the edited image based on your request: \"{}\".",
                    active.prompt
                )
            } else {
                text
            };
            state.append_message(Role::Assistant, text, attachments(images), Vec::new());
            state.finish_request();
            Vec::new()
        }
        Msg::InspirationReady {
            request_id,
            text,
            sources,
        } => {
            if state.active(request_id, RequestKind::Inspiration).is_none() {
                return (state, Vec::new());
            }
            state.append_message(Role::Assistant, text, Vec::new(), sources);
            state.finish_request();
            Vec::new()
        }
        Msg::ReviewReady { request_id, text } => {
            if state.active(request_id, RequestKind::Review).is_none() {
                return (state, Vec::new());
            }
            state.append_message(Role::Assistant, text, Vec::new(), Vec::new());
            state.finish_request();
            Vec::new()
        }
        Msg::ChatChunk { request_id, delta } => {
            let reply = state
                .active(request_id, RequestKind::Chat)
                .and_then(|active| active.reply);
            if let Some(reply) = reply {
                state.append_streamed_chunk(reply, &delta);
            }
            Vec::new()
        }
        Msg::ChatFinished { request_id } => {
            if state.active(request_id, RequestKind::Chat).is_some() {
                state.finish_request();
            }
            Vec::new()
        }
        Msg::CaptionTick { request_id } => {
            if state.active(request_id, RequestKind::Video).is_some() {
                state.advance_caption();
            }
            Vec::new()
        }
        Msg::VideoDelivered {
            request_id,
            data_uri,
        } => {
            let Some(active) = state.active(request_id, RequestKind::Video) else {
                return (state, Vec::new());
            };
            let text = format!("Here is the video I generated for \"{}\".", active.prompt);
            state.append_message(
                Role::Assistant,
                text,
                vec![Attachment::new(data_uri)],
                Vec::new(),
            );
            state.finish_request();
            Vec::new()
        }
        Msg::RequestFailed {
            request_id,
            message,
        } => {
            if state.active_any(request_id).is_none() {
                return (state, Vec::new());
            }
            if let Some(finished) = state.finish_request() {
                discard_turn(&mut state, &finished);
            }
            state.set_error(message);
            Vec::new()
        }
        Msg::SaveToGallery(data_uri) => {
            if state.save_to_gallery(data_uri) {
                vec![persist_gallery(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::RemoveFromGallery(data_uri) => {
            if state.remove_from_gallery(&data_uri) {
                vec![persist_gallery(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::RestoreGallery(items) => {
            state.restore_gallery(items);
            Vec::new()
        }
        Msg::DismissError => {
            state.clear_error();
            Vec::new()
        }
        Msg::ViewClosed => {
            let effects = cancel_active(&state);
            if let Some(finished) = state.finish_request() {
                discard_turn(&mut state, &finished);
            }
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Cancellation for the request in flight, if any.
fn cancel_active(state: &AppState) -> Vec<Effect> {
    state
        .active_request()
        .map(|(request_id, _)| vec![Effect::CancelRequest { request_id }])
        .unwrap_or_default()
}

/// Drops the log entries of a turn that did not complete. Streamed chat
/// keeps whatever partial reply already arrived.
fn discard_turn(state: &mut AppState, finished: &ActiveRequest) {
    match finished.kind {
        RequestKind::Edit | RequestKind::Video => state.clear_log(),
        RequestKind::Images | RequestKind::Inspiration | RequestKind::Review => {
            state.remove_messages(&[finished.user_message]);
        }
        RequestKind::Chat => {
            let partial = finished
                .reply
                .and_then(|reply| state.message_text(reply))
                .is_some_and(|text| !text.is_empty());
            if !partial {
                let mut ids = vec![finished.user_message];
                ids.extend(finished.reply);
                state.remove_messages(&ids);
            }
        }
    }
}

fn persist_gallery(state: &AppState) -> Effect {
    Effect::PersistGallery {
        items: state.gallery().to_vec(),
    }
}

fn attachments(images: Vec<String>) -> Vec<Attachment> {
    images.into_iter().map(Attachment::new).collect()
}
