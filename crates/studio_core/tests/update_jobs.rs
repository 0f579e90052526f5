use studio_core::{update, AppState, Effect, MediaKind, Mode, Msg, Role, VIDEO_CAPTIONS};

fn submit_video(prompt: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(AppState::new(), Msg::ModeSelected(Mode::Video));
    update(state, Msg::VideoSubmitted(prompt.to_string()))
}

fn submit_chat(state: AppState, prompt: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::PromptSubmitted(prompt.to_string()))
}

fn chat_state() -> AppState {
    let (state, _) = update(AppState::new(), Msg::ModeSelected(Mode::Chat));
    state
}

#[test]
fn video_submission_starts_job_with_first_caption() {
    let (state, effects) = submit_video("drone over a city");

    assert_eq!(
        effects,
        vec![Effect::StartVideoJob {
            request_id: 1,
            prompt: "drone over a city".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].text, "Video request: \"drone over a city\"");
    assert_eq!(view.loading_status.as_deref(), Some(VIDEO_CAPTIONS[0]));
}

#[test]
fn caption_ticks_rotate_and_wrap() {
    let (mut state, _) = submit_video("waves");
    for _ in 0..VIDEO_CAPTIONS.len() - 1 {
        state = update(state, Msg::CaptionTick { request_id: 1 }).0;
    }
    assert_eq!(
        state.view().loading_status.as_deref(),
        VIDEO_CAPTIONS.last().copied()
    );

    let (state, _) = update(state, Msg::CaptionTick { request_id: 1 });
    assert_eq!(state.view().loading_status.as_deref(), Some(VIDEO_CAPTIONS[0]));

    // A tick for an unknown job is cosmetic noise and must not change anything.
    let before = state.clone();
    let (state, _) = update(state, Msg::CaptionTick { request_id: 7 });
    assert_eq!(state, before);
}

#[test]
fn delivered_video_appends_exactly_one_media_message() {
    let (state, _) = submit_video("waves");
    let (state, _) = update(state, Msg::CaptionTick { request_id: 1 });
    let (state, effects) = update(
        state,
        Msg::VideoDelivered {
            request_id: 1,
            data_uri: "data:video/mp4;base64,AAAA".to_string(),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.loading);
    let assistant: Vec<_> = view
        .messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .collect();
    assert_eq!(assistant.len(), 1);
    assert_eq!(assistant[0].text, "Here is the video I generated for \"waves\".");
    assert_eq!(assistant[0].attachments.len(), 1);
    assert_eq!(assistant[0].attachments[0].kind, MediaKind::Video);
}

#[test]
fn failed_video_clears_turn_and_surfaces_error() {
    let (state, _) = submit_video("waves");
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id: 1,
            message: "Video generation completed, but no video URI was found.".to_string(),
        },
    );

    assert!(state.messages().is_empty());
    assert!(!state.is_loading());
    assert_eq!(
        state.error(),
        Some("Video generation completed, but no video URI was found.")
    );

    // A late delivery for the failed job is stale.
    let before = state.clone();
    let (state, _) = update(
        state,
        Msg::VideoDelivered {
            request_id: 1,
            data_uri: "data:video/mp4;base64,AAAA".to_string(),
        },
    );
    assert_eq!(state, before);
}

#[test]
fn view_closed_cancels_pending_job_and_makes_later_events_stale() {
    let (state, _) = submit_video("waves");
    let (state, effects) = update(state, Msg::ViewClosed);

    assert_eq!(effects, vec![Effect::CancelRequest { request_id: 1 }]);
    assert!(!state.is_loading());

    let before = state.clone();
    let (state, _) = update(state, Msg::CaptionTick { request_id: 1 });
    let (state, _) = update(
        state,
        Msg::VideoDelivered {
            request_id: 1,
            data_uri: "data:video/mp4;base64,AAAA".to_string(),
        },
    );
    assert_eq!(state, before);
}

#[test]
fn view_closed_when_idle_emits_nothing() {
    let (_, effects) = update(AppState::new(), Msg::ViewClosed);
    assert!(effects.is_empty());
}

#[test]
fn chat_chunks_concatenate_in_arrival_order() {
    let (state, effects) = submit_chat(chat_state(), "hi");
    assert_eq!(
        effects,
        vec![Effect::SendChat {
            request_id: 1,
            prompt: "hi".to_string(),
        }]
    );

    let mut state = state;
    for delta in ["Hel", "lo", " world"] {
        state = update(
            state,
            Msg::ChatChunk {
                request_id: 1,
                delta: delta.to_string(),
            },
        )
        .0;
    }
    assert!(state.is_loading());
    let (state, _) = update(state, Msg::ChatFinished { request_id: 1 });

    assert!(!state.is_loading());
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].role, Role::Assistant);
    assert_eq!(state.messages()[1].text, "Hello world");
}

#[test]
fn chunk_for_unknown_message_is_noop() {
    let mut state = chat_state();
    let id = state.append_message(Role::Assistant, "", Vec::new(), Vec::new());
    state.append_streamed_chunk(id + 10, "lost");
    state.append_streamed_chunk(id, "kept");
    assert_eq!(state.messages()[0].text, "kept");
}

#[test]
fn chat_failure_keeps_partial_reply() {
    let (state, _) = submit_chat(chat_state(), "hi");
    let (state, _) = update(
        state,
        Msg::ChatChunk {
            request_id: 1,
            delta: "Partial".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id: 1,
            message: "The chat response was interrupted.".to_string(),
        },
    );

    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].text, "Partial");
    assert!(state.error().is_some());
}

#[test]
fn chat_failure_before_any_chunk_discards_turn() {
    let (state, _) = submit_chat(chat_state(), "hi");
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id: 1,
            message: "The chat response was interrupted.".to_string(),
        },
    );

    assert!(state.messages().is_empty());
    assert!(!state.is_loading());
}

#[test]
fn chat_turns_accumulate_across_requests() {
    let (state, _) = submit_chat(chat_state(), "one");
    let (state, _) = update(
        state,
        Msg::ChatChunk {
            request_id: 1,
            delta: "first".to_string(),
        },
    );
    let (state, _) = update(state, Msg::ChatFinished { request_id: 1 });
    let (state, effects) = submit_chat(state, "two");

    assert_eq!(
        effects,
        vec![Effect::SendChat {
            request_id: 2,
            prompt: "two".to_string(),
        }]
    );
    // Chunks from the finished first request are stale.
    let (state, _) = update(
        state,
        Msg::ChatChunk {
            request_id: 1,
            delta: "late".to_string(),
        },
    );
    assert_eq!(state.messages().len(), 4);
    assert_eq!(state.messages()[1].text, "first");
    assert_eq!(state.messages()[3].text, "");
}
