use studio_core::{update, AppState, Effect, MediaKind, Msg};

const IMAGE: &str = "data:image/png;base64,AAAA";
const VIDEO: &str = "data:video/mp4;base64,BBBB";

fn init_logging() {
    studio_logging::initialize_for_tests();
}

#[test]
fn saving_twice_keeps_one_occurrence() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SaveToGallery(IMAGE.to_string()));
    assert_eq!(
        effects,
        vec![Effect::PersistGallery {
            items: vec![IMAGE.to_string()],
        }]
    );

    let (state, effects) = update(state, Msg::SaveToGallery(IMAGE.to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.gallery(), [IMAGE.to_string()]);
}

#[test]
fn newest_item_is_first() {
    let (state, _) = update(AppState::new(), Msg::SaveToGallery(IMAGE.to_string()));
    let (state, effects) = update(state, Msg::SaveToGallery(VIDEO.to_string()));

    assert_eq!(
        effects,
        vec![Effect::PersistGallery {
            items: vec![VIDEO.to_string(), IMAGE.to_string()],
        }]
    );
    let view = state.view();
    assert_eq!(view.gallery[0].kind, MediaKind::Video);
    assert_eq!(view.gallery[1].kind, MediaKind::Image);
    assert_eq!(view.gallery[1].index, 1);
}

#[test]
fn removing_absent_item_is_noop() {
    let (state, _) = update(AppState::new(), Msg::SaveToGallery(IMAGE.to_string()));
    let before = state.clone();
    let (state, effects) = update(state, Msg::RemoveFromGallery(VIDEO.to_string()));

    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn removing_present_item_persists_remaining() {
    let (state, _) = update(AppState::new(), Msg::SaveToGallery(IMAGE.to_string()));
    let (state, _) = update(state, Msg::SaveToGallery(VIDEO.to_string()));
    let (state, effects) = update(state, Msg::RemoveFromGallery(IMAGE.to_string()));

    assert_eq!(
        effects,
        vec![Effect::PersistGallery {
            items: vec![VIDEO.to_string()],
        }]
    );
    assert_eq!(state.gallery(), [VIDEO.to_string()]);
}

#[test]
fn restore_dedupes_and_does_not_persist() {
    let (state, effects) = update(
        AppState::new(),
        Msg::RestoreGallery(vec![
            VIDEO.to_string(),
            IMAGE.to_string(),
            VIDEO.to_string(),
        ]),
    );

    assert!(effects.is_empty());
    assert_eq!(state.gallery(), [VIDEO.to_string(), IMAGE.to_string()]);
}

#[test]
fn attachments_report_saved_state() {
    let (state, _) = update(AppState::new(), Msg::PromptSubmitted("cat".to_string()));
    let (state, _) = update(
        state,
        Msg::ImagesReady {
            request_id: 1,
            images: vec![IMAGE.to_string(), "data:image/png;base64,CCCC".to_string()],
        },
    );
    let (state, _) = update(state, Msg::SaveToGallery(IMAGE.to_string()));

    let view = state.view();
    let saved: Vec<bool> = view.messages[1]
        .attachments
        .iter()
        .map(|att| att.saved)
        .collect();
    assert_eq!(saved, vec![true, false]);
}
