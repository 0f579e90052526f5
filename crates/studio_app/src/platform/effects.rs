use std::time::Duration;

use studio_core::{Effect, Msg, RequestId, Source};
use studio_engine::{EngineError, EngineEvent, EngineHandle, EngineRequest, FileStore};
use studio_logging::{studio_debug, studio_info};

use super::persistence;

/// Executes core effects against the engine and the gallery store, and turns
/// engine events back into core messages.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    store: FileStore,
}

impl EffectRunner {
    pub(crate) fn new(engine: EngineHandle, store: FileStore) -> Self {
        Self { engine, store }
    }

    pub(crate) fn store(&self) -> &FileStore {
        &self.store
    }

    pub(crate) fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PersistGallery { items } => {
                    persistence::persist_gallery(&mut self.store, &items);
                }
                Effect::CancelRequest { request_id } => {
                    studio_info!("Cancelling request {}", request_id);
                    self.engine.cancel(request_id);
                }
                other => {
                    if let Some((request_id, request)) = to_request(other) {
                        self.engine.submit(request_id, request);
                    }
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event as a core message.
    /// Fails once the engine can no longer deliver events.
    pub(crate) fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.map(to_msg))
    }
}

fn to_request(effect: Effect) -> Option<(RequestId, EngineRequest)> {
    let pair = match effect {
        Effect::GenerateImages { request_id, prompt } => {
            (request_id, EngineRequest::Images { prompt })
        }
        Effect::EditImage {
            request_id,
            image,
            mask,
            prompt,
        } => (
            request_id,
            EngineRequest::Edit {
                image,
                mask,
                prompt,
            },
        ),
        Effect::StartVideoJob { request_id, prompt } => {
            (request_id, EngineRequest::Video { prompt })
        }
        Effect::SendChat { request_id, prompt } => (request_id, EngineRequest::Chat { prompt }),
        Effect::Inspire { request_id, prompt } => (request_id, EngineRequest::Inspire { prompt }),
        Effect::ReviewCode {
            request_id,
            code,
            language,
        } => (request_id, EngineRequest::Review { code, language }),
        Effect::CancelRequest { .. } | Effect::PersistGallery { .. } => return None,
    };
    Some(pair)
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress {
            request_id,
            stage,
            bytes,
        } => {
            studio_debug!("Request {} at {:?} ({:?} bytes)", request_id, stage, bytes);
            Msg::NoOp
        }
        EngineEvent::PollScheduled {
            request_id,
            attempt,
        } => {
            studio_debug!("Request {} poll {} not done yet", request_id, attempt);
            Msg::NoOp
        }
        EngineEvent::CaptionTick { request_id } => Msg::CaptionTick { request_id },
        EngineEvent::ImagesGenerated { request_id, images } => {
            Msg::ImagesReady { request_id, images }
        }
        EngineEvent::ImageEdited { request_id, output } => Msg::EditReady {
            request_id,
            text: output.text,
            images: output.images,
        },
        EngineEvent::InspirationReady {
            request_id,
            inspiration,
        } => Msg::InspirationReady {
            request_id,
            text: inspiration.text,
            sources: inspiration
                .sources
                .into_iter()
                .map(|citation| Source {
                    uri: citation.uri,
                    title: citation.title,
                })
                .collect(),
        },
        EngineEvent::ReviewReady { request_id, text } => Msg::ReviewReady { request_id, text },
        EngineEvent::ChatChunk { request_id, delta } => Msg::ChatChunk { request_id, delta },
        EngineEvent::ChatFinished { request_id } => Msg::ChatFinished { request_id },
        EngineEvent::VideoDelivered {
            request_id,
            data_uri,
        } => Msg::VideoDelivered {
            request_id,
            data_uri,
        },
        EngineEvent::Failed {
            request_id,
            user_message,
            ..
        } => Msg::RequestFailed {
            request_id,
            message: user_message,
        },
        EngineEvent::Cancelled { request_id } => {
            studio_debug!("Request {} cancelled", request_id);
            Msg::NoOp
        }
    }
}
