use futures_util::StreamExt;
use studio_logging::{studio_debug, studio_warn};
use tokio_util::sync::CancellationToken;

use crate::api::GenerationApi;
use crate::FlowError;

/// System instruction of the design-studio chat persona.
pub const DESIGN_PERSONA: &str = r#"You are "Muse," a creative AI assistant specializing in graphic design. Your personality is inspiring, helpful, and knowledgeable about art, design history, current trends, and creative tools.

Your core functions are:
1.  **Brainstorming & Ideation:** Help users develop concepts, generate ideas for logos, branding, illustrations, UI/UX, etc.
2.  **Design Feedback:** Offer constructive criticism on design principles like color theory, typography, layout, and composition.
3.  **Trend Analysis:** Provide insights into current and emerging design trends.
4.  **Creative Guidance:** Act as a creative partner, helping users overcome creative blocks and explore new artistic directions.

Guidelines:
- Always be encouraging and positive.
- Use Markdown for clear formatting (lists, bolding) to make your advice easy to digest.
- When discussing concepts, be descriptive and use evocative language."#;

pub const DESIGN_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Everything the API needs to produce the next reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_instruction: String,
    pub temperature: f32,
    /// Prior turns followed by the new user turn.
    pub turns: Vec<ChatTurn>,
}

/// One conversation with its own history. Owned by whoever drives it; there
/// is no process-wide session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    system_instruction: String,
    temperature: f32,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(system_instruction: impl Into<String>, temperature: f32) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            temperature,
            history: Vec::new(),
        }
    }

    pub fn design() -> Self {
        Self::new(DESIGN_PERSONA, DESIGN_TEMPERATURE)
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Streams the reply to `text`, calling `on_chunk` for each delta in
    /// arrival order. History only records completed exchanges.
    pub async fn send(
        &mut self,
        api: &dyn GenerationApi,
        text: &str,
        cancel: &CancellationToken,
        mut on_chunk: impl FnMut(&str) + Send,
    ) -> Result<String, FlowError> {
        let mut turns = self.history.clone();
        turns.push(ChatTurn {
            role: ChatRole::User,
            text: text.to_string(),
        });
        let request = ChatRequest {
            system_instruction: self.system_instruction.clone(),
            temperature: self.temperature,
            turns,
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FlowError::Cancelled),
            opened = api.stream_chat(request) => opened.map_err(FlowError::StreamFailed)?,
        };

        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FlowError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(delta)) => {
                    reply.push_str(&delta);
                    on_chunk(&delta);
                }
                Some(Err(err)) => {
                    studio_warn!(
                        "Chat stream failed after {} bytes: {}",
                        reply.len(),
                        err
                    );
                    return Err(FlowError::StreamFailed(err));
                }
                None => break,
            }
        }

        studio_debug!("Chat reply complete ({} bytes)", reply.len());
        self.history.push(ChatTurn {
            role: ChatRole::User,
            text: text.to_string(),
        });
        self.history.push(ChatTurn {
            role: ChatRole::Model,
            text: reply.clone(),
        });
        Ok(reply)
    }
}
