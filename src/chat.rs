//! Advice conversation with the assistant chef.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::api::{ChatRequest, MealApi};
use crate::domain::{ChatContext, ChatMessage, ChatRole, WireMessage};
use crate::error::{CompanionError, Operation};
use crate::workflow::InFlight;

pub const GREETING: &str = "Hello! I'm your personal culinary guide. Ask me anything about cooking, recipes, or techniques. How can I help you today?";
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an issue getting a response. Please try again in a moment.";

pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "How do I fix a broken hollandaise?",
    "What's a good wine pairing for spicy dishes?",
    "How do I perfectly sear a steak?",
    "What are some quick 15-minute meals?",
];

/// Append-only conversation. The whole thread is resent on every turn.
pub struct ChatThread {
    api: Arc<dyn MealApi>,
    messages: Vec<ChatMessage>,
    pub context: ChatContext,
    pending: InFlight<()>,
}

impl ChatThread {
    pub fn new(api: Arc<dyn MealApi>) -> Self {
        Self {
            api,
            messages: vec![ChatMessage::new(ChatRole::Assistant, GREETING)],
            context: ChatContext {
                journey: Some("balanced".into()),
                ..Default::default()
            },
            pending: InFlight::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_active(&())
    }

    /// Sends one user turn and appends the reply.
    ///
    /// Blank input is ignored (`Ok(None)`). A failed call still appends an
    /// apology from the assistant so the thread stays usable.
    #[instrument(skip(self, text), fields(turns = self.messages.len()))]
    pub async fn send(&mut self, text: &str) -> Result<Option<&ChatMessage>, CompanionError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let _token = self
            .pending
            .try_acquire(())
            .ok_or(CompanionError::InFlight(Operation::Chat))?;
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        let request = ChatRequest {
            messages: self.messages.iter().map(WireMessage::from).collect(),
            context: self.context.clone(),
        };

        let reply = match self.api.chat(request).await {
            Ok(resp) => resp.response,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                FALLBACK_REPLY.to_string()
            }
        };
        self.messages.push(ChatMessage::new(ChatRole::Assistant, reply));
        Ok(self.messages.last())
    }
}
