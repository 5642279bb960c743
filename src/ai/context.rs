//! Conversation orchestration.
//!
//! One turn runs sequentially: fused emotion in → knowledge lookup →
//! completion call → reply out → (later) user feedback folded into the
//! personality profile and the knowledge base. Provider failures degrade to
//! a static fallback reply; nothing in a turn is fatal.

use crate::ai::emotion::{Emotion, EmotionState};
use crate::ai::knowledge::KnowledgeStore;
use crate::ai::personality::{suggested_actions, Interaction, InteractionLog, PersonalityProfile};
use crate::ai::prompts;
use crate::ai::sanitize::contains_sensitive;
use crate::config::EngineConfig;
use crate::llm::provider::{ChatMessage, CompletionParams, CompletionProvider};
use crate::store::document::DocumentStore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Effectiveness recorded for a brand-new knowledge entry, before any
/// feedback arrives.
const INITIAL_EFFECTIVENESS: f32 = 0.5;

/// What the caller renders after a turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub content: String,
    pub tone: &'static str,
    pub suggested_actions: &'static [&'static str],
    /// True when the completion provider failed and a static reply was used.
    pub used_fallback: bool,
    /// True when a prior similar interaction biased the prompt.
    pub knowledge_informed: bool,
}

/// Serializable engine state for persistence between sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub personality: PersonalityProfile,
    pub interactions: InteractionLog,
}

struct LastExchange {
    user_input: String,
}

pub struct CompanionEngine {
    config: EngineConfig,
    provider: Arc<dyn CompletionProvider>,
    knowledge: KnowledgeStore,
    personality: PersonalityProfile,
    interactions: InteractionLog,
    history: VecDeque<ChatMessage>,
    last_exchange: Option<LastExchange>,
}

impl CompanionEngine {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn DocumentStore>,
        config: EngineConfig,
    ) -> Self {
        let knowledge = KnowledgeStore::with_threshold(store, config.similarity_threshold);
        let mut history = VecDeque::new();
        history.push_back(ChatMessage::system(prompts::SYSTEM_PROMPT));

        Self {
            config,
            provider,
            knowledge,
            personality: PersonalityProfile::default(),
            interactions: InteractionLog::new(),
            history,
            last_exchange: None,
        }
    }

    /// Rebuild the knowledge index from the document store. Best-effort.
    pub async fn load(&mut self) {
        self.knowledge.load().await;
    }

    pub fn personality(&self) -> &PersonalityProfile {
        &self.personality
    }

    pub fn interactions(&self) -> &InteractionLog {
        &self.interactions
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// The most recent `n` history messages, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<ChatMessage> {
        self.history
            .iter()
            .skip(self.history.len().saturating_sub(n))
            .cloned()
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Run one conversation turn against the fused emotional state.
    pub async fn respond(&mut self, user_message: &str, state: &EmotionState) -> TurnReply {
        let emotion = state.dominant_emotion;

        // Hard-sensitive content never reaches the provider, redacted or not.
        if contains_sensitive(user_message) {
            debug!("short-circuiting turn: message contains sensitive data");
            return self.reply(prompts::PRIVACY_NOTICE.to_string(), emotion, false, false);
        }

        let knowledge_hit = self
            .knowledge
            .find(user_message, emotion)
            .map(|entry| entry.response.clone());

        self.history.push_back(ChatMessage::user(format!(
            "{}\n{}",
            prompts::emotion_context(emotion),
            user_message
        )));
        if let Some(past_response) = &knowledge_hit {
            self.history
                .push_back(ChatMessage::system(prompts::knowledge_hint(past_response)));
        }
        self.truncate_history();

        let mut messages: Vec<ChatMessage> = self.history.iter().cloned().collect();
        messages.push(ChatMessage::system(prompts::personality_instruction(
            &self.personality,
        )));

        let params = CompletionParams {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..CompletionParams::default()
        };

        let content = match self.provider.complete(messages, Some(params)).await {
            Ok(content) => content,
            Err(e) => {
                warn!("completion failed, using fallback reply: {}", e);
                self.last_exchange = None;
                self.interactions.push(Interaction {
                    timestamp: chrono::Utc::now().timestamp(),
                    user_emotion: emotion,
                    ai_response: prompts::fallback_reply(emotion).to_string(),
                    user_feedback: None,
                });
                return self.reply(
                    prompts::fallback_reply(emotion).to_string(),
                    emotion,
                    true,
                    knowledge_hit.is_some(),
                );
            }
        };

        // The model is instructed to stay general; if it echoes sensitive
        // data anyway, the reply is replaced wholesale.
        let content = if contains_sensitive(&content) {
            warn!("provider reply contained sensitive data, replacing");
            prompts::PRIVACY_NOTICE.to_string()
        } else {
            content
        };

        self.history
            .push_back(ChatMessage::assistant(content.clone()));
        self.knowledge
            .record(user_message, &content, emotion, INITIAL_EFFECTIVENESS)
            .await;
        self.interactions.push(Interaction {
            timestamp: chrono::Utc::now().timestamp(),
            user_emotion: emotion,
            ai_response: content.clone(),
            user_feedback: None,
        });
        self.last_exchange = Some(LastExchange {
            user_input: user_message.to_string(),
        });

        self.reply(content, emotion, false, knowledge_hit.is_some())
    }

    /// Fold a thumbs-up/down rating (-1.0 to 1.0) for the latest reply into
    /// the personality profile and the knowledge base.
    pub async fn provide_feedback(&mut self, feedback: f32) {
        let feedback = feedback.clamp(-1.0, 1.0);

        let emotion = match self.interactions.last() {
            Some(interaction) => interaction.user_emotion,
            None => {
                debug!("feedback with no interaction on record, ignoring");
                return;
            }
        };

        self.interactions.rate_last(feedback);
        self.personality.adjust(emotion, feedback);

        // Knowledge effectiveness lives in [0, 1]; feedback maps linearly.
        if let Some(exchange) = self.last_exchange.take() {
            let effectiveness = (feedback + 1.0) / 2.0;
            self.knowledge
                .update_effectiveness(&exchange.user_input, effectiveness)
                .await;
            self.last_exchange = Some(exchange);
        }
    }

    /// Drop everything but the system prompt.
    pub fn clear_history(&mut self) {
        self.history.truncate(1);
        self.last_exchange = None;
    }

    /// Reset the personality to defaults and forget logged interactions.
    pub fn reset_personality(&mut self) {
        self.personality.reset();
        self.interactions.clear();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            personality: self.personality.clone(),
            interactions: self.interactions.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: EngineSnapshot) {
        self.personality = snapshot.personality;
        self.interactions = snapshot.interactions;
    }

    fn reply(
        &self,
        content: String,
        emotion: Emotion,
        used_fallback: bool,
        knowledge_informed: bool,
    ) -> TurnReply {
        TurnReply {
            content,
            tone: self.personality.determine_tone(emotion),
            suggested_actions: suggested_actions(emotion),
            used_fallback,
            knowledge_informed,
        }
    }

    /// Keep the system prompt and the most recent messages under the cap.
    fn truncate_history(&mut self) {
        while self.history.len() > self.config.max_history_messages {
            self.history.remove(1);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
