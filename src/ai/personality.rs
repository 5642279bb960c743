//! Personality traits and feedback-driven adaptation.
//!
//! Six numeric traits, each 0.0-1.0, drift slowly as the user rates replies.
//! Which traits move (and in which direction) depends on the emotion the
//! user was in when the reply landed: comfort while sad grows empathy,
//! pushiness while stressed shrinks assertiveness, and so on.

use crate::ai::emotion::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-adjustment step size. Small on purpose: personality shifts over many
/// interactions, not one.
pub const LEARNING_RATE: f32 = 0.05;

/// Cap on retained interactions; oldest are evicted first.
pub const MAX_INTERACTIONS: usize = 1000;

// ── Profile ────────────────────────────────────────────────

/// Fixed trait vector, every value clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub empathy: f32,
    pub enthusiasm: f32,
    pub formality: f32,
    pub humor: f32,
    pub assertiveness: f32,
    pub creativity: f32,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        Self {
            empathy: 0.5,
            enthusiasm: 0.5,
            formality: 0.5,
            humor: 0.5,
            assertiveness: 0.5,
            creativity: 0.5,
        }
    }
}

fn nudge(trait_value: &mut f32, feedback: f32, rate: f32) {
    *trait_value = (*trait_value + feedback * rate).clamp(0.0, 1.0);
}

impl PersonalityProfile {
    /// Fold one piece of feedback (-1.0 to 1.0) into the profile, given the
    /// emotion the user was in. Each emotion nudges a fixed subset of traits;
    /// emotions without a dedicated rule nudge everything at quarter rate.
    pub fn adjust(&mut self, emotion: Emotion, feedback: f32) {
        match emotion {
            Emotion::Sad => {
                nudge(&mut self.empathy, feedback, LEARNING_RATE);
                nudge(&mut self.humor, feedback, LEARNING_RATE * 0.5);
            }
            Emotion::Stressed => {
                nudge(&mut self.empathy, feedback, LEARNING_RATE);
                nudge(&mut self.assertiveness, -feedback, LEARNING_RATE);
            }
            Emotion::Happy | Emotion::Energetic => {
                nudge(&mut self.enthusiasm, feedback, LEARNING_RATE);
                nudge(&mut self.creativity, feedback, LEARNING_RATE);
            }
            Emotion::Calm => {
                nudge(&mut self.formality, feedback, LEARNING_RATE);
                nudge(&mut self.assertiveness, feedback * 0.5, LEARNING_RATE);
            }
            Emotion::Angry | Emotion::Surprised | Emotion::Neutral => {
                nudge(&mut self.empathy, feedback * 0.25, LEARNING_RATE);
                nudge(&mut self.enthusiasm, feedback * 0.25, LEARNING_RATE);
                nudge(&mut self.formality, feedback * 0.25, LEARNING_RATE);
                nudge(&mut self.humor, feedback * 0.25, LEARNING_RATE);
                nudge(&mut self.assertiveness, feedback * 0.25, LEARNING_RATE);
                nudge(&mut self.creativity, feedback * 0.25, LEARNING_RATE);
            }
        }
    }

    /// Pick a speaking tone for the given emotion, consulting trait levels.
    pub fn determine_tone(&self, emotion: Emotion) -> &'static str {
        match emotion {
            Emotion::Sad => {
                if self.empathy > 0.7 {
                    "compassionate"
                } else {
                    "supportive"
                }
            }
            Emotion::Stressed => {
                if self.empathy > 0.6 {
                    "calming"
                } else {
                    "practical"
                }
            }
            Emotion::Happy => {
                if self.enthusiasm > 0.6 {
                    "enthusiastic"
                } else {
                    "pleasant"
                }
            }
            Emotion::Energetic => {
                if self.enthusiasm > 0.7 {
                    "dynamic"
                } else {
                    "engaging"
                }
            }
            Emotion::Calm => {
                if self.formality > 0.6 {
                    "composed"
                } else {
                    "relaxed"
                }
            }
            Emotion::Angry | Emotion::Surprised | Emotion::Neutral => "neutral",
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Conversation openers the companion can offer alongside a reply.
pub fn suggested_actions(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Sad => &[
            "Would you like to talk about what's bothering you?",
            "How about we do something enjoyable together?",
            "Should we look at some happy memories?",
        ],
        Emotion::Stressed => &[
            "Let's try some breathing exercises",
            "Would you like to take a short break?",
            "Should we break down what's causing the stress?",
        ],
        Emotion::Happy => &[
            "Want to share what made you happy?",
            "Should we plan something fun?",
            "How about we set some exciting goals?",
        ],
        Emotion::Energetic => &[
            "Want to channel this energy into something productive?",
            "How about we tackle that project you've been thinking about?",
            "Should we do something creative?",
        ],
        Emotion::Calm => &[
            "Would you like to reflect on your day?",
            "How about we plan for tomorrow?",
            "Should we practice some mindfulness?",
        ],
        Emotion::Angry | Emotion::Surprised | Emotion::Neutral => &[
            "What would you like to focus on?",
            "How can I help you today?",
            "Want to explore something new?",
        ],
    }
}

// ── Interaction log ────────────────────────────────────────

/// One historical feedback record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: i64,
    pub user_emotion: Emotion,
    pub ai_response: String,
    /// Thumbs-up/down style rating, -1.0 to 1.0. None until the user rates.
    pub user_feedback: Option<f32>,
}

/// Append-only ring of recent interactions, capped at `MAX_INTERACTIONS`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionLog {
    entries: VecDeque<Interaction>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interaction: Interaction) {
        self.entries.push_back(interaction);
        while self.entries.len() > MAX_INTERACTIONS {
            self.entries.pop_front();
        }
    }

    /// Attach feedback to the most recent interaction, if any.
    pub fn rate_last(&mut self, feedback: f32) {
        if let Some(last) = self.entries.back_mut() {
            last.user_feedback = Some(feedback);
        }
    }

    pub fn last(&self) -> Option<&Interaction> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Tests ──────────────────────────────────────────────────
