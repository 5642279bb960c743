//! Prompt text builders: system prompt, per-turn context lines, and the
//! static fallback replies used when the completion provider is down.

use crate::ai::emotion::Emotion;
use crate::ai::personality::PersonalityProfile;

pub const SYSTEM_PROMPT: &str = "You are an empathetic AI companion that helps users with their emotional well-being. \
You should be supportive, understanding, and adapt your responses based on the user's emotional state. \
Keep responses concise and natural, as if chatting with a friend. \
Learn from past interactions to provide better support. \
IMPORTANT: Never ask for or store personal information. Keep responses general and avoid specifics. \
If a user shares personal details, acknowledge without repeating them and guide the conversation to general topics.";

/// Returned instead of forwarding a message that contains hard-sensitive
/// data (email, phone, card, SSN).
pub const PRIVACY_NOTICE: &str = "I notice you've shared some personal information. \
For your privacy and security, I've removed it. Let's focus on how you're feeling instead.";

/// Tag prepended to the user message so the model knows the detected state.
pub fn emotion_context(emotion: Emotion) -> String {
    format!("[Current emotion: {}]", emotion)
}

/// Style instruction derived from the current trait vector.
pub fn personality_instruction(profile: &PersonalityProfile) -> String {
    format!(
        "Respond with {:.0}% empathy, {:.0}% enthusiasm, {:.0}% formality, \
         {:.0}% humor, {:.0}% assertiveness, and {:.0}% creativity. \
         Remember to keep the response general and avoid asking for personal details.",
        profile.empathy * 100.0,
        profile.enthusiasm * 100.0,
        profile.formality * 100.0,
        profile.humor * 100.0,
        profile.assertiveness * 100.0,
        profile.creativity * 100.0,
    )
}

/// System hint injected when a prior similar interaction is on file.
pub fn knowledge_hint(past_response: &str) -> String {
    format!("Previous helpful response pattern: \"{}\"", past_response)
}

/// Static replies keyed by emotion, used when generation fails. The
/// conversation continues; nothing here is an error surface.
pub fn fallback_reply(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "I'm so glad you're feeling happy! Your positive energy is contagious.",
        Emotion::Sad => "I understand you're feeling down. I'm here to listen and support you.",
        Emotion::Angry => "I can tell something's really bothering you. I'm here whenever you want to talk it through.",
        Emotion::Surprised => "That sounds unexpected! Take a moment, I'm right here with you.",
        Emotion::Stressed => "It sounds like you're under a lot of pressure. Let's take a deep breath together.",
        Emotion::Energetic => "Your energy is amazing! Let's channel it into something productive.",
        Emotion::Calm => "It's wonderful that you're feeling peaceful. Let's maintain this tranquil state.",
        Emotion::Neutral => "How are you feeling right now? I'm here to chat about anything.",
    }
}

// ── Tests ──────────────────────────────────────────────────
