//! End-to-end engine flow: sample → fuse → respond → feedback, with real
//! stores underneath and a scripted completion provider.

use async_trait::async_trait;
use attune_engine::ai::prompts;
use attune_engine::{
    fuse, ChatMessage, CompanionEngine, CompletionParams, CompletionProvider, Emotion,
    EmotionConfidence, EmotionSample, EngineConfig, EngineError, HealthSample,
    MemoryDocumentStore, SqliteDocumentStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Providers ───────────────────────────────────────────────

/// Always answers with the same canned reply.
struct CannedProvider {
    reply: &'static str,
    calls: AtomicUsize,
}

impl CannedProvider {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _params: Option<CompletionParams>,
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }

    fn id(&self) -> &str {
        "canned"
    }
}

/// Always fails, as if the network or quota were gone.
struct DownProvider;

#[async_trait]
impl CompletionProvider for DownProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _params: Option<CompletionParams>,
    ) -> Result<String, EngineError> {
        Err(EngineError::Provider("connection refused".to_string()))
    }

    fn id(&self) -> &str {
        "down"
    }
}

fn sample(entries: &[(Emotion, f32)], weight: f32) -> EmotionSample {
    EmotionSample::new(
        entries
            .iter()
            .map(|(emotion, confidence)| EmotionConfidence {
                emotion: *emotion,
                confidence: *confidence,
            })
            .collect(),
        weight,
    )
}

// ── Full turn flow ──────────────────────────────────────────

#[tokio::test]
async fn fused_state_drives_a_full_turn_with_feedback() {
    let voice = sample(&[(Emotion::Sad, 0.8)], 0.4);
    let face = sample(&[(Emotion::Sad, 0.6), (Emotion::Neutral, 0.2)], 0.4);
    let state = fuse(Some(&voice), Some(&face), None);
    assert_eq!(state.dominant_emotion, Emotion::Sad);

    let mut engine = CompanionEngine::new(
        Arc::new(CannedProvider::new("That sounds hard. I'm here.")),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );

    let reply = engine.respond("today was really difficult", &state).await;
    assert_eq!(reply.content, "That sounds hard. I'm here.");
    assert!(!reply.used_fallback);
    assert_eq!(reply.tone, "supportive");
    assert!(!reply.suggested_actions.is_empty());

    engine.provide_feedback(1.0).await;

    // Sad + positive feedback: empathy at full rate, humor at half.
    assert!((engine.personality().empathy - 0.55).abs() < 1e-6);
    assert!((engine.personality().humor - 0.525).abs() < 1e-6);
    assert_eq!(engine.personality().formality, 0.5);

    let entry = engine
        .knowledge()
        .find("today was really difficult", Emotion::Sad)
        .expect("the turn should be on file");
    assert_eq!(entry.context.use_count, 2);
    assert!((entry.context.effectiveness - 0.75).abs() < 1e-6);
}

#[tokio::test]
async fn second_similar_turn_is_knowledge_informed() {
    let mut engine = CompanionEngine::new(
        Arc::new(CannedProvider::new("Let's unpack that together.")),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );

    let state = fuse(Some(&sample(&[(Emotion::Stressed, 0.9)], 0.4)), None, None);

    let first = engine.respond("work is overwhelming me", &state).await;
    assert!(!first.knowledge_informed, "nothing on file yet");

    let second = engine.respond("work is overwhelming us", &state).await;
    assert!(
        second.knowledge_informed,
        "a near-identical pattern with the same emotion should match"
    );
}

#[tokio::test]
async fn knowledge_hit_requires_same_emotion_even_for_identical_text() {
    let mut engine = CompanionEngine::new(
        Arc::new(CannedProvider::new("Noted.")),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );

    let stressed = fuse(Some(&sample(&[(Emotion::Stressed, 0.9)], 0.4)), None, None);
    let happy = fuse(Some(&sample(&[(Emotion::Happy, 0.9)], 0.4)), None, None);

    engine.respond("thinking about the deadline", &stressed).await;
    let cross = engine.respond("thinking about the deadline", &happy).await;
    assert!(
        !cross.knowledge_informed,
        "an entry stored under stressed must not match a happy query"
    );
}

#[tokio::test]
async fn provider_outage_degrades_to_fallback_and_conversation_continues() {
    let mut engine = CompanionEngine::new(
        Arc::new(DownProvider),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );

    let state = fuse(None, None, Some(&HealthSample::new(80.0, 90.0)));
    assert_eq!(state.dominant_emotion, Emotion::Stressed);

    let reply = engine.respond("everything is too much", &state).await;
    assert!(reply.used_fallback);
    assert_eq!(reply.content, prompts::fallback_reply(Emotion::Stressed));

    // The next turn still works; the engine never wedges.
    let reply = engine.respond("still here?", &state).await;
    assert!(reply.used_fallback);
    assert_eq!(engine.interactions().len(), 2);
}

#[tokio::test]
async fn privacy_guard_blocks_message_without_calling_provider() {
    let provider = Arc::new(CannedProvider::new("never"));
    let mut engine = CompanionEngine::new(
        provider.clone(),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );

    let state = fuse(Some(&sample(&[(Emotion::Neutral, 0.9)], 0.4)), None, None);
    let reply = engine
        .respond("reach me at jane.doe@example.com please", &state)
        .await;

    assert_eq!(reply.content, prompts::PRIVACY_NOTICE);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(engine.knowledge().is_empty());
}

// ── Persistence across sessions ─────────────────────────────

#[tokio::test]
async fn knowledge_survives_a_restart_through_sqlite() {
    let tmp = tempfile::TempDir::new().unwrap();
    let url = format!("sqlite://{}", tmp.path().join("companion.db").display());

    let store = Arc::new(SqliteDocumentStore::connect(&url).await.unwrap());
    let state = fuse(Some(&sample(&[(Emotion::Calm, 0.9)], 0.4)), None, None);

    {
        let mut engine = CompanionEngine::new(
            Arc::new(CannedProvider::new("A quiet evening sounds lovely.")),
            store.clone(),
            EngineConfig::default(),
        );
        engine.respond("planning a quiet evening", &state).await;
    }

    let store = Arc::new(SqliteDocumentStore::connect(&url).await.unwrap());
    let mut engine = CompanionEngine::new(
        Arc::new(CannedProvider::new("unused")),
        store,
        EngineConfig::default(),
    );
    engine.load().await;

    let entry = engine
        .knowledge()
        .find("planning a quiet evening", Emotion::Calm)
        .expect("entry should come back from disk");
    assert_eq!(entry.response, "A quiet evening sounds lovely.");
}

#[tokio::test]
async fn snapshot_persists_personality_between_sessions() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("engine_state.json");

    let state = fuse(Some(&sample(&[(Emotion::Happy, 0.9)], 0.4)), None, None);
    let snapshot = {
        let mut engine = CompanionEngine::new(
            Arc::new(CannedProvider::new("Wonderful!")),
            Arc::new(MemoryDocumentStore::new()),
            EngineConfig::default(),
        );
        engine.respond("got the promotion", &state).await;
        engine.provide_feedback(1.0).await;
        engine.snapshot()
    };
    attune_engine::config::save_json_config(&path, &snapshot, "engine-state").unwrap();

    let restored: attune_engine::EngineSnapshot =
        attune_engine::config::load_json_config(&path, "engine-state");
    let mut engine = CompanionEngine::new(
        Arc::new(CannedProvider::new("unused")),
        Arc::new(MemoryDocumentStore::new()),
        EngineConfig::default(),
    );
    engine.restore(restored);

    // Happy + positive feedback moved enthusiasm and creativity.
    assert!((engine.personality().enthusiasm - 0.55).abs() < 1e-6);
    assert!((engine.personality().creativity - 0.55).abs() < 1e-6);
    assert_eq!(engine.interactions().len(), 1);
}
