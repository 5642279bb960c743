//! Emotion model and multimodal fusion.
//!
//! Each sensing modality (voice, face, wearable) reports an independent
//! estimate of the user's emotional state. Fusion merges them into one
//! ranked distribution: per-emotion confidences are scaled by the source
//! weight, summed across modalities, then normalized so they total 1.0.

use serde::{Deserialize, Serialize};

// ── Fixed source weights ───────────────────────────────────

/// Voice contributes 40% of the fused mass.
pub const VOICE_WEIGHT: f32 = 0.4;
/// Face contributes 40% of the fused mass.
pub const FACE_WEIGHT: f32 = 0.4;
/// The single health-derived estimate contributes 20%.
pub const HEALTH_WEIGHT: f32 = 0.2;

// ── Emotion ────────────────────────────────────────────────

/// Closed set of recognized emotions. No custom values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Stressed,
    Energetic,
    Calm,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Stressed,
        Emotion::Energetic,
        Emotion::Calm,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Stressed => "stressed",
            Emotion::Energetic => "energetic",
            Emotion::Calm => "calm",
            Emotion::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "angry" => Ok(Emotion::Angry),
            "surprised" => Ok(Emotion::Surprised),
            "stressed" => Ok(Emotion::Stressed),
            "energetic" => Ok(Emotion::Energetic),
            "calm" => Ok(Emotion::Calm),
            "neutral" => Ok(Emotion::Neutral),
            other => Err(format!("unknown emotion: {}", other)),
        }
    }
}

// ── Samples ────────────────────────────────────────────────

/// One emotion with its confidence, 0.0-1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfidence {
    pub emotion: Emotion,
    pub confidence: f32,
}

/// One modality's reading. Transient: produced by a collector, consumed by
/// the next fusion pass, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSample {
    pub emotions: Vec<EmotionConfidence>,
    pub source_weight: f32,
    pub timestamp: i64,
}

impl EmotionSample {
    pub fn new(emotions: Vec<EmotionConfidence>, source_weight: f32) -> Self {
        Self {
            emotions,
            source_weight,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Raw wearable reading. Mapped onto a single emotion estimate by a fixed
/// decision table before fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSample {
    pub heart_rate: f32,
    pub stress_level: f32,
    pub timestamp: i64,
}

impl HealthSample {
    pub fn new(heart_rate: f32, stress_level: f32) -> Self {
        Self {
            heart_rate,
            stress_level,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Decision table: stress dominates, then elevated heart rate.
    pub fn to_emotion_estimate(&self) -> EmotionConfidence {
        if self.stress_level > 70.0 {
            EmotionConfidence {
                emotion: Emotion::Stressed,
                confidence: 0.8,
            }
        } else if self.stress_level < 30.0 {
            EmotionConfidence {
                emotion: Emotion::Calm,
                confidence: 0.8,
            }
        } else if self.heart_rate > 100.0 {
            EmotionConfidence {
                emotion: Emotion::Energetic,
                confidence: 0.7,
            }
        } else {
            EmotionConfidence {
                emotion: Emotion::Neutral,
                confidence: 0.6,
            }
        }
    }
}

// ── Fused state ────────────────────────────────────────────

/// Result of fusing the available modalities. `emotions` is normalized so
/// confidences sum to 1.0; `dominant_emotion` is the entry with the highest
/// confidence, first-seen order breaking ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionState {
    pub dominant_emotion: Emotion,
    pub emotions: Vec<EmotionConfidence>,
    pub confidence: f32,
    pub timestamp: i64,
}

impl EmotionState {
    /// Default state when no modality has supplied any data: neutral with
    /// zero confidence and an empty distribution.
    pub fn neutral() -> Self {
        Self {
            dominant_emotion: Emotion::Neutral,
            emotions: Vec::new(),
            confidence: 0.0,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Merge whatever modalities are present into one ranked state.
///
/// Same-emotion confidences are summed (not averaged) across modalities
/// before normalization, so agreement between sources reinforces.
pub fn fuse(
    voice: Option<&EmotionSample>,
    face: Option<&EmotionSample>,
    health: Option<&HealthSample>,
) -> EmotionState {
    let mut merged: Vec<EmotionConfidence> = Vec::new();
    let mut total = 0.0_f32;

    let mut absorb = |emotion: Emotion, weighted: f32| {
        match merged.iter_mut().find(|e| e.emotion == emotion) {
            Some(existing) => existing.confidence += weighted,
            None => merged.push(EmotionConfidence {
                emotion,
                confidence: weighted,
            }),
        }
        total += weighted;
    };

    for sample in [voice, face].into_iter().flatten() {
        for e in &sample.emotions {
            absorb(e.emotion, e.confidence * sample.source_weight);
        }
    }

    if let Some(h) = health {
        let estimate = h.to_emotion_estimate();
        absorb(estimate.emotion, estimate.confidence * HEALTH_WEIGHT);
    }

    if total <= f32::EPSILON {
        return EmotionState::neutral();
    }

    for e in &mut merged {
        e.confidence /= total;
    }

    // Max by confidence; strict comparison keeps the first-seen entry on ties.
    let mut dominant = merged[0].clone();
    for e in &merged[1..] {
        if e.confidence > dominant.confidence {
            dominant = e.clone();
        }
    }

    EmotionState {
        dominant_emotion: dominant.emotion,
        confidence: dominant.confidence,
        emotions: merged,
        timestamp: chrono::Utc::now().timestamp(),
    }
}

// ── Tests ──────────────────────────────────────────────────
