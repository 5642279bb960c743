//! Continuous emotion detection.
//!
//! Starting detection launches one task per registered collector (voice,
//! face, wearable). Collectors never share state: each reports through an
//! mpsc channel into a single merge loop that owns the latest-known sample
//! per modality and re-fuses on every arrival, so partial or staggered data
//! still produces a current state. The per-sample facial analysis entry
//! point sits behind an explicit rate limiter.

use crate::ai::emotion::{fuse, EmotionSample, EmotionState, HealthSample};
use crate::error::EngineError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Minimum interval between per-sample facial analyses.
pub const ANALYSIS_COOLDOWN: Duration = Duration::from_millis(1000);

const EVENT_CHANNEL_CAPACITY: usize = 32;

// ── Collector seam ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Voice,
    Face,
    Health,
}

/// One reading from a collector, tagged with its modality.
#[derive(Debug, Clone)]
pub enum SampleEvent {
    Voice(EmotionSample),
    Face(EmotionSample),
    Health(HealthSample),
}

/// A sensing collaborator. `start` begins delivering samples through the
/// given channel at its own cadence; `stop` halts delivery.
#[async_trait]
pub trait SampleCollector: Send + Sync {
    fn modality(&self) -> Modality;
    async fn start(&self, events: mpsc::Sender<SampleEvent>) -> Result<(), EngineError>;
    async fn stop(&self) -> Result<(), EngineError>;
}

// ── Rate limiter ───────────────────────────────────────────

/// Last-call-timestamp debounce. Calls inside the cooldown window are
/// rejected, never queued.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Ok when outside the cooldown window; records the call time.
    pub fn check(&mut self) -> Result<(), EngineError> {
        let now = Instant::now();
        if let Some(last) = self.last_call {
            if now.duration_since(last) < self.min_interval {
                return Err(EngineError::RateLimited);
            }
        }
        self.last_call = Some(now);
        Ok(())
    }
}

// ── Detector ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    Idle,
    Detecting,
}

pub struct EmotionDetector {
    collectors: Vec<Arc<dyn SampleCollector>>,
    phase: DetectorPhase,
    limiter: RateLimiter,
    events_tx: Option<mpsc::Sender<SampleEvent>>,
    merge_task: Option<JoinHandle<()>>,
    state_tx: Arc<watch::Sender<EmotionState>>,
    state_rx: watch::Receiver<EmotionState>,
}

impl EmotionDetector {
    pub fn new(collectors: Vec<Arc<dyn SampleCollector>>) -> Self {
        Self::with_cooldown(collectors, ANALYSIS_COOLDOWN)
    }

    pub fn from_config(
        collectors: Vec<Arc<dyn SampleCollector>>,
        config: &crate::config::EngineConfig,
    ) -> Self {
        Self::with_cooldown(
            collectors,
            Duration::from_millis(config.analysis_cooldown_ms),
        )
    }

    pub fn with_cooldown(collectors: Vec<Arc<dyn SampleCollector>>, cooldown: Duration) -> Self {
        let (state_tx, state_rx) = watch::channel(EmotionState::neutral());
        Self {
            collectors,
            phase: DetectorPhase::Idle,
            limiter: RateLimiter::new(cooldown),
            events_tx: None,
            merge_task: None,
            state_tx: Arc::new(state_tx),
            state_rx,
        }
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Latest fused state; neutral until the first sample arrives.
    pub fn current(&self) -> EmotionState {
        self.state_rx.borrow().clone()
    }

    /// Watch fused-state updates.
    pub fn subscribe(&self) -> watch::Receiver<EmotionState> {
        self.state_tx.subscribe()
    }

    /// Transition Idle → Detecting: spawn the merge loop and start every
    /// collector. A collector that fails to start is logged and skipped;
    /// detection proceeds with the rest.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.phase == DetectorPhase::Detecting {
            debug!("emotion detector already running");
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<SampleEvent>(EVENT_CHANNEL_CAPACITY);

        let state_tx = self.state_tx.clone();
        self.merge_task = Some(tokio::spawn(async move {
            let mut voice: Option<EmotionSample> = None;
            let mut face: Option<EmotionSample> = None;
            let mut health: Option<HealthSample> = None;

            while let Some(event) = rx.recv().await {
                match event {
                    SampleEvent::Voice(sample) => voice = Some(sample),
                    SampleEvent::Face(sample) => face = Some(sample),
                    SampleEvent::Health(sample) => health = Some(sample),
                }
                let fused = fuse(voice.as_ref(), face.as_ref(), health.as_ref());
                let _ = state_tx.send(fused);
            }
        }));

        for collector in &self.collectors {
            if let Err(e) = collector.start(tx.clone()).await {
                warn!(
                    "failed to start {:?} collector, continuing without it: {}",
                    collector.modality(),
                    e
                );
            }
        }

        self.events_tx = Some(tx);
        self.phase = DetectorPhase::Detecting;
        Ok(())
    }

    /// Transition Detecting → Idle. Idempotent; tolerates being called when
    /// not started. Every collector gets a stop attempt even when an earlier
    /// one fails; failures are aggregated for logging only.
    pub async fn stop(&mut self) {
        if self.phase == DetectorPhase::Idle {
            return;
        }

        self.events_tx = None;

        let mut failures = Vec::new();
        for collector in &self.collectors {
            if let Err(e) = collector.stop().await {
                failures.push(format!("{:?}: {}", collector.modality(), e));
            }
        }
        if !failures.is_empty() {
            warn!("collector stop failures: {}", failures.join("; "));
        }

        if let Some(task) = self.merge_task.take() {
            task.abort();
        }
        self.phase = DetectorPhase::Idle;
    }

    /// Debounced per-sample facial analysis. Validates the sample, applies
    /// the cooldown, and returns the single-sample fused reading. While
    /// detecting, the sample also feeds the continuous merge loop.
    pub fn analyze_face(&mut self, sample: &EmotionSample) -> Result<EmotionState, EngineError> {
        validate_sample(sample)?;
        self.limiter.check()?;

        if let Some(tx) = &self.events_tx {
            let _ = tx.try_send(SampleEvent::Face(sample.clone()));
        }

        Ok(fuse(None, Some(sample), None))
    }

    /// Analyze a batch of facial samples. Rate-limited samples are skipped
    /// silently; malformed samples are logged and dropped.
    pub fn analyze_face_batch(&mut self, samples: &[EmotionSample]) -> Vec<EmotionState> {
        let mut states = Vec::new();
        for sample in samples {
            match self.analyze_face(sample) {
                Ok(state) => states.push(state),
                Err(e) if e.is_rate_limited() => {}
                Err(e) => warn!("rejecting facial sample: {}", e),
            }
        }
        states
    }
}

fn validate_sample(sample: &EmotionSample) -> Result<(), EngineError> {
    if sample.emotions.is_empty() {
        return Err(EngineError::InvalidSample(
            "sample carries no emotion entries".to_string(),
        ));
    }
    if !(sample.source_weight.is_finite() && sample.source_weight > 0.0) {
        return Err(EngineError::InvalidSample(format!(
            "bad source weight: {}",
            sample.source_weight
        )));
    }
    for entry in &sample.emotions {
        if !entry.confidence.is_finite() || !(0.0..=1.0).contains(&entry.confidence) {
            return Err(EngineError::InvalidSample(format!(
                "confidence out of range for {}: {}",
                entry.emotion, entry.confidence
            )));
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────
