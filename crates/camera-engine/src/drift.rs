//! Playback drift correction.
//!
//! Keeps a media element's playhead in step with the composition clock.
//! Polled once per displayed frame with the source time the layout expects,
//! it either leaves the element alone, nudges its playback rate, or pauses,
//! seeks, and resumes.
//!
//! ```text
//! Idle ──expected time──▶ Tracking ◀──|drift| < disable── Correcting
//!                            │  ──|drift| >= enable──────────▶ │
//!                            └────────────┬────────────────────┘
//!                    jump / ended / sustained drift / user seek
//!                                         ▼
//!                                    HardSeeking ──on_seeked(token)──▶ Tracking
//! ```
//!
//! Seek completion arrives asynchronously. Every seek gets a fresh
//! [`SeekToken`]; completions carrying an older token are ignored.

use framecam_common::clock::DriftMeasurement;
use framecam_common::config::DriftTuning;
use framecam_common::error::FramecamResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Corrector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPhase {
    /// Nothing should be playing.
    #[default]
    Idle,
    /// Drift is small; the element runs at its nominal rate.
    Tracking,
    /// Drift is being closed with a rate nudge.
    Correcting,
    /// A seek is in flight (or must be retried).
    HardSeeking,
}

/// Identifies one seek request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeekToken(u64);

/// Why a seek request could not be issued.
#[derive(Debug, thiserror::Error)]
pub enum SeekError {
    #[error("media element is not ready to seek")]
    NotReady,

    #[error("seek target {0:.3}s is outside the media")]
    OutOfRange(f64),

    #[error("media backend error: {0}")]
    Backend(String),
}

/// The slice of a media element the corrector drives.
pub trait MediaElement {
    fn current_time_secs(&self) -> f64;
    fn is_seeking(&self) -> bool;
    fn is_paused(&self) -> bool;
    fn has_ended(&self) -> bool;
    fn set_playback_rate(&mut self, rate: f64);
    fn play(&mut self);
    fn pause(&mut self);
    /// Start a seek. Completion is reported later through
    /// [`DriftCorrector::on_seeked`].
    fn seek(&mut self, secs: f64) -> Result<(), SeekError>;
}

/// One poll of the corrector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftTick {
    pub frame: u32,
    /// Source time the layout expects on screen; `None` when no item is active.
    pub expected_source_time_ms: Option<f64>,
    /// Playback rate of the active item.
    pub nominal_rate: f64,
    /// Whether the composition transport is playing.
    pub is_playing: bool,
    /// Monotonic wall time of this poll.
    pub now_ms: f64,
}

/// Everything the corrector remembers between polls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriftCorrectionState {
    pub phase: DriftPhase,
    /// `media - expected` at the last poll (seconds).
    pub last_drift_secs: f64,
    /// Rate last pushed to the element.
    pub applied_rate: Option<f64>,
    /// Seek awaiting completion.
    pub pending_seek: Option<SeekToken>,
    pub seek_target_secs: Option<f64>,
    /// The last seek attempt failed and must be reissued.
    pub retry_seek: bool,
    /// When the element first reported the pending seek as finished
    /// without a completion arriving.
    pub seek_settled_since_ms: Option<f64>,
    pub resume_after_seek: bool,
    /// Start of the current run of oversized drift.
    pub oversized_since_ms: Option<f64>,
    pub grace_until_ms: Option<f64>,
    pub last_frame: Option<u32>,
    pub last_expected_ms: Option<f64>,
    pub last_tick_ms: Option<f64>,
    pub last_is_playing: bool,
    pub seeks_issued: u64,
}

/// Drift state machine for one mounted media element.
#[derive(Debug)]
pub struct DriftCorrector {
    tuning: DriftTuning,
    state: DriftCorrectionState,
    next_token: u64,
}

impl DriftCorrector {
    pub fn new(tuning: DriftTuning) -> FramecamResult<Self> {
        tuning.validate()?;
        Ok(Self {
            tuning,
            state: DriftCorrectionState::default(),
            next_token: 0,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            tuning: DriftTuning::default(),
            state: DriftCorrectionState::default(),
            next_token: 0,
        }
    }

    pub fn state(&self) -> &DriftCorrectionState {
        &self.state
    }

    pub fn phase(&self) -> DriftPhase {
        self.state.phase
    }

    pub fn tuning(&self) -> &DriftTuning {
        &self.tuning
    }

    /// Forget everything (media unmounted or clip group changed). Seeks
    /// issued before the reset can no longer complete.
    pub fn reset(&mut self) {
        self.state = DriftCorrectionState::default();
    }

    /// Poll once per displayed frame.
    pub fn update(&mut self, tick: &DriftTick, media: &mut dyn MediaElement) -> DriftPhase {
        let phase = match tick.expected_source_time_ms {
            None => self.go_idle(media),
            Some(expected_ms) => self.track(tick, expected_ms, media),
        };

        self.state.last_frame = Some(tick.frame);
        self.state.last_expected_ms = tick.expected_source_time_ms;
        self.state.last_tick_ms = Some(tick.now_ms);
        self.state.last_is_playing = tick.is_playing;
        phase
    }

    /// Seek completion callback. Returns `false` for stale tokens.
    pub fn on_seeked(
        &mut self,
        token: SeekToken,
        now_ms: f64,
        media: &mut dyn MediaElement,
    ) -> bool {
        if self.state.pending_seek != Some(token) {
            debug!(?token, pending = ?self.state.pending_seek, "stale seek completion ignored");
            return false;
        }

        self.state.pending_seek = None;
        self.state.seek_target_secs = None;
        self.state.seek_settled_since_ms = None;
        self.state.phase = DriftPhase::Tracking;
        self.state.oversized_since_ms = None;
        self.state.grace_until_ms = Some(now_ms + self.tuning.post_seek_grace_ms);

        if self.state.resume_after_seek && !media.is_seeking() {
            media.play();
        }
        true
    }

    /// Explicit seek requested by the user (scrub, timeline click).
    pub fn user_seek(
        &mut self,
        expected_ms: f64,
        now_ms: f64,
        media: &mut dyn MediaElement,
    ) -> Option<SeekToken> {
        // The next poll starts a fresh progression; it is not a jump.
        self.state.last_frame = None;
        self.state.last_expected_ms = None;
        self.state.last_tick_ms = Some(now_ms);
        let resume = self.state.last_is_playing;
        self.hard_seek(expected_ms / 1000.0, resume, None, media)
    }

    fn go_idle(&mut self, media: &mut dyn MediaElement) -> DriftPhase {
        if !media.is_paused() {
            media.pause();
        }
        self.state.phase = DriftPhase::Idle;
        self.state.pending_seek = None;
        self.state.retry_seek = false;
        self.state.oversized_since_ms = None;
        DriftPhase::Idle
    }

    fn track(
        &mut self,
        tick: &DriftTick,
        expected_ms: f64,
        media: &mut dyn MediaElement,
    ) -> DriftPhase {
        let expected_secs = expected_ms / 1000.0;
        let nominal = if tick.nominal_rate.is_finite() && tick.nominal_rate > 0.0 {
            tick.nominal_rate
        } else {
            1.0
        };

        if self.is_jump(tick, expected_ms, nominal) {
            info!(frame = tick.frame, expected_ms, "playhead jump, hard seek");
            self.hard_seek(expected_secs, tick.is_playing, Some(nominal), media);
            return self.state.phase;
        }

        if self.state.phase == DriftPhase::HardSeeking {
            if self.state.retry_seek {
                self.hard_seek(expected_secs, tick.is_playing, Some(nominal), media);
            } else if self.seek_completion_lost(tick.now_ms, media) {
                warn!(
                    frame = tick.frame,
                    pending = ?self.state.pending_seek,
                    "seek finished without a completion, reissuing"
                );
                self.hard_seek(expected_secs, tick.is_playing, Some(nominal), media);
            }
            return self.state.phase;
        }

        if tick.is_playing && media.has_ended() {
            info!(frame = tick.frame, "media ended under an active item, hard seek");
            self.hard_seek(expected_secs, true, Some(nominal), media);
            return self.state.phase;
        }

        let drift = DriftMeasurement {
            expected_secs,
            actual_secs: media.current_time_secs(),
        }
        .drift_secs();
        self.state.last_drift_secs = drift;
        let in_grace = self.state.grace_until_ms.is_some_and(|until| tick.now_ms < until);

        if !tick.is_playing {
            if !media.is_paused() {
                media.pause();
            }
            if !in_grace && drift.abs() > self.tuning.paused_tolerance_secs {
                debug!(drift, "paused off target, seeking");
                self.hard_seek(expected_secs, false, Some(nominal), media);
                return self.state.phase;
            }
            self.state.phase = DriftPhase::Tracking;
            return self.state.phase;
        }

        if media.is_paused() && !media.is_seeking() {
            media.play();
        }

        if in_grace {
            self.apply_rate(nominal, media);
            self.state.phase = DriftPhase::Tracking;
            return self.state.phase;
        }

        if drift.abs() > self.tuning.hard_seek_drift_secs {
            let since = *self.state.oversized_since_ms.get_or_insert(tick.now_ms);
            if tick.now_ms - since > self.tuning.hard_seek_sustain_ms {
                warn!(drift, sustained_ms = tick.now_ms - since, "drift not closing, hard seek");
                self.hard_seek(expected_secs, true, Some(nominal), media);
                return self.state.phase;
            }
        } else {
            self.state.oversized_since_ms = None;
        }

        let correcting = match self.state.phase {
            DriftPhase::Correcting => drift.abs() >= self.tuning.disable_threshold_secs,
            _ => drift.abs() >= self.tuning.enable_threshold_secs,
        };

        if correcting {
            let nudge = (-drift * self.tuning.nudge_gain)
                .clamp(-self.tuning.max_rate_nudge, self.tuning.max_rate_nudge);
            self.apply_rate(nominal * (1.0 + nudge), media);
            self.state.phase = DriftPhase::Correcting;
        } else {
            self.apply_rate(nominal, media);
            self.state.phase = DriftPhase::Tracking;
        }
        self.state.phase
    }

    fn is_jump(&self, tick: &DriftTick, expected_ms: f64, nominal: f64) -> bool {
        if let Some(last_frame) = self.state.last_frame {
            if tick.frame.abs_diff(last_frame) > self.tuning.jump_frame_delta {
                return true;
            }
        }
        match (self.state.last_expected_ms, self.state.last_tick_ms) {
            (Some(last_expected), Some(last_tick)) => {
                let progressed = if tick.is_playing {
                    (tick.now_ms - last_tick).max(0.0) * nominal
                } else {
                    0.0
                };
                (expected_ms - (last_expected + progressed)).abs() > self.tuning.jump_time_delta_ms
            }
            _ => false,
        }
    }

    /// The element stopped seeking more than a grace period ago and the
    /// completion for the pending token never arrived.
    fn seek_completion_lost(&mut self, now_ms: f64, media: &dyn MediaElement) -> bool {
        if self.state.pending_seek.is_none() || media.is_seeking() {
            self.state.seek_settled_since_ms = None;
            return false;
        }
        let since = *self.state.seek_settled_since_ms.get_or_insert(now_ms);
        now_ms - since > self.tuning.post_seek_grace_ms
    }

    fn hard_seek(
        &mut self,
        target_secs: f64,
        resume: bool,
        nominal: Option<f64>,
        media: &mut dyn MediaElement,
    ) -> Option<SeekToken> {
        if !media.is_paused() {
            media.pause();
        }
        if let Some(rate) = nominal {
            self.apply_rate(rate, media);
        }

        self.next_token += 1;
        let token = SeekToken(self.next_token);
        self.state.phase = DriftPhase::HardSeeking;
        self.state.seek_target_secs = Some(target_secs);
        self.state.resume_after_seek = resume;
        self.state.oversized_since_ms = None;
        self.state.grace_until_ms = None;
        self.state.seek_settled_since_ms = None;

        match media.seek(target_secs.max(0.0)) {
            Ok(()) => {
                self.state.pending_seek = Some(token);
                self.state.retry_seek = false;
                self.state.seeks_issued += 1;
                Some(token)
            }
            Err(err) => {
                warn!(error = %err, target_secs, "seek failed, retrying next frame");
                self.state.pending_seek = None;
                self.state.retry_seek = true;
                None
            }
        }
    }

    fn apply_rate(&mut self, rate: f64, media: &mut dyn MediaElement) {
        if self.state.applied_rate != Some(rate) {
            media.set_playback_rate(rate);
            self.state.applied_rate = Some(rate);
        }
    }
}
