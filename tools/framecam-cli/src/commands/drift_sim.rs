//! Replay a composition's playback against a simulated media element.
//!
//! The simulated element runs slightly off speed and takes a few frames to
//! complete seeks, which is enough to watch the corrector nudge, seek, and
//! settle.

use std::collections::BTreeMap;
use std::path::PathBuf;

use framecam_camera_engine::drift::{DriftCorrector, DriftPhase, DriftTick, MediaElement, SeekError};
use framecam_camera_engine::frame_layout::{active_item, source_time_ms};
use framecam_common::clock::FrameClock;
use framecam_common::config::FramecamConfig;

use super::Prepared;

struct SimulatedMedia {
    time_secs: f64,
    rate: f64,
    rate_error: f64,
    paused: bool,
    seek_latency_frames: u32,
    pending: Option<(f64, u32)>,
}

impl SimulatedMedia {
    fn new(start_secs: f64, rate_error: f64, seek_latency_frames: u32) -> Self {
        Self {
            time_secs: start_secs.max(0.0),
            rate: 1.0,
            rate_error,
            paused: true,
            seek_latency_frames,
            pending: None,
        }
    }

    /// Advance by one display frame. Returns `true` when a seek landed.
    fn step(&mut self, dt_secs: f64) -> bool {
        if let Some((target, remaining)) = self.pending {
            if remaining <= 1 {
                self.time_secs = target;
                self.pending = None;
                return true;
            }
            self.pending = Some((target, remaining - 1));
            return false;
        }
        if !self.paused {
            self.time_secs += dt_secs * self.rate * (1.0 + self.rate_error);
        }
        false
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time_secs(&self) -> f64 {
        self.time_secs
    }
    fn is_seeking(&self) -> bool {
        self.pending.is_some()
    }
    fn is_paused(&self) -> bool {
        self.paused
    }
    fn has_ended(&self) -> bool {
        false
    }
    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
    fn play(&mut self) {
        self.paused = false;
    }
    fn pause(&mut self) {
        self.paused = true;
    }
    fn seek(&mut self, secs: f64) -> Result<(), SeekError> {
        if !secs.is_finite() {
            return Err(SeekError::OutOfRange(secs));
        }
        self.pending = Some((secs, self.seek_latency_frames));
        Ok(())
    }
}

pub fn run(
    config: &FramecamConfig,
    path: PathBuf,
    lag_ms: f64,
    rate_error: f64,
    seek_latency_frames: u32,
    scrub_to: Option<u32>,
) -> anyhow::Result<()> {
    let prepared = Prepared::load(&path, config)?;
    let comp = &prepared.loaded.composition;
    let total = comp.total_frames();
    let clock = FrameClock::new(comp.fps)?;

    let expected_at = |frame: u32| {
        active_item(&prepared.layout, frame)
            .map(|item| (source_time_ms(item, frame, comp.fps), item.playback_rate))
    };

    let start_secs = expected_at(0).map_or(0.0, |(ms, _)| (ms - lag_ms) / 1000.0);
    let mut media = SimulatedMedia::new(start_secs, rate_error, seek_latency_frames);
    let mut corrector = DriftCorrector::new(config.drift)?;

    let mut phase_frames: BTreeMap<String, u32> = BTreeMap::new();
    let mut max_drift_secs: f64 = 0.0;
    let mut last_phase = corrector.phase();
    let mut frame = 0u32;
    let mut tick_index = 0u32;

    println!("Drift simulation: {}", comp.name);

    while frame < total {
        let now_ms = clock.frame_to_ms(tick_index);

        if media.step(clock.frame_duration_secs()) {
            if let Some(token) = corrector.state().pending_seek {
                corrector.on_seeked(token, now_ms, &mut media);
            }
        }

        if let Some(target) = scrub_to.filter(|_| tick_index == total / 2) {
            let target = target.min(total.saturating_sub(1));
            println!("  scrub: frame {frame} -> {target}");
            frame = target;
            if let Some((expected_ms, _)) = expected_at(frame) {
                corrector.user_seek(expected_ms, now_ms, &mut media);
            }
        }

        let (expected, nominal_rate) = match expected_at(frame) {
            Some((ms, rate)) => (Some(ms), rate),
            None => (None, 1.0),
        };
        let phase = corrector.update(
            &DriftTick {
                frame,
                expected_source_time_ms: expected,
                nominal_rate,
                is_playing: true,
                now_ms,
            },
            &mut media,
        );

        let drift = corrector.state().last_drift_secs;
        if phase != last_phase {
            println!(
                "  frame {frame:>5}: {last_phase:?} -> {phase:?} (drift {:+.1}ms)",
                drift * 1000.0
            );
            last_phase = phase;
        }
        if phase != DriftPhase::HardSeeking {
            max_drift_secs = max_drift_secs.max(drift.abs());
        }
        tracing::debug!(frame, ?phase, drift, rate = media.rate, "tick");
        *phase_frames.entry(format!("{phase:?}")).or_default() += 1;

        frame += 1;
        tick_index += 1;
    }

    println!();
    println!("  Frames: {tick_index}");
    println!("  Seeks issued: {}", corrector.state().seeks_issued);
    println!("  Max drift outside seeks: {:.1}ms", max_drift_secs * 1000.0);
    println!("  Final drift: {:.1}ms", corrector.state().last_drift_secs * 1000.0);
    println!("  Frames per phase:");
    for (phase, count) in &phase_frames {
        println!("    {phase:<12} {count}");
    }

    Ok(())
}
