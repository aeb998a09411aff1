//! Frame layout: which clip is on screen at a given composition frame.
//!
//! Clips are quantized to half-open frame ranges `[start_frame, end_frame)`
//! and chained into groups when they continue the same recording at the
//! same rate. A group is one continuous playback unit: the presentation
//! layer keeps a single media element alive across it.

use framecam_common::error::{FramecamError, FramecamResult};
use framecam_project_model::clip::Clip;
use framecam_project_model::geometry::Size;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A clip placed on the frame grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLayoutItem {
    pub clip_id: String,
    /// Id of the first clip in this item's group.
    pub group_id: String,
    pub recording_id: String,
    pub start_frame: u32,
    /// Exclusive.
    pub end_frame: u32,
    pub group_start_frame: u32,
    /// Source position at `group_start_frame` (ms).
    pub group_start_source_in_ms: f64,
    /// Frames spanned by the whole group.
    pub group_duration_frames: u32,
    pub playback_rate: f64,
    pub source_in_ms: f64,
    pub source_size: Size,
}

impl FrameLayoutItem {
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start_frame && frame < self.end_frame
    }

    pub fn len_frames(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

/// The active item and its timeline neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Neighbors<'a> {
    pub prev: Option<&'a FrameLayoutItem>,
    pub active: Option<&'a FrameLayoutItem>,
    pub next: Option<&'a FrameLayoutItem>,
}

/// Transition flags for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundaryState {
    /// Keep the previous item's last frame visible underneath.
    pub should_hold_prev_frame: bool,
    /// The active item is within its outgoing overlap window.
    pub is_near_boundary_end: bool,
    pub overlap_frames: u32,
}

/// Quantize and group `clips` at `fps`.
///
/// The result is ordered by start frame. Clips that round to zero frames
/// are dropped.
pub fn resolve_layout(clips: &[Clip], fps: f64) -> FramecamResult<Vec<FrameLayoutItem>> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(FramecamError::config(format!(
            "layout fps must be positive, got {fps}"
        )));
    }

    let mut sorted: Vec<&Clip> = clips.iter().collect();
    sorted.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms).then_with(|| a.id.cmp(&b.id)));

    let frame_ms = 1000.0 / fps;
    let mut items: Vec<FrameLayoutItem> = Vec::with_capacity(sorted.len());
    let mut prev_source_out_ms = 0.0;

    for clip in sorted {
        let start_frame = ms_to_frame(clip.start_ms, fps);
        let end_frame = ms_to_frame(clip.end_ms(), fps);
        if end_frame <= start_frame {
            debug!(clip = %clip.id, "clip rounds to zero frames, dropped");
            continue;
        }

        let continues = items.last().filter(|prev| {
            prev.recording_id == clip.recording_id
                && (prev.playback_rate - clip.playback_rate).abs() < 1e-9
                && prev.end_frame == start_frame
                && (clip.source_in_ms - prev_source_out_ms).abs() <= frame_ms * clip.playback_rate
        });

        let (group_id, group_start_frame, group_start_source_in_ms) = match continues {
            Some(prev) => (
                prev.group_id.clone(),
                prev.group_start_frame,
                prev.group_start_source_in_ms,
            ),
            None => (clip.id.clone(), start_frame, clip.source_in_ms),
        };

        items.push(FrameLayoutItem {
            clip_id: clip.id.clone(),
            group_id,
            recording_id: clip.recording_id.clone(),
            start_frame,
            end_frame,
            group_start_frame,
            group_start_source_in_ms,
            group_duration_frames: 0,
            playback_rate: clip.playback_rate,
            source_in_ms: clip.source_in_ms,
            source_size: clip.source_size(),
        });
        prev_source_out_ms = clip.source_out_ms();
    }

    fill_group_durations(&mut items);
    Ok(items)
}

fn ms_to_frame(ms: f64, fps: f64) -> u32 {
    (ms * fps / 1000.0).round().max(0.0) as u32
}

// Group members are consecutive in `items`, so one backwards sweep is enough.
fn fill_group_durations(items: &mut [FrameLayoutItem]) {
    let mut group_end = 0;
    for i in (0..items.len()).rev() {
        let last_in_group = items
            .get(i + 1)
            .map_or(true, |next| next.group_id != items[i].group_id);
        if last_in_group {
            group_end = items[i].end_frame;
        }
        items[i].group_duration_frames = group_end.saturating_sub(items[i].group_start_frame);
    }
}

fn active_index(layout: &[FrameLayoutItem], frame: u32) -> Option<usize> {
    layout
        .iter()
        .enumerate()
        .filter(|(_, item)| item.contains(frame))
        .max_by_key(|(_, item)| item.start_frame)
        .map(|(i, _)| i)
}

/// The item shown at `frame`. Overlaps resolve to the later start.
pub fn active_item(layout: &[FrameLayoutItem], frame: u32) -> Option<&FrameLayoutItem> {
    active_index(layout, frame).map(|i| &layout[i])
}

/// Active item plus the items just before and after it.
///
/// In a gap, `prev` is the last item ending at or before `frame` and `next`
/// the first item starting after it.
pub fn adjacent_items(layout: &[FrameLayoutItem], frame: u32) -> Neighbors<'_> {
    match active_index(layout, frame) {
        Some(i) => Neighbors {
            prev: i.checked_sub(1).map(|p| &layout[p]),
            active: Some(&layout[i]),
            next: layout.get(i + 1),
        },
        None => Neighbors {
            prev: layout.iter().rev().find(|item| item.end_frame <= frame),
            active: None,
            next: layout.iter().find(|item| item.start_frame > frame),
        },
    }
}

/// Crossfade flags for `frame`.
///
/// `source_dims` is the decoded size of the active item's media, `None`
/// when not reported yet. A reported but invalid size (0x0) means the
/// decoder has no picture, so the previous item is held.
pub fn boundary_state(
    layout: &[FrameLayoutItem],
    frame: u32,
    fps: f64,
    source_dims: Option<Size>,
    crossfade_ms: f64,
) -> BoundaryState {
    let neighbors = adjacent_items(layout, frame);
    let Some(active) = neighbors.active else {
        return BoundaryState::default();
    };

    let crossfade_frames = if fps.is_finite() && fps > 0.0 && crossfade_ms > 0.0 {
        (crossfade_ms * fps / 1000.0).round() as u32
    } else {
        0
    };

    let incoming = neighbors
        .prev
        .filter(|prev| prev.end_frame >= active.start_frame)
        .map(|prev| prev.end_frame - active.start_frame);
    let outgoing = neighbors
        .next
        .filter(|next| next.start_frame <= active.end_frame)
        .map(|next| active.end_frame - next.start_frame);

    let overlap_frames = if incoming.is_some() || outgoing.is_some() {
        let intersection = incoming.unwrap_or(0).max(outgoing.unwrap_or(0));
        intersection.max(crossfade_frames).min(active.len_frames())
    } else {
        0
    };

    let undecoded = neighbors.prev.is_some() && source_dims.is_some_and(|d| !d.is_valid());

    BoundaryState {
        should_hold_prev_frame: undecoded
            || (incoming.is_some() && frame < active.start_frame + overlap_frames),
        is_near_boundary_end: outgoing.is_some()
            && frame + overlap_frames >= active.end_frame,
        overlap_frames,
    }
}

/// Source media time (ms) shown at `frame` for `item`.
///
/// Measured from the group start so the mapping is continuous across the
/// clips of a group.
pub fn source_time_ms(item: &FrameLayoutItem, frame: u32, fps: f64) -> f64 {
    let elapsed_frames = frame as f64 - item.group_start_frame as f64;
    item.group_start_source_in_ms + elapsed_frames / fps * 1000.0 * item.playback_rate
}
