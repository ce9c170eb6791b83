//! Runtime timeline: per-entity playback state of one independent animation.
//!
//! The cursor is local to the animation's frame range and accumulates
//! `fps * speed * dt`. State machine:
//!
//! - `Playing` -> `Playing` (wrap) at the end of a looping run without delay
//! - `Playing` -> `WaitingDelay` at the end of a looping run with delay > 0
//! - `Playing` -> `Locked` at the end of a non-looping run
//! - `WaitingDelay` -> `Playing` (cursor 0) once the delay has elapsed
//! - any -> `Stopped` on deactivation; `Stopped` -> `Playing` on reactivation,
//!   resuming from the frozen cursor (back to `WaitingDelay` with the delay
//!   already counted when it was stopped while waiting)

use serde::{Deserialize, Serialize};

use crate::binding::TrackBindings;
use crate::combo::AnimationCombo;
use crate::config::InterpolationMode;
use crate::data::{FrameRange, ReanimDocument, Track};
use crate::playback::IndependentAnimationConfig;
use crate::sampling::{sample_pose, ResolvedPose};

/// Playback state of a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineState {
    /// Cursor advances each tick
    Playing,
    /// Loop finished; counting down the delay before restarting
    WaitingDelay,
    /// Cursor pinned at the lock frame
    Locked,
    /// Inactive; pose frozen at the last cursor value
    Stopped,
}

impl TimelineState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::WaitingDelay => "waiting_delay",
            Self::Locked => "locked",
            Self::Stopped => "stopped",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Transition reported by [`RuntimeTimeline::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineEvent {
    /// Wrapped back to the start of the range.
    LoopCompleted,
    /// Reached the end of a looping run; waiting before the next one.
    DelayStarted,
    /// Delay finished; playing again from the start.
    DelayElapsed,
    /// Reached the end of a non-looping run and pinned at `frame` (document frame).
    Locked { frame: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeTimeline {
    animation: String,
    range: FrameRange,
    /// Frames per second after the speed multiplier.
    fps: f32,
    cursor: f32,
    delay_elapsed: f32,
    delay_duration: f32,
    looping: bool,
    lock_frame: u32,
    render_when_stopped: bool,
    state: TimelineState,
    /// Stopped mid-delay; reactivation continues the countdown.
    stopped_in_delay: bool,
    tracks: Vec<usize>,
}

impl RuntimeTimeline {
    /// Create a timeline for `config`, controlling the given document track indices.
    pub fn new(config: &IndependentAnimationConfig, document_fps: f32, tracks: Vec<usize>) -> Self {
        let state = if config.is_active {
            TimelineState::Playing
        } else {
            TimelineState::Stopped
        };
        Self {
            animation: config.name.clone(),
            range: config.frame_range,
            fps: document_fps * config.speed,
            cursor: 0.0,
            delay_elapsed: 0.0,
            delay_duration: config.delay_duration,
            looping: config.is_looping,
            lock_frame: config.lock_frame(),
            render_when_stopped: config.render_when_stopped,
            state,
            stopped_in_delay: false,
            tracks,
        }
    }

    /// Advance by `dt` seconds. Non-positive or non-finite `dt` is ignored.
    pub fn update(&mut self, dt: f32) -> Option<TimelineEvent> {
        if !(dt.is_finite() && dt > 0.0) {
            return None;
        }
        match self.state {
            TimelineState::Stopped | TimelineState::Locked => None,
            TimelineState::WaitingDelay => {
                self.delay_elapsed += dt;
                if self.delay_elapsed >= self.delay_duration {
                    self.delay_elapsed = 0.0;
                    self.cursor = 0.0;
                    self.state = TimelineState::Playing;
                    Some(TimelineEvent::DelayElapsed)
                } else {
                    None
                }
            }
            TimelineState::Playing => self.advance(dt),
        }
    }

    fn advance(&mut self, dt: f32) -> Option<TimelineEvent> {
        let len = self.range.len() as f32;
        let next = self.cursor + self.fps * dt;
        if next < len {
            self.cursor = next;
            return None;
        }

        if !self.looping {
            self.cursor = self.lock_frame as f32;
            self.state = TimelineState::Locked;
            return Some(TimelineEvent::Locked {
                frame: self.current_frame(),
            });
        }

        if self.delay_duration > 0.0 {
            self.cursor = len - 1.0;
            self.delay_elapsed = 0.0;
            self.state = TimelineState::WaitingDelay;
            return Some(TimelineEvent::DelayStarted);
        }

        // Any number of whole wraps in one step.
        let wrapped = next.rem_euclid(len);
        self.cursor = if wrapped < len { wrapped } else { 0.0 };
        Some(TimelineEvent::LoopCompleted)
    }

    /// Deactivate. Calling it again changes nothing.
    pub fn stop(&mut self) {
        if self.state != TimelineState::Stopped {
            self.stopped_in_delay = self.state == TimelineState::WaitingDelay;
            self.state = TimelineState::Stopped;
        }
    }

    /// `false` stops; `true` resumes a stopped timeline from its frozen cursor,
    /// or from the remaining delay when it was stopped while waiting.
    pub fn set_active(&mut self, active: bool) {
        if !active {
            self.stop();
        } else if self.state == TimelineState::Stopped {
            self.state = if self.stopped_in_delay {
                TimelineState::WaitingDelay
            } else {
                TimelineState::Playing
            };
            self.stopped_in_delay = false;
        }
    }

    /// Rewind to the range start and play.
    pub fn restart(&mut self) {
        self.cursor = 0.0;
        self.delay_elapsed = 0.0;
        self.stopped_in_delay = false;
        self.state = TimelineState::Playing;
    }

    #[inline]
    pub fn animation(&self) -> &str {
        &self.animation
    }

    #[inline]
    pub fn state(&self) -> TimelineState {
        self.state
    }

    /// Range-local fractional cursor.
    #[inline]
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    #[inline]
    pub fn range(&self) -> FrameRange {
        self.range
    }

    /// Current document frame (integer-truncated cursor).
    #[inline]
    pub fn current_frame(&self) -> u32 {
        self.range
            .start
            .saturating_add(self.cursor as u32)
            .min(self.range.end)
    }

    #[inline]
    pub fn delay_elapsed(&self) -> f32 {
        self.delay_elapsed
    }

    /// Whether this timeline's tracks are drawn at all.
    #[inline]
    pub fn renders(&self) -> bool {
        self.state != TimelineState::Stopped || self.render_when_stopped
    }

    /// Document indices of the controlled tracks.
    #[inline]
    pub fn tracks(&self) -> &[usize] {
        &self.tracks
    }

    #[inline]
    pub fn controls(&self, track: usize) -> bool {
        self.tracks.contains(&track)
    }

    /// Sample one track at the current cursor.
    #[inline]
    pub fn sample(&self, track: &Track, mode: InterpolationMode) -> ResolvedPose {
        sample_pose(track, self.range, self.cursor, mode)
    }

    /// Resolved pose of every controlled track, in document order.
    pub fn current_pose(
        &self,
        document: &ReanimDocument,
        mode: InterpolationMode,
    ) -> Vec<(usize, ResolvedPose)> {
        self.tracks
            .iter()
            .filter_map(|&i| document.tracks().get(i).map(|t| (i, self.sample(t, mode))))
            .collect()
    }
}

/// One timeline per animation of `combo`, in declaration order.
pub fn spawn_timelines(
    document: &ReanimDocument,
    combo: &AnimationCombo,
    bindings: &TrackBindings,
) -> Vec<RuntimeTimeline> {
    combo
        .animation_configs
        .iter()
        .map(|cfg| {
            RuntimeTimeline::new(
                cfg,
                document.fps(),
                bindings.track_indices(document, &cfg.name),
            )
        })
        .collect()
}
