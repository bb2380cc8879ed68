#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Color channel engine resolving time-animated channel colors.
//!
//! Channels start from the colors declared in the level header. Color
//! triggers placed along the level blend a channel towards a target color
//! over a duration measured in seconds; the [`SpeedProfile`] converts trigger
//! positions into time. Every trigger blends from the color its channel held
//! the moment it fired, so resolving a color requires replaying the chain of
//! earlier triggers on the same channel. [`ColorChannelEngine::load_colors`]
//! performs that replay once and caches the activation colors.

mod speed;
mod table;

use std::collections::HashMap;

use level_scene_core::{ChannelId, Rgba};
use log::warn;

pub use speed::{SpeedPortal, SpeedProfile};
pub use table::ColorTable;

/// Color blend placed along the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTrigger {
    /// Horizontal position at which the blend starts.
    pub x: f32,
    /// Channel blended by the trigger.
    pub channel: ChannelId,
    /// Color reached once the blend completes.
    pub target: Rgba,
    /// Blend duration in seconds; zero or negative completes instantly.
    pub duration_seconds: f32,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledTrigger {
    trigger: ColorTrigger,
    start_seconds: f32,
    activation: Rgba,
}

impl ScheduledTrigger {
    fn color_at(&self, seconds: f32) -> Rgba {
        self.activation.lerp(self.trigger.target, self.progress(seconds))
    }

    fn progress(&self, seconds: f32) -> f32 {
        if self.trigger.duration_seconds <= 0.0 {
            return 1.0;
        }
        ((seconds - self.start_seconds) / self.trigger.duration_seconds).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Default)]
struct Timeline {
    triggers: Vec<ScheduledTrigger>,
    resolved: bool,
}

/// Resolves channel colors at any horizontal position of a level.
#[derive(Clone, Debug)]
pub struct ColorChannelEngine {
    base: ColorTable,
    profile: SpeedProfile,
    timelines: HashMap<ChannelId, Timeline>,
}

impl ColorChannelEngine {
    /// Creates an engine over the header colors and the level's speed profile.
    #[must_use]
    pub fn new(base: ColorTable, profile: SpeedProfile) -> Self {
        Self {
            base,
            profile,
            timelines: HashMap::new(),
        }
    }

    /// Schedules a trigger, keeping each channel's triggers ordered by position.
    ///
    /// Triggers sharing a position keep their insertion order. Triggers
    /// aimed at the black or grid fade channels are ignored.
    pub fn add_trigger(&mut self, trigger: ColorTrigger) {
        if trigger.channel.is_locked() {
            warn!(
                "ignoring color trigger at x={} aimed at reserved channel {}",
                trigger.x, trigger.channel
            );
            return;
        }
        if !trigger.x.is_finite() {
            warn!(
                "ignoring color trigger on channel {} at non-finite position",
                trigger.channel
            );
            return;
        }

        let scheduled = ScheduledTrigger {
            trigger,
            start_seconds: self.profile.elapsed_seconds(trigger.x),
            activation: self.base.get(trigger.channel),
        };
        let timeline = self.timelines.entry(trigger.channel).or_default();
        let position = timeline
            .triggers
            .partition_point(|existing| existing.trigger.x <= trigger.x);
        timeline.triggers.insert(position, scheduled);
        timeline.resolved = false;
    }

    /// Replays every channel's trigger chain and caches activation colors.
    pub fn load_colors(&mut self) {
        for (channel, timeline) in &mut self.timelines {
            if timeline.resolved {
                continue;
            }
            let activations = replay(self.base.get(*channel), &timeline.triggers);
            for (scheduled, activation) in timeline.triggers.iter_mut().zip(activations) {
                scheduled.activation = activation;
            }
            timeline.resolved = true;
        }
    }

    /// Color held by `channel` once the level has scrolled to `x`.
    #[must_use]
    pub fn channel_color_at(&self, channel: ChannelId, x: f32) -> Rgba {
        let static_color = self.base.get(channel);
        let Some(timeline) = self.timelines.get(&channel) else {
            return static_color;
        };

        let active = timeline
            .triggers
            .partition_point(|scheduled| scheduled.trigger.x <= x);
        if active == 0 {
            return static_color;
        }

        let seconds = self.profile.elapsed_seconds(x);
        if timeline.resolved {
            timeline.triggers[active - 1].color_at(seconds)
        } else {
            let activations = replay(static_color, &timeline.triggers[..active]);
            let mut current = timeline.triggers[active - 1];
            current.activation = activations[active - 1];
            current.color_at(seconds)
        }
    }

    /// Full color table as seen at position `x`.
    #[must_use]
    pub fn snapshot_at(&self, x: f32) -> ColorTable {
        let mut table = self.base.clone();
        for channel in self.timelines.keys() {
            table.set(*channel, self.channel_color_at(*channel, x));
        }
        table
    }

    /// Colors declared by the level header.
    #[must_use]
    pub fn base_colors(&self) -> &ColorTable {
        &self.base
    }

    /// Speed profile used to convert positions into time.
    #[must_use]
    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }

    /// Number of scheduled triggers across all channels.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.timelines
            .values()
            .map(|timeline| timeline.triggers.len())
            .sum()
    }
}

/// Computes the color each trigger blends from, in order.
fn replay(static_color: Rgba, triggers: &[ScheduledTrigger]) -> Vec<Rgba> {
    let mut activations = Vec::with_capacity(triggers.len());
    let mut previous: Option<ScheduledTrigger> = None;
    for scheduled in triggers {
        let activation = match previous {
            Some(prior) => prior.color_at(scheduled.start_seconds),
            None => static_color,
        };
        activations.push(activation);
        previous = Some(ScheduledTrigger {
            activation,
            ..*scheduled
        });
    }
    activations
}
