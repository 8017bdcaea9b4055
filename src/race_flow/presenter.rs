//! Presenter - Everything the race flow asks the outside world to do
//!
//! UI widgets, audio, scene loading, cursor capture and session teardown all
//! sit behind [`FlowPresenter`]. [`EventLog`] records the requests as
//! [`FlowEvent`]s so a frontend can replay them.

use serde::{Deserialize, Serialize};

/// Race result as seen by the end-of-race presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
}

pub trait FlowPresenter {
    /// Start the countdown cinematic. Fire-and-forget.
    fn play_countdown(&mut self);

    /// Show the message of objective `index`
    fn reveal_objective(&mut self, index: usize, message: &str);

    /// Show the win or lose message after `delay` seconds, or hide it
    fn set_end_message(&mut self, outcome: Outcome, visible: bool, delay: f32);

    /// Play the victory cue `delay` seconds from now
    fn schedule_victory_cue(&mut self, delay: f32);

    fn set_fade_overlay_active(&mut self, active: bool);

    /// Fade overlay opacity in `[0, 1]`
    fn set_fade_opacity(&mut self, opacity: f32);

    /// Global audio volume in `[0, 1]`
    fn set_master_volume(&mut self, volume: f32);

    fn set_rank_label(&mut self, label: &str);

    /// Steering wheel HUD rotation in degrees
    fn set_wheel_rotation(&mut self, degrees: f32);

    /// Give cursor and input capture back to the UI
    fn release_cursor(&mut self);

    fn load_scene(&mut self, name: &str);

    /// Leave the online session before returning to the menu
    fn disconnect_session(&mut self);
}

/// A single presentation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowEvent {
    CountdownStarted,
    ObjectiveRevealed { index: usize, message: String },
    EndMessage { outcome: Outcome, visible: bool, delay: f32 },
    VictoryCueScheduled { delay: f32 },
    FadeOverlay { active: bool },
    FadeOpacity { opacity: f32 },
    MasterVolume { volume: f32 },
    RankLabel { label: String },
    CursorReleased,
    SceneLoad { name: String },
    SessionDisconnected,
}

/// Presenter that records requests instead of performing them.
///
/// Per-frame values (opacity, volume, wheel rotation) are kept as current
/// levels rather than logged every frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<FlowEvent>,
    fade_opacity: f32,
    master_volume: f32,
    wheel_rotation: f32,
    rank_label: Option<String>,
}

impl EventLog {
    /// Create an empty log at full volume
    pub fn new() -> Self {
        Self {
            master_volume: 1.0,
            ..Self::default()
        }
    }

    /// Get all recorded events
    pub fn events(&self) -> &[FlowEvent] {
        &self.events
    }

    /// Take the events recorded since the last drain
    pub fn drain(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Last overlay opacity
    pub fn fade_opacity(&self) -> f32 {
        self.fade_opacity
    }

    /// Last master volume
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Last wheel rotation in degrees
    pub fn wheel_rotation(&self) -> f32 {
        self.wheel_rotation
    }

    /// Last rank label shown
    pub fn rank_label(&self) -> Option<&str> {
        self.rank_label.as_deref()
    }

    /// Scene loads requested so far
    pub fn scene_loads(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FlowEvent::SceneLoad { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FlowPresenter for EventLog {
    fn play_countdown(&mut self) {
        self.events.push(FlowEvent::CountdownStarted);
    }

    fn reveal_objective(&mut self, index: usize, message: &str) {
        self.events.push(FlowEvent::ObjectiveRevealed {
            index,
            message: message.to_owned(),
        });
    }

    fn set_end_message(&mut self, outcome: Outcome, visible: bool, delay: f32) {
        self.events.push(FlowEvent::EndMessage {
            outcome,
            visible,
            delay,
        });
    }

    fn schedule_victory_cue(&mut self, delay: f32) {
        self.events.push(FlowEvent::VictoryCueScheduled { delay });
    }

    fn set_fade_overlay_active(&mut self, active: bool) {
        self.events.push(FlowEvent::FadeOverlay { active });
    }

    fn set_fade_opacity(&mut self, opacity: f32) {
        self.fade_opacity = opacity;
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    fn set_rank_label(&mut self, label: &str) {
        if self.rank_label.as_deref() != Some(label) {
            self.rank_label = Some(label.to_owned());
            self.events.push(FlowEvent::RankLabel {
                label: label.to_owned(),
            });
        }
    }

    fn set_wheel_rotation(&mut self, degrees: f32) {
        self.wheel_rotation = degrees;
    }

    fn release_cursor(&mut self) {
        self.events.push(FlowEvent::CursorReleased);
    }

    fn load_scene(&mut self, name: &str) {
        self.events.push(FlowEvent::SceneLoad {
            name: name.to_owned(),
        });
    }

    fn disconnect_session(&mut self) {
        self.events.push(FlowEvent::SessionDisconnected);
    }
}
