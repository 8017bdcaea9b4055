//! Config - Race flow timing and scene names
//!
//! All durations are in seconds.

use serde::{Deserialize, Serialize};

use crate::race_flow::error::SetupError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RaceFlowConfig {
    /// Time after the race ends before the fade starts counting
    pub end_scene_load_delay: f32,
    /// Extra time added to the scene load deadline
    pub delay_before_fade_to_black: f32,
    /// Delay of the win cue and of both the win and lose messages
    pub delay_before_win_message: f32,
    pub win_scene_name: String,
    pub lose_scene_name: String,
    /// Scene loaded after leaving an online race
    pub multiplayer_menu_scene: String,
    /// Online races skip the fade and return to the menu on completion
    pub is_multiplayer: bool,
    /// Countdown length before karts are released
    pub countdown_duration: f32,
    /// Pause between the objective list appearing and the first reveal
    pub objective_reveal_delay: f32,
    /// Pause between consecutive objective reveals
    pub objective_reveal_interval: f32,
}

impl Default for RaceFlowConfig {
    fn default() -> Self {
        Self {
            end_scene_load_delay: 3.0,
            delay_before_fade_to_black: 4.0,
            delay_before_win_message: 2.0,
            win_scene_name: "WinScene".into(),
            lose_scene_name: "LoseScene".into(),
            multiplayer_menu_scene: "Main Menu".into(),
            is_multiplayer: false,
            countdown_duration: 3.0,
            objective_reveal_delay: 0.2,
            objective_reveal_interval: 1.0,
        }
    }
}

impl RaceFlowConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check delays and scene names
    pub fn validate(&self) -> Result<(), SetupError> {
        let delays = [
            ("delayBeforeFadeToBlack", self.delay_before_fade_to_black),
            ("delayBeforeWinMessage", self.delay_before_win_message),
            ("countdownDuration", self.countdown_duration),
            ("objectiveRevealDelay", self.objective_reveal_delay),
            ("objectiveRevealInterval", self.objective_reveal_interval),
        ];
        for (name, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(SetupError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        // The fade ratio divides by this.
        if !self.end_scene_load_delay.is_finite() || self.end_scene_load_delay <= 0.0 {
            return Err(SetupError::InvalidConfig(format!(
                "endSceneLoadDelay must be positive, got {}",
                self.end_scene_load_delay
            )));
        }

        let scenes = [
            ("winSceneName", &self.win_scene_name),
            ("loseSceneName", &self.lose_scene_name),
            ("multiplayerMenuScene", &self.multiplayer_menu_scene),
        ];
        for (name, scene) in scenes {
            if scene.trim().is_empty() {
                return Err(SetupError::InvalidConfig(format!("{name} is empty")));
            }
        }

        Ok(())
    }

    /// Seconds from the end of the race to the scene change
    pub fn transition_delay(&self) -> f32 {
        self.end_scene_load_delay + self.delay_before_fade_to_black
    }
}
