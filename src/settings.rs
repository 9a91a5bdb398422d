use crate::grid::{Rgb, MAX_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the target color is written out in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorLabel {
    /// `rgb(r, g, b)`
    #[default]
    Rgb,
    /// `#rrggbb`
    Hex,
}

impl ColorLabel {
    pub fn name(&self) -> &str {
        match self {
            ColorLabel::Rgb => "RGB",
            ColorLabel::Hex => "Hex",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorLabel::Rgb => ColorLabel::Hex,
            ColorLabel::Hex => ColorLabel::Rgb,
        }
    }

    pub fn format(&self, color: Rgb) -> String {
        match self {
            ColorLabel::Rgb => color.to_string(),
            ColorLabel::Hex => color.hex(),
        }
    }
}

pub const MIN_TICK_MS: u64 = 300;
pub const MAX_TICK_MS: u64 = 5000;

/// Game tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Time between ticks in milliseconds (300-5000)
    pub tick_interval_ms: u64,
    /// Board side length at which growth stops (1-27)
    pub max_size: usize,
    /// Target color label format
    pub color_label: ColorLabel,
    /// Mark the hovered cell on the board
    pub show_hover_marker: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1300,
            max_size: MAX_SIZE,
            color_label: ColorLabel::default(),
            show_hover_marker: true,
        }
    }
}

impl GameSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Pull every field back into its valid range
    pub fn clamped(mut self) -> Self {
        self.tick_interval_ms = self.tick_interval_ms.clamp(MIN_TICK_MS, MAX_TICK_MS);
        self.max_size = self.max_size.clamp(1, MAX_SIZE);
        self
    }

    /// Adjust tick interval within bounds
    pub fn adjust_tick_interval(&mut self, delta_ms: i64) {
        let new_val = (self.tick_interval_ms as i64 + delta_ms)
            .clamp(MIN_TICK_MS as i64, MAX_TICK_MS as i64);
        self.tick_interval_ms = new_val as u64;
    }

    /// Adjust max board size within bounds
    pub fn adjust_max_size(&mut self, delta: i32) {
        self.max_size = (self.max_size as i32 + delta).clamp(1, MAX_SIZE as i32) as usize;
    }

    pub fn cycle_color_label(&mut self) {
        self.color_label = self.color_label.next();
    }

    pub fn toggle_hover_marker(&mut self) {
        self.show_hover_marker = !self.show_hover_marker;
    }
}
