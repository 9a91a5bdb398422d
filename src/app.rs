use crate::config::AppConfig;
use crate::game::{GameController, TickOutcome};
use crate::settings::GameSettings;
use crate::ui::{self, BoardLayout, ScreenLayout};
use log::{info, warn};
use rand::rngs::StdRng;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::Instant;

/// Main application state: the game plus everything that only matters to the
/// terminal front end
pub struct App {
    pub controller: GameController<StdRng>,
    pub screen: ScreenLayout,
    /// Last known pointer position in terminal cells
    pub pointer: Option<(u16, u16)>,
    /// Board cell under the pointer, as last reported to the controller
    pub pointer_cell: Option<usize>,
    pub show_help: bool,
    pub help_scroll: u16,
    /// One-line status message (last miss, config saved, ...)
    pub message: Option<String>,
    /// Highest score reached since launch
    pub best_score: u32,
    pub config_path: Option<PathBuf>,
}

impl App {
    pub fn new(
        settings: GameSettings,
        rng: StdRng,
        frame_area: Rect,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            controller: GameController::new(settings, rng),
            screen: ScreenLayout::measure(frame_area),
            pointer: None,
            pointer_cell: None,
            show_help: false,
            help_scroll: 0,
            message: None,
            best_score: 0,
            config_path,
        }
    }

    fn board_layout(&self) -> Option<BoardLayout> {
        BoardLayout::new(self.screen.board, self.controller.state().grid.size())
    }

    fn cell_under_pointer(&self) -> Option<usize> {
        let (column, row) = self.pointer?;
        self.board_layout()?.cell_at(column, row)
    }

    /// Re-hit-test after the board changed under a still pointer, reporting the
    /// cell now under it as freshly entered
    fn refresh_pointer_cell(&mut self) {
        self.pointer_cell = self.cell_under_pointer();
        self.controller.on_hover(self.pointer_cell);
    }

    /// Start or stop the game
    pub fn toggle(&mut self, now: Instant) {
        self.controller.toggle(now);
        if self.controller.is_running() {
            self.message = None;
            self.refresh_pointer_cell();
        }
    }

    /// Run the game clock
    pub fn tick(&mut self, now: Instant) {
        match self.controller.advance(now) {
            Some(TickOutcome::Hit {
                score,
                size,
                saturated,
            }) => {
                self.best_score = self.best_score.max(score);
                self.message =
                    saturated.then(|| format!("{0}x{0} is the largest board: reshuffled", size));
                self.refresh_pointer_cell();
            }
            Some(TickOutcome::Miss { final_score, size }) => {
                self.message = Some(format!(
                    "Missed at {0}x{0}! Final score: {1}",
                    size, final_score
                ));
                self.pointer_cell = None;
            }
            None => {}
        }
    }

    /// Pointer moved to a terminal position
    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        self.pointer = Some((column, row));
        let cell = self.cell_under_pointer();
        if cell == self.pointer_cell {
            return;
        }
        if let Some(old) = self.pointer_cell {
            self.controller.on_leave(old);
        }
        if cell.is_some() {
            self.controller.on_hover(cell);
        }
        self.pointer_cell = cell;
    }

    /// Left click; only the start/stop button reacts
    pub fn click(&mut self, column: u16, row: u16, now: Instant) {
        self.pointer_moved(column, row);
        if ui::contains(self.screen.button, column, row) {
            self.toggle(now);
        }
    }

    /// Re-measure the screen after a terminal resize
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = ScreenLayout::measure(Rect::new(0, 0, width, height));
        if let Some((column, row)) = self.pointer {
            self.pointer_moved(column, row);
        }
    }

    /// Apply a settings change; refused while the game runs
    fn update_settings(&mut self, change: impl FnOnce(&mut GameSettings)) {
        let mut settings = self.controller.settings().clone();
        change(&mut settings);
        if !self.controller.apply_settings(settings) {
            self.message = Some("Stop the game to change settings".to_string());
        }
    }

    pub fn adjust_tick_interval(&mut self, delta_ms: i64) {
        self.update_settings(|s| s.adjust_tick_interval(delta_ms));
    }

    pub fn adjust_max_size(&mut self, delta: i32) {
        self.update_settings(|s| s.adjust_max_size(delta));
    }

    pub fn cycle_color_label(&mut self) {
        self.update_settings(|s| s.cycle_color_label());
    }

    pub fn toggle_hover_marker(&mut self) {
        self.update_settings(|s| s.toggle_hover_marker());
    }

    /// Write the current settings to the config file
    pub fn save_config(&mut self) {
        let Some(path) = self.config_path.clone() else {
            self.message = Some("No config directory available".to_string());
            return;
        };
        let config = AppConfig {
            settings: self.controller.settings().clone(),
            ..Default::default()
        };
        match config.save_to_file(&path) {
            Ok(()) => {
                info!("saved config to {}", path.display());
                self.message = Some("Config saved".to_string());
            }
            Err(e) => {
                warn!("{}", e);
                self.message = Some(e);
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }
}
