use crate::grid::{self, Cell, Grid, Rgb};
use crate::settings::GameSettings;
use crate::timer::{IntervalTimer, TimerHandle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::{Duration, Instant};

/// Whether the tick loop is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Running,
}

/// Everything the renderer needs to paint a frame
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub grid: Grid,
    /// Board side length; 1 before the first grid exists
    pub size: usize,
    /// Always a valid index into `grid` when set
    pub target_index: Option<usize>,
    pub score: u32,
    pub running: bool,
    /// Only ever set while running
    pub hovered_index: Option<usize>,
}

impl GameState {
    fn initial() -> Self {
        Self {
            grid: Grid::empty(),
            size: 1,
            target_index: None,
            score: 0,
            running: false,
            hovered_index: None,
        }
    }

    pub fn target_cell(&self) -> Option<&Cell> {
        self.target_index.and_then(|i| self.grid.get(i))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Pointer was on the target; the board was regenerated.
    /// `saturated` is set when the board was already at its largest size.
    Hit {
        score: u32,
        size: usize,
        saturated: bool,
    },
    /// Pointer was elsewhere (or nowhere); the game was reset
    Miss { final_score: u32, size: usize },
}

/// Owns the game state and drives the Stopped/Running state machine.
///
/// Colors and targets come from `rng`, so a seeded generator gives a fully
/// reproducible game.
pub struct GameController<R: Rng = StdRng> {
    state: GameState,
    settings: GameSettings,
    timer: IntervalTimer,
    live_timer: Option<TimerHandle>,
    grid_generation: u64,
    rng: R,
}

impl<R: Rng> GameController<R> {
    pub fn new(settings: GameSettings, rng: R) -> Self {
        let settings = settings.clamped();
        Self {
            timer: IntervalTimer::new(settings.tick_interval()),
            state: GameState::initial(),
            settings,
            live_timer: None,
            grid_generation: 0,
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        if self.state.running {
            Phase::Running
        } else {
            Phase::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn target_color(&self) -> Option<Rgb> {
        self.state.target_cell().map(|c| c.color)
    }

    /// Time left until the next tick, `None` while stopped
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.timer.time_until_due(now)
    }

    /// Replace the tunables. Refused while running.
    pub fn apply_settings(&mut self, settings: GameSettings) -> bool {
        if self.state.running {
            return false;
        }
        self.settings = settings.clamped();
        self.timer.set_period(self.settings.tick_interval());

        let max = self.settings.max_size;
        if self.state.size > max {
            self.state.size = max;
            if !self.state.grid.is_empty() {
                self.replace_grid(max);
            }
        }
        true
    }

    /// Stopped -> Running. Creates the first board if there is none.
    pub fn start(&mut self, now: Instant) {
        if self.state.running {
            return;
        }
        if self.state.grid.is_empty() {
            self.replace_grid(self.state.size);
        }
        debug_assert!(!self.timer.is_armed());
        self.state.running = true;
        self.live_timer = Some(self.timer.arm(now));
        info!(
            "game started: size {}, score {}, tick every {}ms",
            self.state.size, self.state.score, self.settings.tick_interval_ms
        );
    }

    /// Running -> Stopped, keeping the board and score
    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }
        self.halt();
        info!("game paused at size {} with score {}", self.state.size, self.state.score);
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.state.running {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Pointer entered a cell (or `None` for no cell).
    /// Ignored while stopped; indices off the board count as no cell.
    pub fn on_hover(&mut self, index: Option<usize>) {
        if !self.state.running {
            return;
        }
        self.state.hovered_index = index.filter(|&i| i < self.state.grid.len());
    }

    /// Pointer left `index`. Only clears the hover if it still points there, so
    /// an enter on the next cell that arrived first is not lost.
    pub fn on_leave(&mut self, index: usize) {
        if self.state.hovered_index == Some(index) {
            self.state.hovered_index = None;
        }
    }

    /// Poll the timer and tick if it fired
    pub fn advance(&mut self, now: Instant) -> Option<TickOutcome> {
        if !self.state.running {
            return None;
        }
        let fired = self.timer.poll(now)?;
        if self.live_timer != Some(fired) {
            debug!("ignoring stale timer generation {}", fired.generation());
            return None;
        }
        self.tick()
    }

    /// Evaluate hover against target once. `None` while stopped.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.state.running {
            return None;
        }

        let hit = self.state.hovered_index.is_some()
            && self.state.hovered_index == self.state.target_index;

        if hit {
            let old_size = self.state.size;
            let new_size = (old_size + 1).min(self.settings.max_size);
            self.state.score += 1;
            self.replace_grid(new_size);
            debug!("hit: score {}, size {} -> {}", self.state.score, old_size, new_size);
            Some(TickOutcome::Hit {
                score: self.state.score,
                size: new_size,
                saturated: new_size == old_size,
            })
        } else {
            let final_score = self.state.score;
            let size = self.state.size;
            self.halt();
            self.state = GameState::initial();
            info!("miss: game over with score {} at size {}", final_score, size);
            Some(TickOutcome::Miss { final_score, size })
        }
    }

    fn halt(&mut self) {
        debug_assert_eq!(self.timer.handle(), self.live_timer);
        self.timer.cancel();
        self.live_timer = None;
        self.state.running = false;
        self.state.hovered_index = None;
    }

    /// New board at `size` with a fresh target
    fn replace_grid(&mut self, size: usize) {
        self.grid_generation += 1;
        self.state.grid = grid::generate(size, self.grid_generation, &mut self.rng);
        self.state.size = size;
        self.state.target_index = None;
        self.ensure_target();
    }

    /// Keep `target_index` pointing inside the grid
    fn ensure_target(&mut self) {
        if self.state.grid.is_empty() {
            self.state.target_index = None;
            return;
        }
        let valid = matches!(self.state.target_index, Some(i) if i < self.state.grid.len());
        if !valid {
            self.state.target_index = Some(grid::pick_target(&self.state.grid, &mut self.rng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MAX_SIZE;
    use rand::SeedableRng;

    const PERIOD: Duration = Duration::from_millis(1300);

    fn controller(seed: u64) -> GameController<StdRng> {
        GameController::new(GameSettings::default(), StdRng::seed_from_u64(seed))
    }

    fn hover_target(c: &mut GameController<StdRng>) {
        let target = c.state().target_index;
        c.on_hover(target);
    }

    fn assert_invariants(c: &GameController<StdRng>) {
        let s = c.state();
        if let Some(t) = s.target_index {
            assert!(t < s.grid.len(), "target {} out of {}", t, s.grid.len());
        }
        if !s.running {
            assert_eq!(s.hovered_index, None, "hover kept while stopped");
        }
        assert!(s.size >= 1 && s.size <= MAX_SIZE);
        assert!(s.grid.is_empty() || s.grid.len() == s.size * s.size);
    }

    #[test]
    fn test_fresh_controller_is_stopped_and_empty() {
        let c = controller(0);
        let s = c.state();
        assert_eq!(c.phase(), Phase::Stopped);
        assert_eq!(s.size, 1);
        assert!(s.grid.is_empty());
        assert_eq!(s.score, 0);
        assert_eq!(s.target_index, None);
        assert_eq!(c.target_color(), None);
    }

    #[test]
    fn test_start_creates_single_cell_board() {
        let mut c = controller(1);
        c.start(Instant::now());

        let s = c.state();
        assert!(s.running);
        assert_eq!(s.grid.len(), 1);
        assert_eq!(s.target_index, Some(0));
        assert_eq!(c.target_color(), Some(s.grid.cells()[0].color));
    }

    #[test]
    fn test_hit_grows_board() {
        let mut c = controller(2);
        c.start(Instant::now());
        hover_target(&mut c);

        let outcome = c.tick();
        assert_eq!(
            outcome,
            Some(TickOutcome::Hit {
                score: 1,
                size: 2,
                saturated: false
            })
        );
        let s = c.state();
        assert!(s.running);
        assert_eq!(s.size, 2);
        assert_eq!(s.grid.len(), 4);
        assert!(s.target_index.is_some_and(|t| t < 4));
    }

    #[test]
    fn test_no_hover_resets_game() {
        let mut c = controller(3);
        c.start(Instant::now());
        hover_target(&mut c);
        c.tick();
        c.on_hover(None);

        let outcome = c.tick();
        assert_eq!(outcome, Some(TickOutcome::Miss { final_score: 1, size: 2 }));
        let s = c.state();
        assert!(!s.running);
        assert_eq!(s.size, 1);
        assert_eq!(s.score, 0);
        assert!(s.grid.is_empty());
        assert_eq!(s.target_index, None);
        assert!(c.time_until_tick(Instant::now()).is_none());
    }

    #[test]
    fn test_hovering_wrong_cell_is_a_miss() {
        let mut c = controller(4);
        c.start(Instant::now());
        hover_target(&mut c);
        c.tick();

        let target = c.state().target_index.unwrap();
        let wrong = (target + 1) % c.state().grid.len();
        c.on_hover(Some(wrong));
        assert!(matches!(c.tick(), Some(TickOutcome::Miss { .. })));
        assert!(!c.is_running());
    }

    #[test]
    fn test_ceiling_keeps_regenerating() {
        let mut c = controller(5);
        c.start(Instant::now());
        for _ in 1..MAX_SIZE {
            hover_target(&mut c);
            assert!(matches!(c.tick(), Some(TickOutcome::Hit { saturated: false, .. })));
        }
        assert_eq!(c.state().size, MAX_SIZE);

        let before = c.state().grid.cells()[0].id;
        hover_target(&mut c);
        let outcome = c.tick();
        assert_eq!(
            outcome,
            Some(TickOutcome::Hit {
                score: MAX_SIZE as u32,
                size: MAX_SIZE,
                saturated: true
            })
        );
        let s = c.state();
        assert!(s.running);
        assert_eq!(s.size, MAX_SIZE);
        assert_eq!(s.grid.len(), MAX_SIZE * MAX_SIZE);
        assert_ne!(s.grid.cells()[0].id, before, "board was not regenerated");
    }

    #[test]
    fn test_lower_max_size_saturates_earlier() {
        let settings = GameSettings {
            max_size: 2,
            ..Default::default()
        };
        let mut c = GameController::new(settings, StdRng::seed_from_u64(6));
        c.start(Instant::now());
        for _ in 0..3 {
            hover_target(&mut c);
            c.tick();
        }
        assert_eq!(c.state().size, 2);
        assert_eq!(c.state().score, 3);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut c = controller(7);
        c.stop();
        assert_eq!(c.state(), &GameState::initial());

        c.start(Instant::now());
        c.stop();
        let snapshot = c.state().clone();
        c.stop();
        assert_eq!(c.state(), &snapshot);
    }

    #[test]
    fn test_manual_stop_keeps_progress() {
        let mut c = controller(8);
        let t0 = Instant::now();
        c.start(t0);
        hover_target(&mut c);
        c.tick();
        hover_target(&mut c);
        c.stop();

        let s = c.state();
        assert!(!s.running);
        assert_eq!(s.hovered_index, None);
        assert_eq!(s.score, 1);
        assert_eq!(s.size, 2);
        assert_eq!(s.grid.len(), 4);

        // Resuming reuses the same board
        let board = s.grid.clone();
        c.start(t0 + PERIOD);
        assert_eq!(c.state().grid, board);
    }

    #[test]
    fn test_hover_ignored_while_stopped() {
        let mut c = controller(9);
        c.on_hover(Some(0));
        assert_eq!(c.state().hovered_index, None);
    }

    #[test]
    fn test_out_of_range_hover_is_none() {
        let mut c = controller(10);
        c.start(Instant::now());
        c.on_hover(Some(0));
        c.on_hover(Some(17));
        assert_eq!(c.state().hovered_index, None);
        assert!(matches!(c.tick(), Some(TickOutcome::Miss { .. })));
    }

    #[test]
    fn test_late_leave_does_not_clobber_new_hover() {
        let mut c = controller(11);
        c.start(Instant::now());
        hover_target(&mut c);
        c.tick();

        // enter(2) delivered before leave(1)
        c.on_hover(Some(1));
        c.on_hover(Some(2));
        c.on_leave(1);
        assert_eq!(c.state().hovered_index, Some(2));

        c.on_leave(2);
        assert_eq!(c.state().hovered_index, None);
    }

    #[test]
    fn test_advance_ticks_on_schedule() {
        let mut c = controller(12);
        let t0 = Instant::now();
        c.start(t0);
        hover_target(&mut c);

        assert_eq!(c.advance(t0 + PERIOD - Duration::from_millis(1)), None);
        assert!(matches!(c.advance(t0 + PERIOD), Some(TickOutcome::Hit { .. })));
        assert_eq!(c.advance(t0 + PERIOD), None);
    }

    #[test]
    fn test_double_toggle_leaves_one_timer() {
        let mut c = controller(13);
        let t0 = Instant::now();
        c.start(t0);

        let t1 = t0 + Duration::from_millis(500);
        c.toggle(t1);
        c.toggle(t1);
        assert!(c.is_running());
        assert_eq!(c.time_until_tick(t1), Some(PERIOD));

        // The schedule from the first start is gone
        hover_target(&mut c);
        assert_eq!(c.advance(t0 + PERIOD), None);

        for k in 1..=3 {
            let due = t1 + PERIOD * k;
            hover_target(&mut c);
            assert!(c.advance(due - Duration::from_millis(1)).is_none());
            assert!(matches!(c.advance(due), Some(TickOutcome::Hit { .. })));
            assert!(c.advance(due).is_none(), "second fire in period {}", k);
        }
    }

    #[test]
    fn test_double_toggle_from_stopped() {
        let mut c = controller(14);
        let t0 = Instant::now();
        c.toggle(t0);
        c.toggle(t0);
        assert!(!c.is_running());
        assert_eq!(c.advance(t0 + PERIOD * 4), None);
        assert!(c.time_until_tick(t0).is_none());
    }

    #[test]
    fn test_tick_while_stopped_does_nothing() {
        let mut c = controller(15);
        assert_eq!(c.tick(), None);
        assert_eq!(c.state(), &GameState::initial());
    }

    #[test]
    fn test_apply_settings_refused_while_running() {
        let mut c = controller(16);
        c.start(Instant::now());
        let faster = GameSettings {
            tick_interval_ms: 500,
            ..Default::default()
        };
        assert!(!c.apply_settings(faster.clone()));
        c.stop();
        assert!(c.apply_settings(faster));

        let t = Instant::now();
        c.start(t);
        assert_eq!(c.time_until_tick(t), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_shrinking_max_size_regenerates_paused_board() {
        let mut c = controller(17);
        c.start(Instant::now());
        for _ in 0..3 {
            hover_target(&mut c);
            c.tick();
        }
        c.stop();
        assert_eq!(c.state().size, 4);

        c.apply_settings(GameSettings {
            max_size: 2,
            ..Default::default()
        });
        let s = c.state();
        assert_eq!(s.size, 2);
        assert_eq!(s.grid.len(), 4);
        assert!(s.target_index.is_some_and(|t| t < 4));
    }

    #[test]
    fn test_invariants_hold_over_random_play() {
        let mut driver = StdRng::seed_from_u64(99);
        let mut c = controller(18);
        let mut now = Instant::now();

        for _ in 0..2000 {
            match driver.gen_range(0..7) {
                0 => c.toggle(now),
                1 => c.stop(),
                2 => c.start(now),
                3 => hover_target(&mut c),
                4 => c.on_hover(Some(driver.gen_range(0..40))),
                5 => c.on_leave(driver.gen_range(0..40)),
                _ => {
                    now += Duration::from_millis(driver.gen_range(0..2000));
                    let score_before = c.state().score;
                    match c.advance(now) {
                        Some(TickOutcome::Hit { score, .. }) => assert_eq!(score, score_before + 1),
                        Some(TickOutcome::Miss { .. }) => assert_eq!(c.state().score, 0),
                        None => assert_eq!(c.state().score, score_before),
                    }
                }
            }
            assert_invariants(&c);
        }
    }
}
