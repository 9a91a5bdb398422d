mod app;
mod config;
mod game;
mod grid;
mod settings;
mod timer;
mod ui;

use app::App;
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::ColorLabel;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "color-hover")]
#[command(about = "Keep the pointer on the target color while the board grows")]
struct Args {
    /// Milliseconds between ticks (300-5000)
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Largest board side length (1-27)
    #[arg(long = "max-size")]
    max_size: Option<usize>,

    /// Seed for reproducible colors and targets
    #[arg(long)]
    seed: Option<u64>,

    /// Target color label (rgb, hex)
    #[arg(long)]
    label: Option<String>,

    /// Do not mark the hovered square
    #[arg(long = "no-hover-marker", default_value = "false")]
    no_hover_marker: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to the config file and exit
    #[arg(long = "save-config", default_value = "false")]
    save_config: bool,

    /// Write logs to this file (RUST_LOG controls the level, default info)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_label(s: &str) -> ColorLabel {
    match s.to_lowercase().as_str() {
        "hex" | "#" => ColorLabel::Hex,
        _ => ColorLabel::Rgb,
    }
}

/// The terminal owns stdout and stderr while the game runs, so logs only go
/// to a file
fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    // Config file first, command line on top
    let config_path = args.config.clone().or_else(AppConfig::default_path);
    let mut config = config_path
        .as_deref()
        .map(AppConfig::load_or_default)
        .unwrap_or_default();

    let settings = &mut config.settings;
    if let Some(ms) = args.tick_ms {
        settings.tick_interval_ms = ms;
    }
    if let Some(size) = args.max_size {
        settings.max_size = size;
    }
    if let Some(label) = &args.label {
        settings.color_label = parse_label(label);
    }
    if args.no_hover_marker {
        settings.show_hover_marker = false;
    }
    config.settings = config.settings.clamped();

    if args.save_config {
        let path = config_path.ok_or("Could not determine config directory")?;
        config.save_to_file(&path)?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Board area is measured once here and again only on resize
    let size = terminal.size()?;
    let frame_rect = ratatui::layout::Rect::new(0, 0, size.width, size.height);
    let mut app = App::new(config.settings, rng, frame_rect, config_path);
    info!("terminal {}x{}, seed {:?}", size.width, size.height, args.seed);

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Redraw often enough for the countdown bar
    const FRAME_DURATION: Duration = Duration::from_millis(33);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Wake up for the next tick even if no input arrives
        let timeout = app
            .controller
            .time_until_tick(Instant::now())
            .map_or(FRAME_DURATION, |left| left.min(FRAME_DURATION));

        // Drain everything queued so the tick sees the latest pointer position
        if event::poll(timeout)? {
            loop {
                if handle_event(app, event::read()?, Instant::now()) {
                    return Ok(());
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        app.tick(Instant::now());
    }
}

/// Apply one terminal event. Returns true when the player asked to quit.
fn handle_event(app: &mut App, event: Event, now: Instant) -> bool {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return false;
            }

            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return true;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => return true,
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle(now),
                KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                KeyCode::Esc => {
                    if app.show_help {
                        app.toggle_help();
                    }
                }
                KeyCode::Char('j') | KeyCode::Char('J') => {
                    if app.show_help {
                        app.scroll_help_down(ui::HELP_CONTENT_LINES);
                    }
                }
                KeyCode::Char('k') | KeyCode::Char('K') => {
                    if app.show_help {
                        app.scroll_help_up();
                    }
                }
                KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_tick_interval(100),
                KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_tick_interval(-100),
                KeyCode::Char(']') => app.adjust_max_size(1),
                KeyCode::Char('[') => app.adjust_max_size(-1),
                KeyCode::Char('l') | KeyCode::Char('L') => app.cycle_color_label(),
                KeyCode::Char('o') | KeyCode::Char('O') => app.toggle_hover_marker(),
                KeyCode::Char('w') | KeyCode::Char('W') => app.save_config(),
                _ => {}
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                app.pointer_moved(mouse.column, mouse.row)
            }
            MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row, now),
            _ => {}
        },
        Event::Resize(width, height) => app.resize(width, height),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, MouseEvent};
    use ratatui::layout::Rect;

    fn app() -> App {
        let screen = Rect::new(0, 0, 120, 40);
        App::new(Default::default(), StdRng::seed_from_u64(5), screen, None)
    }

    fn moved_to(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn moved_to_cell(app: &App, index: usize) -> Event {
        let size = app.controller.state().grid.size();
        let layout = ui::BoardLayout::new(app.screen.board, size).unwrap();
        let rect = layout.cell_rect(index);
        moved_to(rect.x + rect.width / 2, rect.y + rect.height / 2)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_queued_moves_settle_before_tick() {
        let mut app = app();
        let t0 = Instant::now();
        assert!(!handle_event(&mut app, key(KeyCode::Char(' ')), t0));
        let period = app.controller.settings().tick_interval();

        let first = moved_to_cell(&app, 0);
        handle_event(&mut app, first, t0);
        app.tick(t0 + period);
        assert_eq!(app.controller.state().size, 2);

        // Sweep across a wrong square and come to rest on the target
        let target = app.controller.state().target_index.unwrap();
        let wrong = (target + 1) % app.controller.state().grid.len();
        let burst = [moved_to_cell(&app, wrong), moved_to_cell(&app, target)];
        for event in burst {
            assert!(!handle_event(&mut app, event, t0 + period));
        }
        assert_eq!(app.controller.state().hovered_index, Some(target));

        app.tick(t0 + period * 2);
        assert!(app.controller.is_running());
        assert_eq!(app.controller.state().score, 2);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut app = app();
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char(' '),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert!(!handle_event(&mut app, release, Instant::now()));
        assert!(!app.controller.is_running());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        let now = Instant::now();
        assert!(handle_event(&mut app, key(KeyCode::Char('q')), now));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(handle_event(&mut app, ctrl_c, now));
        assert!(!handle_event(&mut app, key(KeyCode::Char('c')), now));
    }
}
