use crate::app::App;
use crate::game::Phase;
use crate::grid::Rgb;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

const SIDEBAR_WIDTH: u16 = 28;

/// Max scroll for the help overlay; the paragraphs wrap in short or narrow terminals
pub const HELP_CONTENT_LINES: u16 = 30;

const HELP_WIDTH: u16 = 56;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Black or white, whichever reads better on `background`
fn contrast_color(background: Rgb) -> Color {
    if background.luma() > 140 {
        Color::Black
    } else {
        Color::White
    }
}

/// Screen regions, measured from the terminal size and kept until the next
/// resize so hit-testing and drawing agree on where things are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenLayout {
    pub status: Rect,
    pub button: Rect,
    pub controls: Rect,
    /// Inner board area (inside the border)
    pub board: Rect,
}

impl ScreenLayout {
    pub fn measure(frame_area: Rect) -> Self {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(frame_area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(10), // Status
                Constraint::Length(3),  // Start/stop button
                Constraint::Min(4),     // Controls
            ])
            .split(columns[0]);

        let board_block = styled_block("");
        Self {
            status: sections[0],
            button: sections[1],
            controls: sections[2],
            board: board_block.inner(columns[1]),
        }
    }
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Placement of a `size` x `size` board inside a fixed area.
///
/// Terminal cells are roughly twice as tall as wide, so each square gets
/// twice as many columns as rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    origin_x: u16,
    origin_y: u16,
    cell_w: u16,
    cell_h: u16,
    gap_x: u16,
    gap_y: u16,
    size: usize,
}

impl BoardLayout {
    pub fn new(area: Rect, size: usize) -> Option<Self> {
        if size == 0 || area.width == 0 || area.height == 0 {
            return None;
        }
        let n = size as u16;
        let slot_w_max = (area.width / n).max(1);
        let slot_h_max = (area.height / n).max(1);
        let cell_h = slot_h_max.min(slot_w_max.div_ceil(2)).max(1);
        let cell_w = (cell_h * 2).min(slot_w_max).max(1);

        // Separate squares when there is room for it
        let gap_x = if cell_w >= 4 { 1 } else { 0 };
        let gap_y = if cell_h >= 3 { 1 } else { 0 };

        let board_w = cell_w.saturating_mul(n);
        let board_h = cell_h.saturating_mul(n);
        Some(Self {
            origin_x: area.x + area.width.saturating_sub(board_w) / 2,
            origin_y: area.y + area.height.saturating_sub(board_h) / 2,
            cell_w,
            cell_h,
            gap_x,
            gap_y,
            size,
        })
    }

    /// Drawn rectangle of a cell (gap excluded)
    pub fn cell_rect(&self, index: usize) -> Rect {
        let row = (index / self.size) as u16;
        let col = (index % self.size) as u16;
        Rect {
            x: self.origin_x + col * self.cell_w,
            y: self.origin_y + row * self.cell_h,
            width: self.cell_w - self.gap_x,
            height: self.cell_h - self.gap_y,
        }
    }

    /// Cell under a terminal position; gaps and the outside hit nothing
    pub fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        if column < self.origin_x || row < self.origin_y {
            return None;
        }
        let col = ((column - self.origin_x) / self.cell_w) as usize;
        let r = ((row - self.origin_y) / self.cell_h) as usize;
        if col >= self.size || r >= self.size {
            return None;
        }
        let index = r * self.size + col;
        if contains(self.cell_rect(index), column, row) {
            Some(index)
        } else {
            None
        }
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let screen = &app.screen;

    render_status_box(frame, screen.status, app);
    render_button(frame, screen.button, app);
    render_controls_box(frame, screen.controls, app);
    render_board(frame, screen.board, app);

    if app.show_help {
        render_help_overlay(frame, frame.area(), app);
    }
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Color Hover ");
    let state = app.controller.state();
    let settings = app.controller.settings();

    let (status_text, status_color) = match app.controller.phase() {
        Phase::Running => ("RUNNING", Color::Green),
        Phase::Stopped => ("STOPPED", HIGHLIGHT_COLOR),
    };

    let mut content = vec![
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(DIM_TEXT_COLOR)),
            Span::styled(
                state.score.to_string(),
                Style::default().fg(TEXT_COLOR).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  Best: {}", app.best_score),
                Style::default().fg(DIM_TEXT_COLOR),
            ),
        ]),
        Line::from(Span::styled(
            format!("Board: {0}x{0}", state.size),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled("Target color:", Style::default().fg(DIM_TEXT_COLOR))),
    ];

    match app.controller.target_color() {
        Some(color) => content.push(Line::from(Span::styled(
            format!(" {} ", settings.color_label.format(color)),
            Style::default().bg(to_color(color)).fg(contrast_color(color)),
        ))),
        None => content.push(Line::from(Span::styled("  -", Style::default().fg(DIM_TEXT_COLOR)))),
    }

    // Countdown to the next tick
    let bar_width = area.width.saturating_sub(4) as usize;
    let progress = match app.controller.time_until_tick(Instant::now()) {
        Some(left) => {
            let period = settings.tick_interval().as_secs_f32().max(f32::EPSILON);
            (left.as_secs_f32() / period).clamp(0.0, 1.0)
        }
        None => 0.0,
    };
    let filled = (progress * bar_width as f32) as usize;
    content.push(Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
        Span::styled(
            "░".repeat(bar_width.saturating_sub(filled)),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    if let Some(msg) = &app.message {
        content.push(Line::from(Span::styled(msg.as_str(), Style::default().fg(HIGHLIGHT_COLOR))));
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_button(frame: &mut Frame, area: Rect, app: &App) {
    let (label, color) = if app.controller.is_running() {
        ("Stop game", Color::Red)
    } else {
        ("Start game", Color::Green)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);
    let settings = app.controller.settings();

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "start/stop".to_string()),
        make_control("+/-", format!("tick: {}ms", settings.tick_interval_ms)),
        make_control("[/]", format!("max size: {}", settings.max_size)),
        make_control("L", format!("label: {}", settings.color_label.name())),
        make_control(
            "O",
            format!("marker: {}", if settings.show_hover_marker { "on" } else { "off" }),
        ),
        make_control("W", "save config".to_string()),
        make_control("H", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let outer = Rect {
        x: area.x.saturating_sub(1),
        y: area.y.saturating_sub(1),
        width: area.width + 2,
        height: area.height + 2,
    };
    frame.render_widget(styled_block(""), outer);

    let state = app.controller.state();
    let Some(layout) = BoardLayout::new(area, state.grid.size()) else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Press Space or click Start",
                Style::default().fg(DIM_TEXT_COLOR),
            )),
            Line::from(Span::styled(
                "Keep the pointer on the target color",
                Style::default().fg(DIM_TEXT_COLOR),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(hint, area);
        return;
    };

    let marker = app.controller.settings().show_hover_marker;
    for (i, cell) in state.grid.cells().iter().enumerate() {
        let rect = layout.cell_rect(i).intersection(area);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }
        let mut square = Paragraph::new("").style(Style::default().bg(to_color(cell.color)));
        if marker && state.hovered_index == Some(i) {
            let marker_row = rect.height.saturating_sub(1) / 2;
            let mut lines = vec![Line::from(""); marker_row as usize];
            lines.push(Line::from(Span::styled(
                "◆",
                Style::default().fg(contrast_color(cell.color)),
            )));
            square = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .style(Style::default().bg(to_color(cell.color)));
        }
        frame.render_widget(square, rect);
    }
}

fn help_content() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled("COLOR HOVER", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Keep the mouse pointer on the square whose color"),
        Line::from("matches the target. Every tick the board is checked."),
        Line::from("On the target, the board grows by one row and column"),
        Line::from("and gets new colors. Anywhere else, the game resets."),
        Line::from(""),
        Line::from(Span::styled("CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space/Enter or the button = start/stop."),
        Line::from("Stopping keeps your board and score."),
        Line::from(""),
        Line::from(Span::styled("SETTINGS (while stopped):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("+/-  tick interval"),
        Line::from("[/]  largest board"),
        Line::from("L    color label"),
        Line::from("O    hover marker"),
        Line::from("W    save to config file"),
        Line::from(""),
        Line::from("Q or Ctrl+C quits."),
    ]
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let help_width = HELP_WIDTH.min(area.width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(24);
    let help_area = Rect {
        x: area.x + area.width.saturating_sub(help_width) / 2,
        y: area.y + area.height.saturating_sub(help_height) / 2,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let content = help_content();

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
