use std::{
    collections::VecDeque,
    fs::{self, File},
    io::{self, Stdout},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lifepad_core::{
    Generation, InputSymbol, KeyOutcome, RenderEffect, Session, SessionEvent, ToolState,
};
use lifepad_shapes::{Circle, Point};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline},
};
use serde::Serialize;
use supports_color::{ColorLevel, Stream, on_cached};
use tracing::info;

use crate::renderer::{Renderer, RendererContext};

const EVENT_LOG_CAPACITY: usize = 16;
const SIDEBAR_WIDTH: u16 = 34;
const HISTORY_SPARK_WINDOW: usize = 32;
const DEFAULT_HEADLESS_FRAMES: usize = 12;
const MAX_HEADLESS_FRAMES: usize = 360;

#[derive(Default)]
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn run(&self, ctx: RendererContext) -> Result<()> {
        if std::env::var_os("LIFEPAD_TERMINAL_HEADLESS").is_some() {
            let report = self.run_headless(ctx)?;
            info!(
                target = "lifepad::terminal",
                frames = report.summary.frame_count,
                generations = report.summary.generations_simulated,
                final_alive = report.summary.final_alive,
                total_born = report.summary.total_born,
                total_died = report.summary.total_died,
                "Terminal headless run completed"
            );
            return Ok(());
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to build terminal backend")?;
        terminal.hide_cursor().ok();

        let result = run_event_loop(&mut terminal, ctx);

        terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }

        result
    }
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ctx: RendererContext,
) -> Result<()> {
    let mut app = TerminalApp::new(ctx.session);

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        // One blocking read per iteration; the whole outcome is applied
        // before the next symbol is consumed.
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key)
        {
            break;
        }
    }

    Ok(())
}

impl TerminalRenderer {
    fn run_headless(&self, ctx: RendererContext) -> Result<HeadlessReport> {
        let backend = ratatui::backend::TestBackend::new(80, 36);
        let mut terminal = Terminal::new(backend).context("failed to build test backend")?;
        let mut app = TerminalApp::new(ctx.session);
        seed_demo_rings(&mut app.session);
        app.canvas.sweep(&app.session);

        let mut report = HeadlessReport::new(FrameStats::from_session(&app.session));
        for _ in 0..self.headless_frame_budget() {
            let outcome = app.session.handle(InputSymbol::Step);
            app.apply_outcome(&outcome);
            report.record(FrameStats::from_session(&app.session));
            terminal.draw(|frame| app.draw(frame))?;
        }
        report.finalize();

        if let Some(path) = report_file_path_from_env() {
            report.write_json(&path).with_context(|| {
                format!("failed to write headless report to {}", path.display())
            })?;
        }

        Ok(report)
    }

    fn headless_frame_budget(&self) -> usize {
        std::env::var("LIFEPAD_TERMINAL_HEADLESS_FRAMES")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .map(|value| value.min(MAX_HEADLESS_FRAMES))
            .unwrap_or(DEFAULT_HEADLESS_FRAMES)
    }
}

/// Seed the canvas with two concentric rings centred on the grid, sized so
/// the outer ring fits whichever dimension is tighter under the 2:1 cell
/// aspect. Gives a fresh session nontrivial structure to evolve.
fn seed_demo_rings(session: &mut Session) {
    let height = session.config().height as i32;
    let width = session.config().width as i32;
    let radius = (if 2 * height > width { width / 2 } else { height }) / 2;
    let centre = Point::new(height / 2, width / 2);
    session.commit_circle(Circle { centre, radius });
    session.commit_circle(Circle {
        centre,
        radius: radius / 2,
    });
}

struct TerminalApp {
    session: Session,
    canvas: CanvasView,
    palette: Palette,
    event_log: VecDeque<EventEntry>,
}

impl TerminalApp {
    fn new(session: Session) -> Self {
        let palette = Palette::detect();
        let mut canvas = CanvasView::new(session.config().width, session.config().height);
        canvas.sweep(&session);
        Self {
            session,
            canvas,
            palette,
            event_log: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Feed one key event through the session; returns whether to exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        let Some(symbol) = map_key(key.code) else {
            return false;
        };
        let outcome = self.session.handle(symbol);
        self.apply_outcome(&outcome);
        outcome.exit
    }

    fn apply_outcome(&mut self, outcome: &KeyOutcome) {
        for effect in &outcome.effects {
            match effect {
                RenderEffect::Cells(points) => self.canvas.patch(&self.session, points),
                RenderEffect::Guide(points) => self.canvas.overlay_guide(points),
                RenderEffect::Everything => self.canvas.sweep(&self.session),
                // The sidebar is rebuilt from session state on the next
                // frame; there is no glyph buffer to patch for it.
                RenderEffect::StatsPanel => {}
            }
        }
        for &event in &outcome.events {
            self.push_event(event);
        }
    }

    fn push_event(&mut self, event: SessionEvent) {
        let (kind, message) = describe_event(event);
        if self.event_log.len() >= EVENT_LOG_CAPACITY {
            self.event_log.pop_front();
        }
        self.event_log.push_back(EventEntry {
            generation: self.session.generation(),
            kind,
            message,
        });
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(frame.area());

        self.draw_header(frame, outer[0]);

        if self.session.editor().stats {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
                .split(outer[1]);
            self.draw_canvas(frame, body[0]);

            let sidebar = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(8),
                    Constraint::Length(4),
                    Constraint::Length(11),
                    Constraint::Min(0),
                ])
                .split(body[1]);
            self.draw_stats(frame, sidebar[0]);
            self.draw_trend(frame, sidebar[1]);
            self.draw_keys(frame, sidebar[2]);
            self.draw_events(frame, sidebar[3]);
        } else {
            self.draw_canvas(frame, outer[1]);
        }
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let editor = self.session.editor();
        let last = self.session.history().back();
        let status = format!(
            "Gen {:>5}  Alive {:>5}  Δ+{:>3}/Δ-{:>3}  Cursor {:>3},{:<3}  Slot {}",
            self.session.generation().0,
            self.session.live().alive_count(),
            last.map_or(0, |summary| summary.born),
            last.map_or(0, |summary| summary.died),
            editor.cursor.y,
            editor.cursor.x,
            self.session.buffers().next_slot(),
        );

        let mut line = Line::from(vec![Span::styled(status, self.palette.header_style())]);
        line.spans.push(Span::raw("  "));
        line.spans.push(match editor.tool {
            ToolState::Idle => Span::styled(" EDIT ", self.palette.idle_badge_style()),
            tool => Span::styled(
                format!(" {} ", tool.label().to_uppercase()),
                self.palette.drag_badge_style(),
            ),
        });
        if editor.trace {
            line.spans.push(Span::raw(" "));
            line.spans
                .push(Span::styled(" TRACE ", self.palette.trace_badge_style()));
        }
        line.spans.push(Span::raw("  "));
        line.spans.push(Span::styled(
            "? stats  q quit",
            self.palette.accent_style(),
        ));

        let paragraph = Paragraph::new(line).block(
            Block::default()
                .title(self.palette.title("Lifepad"))
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_canvas(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = format!(
            "Canvas {}×{}",
            self.session.live().width(),
            self.session.live().height()
        );
        let block = Block::default()
            .title(self.palette.title(title))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // The grid keeps its startup dimensions; a sidebar simply narrows
        // the viewport and cells beyond it go unpainted.
        let cursor = self.session.editor().cursor;
        let rows = (inner.height as usize).min(self.canvas.height);
        let cols = (inner.width as usize).min(self.canvas.width);

        let mut lines = Vec::with_capacity(rows);
        for y in 0..rows {
            let mut spans = Vec::with_capacity(cols);
            for x in 0..cols {
                let (glyph, mut style) = self.palette.cell(self.canvas.kind_at(y, x));
                if cursor.y == y as i32 && cursor.x == x as i32 {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(glyph.to_string(), style));
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(Text::from(lines)), inner);
    }

    fn draw_stats(&self, frame: &mut Frame<'_>, area: Rect) {
        let editor = self.session.editor();
        let last = self.session.history().back();
        let mut lines = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("Generation ", self.palette.header_style()),
            Span::raw(format!("{:>6}", self.session.generation().0)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Alive      ", self.palette.header_style()),
            Span::raw(format!("{:>6}", self.session.live().alive_count())),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Last tick  ", self.palette.header_style()),
            Span::raw(last.map_or_else(
                || String::from("waiting"),
                |summary| format!("+{} / -{}", summary.born, summary.died),
            )),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Cursor     ", self.palette.header_style()),
            Span::raw(format!("{},{}", editor.cursor.y, editor.cursor.x)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Tool       ", self.palette.header_style()),
            Span::raw(editor.tool.label()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Trace      ", self.palette.header_style()),
            Span::raw(if editor.trace { "on" } else { "off" }),
            Span::raw("   "),
            Span::styled("Slot ", self.palette.accent_style()),
            Span::raw(format!("{}", self.session.buffers().next_slot())),
        ]));

        let paragraph = Paragraph::new(Text::from(lines)).block(
            Block::default()
                .title(self.palette.title("Session"))
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_trend(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(self.palette.title("Population"))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let mut data: Vec<u64> = self
            .session
            .history()
            .iter()
            .rev()
            .take(HISTORY_SPARK_WINDOW)
            .map(|summary| summary.alive as u64)
            .collect();
        data.reverse();

        if data.is_empty() {
            frame.render_widget(Paragraph::new("No generations yet"), inner);
            return;
        }
        let spark = Sparkline::default()
            .style(self.palette.spark_style())
            .data(&data);
        frame.render_widget(spark, inner);
    }

    fn draw_keys(&self, frame: &mut Frame<'_>, area: Rect) {
        let lines = vec![
            Line::raw(" ↑↓←→  move cursor"),
            Line::raw(" space toggle cell"),
            Line::raw(" enter step generation"),
            Line::raw(" l / o line / circle tool"),
            Line::raw(" t     trace pen"),
            Line::raw(" s     save snapshot"),
            Line::raw(" 0-9   load snapshot"),
            Line::raw(" c     clear canvas"),
            Line::raw(" q     cancel / quit"),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title(self.palette.title("Keys"))
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_events(&self, frame: &mut Frame<'_>, area: Rect) {
        let events: Vec<ListItem> = self
            .event_log
            .iter()
            .rev()
            .map(|entry| {
                let style = self.palette.event_style(entry.kind);
                let text = format!("[g{:>4}] {}", entry.generation.0, entry.message);
                ListItem::new(Span::styled(text, style))
            })
            .collect();
        let block = Block::default()
            .title(self.palette.title("Recent Events"))
            .borders(Borders::ALL);
        frame.render_widget(List::new(events).block(block), area);
    }
}

fn map_key(code: KeyCode) -> Option<InputSymbol> {
    match code {
        KeyCode::Up => Some(InputSymbol::CursorUp),
        KeyCode::Down => Some(InputSymbol::CursorDown),
        KeyCode::Left => Some(InputSymbol::CursorLeft),
        KeyCode::Right => Some(InputSymbol::CursorRight),
        KeyCode::Char(' ') => Some(InputSymbol::ToggleCell),
        KeyCode::Enter => Some(InputSymbol::Step),
        KeyCode::Char('t') => Some(InputSymbol::ToggleTrace),
        KeyCode::Char('s') => Some(InputSymbol::Save),
        KeyCode::Char('l') => Some(InputSymbol::LineTool),
        KeyCode::Char('o') => Some(InputSymbol::CircleTool),
        KeyCode::Char('c') => Some(InputSymbol::Clear),
        KeyCode::Char('q') => Some(InputSymbol::Quit),
        KeyCode::Char('?') => Some(InputSymbol::ToggleStats),
        KeyCode::Char(digit @ '0'..='9') => Some(InputSymbol::LoadSlot(digit as u8 - b'0')),
        _ => None,
    }
}

fn describe_event(event: SessionEvent) -> (EventKind, String) {
    match event {
        SessionEvent::Saved { slot } => (EventKind::Buffer, format!("Saved to slot {slot}")),
        SessionEvent::Loaded { slot } => (EventKind::Buffer, format!("Loaded slot {slot}")),
        SessionEvent::Cleared => (EventKind::Canvas, String::from("Canvas cleared")),
        SessionEvent::LineCommitted { cells } => {
            (EventKind::Canvas, format!("Line committed ({cells} cells)"))
        }
        SessionEvent::CircleCommitted { radius } => (
            EventKind::Canvas,
            format!("Circle committed (radius {radius})"),
        ),
        SessionEvent::DragCancelled => (EventKind::Info, String::from("Drag cancelled")),
        SessionEvent::TraceEnabled => (EventKind::Info, String::from("Trace pen on")),
        SessionEvent::TraceDisabled => (EventKind::Info, String::from("Trace pen off")),
        SessionEvent::Generation(summary) => (
            EventKind::Tick,
            format!(
                "Gen {}: {} alive (+{} / -{})",
                summary.generation.0, summary.alive, summary.born, summary.died
            ),
        ),
    }
}

/// Persistent glyph model of the canvas, patched cell-by-cell by render
/// effects rather than rebuilt from the grid every frame.
struct CanvasView {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Dead,
    Alive,
    Guide,
}

impl CanvasView {
    fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            width,
            height,
            cells: vec![CellKind::Dead; width * height],
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        if point.y < 0 || point.x < 0 {
            return None;
        }
        let (y, x) = (point.y as usize, point.x as usize);
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Rebuild every glyph from authoritative grid state.
    fn sweep(&mut self, session: &Session) {
        for (cell, &alive) in self.cells.iter_mut().zip(session.live().cells()) {
            *cell = if alive { CellKind::Alive } else { CellKind::Dead };
        }
    }

    /// Repaint exactly `points` from authoritative grid state.
    fn patch(&mut self, session: &Session, points: &[Point]) {
        for &point in points {
            if let Some(idx) = self.index(point) {
                self.cells[idx] = if session.live().get(point) {
                    CellKind::Alive
                } else {
                    CellKind::Dead
                };
            }
        }
    }

    /// Overlay the preview-guide marker; display-only.
    fn overlay_guide(&mut self, points: &[Point]) {
        for &point in points {
            if let Some(idx) = self.index(point) {
                self.cells[idx] = CellKind::Guide;
            }
        }
    }

    fn kind_at(&self, y: usize, x: usize) -> CellKind {
        self.cells
            .get(y * self.width + x)
            .copied()
            .unwrap_or(CellKind::Dead)
    }
}

#[derive(Clone, Debug)]
struct EventEntry {
    generation: Generation,
    kind: EventKind,
    message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventKind {
    Tick,
    Buffer,
    Canvas,
    Info,
}

struct Palette {
    level: Option<ColorLevel>,
}

impl Palette {
    fn detect() -> Self {
        Self {
            level: on_cached(Stream::Stdout),
        }
    }

    fn has_color(&self) -> bool {
        self.level.is_some()
    }

    fn header_style(&self) -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    fn accent_style(&self) -> Style {
        Style::default().fg(Color::LightMagenta)
    }

    fn title<T: Into<String>>(&self, title: T) -> Span<'static> {
        Span::styled(title.into(), self.header_style())
    }

    fn idle_badge_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    fn drag_badge_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    fn trace_badge_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    fn cell(&self, kind: CellKind) -> (char, Style) {
        let rich_color = self
            .level
            .is_some_and(|level| level.has_16m || level.has_256);
        match kind {
            CellKind::Dead => (' ', Style::default()),
            CellKind::Alive => {
                if self.has_color() {
                    let fg = if rich_color {
                        Color::Rgb(120, 220, 120)
                    } else {
                        Color::LightGreen
                    };
                    ('█', Style::default().fg(fg))
                } else {
                    ('#', Style::default())
                }
            }
            CellKind::Guide => {
                let style = Style::default().add_modifier(Modifier::BOLD);
                if self.has_color() {
                    ('+', style.fg(Color::Yellow))
                } else {
                    ('+', style)
                }
            }
        }
    }

    fn event_style(&self, kind: EventKind) -> Style {
        let color = match kind {
            EventKind::Tick => Color::Cyan,
            EventKind::Buffer => Color::Green,
            EventKind::Canvas => Color::Yellow,
            EventKind::Info => Color::Gray,
        };
        Style::default().fg(color)
    }

    fn spark_style(&self) -> Style {
        Style::default().fg(Color::Green)
    }
}

#[derive(Debug, Clone, Serialize)]
struct HeadlessReport {
    initial: FrameStats,
    frames: Vec<FrameStats>,
    summary: ReportSummary,
}

impl HeadlessReport {
    fn new(initial: FrameStats) -> Self {
        Self {
            initial,
            frames: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    fn record(&mut self, stats: FrameStats) {
        self.frames.push(stats);
    }

    fn finalize(&mut self) {
        self.summary = ReportSummary::from(&self.initial, &self.frames);
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).context("failed to serialize headless report")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct FrameStats {
    generation: u64,
    alive: usize,
    born: usize,
    died: usize,
}

impl FrameStats {
    fn from_session(session: &Session) -> Self {
        let (born, died) = session
            .history()
            .back()
            .filter(|summary| summary.generation == session.generation())
            .map_or((0, 0), |summary| (summary.born, summary.died));
        Self {
            generation: session.generation().0,
            alive: session.live().alive_count(),
            born,
            died,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct ReportSummary {
    frame_count: usize,
    generations_simulated: u64,
    final_generation: u64,
    final_alive: usize,
    total_born: usize,
    total_died: usize,
    alive_min: usize,
    alive_max: usize,
    alive_mean: f32,
}

impl ReportSummary {
    fn from(initial: &FrameStats, frames: &[FrameStats]) -> Self {
        let Some(final_stats) = frames.last() else {
            return Self {
                frame_count: 0,
                generations_simulated: 0,
                final_generation: initial.generation,
                final_alive: initial.alive,
                total_born: 0,
                total_died: 0,
                alive_min: initial.alive,
                alive_max: initial.alive,
                alive_mean: initial.alive as f32,
            };
        };

        let frame_count = frames.len();
        let total_born = frames.iter().map(|frame| frame.born).sum();
        let total_died = frames.iter().map(|frame| frame.died).sum();

        let mut alive_min = usize::MAX;
        let mut alive_max = 0;
        let mut alive_sum = 0usize;
        for frame in frames {
            alive_min = alive_min.min(frame.alive);
            alive_max = alive_max.max(frame.alive);
            alive_sum += frame.alive;
        }

        Self {
            frame_count,
            generations_simulated: final_stats.generation.saturating_sub(initial.generation),
            final_generation: final_stats.generation,
            final_alive: final_stats.alive,
            total_born,
            total_died,
            alive_min,
            alive_max,
            alive_mean: alive_sum as f32 / frame_count as f32,
        }
    }
}

fn report_file_path_from_env() -> Option<PathBuf> {
    std::env::var_os("LIFEPAD_TERMINAL_HEADLESS_REPORT").and_then(|raw| {
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifepad_core::SandboxConfig;

    fn app(width: u32, height: u32) -> TerminalApp {
        let session = Session::new(SandboxConfig {
            width,
            height,
            ..SandboxConfig::default()
        })
        .expect("session");
        TerminalApp::new(session)
    }

    #[test]
    fn map_key_covers_the_editing_alphabet() {
        assert_eq!(map_key(KeyCode::Up), Some(InputSymbol::CursorUp));
        assert_eq!(map_key(KeyCode::Down), Some(InputSymbol::CursorDown));
        assert_eq!(map_key(KeyCode::Left), Some(InputSymbol::CursorLeft));
        assert_eq!(map_key(KeyCode::Right), Some(InputSymbol::CursorRight));
        assert_eq!(map_key(KeyCode::Char(' ')), Some(InputSymbol::ToggleCell));
        assert_eq!(map_key(KeyCode::Enter), Some(InputSymbol::Step));
        assert_eq!(map_key(KeyCode::Char('t')), Some(InputSymbol::ToggleTrace));
        assert_eq!(map_key(KeyCode::Char('s')), Some(InputSymbol::Save));
        assert_eq!(map_key(KeyCode::Char('l')), Some(InputSymbol::LineTool));
        assert_eq!(map_key(KeyCode::Char('o')), Some(InputSymbol::CircleTool));
        assert_eq!(map_key(KeyCode::Char('c')), Some(InputSymbol::Clear));
        assert_eq!(map_key(KeyCode::Char('q')), Some(InputSymbol::Quit));
        assert_eq!(map_key(KeyCode::Char('?')), Some(InputSymbol::ToggleStats));
        assert_eq!(map_key(KeyCode::Char('7')), Some(InputSymbol::LoadSlot(7)));
        assert_eq!(map_key(KeyCode::Char('z')), None);
        assert_eq!(map_key(KeyCode::Esc), None);
    }

    #[test]
    fn canvas_patches_track_grid_state() {
        let mut app = app(8, 6);
        let outcome = app.session.handle(InputSymbol::ToggleCell);
        app.apply_outcome(&outcome);
        assert_eq!(app.canvas.kind_at(0, 0), CellKind::Alive);

        let outcome = app.session.handle(InputSymbol::ToggleCell);
        app.apply_outcome(&outcome);
        assert_eq!(app.canvas.kind_at(0, 0), CellKind::Dead);
    }

    #[test]
    fn guide_overlays_and_erases_without_residue() {
        let mut app = app(10, 6);
        let start = app.session.handle(InputSymbol::LineTool);
        app.apply_outcome(&start);
        let moved = app.session.handle(InputSymbol::CursorRight);
        app.apply_outcome(&moved);
        assert_eq!(app.canvas.kind_at(0, 0), CellKind::Guide);
        assert_eq!(app.canvas.kind_at(0, 1), CellKind::Guide);

        let cancelled = app.session.handle(InputSymbol::Quit);
        app.apply_outcome(&cancelled);
        assert_eq!(app.canvas.kind_at(0, 0), CellKind::Dead);
        assert_eq!(app.canvas.kind_at(0, 1), CellKind::Dead);
    }

    #[test]
    fn full_sweep_after_a_generation_tick() {
        let mut app = app(10, 10);
        // Vertical blinker around the cursor column.
        for point in [Point::new(4, 5), Point::new(5, 5), Point::new(6, 5)] {
            app.session.set_cell(point, true);
        }
        app.canvas.sweep(&app.session);

        let outcome = app.session.handle(InputSymbol::Step);
        app.apply_outcome(&outcome);
        assert_eq!(app.canvas.kind_at(5, 4), CellKind::Alive);
        assert_eq!(app.canvas.kind_at(5, 5), CellKind::Alive);
        assert_eq!(app.canvas.kind_at(5, 6), CellKind::Alive);
        assert_eq!(app.canvas.kind_at(4, 5), CellKind::Dead);
        assert_eq!(app.canvas.kind_at(6, 5), CellKind::Dead);
    }

    #[test]
    fn event_log_is_capacity_bounded() {
        let mut app = app(6, 6);
        for _ in 0..(EVENT_LOG_CAPACITY + 5) {
            let outcome = app.session.handle(InputSymbol::Save);
            app.apply_outcome(&outcome);
        }
        assert_eq!(app.event_log.len(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn seed_demo_rings_populates_the_canvas() {
        let mut session = Session::new(SandboxConfig {
            width: 60,
            height: 24,
            ..SandboxConfig::default()
        })
        .expect("session");
        seed_demo_rings(&mut session);
        assert!(session.live().alive_count() > 0);

        // Deterministic: a second identically-sized session seeds the same.
        let mut other = Session::new(SandboxConfig {
            width: 60,
            height: 24,
            ..SandboxConfig::default()
        })
        .expect("session");
        seed_demo_rings(&mut other);
        assert_eq!(session.live().cells(), other.live().cells());
    }

    #[test]
    fn frame_stats_follow_the_latest_summary() {
        let mut session = Session::new(SandboxConfig::default()).expect("session");
        let initial = FrameStats::from_session(&session);
        assert_eq!(initial.generation, 0);
        assert_eq!((initial.born, initial.died), (0, 0));

        for point in [Point::new(4, 5), Point::new(5, 5), Point::new(6, 5)] {
            session.set_cell(point, true);
        }
        let summary = session.step_generation();
        let stats = FrameStats::from_session(&session);
        assert_eq!(stats.generation, 1);
        assert_eq!(stats.alive, summary.alive);
        assert_eq!(stats.born, summary.born);
        assert_eq!(stats.died, summary.died);
    }

    #[test]
    fn empty_report_summary_falls_back_to_the_initial_frame() {
        let initial = FrameStats {
            generation: 3,
            alive: 17,
            born: 0,
            died: 0,
        };
        let summary = ReportSummary::from(&initial, &[]);
        assert_eq!(summary.frame_count, 0);
        assert_eq!(summary.final_generation, 3);
        assert_eq!(summary.final_alive, 17);
        assert_eq!(summary.alive_min, 17);
        assert_eq!(summary.alive_max, 17);
    }
}
