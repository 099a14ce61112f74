//! Core session state and rules for the lifepad sandbox.
//!
//! Everything here is display-agnostic: the session consumes [`InputSymbol`]s
//! and answers with [`KeyOutcome`]s describing which cells to repaint, which
//! events to surface, and whether to terminate. The terminal front end maps
//! raw key codes onto symbols and render effects onto glyphs.

use lifepad_shapes::{Circle, Line, Point, circle_points, drag_radius, line_points};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::mem;
use thiserror::Error;

/// Number of snapshot slots available for save/load.
pub const SLOT_COUNT: usize = 10;

/// Monotonic generation counter, starting at zero for the untouched canvas.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Errors that can occur when constructing session state.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Static configuration for a sandbox session.
///
/// Dimensions come from the terminal geometry at startup and stay fixed for
/// the process lifetime; there is no runtime resize handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Canvas width in cells.
    pub width: u32,
    /// Canvas height in cells.
    pub height: u32,
    /// Maximum number of recent tick summaries retained in memory.
    pub history_capacity: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            history_capacity: 256,
        }
    }
}

impl SandboxConfig {
    fn validate(&self) -> Result<(), SandboxError> {
        if self.width == 0 || self.height == 0 {
            return Err(SandboxError::InvalidConfig(
                "canvas dimensions must be non-zero",
            ));
        }
        if self.history_capacity == 0 {
            return Err(SandboxError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Dense row-major grid of cell states with a permanently dead border.
///
/// The backing store is a flat `Vec<bool>` indexed `y * width + x`; every
/// read and write goes through the bounds check here rather than relying on
/// call-site discipline. Out-of-range reads are dead and out-of-range writes
/// are dropped, so edge cells simply have fewer live neighbors and
/// coordinates never wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl CellGrid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, point: Point) -> Option<usize> {
        if point.y < 0 || point.x < 0 {
            return None;
        }
        let (y, x) = (point.y as u32, point.x as u32);
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Whether the cell at `point` is alive; out-of-range reads are dead.
    #[must_use]
    pub fn get(&self, point: Point) -> bool {
        self.index(point).is_some_and(|idx| self.cells[idx])
    }

    /// Set the cell at `point`, silently dropping out-of-range writes.
    pub fn set(&mut self, point: Point, alive: bool) {
        if let Some(idx) = self.index(point) {
            self.cells[idx] = alive;
        }
    }

    /// Kill every cell.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Overwrite this grid with the full contents of `other`.
    ///
    /// All grids in a session share the same dimensions, so this is a plain
    /// element-wise copy, never a merge.
    pub fn copy_from(&mut self, other: &CellGrid) {
        self.cells.copy_from_slice(&other.cells);
    }

    /// Raw row-major cell states, for full-grid sweeps.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of live cells.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    /// Count the live cells among the eight neighbors of `point`.
    #[must_use]
    pub fn neighbor_count(&self, point: Point) -> u8 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dy == 0 && dx == 0 {
                    continue;
                }
                if self.get(Point::new(point.y + dy, point.x + dx)) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Fixed pool of grid snapshots addressed by slot index.
///
/// Every slot is allocated eagerly at session startup so a save can never
/// fail mid-session. The save cursor wraps after [`SLOT_COUNT`] saves and
/// overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct BufferStore {
    slots: Vec<CellGrid>,
    next_slot: usize,
}

impl BufferStore {
    fn new(width: u32, height: u32) -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(|_| CellGrid::new(width, height)).collect(),
            next_slot: 0,
        }
    }

    /// Copy `live` into the next slot, returning the slot index written.
    pub fn save(&mut self, live: &CellGrid) -> usize {
        let slot = self.next_slot;
        self.slots[slot].copy_from(live);
        self.next_slot = (self.next_slot + 1) % SLOT_COUNT;
        slot
    }

    /// Borrow the snapshot at `slot`, if the index is in range.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&CellGrid> {
        self.slots.get(slot)
    }

    /// Slot index the next save will write.
    #[must_use]
    pub const fn next_slot(&self) -> usize {
        self.next_slot
    }
}

/// Aggregate outcome of a single generation advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    pub generation: Generation,
    pub alive: usize,
    pub born: usize,
    pub died: usize,
}

/// Shape tool currently engaged by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    DraggingLine { anchor: Point },
    DraggingCircle { centre: Point },
}

impl ToolState {
    /// Short label for status displays.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DraggingLine { .. } => "line",
            Self::DraggingCircle { .. } => "circle",
        }
    }
}

/// Cursor, toggles, and drag bookkeeping for the interactive editor.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub cursor: Point,
    pub trace: bool,
    pub stats: bool,
    pub tool: ToolState,
    guide: Vec<Point>,
}

impl EditorState {
    /// Points of the preview guide currently on display, if any.
    #[must_use]
    pub fn guide(&self) -> &[Point] {
        &self.guide
    }
}

/// Display-agnostic input symbols consumed by the editor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSymbol {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    ToggleCell,
    Step,
    ToggleTrace,
    Save,
    LineTool,
    CircleTool,
    Clear,
    ToggleStats,
    LoadSlot(u8),
    Quit,
}

/// Minimal-repaint instruction emitted by the session for each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEffect {
    /// Repaint exactly these cells from authoritative grid state.
    Cells(Vec<Point>),
    /// Draw the preview-guide marker at these cells; display-only, never
    /// written into the grid.
    Guide(Vec<Point>),
    /// Full-grid sweep: any cell may have changed.
    Everything,
    /// The stats sidebar needs a refresh.
    StatsPanel,
}

/// Notable editor happenings surfaced to the front end's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Saved { slot: usize },
    Loaded { slot: usize },
    Cleared,
    LineCommitted { cells: usize },
    CircleCommitted { radius: i32 },
    DragCancelled,
    TraceEnabled,
    TraceDisabled,
    Generation(TickSummary),
}

/// Everything a single keystroke produced: repaint effects, log events, and
/// whether the session should terminate.
#[derive(Debug, Clone, Default)]
pub struct KeyOutcome {
    pub effects: Vec<RenderEffect>,
    pub events: Vec<SessionEvent>,
    pub exit: bool,
}

/// Owner of all sandbox state: grids, snapshot slots, editor, and history.
///
/// A session is built once at startup and driven by exactly one processing
/// loop. Nothing here is shared or locked; save/load fully copy slot
/// contents, so no two grids ever alias.
#[derive(Debug, Clone)]
pub struct Session {
    config: SandboxConfig,
    live: CellGrid,
    scratch: CellGrid,
    buffers: BufferStore,
    editor: EditorState,
    generation: Generation,
    history: VecDeque<TickSummary>,
}

impl Session {
    /// Build a session, allocating the live grid, the scratch grid, and all
    /// snapshot slots up front. Allocation failure here is fatal before any
    /// input is processed; there is no partial-success mode.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        let history_capacity = config.history_capacity;
        Ok(Self {
            live: CellGrid::new(config.width, config.height),
            scratch: CellGrid::new(config.width, config.height),
            buffers: BufferStore::new(config.width, config.height),
            editor: EditorState::default(),
            generation: Generation::default(),
            history: VecDeque::with_capacity(history_capacity),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SandboxConfig {
        &self.config
    }

    #[must_use]
    pub const fn live(&self) -> &CellGrid {
        &self.live
    }

    #[must_use]
    pub const fn editor(&self) -> &EditorState {
        &self.editor
    }

    #[must_use]
    pub const fn buffers(&self) -> &BufferStore {
        &self.buffers
    }

    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Recent tick summaries, oldest first, bounded by `history_capacity`.
    #[must_use]
    pub const fn history(&self) -> &VecDeque<TickSummary> {
        &self.history
    }

    /// Set a single cell directly, bypassing the editor.
    ///
    /// Used by bootstrap seeding and tests; out-of-range writes are dropped
    /// exactly as they are for editor mutations.
    pub fn set_cell(&mut self, point: Point, alive: bool) {
        self.live.set(point, alive);
    }

    /// Commit a rasterized circle straight into the live grid.
    pub fn commit_circle(&mut self, circle: Circle) {
        for &point in &circle_points(circle) {
            self.live.set(point, true);
        }
    }

    /// Commit a rasterized line straight into the live grid.
    pub fn commit_line(&mut self, line: Line) {
        for &point in &line_points(line) {
            self.live.set(point, true);
        }
    }

    /// Advance the simulation one generation.
    ///
    /// The next state is computed entirely from the current generation into
    /// the scratch grid; mutating the grid being read mid-pass would corrupt
    /// neighbor counts for cells visited later. Every scratch cell is
    /// overwritten below, so committing by buffer swap is safe.
    pub fn step_generation(&mut self) -> TickSummary {
        let height = self.config.height as i32;
        let width = self.config.width as i32;
        let mut born = 0;
        let mut died = 0;

        for y in 0..height {
            for x in 0..width {
                let point = Point::new(y, x);
                let alive = self.live.get(point);
                let neighbors = self.live.neighbor_count(point);
                let next = matches!((alive, neighbors), (true, 2 | 3) | (false, 3));
                if next && !alive {
                    born += 1;
                } else if alive && !next {
                    died += 1;
                }
                self.scratch.set(point, next);
            }
        }

        mem::swap(&mut self.live, &mut self.scratch);
        self.generation = self.generation.next();

        let summary = TickSummary {
            generation: self.generation,
            alive: self.live.alive_count(),
            born,
            died,
        };
        self.push_history(summary);
        summary
    }

    fn push_history(&mut self, summary: TickSummary) {
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Process one input symbol, returning repaint effects, log events, and
    /// whether the session should end.
    pub fn handle(&mut self, symbol: InputSymbol) -> KeyOutcome {
        let mut out = KeyOutcome::default();

        match symbol {
            InputSymbol::CursorUp => self.move_cursor(-1, 0),
            InputSymbol::CursorDown => self.move_cursor(1, 0),
            InputSymbol::CursorLeft => self.move_cursor(0, -1),
            InputSymbol::CursorRight => self.move_cursor(0, 1),
            InputSymbol::ToggleCell => {
                let cursor = self.editor.cursor;
                let alive = self.live.get(cursor);
                self.live.set(cursor, !alive);
                out.effects.push(RenderEffect::Cells(vec![cursor]));
            }
            InputSymbol::Step => {
                let summary = self.step_generation();
                out.events.push(SessionEvent::Generation(summary));
                out.effects.push(RenderEffect::Everything);
            }
            InputSymbol::ToggleTrace => {
                self.editor.trace = !self.editor.trace;
                out.events.push(if self.editor.trace {
                    SessionEvent::TraceEnabled
                } else {
                    SessionEvent::TraceDisabled
                });
            }
            InputSymbol::LineTool => match self.editor.tool {
                ToolState::Idle => {
                    self.editor.tool = ToolState::DraggingLine {
                        anchor: self.editor.cursor,
                    };
                }
                ToolState::DraggingLine { anchor } => {
                    let points = line_points(Line {
                        start: anchor,
                        end: self.editor.cursor,
                    });
                    for &point in &points {
                        self.live.set(point, true);
                    }
                    out.events.push(SessionEvent::LineCommitted {
                        cells: points.len(),
                    });
                    out.effects.push(RenderEffect::Cells(points));
                    self.editor.tool = ToolState::Idle;
                }
                // Tool keys ignore each other while the other drag is active.
                ToolState::DraggingCircle { .. } => {}
            },
            InputSymbol::CircleTool => match self.editor.tool {
                ToolState::Idle => {
                    self.editor.tool = ToolState::DraggingCircle {
                        centre: self.editor.cursor,
                    };
                }
                ToolState::DraggingCircle { centre } => {
                    let radius = drag_radius(centre, self.editor.cursor);
                    let points = circle_points(Circle { centre, radius });
                    for &point in &points {
                        self.live.set(point, true);
                    }
                    out.events.push(SessionEvent::CircleCommitted { radius });
                    out.effects.push(RenderEffect::Cells(points));
                    self.editor.tool = ToolState::Idle;
                }
                ToolState::DraggingLine { .. } => {}
            },
            InputSymbol::Clear => {
                if self.cancel_drag() {
                    out.events.push(SessionEvent::DragCancelled);
                }
                self.live.clear();
                out.events.push(SessionEvent::Cleared);
                out.effects.push(RenderEffect::Everything);
            }
            InputSymbol::Save => {
                let slot = self.buffers.save(&self.live);
                out.events.push(SessionEvent::Saved { slot });
            }
            InputSymbol::LoadSlot(digit) => {
                let slot = usize::from(digit);
                if let Some(snapshot) = self.buffers.get(slot) {
                    self.live.copy_from(snapshot);
                    out.events.push(SessionEvent::Loaded { slot });
                    out.effects.push(RenderEffect::Everything);
                }
            }
            InputSymbol::ToggleStats => {
                self.editor.stats = !self.editor.stats;
                out.effects.push(RenderEffect::StatsPanel);
            }
            InputSymbol::Quit => {
                if self.cancel_drag() {
                    out.events.push(SessionEvent::DragCancelled);
                } else if self.editor.trace {
                    self.editor.trace = false;
                    out.events.push(SessionEvent::TraceDisabled);
                } else {
                    out.exit = true;
                }
            }
        }

        self.epilogue(&mut out);
        out
    }

    fn move_cursor(&mut self, dy: i32, dx: i32) {
        let height = self.config.height as i32;
        let width = self.config.width as i32;
        let cursor = self.editor.cursor;
        self.editor.cursor = Point::new(
            (cursor.y + dy).clamp(0, height - 1),
            (cursor.x + dx).clamp(0, width - 1),
        );
    }

    /// Abandon an in-progress drag, returning whether one was active. The
    /// guide itself is erased by the epilogue.
    fn cancel_drag(&mut self) -> bool {
        if matches!(self.editor.tool, ToolState::Idle) {
            return false;
        }
        self.editor.tool = ToolState::Idle;
        true
    }

    /// Per-keystroke epilogue, always executed regardless of the branch
    /// taken: trace pen, preview-guide upkeep, stats refresh.
    fn epilogue(&mut self, out: &mut KeyOutcome) {
        if self.editor.trace {
            let cursor = self.editor.cursor;
            if !self.live.get(cursor) {
                self.live.set(cursor, true);
                out.effects.push(RenderEffect::Cells(vec![cursor]));
            }
        }

        // Erase the previous guide by repainting its cells from the grid,
        // then draw a fresh guide for the updated anchor-to-cursor shape.
        // The redraw comes last so the guide survives any full sweeps or
        // cell patches this keystroke also produced.
        if !self.editor.guide.is_empty() {
            let stale = mem::take(&mut self.editor.guide);
            out.effects.push(RenderEffect::Cells(stale));
        }
        let fresh = self.current_guide();
        if !fresh.is_empty() {
            out.effects.push(RenderEffect::Guide(fresh.clone()));
            self.editor.guide = fresh;
        }

        if self.editor.stats
            && !out
                .effects
                .iter()
                .any(|effect| matches!(effect, RenderEffect::StatsPanel))
        {
            out.effects.push(RenderEffect::StatsPanel);
        }
    }

    /// Point set of the guide for the shape currently being dragged.
    fn current_guide(&self) -> Vec<Point> {
        match self.editor.tool {
            ToolState::Idle => Vec::new(),
            ToolState::DraggingLine { anchor } => line_points(Line {
                start: anchor,
                end: self.editor.cursor,
            }),
            ToolState::DraggingCircle { centre } => {
                let radius = drag_radius(centre, self.editor.cursor);
                circle_points(Circle { centre, radius })
            }
        }
    }
}
