use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    app_stack::AppStackTable, config::ShellConfig, grid::GridTable, placement::LauncherTable,
    process::ProcessTable, window_manager::WindowTable,
};

pub const LAUNCHER_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Desktop window surface. Identity is derived from the owning process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub ProcessId);

impl WindowId {
    pub fn process_id(self) -> ProcessId {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window:{}", self.0)
    }
}

/// Mobile card surface. Identity is derived from the owning process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub ProcessId);

impl CardId {
    pub fn process_id(self) -> ProcessId {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card:{}", self.0)
    }
}

/// Weak reference from a process (or icon) to the surface hosting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisplayId {
    Window(WindowId),
    Card(CardId),
}

impl DisplayId {
    pub fn process_id(self) -> ProcessId {
        match self {
            Self::Window(id) => id.process_id(),
            Self::Card(id) => id.process_id(),
        }
    }

    pub fn as_window(self) -> Option<WindowId> {
        match self {
            Self::Window(id) => Some(id),
            Self::Card(_) => None,
        }
    }

    pub fn as_card(self) -> Option<CardId> {
        match self {
            Self::Card(id) => Some(id),
            Self::Window(_) => None,
        }
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(id) => id.fmt(f),
            Self::Card(id) => id.fmt(f),
        }
    }
}

/// Identity of a placed icon record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LauncherId(pub u64);

impl fmt::Display for LauncherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "launcher:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub String);

impl ProgramId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProgramId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pixel coordinate. Also used for pointer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn has_area(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn clamped_min(self, min: Size) -> Self {
        Self {
            width: self.width.max(min.width),
            height: self.height.max(min.height),
        }
    }
}

/// Returns `true` when `point` lies within the rectangle at `origin` with `size` (edges inclusive).
pub fn point_inside(point: Position, origin: Position, size: Size) -> bool {
    point.x >= origin.x
        && point.x <= origin.x + size.width
        && point.y >= origin.y
        && point.y <= origin.y + size.height
}

/// Grid cell coordinate (column, row), not pixels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CellPosition {
    pub x: u32,
    pub y: u32,
}

impl CellPosition {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Desktop,
    Mobile,
}

impl Platform {
    pub fn is_desktop(self) -> bool {
        matches!(self, Self::Desktop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsStatus {
    Booting,
    Locked,
    Unlocked,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridId {
    /// Desktop icon area; its pixel size is the coordinate space for windows.
    Home,
    /// Taskbar/dock area.
    Panel,
}

impl GridId {
    pub const ALL: [GridId; 2] = [GridId::Home, GridId::Panel];
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Panel => f.write_str("panel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Column-major fill: top to bottom, then the next column.
    #[default]
    Vertical,
    /// Row-major fill: left to right, then the next row.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GridSizing {
    /// Rows/cols are supplied by the host and never derived.
    #[default]
    Fixed,
    /// Rows/cols are derived from the measured container size.
    Responsive { icon_size: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    pub id: GridId,
    pub rows: u32,
    pub cols: u32,
    pub size: Size,
    pub position: Position,
    pub layout_direction: LayoutDirection,
    #[serde(default)]
    pub sizing: GridSizing,
}

impl GridState {
    pub fn new(id: GridId, rows: u32, cols: u32, layout_direction: LayoutDirection) -> Self {
        Self {
            id,
            rows,
            cols,
            size: Size::default(),
            position: Position::default(),
            layout_direction,
            sizing: GridSizing::Fixed,
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn responsive(mut self, icon_size: u32) -> Self {
        self.sizing = GridSizing::Responsive { icon_size };
        self
    }

    pub fn contains(&self, cell: CellPosition) -> bool {
        cell.x < self.cols && cell.y < self.rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    Center,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "%")]
    Percent,
}

/// Requested spawn size: literal pixels, or a fraction of the home grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSize {
    pub width: f64,
    pub height: f64,
    pub unit: SizeUnit,
}

impl SpawnSize {
    pub const fn px(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: SizeUnit::Px,
        }
    }

    pub const fn percent(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: SizeUnit::Percent,
        }
    }

    pub fn is_full_container(&self) -> bool {
        self.unit == SizeUnit::Percent && self.width == 1.0 && self.height == 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    pub size: SpawnSize,
    #[serde(default)]
    pub min_size: Option<Size>,
    #[serde(default)]
    pub max_size: Option<Size>,
}

/// Per-program window behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowMetadata {
    pub anchor: Option<Anchor>,
    /// No taskbar presence; auto-dismissed by an outside click.
    pub is_ephemeral: bool,
    pub is_draggable: bool,
    pub is_resizable: bool,
    pub is_maximizable: bool,
    pub hide_controls: bool,
    /// Initial geometry. Spawn min/max only clamp the initial size.
    pub spawn: Option<SpawnSpec>,
    /// Constraints for interactive resizing.
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
}

impl Default for WindowMetadata {
    fn default() -> Self {
        Self {
            anchor: None,
            is_ephemeral: false,
            is_draggable: true,
            is_resizable: true,
            is_maximizable: true,
            hide_controls: false,
            spawn: None,
            min_size: None,
            max_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramCategory {
    Developer,
    #[default]
    System,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: ProgramCategory,
    #[serde(default)]
    pub allow_multiple_instances: bool,
    #[serde(default)]
    pub window: Option<WindowMetadata>,
    /// Has a Software Center details page.
    #[serde(default)]
    pub has_details: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub disabled_text: Option<String>,
    #[serde(default = "default_true")]
    pub runnable: bool,
}

impl ProgramMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProgramId::new(id),
            name: name.into(),
            icon: None,
            category: ProgramCategory::System,
            allow_multiple_instances: false,
            window: None,
            has_details: false,
            disabled: false,
            disabled_text: None,
            runnable: true,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_ephemeral)
    }
}

/// Closed set of non-program launcher behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LauncherAction {
    OpenUrl { url: String },
    /// Opens a catalog launcher by key.
    LaunchProgram { launcher: String },
    PanelSettings,
    CloseLauncherWindows { id: LauncherId },
    DeleteLauncherFromHome { id: LauncherId },
    AddLauncherToHome { meta: Box<LauncherMetadata> },
    AddLauncherToPanel { id: LauncherId },
    PinToPanel { meta: Box<LauncherMetadata> },
    UnpinLauncherFromPanel { id: LauncherId },
    LockScreen,
    PromptShutdown,
    Reboot,
    Shutdown,
    ResetHomeScreen,
    ToggleShowDesktop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LauncherTarget {
    Program {
        program_id: ProgramId,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        args: Value,
    },
    Action {
        action: LauncherAction,
    },
}

impl LauncherTarget {
    pub fn program(program_id: impl Into<String>) -> Self {
        Self::Program {
            program_id: ProgramId::new(program_id),
            args: Value::Null,
        }
    }

    pub fn program_id(&self) -> Option<&ProgramId> {
        match self {
            Self::Program { program_id, .. } => Some(program_id),
            Self::Action { .. } => None,
        }
    }

    pub fn args(&self) -> Option<&Value> {
        match self {
            Self::Program { args, .. } => Some(args),
            Self::Action { .. } => None,
        }
    }

    /// `args.title` when it is a string.
    pub fn title_arg(&self) -> Option<&str> {
        self.args()?.get("title")?.as_str()
    }

    pub fn same_program(&self, other: &Self) -> bool {
        matches!((self.program_id(), other.program_id()), (Some(a), Some(b)) if a == b)
    }

    pub fn same_action(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Action { action: a }, Self::Action { action: b }) if a == b
        )
    }
}

/// Compares launch arguments key by key, treating a missing object as empty.
pub fn same_args(a: &Value, b: &Value) -> bool {
    let empty = serde_json::Map::new();
    let a = a.as_object().unwrap_or(&empty);
    let b = b.as_object().unwrap_or(&empty);
    a.keys()
        .chain(b.keys())
        .all(|key| a.get(key).unwrap_or(&Value::Null) == b.get(key).unwrap_or(&Value::Null))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherMetadata {
    pub target: LauncherTarget,
    /// Catalog key this metadata was resolved from.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub disabled_text: Option<String>,
    #[serde(default = "default_true")]
    pub draggable: bool,
}

impl LauncherMetadata {
    pub fn new(target: LauncherTarget) -> Self {
        Self {
            target,
            id: None,
            label: None,
            icon: None,
            description: None,
            disabled: false,
            disabled_text: None,
            draggable: true,
        }
    }

    pub fn program(program_id: impl Into<String>) -> Self {
        Self::new(LauncherTarget::program(program_id))
    }

    pub fn action(action: LauncherAction) -> Self {
        Self::new(LauncherTarget::Action { action })
    }

    /// Returns `true` when both launchers open the same program, or run the same action.
    pub fn same_target(&self, other: &LauncherMetadata) -> bool {
        self.target.same_program(&other.target) || self.target.same_action(&other.target)
    }
}

/// Placement record for an icon on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLauncher {
    pub id: LauncherId,
    pub meta: LauncherMetadata,
    pub grid_id: GridId,
    pub position: CellPosition,
    /// Surfaces currently represented by this icon. Never persisted.
    #[serde(skip)]
    pub display_ids: Vec<DisplayId>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub id: ProcessId,
    pub launcher: LauncherMetadata,
    pub program_id: ProgramId,
    pub display_id: DisplayId,
    pub started_at_ms: u64,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    pub draggable: bool,
    pub resizable: bool,
    pub maximizable: bool,
    pub ephemeral: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            draggable: true,
            resizable: true,
            maximizable: true,
            ephemeral: false,
        }
    }
}

impl From<&WindowMetadata> for WindowFlags {
    fn from(meta: &WindowMetadata) -> Self {
        Self {
            draggable: meta.is_draggable,
            resizable: meta.is_resizable,
            maximizable: meta.is_maximizable,
            ephemeral: meta.is_ephemeral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub process_id: ProcessId,
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub previous_position: Position,
    pub previous_size: Size,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub hidden_by_desktop_mode: bool,
    pub flags: WindowFlags,
}

impl WindowRecord {
    /// Visible means neither minimized nor hidden by show-desktop.
    pub fn is_visible(&self) -> bool {
        !self.is_minimized && !self.hidden_by_desktop_mode
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppCard {
    pub id: CardId,
    pub process_id: ProcessId,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherActivation {
    pub launcher_id: LauncherId,
    pub at_ms: u64,
}

/// Desktop-wide interaction state not owned by any single table.
#[derive(Debug, Clone, PartialEq)]
pub struct DesktopSession {
    /// At most one auto-dismissing window per session.
    pub ephemeral_window_id: Option<WindowId>,
    pub showing_desktop: bool,
    pub selected_launchers: Vec<LauncherId>,
    pub last_activation: Option<LauncherActivation>,
    /// Browser viewport; upper bound for spawn and resize sizes.
    pub viewport: Size,
}

impl DesktopSession {
    pub fn new(viewport: Size) -> Self {
        Self {
            ephemeral_window_id: None,
            showing_desktop: false,
            selected_launchers: Vec::new(),
            last_activation: None,
            viewport,
        }
    }
}

/// All mutable shell state. Each table is mutated only through its own methods.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellState {
    pub platform: Platform,
    pub status: OsStatus,
    pub grids: GridTable,
    pub launchers: LauncherTable,
    pub processes: ProcessTable,
    pub windows: WindowTable,
    pub cards: AppStackTable,
    pub desktop: DesktopSession,
}

impl ShellState {
    pub fn new(platform: Platform, config: &ShellConfig) -> Self {
        Self {
            platform,
            status: OsStatus::Booting,
            grids: GridTable::new(config.grids.resize_debounce_ms),
            launchers: LauncherTable::default(),
            processes: ProcessTable::default(),
            windows: WindowTable::default(),
            cards: AppStackTable::default(),
            desktop: DesktopSession::new(config.system.default_viewport),
        }
    }

    pub fn is_desktop(&self) -> bool {
        self.platform.is_desktop()
    }
}
