//! Program and launcher registry compiled in from `catalog/*.toml`.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::{
    CellPosition, GridId, LauncherMetadata, LauncherTarget, ProgramId, ProgramMetadata,
};

include!(concat!(env!("OUT_DIR"), "/shell_catalog_generated.rs"));

/// Program launched to show details pages for programs that cannot run.
pub const SOFTWARE_CENTER_PROGRAM_ID: &str = "software_center";
/// Program whose launches never dismiss the ephemeral window first.
pub const START_MENU_PROGRAM_ID: &str = "start_menu";

#[derive(Debug, Deserialize)]
struct ProgramCatalogFile {
    programs: Vec<ProgramMetadata>,
}

#[derive(Debug, Deserialize)]
struct LauncherCatalogFile {
    #[serde(default)]
    launchers: Vec<LauncherOverride>,
    #[serde(default)]
    layouts: BTreeMap<GridId, Vec<LayoutEntry>>,
}

/// Partial launcher entry; fields left unset inherit from the program launcher of the same key.
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherOverride {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Option<LauncherTarget>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub draggable: Option<bool>,
}

/// One icon of a default grid layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayoutEntry {
    pub launcher: String,
    pub x: u32,
    pub y: u32,
}

impl LayoutEntry {
    pub fn position(&self) -> CellPosition {
        CellPosition::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Immutable lookup tables for programs, launchers, and default layouts.
pub struct ShellCatalog {
    programs: BTreeMap<ProgramId, ProgramMetadata>,
    launchers: BTreeMap<String, LauncherMetadata>,
    layouts: BTreeMap<GridId, Vec<LayoutEntry>>,
}

impl ShellCatalog {
    /// Parses the catalog embedded at build time.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedded JSON does not match the catalog types.
    pub fn builtin() -> Result<Self, String> {
        let programs: ProgramCatalogFile =
            serde_json::from_str(PROGRAM_CATALOG_JSON).map_err(|e| e.to_string())?;
        let launchers: LauncherCatalogFile =
            serde_json::from_str(LAUNCHER_CATALOG_JSON).map_err(|e| e.to_string())?;
        Ok(Self::from_parts(
            programs.programs,
            launchers.launchers,
            launchers.layouts,
        ))
    }

    /// Builds a catalog, deriving one launcher per program and layering `overrides` on top.
    pub fn from_parts(
        programs: Vec<ProgramMetadata>,
        overrides: Vec<LauncherOverride>,
        layouts: BTreeMap<GridId, Vec<LayoutEntry>>,
    ) -> Self {
        let mut launchers: BTreeMap<String, LauncherMetadata> = programs
            .iter()
            .map(|program| (program.id.0.clone(), program_launcher(program)))
            .collect();

        for entry in overrides {
            match launchers.get_mut(&entry.id) {
                Some(base) => apply_override(base, entry),
                None => {
                    let Some(target) = entry.target.clone() else {
                        leptos::logging::warn!(
                            "launcher `{}` has no target and no matching program; skipped",
                            entry.id
                        );
                        continue;
                    };
                    let mut meta = LauncherMetadata::new(target);
                    meta.id = Some(entry.id.clone());
                    apply_override(&mut meta, entry.clone());
                    launchers.insert(entry.id, meta);
                }
            }
        }

        Self {
            programs: programs
                .into_iter()
                .map(|program| (program.id.clone(), program))
                .collect(),
            launchers,
            layouts,
        }
    }

    pub fn program(&self, id: &ProgramId) -> Option<&ProgramMetadata> {
        self.programs.get(id)
    }

    pub fn programs(&self) -> impl Iterator<Item = &ProgramMetadata> {
        self.programs.values()
    }

    /// Resolves the program a launcher target opens, if any.
    pub fn program_for(&self, target: &LauncherTarget) -> Option<&ProgramMetadata> {
        self.program(target.program_id()?)
    }

    pub fn launcher(&self, key: &str) -> Option<&LauncherMetadata> {
        self.launchers.get(key)
    }

    /// Default layout for `grid`; empty when none is declared.
    pub fn default_layout(&self, grid: GridId) -> &[LayoutEntry] {
        self.layouts.get(&grid).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn program_launcher(program: &ProgramMetadata) -> LauncherMetadata {
    let mut meta = LauncherMetadata::new(LauncherTarget::program(program.id.0.clone()));
    meta.id = Some(program.id.0.clone());
    meta.label = Some(program.name.clone());
    meta.icon = program.icon.clone();
    meta.disabled = program.disabled;
    meta.disabled_text = program.disabled_text.clone();
    meta
}

fn apply_override(base: &mut LauncherMetadata, entry: LauncherOverride) {
    if let Some(target) = entry.target {
        base.target = target;
    }
    if entry.label.is_some() {
        base.label = entry.label;
    }
    if entry.icon.is_some() {
        base.icon = entry.icon;
    }
    if entry.description.is_some() {
        base.description = entry.description;
    }
    if let Some(disabled) = entry.disabled {
        base.disabled = disabled;
    }
    if let Some(draggable) = entry.draggable {
        base.draggable = draggable;
    }
}
