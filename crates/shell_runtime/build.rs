use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const CATALOG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct CatalogHeader {
    schema_version: u32,
}

fn read_catalog(path: &Path) -> toml::Value {
    println!("cargo:rerun-if-changed={}", path.display());
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let header: CatalogHeader = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    if header.schema_version != CATALOG_SCHEMA_VERSION {
        panic!(
            "catalog schema mismatch in {}: expected {CATALOG_SCHEMA_VERSION} found {}",
            path.display(),
            header.schema_version
        );
    }
    toml::from_str(&raw).unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()))
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let catalog_dir = crate_root.join("catalog");

    let programs = read_catalog(&catalog_dir.join("programs.toml"));
    let launchers = read_catalog(&catalog_dir.join("launchers.toml"));

    let programs_json = serde_json::to_string_pretty(&programs).expect("serialize program catalog");
    let launchers_json =
        serde_json::to_string_pretty(&launchers).expect("serialize launcher catalog");
    let generated = format!(
        "/// Build-time generated program catalog JSON.\n\
pub const PROGRAM_CATALOG_JSON: &str = r##\"{programs_json}\"##;\n\
/// Build-time generated launcher catalog and default layout JSON.\n\
pub const LAUNCHER_CATALOG_JSON: &str = r##\"{launchers_json}\"##;\n"
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("shell_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
