//! Font lookup for the genpdf renderer.
//!
//! Font families are loaded from TrueType files named `<Family>-Regular.ttf`, `-Bold.ttf`,
//! `-Italic.ttf` and `-BoldItalic.ttf`. Directories are searched in this order:
//!
//! 1. `PDF_FACADE_FONTS_DIR`
//! 2. `assets/fonts` next to the running executable
//! 3. `assets/fonts` in the crate manifest directory
//!
//! When the configured family is missing the [`FALLBACK_FONT_FAMILY_NAME`] family is tried.

use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{self, Builtin, FontData, FontFamily};
use log::{debug, warn};

use crate::error::{FacadeError, Result};

/// Environment variable overriding the font search directory.
pub const FONTS_DIR_ENV: &str = "PDF_FACADE_FONTS_DIR";

/// Family tried when the configured one cannot be found.
pub const FALLBACK_FONT_FAMILY_NAME: &str = "LiberationSans";

const FONT_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.iter().any(|existing| existing == &candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates
        .iter()
        .any(|existing| existing == &manifest_candidate)
    {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path, family: &str) -> Vec<PathBuf> {
    FONT_STYLES
        .iter()
        .map(|style| path.join(format!("{family}-{style}.ttf")))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory(family: &str) -> Result<PathBuf> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate, family);
        if missing.is_empty() {
            return Ok(candidate);
        }

        let missing_list = missing
            .iter()
            .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
            .collect::<Vec<_>>()
            .join(", ");
        attempts.push(format!("{} (missing [{}])", candidate.display(), missing_list));
    }

    Err(FacadeError::Font(format!(
        "Unable to locate font family '{}'. Checked: {}. Set {} to a directory with the TTF files.",
        family,
        attempts.join(", "),
        FONTS_DIR_ENV
    )))
}

/// Returns the PDF core font matching `family` when `mode` asks for core fonts (`"c"`).
///
/// Core fonts are referenced by name instead of being embedded; the TTF files still provide the
/// metrics used for layout.
pub fn builtin_for(family: &str, mode: &str) -> Option<Builtin> {
    if !mode.trim().eq_ignore_ascii_case("c") {
        return None;
    }
    match family.trim().to_ascii_lowercase().as_str() {
        "helvetica" | "arial" | "sans-serif" | "liberationsans" => Some(Builtin::Helvetica),
        "times" | "times new roman" | "serif" | "liberationserif" => Some(Builtin::Times),
        "courier" | "courier new" | "monospace" | "liberationmono" => Some(Builtin::Courier),
        _ => None,
    }
}

fn load_family(family: &str, builtin: Option<Builtin>) -> Result<FontFamily<FontData>> {
    let directory = resolve_font_directory(family)?;
    debug!("Loading font family '{}' from {}", family, directory.display());
    fonts::from_files(&directory, family, builtin).map_err(|err| {
        FacadeError::Font(format!(
            "Failed to load font family '{}' from {}: {}",
            family,
            directory.display(),
            err
        ))
    })
}

/// Loads the configured font family, falling back to [`FALLBACK_FONT_FAMILY_NAME`].
pub fn load_font_family(family: &str, mode: &str) -> Result<FontFamily<FontData>> {
    let builtin = builtin_for(family, mode);
    match load_family(family, builtin) {
        Ok(loaded) => Ok(loaded),
        Err(err) if family != FALLBACK_FONT_FAMILY_NAME => {
            match load_family(FALLBACK_FONT_FAMILY_NAME, builtin) {
                Ok(fallback) => {
                    warn!(
                        "{}; falling back to '{}' family.",
                        err, FALLBACK_FONT_FAMILY_NAME
                    );
                    Ok(fallback)
                }
                Err(fallback_err) => {
                    warn!("{}; fallback failed: {}", err, fallback_err);
                    Err(err)
                }
            }
        }
        Err(err) => Err(err),
    }
}

/// Indicates whether `family` or the fallback family can be loaded.
pub fn font_family_available(family: &str) -> bool {
    resolve_font_directory(family).is_ok()
        || resolve_font_directory(FALLBACK_FONT_FAMILY_NAME).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_mode_maps_standard_families() {
        assert!(matches!(builtin_for("Helvetica", "c"), Some(Builtin::Helvetica)));
        assert!(matches!(builtin_for("Times New Roman", "C"), Some(Builtin::Times)));
        assert!(matches!(builtin_for("courier", "c"), Some(Builtin::Courier)));
        assert!(builtin_for("Helvetica", "utf-8").is_none());
        assert!(builtin_for("DejaVuSans", "c").is_none());
    }

    #[test]
    fn missing_family_reports_search_paths() {
        let err = resolve_font_directory("__NoSuchFamily__").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("__NoSuchFamily__"));
        assert!(message.contains(FONTS_DIR_ENV));
    }
}
