//! Firmware image selection by semantic version and release date.
//!
//! Release binaries are named
//! `v<MAJOR>.<MINOR>.<PATCH>[-<PRERELEASE>].<YYYY>.<MM>.<DD>.bin`, e.g.
//! `v1.4.2.2024.11.30.bin` or `v2.0.0-rc1.2025.01.15.bin`. Selection picks
//! the highest version; a stable build outranks any prerelease of the same
//! version, and the release date breaks remaining ties.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Ordering key parsed from a versioned firmware filename.
///
/// The derived `Ord` compares fields top to bottom, giving the 7-tuple
/// lexicographic order `(major, minor, patch, stable, year, month, day)`.
/// Filenames that do not match the grammar yield no key at all and sort
/// below every valid key via `Option` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey {
    /// Major version component.
    pub major: u32,
    /// Minor version component.
    pub minor: u32,
    /// Patch version component.
    pub patch: u32,
    /// 1 for a stable release, 0 when a prerelease tag is present.
    pub stable: u8,
    /// Release year.
    pub year: u16,
    /// Release month.
    pub month: u8,
    /// Release day.
    pub day: u8,
}

/// Parse the version ordering key from a firmware path.
///
/// The extension is stripped and the grammar is matched against the base
/// filename only; the directory part is ignored. Returns `None` for any
/// name that does not match exactly.
#[must_use]
pub fn version_key(path: &Path) -> Option<VersionKey> {
    let base = path.file_stem()?.to_str()?;
    let rest = base.strip_prefix('v')?;

    // The prerelease tag cannot contain dots, so the stem always splits
    // into exactly six dot-separated fields.
    let parts: Vec<&str> = rest.split('.').collect();
    let [major, minor, patch_field, year, month, day] = parts.as_slice() else {
        return None;
    };

    let (patch, stable) = match patch_field.split_once('-') {
        Some((patch, prerelease)) => {
            if prerelease.is_empty() {
                return None;
            }
            (patch, 0)
        },
        None => (*patch_field, 1),
    };

    Some(VersionKey {
        major: parse_digits(major)?,
        minor: parse_digits(minor)?,
        patch: parse_digits(patch)?,
        stable,
        year: u16::try_from(parse_fixed(year, 4)?).ok()?,
        month: u8::try_from(parse_fixed(month, 2)?).ok()?,
        day: u8::try_from(parse_fixed(day, 2)?).ok()?,
    })
}

/// Parse a non-empty all-digit field.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a digit field of exactly `len` characters.
fn parse_fixed(s: &str, len: usize) -> Option<u32> {
    if s.len() != len {
        return None;
    }
    parse_digits(s)
}

/// Select the firmware binary to flash.
///
/// An explicit path skips discovery entirely but is still checked for
/// existence. Otherwise `dir` is scanned for files matching the loose
/// `v*.bin` pattern and the best candidate by [`version_key`] wins;
/// non-matching names are simply non-competitive.
///
/// # Errors
///
/// [`Error::FirmwareNotFound`] when discovery finds no candidate, and
/// [`Error::FirmwareMissing`] when the explicit or selected path does not
/// exist on disk.
pub fn select_firmware(dir: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::FirmwareMissing(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('v') && name.ends_with(".bin") && path.is_file() {
            candidates.push(path);
        }
    }

    if candidates.is_empty() {
        return Err(Error::FirmwareNotFound(dir.to_path_buf()));
    }

    // Directory order is platform-dependent; sort by name so true duplicates
    // resolve deterministically.
    candidates.sort();
    debug!("Found {} firmware candidate(s) in {}", candidates.len(), dir.display());

    let best = candidates
        .into_iter()
        .max_by_key(|path| version_key(path))
        .expect("candidates is non-empty here");

    if !best.is_file() {
        return Err(Error::FirmwareMissing(best));
    }
    Ok(best)
}
