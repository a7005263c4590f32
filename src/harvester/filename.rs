//! Filename derivation and collision handling for saved artifacts
//!
//! All functions here are pure with respect to the filesystem: the collision
//! probe is injected by the caller, so the disambiguation loop can be tested
//! against an in-memory map.

use std::io;

use reqwest::Url;

use crate::harvester::fingerprint::ContentFingerprint;

/// Maximum length of a filename stem derived from a URL.
pub const MAX_STEM_LEN: usize = 36;

/// Stem used when a URL yields no usable basename.
const FALLBACK_STEM: &str = "image";

/// Derive `(stem, extension)` from a candidate URL.
///
/// GET parameters are stripped, the path basename is taken, and the stem is
/// truncated to [`MAX_STEM_LEN`] characters and trimmed of whitespace. The
/// extension keeps its leading dot, or is empty when the basename has none.
pub fn derive_parts(url: &str) -> (String, String) {
    let basename = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();

    let (name, ext) = match basename.rfind('.') {
        Some(idx) if idx > 0 => (&basename[..idx], &basename[idx..]),
        _ => (basename.as_str(), ""),
    };

    let stem: String = name.chars().take(MAX_STEM_LEN).collect();
    let stem = stem.trim().to_string();
    let stem = if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    };

    (stem, ext.to_string())
}

/// Outcome of resolving a filename against what is already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    /// The name is free; the new content may be written under it.
    Fresh(String),
    /// A file with identical content already exists under this name.
    AlreadyOnDisk(String),
}

/// Resolve a filename collision by linear probing.
///
/// Probes `stem.ext`, `stem-1.ext`, `stem-2.ext`, … until either a free name
/// is found or an existing file turns out to hold identical content. The
/// `probe` callback returns the fingerprint of an existing file under that
/// name, or `None` when the name is unclaimed.
pub fn resolve_collision<F>(
    stem: &str,
    ext: &str,
    fingerprint: &ContentFingerprint,
    mut probe: F,
) -> io::Result<Collision>
where
    F: FnMut(&str) -> io::Result<Option<ContentFingerprint>>,
{
    let mut candidate = format!("{stem}{ext}");
    let mut suffix = 0usize;

    loop {
        match probe(&candidate)? {
            None => return Ok(Collision::Fresh(candidate)),
            Some(existing) if existing == *fingerprint => {
                return Ok(Collision::AlreadyOnDisk(candidate));
            }
            Some(_) => {
                suffix += 1;
                candidate = format!("{stem}-{suffix}{ext}");
            }
        }
    }
}

/// Embed a derived label into a filename, before the extension.
///
/// `portrait-1.jpg` with label `14` becomes `portrait-1|14.jpg`.
pub fn labeled(filename: &str, label: &str) -> String {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => format!("{}|{}{}", &filename[..idx], label, &filename[idx..]),
        _ => format!("{filename}|{label}"),
    }
}

/// Subdirectory name for a keyword in batch mode: spaces become underscores.
pub fn keyword_dir(keyword: &str) -> String {
    keyword.trim().replace(' ', "_")
}
