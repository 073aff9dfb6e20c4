//! Centralized filename handling for uploads, results, and renames.
//!
//! Every name that arrives from a client passes through [`bare_filename`]
//! before it touches the filesystem, so `../../etc/passwd` and
//! `C:\\temp\\x.png` both collapse to their last component.
//!
//! ## Generated names
//!
//! - Enhanced results: `enhanced_<stem>_<millis><ext>`, e.g. `cat.jpg`
//!   uploaded at `1700000000123` becomes `enhanced_cat_1700000000123.jpg`.
//! - Stored originals: `<field>-<millis>-<nonce><ext>`.
//!
//! ## Extensions
//!
//! An extension is everything from the last `.` of the bare name, provided
//! that dot is not the first character: `photo.tar.png` → `.png`,
//! `.hidden` → none, `README` → none.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NamingError {
    #[error("filename is empty")]
    Empty,
    #[error("'{0}' is not a valid filename")]
    Invalid(String),
}

/// URL prefix under which enhanced images are served.
pub const RESULTS_URL_PREFIX: &str = "/results";

/// Strip any directory part, treating both `/` and `\` as separators.
pub fn bare_filename(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .trim()
}

/// Like [`bare_filename`], but rejects names that cannot address a file.
/// Hidden names (leading `.`) are rejected too; the stores keep staging
/// files under them.
pub fn sanitize(name: &str) -> Result<&str, NamingError> {
    let bare = bare_filename(name);
    match bare {
        "" => Err(NamingError::Empty),
        _ if bare.starts_with('.') => Err(NamingError::Invalid(bare.to_string())),
        _ => Ok(bare),
    }
}

/// Split a bare filename into stem and extension (extension keeps its dot).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Lowercased extension without the dot, e.g. `"JPG"` → `"jpg"`.
pub fn extension_lower(name: &str) -> String {
    split_extension(bare_filename(name))
        .1
        .trim_start_matches('.')
        .to_ascii_lowercase()
}

/// Name for the enhanced copy of an uploaded file.
pub fn enhanced_filename(original: &str, timestamp_ms: i64) -> String {
    let (stem, ext) = split_extension(bare_filename(original));
    format!("enhanced_{stem}_{timestamp_ms}{ext}")
}

/// Name under which an uploaded original is kept.
pub fn upload_filename(field: &str, original: &str, timestamp_ms: i64, nonce: &str) -> String {
    let (_, ext) = split_extension(bare_filename(original));
    format!("{field}-{timestamp_ms}-{nonce}{ext}")
}

/// Source and destination of a rename, both already sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: String,
    pub destination: String,
}

/// Resolve a rename request into bare filenames.
///
/// The destination always ends with the source's extension: when the
/// requested name carries a different one (or none), the source's
/// extension is appended.
pub fn resolve_rename(old: &str, new: &str) -> Result<RenamePlan, NamingError> {
    let source = sanitize(old)?;
    let requested = sanitize(new)?;

    let (_, old_ext) = split_extension(source);
    let (_, new_ext) = split_extension(requested);

    let destination = if new_ext == old_ext {
        requested.to_string()
    } else {
        format!("{requested}{old_ext}")
    };

    Ok(RenamePlan {
        source: source.to_string(),
        destination,
    })
}

/// Archives are never bundled into other archives.
pub fn is_archive(name: &str) -> bool {
    name.ends_with(".zip")
}

/// Public URL of a file in the results store.
pub fn results_url(filename: &str) -> String {
    format!("{RESULTS_URL_PREFIX}/{filename}")
}

/// Replace any query string with a `t=<token>` cache buster.
pub fn cache_busted(url: &str, token: i64) -> String {
    let base = url.split_once('?').map_or(url, |(base, _)| base);
    format!("{base}?t={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_filename_strips_unix_dirs() {
        assert_eq!(bare_filename("../../etc/passwd"), "passwd");
        assert_eq!(bare_filename("/abs/path/cat.png"), "cat.png");
    }

    #[test]
    fn bare_filename_strips_windows_dirs() {
        assert_eq!(bare_filename("C:\\temp\\cat.png"), "cat.png");
    }

    #[test]
    fn bare_filename_ignores_trailing_separator() {
        assert_eq!(bare_filename("dir/cat.png/"), "cat.png");
    }

    #[test]
    fn sanitize_rejects_dot_names() {
        assert_eq!(sanitize(""), Err(NamingError::Empty));
        assert_eq!(sanitize("a/"), Ok("a"));
        assert_eq!(sanitize("x/.."), Err(NamingError::Invalid("..".into())));
        assert_eq!(sanitize("   "), Err(NamingError::Empty));
        assert_eq!(
            sanitize(".pending-a.png"),
            Err(NamingError::Invalid(".pending-a.png".into()))
        );
    }

    #[test]
    fn split_extension_variants() {
        assert_eq!(split_extension("cat.png"), ("cat", ".png"));
        assert_eq!(split_extension("photo.tar.png"), ("photo.tar", ".png"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
    }

    #[test]
    fn extension_lower_normalizes_case() {
        assert_eq!(extension_lower("IMG_001.JPG"), "jpg");
        assert_eq!(extension_lower("noext"), "");
    }

    #[test]
    fn enhanced_filename_pattern() {
        assert_eq!(
            enhanced_filename("cat.jpg", 1700000000123),
            "enhanced_cat_1700000000123.jpg"
        );
        assert_eq!(
            enhanced_filename("uploads/my photo.PNG", 5),
            "enhanced_my photo_5.PNG"
        );
    }

    #[test]
    fn upload_filename_keeps_extension() {
        assert_eq!(
            upload_filename("files", "dog.webp", 42, "abc"),
            "files-42-abc.webp"
        );
    }

    #[test]
    fn rename_appends_missing_extension() {
        let plan = resolve_rename("enhanced_cat_123.png", "kitty").unwrap();
        assert_eq!(plan.source, "enhanced_cat_123.png");
        assert_eq!(plan.destination, "kitty.png");
    }

    #[test]
    fn rename_keeps_matching_extension() {
        let plan = resolve_rename("a.png", "b.png").unwrap();
        assert_eq!(plan.destination, "b.png");
    }

    #[test]
    fn rename_appends_when_extension_differs() {
        let plan = resolve_rename("a.png", "b.jpg").unwrap();
        assert_eq!(plan.destination, "b.jpg.png");
    }

    #[test]
    fn rename_always_ends_with_source_extension() {
        for requested in ["x", "x.png", "x.PNG", "x.gif", "dir/x", "..\\x.tar"] {
            let plan = resolve_rename("enhanced_a_1.png", requested).unwrap();
            assert!(
                plan.destination.ends_with(".png"),
                "{requested} → {}",
                plan.destination
            );
        }
    }

    #[test]
    fn rename_strips_traversal_from_both_names() {
        let plan = resolve_rename("../secret.png", "../../kitty").unwrap();
        assert_eq!(plan.source, "secret.png");
        assert_eq!(plan.destination, "kitty.png");
    }

    #[test]
    fn rename_rejects_empty_names() {
        assert_eq!(resolve_rename("", "x"), Err(NamingError::Empty));
        assert_eq!(resolve_rename("a.png", "dir/"), Ok(RenamePlan {
            source: "a.png".into(),
            destination: "dir.png".into(),
        }));
    }

    #[test]
    fn archive_detection() {
        assert!(is_archive("enhanced_images.zip"));
        assert!(!is_archive("zip.png"));
    }

    #[test]
    fn cache_busting_replaces_query() {
        assert_eq!(cache_busted("/results/a.png", 7), "/results/a.png?t=7");
        assert_eq!(cache_busted("/results/a.png?t=1", 9), "/results/a.png?t=9");
    }
}
