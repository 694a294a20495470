//! Zip-slip protection.
//!
//! Entry names are attacker-controlled. Nothing here touches the filesystem:
//! a name is accepted only if it resolves lexically to a path strictly below
//! the root.

use std::path::{Component, Path, PathBuf};

use super::error::ExtractError;

/// Rejects names that are rooted before any policy is applied:
/// `/etc/passwd`, `\\server\share`, `C:\Windows`, `C:relative`.
pub(crate) fn reject_rooted(name: &str) -> Result<(), ExtractError> {
    let bytes = name.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if name.starts_with(['/', '\\']) || drive || name.contains('\0') {
        return Err(ExtractError::traversal(name));
    }
    Ok(())
}

/// Resolves the mapped remainder of `entry` against `root`.
///
/// Returns `Ok(None)` when the remainder names nothing (`""`, `"./"`): that
/// is the wrapper directory itself and is skipped. A remainder that lands on
/// the root or above it is a traversal.
pub(crate) fn resolve(
    root: &Path,
    entry: &str,
    remainder: &str,
) -> Result<Option<PathBuf>, ExtractError> {
    let mut kept: Vec<&str> = Vec::new();
    let mut named = false;

    for segment in remainder.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                named = true;
                if kept.pop().is_none() {
                    return Err(ExtractError::traversal(entry));
                }
            }
            normal => {
                named = true;
                if !is_plain_segment(normal) {
                    return Err(ExtractError::traversal(entry));
                }
                kept.push(normal);
            }
        }
    }

    if !named {
        return Ok(None);
    }
    if kept.is_empty() {
        return Err(ExtractError::traversal(entry));
    }

    let resolved: PathBuf = kept.iter().fold(root.to_path_buf(), |path, s| path.join(s));
    debug_assert!(resolved.starts_with(root) && resolved != root);
    Ok(Some(resolved))
}

/// One `Normal` component and nothing else, on this platform's rules.
fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
