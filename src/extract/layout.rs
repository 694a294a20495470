//! How archive entry names map onto the site root.
//!
//! Bundles arrive packaged in different ways: a build tool zips its `dist/`
//! folder, a CI job wraps everything in `project-1.2.0/`, someone runs `zip -r`
//! from inside the output directory. [`Layout`] picks one interpretation at
//! startup; the extractor never guesses per request.

use std::fmt;
use std::str::FromStr;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Name-mapping policy for bundle entries.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Layout {
    /// Only entries under `<prefix>/` are deployed, with the prefix removed.
    /// Everything else is ignored, and a bundle with nothing under the prefix
    /// is rejected.
    Prefix(String),
    /// Drop the first path segment of every entry that has one to spare.
    StripFirst,
    /// Drop the leading directory only when every entry shares it.
    StripCommon,
    /// Use entry names unchanged.
    Verbatim,
}

impl Layout {
    /// Fixes the policy for one archive. `StripCommon` needs to see every
    /// name up front; the others ignore `names`.
    pub(crate) fn rule<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Rule {
        match self {
            Self::Prefix(prefix) => Rule::Require(prefix.clone()),
            Self::StripFirst => Rule::StripFirst,
            Self::Verbatim => Rule::Keep,
            Self::StripCommon => {
                if has_common_wrapper(names) {
                    Rule::StripFirst
                } else {
                    Rule::Keep
                }
            }
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::Prefix("dist".to_owned())
    }
}

/// Error from parsing a `BUNDLE_LAYOUT` value.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid bundle layout '{0}': expected prefix:<dir>, strip-first, strip-common or verbatim")]
pub struct ParseLayoutError(String);

/// Accepts `prefix:<dir>`, `strip-first`, `strip-common` and `verbatim`.
/// `<dir>` may span several segments (`prefix:build/web`).
impl FromStr for Layout {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseLayoutError(s.to_owned());
        match s.trim() {
            "strip-first" => Ok(Self::StripFirst),
            "strip-common" => Ok(Self::StripCommon),
            "verbatim" => Ok(Self::Verbatim),
            other => {
                let prefix = other.strip_prefix("prefix:").ok_or_else(invalid)?;
                let segments: Vec<&str> = prefix
                    .split(SEPARATORS)
                    .filter(|s| !s.is_empty())
                    .collect();
                if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
                    return Err(invalid());
                }
                Ok(Self::Prefix(segments.join("/")))
            }
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "prefix:{prefix}"),
            Self::StripFirst => f.write_str("strip-first"),
            Self::StripCommon => f.write_str("strip-common"),
            Self::Verbatim => f.write_str("verbatim"),
        }
    }
}

// ── Per-archive rule ──────────────────────────────────────────────────────────

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Rule {
    Require(String),
    StripFirst,
    Keep,
}

impl Rule {
    /// Returns the part of `name` to place under the root, or `None` when the
    /// entry is outside the policy's scope.
    pub(crate) fn apply<'n>(&self, name: &'n str) -> Option<&'n str> {
        match self {
            Self::Keep => Some(name),
            Self::StripFirst => Some(name.split_once(SEPARATORS).map_or(name, |(_, rest)| rest)),
            Self::Require(prefix) => under_prefix(name, prefix),
        }
    }
}

fn under_prefix<'n>(name: &'n str, prefix: &str) -> Option<&'n str> {
    let mut rest = name.trim_start_matches("./");
    for segment in prefix.split('/') {
        rest = rest.strip_prefix(segment)?;
        rest = rest.strip_prefix(SEPARATORS)?;
    }
    Some(rest)
}

/// True when every name sits inside one and the same top-level directory.
fn has_common_wrapper<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    let mut common: Option<&str> = None;
    for name in names {
        let Some((head, _)) = name.split_once(SEPARATORS) else {
            return false;
        };
        if head.is_empty() || head == "." || head == ".." {
            return false;
        }
        match common {
            None => common = Some(head),
            Some(c) if c == head => {}
            Some(_) => return false,
        }
    }
    common.is_some()
}
