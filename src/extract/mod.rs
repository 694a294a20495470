//! Bundle extraction.
//!
//! [`extract`] unpacks a zip into a directory under a [`Layout`]. It assumes
//! it owns the destination for the duration of the call; serialising
//! deployments and swapping the result into place is [`Site`](crate::Site)'s
//! job.
//!
//! Entries are processed in archive order and the first bad entry stops the
//! run. Whatever was written before that point stays in the destination,
//! which is why callers extract into a scratch directory.

mod error;
mod layout;
mod sanitize;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

pub use error::ExtractError;
pub use layout::{Layout, ParseLayoutError};

use layout::Rule;

const COPY_BUF: usize = 64 * 1024;

/// Totals for one successful extraction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExtractReport {
    pub files: usize,
    pub directories: usize,
    /// Entries outside the layout's scope, plus wrapper directories.
    pub skipped: usize,
    /// Payload bytes written to disk.
    pub bytes: u64,
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files, {} bytes", self.files, self.bytes)
    }
}

/// Unpacks the zip at `archive` into `destination`.
pub fn extract(
    archive: &Path,
    destination: &Path,
    layout: &Layout,
) -> Result<ExtractReport, ExtractError> {
    let file = File::open(archive).map_err(ExtractError::unreadable)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(ExtractError::unreadable)?;
    let rule = layout.rule(zip.file_names());

    fs::create_dir_all(destination).map_err(ExtractError::io_at(destination))?;

    let mut report = ExtractReport::default();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(ExtractError::unreadable)?;
        let name = entry.name().to_owned();

        sanitize::reject_rooted(&name)?;
        let target = match rule.apply(&name) {
            Some(remainder) => sanitize::resolve(destination, &name, remainder)?,
            None => None,
        };
        let Some(target) = target else {
            debug!(entry = %name, "skipped");
            report.skipped += 1;
            continue;
        };

        if entry.unix_mode().is_some_and(is_symlink) {
            return Err(ExtractError::traversal(&name));
        }

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(ExtractError::io_at(&target))?;
            report.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(ExtractError::io_at(parent))?;
        }
        let mut out = File::create(&target).map_err(ExtractError::io_at(&target))?;
        report.bytes += copy_entry(&mut entry, &mut out, &target)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))
                    .map_err(ExtractError::io_at(&target))?;
            }
        }

        report.files += 1;
    }

    if let Rule::Require(prefix) = rule {
        if report.files + report.directories == 0 {
            return Err(ExtractError::RequiredContentMissing { prefix });
        }
    }

    Ok(report)
}

fn is_symlink(mode: u32) -> bool {
    mode & 0o170000 == 0o120000
}

/// Streams one entry to disk. Read errors mean the archive is damaged; write
/// errors are ours.
fn copy_entry(entry: &mut impl Read, out: &mut File, path: &Path) -> Result<u64, ExtractError> {
    let mut buf = vec![0u8; COPY_BUF];
    let mut written = 0u64;
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExtractError::unreadable(e)),
        };
        out.write_all(&buf[..n]).map_err(ExtractError::io_at(path))?;
        written += n as u64;
    }
    out.flush().map_err(ExtractError::io_at(path))?;
    Ok(written)
}
