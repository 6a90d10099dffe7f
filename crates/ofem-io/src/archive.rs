//! `.ofem` result archives.
//!
//! A solver job named `<base>` leaves its input deck and binary byproducts
//! next to each other (`<base>.gldat`, `<base>_gl.bin`, ...). After each run
//! they are packed into `<base>.ofem` and removed; before post-processing
//! they are unpacked again.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ArchiveError;

/// A file that may be stored in a job archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Appended to the job base path and to the stem inside the archive
    pub suffix: &'static str,
    pub required: bool,
    pub compression: CompressionMethod,
}

const fn member(suffix: &'static str, required: bool, compression: CompressionMethod) -> ArchiveMember {
    ArchiveMember {
        suffix,
        required,
        compression,
    }
}

/// Every member known to the archive, in write order.
pub const MEMBERS: [ArchiveMember; 12] = [
    member(".gldat", true, CompressionMethod::Deflated),
    member(".cmdat", false, CompressionMethod::Deflated),
    member(".log", false, CompressionMethod::Deflated),
    member("_gl.bin", true, CompressionMethod::Stored),
    member("_re.bin", true, CompressionMethod::Stored),
    member("_di.bin", true, CompressionMethod::Stored),
    member("_sd.bin", true, CompressionMethod::Stored),
    member("_st.bin", false, CompressionMethod::Deflated),
    member("_rs.csv", false, CompressionMethod::Deflated),
    member("_avgst.csv", false, CompressionMethod::Deflated),
    member("_elst.csv", false, CompressionMethod::Deflated),
    member("_di.csv", false, CompressionMethod::Deflated),
];

/// `<base><suffix>`, e.g. `runs/slab` + `_gl.bin`.
pub fn member_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

pub fn archive_path(base: impl AsRef<Path>) -> PathBuf {
    member_path(base.as_ref(), ".ofem")
}

fn job_stem(base: &Path) -> String {
    base.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Pack the byproducts of job `base` into `<base>.ofem` and delete them.
///
/// Required members are checked before anything is written. If writing the
/// archive fails, the partial archive is removed and the byproducts are left
/// in place.
pub fn compress_job(base: impl AsRef<Path>) -> Result<PathBuf, ArchiveError> {
    let base = base.as_ref();
    let mut present = Vec::new();
    for member in &MEMBERS {
        let path = member_path(base, member.suffix);
        if path.is_file() {
            present.push((member, path));
        } else if member.required {
            return Err(ArchiveError::MissingMember(path));
        }
    }

    let target = archive_path(base);
    let stem = job_stem(base);
    if let Err(err) = write_archive(&target, &stem, &present) {
        if target.exists() && fs::remove_file(&target).is_err() {
            warn!(path = %target.display(), "could not remove partial archive");
        }
        return Err(err);
    }

    for (_, path) in &present {
        fs::remove_file(path).map_err(io_error(path))?;
    }
    info!(
        archive = %target.display(),
        members = present.len(),
        "job files archived"
    );
    Ok(target)
}

fn write_archive(
    target: &Path,
    stem: &str,
    members: &[(&ArchiveMember, PathBuf)],
) -> Result<(), ArchiveError> {
    let file = File::create(target).map_err(io_error(target))?;
    let mut zip = ZipWriter::new(file);
    for (member, path) in members {
        let options = SimpleFileOptions::default().compression_method(member.compression);
        zip.start_file(format!("{stem}{}", member.suffix), options)?;
        let mut source = File::open(path).map_err(io_error(path))?;
        io::copy(&mut source, &mut zip).map_err(io_error(path))?;
        debug!(member = member.suffix, "archived");
    }
    zip.finish()?;
    Ok(())
}

/// Restore the known members of `<base>.ofem` next to it. Unknown entries
/// are ignored. Returns the restored paths.
pub fn extract_job(base: impl AsRef<Path>) -> Result<Vec<PathBuf>, ArchiveError> {
    let base = base.as_ref();
    let source = archive_path(base);
    let file = File::open(&source).map_err(io_error(&source))?;
    let mut archive = ZipArchive::new(file)?;
    let stem = job_stem(base);

    let mut restored = Vec::new();
    for member in &MEMBERS {
        let name = format!("{stem}{}", member.suffix);
        let mut entry = match archive.by_name(&name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                if member.required {
                    warn!(member = %name, "required member absent from archive");
                }
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let path = member_path(base, member.suffix);
        let mut out = File::create(&path).map_err(io_error(&path))?;
        io::copy(&mut entry, &mut out).map_err(io_error(&path))?;
        restored.push(path);
    }
    info!(archive = %source.display(), restored = restored.len(), "job files extracted");
    Ok(restored)
}

/// Delete the byproducts of job `base` without archiving them. Missing
/// optional files are skipped.
pub fn remove_job_files(base: impl AsRef<Path>) -> Result<(), ArchiveError> {
    let base = base.as_ref();
    for member in &MEMBERS {
        let path = member_path(base, member.suffix);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound && !member.required => {}
            Err(source) => return Err(ArchiveError::Io { path, source }),
        }
    }
    Ok(())
}
