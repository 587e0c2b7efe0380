// src/readers/helpers.rs

//! Helper functions for file paths and file probing.

use crate::common::{FPath, FPaths};

use std::fs::File;
use std::io::{Read, Result};
use std::path::Path;

use ::si_trace_print::defñ;

/// How many leading bytes of a candidate file are probed for binary content.
pub const BINARY_PROBE_SZ: usize = 1024;

/// Convert a `&Path` to a `FPath`, lossy.
pub fn path_to_fpath(path: &Path) -> FPath {
    path.to_string_lossy().into_owned()
}

/// Convert a `&FPath` to a `&Path`.
pub fn fpath_to_path(path: &FPath) -> &Path {
    Path::new(path.as_str())
}

/// The file name portion of `path`, or the empty string.
pub fn basename(path: &FPath) -> FPath {
    fpath_to_path(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Does the file at `path` look binary?
///
/// Probes the first [`BINARY_PROBE_SZ`] bytes for a NUL. Trajectory and
/// restart files sitting next to a run log are binary; they must never be
/// scanned as source-script candidates.
pub fn is_file_binary(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer: [u8; BINARY_PROBE_SZ] = [0; BINARY_PROBE_SZ];
    let sz = file.read(&mut buffer)?;
    let binary = buffer[..sz].contains(&0);
    defñ!("({:?}) probed {} bytes, binary {}", path, sz, binary);

    Ok(binary)
}

/// Regular files in `dir` other than `exclude`, as sorted `FPath`s.
///
/// The sorted name order makes the source-script candidate scan
/// deterministic regardless of directory-entry order.
pub fn list_sibling_files(
    dir: &Path,
    exclude: &FPath,
) -> Result<FPaths> {
    let mut paths: FPaths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let fpath = path_to_fpath(&entry.path());
        if &fpath == exclude {
            continue;
        }
        paths.push(fpath);
    }
    paths.sort();
    defñ!("({:?}) {} files", dir, paths.len());

    Ok(paths)
}
