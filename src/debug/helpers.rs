// src/debug/helpers.rs

//! Miscellaneous helper functions for testing.

use crate::common::FPath;
use crate::readers::helpers::path_to_fpath;

use std::fs::File;
use std::io::Write; // for `NamedTempFile.write_all`
use std::path::PathBuf;

use ::lazy_static::lazy_static;
use ::si_trace_print::defñ;
#[doc(hidden)]
pub use ::tempfile::tempdir;
#[doc(hidden)]
pub use ::tempfile::NamedTempFile;
#[doc(hidden)]
pub use ::tempfile::TempDir;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// temporary file helper functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// NamedTempFile instances default to this file name prefix.
pub const STR_TEMPFILE_PREFIX: &str = "tmp-clex-test-";

lazy_static! {
    pub static ref STRING_TEMPFILE_PREFIX: String = String::from(STR_TEMPFILE_PREFIX);
    static ref STRING_TEMPFILE_SUFFIX: String = String::from("");
}

/// Small helper function for copying `NamedTempFile` path to a `FPath`.
pub fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
    FPath::from(ntf.path().to_str().unwrap())
}

/// Testing helper function to write a `str` to a temporary file.
pub fn create_temp_file(data: &str) -> NamedTempFile {
    create_temp_file_with_name(data, None, None)
}

/// Testing helper function to write a `str` to a specially-named
/// temporary file.
pub fn create_temp_file_with_name(
    data: &str,
    prefix: Option<&String>,
    suffix: Option<&String>,
) -> NamedTempFile {
    let mut ntf = match ::tempfile::Builder::new()
        .prefix::<str>(
            prefix
                .unwrap_or(&STRING_TEMPFILE_PREFIX)
                .as_ref(),
        )
        .suffix::<str>(
            suffix
                .unwrap_or(&STRING_TEMPFILE_SUFFIX)
                .as_ref(),
        )
        .tempfile()
    {
        Ok(val) => val,
        Err(err) => {
            panic!("tempfile::Builder::new()..tempfile() return Err {}", err);
        }
    };
    match ntf.write_all(data.as_bytes()) {
        Ok(_) => {}
        Err(err) => {
            panic!("NamedTempFile::write_all() return Err {}", err);
        }
    }

    ntf
}

/// Create a temporary directory.
pub fn create_temp_dir() -> TempDir {
    defñ!();
    ::tempfile::tempdir().unwrap()
}

/// Testing helper function to write `data` to file `name` within `tempdir`,
/// returning the created file's `FPath`.
///
/// The source-script fallback searches a transcript's sibling files, so its
/// tests must lay out a whole directory, not lone temp files.
pub fn create_file_in_dir(
    data: &[u8],
    name: &str,
    tempdir: &TempDir,
) -> FPath {
    let pathb: PathBuf = tempdir.path().join(name);
    defñ!("({:?})", pathb);
    let mut file = match File::create(&pathb) {
        Ok(val) => val,
        Err(err) => {
            panic!("File::create({:?}) return Err {}", pathb, err);
        }
    };
    match file.write_all(data) {
        Ok(_) => {}
        Err(err) => {
            panic!("File::write_all() return Err {}", err);
        }
    }

    path_to_fpath(&pathb)
}
