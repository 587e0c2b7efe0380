// src/data/transcript.rs

//! Implements a [`Transcript`], the immutable line store for one CHARMM
//! run log (or one candidate command-script file during the source-script
//! fallback scan).
//!
//! A `Transcript` is loaded once then never mutated. Navigation is done by
//! separate [`LineCursor`] instances; any number of cursors may traverse the
//! same `Transcript`.
//!
//! [`LineCursor`]: crate::readers::linecursor::LineCursor

use crate::common::{FPath, LineIndex};

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Result};
use std::path::{Path, PathBuf};

use ::si_trace_print::{defn, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transcript
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An ordered, line-indexed, finite sequence of text lines read from a
/// single log file. Immutable once loaded.
pub struct Transcript {
    /// Path of the loaded file. Empty for in-memory transcripts.
    path: FPath,
    /// Line store. Trailing newlines are stripped.
    lines: Vec<String>,
}

impl fmt::Debug for Transcript {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("path", &self.path)
            .field("lines", &self.lines.len())
            .finish()
    }
}

impl Transcript {
    /// Read the entire file at `path` into an addressable line store.
    ///
    /// The only fatal failure mode of the whole parse: an unreadable
    /// transcript returns the underlying [`std::io::Error`].
    pub fn load(path: &FPath) -> Result<Transcript> {
        defn!("({:?})", path);
        let file = File::open(Path::new(path.as_str()))?;
        let reader = BufReader::new(file);
        let mut lines: Vec<String> = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        defx!("loaded {} lines", lines.len());

        Ok(Transcript {
            path: path.clone(),
            lines,
        })
    }

    /// Create a `Transcript` from in-memory text. Used by tests and by
    /// replay passes over recorded line ranges.
    pub fn from_text(text: &str) -> Transcript {
        defñ!("({} bytes)", text.len());
        Transcript {
            path: FPath::default(),
            lines: text.lines().map(String::from).collect(),
        }
    }

    /// Path of the loaded file; empty for in-memory transcripts.
    pub fn path(&self) -> &FPath {
        &self.path
    }

    /// Directory containing the loaded file. Searched during the
    /// source-script fallback.
    pub fn parent_dir(&self) -> Option<PathBuf> {
        let path = Path::new(self.path.as_str());
        path.parent()
            .map(|p| p.to_path_buf())
    }

    /// The line at `index`, or `None` past the end.
    #[inline(always)]
    pub fn line(
        &self,
        index: LineIndex,
    ) -> Option<&str> {
        self.lines
            .get(index)
            .map(String::as_str)
    }

    /// `Count` of stored lines.
    #[inline(always)]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
