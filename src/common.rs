// src/common.rs
//
// common imports, type aliases, and other globals (avoids circular imports)

use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// file-handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `F`ake `Path` or `F`ile `Path`
pub type FPath = String;
pub type FPaths = Vec<FPath>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transcripts and LineCursor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Index of a line within a [`Transcript`], zero-based.
///
/// [`Transcript`]: crate::data::transcript::Transcript
pub type LineIndex = usize;

/// A general-purpose counter, used for internal statistics.
pub type Count = u64;

/// Index of a simulation step.
///
/// Signed because the running step counter begins at `-1`
/// ("before the zeroth step") until the first step table row is seen.
pub type StepIndex = i64;

/// Sentinel "no step seen yet" value for a running [`StepIndex`].
pub const STEP_UNSET: StepIndex = -1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// custom Result enum for cursor and scanner functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `Result` Extended, for line-advancing functions.
///
/// A three-state result: reading past the end of a bounded transcript is an
/// ordinary occurrence ([`Done`]), not an error.
///
/// [`Done`]: self::ResultNext#variant.Done
#[derive(Debug, PartialEq)]
pub enum ResultNext<T, E> {
    /// Contains the success data
    Found(T),
    /// Transcript is exhausted, nothing to return, but no bad errors happened
    Done,
    /// Contains the error value, something bad happened
    Err(E),
}

impl<T, E> ResultNext<T, E> {
    /// Returns `true` if the result is [`Found`, `Done`].
    #[allow(dead_code)]
    #[must_use = "if you intended to assert that this is ok, consider `.unwrap()` instead"]
    #[inline(always)]
    pub const fn is_ok(&self) -> bool {
        matches!(*self, ResultNext::Found(_) | ResultNext::Done)
    }

    /// Returns `true` if the result is [`Err`].
    #[allow(dead_code)]
    #[must_use = "if you intended to assert that this is err, consider `.unwrap_err()` instead"]
    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Returns `true` if the result is [`Found`].
    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(*self, ResultNext::Found(_))
    }

    /// Returns `true` if the result is [`Done`].
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(*self, ResultNext::Done)
    }

    /// Converts from `ResultNext<T, E>` to [`Option<T>`],
    /// consuming `self`, and discarding the error, if any.
    #[allow(dead_code)]
    #[inline(always)]
    pub fn ok(self) -> Option<T> {
        match self {
            ResultNext::Found(x) => Some(x),
            ResultNext::Done => None,
            ResultNext::Err(_) => None,
        }
    }

    /// Converts from `ResultNext<T, E>` to [`Option<E>`],
    /// consuming `self`, and discarding the success value, if any.
    #[allow(dead_code)]
    #[inline(always)]
    pub fn err(self) -> Option<E> {
        match self {
            ResultNext::Found(_) => None,
            ResultNext::Done => None,
            ResultNext::Err(x) => Some(x),
        }
    }
}

impl<T, E> fmt::Display for ResultNext<T, E>
where
    E: fmt::Display,
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ResultNext::Found(_) => {
                write!(f, "ResultNext::Found")
            }
            ResultNext::Done => {
                write!(f, "ResultNext::Done")
            }
            ResultNext::Err(err) => {
                write!(f, "ResultNext::Err({})", err)
            }
        }
    }
}
