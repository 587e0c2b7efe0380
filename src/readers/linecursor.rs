// src/readers/linecursor.rs

//! Implements a [`LineCursor`], a cheap repositionable view over a
//! [`Transcript`].
//!
//! A cursor holds a position, not data; any number of cursors may traverse
//! the same `Transcript` concurrently, and a line range visited once can be
//! replayed by a second cursor bounded to that range. The scanners rely on
//! this: the block scan walks the whole transcript once, then the field
//! extraction replays each block's recorded range.
//!
//! [`Transcript`]: crate::data::transcript::Transcript

use crate::common::{LineIndex, ResultNext};
use crate::data::transcript::Transcript;

use std::ops::Range;

use ::more_asserts::debug_assert_le;
use ::si_trace_print::{defn, defo, defx, defñ};

/// Advancing past the end of the cursor's range is ordinary ([`Done`]), so
/// the error type is never inhabited in practice; it is
/// [`std::io::Error`] for uniformity with the loading layer.
///
/// [`Done`]: crate::common::ResultNext#variant.Done
pub type ResultLine<'a> = ResultNext<(LineIndex, &'a str), std::io::Error>;

/// A repositionable, bounded, replayable view over a [`Transcript`].
pub struct LineCursor<'a> {
    transcript: &'a Transcript,
    /// Line range this cursor may visit. Always within the transcript.
    range: Range<LineIndex>,
    /// Next line to be returned by [`LineCursor::next_line`].
    index: LineIndex,
    /// Start of the recording begun by [`LineCursor::begin_recording`].
    recording_beg: Option<LineIndex>,
}

impl<'a> LineCursor<'a> {
    /// A cursor over the whole of `transcript`, positioned at line `0`.
    pub fn new(transcript: &'a Transcript) -> LineCursor<'a> {
        defñ!("{:?}", transcript);
        LineCursor {
            transcript,
            range: 0..transcript.line_count(),
            index: 0,
            recording_beg: None,
        }
    }

    /// A cursor bounded to `range` of `transcript`, positioned at the range
    /// start. Used to replay a recorded line range.
    pub fn over(
        transcript: &'a Transcript,
        range: Range<LineIndex>,
    ) -> LineCursor<'a> {
        defn!("{:?} {:?}", transcript, range);
        let end = range.end.min(transcript.line_count());
        let beg = range.start.min(end);
        defx!("bounded to {}..{}", beg, end);

        LineCursor {
            transcript,
            range: beg..end,
            index: beg,
            recording_beg: None,
        }
    }

    /// Current position; the index the next [`next_line`] call will return.
    ///
    /// [`next_line`]: LineCursor::next_line
    #[inline(always)]
    pub fn index(&self) -> LineIndex {
        self.index
    }

    /// One past the last line this cursor may visit.
    #[inline(always)]
    pub fn end(&self) -> LineIndex {
        self.range.end
    }

    /// Reposition to absolute line `index`, clamped to the cursor's range.
    pub fn seek(
        &mut self,
        index: LineIndex,
    ) {
        defo!("seek({})", index);
        self.index = index.clamp(self.range.start, self.range.end);
    }

    /// The line `n` ahead of the current position without advancing.
    /// `peek(0)` is the line [`next_line`] would return.
    ///
    /// [`next_line`]: LineCursor::next_line
    pub fn peek(
        &self,
        n: usize,
    ) -> Option<&'a str> {
        let index = self.index.checked_add(n)?;
        if index >= self.range.end {
            return None;
        }

        self.transcript.line(index)
    }

    /// Return the line at the current position and advance by one.
    pub fn next_line(&mut self) -> ResultLine<'a> {
        if self.index >= self.range.end {
            return ResultNext::Done;
        }
        let index = self.index;
        self.index += 1;
        match self.transcript.line(index) {
            Some(line) => ResultNext::Found((index, line)),
            // unreachable while `range` is within the transcript
            None => ResultNext::Done,
        }
    }

    /// Mark the current position as the start of a recording.
    pub fn begin_recording(&mut self) {
        defo!("begin_recording at {}", self.index);
        self.recording_beg = Some(self.index);
    }

    /// End the recording begun by [`begin_recording`], returning the
    /// visited line range (start inclusive, current position exclusive).
    /// Without a prior `begin_recording` the range is empty.
    ///
    /// [`begin_recording`]: LineCursor::begin_recording
    pub fn end_recording(&mut self) -> Range<LineIndex> {
        let beg = self.recording_beg.take().unwrap_or(self.index);
        debug_assert_le!(beg, self.index);
        defo!("end_recording {}..{}", beg, self.index);

        beg..self.index
    }

    /// A new cursor replaying `range` of the same transcript.
    pub fn replay(
        &self,
        range: Range<LineIndex>,
    ) -> LineCursor<'a> {
        LineCursor::over(self.transcript, range)
    }
}
