// src/data/stepschedule.rs

//! A [`StepSchedule`] enumerates at which simulation steps each output
//! channel of a run is expected to appear: log lines every NPRINT steps,
//! trajectory frames every NSAVC steps, velocity frames every NSAVV steps,
//! independently.
//!
//! A [`FieldTuple`] is only in scope for the sink if its step matches the
//! schedule of its channel.
//!
//! [`FieldTuple`]: crate::data::field::FieldTuple

use crate::common::StepIndex;

use ::itertools::Itertools;
use ::more_asserts::debug_assert_le;
use ::si_trace_print::defñ;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OutputChannel, StepSchedule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Output channel of a trigger rule, deciding against which schedule list an
/// emitted tuple's step is checked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputChannel {
    /// Energy/property log rows; gated by the NPRINT schedule.
    Log,
    /// Trajectory (position) frames; gated by the NSAVC schedule.
    Trajectory,
    /// Velocity frames; gated by the NSAVV schedule.
    Velocity,
    /// Force frames; empty unless an interval was explicitly configured.
    Force,
    /// Control parameters and status flags; never step-gated.
    Control,
}

/// Per-channel sorted step lists for one command block.
///
/// Each enabled list is monotonically ascending, contains no repeated
/// entries, and includes both `0` and the final step count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepSchedule {
    pub log_steps: Vec<StepIndex>,
    pub traj_steps: Vec<StepIndex>,
    pub vel_steps: Vec<StepIndex>,
    pub force_steps: Vec<StepIndex>,
    /// Union of all channel lists, ascending.
    pub steps: Vec<StepIndex>,
}

/// `0, interval, 2*interval, ..., nstep` (final step always present).
fn interval_steps(
    nstep: StepIndex,
    interval: StepIndex,
) -> Vec<StepIndex> {
    debug_assert_le!(0, nstep);
    let mut steps: Vec<StepIndex> = (0..nstep)
        .step_by(interval as usize)
        .collect();
    steps.push(nstep);

    steps
}

impl StepSchedule {
    /// Build the schedule from control parameters of a `MINI`/`DYNA`
    /// command: total step count `nstep`, log interval `nprint`, trajectory
    /// save interval `nsavc`, velocity save interval `nsavv`, force save
    /// interval `nsavf`.
    ///
    /// A missing or non-positive `nprint` degrades the log channel to
    /// `[0, nstep]`; a missing or non-positive trajectory/velocity/force
    /// interval leaves that channel empty (disabled).
    pub fn from_control(
        nstep: StepIndex,
        nprint: Option<StepIndex>,
        nsavc: Option<StepIndex>,
        nsavv: Option<StepIndex>,
        nsavf: Option<StepIndex>,
    ) -> StepSchedule {
        defñ!("(nstep={} nprint={:?} nsavc={:?} nsavv={:?})", nstep, nprint, nsavc, nsavv);
        let nstep = nstep.max(0);
        let log_steps: Vec<StepIndex> = match nprint {
            Some(n) if n > 0 => interval_steps(nstep, n),
            _ => vec![0, nstep],
        };
        let traj_steps: Vec<StepIndex> = match nsavc {
            Some(n) if n > 0 => interval_steps(nstep, n),
            _ => Vec::new(),
        };
        let vel_steps: Vec<StepIndex> = match nsavv {
            Some(n) if n > 0 => interval_steps(nstep, n),
            _ => Vec::new(),
        };
        let force_steps: Vec<StepIndex> = match nsavf {
            Some(n) if n > 0 => interval_steps(nstep, n),
            _ => Vec::new(),
        };
        let steps: Vec<StepIndex> = log_steps
            .iter()
            .chain(traj_steps.iter())
            .chain(vel_steps.iter())
            .chain(force_steps.iter())
            .copied()
            .sorted()
            .dedup()
            .collect();

        StepSchedule {
            log_steps,
            traj_steps,
            vel_steps,
            force_steps,
            steps,
        }
    }

    /// Schedule of a single-point evaluation (`ENER`/`GETE`): one nominal
    /// step, `0`. The log channel is left ungated; energy tables print one
    /// row per evaluation, not per scheduled step.
    pub fn single_point() -> StepSchedule {
        StepSchedule {
            log_steps: Vec::new(),
            traj_steps: Vec::new(),
            vel_steps: Vec::new(),
            force_steps: Vec::new(),
            steps: vec![0],
        }
    }

    /// Is `step` in scope for `channel`?
    ///
    /// `Control` tuples are never step-gated. An empty log schedule (no
    /// control parameters were seen for the block) gates nothing out.
    pub fn in_scope(
        &self,
        channel: OutputChannel,
        step: StepIndex,
    ) -> bool {
        match channel {
            OutputChannel::Control => true,
            OutputChannel::Log => {
                self.log_steps.is_empty()
                    || self
                        .log_steps
                        .binary_search(&step)
                        .is_ok()
            }
            OutputChannel::Trajectory => self
                .traj_steps
                .binary_search(&step)
                .is_ok(),
            OutputChannel::Velocity => self
                .vel_steps
                .binary_search(&step)
                .is_ok(),
            OutputChannel::Force => self
                .force_steps
                .binary_search(&step)
                .is_ok(),
        }
    }

    /// Final step of the schedule, or `0` when nothing is scheduled.
    pub fn last_step(&self) -> StepIndex {
        self.steps
            .last()
            .copied()
            .unwrap_or(0)
    }
}
