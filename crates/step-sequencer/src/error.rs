use std::fmt::Debug;

use thiserror::Error;

use crate::effects::Effects;

/// Error from a failed compensation operation.
#[derive(Debug, thiserror::Error)]
#[error("compensation failed for step '{step}' (#{index}): {description}")]
pub struct CompensationError<E> {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Position of the step in the sequence.
    pub index: usize,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Why an unwind was started.
#[derive(Debug)]
#[non_exhaustive]
pub enum UnwindCause<E> {
    /// A step's forward action failed.
    StepFailed {
        /// Name of the step that failed.
        step: String,
        /// Position of the step in the sequence.
        index: usize,
        /// The error that caused the step to fail.
        error: E,
    },
    /// The core computation failed after every step succeeded.
    CoreFailed(E),
    /// A Scoped run finished its core and was releasing every step.
    ///
    /// The core's value is discarded: a run that leaves effects behind never
    /// reports success.
    ScopeExit,
}

/// Error from a sequencer run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError<E: Debug> {
    /// A validation check rejected the inputs. No step was attempted.
    #[error("validation check '{check}' failed")]
    ValidationFailed {
        /// Name of the check that rejected the inputs.
        check: String,
    },

    /// A step failed and every earlier step was compensated.
    #[error("step '{step}' (#{index}) failed")]
    StepFailed {
        /// Name of the step that failed.
        step: String,
        /// Position of the step in the sequence.
        index: usize,
        /// The error that caused the step to fail.
        #[source]
        source: E,
    },

    /// The core computation failed and every step was compensated.
    #[error("core computation failed")]
    CoreFailed {
        /// The error returned by the core computation.
        #[source]
        source: E,
    },

    /// A compensation failed while unwinding; the unwind stopped there.
    ///
    /// This is not recoverable by the sequencer: effects below the failed
    /// step are still live and are handed back in `stranded`.
    #[error("{failure}; {} effect(s) left in place", stranded.len())]
    CompensationFailed {
        /// What started the unwind.
        cause: UnwindCause<E>,
        /// The compensation that failed.
        failure: CompensationError<E>,
        /// Effects of the steps below the failed one, still live.
        stranded: Effects,
    },
}

impl<E: Debug> SequenceError<E> {
    /// Whether this error left side effects behind.
    ///
    /// Only a failed compensation does; every other failure has been fully
    /// rolled back.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CompensationFailed { .. })
    }

    /// Index of the step whose forward action failed, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            Self::StepFailed { index, .. }
            | Self::CompensationFailed {
                cause: UnwindCause::StepFailed { index, .. },
                ..
            } => Some(*index),
            _ => None,
        }
    }
}
