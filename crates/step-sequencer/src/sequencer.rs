use std::fmt::Debug;

use tracing::{debug, error, warn};

use crate::audit::AuditLog;
use crate::effects::Effects;
use crate::erased::ErasedStep;
use crate::error::{CompensationError, SequenceError, UnwindCause};
use crate::mode::Mode;

pub(crate) struct Check<Ctx> {
    pub(crate) name: &'static str,
    pub(crate) predicate: Box<dyn Fn(&Ctx) -> bool + Send + Sync>,
}

/// Result of a run: the core's value on success, the reason otherwise.
pub type Outcome<T, E> = Result<Completion<T>, SequenceError<E>>;

/// A successful run.
#[derive(Debug)]
pub struct Completion<T> {
    value: T,
    effects: Effects,
}

impl<T> Completion<T> {
    /// The value computed by the core.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Effects left in place by the run.
    ///
    /// In [`Mode::Factory`] these are the committed effects of every step;
    /// in [`Mode::Scoped`] this is always empty.
    #[must_use]
    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Drop the effect handles and keep the core's value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into the core's value and the committed effects.
    #[must_use]
    pub fn into_parts(self) -> (T, Effects) {
        (self.value, self.effects)
    }
}

/// An ordered list of steps protecting a core computation.
///
/// Steps are attempted in order. If one fails, every step that already
/// succeeded is compensated in reverse order (the failed step itself never
/// is) and the run fails. If all succeed, the core runs and the [`Mode`]
/// decides whether the step effects are kept or unwound.
///
/// A sequencer holds no per-run state and can be run any number of times.
pub struct Sequencer<Ctx, Err> {
    checks: Vec<Check<Ctx>>,
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    mode: Mode,
}

impl<Ctx, Err> Sequencer<Ctx, Err>
where
    Err: Debug,
{
    pub(crate) fn new(
        checks: Vec<Check<Ctx>>,
        steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
        mode: Mode,
    ) -> Self {
        Self {
            checks,
            steps,
            mode,
        }
    }

    /// Mode applied to every run of this sequencer.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Validation check names in evaluation order.
    #[must_use]
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name).collect()
    }

    /// Run the sequence around an infallible core computation.
    ///
    /// The core sees the effects of every step.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ValidationFailed` if a check rejects the inputs.
    /// Returns `SequenceError::StepFailed` if a step fails and all earlier steps were compensated.
    /// Returns `SequenceError::CompensationFailed` if a compensation fails during an unwind.
    pub fn run<T, F>(&self, ctx: &Ctx, core: F) -> Outcome<T, Err>
    where
        F: FnOnce(&Ctx, &Effects) -> T,
    {
        let (outcome, _audit_log) = self.execute_internal(ctx, |ctx, live| Ok(core(ctx, live)));
        outcome
    }

    /// Run the sequence and return both the outcome and an audit log.
    pub fn run_with_audit<T, F>(&self, ctx: &Ctx, core: F) -> (Outcome<T, Err>, AuditLog)
    where
        F: FnOnce(&Ctx, &Effects) -> T,
    {
        self.execute_internal(ctx, |ctx, live| Ok(core(ctx, live)))
    }

    /// Run the sequence around a fallible core computation.
    ///
    /// A failing core is handled like a failing step after the last one:
    /// every step is compensated, from the last down to the first.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run), plus `SequenceError::CoreFailed` if the
    /// core fails and all steps were compensated.
    pub fn try_run<T, F>(&self, ctx: &Ctx, core: F) -> Outcome<T, Err>
    where
        F: FnOnce(&Ctx, &Effects) -> Result<T, Err>,
    {
        let (outcome, _audit_log) = self.execute_internal(ctx, core);
        outcome
    }

    /// [`try_run`](Self::try_run) returning an audit log as well.
    pub fn try_run_with_audit<T, F>(&self, ctx: &Ctx, core: F) -> (Outcome<T, Err>, AuditLog)
    where
        F: FnOnce(&Ctx, &Effects) -> Result<T, Err>,
    {
        self.execute_internal(ctx, core)
    }

    fn execute_internal<T, F>(&self, ctx: &Ctx, core: F) -> (Outcome<T, Err>, AuditLog)
    where
        F: FnOnce(&Ctx, &Effects) -> Result<T, Err>,
    {
        let mut audit_log = AuditLog::new();

        if let Some(check) = self.checks.iter().find(|check| !(check.predicate)(ctx)) {
            warn!(check = check.name, "validation rejected inputs; no step attempted");
            let error = SequenceError::ValidationFailed {
                check: check.name.to_string(),
            };
            return (Err(error), audit_log);
        }

        let mut live = Effects::new();

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            audit_log.record_start(index, name);
            debug!(step = name, index, "attempting step");

            match step.attempt_erased(ctx, &live) {
                Ok(effect) => {
                    audit_log.record_success(index, step.compensation_description());
                    live.push(index, name, effect);
                }
                Err(step_error) => {
                    audit_log.record_failure(index);
                    warn!(
                        step = name,
                        index,
                        error = ?step_error,
                        completed = live.len(),
                        "step failed; unwinding completed steps"
                    );
                    let error = match self.unwind(ctx, &mut audit_log, &mut live) {
                        Ok(()) => SequenceError::StepFailed {
                            step: name.to_string(),
                            index,
                            source: step_error,
                        },
                        Err(failure) => SequenceError::CompensationFailed {
                            cause: UnwindCause::StepFailed {
                                step: name.to_string(),
                                index,
                                error: step_error,
                            },
                            failure,
                            stranded: live,
                        },
                    };
                    return (Err(error), audit_log);
                }
            }
        }

        debug!(steps = self.steps.len(), mode = %self.mode, "all steps succeeded; running core");

        let value = match core(ctx, &live) {
            Ok(value) => value,
            Err(core_error) => {
                warn!(error = ?core_error, "core computation failed; unwinding all steps");
                let error = match self.unwind(ctx, &mut audit_log, &mut live) {
                    Ok(()) => SequenceError::CoreFailed { source: core_error },
                    Err(failure) => SequenceError::CompensationFailed {
                        cause: UnwindCause::CoreFailed(core_error),
                        failure,
                        stranded: live,
                    },
                };
                return (Err(error), audit_log);
            }
        };

        if self.mode.unwinds_on_success() {
            debug!(steps = live.len(), "scoped run complete; releasing all steps");
            if let Err(failure) = self.unwind(ctx, &mut audit_log, &mut live) {
                warn!("scoped release failed; discarding core value");
                let error = SequenceError::CompensationFailed {
                    cause: UnwindCause::ScopeExit,
                    failure,
                    stranded: live,
                };
                return (Err(error), audit_log);
            }
        }

        (
            Ok(Completion {
                value,
                effects: live,
            }),
            audit_log,
        )
    }

    /// Compensate live effects from the most recent down to the first.
    ///
    /// Stops at the first compensation that fails; `live` then holds the
    /// effects below it.
    fn unwind(
        &self,
        ctx: &Ctx,
        audit_log: &mut AuditLog,
        live: &mut Effects,
    ) -> Result<(), CompensationError<Err>> {
        while let Some((index, effect)) = live.pop() {
            let step = &self.steps[index];
            let name = step.name();
            debug!(step = name, index, "compensating step");

            if let Err(compensation_error) = step.compensate_erased(ctx, live, effect) {
                audit_log.record_compensation_failed(index);
                let description = step.compensation_description();
                error!(
                    step = name,
                    index,
                    description = %description,
                    error = ?compensation_error,
                    stranded = live.len(),
                    "compensation failed; unwind halted"
                );
                return Err(CompensationError {
                    step: name.to_string(),
                    index,
                    description,
                    error: compensation_error,
                });
            }

            audit_log.record_compensated(index);
        }

        Ok(())
    }
}
