use std::fmt::Debug;

use crate::erased::{ErasedStep, StepWrapper};
use crate::mode::Mode;
use crate::sequencer::{Check, Sequencer};
use crate::step::Step;

/// Builder for a [`Sequencer`].
///
/// Validation checks run in the order they are added, then steps run in the
/// order they are added. The mode defaults to [`Mode::Factory`].
///
/// # Compile-time Type Safety
///
/// Every step must share the sequencer's context and error types:
///
/// ```compile_fail
/// use step_sequencer::{Effects, SequencerBuilder, Step};
///
/// struct Alloc;
/// impl Step for Alloc {
///     type Effect = Vec<u8>;
///     type Context = ();
///     type Error = String;
///     fn name(&self) -> &'static str { "alloc" }
///     fn attempt(&self, _: &(), _: &Effects) -> Result<Vec<u8>, String> {
///         Ok(vec![0; 16])
///     }
/// }
///
/// struct Open;
/// impl Step for Open {
///     type Effect = u32;
///     type Context = ();
///     type Error = std::io::Error;  // Not String!
///     fn name(&self) -> &'static str { "open" }
///     fn attempt(&self, _: &(), _: &Effects) -> Result<u32, std::io::Error> {
///         Ok(3)
///     }
/// }
///
/// // This should fail: Open's error type differs from Alloc's
/// let sequencer = SequencerBuilder::new()
///     .step(Alloc)
///     .step(Open)  // Compile error here!
///     .build();
/// ```
pub struct SequencerBuilder<Ctx, Err> {
    checks: Vec<Check<Ctx>>,
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    mode: Mode,
}

impl<Ctx, Err> SequencerBuilder<Ctx, Err> {
    /// Create a new builder with no checks and no steps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            steps: Vec::new(),
            mode: Mode::default(),
        }
    }

    /// Add a named validation check.
    ///
    /// Checks must be pure: they run before any step and a `false` result
    /// rejects the run without side effects.
    #[must_use]
    pub fn validate<F>(mut self, name: &'static str, predicate: F) -> Self
    where
        F: Fn(&Ctx) -> bool + Send + Sync + 'static,
    {
        self.checks.push(Check {
            name,
            predicate: Box::new(predicate),
        });
        self
    }

    /// Append a step to the sequence.
    #[must_use]
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: Step<Context = Ctx, Error = Err> + 'static,
    {
        self.steps.push(Box::new(StepWrapper::new(step)));
        self
    }

    /// Select what happens to step effects after the core runs.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the sequencer from the accumulated checks and steps.
    #[must_use]
    pub fn build(self) -> Sequencer<Ctx, Err>
    where
        Err: Debug,
    {
        Sequencer::new(self.checks, self.steps, self.mode)
    }
}

impl<Ctx, Err> Default for SequencerBuilder<Ctx, Err> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effects;

    #[derive(Debug, PartialEq)]
    struct TestError(String);

    struct Reserve;

    impl Step for Reserve {
        type Effect = u32;
        type Context = ();
        type Error = TestError;

        fn name(&self) -> &'static str {
            "reserve"
        }

        fn attempt(&self, _ctx: &(), _live: &Effects) -> Result<u32, TestError> {
            Ok(1)
        }
    }

    struct Label;

    impl Step for Label {
        type Effect = String;
        type Context = ();
        type Error = TestError;

        fn name(&self) -> &'static str {
            "label"
        }

        fn attempt(&self, _ctx: &(), _live: &Effects) -> Result<String, TestError> {
            Ok(String::from("tag"))
        }
    }

    #[test]
    fn builder_defaults_to_factory_mode() {
        let sequencer: Sequencer<(), TestError> = SequencerBuilder::new().build();
        assert_eq!(sequencer.mode(), Mode::Factory);
        assert!(sequencer.is_empty());
    }

    #[test]
    fn builder_accepts_steps_with_different_effect_types() {
        let sequencer: Sequencer<(), TestError> = SequencerBuilder::new()
            .step(Reserve)
            .step(Label)
            .step(Reserve)
            .mode(Mode::Scoped)
            .build();

        assert_eq!(sequencer.len(), 3);
        assert_eq!(sequencer.step_names(), vec!["reserve", "label", "reserve"]);
        assert_eq!(sequencer.mode(), Mode::Scoped);
    }

    #[test]
    fn builder_keeps_checks_in_order() {
        let sequencer: Sequencer<i32, TestError> = SequencerBuilder::new()
            .validate("positive", |value: &i32| *value > 0)
            .validate("even", |value: &i32| value % 2 == 0)
            .build();

        assert_eq!(sequencer.check_names(), vec!["positive", "even"]);
    }
}
