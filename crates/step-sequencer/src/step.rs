use std::marker::PhantomData;

use crate::effects::Effects;

/// A fallible unit of work paired with the action that reverses it.
///
/// A successful [`attempt`](Step::attempt) produces an `Effect`: a token for
/// whatever the step changed (an allocated resource, a written file, a held
/// permission). The effect is handed back by value to
/// [`compensate`](Step::compensate), so compensation can only ever run
/// against an effect that was actually produced, and only once.
///
/// # Type Parameters
///
/// - `Effect`: Token for the live side effect of a successful attempt
/// - `Context`: Shared dependencies (injected, identical for every step)
/// - `Error`: The error type for step and compensation failures
pub trait Step: Send + Sync {
    /// Token describing the side effect left behind by a successful attempt.
    type Effect: Send + Sync + 'static;

    /// Shared context providing dependencies.
    type Context;

    /// Error type for step failures.
    type Error;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Perform the forward action.
    ///
    /// `live` contains the effects of every earlier step in the sequence, all
    /// of which are still in place while this step runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the forward action fails. A failed attempt must
    /// leave nothing behind: it is never compensated.
    fn attempt(&self, ctx: &Self::Context, live: &Effects) -> Result<Self::Effect, Self::Error>;

    /// Reverse the effect produced by [`attempt`](Step::attempt).
    ///
    /// Runs with every later step already compensated and every earlier step
    /// still live (visible through `live`).
    ///
    /// The default implementation drops the effect, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the effect could not be reversed. This is treated
    /// as unrecoverable by the sequencer.
    fn compensate(
        &self,
        ctx: &Self::Context,
        live: &Effects,
        effect: Self::Effect,
    ) -> Result<(), Self::Error> {
        let _ = (ctx, live, effect);
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}

/// Compensation used by [`FnStep`] until one is supplied.
pub struct NoCompensation;

/// A [`Step`] assembled from closures.
///
/// Created with [`from_fn`]; attach an undo action with
/// [`with_compensation`](FnStep::with_compensation).
pub struct FnStep<Ctx, Eff, Err, A, C = NoCompensation> {
    name: &'static str,
    attempt: A,
    compensate: C,
    description: Option<String>,
    _phantom: PhantomData<fn(&Ctx) -> Result<Eff, Err>>,
}

/// Build a step from an attempt closure.
///
/// ```
/// use step_sequencer::{Effects, step};
///
/// let open = step::from_fn("open", |_ctx: &(), _live: &Effects| Ok::<_, ()>(3_u32))
///     .with_compensation(|_ctx: &(), _live: &Effects, fd: u32| {
///         let _ = fd;
///         Ok(())
///     });
/// # let _ = open;
/// ```
pub fn from_fn<Ctx, Eff, Err, A>(name: &'static str, attempt: A) -> FnStep<Ctx, Eff, Err, A>
where
    A: Fn(&Ctx, &Effects) -> Result<Eff, Err>,
{
    FnStep {
        name,
        attempt,
        compensate: NoCompensation,
        description: None,
        _phantom: PhantomData,
    }
}

impl<Ctx, Eff, Err, A, C> FnStep<Ctx, Eff, Err, A, C> {
    /// Attach the action that reverses this step's effect.
    #[must_use]
    pub fn with_compensation<F>(self, compensate: F) -> FnStep<Ctx, Eff, Err, A, F>
    where
        F: Fn(&Ctx, &Effects, Eff) -> Result<(), Err>,
    {
        FnStep {
            name: self.name,
            attempt: self.attempt,
            compensate,
            description: self.description,
            _phantom: PhantomData,
        }
    }

    /// Override the default `"undo <name>"` compensation description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Closure-backed compensation, implemented for [`NoCompensation`] and any
/// matching `Fn`.
pub trait Compensation<Ctx, Eff, Err>: Send + Sync {
    /// Reverse `effect`.
    ///
    /// # Errors
    ///
    /// Returns an error if the effect could not be reversed.
    fn call(&self, ctx: &Ctx, live: &Effects, effect: Eff) -> Result<(), Err>;
}

impl<Ctx, Eff, Err> Compensation<Ctx, Eff, Err> for NoCompensation {
    fn call(&self, _ctx: &Ctx, _live: &Effects, _effect: Eff) -> Result<(), Err> {
        Ok(())
    }
}

impl<Ctx, Eff, Err, F> Compensation<Ctx, Eff, Err> for F
where
    F: Fn(&Ctx, &Effects, Eff) -> Result<(), Err> + Send + Sync,
{
    fn call(&self, ctx: &Ctx, live: &Effects, effect: Eff) -> Result<(), Err> {
        self(ctx, live, effect)
    }
}

impl<Ctx, Eff, Err, A, C> Step for FnStep<Ctx, Eff, Err, A, C>
where
    Eff: Send + Sync + 'static,
    A: Fn(&Ctx, &Effects) -> Result<Eff, Err> + Send + Sync,
    C: Compensation<Ctx, Eff, Err>,
{
    type Effect = Eff;
    type Context = Ctx;
    type Error = Err;

    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, ctx: &Ctx, live: &Effects) -> Result<Eff, Err> {
        (self.attempt)(ctx, live)
    }

    fn compensate(&self, ctx: &Ctx, live: &Effects, effect: Eff) -> Result<(), Err> {
        self.compensate.call(ctx, live, effect)
    }

    fn compensation_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("undo {}", self.name))
    }
}
