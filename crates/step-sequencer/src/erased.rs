use crate::effects::{BoxedEffect, Effects};
use crate::step::Step;

pub(crate) trait ErasedStep<Ctx, Err>: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt_erased(&self, ctx: &Ctx, live: &Effects) -> Result<BoxedEffect, Err>;

    fn compensate_erased(&self, ctx: &Ctx, live: &Effects, effect: BoxedEffect)
    -> Result<(), Err>;

    fn compensation_description(&self) -> String;
}

pub(crate) struct StepWrapper<S> {
    step: S,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

impl<S> ErasedStep<S::Context, S::Error> for StepWrapper<S>
where
    S: Step,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    fn attempt_erased(&self, ctx: &S::Context, live: &Effects) -> Result<BoxedEffect, S::Error> {
        let effect = self.step.attempt(ctx, live)?;
        Ok(Box::new(effect))
    }

    fn compensate_erased(
        &self,
        ctx: &S::Context,
        live: &Effects,
        effect: BoxedEffect,
    ) -> Result<(), S::Error> {
        let typed_effect = effect
            .downcast::<S::Effect>()
            .expect("effect was produced by this step's attempt");
        self.step.compensate(ctx, live, *typed_effect)
    }

    fn compensation_description(&self) -> String {
        self.step.compensation_description()
    }
}
