//! Ordered fallible steps with reverse-order compensation.
//!
//! A [`Sequencer`] runs a list of [`Step`]s in order and then a core
//! computation. If any step fails, every step that already succeeded is
//! compensated in strict reverse order, so the caller never sees partial
//! state. The [`Mode`] decides what happens after a successful run: a
//! [`Mode::Factory`] run keeps every effect, a [`Mode::Scoped`] run unwinds
//! them all once the core has finished.
//!
//! ```
//! use step_sequencer::{Effects, Mode, SequenceError, SequencerBuilder, step};
//!
//! let sequencer = SequencerBuilder::new()
//!     .validate("non-empty", |name: &String| !name.is_empty())
//!     .step(
//!         step::from_fn("lock", |name: &String, _live: &Effects| Ok::<_, String>(name.len()))
//!             .with_compensation(|_name: &String, _live: &Effects, _len: usize| Ok(())),
//!     )
//!     .mode(Mode::Scoped)
//!     .build();
//!
//! let completion = sequencer
//!     .run(&String::from("report"), |name, live| {
//!         assert_eq!(live.get::<usize>(0), Some(&6));
//!         name.to_uppercase()
//!     })
//!     .expect("all steps succeed");
//! assert_eq!(completion.value(), "REPORT");
//! assert!(completion.effects().is_empty());
//!
//! let rejected = sequencer.run(&String::new(), |_name, _live| String::new());
//! assert!(matches!(rejected, Err(SequenceError::ValidationFailed { .. })));
//! ```

mod audit;
mod builder;
mod effects;
mod erased;
mod error;
mod mode;
mod sequencer;
pub mod step;

pub use audit::{AuditLog, StepRecord, StepStatus};
pub use builder::SequencerBuilder;
pub use effects::Effects;
pub use error::{CompensationError, SequenceError, UnwindCause};
pub use mode::{Mode, ParseModeError};
pub use sequencer::{Completion, Outcome, Sequencer};
pub use step::Step;
