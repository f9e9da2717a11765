//! # Clyde behavior
//!
//! Everything that decides what to say: the [`Session`] that owns all
//! mutable state, ordered [`BehaviorRule`]s evaluated by the
//! [`BehaviorPipeline`], the [`CatTracker`] state machine and the
//! [`IdleBehavior`] run on timer ticks.

pub mod cat;
pub mod idle;
pub mod pipeline;
pub mod rule;
pub mod rules;
pub mod session;

pub use cat::{CatAction, CatState, CatTracker};
pub use idle::IdleBehavior;
pub use pipeline::{BehaviorPipeline, Dispatch};
pub use rule::{BehaviorRule, Capability, Captures, Response, RuleOutcome, StoreRef};
pub use rules::seed_rules;
pub use session::{Session, StatePaths};
