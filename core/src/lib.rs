// src/lib.rs

//! stepwise: a small async step pipeline engine.
//!
//! A `Flow<T, E>` is an ordered list of named steps over a shared context
//! `Shared<T>`. Each step runs `before`, `on` and `after` hooks; any hook can
//! halt the run or fail it. Steps can be optional (failures are logged and
//! skipped) or carry a skip predicate. A `FlowRegistry<E>` keys flows by their
//! context type so request handlers only build a context and call `run`.

pub mod core;
pub mod error;
pub mod flow;
pub mod registry;

pub use crate::core::control::{Control, Outcome};
pub use crate::core::hook::{Hook, HookFuture, Phase};
pub use crate::core::shared::Shared;
pub use crate::core::step::{SkipPredicate, StepSpec};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
