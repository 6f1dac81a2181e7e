pub mod control;
pub mod hook;
pub mod shared;
pub mod step;

pub use control::{Control, Outcome};
pub use hook::{Hook, HookFuture, Phase};
pub use shared::Shared;
pub use step::{SkipPredicate, StepSpec};
