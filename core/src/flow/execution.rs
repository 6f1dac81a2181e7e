// stepwise/src/flow/execution.rs

//! `Flow::run`, the sequential executor.

use crate::core::control::{Control, Outcome};
use crate::core::hook::Phase;
use crate::core::Shared;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use tracing::{event, instrument, span, Instrument, Level};

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order against `ctx`.
  ///
  /// Per step: the skip predicate is checked first; a required step without
  /// hooks fails with `FlowError::MissingHandler`, an optional one is passed
  /// over. Hooks then run phase by phase (before, on, after). A `Halt` ends
  /// the run with `Outcome::Halted`. An error from a required step is
  /// returned as is; an error from an optional step is logged and the run
  /// moves on to the next step.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, context_type = %std::any::type_name::<T>(), steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: Shared<T>) -> Result<Outcome, E> {
    event!(Level::DEBUG, "Flow run starting.");

    'steps: for (index, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      if step.should_skip(&ctx) {
        event!(Level::INFO, step = step_name, "Step skipped by predicate.");
        continue;
      }

      if self.hook_count(step_name) == 0 {
        if step.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no hooks; passing over it.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no hooks.");
        return Err(E::from(FlowError::MissingHandler {
          flow: self.name.clone(),
          step: step.name.clone(),
        }));
      }

      for phase in Phase::ORDER {
        for (hook_index, hook) in self.hooks_for(step_name, phase).iter().enumerate() {
          let hook_span = span!(
            Level::DEBUG,
            "flow_hook",
            step = step_name,
            step_index = index,
            phase = phase.label(),
            hook_index
          );
          match hook(ctx.clone()).instrument(hook_span).await {
            Ok(Control::Proceed) => {}
            Ok(Control::Halt) => {
              event!(Level::INFO, step = step_name, phase = phase.label(), "Flow halted by hook.");
              return Ok(Outcome::Halted);
            }
            Err(e) if step.optional => {
              event!(Level::WARN, step = step_name, phase = phase.label(), error = %e, "Optional step failed; continuing.");
              continue 'steps;
            }
            Err(e) => {
              event!(Level::ERROR, step = step_name, phase = phase.label(), error = %e, "Hook failed.");
              return Err(e);
            }
          }
        }
      }
      event!(Level::DEBUG, step = step_name, "Step finished.");
    }

    event!(Level::DEBUG, "Flow run completed.");
    Ok(Outcome::Completed)
  }
}
