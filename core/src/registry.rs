// stepwise/src/registry.rs

//! `FlowRegistry<E>`: flows keyed by the type of their context.
//!
//! Each context type has at most one flow, so callers dispatch by building a
//! `Shared<T>` and handing it to `run`; the registry picks the flow for `T`.

use crate::core::control::Outcome;
use crate::core::Shared;
use crate::error::FlowError;
use crate::flow::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedFlow<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  fn flow_name(&self) -> &str;

  /// `ctx` must hold a `Shared<T>` for the wrapped flow's `T`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr>;
}

struct Registered<T, HookErr, AppErr>
where
  T: 'static + Send + Sync,
  HookErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Flow<T, HookErr>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<T, HookErr, AppErr> ErasedFlow<AppErr> for Registered<T, HookErr, AppErr>
where
  T: 'static + Send + Sync,
  HookErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HookErr> + From<FlowError> + Send + Sync + 'static,
{
  fn flow_name(&self) -> &str {
    self.flow.name()
  }

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr> {
    let typed = match ctx.downcast::<Shared<T>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        event!(Level::ERROR, flow = %self.flow.name(), "Context type mismatch in registry dispatch.");
        return Err(AppErr::from(FlowError::ContextMismatch {
          flow: self.flow.name().to_string(),
          expected: std::any::type_name::<T>().to_string(),
        }));
      }
    };
    self.flow.run(typed).await.map_err(AppErr::from)
  }
}

/// Type-keyed collection of flows returning `AppErr`.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its context type, replacing any earlier flow for
  /// the same type.
  pub fn register<T, HookErr>(&self, flow: Flow<T, HookErr>)
  where
    T: 'static + Send + Sync,
    HookErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HookErr>,
  {
    event!(
      Level::DEBUG,
      flow = %flow.name(),
      context_type = %std::any::type_name::<T>(),
      steps = ?flow.step_names(),
      "Registering flow."
    );
    let entry = Registered::<T, HookErr, AppErr> {
      flow,
      _app_err: PhantomData,
    };
    if let Some(previous) = self.flows.write().insert(TypeId::of::<T>(), Arc::new(entry)) {
      event!(Level::WARN, replaced = %previous.flow_name(), "Flow for this context type was replaced.");
    }
  }

  pub fn contains<T: 'static>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<T>())
  }

  pub fn flow_name<T: 'static>(&self) -> Option<String> {
    self
      .flows
      .read()
      .get(&TypeId::of::<T>())
      .map(|f| f.flow_name().to_string())
  }

  pub fn len(&self) -> usize {
    self.flows.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.flows.read().is_empty()
  }

  /// Runs the flow registered for `T` against `ctx`.
  #[instrument(name = "FlowRegistry::run", skip_all, fields(context_type = %std::any::type_name::<T>()))]
  pub async fn run<T>(&self, ctx: Shared<T>) -> Result<Outcome, AppErr>
  where
    T: 'static + Send + Sync,
  {
    let runner = self.flows.read().get(&TypeId::of::<T>()).cloned();
    let runner = runner.ok_or_else(|| {
      let context_type = std::any::type_name::<T>().to_string();
      event!(Level::ERROR, %context_type, "No flow registered.");
      AppErr::from(FlowError::NotRegistered { context_type })
    })?;
    runner.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
