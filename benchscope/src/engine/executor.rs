//! Hierarchical executor that drives a plan through the context tree.

use super::{BenchmarkAction, BenchmarkPlan, ClassPlan, ExecutionSummary, NodeOutcome};
use crate::config::{ConfigurationParameters, ExecutionSettings};
use crate::context::{BenchmarkClassContext, EngineContext, ExecutionContext, NodeContext};
use crate::descriptor::{BenchmarkMethodDescriptor, Descriptor};
use crate::errors::BenchscopeError;
use crate::listener::{ExecutionListener, ExecutionResult};
use crate::store::panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens, runs and closes contexts for every node of a [`BenchmarkPlan`].
///
/// Contexts open parent before children and close children before parent.
/// Every context is closed whatever the outcome of its subtree; a failed
/// close turns the node's result into a failure.
#[derive(Clone)]
pub struct HierarchicalExecutor {
    listener: Arc<dyn ExecutionListener>,
    configuration: Arc<dyn ConfigurationParameters>,
    settings: ExecutionSettings,
}

impl HierarchicalExecutor {
    /// Creates an executor, resolving its settings from `configuration`.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::Config` if an execution flag is malformed.
    pub fn new(
        listener: Arc<dyn ExecutionListener>,
        configuration: Arc<dyn ConfigurationParameters>,
    ) -> Result<Self, BenchscopeError> {
        let settings = ExecutionSettings::from_parameters(configuration.as_ref())?;
        Ok(Self {
            listener,
            configuration,
            settings,
        })
    }

    /// Returns the resolved settings.
    #[must_use]
    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// Runs the plan on the calling thread, one class after another.
    ///
    /// The `parallel` setting is ignored here; use
    /// [`execute_async`](Self::execute_async) for concurrent classes.
    pub fn execute(&self, plan: &BenchmarkPlan, action: &dyn BenchmarkAction) -> ExecutionSummary {
        let engine = self.open_engine(plan);
        let scope = ContextScope::new(&*engine);
        self.listener.execution_started(&**engine.descriptor());
        let mut outcomes = Vec::with_capacity(plan.node_count());

        let setup = invoke(|| action.before_all(&engine));
        match &setup {
            Ok(()) => {
                for class in plan.classes() {
                    outcomes.extend(self.run_class(&engine, class, action));
                }
            }
            Err(message) => {
                outcomes.extend(self.abort_classes(plan, &format!("engine setup failed: {message}")));
            }
        }

        self.finish_engine(scope, &engine, setup, outcomes)
    }

    /// Runs the plan on tokio's blocking pool.
    ///
    /// When `benchscope.execution.parallel` is true every class subtree runs
    /// in its own blocking task; otherwise the whole plan runs in one.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::Internal` if a blocking task could not be
    /// joined. The engine context is still closed in that case.
    pub async fn execute_async(
        &self,
        plan: Arc<BenchmarkPlan>,
        action: Arc<dyn BenchmarkAction>,
    ) -> Result<ExecutionSummary, BenchscopeError> {
        if !self.settings.parallel {
            let executor = self.clone();
            return tokio::task::spawn_blocking(move || executor.execute(&plan, action.as_ref()))
                .await
                .map_err(|e| BenchscopeError::Internal(format!("executor task failed: {e}")));
        }

        let engine = self.open_engine(&plan);
        let scope = ContextScope::new(&*engine);
        self.listener.execution_started(&**engine.descriptor());
        let mut outcomes = Vec::with_capacity(plan.node_count());

        let setup = {
            let engine = Arc::clone(&engine);
            let action = Arc::clone(&action);
            tokio::task::spawn_blocking(move || invoke(|| action.before_all(&engine)))
                .await
                .unwrap_or_else(|e| Err(format!("setup task failed: {e}")))
        };

        let mut join_failure = None;
        match &setup {
            Ok(()) => {
                let handles: Vec<_> = plan
                    .classes()
                    .iter()
                    .map(|class| {
                        let executor = self.clone();
                        let engine = Arc::clone(&engine);
                        let action = Arc::clone(&action);
                        let class = class.clone();
                        tokio::task::spawn_blocking(move || {
                            executor.run_class(&engine, &class, action.as_ref())
                        })
                    })
                    .collect();

                for handle in handles {
                    match handle.await {
                        Ok(class_outcomes) => outcomes.extend(class_outcomes),
                        Err(e) => {
                            warn!(error = %e, "Class task failed to join");
                            join_failure.get_or_insert_with(|| {
                                BenchscopeError::Internal(format!("class task failed: {e}"))
                            });
                        }
                    }
                }
            }
            Err(message) => {
                outcomes.extend(self.abort_classes(&plan, &format!("engine setup failed: {message}")));
            }
        }

        let summary = self.finish_engine(scope, &engine, setup, outcomes);
        match join_failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    fn open_engine(&self, plan: &BenchmarkPlan) -> Arc<EngineContext> {
        let engine = Arc::new(NodeContext::new(
            None,
            Arc::clone(&self.listener),
            Arc::new(plan.engine().clone()),
            Arc::clone(&self.configuration),
        ));
        info!(
            unique_id = %engine.unique_id(),
            classes = plan.classes().len(),
            parallel = self.settings.parallel,
            fail_fast = self.settings.fail_fast,
            "Starting benchmark run"
        );
        engine
    }

    fn finish_engine(
        &self,
        scope: ContextScope<'_>,
        engine: &Arc<EngineContext>,
        setup: Result<(), String>,
        mut outcomes: Vec<NodeOutcome>,
    ) -> ExecutionSummary {
        let result = match setup {
            Ok(()) => ExecutionResult::Successful,
            Err(message) => ExecutionResult::failed(message),
        };
        let result = scope.close_into(result);
        self.listener
            .execution_finished(&**engine.descriptor(), &result);
        outcomes.push(NodeOutcome {
            unique_id: engine.unique_id().clone(),
            result,
        });

        let summary = ExecutionSummary::from_outcomes(outcomes);
        info!(
            successful = summary.successful_count(),
            failed = summary.failed_count(),
            aborted = summary.aborted_count(),
            "Finished benchmark run"
        );
        summary
    }

    fn run_class(
        &self,
        engine: &Arc<EngineContext>,
        plan: &ClassPlan,
        action: &dyn BenchmarkAction,
    ) -> Vec<NodeOutcome> {
        let class = Arc::new(engine.child(Arc::new(plan.descriptor().clone())));
        let scope = ContextScope::new(&*class);
        self.listener.execution_started(&**class.descriptor());
        debug!(unique_id = %class.unique_id(), methods = plan.methods().len(), "Running class");

        let mut outcomes = Vec::with_capacity(plan.methods().len() + 1);
        let result = match invoke(|| action.before_class(&class)) {
            Ok(()) => {
                let mut abort_reason: Option<String> = None;
                for method in plan.methods() {
                    let result = match &abort_reason {
                        Some(reason) => self.skip_method(method, reason),
                        None => self.run_method(&class, method, action),
                    };
                    if self.settings.fail_fast && abort_reason.is_none() && result.is_failed() {
                        abort_reason = Some(format!("fail-fast after {}", method.display_name()));
                    }
                    outcomes.push(NodeOutcome {
                        unique_id: method.unique_id().clone(),
                        result,
                    });
                }
                ExecutionResult::Successful
            }
            Err(message) => {
                let reason = format!("class setup failed: {message}");
                for method in plan.methods() {
                    outcomes.push(NodeOutcome {
                        unique_id: method.unique_id().clone(),
                        result: self.skip_method(method, &reason),
                    });
                }
                ExecutionResult::failed(message)
            }
        };

        let result = scope.close_into(result);
        self.listener
            .execution_finished(&**class.descriptor(), &result);
        outcomes.push(NodeOutcome {
            unique_id: class.unique_id().clone(),
            result,
        });
        outcomes
    }

    fn run_method(
        &self,
        class: &Arc<BenchmarkClassContext>,
        descriptor: &BenchmarkMethodDescriptor,
        action: &dyn BenchmarkAction,
    ) -> ExecutionResult {
        let method = class.child(Arc::new(descriptor.clone()));
        let scope = ContextScope::new(&method);
        self.listener.execution_started(descriptor);

        let result = match invoke(|| action.run_method(&method)) {
            Ok(()) => ExecutionResult::Successful,
            Err(message) => {
                warn!(unique_id = %method.unique_id(), error = %message, "Benchmark method failed");
                ExecutionResult::failed(message)
            }
        };

        let result = scope.close_into(result);
        self.listener.execution_finished(descriptor, &result);
        result
    }

    fn skip_method(&self, descriptor: &BenchmarkMethodDescriptor, reason: &str) -> ExecutionResult {
        let result = ExecutionResult::aborted(reason);
        self.listener.execution_finished(descriptor, &result);
        result
    }

    fn abort_classes(&self, plan: &BenchmarkPlan, reason: &str) -> Vec<NodeOutcome> {
        let mut outcomes = Vec::new();
        for class in plan.classes() {
            let nodes = class
                .methods()
                .iter()
                .map(|m| m as &dyn Descriptor)
                .chain(std::iter::once(class.descriptor() as &dyn Descriptor));
            for node in nodes {
                let result = ExecutionResult::aborted(reason);
                self.listener.execution_finished(node, &result);
                outcomes.push(NodeOutcome {
                    unique_id: node.unique_id().clone(),
                    result,
                });
            }
        }
        outcomes
    }
}

impl std::fmt::Debug for HierarchicalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalExecutor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Runs a user callback, mapping errors and panics to a message.
fn invoke(f: impl FnOnce() -> anyhow::Result<()>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Keeps a context open for one node and closes it exactly once.
///
/// If the node's run unwinds before `close_into` is reached, the context is
/// closed on drop and any release failure is logged.
struct ContextScope<'a> {
    context: Option<&'a dyn ExecutionContext>,
}

impl<'a> ContextScope<'a> {
    fn new(context: &'a dyn ExecutionContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Closes the context and folds a release failure into `result`.
    fn close_into(mut self, result: ExecutionResult) -> ExecutionResult {
        let Some(context) = self.context.take() else {
            return result;
        };
        match context.close() {
            Ok(()) => result,
            Err(err) => match result {
                ExecutionResult::Failed { message } => {
                    ExecutionResult::failed(format!("{message}; {err}"))
                }
                _ => ExecutionResult::failed(err.to_string()),
            },
        }
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        warn!(unique_id = %context.unique_id(), "Closing context after an interrupted run");
        if let Err(err) = context.close() {
            warn!(unique_id = %context.unique_id(), error = %err, "Failed to close interrupted context");
        }
    }
}
