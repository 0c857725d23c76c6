//! Integration tests for hierarchical execution.

#[cfg(test)]
mod tests {
    use crate::config::{MapConfigurationParameters, FAIL_FAST_KEY, PARALLEL_KEY};
    use crate::context::{BenchmarkClassContext, BenchmarkMethodContext, EngineContext, ExecutionContext};
    use crate::descriptor::{Descriptor, EngineDescriptor, UniqueId};
    use crate::engine::{BenchmarkAction, BenchmarkPlan, HierarchicalExecutor};
    use crate::errors::{BenchscopeError, ListenerError};
    use crate::listener::{
        ExecutionListener, ExecutionResult, ListenerEvent, RecordingListener, ReportEntry,
    };
    use crate::store::{CloseableResource, Namespace};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixture {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl CloseableResource for Fixture {
        fn close(&self) -> anyhow::Result<()> {
            self.log.lock().push(self.name.clone());
            if self.fail {
                anyhow::bail!("{} did not shut down", self.name);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct ScriptedAction {
        releases: Arc<Mutex<Vec<String>>>,
        ran: Mutex<Vec<String>>,
        engine_setups: AtomicUsize,
        fail_setup: bool,
        failing_class: Option<&'static str>,
        failing_methods: Vec<&'static str>,
        panicking_methods: Vec<&'static str>,
        leaking_methods: Vec<&'static str>,
    }

    impl ScriptedAction {
        fn fixture(&self, name: String, fail: bool) -> Fixture {
            Fixture {
                name,
                log: Arc::clone(&self.releases),
                fail,
            }
        }

        fn ran(&self) -> Vec<String> {
            self.ran.lock().clone()
        }

        fn releases(&self) -> Vec<String> {
            self.releases.lock().clone()
        }
    }

    /// Panics when a node whose display name starts with `fail_on` starts.
    struct PanickingListener {
        fail_on: &'static str,
    }

    impl ExecutionListener for PanickingListener {
        fn execution_started(&self, descriptor: &dyn Descriptor) {
            if descriptor.display_name().starts_with(self.fail_on) {
                panic!("listener rejected {}", descriptor.display_name());
            }
        }

        fn reporting_entry_published(
            &self,
            _descriptor: &dyn Descriptor,
            _entry: &ReportEntry,
        ) -> Result<(), ListenerError> {
            Ok(())
        }
    }

    fn ns() -> Namespace {
        Namespace::create(["fixtures"])
    }

    impl BenchmarkAction for ScriptedAction {
        fn before_all(&self, engine: &EngineContext) -> anyhow::Result<()> {
            self.engine_setups.fetch_add(1, Ordering::SeqCst);
            if self.fail_setup {
                anyhow::bail!("no benchmark harness available");
            }
            engine
                .store(ns())
                .get_or_compute("engine", |_| self.fixture("engine".to_string(), false))?;
            Ok(())
        }

        fn before_class(&self, class: &BenchmarkClassContext) -> anyhow::Result<()> {
            let name = class.benchmark_class().simple_name().to_string();
            if self.failing_class == Some(name.as_str()) {
                anyhow::bail!("cannot load {name}");
            }
            class
                .store(ns())
                .get_or_compute("class", |_| self.fixture(name.clone(), false))?;
            Ok(())
        }

        fn run_method(&self, method: &BenchmarkMethodContext) -> anyhow::Result<()> {
            let name = method.benchmark_method().method_name.clone();
            self.ran.lock().push(name.clone());

            let store = method.store(ns());
            anyhow::ensure!(store.contains("engine"), "engine fixture not visible");
            anyhow::ensure!(store.contains("class"), "class fixture not visible");

            if self.leaking_methods.contains(&name.as_str()) {
                store.get_or_compute("method", |_| self.fixture(name.clone(), true))?;
            }
            if self.panicking_methods.contains(&name.as_str()) {
                panic!("{name} blew up");
            }
            if self.failing_methods.contains(&name.as_str()) {
                anyhow::bail!("{name} regressed");
            }

            method.publish_report_value("ops", "1000")?;
            Ok(())
        }
    }

    fn plan() -> BenchmarkPlan {
        let plan = BenchmarkPlan::new(EngineDescriptor::new("benchscope", "Benchscope"));
        let parser = plan
            .class("com.acme.ParserBench")
            .with_method("tokenize")
            .with_method("parse")
            .with_method("render");
        let codec = plan.class("com.acme.CodecBench").with_method("encode");
        plan.with_class(parser).with_class(codec)
    }

    fn executor(
        listener: &Arc<RecordingListener>,
        params: MapConfigurationParameters,
    ) -> HierarchicalExecutor {
        HierarchicalExecutor::new(listener.clone(), Arc::new(params)).unwrap()
    }

    fn method_id(plan: &BenchmarkPlan, class: usize, method: usize) -> UniqueId {
        plan.classes()[class].methods()[method].unique_id().clone()
    }

    #[test]
    fn test_sequential_run_succeeds() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction::default();
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        assert!(summary.is_successful());
        assert_eq!(summary.outcomes().len(), plan.node_count());
        assert_eq!(action.ran(), vec!["tokenize", "parse", "render", "encode"]);
        assert_eq!(
            summary.outcomes().last().map(|o| o.unique_id.clone()),
            Some(plan.engine().unique_id().clone())
        );
        assert_eq!(listener.published_entries().len(), 4);
    }

    #[test]
    fn test_contexts_open_before_and_close_after_children() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction::default();
        let plan = plan();

        executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        let events = listener.events();
        assert_eq!(
            events.first(),
            Some(&ListenerEvent::Started(plan.engine().unique_id().clone()))
        );
        assert_eq!(
            events.last(),
            Some(&ListenerEvent::Finished(
                plan.engine().unique_id().clone(),
                ExecutionResult::Successful
            ))
        );

        let class_id = plan.classes()[0].descriptor().unique_id().clone();
        let class_finished = events
            .iter()
            .position(|e| matches!(e, ListenerEvent::Finished(id, _) if *id == class_id))
            .unwrap();
        let last_method_finished = events
            .iter()
            .position(|e| matches!(e, ListenerEvent::Finished(id, _) if *id == method_id(&plan, 0, 2)))
            .unwrap();
        assert!(last_method_finished < class_finished);

        assert_eq!(
            action.releases(),
            vec!["ParserBench", "CodecBench", "engine"]
        );
    }

    #[test]
    fn test_failing_method_does_not_stop_siblings() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            failing_methods: vec!["parse"],
            ..ScriptedAction::default()
        };
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.aborted_count(), 0);
        assert_eq!(action.ran(), vec!["tokenize", "parse", "render", "encode"]);
        assert_eq!(
            summary.result_for(&method_id(&plan, 0, 1)),
            Some(&ExecutionResult::failed("parse regressed"))
        );
        assert_eq!(
            summary.result_for(plan.classes()[0].descriptor().unique_id()),
            Some(&ExecutionResult::Successful)
        );
    }

    #[test]
    fn test_fail_fast_aborts_remaining_methods() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            failing_methods: vec!["tokenize"],
            ..ScriptedAction::default()
        };
        let plan = plan();
        let params = MapConfigurationParameters::new().with(FAIL_FAST_KEY, "true");

        let summary = executor(&listener, params).execute(&plan, &action);

        assert_eq!(action.ran(), vec!["tokenize", "encode"]);
        assert_eq!(summary.aborted_count(), 2);
        assert!(matches!(
            summary.result_for(&method_id(&plan, 0, 2)),
            Some(ExecutionResult::Aborted { reason }) if reason.contains("tokenize()")
        ));
        assert_eq!(
            listener.result_for(&method_id(&plan, 1, 0)),
            Some(ExecutionResult::Successful)
        );
    }

    #[test]
    fn test_release_failure_fails_the_node() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            leaking_methods: vec!["render"],
            ..ScriptedAction::default()
        };
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        match summary.result_for(&method_id(&plan, 0, 2)) {
            Some(ExecutionResult::Failed { message }) => {
                assert!(message.contains("render did not shut down"));
                assert!(message.contains("[method:render()]"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(action.releases().contains(&"render".to_string()));
        assert_eq!(summary.failed_count(), 1);
    }

    #[test]
    fn test_panicking_method_is_contained() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            panicking_methods: vec!["encode"],
            ..ScriptedAction::default()
        };
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        assert!(matches!(
            summary.result_for(&method_id(&plan, 1, 0)),
            Some(ExecutionResult::Failed { message }) if message.contains("encode blew up")
        ));
        assert!(action.releases().contains(&"CodecBench".to_string()));
    }

    #[test]
    fn test_class_setup_failure_aborts_its_methods() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            failing_class: Some("ParserBench"),
            ..ScriptedAction::default()
        };
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        assert_eq!(action.ran(), vec!["encode"]);
        assert_eq!(summary.aborted_count(), 3);
        assert_eq!(
            summary.result_for(plan.classes()[0].descriptor().unique_id()),
            Some(&ExecutionResult::failed("cannot load ParserBench"))
        );
    }

    #[test]
    fn test_engine_setup_failure_aborts_everything() {
        let listener = Arc::new(RecordingListener::new());
        let action = ScriptedAction {
            fail_setup: true,
            ..ScriptedAction::default()
        };
        let plan = plan();

        let summary = executor(&listener, MapConfigurationParameters::new()).execute(&plan, &action);

        assert!(action.ran().is_empty());
        assert_eq!(summary.aborted_count(), plan.node_count() - 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(summary.result_for(plan.engine().unique_id()).is_some_and(ExecutionResult::is_failed));
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let params = MapConfigurationParameters::new().with(PARALLEL_KEY, "maybe");
        let result = HierarchicalExecutor::new(Arc::new(RecordingListener::new()), Arc::new(params));

        assert!(matches!(result, Err(BenchscopeError::Config(_))));
    }

    #[tokio::test]
    async fn test_async_sequential_run() {
        let listener = Arc::new(RecordingListener::new());
        let action = Arc::new(ScriptedAction::default());
        let plan = Arc::new(plan());

        let summary = executor(&listener, MapConfigurationParameters::new())
            .execute_async(Arc::clone(&plan), action.clone())
            .await
            .unwrap();

        assert!(summary.is_successful());
        assert_eq!(action.ran(), vec!["tokenize", "parse", "render", "encode"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_classes_share_engine_fixture() {
        let listener = Arc::new(RecordingListener::new());
        let action = Arc::new(ScriptedAction::default());
        let plan = Arc::new(plan());
        let params = MapConfigurationParameters::new().with(PARALLEL_KEY, "true");

        let executor = executor(&listener, params);
        assert!(executor.settings().parallel);

        let summary = executor
            .execute_async(Arc::clone(&plan), action.clone())
            .await
            .unwrap();

        assert!(summary.is_successful());
        assert_eq!(summary.outcomes().len(), plan.node_count());
        assert_eq!(action.engine_setups.load(Ordering::SeqCst), 1);

        let mut ran = action.ran();
        ran.sort();
        assert_eq!(ran, vec!["encode", "parse", "render", "tokenize"]);

        let releases = action.releases();
        assert_eq!(releases.len(), 3);
        assert_eq!(releases.last().map(String::as_str), Some("engine"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_fail_fast_is_per_class() {
        let listener = Arc::new(RecordingListener::new());
        let action = Arc::new(ScriptedAction {
            failing_methods: vec!["tokenize"],
            ..ScriptedAction::default()
        });
        let plan = Arc::new(plan());
        let params = MapConfigurationParameters::new()
            .with(PARALLEL_KEY, "true")
            .with(FAIL_FAST_KEY, "true");

        let summary = executor(&listener, params)
            .execute_async(Arc::clone(&plan), action.clone())
            .await
            .unwrap();

        assert_eq!(summary.aborted_count(), 2);
        assert_eq!(
            summary.result_for(&method_id(&plan, 1, 0)),
            Some(&ExecutionResult::Successful)
        );
    }

    #[test]
    fn test_panicking_listener_still_closes_open_contexts() {
        let listener = Arc::new(PanickingListener { fail_on: "render" });
        let action = ScriptedAction::default();
        let plan = plan();
        let executor =
            HierarchicalExecutor::new(listener, Arc::new(MapConfigurationParameters::new())).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&plan, &action)));

        assert!(result.is_err());
        assert_eq!(action.ran(), vec!["tokenize", "parse"]);
        assert_eq!(action.releases(), vec!["ParserBench", "engine"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_class_task_panic_still_closes_its_context() {
        let listener = Arc::new(PanickingListener { fail_on: "render" });
        let action = Arc::new(ScriptedAction::default());
        let plan = Arc::new(plan());
        let params = MapConfigurationParameters::new().with(PARALLEL_KEY, "true");
        let executor = HierarchicalExecutor::new(listener, Arc::new(params)).unwrap();

        let result = executor.execute_async(Arc::clone(&plan), action.clone()).await;

        assert!(matches!(result, Err(BenchscopeError::Internal(_))));
        let releases = action.releases();
        assert!(releases.contains(&"ParserBench".to_string()));
        assert!(releases.contains(&"CodecBench".to_string()));
        assert_eq!(releases.last().map(String::as_str), Some("engine"));
    }
}
