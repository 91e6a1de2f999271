//! Batch dispatch
//!
//! Drives an execution plan to completion, either sequentially in the
//! current process or across a bounded pool of workers. Admission is
//! throttled through the availability signal; isolated batches are fenced
//! by drain barriers on both sides.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Batch, ExecutionPlan, Strategy, WorkItem};
use crate::pool::{completion_channel, supervise, CompletionSender, SharedRunState};

use super::ItemRunner;

/// Overall result of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// True when any item failed its primary phase.
    pub failed: bool,
}

/// Drives execution of an ordered plan across the worker pool
pub struct DispatchEngine<R> {
    runner: Arc<R>,
    state: Arc<SharedRunState>,
}

impl<R: ItemRunner> DispatchEngine<R> {
    pub fn new(runner: Arc<R>, worker_limit: usize) -> Self {
        Self {
            runner,
            state: Arc::new(SharedRunState::new(worker_limit)),
        }
    }

    /// Shared state handle, for callers that need the trail board or the
    /// failure flag mid-run.
    pub fn state(&self) -> Arc<SharedRunState> {
        self.state.clone()
    }

    /// Run the plan to completion and fold the shared failure flag into
    /// the outcome.
    pub async fn run(&self, plan: ExecutionPlan) -> Result<RunOutcome> {
        let start = Instant::now();

        let result = if self.state.worker_limit() == 0 {
            self.run_sequential(&plan).await
        } else {
            self.run_pooled(&plan).await
        };

        info!(
            "run completed in {}ms, {} batches, {} items",
            start.elapsed().as_millis(),
            plan.len(),
            plan.total_items()
        );

        result.map(|_| RunOutcome {
            failed: self.state.outcome.any_failed(),
        })
    }

    /// Run every batch in the current task, in plan order, with no worker
    /// ever spawned.
    async fn run_sequential(&self, plan: &ExecutionPlan) -> Result<()> {
        info!("running {} batches sequentially", plan.len());

        let batches = plan.batches();
        for (i, batch) in batches.iter().enumerate() {
            let lookahead = batches.get(i + 1).and_then(|b| b.items.first());
            self.run_batch_inline(batch, lookahead).await?;
        }
        Ok(())
    }

    /// Run one batch's items in declaration order, passing each the next
    /// item to prepare for; the last item looks ahead into the following
    /// batch.
    async fn run_batch_inline(&self, batch: &Batch, lookahead: Option<&WorkItem>) -> Result<()> {
        for (i, item) in batch.items.iter().enumerate() {
            let next = batch.items.get(i + 1).or(lookahead);
            let report = self.runner.run(item, next).await;
            self.state.outcome.observe(&report);
            self.check_stop()?;
        }
        Ok(())
    }

    async fn run_pooled(&self, plan: &ExecutionPlan) -> Result<()> {
        info!(
            "dispatching {} batches across up to {} workers",
            plan.len(),
            self.state.worker_limit()
        );

        let (completions, completion_rx) = completion_channel();
        let supervisor = tokio::spawn(supervise(self.state.clone(), completion_rx));

        let result = self.dispatch_all(plan, &completions).await;

        // Even on interruption, in-flight workers finish their current
        // unit before the supervisor winds down.
        self.state.drained.wait().await;
        self.state.stop.set();
        drop(completions);
        let _ = supervisor.await;

        result
    }

    async fn dispatch_all(&self, plan: &ExecutionPlan, completions: &CompletionSender) -> Result<()> {
        for batch in plan.batches() {
            self.check_stop()?;
            debug!(batch = %batch.name, strategy = %batch.strategy, items = batch.len(), "dispatching batch");

            match batch.strategy {
                Strategy::Free => {
                    for item in &batch.items {
                        self.admit().await;
                        self.check_stop()?;
                        self.submit_item(item.clone(), completions);
                    }
                }
                Strategy::Serial => {
                    self.admit().await;
                    self.check_stop()?;
                    self.submit_batch(batch.clone(), completions);
                }
                Strategy::IsolatedFree => {
                    self.state.drained.wait().await;
                    for item in &batch.items {
                        self.admit().await;
                        self.check_stop()?;
                        self.submit_item(item.clone(), completions);
                    }
                    self.state.drained.wait().await;
                }
                Strategy::IsolatedSerial => {
                    self.state.drained.wait().await;
                    self.admit().await;
                    self.check_stop()?;
                    self.submit_batch(batch.clone(), completions);
                    self.state.drained.wait().await;
                }
            }
        }
        Ok(())
    }

    /// Block until the pool has capacity, then consume the availability
    /// grant for one submission.
    async fn admit(&self) {
        self.state.availability.wait().await;
        self.state.availability.clear();
    }

    fn check_stop(&self) -> Result<()> {
        match self.runner.stop_requested() {
            Some(reason) => Err(Error::Interrupted(reason)),
            None => Ok(()),
        }
    }

    /// Spawn a worker for a single item. The worker id is registered under
    /// the registry lock before the task starts, so the supervisor cannot
    /// miss it.
    fn submit_item(&self, item: WorkItem, completions: &CompletionSender) {
        let id = self.state.register_worker();
        debug!(worker = id, item = %item.name(), "submitting item");

        let runner = self.runner.clone();
        let state = self.state.clone();
        let completions = completions.clone();
        tokio::spawn(async move {
            let report = runner.run(&item, None).await;
            state.outcome.observe(&report);
            if let Some(reason) = runner.stop_requested() {
                debug!(worker = id, item = %item.name(), "stop requested: {reason}");
            }
            let _ = completions.send(id);
        });
    }

    /// Spawn one worker running a whole batch in declaration order.
    fn submit_batch(&self, batch: Batch, completions: &CompletionSender) {
        let id = self.state.register_worker();
        debug!(worker = id, batch = %batch.name, items = batch.len(), "submitting batch");

        let runner = self.runner.clone();
        let state = self.state.clone();
        let completions = completions.clone();
        tokio::spawn(async move {
            for (i, item) in batch.items.iter().enumerate() {
                let next = batch.items.get(i + 1);
                let report = runner.run(item, next).await;
                state.outcome.observe(&report);
                if let Some(reason) = runner.stop_requested() {
                    debug!(worker = id, batch = %batch.name, "stop requested, abandoning batch: {reason}");
                    break;
                }
            }
            let _ = completions.send(id);
        });
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::models::{ItemReport, Phase};
    use crate::schedule;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Runner that records start/end events and tracks how many items are
    /// in flight at once.
    struct RecordingRunner {
        events: Mutex<Vec<String>>,
        live: AtomicUsize,
        max_live: AtomicUsize,
        failing: HashSet<String>,
        setup_failing: HashSet<String>,
        stop_after: Option<String>,
        stopped: AtomicBool,
        delay: Duration,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                live: AtomicUsize::new(0),
                max_live: AtomicUsize::new(0),
                failing: HashSet::new(),
                setup_failing: HashSet::new(),
                stop_after: None,
                stopped: AtomicBool::new(false),
                delay: Duration::from_millis(10),
            }
        }

        fn failing(mut self, names: &[&str]) -> Self {
            self.failing = names.iter().map(|n| n.to_string()).collect();
            self
        }

        fn setup_failing(mut self, names: &[&str]) -> Self {
            self.setup_failing = names.iter().map(|n| n.to_string()).collect();
            self
        }

        fn stop_after(mut self, name: &str) -> Self {
            self.stop_after = Some(name.to_string());
            self
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }

        fn position(&self, event: &str) -> usize {
            let events = self.events.lock();
            events
                .iter()
                .position(|e| e == event)
                .unwrap_or_else(|| panic!("event {event:?} not found in {events:?}"))
        }
    }

    #[async_trait]
    impl ItemRunner for RecordingRunner {
        async fn run(&self, item: &WorkItem, _next: Option<&WorkItem>) -> ItemReport {
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);
            self.events.lock().push(format!("start {}", item.name()));

            tokio::time::sleep(self.delay).await;

            self.events.lock().push(format!("end {}", item.name()));
            self.live.fetch_sub(1, Ordering::SeqCst);

            if self.stop_after.as_deref() == Some(item.name()) {
                self.stopped.store(true, Ordering::SeqCst);
            }

            if self.setup_failing.contains(item.name()) {
                ItemReport::failed_in(Phase::Setup)
            } else if self.failing.contains(item.name()) {
                ItemReport::failed_in(Phase::Call)
            } else {
                ItemReport::passed()
            }
        }

        fn stop_requested(&self) -> Option<String> {
            if self.stopped.load(Ordering::SeqCst) {
                Some("session stop requested".to_string())
            } else {
                None
            }
        }
    }

    fn plan_for(items: Vec<WorkItem>) -> ExecutionPlan {
        schedule::plan(schedule::classify(items).unwrap())
    }

    #[tokio::test]
    async fn test_sequential_runs_in_declaration_order() {
        let items = vec![
            WorkItem::new("a"),
            WorkItem::new("b").with_group_strategy("g", Strategy::Serial),
            WorkItem::new("c").with_group("g"),
        ];
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner.clone(), 0);

        let outcome = engine.run(plan_for(items)).await.unwrap();
        assert!(!outcome.failed);
        assert_eq!(
            runner.events(),
            vec!["start a", "end a", "start b", "end b", "start c", "end c"]
        );
        assert_eq!(engine.state().live_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_lookahead_crosses_batches() {
        struct NextRecorder {
            nexts: Mutex<Vec<Option<String>>>,
        }

        #[async_trait]
        impl ItemRunner for NextRecorder {
            async fn run(&self, _item: &WorkItem, next: Option<&WorkItem>) -> ItemReport {
                self.nexts
                    .lock()
                    .push(next.map(|n| n.name().to_string()));
                ItemReport::passed()
            }
        }

        let items = vec![
            WorkItem::new("b").with_group_strategy("g", Strategy::Serial),
            WorkItem::new("c").with_group("g"),
            WorkItem::new("d").with_group_strategy("h", Strategy::Serial),
        ];
        let runner = Arc::new(NextRecorder {
            nexts: Mutex::new(Vec::new()),
        });
        let engine = DispatchEngine::new(runner.clone(), 0);
        engine.run(plan_for(items)).await.unwrap();

        // In-batch next first, then the following batch's first item, then
        // the end-of-run terminator.
        assert_eq!(
            *runner.nexts.lock(),
            vec![Some("c".to_string()), Some("d".to_string()), None]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_never_exceeds_worker_limit() {
        let items: Vec<_> = (0..6).map(|i| WorkItem::new(format!("t{i}"))).collect();
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner.clone(), 2);

        engine.run(plan_for(items)).await.unwrap();

        assert!(runner.max_live.load(Ordering::SeqCst) <= 2);
        assert_eq!(runner.events().len(), 12);
        assert_eq!(engine.state().live_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_serial_batch_runs_in_order_in_one_worker() {
        let items = vec![
            WorkItem::new("g1").with_group_strategy("g", Strategy::Serial),
            WorkItem::new("g2").with_group("g"),
            WorkItem::new("g3").with_group("g"),
        ];
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner.clone(), 2);

        engine.run(plan_for(items)).await.unwrap();

        let events = runner.events();
        assert_eq!(
            events,
            vec!["start g1", "end g1", "start g2", "end g2", "start g3", "end g3"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_isolated_batch_waits_for_drain() {
        let items = vec![
            WorkItem::new("a"),
            WorkItem::new("b").with_group_strategy("g", Strategy::Serial),
            WorkItem::new("c").with_group("g"),
            WorkItem::new("d").with_group_strategy("h", Strategy::IsolatedFree),
        ];
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner.clone(), 2);

        engine.run(plan_for(items)).await.unwrap();

        // d starts only after everything else has fully finished.
        let d_start = runner.position("start d");
        for done in ["end a", "end b", "end c"] {
            assert!(
                runner.position(done) < d_start,
                "{done:?} should precede start d in {:?}",
                runner.events()
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_isolated_serial_batch_is_fenced_and_ordered() {
        let items = vec![
            WorkItem::new("a"),
            WorkItem::new("b"),
            WorkItem::new("x1").with_group_strategy("x", Strategy::IsolatedSerial),
            WorkItem::new("x2").with_group("x"),
            WorkItem::new("c"),
        ];
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner.clone(), 3);

        engine.run(plan_for(items)).await.unwrap();

        let x1_start = runner.position("start x1");
        for done in ["end a", "end b", "end c"] {
            assert!(runner.position(done) < x1_start);
        }
        assert!(runner.position("end x1") < runner.position("start x2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_flag_folds_into_outcome() {
        let items = vec![WorkItem::new("ok"), WorkItem::new("bad")];
        let runner = Arc::new(RecordingRunner::new().failing(&["bad"]));
        let engine = DispatchEngine::new(runner, 2);

        let outcome = engine.run(plan_for(items)).await.unwrap();
        assert!(outcome.failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_setup_failure_does_not_fail_the_run() {
        let items = vec![WorkItem::new("flaky_fixture")];
        let runner = Arc::new(RecordingRunner::new().setup_failing(&["flaky_fixture"]));
        let engine = DispatchEngine::new(runner, 2);

        let outcome = engine.run(plan_for(items)).await.unwrap();
        assert!(!outcome.failed);
    }

    #[tokio::test]
    async fn test_all_passing_run_is_clean() {
        let items = vec![WorkItem::new("a"), WorkItem::new("b")];
        let runner = Arc::new(RecordingRunner::new());
        let engine = DispatchEngine::new(runner, 0);

        let outcome = engine.run(plan_for(items)).await.unwrap();
        assert!(!outcome.failed);
    }

    #[tokio::test]
    async fn test_sequential_stop_halts_dispatch() {
        let items = vec![WorkItem::new("a"), WorkItem::new("b"), WorkItem::new("c")];
        let runner = Arc::new(RecordingRunner::new().stop_after("a"));
        let engine = DispatchEngine::new(runner.clone(), 0);

        let err = engine.run(plan_for(items)).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted(_)));
        assert!(!err.is_configuration());
        // Only the unit that observed the stop ran.
        assert_eq!(runner.events(), vec!["start a", "end a"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pooled_stop_halts_further_submission() {
        let items = vec![WorkItem::new("a"), WorkItem::new("b"), WorkItem::new("c")];
        let runner = Arc::new(RecordingRunner::new().stop_after("a"));
        // Limit 1 serializes submissions, so the stop is observed before b.
        let engine = DispatchEngine::new(runner.clone(), 1);

        let err = engine.run(plan_for(items)).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted(_)));
        assert_eq!(runner.events(), vec!["start a", "end a"]);
        assert_eq!(engine.state().live_count(), 0);
    }
}
