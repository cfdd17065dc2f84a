//! Orchestrator Module Tests
//!
//! ## Test Scopes
//! - **Cycles**: All workers finishing, one worker hanging past the cycle budget.
//! - **Peer Sync**: Peer refresh and coordination outages.
//! - **Passes**: Every worker probing at least once per cycle, fast workers repeating.
//! - **Loop**: Bounded runs and the heartbeat.
//! - **Monitor**: Registration, shutdown and release around the loop.

#[cfg(test)]
mod tests {
    use crate::config::context::MonitorContext;
    use crate::config::types::{AppConfig, JobTimeouts};
    use crate::executor::types::JobStatus;
    use crate::membership::memory::InMemoryCoordination;
    use crate::membership::service::PeerRegistry;
    use crate::membership::store::EntryStore;
    use crate::membership::types::{PeerAddress, VerifyOutcome};
    use crate::orchestrator::heartbeat::Heartbeat;
    use crate::orchestrator::service::{Orchestrator, run_monitor};
    use crate::orchestrator::types::{DrainOutcome, OrchestratorState};
    use crate::workers::registry::ProbeRegistry;
    use crate::workers::types::WorkerKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    const BASE: &str = "/kafka-availability/instances/test";

    fn context(config: AppConfig) -> Arc<MonitorContext> {
        Arc::new(MonitorContext {
            cluster: "test".to_string(),
            computer_name: "test-host".to_string(),
            self_address: PeerAddress::new("10.0.0.1", 7000),
            config,
            sleep: Duration::from_millis(100),
            runs: None,
        })
    }

    fn quick_config(cycle_timeout_secs: i64) -> AppConfig {
        AppConfig {
            cycle_timeout_secs,
            warmup_ms: 0,
            pool_shutdown_grace_ms: 1_000,
            ..AppConfig::default()
        }
    }

    /// Registers every worker kind with a probe that sleeps for the given duration.
    fn probes(sleeps: [(WorkerKind, Duration); 4]) -> Arc<ProbeRegistry> {
        let registry = ProbeRegistry::new();
        for (kind, sleep) in sleeps {
            registry.register(kind, Duration::ZERO, move |_ctx| async move {
                tokio::time::sleep(sleep).await;
                Ok(())
            });
        }
        registry
    }

    fn all_sleep(sleep: Duration) -> [(WorkerKind, Duration); 4] {
        WorkerKind::ALL.map(|kind| (kind, sleep))
    }

    /// Registers every worker kind at its configured interval, counting probe calls.
    fn counting_probes(config: &AppConfig) -> (Arc<ProbeRegistry>, Arc<[AtomicUsize; 4]>) {
        let counts: Arc<[AtomicUsize; 4]> = Arc::new(Default::default());
        let registry = ProbeRegistry::new();
        for (index, kind) in WorkerKind::ALL.into_iter().enumerate() {
            let counts = counts.clone();
            registry.register(kind, config.interval_for(kind), move |_ctx| {
                let counts = counts.clone();
                async move {
                    counts[index].fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }
        (registry, counts)
    }

    fn count_of(counts: &[AtomicUsize; 4], kind: WorkerKind) -> usize {
        let index = WorkerKind::ALL.iter().position(|k| *k == kind).unwrap();
        counts[index].load(Ordering::SeqCst)
    }

    /// Raises its flag when the probe future holding it is dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    // ============================================================
    // CYCLE TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_cycle_completes_when_all_workers_finish() {
        // ARRANGE
        let coordination = InMemoryCoordination::standalone();
        let registry = PeerRegistry::new(coordination, BASE);
        let orchestrator = Orchestrator::new(
            context(quick_config(60)),
            registry,
            probes(all_sleep(Duration::from_secs(1))),
        );

        // ACT
        let start = Instant::now();
        let report = orchestrator.run_cycle(1).await.unwrap();

        // ASSERT
        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert!(report.drained_in >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(report.count("completed"), 4);
        assert_eq!(report.cancelled, 0);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_forced_when_worker_hangs() {
        // ARRANGE: the consumer never returns and its own deadline is far away
        let config = AppConfig {
            job_timeouts: JobTimeouts {
                consumer: Some(3_600),
                ..JobTimeouts::default()
            },
            ..quick_config(5)
        };
        let mut sleeps = all_sleep(Duration::from_secs(1));
        sleeps[3] = (WorkerKind::Consumer, Duration::from_secs(86_400));

        let orchestrator = Orchestrator::new(
            context(config),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes(sleeps),
        );

        // ACT
        let report = orchestrator.run_cycle(1).await.unwrap();

        // ASSERT
        assert!(report.is_forced());
        assert!(report.drained_in >= Duration::from_secs(5));
        assert!(report.drained_in < Duration::from_millis(5_050));
        for kind in [WorkerKind::LeaderInfo, WorkerKind::Producer, WorkerKind::Availability] {
            assert!(matches!(
                report.status_of(kind),
                Some(JobStatus::Completed { .. })
            ));
        }
        assert!(matches!(
            report.status_of(WorkerKind::Consumer),
            Some(JobStatus::TimedOut { .. })
        ));
        assert_eq!(report.cancelled, 1);
        // Teardown waits one grace period for the straggler
        assert!(report.total < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_deadline_shorter_than_cycle_budget() {
        let config = AppConfig {
            job_timeouts: JobTimeouts {
                producer: Some(2),
                ..JobTimeouts::default()
            },
            ..quick_config(30)
        };
        let mut sleeps = all_sleep(Duration::from_millis(500));
        sleeps[1] = (WorkerKind::Producer, Duration::from_secs(600));

        let orchestrator = Orchestrator::new(
            context(config),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes(sleeps),
        );

        let report = orchestrator.run_cycle(1).await.unwrap();

        // The job deadline interrupts the producer, so the barrier still completes naturally
        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert!(report.drained_in < Duration::from_secs(3));
        assert_eq!(report.status_of(WorkerKind::Producer).unwrap().label(), "timed-out");
        assert_eq!(report.count("completed"), 3);
        assert_eq!(report.cancelled, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_worker_does_not_stall_cycle() {
        let registry = ProbeRegistry::new();
        for kind in WorkerKind::ALL {
            registry.register(kind, Duration::ZERO, move |_ctx| async move {
                if kind == WorkerKind::Availability {
                    return Err(anyhow::anyhow!("topic missing"));
                }
                Ok(())
            });
        }

        let orchestrator = Orchestrator::new(
            context(quick_config(60)),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            registry,
        );

        let report = orchestrator.run_cycle(1).await.unwrap();

        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert_eq!(report.count("failed"), 1);
        assert_eq!(report.count("completed"), 3);
    }

    // ============================================================
    // PEER SYNC TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_sync_refreshes_peers_and_workers_see_them() {
        // ARRANGE: two instances share one coordination store
        let store = EntryStore::new(Duration::from_secs(3_600));
        let other = PeerRegistry::new(InMemoryCoordination::new(store.clone()), BASE);
        other.register(&PeerAddress::new("10.0.0.2", 7000)).await.unwrap();

        let ctx = context(quick_config(60));
        let registry = PeerRegistry::new(InMemoryCoordination::new(store.clone()), BASE);
        registry.register(&ctx.self_address).await.unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let probes = ProbeRegistry::new();
        let peers_seen = seen.clone();
        probes.register(WorkerKind::Consumer, Duration::ZERO, move |ctx| {
            let peers_seen = peers_seen.clone();
            async move {
                peers_seen.store(ctx.peers.len(), Ordering::SeqCst);
                Ok(())
            }
        });
        let orchestrator = Orchestrator::new(ctx, registry, probes);

        // ACT
        let verified = orchestrator.sync_peers().await;
        orchestrator.run_cycle(1).await.unwrap();

        // ASSERT
        assert_eq!(verified, VerifyOutcome::Present);
        assert_eq!(
            orchestrator.peers(),
            vec![
                PeerAddress::new("10.0.0.1", 7000),
                PeerAddress::new("10.0.0.2", 7000)
            ]
        );
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_runs_while_coordination_is_down() {
        // ARRANGE
        let coordination = InMemoryCoordination::standalone();
        let ctx = context(quick_config(60));
        let registry = PeerRegistry::new(coordination.clone(), BASE);
        registry.register(&ctx.self_address).await.unwrap();
        coordination.set_available(false);

        let orchestrator = Orchestrator::new(
            ctx,
            registry,
            probes(all_sleep(Duration::from_millis(200))),
        );

        // ACT
        let verified = orchestrator.sync_peers().await;
        let report = orchestrator.run_cycle(1).await.unwrap();

        // ASSERT
        assert_eq!(verified, VerifyOutcome::Unavailable);
        assert!(orchestrator.peers().is_empty());
        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert_eq!(report.count("completed"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_waits_for_warmup() {
        let config = AppConfig {
            warmup_ms: 5_000,
            ..quick_config(60)
        };
        let orchestrator = Orchestrator::new(
            context(config),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            ProbeRegistry::new(),
        );

        let start = Instant::now();
        let verified = orchestrator.sync_peers().await;

        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(verified, VerifyOutcome::NotRegistered);
        assert_eq!(orchestrator.state(), OrchestratorState::PeerSync);
    }

    // ============================================================
    // PASS TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_default_intervals_probe_every_worker_each_cycle() {
        // ARRANGE: stock intervals (60s and 300s), cycles 30s apart
        let config = AppConfig {
            warmup_ms: 0,
            ..AppConfig::default()
        };
        let (probes, counts) = counting_probes(&config);
        let mut ctx = context(config);
        Arc::get_mut(&mut ctx).unwrap().sleep = Duration::from_secs(30);

        let orchestrator = Orchestrator::new(
            ctx,
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes,
        );

        // ACT
        let cycles = orchestrator.run(Some(3)).await;

        // ASSERT: no worker sits a cycle out because its interval has not elapsed
        assert_eq!(cycles, 3);
        for kind in WorkerKind::ALL {
            assert_eq!(count_of(&counts, kind), 3, "{} probe count", kind);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_worker_repeats_while_slow_worker_runs() {
        // ARRANGE: producer every 10s, consumer busy for 45s of a 60s budget
        let config = AppConfig {
            warmup_ms: 0,
            producer_interval_ms: 10_000,
            ..AppConfig::default()
        };
        let (probes, counts) = counting_probes(&config);
        probes.register(
            WorkerKind::Consumer,
            config.interval_for(WorkerKind::Consumer),
            |_ctx| async {
                tokio::time::sleep(Duration::from_secs(45)).await;
                Ok(())
            },
        );

        let orchestrator = Orchestrator::new(
            context(config),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes,
        );

        // ACT
        let report = orchestrator.run_cycle(1).await.unwrap();

        // ASSERT: producer passes at 0s, 10s, 20s, 30s and 40s, then the round completes
        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert!(report.drained_in >= Duration::from_secs(45));
        assert!(report.drained_in < Duration::from_millis(45_050));
        assert_eq!(count_of(&counts, WorkerKind::Producer), 5);
        assert_eq!(count_of(&counts, WorkerKind::Availability), 1);
        assert_eq!(count_of(&counts, WorkerKind::LeaderInfo), 1);
        assert_eq!(report.count("completed"), 4);
    }

    // ============================================================
    // LOOP TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_bounded_run_executes_requested_cycles() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probes = ProbeRegistry::new();
        let counter = calls.clone();
        probes.register(WorkerKind::Producer, Duration::ZERO, move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let orchestrator = Orchestrator::new(
            context(quick_config(60)),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes,
        );

        let cycles = orchestrator.run(Some(2)).await;

        assert_eq!(cycles, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.state(), OrchestratorState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_runs_does_nothing() {
        let orchestrator = Orchestrator::new(
            context(quick_config(60)),
            PeerRegistry::new(InMemoryCoordination::standalone(), BASE),
            probes(all_sleep(Duration::ZERO)),
        );

        assert_eq!(orchestrator.run(Some(0)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_beats_until_stopped() {
        let mut heartbeat = Heartbeat::start("test", Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        heartbeat.stop();
        let beats = heartbeat.beats();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // Immediate first beat, then one at 10s and 20s
        assert_eq!(beats, 3);
        assert_eq!(heartbeat.beats(), beats);
        assert!(!heartbeat.is_running());
    }

    // ============================================================
    // MONITOR TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_registration_and_aborts_hung_probe() {
        // ARRANGE: the consumer hangs holding a drop flag, shutdown fires 5s in
        let store = EntryStore::new(Duration::from_secs(3_600));
        let registry = PeerRegistry::new(InMemoryCoordination::new(store.clone()), BASE);

        let dropped = Arc::new(AtomicBool::new(false));
        let probes = ProbeRegistry::new();
        probes.register(WorkerKind::Producer, Duration::from_secs(60), |_ctx| async {
            Ok(())
        });
        let flag = dropped.clone();
        probes.register(WorkerKind::Consumer, Duration::from_secs(60), move |_ctx| {
            let guard = DropFlag(flag.clone());
            async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                Ok(())
            }
        });

        // ACT
        let start = Instant::now();
        run_monitor(
            context(quick_config(60)),
            registry.clone(),
            probes,
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await
        .unwrap();
        let elapsed = start.elapsed();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // ASSERT
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
        assert_eq!(store.entry_count(), 0);
        assert!(registry.is_released());
        assert!(!registry.release().await);
        assert!(dropped.load(Ordering::SeqCst), "hung probe was not aborted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_fails_when_initial_registration_fails() {
        let coordination = InMemoryCoordination::standalone();
        coordination.set_available(false);
        let registry = PeerRegistry::new(coordination, BASE);

        let result = run_monitor(
            context(quick_config(60)),
            registry.clone(),
            probes(all_sleep(Duration::ZERO)),
            std::future::pending::<()>(),
        )
        .await;

        assert!(result.is_err());
        assert!(registry.is_released());
    }
}
