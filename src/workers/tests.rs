//! Workers Module Tests
//!
//! ## Test Scopes
//! - **Registry**: Registration, lookup and submission order.
//! - **Periodic Worker**: Pass counting and failures.
//! - **Probes**: TCP reachability against live and dead endpoints.

#[cfg(test)]
mod tests {
    use crate::membership::types::PeerAddress;
    use crate::workers::probes::tcp_reachability;
    use crate::workers::registry::ProbeRegistry;
    use crate::workers::types::{ProbeContext, WorkerKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn ctx(kind: WorkerKind) -> ProbeContext {
        ProbeContext {
            kind,
            cluster: "test-cluster".to_string(),
            self_address: PeerAddress::new("127.0.0.1", 7000),
            peers: vec![PeerAddress::new("127.0.0.1", 7001)],
        }
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[test]
    fn test_worker_kind_names() {
        let names: Vec<String> = WorkerKind::ALL.iter().map(|k| k.to_string()).collect();

        assert_eq!(names, vec!["leader-info", "producer", "availability", "consumer"]);
    }

    #[test]
    fn test_registry_returns_workers_in_submission_order() {
        let registry = ProbeRegistry::new();
        for kind in [WorkerKind::Consumer, WorkerKind::Producer, WorkerKind::LeaderInfo] {
            registry.register(kind, Duration::from_secs(1), |_ctx| async { Ok(()) });
        }

        let kinds: Vec<WorkerKind> = registry.workers().iter().map(|w| w.kind()).collect();

        assert_eq!(
            kinds,
            vec![WorkerKind::LeaderInfo, WorkerKind::Producer, WorkerKind::Consumer]
        );
        assert_eq!(registry.worker_count(), 3);
        assert!(!registry.has_worker(WorkerKind::Availability));
        assert!(registry.get(WorkerKind::Availability).is_none());
    }

    #[test]
    fn test_register_replaces_previous_probe() {
        let registry = ProbeRegistry::new();
        registry.register(WorkerKind::Producer, Duration::from_secs(1), |_ctx| async { Ok(()) });
        registry.register(WorkerKind::Producer, Duration::from_secs(9), |_ctx| async { Ok(()) });

        assert_eq!(registry.worker_count(), 1);
        assert_eq!(
            registry.get(WorkerKind::Producer).unwrap().interval(),
            Duration::from_secs(9)
        );
    }

    // ============================================================
    // PERIODIC WORKER TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_every_pass_probes_regardless_of_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ProbeRegistry::new();
        let counter = calls.clone();
        registry.register(WorkerKind::LeaderInfo, Duration::from_secs(300), move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let worker = registry.get(WorkerKind::LeaderInfo).unwrap();

        // Back-to-back passes, well inside the interval
        for _ in 0..3 {
            worker.run_pass(ctx(WorkerKind::LeaderInfo)).await.unwrap();
            tokio::time::advance(Duration::from_secs(30)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(worker.completed_passes(), 3);
    }

    #[tokio::test]
    async fn test_failed_pass_is_not_counted() {
        let registry = ProbeRegistry::new();
        registry.register(WorkerKind::Consumer, Duration::ZERO, |_ctx| async {
            Err(anyhow::anyhow!("broker said no"))
        });
        let worker = registry.get(WorkerKind::Consumer).unwrap();

        let result = worker.run_pass(ctx(WorkerKind::Consumer)).await;

        assert!(result.is_err());
        assert_eq!(worker.completed_passes(), 0);
    }

    #[tokio::test]
    async fn test_probe_receives_peer_list() {
        let seen = Arc::new(AtomicUsize::new(0));
        let registry = ProbeRegistry::new();
        let peers_seen = seen.clone();
        registry.register(WorkerKind::Consumer, Duration::ZERO, move |ctx| {
            let peers_seen = peers_seen.clone();
            async move {
                peers_seen.store(ctx.peers.len(), Ordering::SeqCst);
                Ok(())
            }
        });

        registry
            .get(WorkerKind::Consumer)
            .unwrap()
            .run_pass(ctx(WorkerKind::Consumer))
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    // ============================================================
    // PROBE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_tcp_probe_without_brokers_succeeds() {
        let probe = tcp_reachability(vec![], Duration::from_millis(100));

        assert!(probe(ctx(WorkerKind::Producer)).await.is_ok());
    }

    #[tokio::test]
    async fn test_tcp_probe_reaches_listening_broker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let probe = tcp_reachability(vec![addr], Duration::from_secs(2));

        assert!(probe(ctx(WorkerKind::Producer)).await.is_ok());
    }

    #[tokio::test]
    async fn test_tcp_probe_fails_when_no_broker_answers() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let probe = tcp_reachability(vec![addr], Duration::from_secs(2));

        let err = probe(ctx(WorkerKind::Availability)).await.unwrap_err();

        assert!(err.to_string().contains("no broker reachable"));
    }
}
