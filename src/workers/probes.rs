//! Stock probes.
//!
//! Broker-protocol probing lives outside this crate. The binary falls back to a plain TCP
//! reachability check so every worker kind still produces a signal per round.

use super::registry::ProbeFuture;
use super::types::ProbeContext;

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Builds a probe that opens a TCP connection to every broker endpoint.
///
/// The round fails only when endpoints are configured and none of them answer.
pub fn tcp_reachability(
    brokers: Vec<String>,
    connect_timeout: Duration,
) -> impl Fn(ProbeContext) -> ProbeFuture + Send + Sync + 'static {
    let brokers = Arc::new(brokers);

    move |ctx: ProbeContext| {
        let brokers = brokers.clone();
        let round: ProbeFuture = Box::pin(async move {
            if brokers.is_empty() {
                tracing::debug!("{} probe: no broker endpoints configured", ctx.kind);
                return Ok(());
            }

            let mut reachable = 0usize;
            for broker in brokers.iter() {
                let start = Instant::now();
                match tokio::time::timeout(connect_timeout, TcpStream::connect(broker.as_str()))
                    .await
                {
                    Ok(Ok(_)) => {
                        reachable += 1;
                        tracing::debug!(
                            "{} probe: {} reachable in {:?}",
                            ctx.kind,
                            broker,
                            start.elapsed()
                        );
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("{} probe: {} unreachable: {}", ctx.kind, broker, e);
                    }
                    Err(_) => {
                        tracing::warn!(
                            "{} probe: {} did not answer within {:?}",
                            ctx.kind,
                            broker,
                            connect_timeout
                        );
                    }
                }
            }

            tracing::info!(
                "{} probe on {}: {}/{} broker(s) reachable",
                ctx.kind,
                ctx.cluster,
                reachable,
                brokers.len()
            );

            if reachable == 0 {
                return Err(anyhow::anyhow!(
                    "no broker reachable out of {}",
                    brokers.len()
                ));
            }

            Ok(())
        });
        round
    }
}
