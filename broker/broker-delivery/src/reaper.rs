//! The Reaper (§4.7): periodically closes sockets for agents that have a
//! wake-up rendezvous and have been silent past the staleness threshold.
//! Agents without a rendezvous are left alone regardless of staleness —
//! they cannot be woken, so disconnecting them would lose the ability to
//! deliver to them at all.
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use broker_common::util::sec_since_epoch;
use broker_protocol::ServerNotification;
use broker_registry::Registry;

/// Spawn the Reaper task on a fixed interval. `threshold` is the staleness
/// deadline (spec.md's 15s); `interval` is the walk cadence (spec.md's 10s).
pub fn spawn_reaper(registry: Arc<RwLock<Registry>>, interval: Duration, threshold: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            reap_once(&registry, threshold.as_secs());
        }
    });
}

fn reap_once(registry: &Arc<RwLock<Registry>>, threshold_secs: u64) {
    let now = sec_since_epoch();
    let stale = {
        let reg = registry.read().expect("registry lock poisoned");
        reg.stale_agents(now, threshold_secs)
    };
    if stale.is_empty() {
        return;
    }
    let reg = registry.read().expect("registry lock poisoned");
    for uaid in stale {
        if let Some(agent) = reg.get_agent(&uaid) {
            if let Some(session) = &agent.session {
                debug!("reaper: closing stale session for {}", uaid);
                let _ = session.send(ServerNotification::Disconnect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use broker_protocol::WakeupHostPort;

    use super::*;

    #[test]
    fn reaps_only_agents_with_a_rendezvous_past_threshold() {
        let registry = Arc::new(RwLock::new(Registry::new()));
        let (tx_a, mut rx_a) = tokio::sync::mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = tokio::sync::mpsc::unbounded_channel();
        {
            let mut reg = registry.write().unwrap();
            reg.attach_session("stale-with-wakeup", tx_a, 0);
            reg.set_wakeup(
                "stale-with-wakeup",
                WakeupHostPort {
                    ip: "127.0.0.1".into(),
                    port: 9000,
                },
            );
            reg.attach_session("stale-no-wakeup", tx_b, 0);
        }

        reap_once(&registry, 0);

        assert!(rx_a.try_recv().is_ok(), "agent with rendezvous is reaped");
        assert!(
            rx_b.try_recv().is_err(),
            "agent without rendezvous is left alone"
        );
    }
}
