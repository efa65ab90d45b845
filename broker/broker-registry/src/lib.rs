//! The in-memory Registry: the single authoritative map of agents,
//! channels, and groups.
//!
//! A `Registry` is a plain value, not an actor. The mutation discipline
//! (§5 of the design: "a global lock around all mutating operations") is
//! enforced by whoever holds it — the binary wraps one in a
//! `std::sync::RwLock` inside its `AppState` and takes the write guard for
//! every method here that mutates.
#[macro_use]
extern crate slog_scope;

mod durable;

pub use durable::{DurableStore, FileDurableStore};

use std::collections::{HashMap, HashSet};

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use broker_protocol::{ServerNotification, WakeupHostPort};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("channel already registered to another agent: {0}")]
    Conflict(String),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

/// A channel: identified by a client-chosen string, owned by exactly one
/// agent, carrying a version that only ever increases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub owner: String,
    pub version: u64,
}

/// An agent (UAID). `session` is the live connection's notification sink,
/// if any is currently attached; it is never part of a snapshot.
pub struct Agent {
    pub uaid: String,
    pub channels: HashSet<String>,
    pub wakeup: Option<WakeupHostPort>,
    pub last_contact: u64,
    pub session: Option<UnboundedSender<ServerNotification>>,
}

impl Agent {
    fn new(uaid: impl Into<String>, now: u64) -> Self {
        Self {
            uaid: uaid.into(),
            channels: HashSet::new(),
            wakeup: None,
            last_contact: now,
            session: None,
        }
    }

    pub fn connected(&self) -> bool {
        self.session.is_some()
    }
}

/// The serializable subset of an [`Agent`] — every field but its live
/// session, which is process-local and can't outlive a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub uaid: String,
    pub channels: HashSet<String>,
    pub wakeup: Option<WakeupHostPort>,
    pub last_contact: u64,
}

/// `{agents (less their live sessions), channels, groups}` — exactly what
/// gets persisted to, and restored from, durable storage. Pending
/// deliveries are never part of this.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub agents: Vec<AgentSnapshot>,
    pub channels: HashMap<String, Channel>,
    pub groups: HashMap<String, Vec<String>>,
}

#[derive(Default)]
pub struct Registry {
    agents: HashMap<String, Agent>,
    channels: HashMap<String, Channel>,
    groups: HashMap<String, Vec<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_agent(&self, uaid: &str) -> Option<&Agent> {
        self.agents.get(uaid)
    }

    pub fn get_channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.get(channel_id)
    }

    pub fn group_members(&self, group_id: &str) -> &[String] {
        self.groups
            .get(group_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_group(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// All agents, for the Admin View (spec.md §4.8). Read-only.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Ensure an agent entry exists for `uaid`, creating a fresh empty one
    /// if this is the first we've heard of it. Used by hello processing,
    /// which may mint a brand new UAID.
    pub fn ensure_agent(&mut self, uaid: &str, now: u64) {
        self.agents
            .entry(uaid.to_owned())
            .or_insert_with(|| Agent::new(uaid, now));
    }

    pub fn touch_last_contact(&mut self, uaid: &str, now: u64) {
        if let Some(agent) = self.agents.get_mut(uaid) {
            agent.last_contact = now;
        }
    }

    pub fn set_wakeup(&mut self, uaid: &str, wakeup: WakeupHostPort) {
        if let Some(agent) = self.agents.get_mut(uaid) {
            agent.wakeup = Some(wakeup);
        }
    }

    /// `register_channel(uaid, channelID) -> {ok | conflict}`: conflict if
    /// the channel exists and is owned by a different agent. Otherwise
    /// creates the channel at version 0, inserts it into the agent's
    /// owned-set and the global table.
    pub fn register_channel(
        &mut self,
        uaid: &str,
        channel_id: &str,
    ) -> Result<(), RegistryError> {
        if !self.agents.contains_key(uaid) {
            return Err(RegistryError::UnknownAgent(uaid.to_owned()));
        }
        if let Some(existing) = self.channels.get(channel_id) {
            if existing.owner != uaid {
                return Err(RegistryError::Conflict(channel_id.to_owned()));
            }
            // Already owned by this agent: idempotent no-op.
            return Ok(());
        }
        self.channels.insert(
            channel_id.to_owned(),
            Channel {
                owner: uaid.to_owned(),
                version: 0,
            },
        );
        self.agents
            .get_mut(uaid)
            .expect("checked above")
            .channels
            .insert(channel_id.to_owned());
        Ok(())
    }

    /// `unregister_channel(uaid, channelID) -> ok`: no-op unless the agent
    /// owns the channel. Group membership is intentionally not scrubbed.
    pub fn unregister_channel(&mut self, uaid: &str, channel_id: &str) {
        let owned_by_uaid = self
            .channels
            .get(channel_id)
            .map(|c| c.owner == uaid)
            .unwrap_or(false);
        if !owned_by_uaid {
            return;
        }
        self.channels.remove(channel_id);
        if let Some(agent) = self.agents.get_mut(uaid) {
            agent.channels.remove(channel_id);
        }
    }

    /// Bump a channel's version by one and return its owning uaid and new
    /// version, or `None` if the channel doesn't exist.
    pub fn bump_channel_version(&mut self, channel_id: &str) -> Option<(String, u64)> {
        let channel = self.channels.get_mut(channel_id)?;
        channel.version += 1;
        Some((channel.owner.clone(), channel.version))
    }

    /// Attach a session to `uaid`, replacing any previous one. Creates the
    /// agent if it doesn't exist yet.
    pub fn attach_session(
        &mut self,
        uaid: &str,
        session: UnboundedSender<ServerNotification>,
        now: u64,
    ) {
        self.ensure_agent(uaid, now);
        self.agents.get_mut(uaid).expect("just ensured").session = Some(session);
    }

    /// Clear the session slot, retaining the agent.
    pub fn detach_session(&mut self, uaid: &str) {
        if let Some(agent) = self.agents.get_mut(uaid) {
            agent.session = None;
        }
    }

    /// Remove the agent, its owned channels, and any session. Group
    /// membership is not transitively cleaned up.
    pub fn reset_agent(&mut self, uaid: &str) {
        if let Some(agent) = self.agents.remove(uaid) {
            for channel_id in agent.channels {
                self.channels.remove(&channel_id);
            }
        }
    }

    /// Ordered list per group; lazily created on first add.
    pub fn group_add(&mut self, group_id: &str, channel_id: &str) {
        let members = self.groups.entry(group_id.to_owned()).or_default();
        if !members.iter().any(|c| c == channel_id) {
            members.push(channel_id.to_owned());
        }
    }

    /// Removes the first occurrence of `channel_id` by swap-remove.
    pub fn group_remove(&mut self, group_id: &str, channel_id: &str) {
        if let Some(members) = self.groups.get_mut(group_id) {
            if let Some(idx) = members.iter().position(|c| c == channel_id) {
                members.swap_remove(idx);
            }
        }
    }

    /// Every agent whose `last_contact` is older than `threshold_secs`
    /// before `now` and which has a wake-up rendezvous (agents without one
    /// can't be woken, so are left alone regardless of staleness).
    pub fn stale_agents(&self, now: u64, threshold_secs: u64) -> Vec<String> {
        self.agents
            .values()
            .filter(|agent| {
                agent.wakeup.is_some() && now.saturating_sub(agent.last_contact) >= threshold_secs
            })
            .map(|agent| agent.uaid.clone())
            .collect()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let agents = self
            .agents
            .values()
            .map(|agent| AgentSnapshot {
                uaid: agent.uaid.clone(),
                channels: agent.channels.clone(),
                wakeup: agent.wakeup.clone(),
                last_contact: agent.last_contact,
            })
            .collect();
        RegistrySnapshot {
            agents,
            channels: self.channels.clone(),
            groups: self.groups.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.agents = snapshot
            .agents
            .into_iter()
            .map(|a| {
                (
                    a.uaid.clone(),
                    Agent {
                        uaid: a.uaid,
                        channels: a.channels,
                        wakeup: a.wakeup,
                        last_contact: a.last_contact,
                        session: None,
                    },
                )
            })
            .collect();
        self.channels = snapshot.channels;
        self.groups = snapshot.groups;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_keeps_owned_set_and_table_in_sync() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 0);
        reg.register_channel("u1", "c1").unwrap();
        assert!(reg.get_channel("c1").is_some());
        assert!(reg.get_agent("u1").unwrap().channels.contains("c1"));

        reg.unregister_channel("u1", "c1");
        assert!(reg.get_channel("c1").is_none());
        assert!(!reg.get_agent("u1").unwrap().channels.contains("c1"));
    }

    #[test]
    fn register_conflict_by_different_agent_leaves_state_unchanged() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 0);
        reg.ensure_agent("u2", 0);
        reg.register_channel("u1", "c1").unwrap();

        let err = reg.register_channel("u2", "c1").unwrap_err();
        assert_eq!(err, RegistryError::Conflict("c1".to_owned()));
        assert_eq!(reg.get_channel("c1").unwrap().owner, "u1");
        assert!(!reg.get_agent("u2").unwrap().channels.contains("c1"));
    }

    #[test]
    fn register_is_idempotent_for_same_owner() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 0);
        reg.register_channel("u1", "c1").unwrap();
        reg.register_channel("u1", "c1").unwrap();
        assert_eq!(reg.get_channel("c1").unwrap().version, 0);
    }

    #[test]
    fn group_add_then_remove_restores_membership() {
        let mut reg = Registry::new();
        reg.group_add("g1", "c1");
        reg.group_add("g1", "c2");
        reg.group_remove("g1", "c1");
        reg.group_add("g1", "c1");
        let members = reg.group_members("g1");
        assert_eq!(members.len(), 2);
        assert!(members.contains(&"c1".to_owned()));
        assert!(members.contains(&"c2".to_owned()));
    }

    #[test]
    fn reset_agent_drops_owned_channels_but_not_groups() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 0);
        reg.register_channel("u1", "c1").unwrap();
        reg.group_add("g1", "c1");

        reg.reset_agent("u1");
        assert!(reg.get_agent("u1").is_none());
        assert!(reg.get_channel("c1").is_none());
        // stale reference tolerated, filtered at delivery time
        assert!(reg.group_members("g1").contains(&"c1".to_owned()));
    }

    #[test]
    fn snapshot_restore_is_a_fixpoint() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 42);
        reg.register_channel("u1", "c1").unwrap();
        reg.group_add("g1", "c1");
        let snap = reg.snapshot();

        let mut restored = Registry::new();
        restored.restore(snap.clone());
        assert_eq!(restored.snapshot(), snap);
    }

    #[test]
    fn stale_agents_requires_a_wakeup_rendezvous() {
        let mut reg = Registry::new();
        reg.ensure_agent("u1", 0);
        reg.ensure_agent("u2", 0);
        reg.set_wakeup(
            "u2",
            WakeupHostPort {
                ip: "127.0.0.1".into(),
                port: 9000,
            },
        );

        let stale = reg.stale_agents(100, 15);
        assert_eq!(stale, vec!["u2".to_owned()]);
    }
}
