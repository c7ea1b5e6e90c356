//! Decides which roster entries the viewer is already connected to.
//!
//! Known connections come from two places: the local cache and the
//! `/connections` endpoint. The merged set is written back to the cache so
//! the next run starts from it even when the API is unreachable.

pub mod store;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::api::{ConnectionResponse, ConnectionsApi, DirectoryEntry, DirectoryKind};
use crate::identity::{ConnectionIdentifier, MatchPolicy, ids_match};
use store::KnownConnectionsStore;

/// Deduplicated ids of people the viewer is connected to, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KnownConnections(Vec<String>);

impl KnownConnections {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known = Self::default();
        known.extend(ids);
        known
    }

    /// Parse a cached JSON array of strings. Anything else rejects the whole
    /// payload.
    pub fn from_cache_json(raw: &str) -> Option<Self> {
        let ids: Vec<String> = serde_json::from_str(raw).ok()?;
        Some(Self::from_ids(ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty())))
    }

    pub fn to_cache_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Returns whether the id was new.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if id.is_empty() || self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Returns how many ids were new.
    pub fn extend<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter().map(|id| self.insert(id)).filter(|new| *new).count()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|k| k != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|k| k == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn matches(&self, candidate: &str, policy: MatchPolicy) -> bool {
        self.iter().any(|k| ids_match(candidate, k, policy))
    }
}

/// Canonical ids of the other party for each usable connection record.
/// Records with no recoverable id are skipped.
pub fn extract_remote_ids(records: &[serde_json::Value]) -> Vec<String> {
    records
        .iter()
        .filter_map(|rec| {
            let id = ConnectionIdentifier::from_loose_record(rec);
            if id.is_none() {
                tracing::debug!("Skipping connection record without an id: {rec}");
            }
            id
        })
        .map(ConnectionIdentifier::into_string)
        .collect()
}

/// An entry without any usable id is never connected.
pub fn is_connected(entry: &DirectoryEntry, known: &KnownConnections, policy: MatchPolicy) -> bool {
    entry
        .candidate_ids()
        .iter()
        .any(|candidate| known.matches(candidate, policy))
}

/// The roster view: entries not yet connected, order preserved.
pub fn reconcile(
    roster: &[DirectoryEntry],
    known: &KnownConnections,
    policy: MatchPolicy,
) -> Vec<DirectoryEntry> {
    roster
        .iter()
        .filter(|e| !is_connected(e, known, policy))
        .cloned()
        .collect()
}

/// Complement of [`reconcile`].
pub fn connected(
    roster: &[DirectoryEntry],
    known: &KnownConnections,
    policy: MatchPolicy,
) -> Vec<DirectoryEntry> {
    roster
        .iter()
        .filter(|e| is_connected(e, known, policy))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    NotConnected,
    /// Request in flight; already hidden from the roster view.
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Created,
    AlreadyConnected,
    /// Non-201 answer. The id is still treated as connected.
    Rejected { status: u16, message: Option<String> },
    /// Transport failure; the optimistic mark was reverted.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub remote_ok: bool,
    pub added: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub visible: Vec<DirectoryEntry>,
    pub connected: Vec<DirectoryEntry>,
    pub refresh: RefreshOutcome,
}

pub struct Reconciler<'a> {
    api: &'a dyn ConnectionsApi,
    store: &'a dyn KnownConnectionsStore,
    policy: MatchPolicy,
    known: KnownConnections,
    /// What the cache currently holds, to skip redundant writes.
    persisted: Option<KnownConnections>,
    pending: BTreeSet<String>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        api: &'a dyn ConnectionsApi,
        store: &'a dyn KnownConnectionsStore,
        policy: MatchPolicy,
    ) -> Self {
        let persisted = match store.load_known_connections() {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Could not read known connections cache: {e}");
                None
            }
        };
        let known = persisted.clone().unwrap_or_default();
        tracing::debug!("Loaded {} cached connection id(s)", known.len());
        Self {
            api,
            store,
            policy,
            known,
            persisted,
            pending: BTreeSet::new(),
        }
    }

    pub fn known(&self) -> &KnownConnections {
        &self.known
    }

    pub fn state_of(&self, id: &str) -> ConnectState {
        if self.pending.contains(id) {
            ConnectState::Pending
        } else if self.known.contains(id) {
            ConnectState::Confirmed
        } else {
            ConnectState::NotConnected
        }
    }

    /// Merge the remote connection list into the known set and persist it.
    /// A failed fetch leaves the cached set in charge.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let records = match self.api.fetch_connections().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Fetching connections failed, using cached ids only: {e}");
                return RefreshOutcome {
                    remote_ok: false,
                    added: 0,
                };
            }
        };

        let added = self.known.extend(extract_remote_ids(&records));
        if added > 0 {
            tracing::info!("Merged {added} new connection id(s) from the API");
        }
        self.persist();
        RefreshOutcome {
            remote_ok: true,
            added,
        }
    }

    /// Known ids plus in-flight requests.
    fn effective(&self) -> KnownConnections {
        let mut all = self.known.clone();
        all.extend(self.pending.iter().cloned());
        all
    }

    pub fn roster_view(&self, roster: &[DirectoryEntry]) -> Vec<DirectoryEntry> {
        reconcile(roster, &self.effective(), self.policy)
    }

    pub fn connected_view(&self, roster: &[DirectoryEntry]) -> Vec<DirectoryEntry> {
        connected(roster, &self.effective(), self.policy)
    }

    /// Refresh, then split the roster.
    pub async fn reconcile(&mut self, roster: &[DirectoryEntry]) -> Reconciliation {
        let refresh = self.refresh().await;
        Reconciliation {
            visible: self.roster_view(roster),
            connected: self.connected_view(roster),
            refresh,
        }
    }

    /// Fetch a directory roster and reconcile it.
    pub async fn reconcile_directory(
        &mut self,
        kind: DirectoryKind,
    ) -> anyhow::Result<Reconciliation> {
        let roster = self.api.fetch_directory(kind).await?;
        Ok(self.reconcile(&roster).await)
    }

    /// Mark an id as pending so it drops out of the roster view before the
    /// request completes. Returns `false` when it is already known.
    pub fn begin_connect(&mut self, alumni_id: &str) -> bool {
        if self.known.contains(alumni_id) {
            return false;
        }
        self.pending.insert(alumni_id.to_string());
        true
    }

    /// Settle a pending request: confirm on any HTTP answer, revert on
    /// transport failure.
    pub fn finish_connect(
        &mut self,
        alumni_id: &str,
        result: anyhow::Result<ConnectionResponse>,
    ) -> ConnectOutcome {
        self.pending.remove(alumni_id);

        let outcome = match result {
            Ok(resp) if resp.is_created() => ConnectOutcome::Created,
            Ok(resp) if resp.says_already_connected() => ConnectOutcome::AlreadyConnected,
            Ok(resp) => ConnectOutcome::Rejected {
                status: resp.status,
                message: resp.message,
            },
            Err(e) => {
                tracing::warn!("Connection request for {alumni_id} failed: {e}");
                return ConnectOutcome::Failed(e.to_string());
            }
        };

        self.known.insert(alumni_id);
        self.persist();
        outcome
    }

    pub async fn connect(&mut self, alumni_id: &str, message: &str) -> ConnectOutcome {
        let alumni_id = alumni_id.trim();
        if alumni_id.is_empty() {
            return ConnectOutcome::Failed("empty alumni id".to_string());
        }
        if !self.begin_connect(alumni_id) {
            tracing::info!("{alumni_id} is already a known connection");
            return ConnectOutcome::AlreadyConnected;
        }
        let result = self.api.request_connection(alumni_id, message).await;
        self.finish_connect(alumni_id, result)
    }

    fn persist(&mut self) {
        if self.persisted.as_ref() == Some(&self.known) {
            return;
        }
        match self.store.save_known_connections(&self.known) {
            Ok(()) => self.persisted = Some(self.known.clone()),
            Err(e) => tracing::warn!("Could not write known connections cache: {e}"),
        }
    }
}
