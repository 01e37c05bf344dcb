//! Response chain aggregation for one crawl session.
//!
//! The fetch stage pushes [`ResponseItem`]s as they arrive; the aggregator
//! groups them by object key in arrival order. At session close
//! [`ChainAggregator::take`] hands back an immutable [`ChainSnapshot`] and
//! leaves the aggregator empty, so memory is bounded by one session.
//!
//! The map sits behind a `Mutex`: concurrent writers are safe, but the
//! intended use is a single writer per session.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::AggregateError;
use crate::models::ResponseItem;

/// Default upper bound on items held by one session.
pub const DEFAULT_MAX_ITEMS: usize = 10_000;

#[derive(Debug, Default)]
struct State {
    chains: HashMap<String, Vec<ResponseItem>>,
    truncated: BTreeSet<String>,
    items: usize,
}

/// Groups response items into chains keyed by object key.
#[derive(Debug)]
pub struct ChainAggregator {
    capacity: usize,
    state: Mutex<State>,
}

impl ChainAggregator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ITEMS)
    }

    /// An aggregator that accepts at most `capacity` items per session.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create empty chains for the identities requested in this session.
    ///
    /// A target that never produces a response then still shows up in the
    /// snapshot, as an empty chain.
    pub fn open<'a, I>(&self, object_keys: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = self.lock();
        for key in object_keys {
            state.chains.entry(key.to_string()).or_default();
        }
    }

    /// Append an item to its chain.
    ///
    /// Once the session holds `capacity` items, further items are rejected
    /// and their chain is marked truncated.
    pub fn append(&self, item: ResponseItem) -> Result<(), AggregateError> {
        let mut state = self.lock();
        if state.items >= self.capacity {
            let object_key = item.object_key;
            state.chains.entry(object_key.clone()).or_default();
            state.truncated.insert(object_key.clone());
            return Err(AggregateError::CapacityExceeded {
                capacity: self.capacity,
                object_key,
            });
        }
        state.items += 1;
        state
            .chains
            .entry(item.object_key.clone())
            .or_default()
            .push(item);
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        self.lock().items
    }

    pub fn chain_count(&self) -> usize {
        self.lock().chains.len()
    }

    /// Snapshot all chains and reset the aggregator.
    pub fn take(&self) -> ChainSnapshot {
        let state = std::mem::take(&mut *self.lock());
        ChainSnapshot {
            chains: state.chains.into_iter().collect(),
            truncated: state.truncated,
        }
    }
}

impl Default for ChainAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// One chain handed to the upload coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub object_key: String,
    pub items: Vec<ResponseItem>,
    /// Items for this key were dropped because the session was full.
    pub truncated: bool,
}

/// Immutable view of a closed session's chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot {
    chains: BTreeMap<String, Vec<ResponseItem>>,
    truncated: BTreeSet<String>,
}

impl ChainSnapshot {
    pub fn get(&self, object_key: &str) -> Option<&[ResponseItem]> {
        self.chains.get(object_key).map(Vec::as_slice)
    }

    pub fn is_truncated(&self, object_key: &str) -> bool {
        self.truncated.contains(object_key)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Consume the snapshot into owned chains, in object-key order.
    pub fn into_chains(self) -> Vec<Chain> {
        let truncated = self.truncated;
        self.chains
            .into_iter()
            .map(|(object_key, items)| Chain {
                truncated: truncated.contains(&object_key),
                object_key,
                items,
            })
            .collect()
    }
}

impl FromIterator<(String, Vec<ResponseItem>)> for ChainSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, Vec<ResponseItem>)>>(iter: T) -> Self {
        Self {
            chains: iter.into_iter().collect(),
            truncated: BTreeSet::new(),
        }
    }
}
