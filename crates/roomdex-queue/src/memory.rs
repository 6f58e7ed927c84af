//! In-memory implementation of [`KeyValueStore`] for tests

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning
#![allow(clippy::cast_sign_loss)] // Index arithmetic on small test sets

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{QueueError, QueueResult};
use crate::store::{KeyValueStore, StoreValue};

enum Entry {
    Scalar(String),
    // Kept sorted by score on insert
    SortedSet(Vec<(f64, StoreValue)>),
}

struct Keyed {
    entry: Entry,
    expires_at: Option<Instant>,
}

impl Keyed {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-memory store with TTL support and failure injection
#[derive(Clone, Default)]
pub struct MemoryStore {
    keys: Arc<Mutex<HashMap<String, Keyed>>>,
    should_fail_next: Arc<Mutex<bool>>,
}

impl Default for Keyed {
    fn default() -> Self {
        Self {
            entry: Entry::SortedSet(Vec::new()),
            expires_at: None,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store operation fail
    pub fn fail_next(&self) {
        *self.should_fail_next.lock().unwrap() = true;
    }

    /// Seed a sorted-set member as an already-parsed JSON value, the shape
    /// some clients hand back instead of the raw string
    pub fn seed_sorted_parsed(&self, key: &str, score: f64, value: serde_json::Value) {
        let mut keys = self.keys.lock().unwrap();
        let keyed = keys.entry(key.to_string()).or_default();
        if let Entry::SortedSet(members) = &mut keyed.entry {
            members.push((score, StoreValue::Parsed(value)));
            members.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
    }

    fn check_fail(&self, operation: &'static str) -> QueueResult<()> {
        let mut should_fail = self.should_fail_next.lock().unwrap();
        if *should_fail {
            *should_fail = false;
            return Err(QueueError::store(operation, "injected store failure"));
        }
        Ok(())
    }

    fn ttl_deadline(ttl_seconds: u64) -> Option<Instant> {
        Some(Instant::now() + Duration::from_secs(ttl_seconds))
    }

    fn purge_expired(keys: &mut HashMap<String, Keyed>) {
        keys.retain(|_, keyed| !keyed.is_expired());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> QueueResult<bool> {
        self.check_fail("set_if_absent")?;
        let mut keys = self.keys.lock().unwrap();
        Self::purge_expired(&mut keys);
        if keys.contains_key(key) {
            return Ok(false);
        }
        keys.insert(
            key.to_string(),
            Keyed {
                entry: Entry::Scalar(value.to_string()),
                expires_at: Self::ttl_deadline(ttl_seconds),
            },
        );
        Ok(true)
    }

    async fn exists(&self, key: &str) -> QueueResult<bool> {
        self.check_fail("exists")?;
        let mut keys = self.keys.lock().unwrap();
        Self::purge_expired(&mut keys);
        Ok(keys.contains_key(key))
    }

    async fn delete(&self, key: &str) -> QueueResult<()> {
        self.check_fail("delete")?;
        self.keys.lock().unwrap().remove(key);
        Ok(())
    }

    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> QueueResult<()> {
        self.check_fail("sorted_add")?;
        let mut keys = self.keys.lock().unwrap();
        Self::purge_expired(&mut keys);
        let keyed = keys.entry(key.to_string()).or_default();
        if let Entry::SortedSet(members) = &mut keyed.entry {
            members.push((score, StoreValue::Raw(member.to_string())));
            members.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        Ok(())
    }

    async fn sorted_range(&self, key: &str, start: i64, stop: i64) -> QueueResult<Vec<StoreValue>> {
        self.check_fail("sorted_range")?;
        let mut keys = self.keys.lock().unwrap();
        Self::purge_expired(&mut keys);
        let Some(Keyed {
            entry: Entry::SortedSet(members),
            ..
        }) = keys.get(key)
        else {
            return Ok(Vec::new());
        };

        let len = members.len() as i64;
        let from = if start < 0 { (len + start).max(0) } else { start.min(len) };
        let to = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if from > to || len == 0 {
            return Ok(Vec::new());
        }
        Ok(members[from as usize..=(to as usize)]
            .iter()
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> QueueResult<u64> {
        self.check_fail("sorted_remove")?;
        let mut keys = self.keys.lock().unwrap();
        let Some(Keyed {
            entry: Entry::SortedSet(members),
            ..
        }) = keys.get_mut(key)
        else {
            return Ok(0);
        };

        let before = members.len();
        members.retain(|(_, v)| v.as_member().map(|m| m != member).unwrap_or(true));
        Ok((before - members.len()) as u64)
    }

    async fn sorted_len(&self, key: &str) -> QueueResult<u64> {
        self.check_fail("sorted_len")?;
        let mut keys = self.keys.lock().unwrap();
        Self::purge_expired(&mut keys);
        match keys.get(key) {
            Some(Keyed {
                entry: Entry::SortedSet(members),
                ..
            }) => Ok(members.len() as u64),
            _ => Ok(0),
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> QueueResult<()> {
        self.check_fail("expire")?;
        let mut keys = self.keys.lock().unwrap();
        if let Some(keyed) = keys.get_mut(key) {
            keyed.expires_at = Self::ttl_deadline(ttl_seconds);
        }
        Ok(())
    }
}
