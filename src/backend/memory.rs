use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;

use super::{Authenticator, DocumentStore, SessionWatchers, new_document_id, validate_credentials};
use crate::error::{AuthError, StoreError};
use crate::model::{
    AGE_GROUPS, AgeGroupStats, CREATED_AT, Document, PLAYERS, PlayerInput, PlayerType, Record,
    Session, UPDATED_AT,
};

pub const DEMO_EMAIL: &str = "coach@academy.test";
pub const DEMO_PASSWORD: &str = "academy";

#[derive(Debug, Default)]
pub struct MemoryAuth {
    accounts: HashMap<String, String>,
    watchers: SessionWatchers,
    calls: Arc<Mutex<usize>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        self.accounts
            .insert(email.trim().to_lowercase(), password.to_string());
        self
    }

    /// Shared counter of sign-in/sign-up calls, readable after the auth moves to a worker.
    pub fn call_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }

    fn count_call(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
    }
}

impl Authenticator for MemoryAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.count_call();
        let key = email.trim().to_lowercase();
        match self.accounts.get(&key) {
            Some(stored) if stored == password => {
                self.watchers.publish(Session::Authenticated { email: key });
                Ok(())
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.count_call();
        validate_credentials(email, password)?;
        let key = email.trim().to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailExists);
        }
        self.accounts.insert(key.clone(), password.to_string());
        self.watchers.publish(Session::Authenticated { email: key });
        Ok(())
    }

    fn sign_out(&mut self) {
        self.watchers.publish(Session::Anonymous);
    }

    fn subscribe(&mut self, listener: Sender<Session>) {
        self.watchers.subscribe(listener);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListAll(String),
    Add(String),
    Update(String, String),
    Delete(String, String),
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: HashMap<String, Vec<Document>>,
    failures: HashMap<String, String>,
    calls: Vec<StoreCall>,
}

/// Process-local document store. Clones share the same data, so a test can keep
/// a handle while the worker owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document with a fixed id. Timestamps absent from `data` are
    /// stamped as if the document had just been added.
    pub fn insert(&self, collection: &str, id: &str, mut data: Record) {
        let now = Value::from(Utc::now().to_rfc3339());
        for key in [CREATED_AT, UPDATED_AT] {
            data.entry(key).or_insert_with(|| now.clone());
        }
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, data));
    }

    /// Every later call touching `collection` fails with `message` until cleared.
    pub fn fail_collection(&self, collection: &str, message: &str) {
        self.lock()
            .failures
            .insert(collection.to_string(), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means a test thread panicked mid-call; the data is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, call: StoreCall, collection: &str) -> Result<MutexGuard<'_, MemoryInner>, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if let Some(message) = inner.failures.get(collection) {
            return Err(StoreError::Backend(message.clone()));
        }
        Ok(inner)
    }
}

impl DocumentStore for MemoryStore {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.begin(StoreCall::ListAll(collection.to_string()), collection)?;
        Ok(inner.collections.get(collection).cloned().unwrap_or_default())
    }

    fn add(&mut self, collection: &str, mut record: Record) -> Result<String, StoreError> {
        let mut inner = self.begin(StoreCall::Add(collection.to_string()), collection)?;
        let now = Value::from(Utc::now().to_rfc3339());
        record.insert(CREATED_AT.to_string(), now.clone());
        record.insert(UPDATED_AT.to_string(), now);
        let id = new_document_id();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), record));
        Ok(id)
    }

    fn update(&mut self, collection: &str, id: &str, record: Record) -> Result<(), StoreError> {
        let mut inner = self.begin(
            StoreCall::Update(collection.to_string(), id.to_string()),
            collection,
        )?;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.data.extend(record);
        doc.data
            .insert(UPDATED_AT.to_string(), Value::from(Utc::now().to_rfc3339()));
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(
            StoreCall::Delete(collection.to_string(), id.to_string()),
            collection,
        )?;
        // Deleting a missing document succeeds, as in Firestore.
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }
}

/// In-memory backend pre-loaded with the academy age groups and a few players.
pub fn demo_backend() -> (MemoryAuth, MemoryStore) {
    let auth = MemoryAuth::new().with_account(DEMO_EMAIL, DEMO_PASSWORD);
    let store = MemoryStore::new();

    let groups = seed_age_groups();
    for (idx, group) in groups.iter().enumerate() {
        store.insert(AGE_GROUPS, &format!("ag{}", idx + 1), group.to_record());
    }

    let players = [
        ("Liam Carter", PlayerType::FullTime, "ag1", 14, 3, 2013, Some("7")),
        ("Noah Bennett", PlayerType::Scholarship, "ag2", 2, 11, 2012, Some("10")),
        ("Ava Morgan", PlayerType::Trial, "ag9", 21, 6, 2012, None),
    ];
    for (idx, (name, kind, group, day, month, year, jersey)) in players.into_iter().enumerate() {
        let input = PlayerInput {
            full_name: name.to_string(),
            player_type: kind,
            age_group_id: group.to_string(),
            birth_day: day,
            birth_month: month,
            birth_year: year,
            jersey_number: jersey.map(str::to_string),
            flags: None,
        };
        store.insert(PLAYERS, &format!("p{}", idx + 1), input.to_new_record());
    }

    (auth, store)
}

/// Age-group headcount and budget figures the academy started the season with.
pub fn seed_age_groups() -> Vec<AgeGroupStats> {
    let rows: [(&str, i64, i64, i64, i64, i64, i64); 9] = [
        ("B 11 & 12", 12, 18, 8, 2, 4, 0),
        ("B 12 & 13", 20, 18, 14, 0, 6, 0),
        ("B 13 & 14", 17, 16, 11, 0, 6, 0),
        ("B 14 & 15", 24, 16, 21, 0, 3, 0),
        ("B 15 & 16", 0, 16, 0, 0, 0, 0),
        ("B 16 & 17", 1, 12, 1, 0, 0, 0),
        ("B 17 & 18", 7, 12, 6, 0, 1, 0),
        ("G 10 & 11", 0, 18, 0, 0, 0, 0),
        ("G 12 & 13", 2, 18, 0, 0, 2, 0),
    ];
    rows.into_iter()
        .map(|(name, total, budget, ft, pt, sc, trial)| AgeGroupStats {
            id: String::new(),
            name: name.to_string(),
            total,
            budget,
            ft_players: ft,
            pt_players: pt,
            sc_players: sc,
            trial_players: trial,
        })
        .collect()
}
