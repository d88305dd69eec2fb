//! Capability seams between the roster UI and whatever hosts accounts and documents.

use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use rand::Rng;

use crate::config::{BackendKind, Config};
use crate::error::{AuthError, StoreError};
use crate::model::{Document, Record, Session};

pub mod firebase_auth;
pub mod firestore;
pub mod memory;
pub mod sqlite;

pub trait Authenticator: Send {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Creates the account and signs it in.
    fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AuthError>;

    fn sign_out(&mut self);

    /// Registers a session listener. The current session is sent right away,
    /// then again after every change.
    fn subscribe(&mut self, listener: Sender<Session>);

    /// Renews short-lived credentials before a store call.
    fn refresh(&mut self) -> Result<(), AuthError> {
        Ok(())
    }

    /// Non-fatal problems since the last call, e.g. a session that could not be saved.
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Collection-level access to schemaless documents.
///
/// Implementations own the `createdAt`/`updatedAt` timestamps: `add` stamps
/// both, `update` stamps `updatedAt` and merges the given fields into the
/// existing document.
pub trait DocumentStore: Send {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Returns the id assigned to the new document.
    fn add(&mut self, collection: &str, record: Record) -> Result<String, StoreError>;

    fn update(&mut self, collection: &str, id: &str, record: Record) -> Result<(), StoreError>;

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError>;
}

const MIN_PASSWORD_LEN: usize = 6;
const ID_LEN: usize = 20;
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Random 20-character document id, same shape as Firestore's auto ids.
pub fn new_document_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Account rules enforced by the local backends.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let Some((user, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidEmail);
    };
    if user.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Fan-out of session changes to subscribed channels.
#[derive(Debug, Default)]
pub struct SessionWatchers {
    current: Session,
    listeners: Vec<Sender<Session>>,
}

impl SessionWatchers {
    pub fn current(&self) -> &Session {
        &self.current
    }

    pub fn subscribe(&mut self, listener: Sender<Session>) {
        if listener.send(self.current.clone()).is_ok() {
            self.listeners.push(listener);
        }
    }

    /// Records the new session and notifies listeners, dropping closed ones.
    pub fn publish(&mut self, session: Session) {
        self.current = session;
        let current = &self.current;
        self.listeners
            .retain(|listener| listener.send(current.clone()).is_ok());
    }
}

/// The pair of adapters the provider worker drives.
pub struct Backend {
    pub label: &'static str,
    pub auth: Box<dyn Authenticator>,
    pub store: Box<dyn DocumentStore>,
}

impl Backend {
    pub fn open(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Firebase => {
                let firebase = config
                    .firebase
                    .clone()
                    .context("firebase settings missing")?;
                crate::http_client::init_http_client(config.http_timeout_secs)?;
                let auth = firebase_auth::FirebaseAuth::new(firebase.api_key.clone());
                let store =
                    firestore::FirestoreStore::new(firebase.project_id.clone(), auth.credentials());
                Ok(Self {
                    label: "firebase",
                    auth: Box::new(auth),
                    store: Box::new(store),
                })
            }
            BackendKind::Sqlite => {
                let (auth, store) = sqlite::open(&config.db_path)?;
                Ok(Self {
                    label: "sqlite",
                    auth: Box::new(auth),
                    store: Box::new(store),
                })
            }
            BackendKind::Memory => {
                let (auth, store) = memory::demo_backend();
                Ok(Self {
                    label: "memory",
                    auth: Box::new(auth),
                    store: Box::new(store),
                })
            }
        }
    }
}
