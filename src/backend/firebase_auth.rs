use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::blocking::Response;
use serde::Deserialize;
use serde_json::json;

use super::{Authenticator, SessionWatchers};
use crate::error::AuthError;
use crate::http_client::http_client;
use crate::model::Session;
use crate::persist::{self, StoredSession};

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.id_token.is_empty() || now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Token slot shared between the authenticator (writer) and the document store (reader).
pub type SharedCredentials = Arc<Mutex<Option<Credentials>>>;

pub struct FirebaseAuth {
    api_key: String,
    credentials: SharedCredentials,
    watchers: SessionWatchers,
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirebaseAuth {
    /// Restores a persisted session (if any); its id token is minted on first use.
    pub fn new(api_key: String) -> Self {
        let restored = persist::load_session().map(|stored| Credentials {
            email: stored.email,
            id_token: String::new(),
            refresh_token: stored.refresh_token,
            expires_at: Utc::now(),
        });
        let mut watchers = SessionWatchers::default();
        if let Some(creds) = restored.as_ref() {
            watchers.publish(Session::Authenticated {
                email: creds.email.clone(),
            });
        }
        Self {
            api_key,
            credentials: Arc::new(Mutex::new(restored)),
            watchers,
            warnings: Vec::new(),
        }
    }

    pub fn credentials(&self) -> SharedCredentials {
        Arc::clone(&self.credentials)
    }

    fn password_flow(&mut self, endpoint: &str, email: &str, password: &str) -> Result<(), AuthError> {
        let client = http_client().map_err(|err| AuthError::Transport(err.to_string()))?;
        let url = format!("{IDENTITY_URL}/accounts:{endpoint}?key={}", self.api_key);
        let resp = client
            .post(url)
            .json(&json!({
                "email": email.trim(),
                "password": password,
                "returnSecureToken": true,
            }))
            .send()?;
        let body: PasswordResponse = read_json(resp)?;
        let email = if body.email.is_empty() {
            email.trim().to_lowercase()
        } else {
            body.email
        };
        let creds = Credentials {
            email: email.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        };
        self.store_credentials(Some(creds));
        self.watchers.publish(Session::Authenticated { email });
        Ok(())
    }

    fn store_credentials(&mut self, creds: Option<Credentials>) {
        match creds.as_ref() {
            Some(creds) => {
                let stored = StoredSession {
                    email: creds.email.clone(),
                    refresh_token: creds.refresh_token.clone(),
                };
                if let Err(err) = persist::save_session(&stored) {
                    self.warnings
                        .push(format!("Session not saved, sign in again after restart: {err:#}"));
                }
            }
            None => persist::clear_session(),
        }
        if let Ok(mut slot) = self.credentials.lock() {
            *slot = creds;
        }
    }

    fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let client = http_client().map_err(|err| AuthError::Transport(err.to_string()))?;
        let url = format!("{SECURE_TOKEN_URL}?key={}", self.api_key);
        let resp = client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()?;
        read_json(resp)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, AuthError> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(parse_identity_error(&body)
            .unwrap_or_else(|| AuthError::Backend(format!("http {status}"))));
    }
    serde_json::from_str(&body).map_err(|err| AuthError::Backend(format!("bad auth response: {err}")))
}

/// Extracts the `error.message` code of an identity toolkit error body.
pub fn parse_identity_error(body: &str) -> Option<AuthError> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok()?;
    if envelope.error.message.is_empty() {
        return None;
    }
    Some(AuthError::from_identity_code(&envelope.error.message))
}

fn expiry_from(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.trim().parse::<i64>().unwrap_or(3600);
    Utc::now() + ChronoDuration::seconds(secs)
}

impl Authenticator for FirebaseAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.password_flow("signInWithPassword", email, password)
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.password_flow("signUp", email, password)
    }

    fn sign_out(&mut self) {
        self.store_credentials(None);
        self.watchers.publish(Session::Anonymous);
    }

    fn subscribe(&mut self, listener: Sender<Session>) {
        self.watchers.subscribe(listener);
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn refresh(&mut self) -> Result<(), AuthError> {
        let current = self.credentials.lock().ok().and_then(|slot| slot.clone());
        let Some(creds) = current else {
            return Ok(());
        };
        if !creds.needs_refresh(Utc::now()) {
            return Ok(());
        }
        match self.exchange_refresh_token(&creds.refresh_token) {
            Ok(fresh) => {
                self.store_credentials(Some(Credentials {
                    email: creds.email,
                    id_token: fresh.id_token,
                    refresh_token: fresh.refresh_token,
                    expires_at: expiry_from(&fresh.expires_in),
                }));
                Ok(())
            }
            Err(AuthError::Transport(msg)) => Err(AuthError::Transport(msg)),
            Err(err) => {
                // Revoked or expired refresh token: the session is over.
                self.sign_out();
                Err(err)
            }
        }
    }
}
