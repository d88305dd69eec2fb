use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

const DEFAULT_DB_PATH: &str = "football_academy.db";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Firebase,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub firebase: Option<FirebaseConfig>,
    pub db_path: PathBuf,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Loads `.env.local` / `.env` (when present) and reads the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("FIREBASE_API_KEY");
        let project_id = get("FIREBASE_PROJECT_ID");
        let backend = match get("ROSTER_BACKEND").map(|v| v.to_lowercase()).as_deref() {
            Some("firebase") => BackendKind::Firebase,
            Some("sqlite") => BackendKind::Sqlite,
            Some("memory") | Some("demo") => BackendKind::Memory,
            Some(other) => return Err(anyhow!("unknown ROSTER_BACKEND '{other}'")),
            None if api_key.is_some() => BackendKind::Firebase,
            None => BackendKind::Sqlite,
        };

        let firebase = match (api_key, project_id) {
            (Some(api_key), Some(project_id)) => Some(FirebaseConfig {
                api_key,
                project_id,
            }),
            _ => None,
        };
        if backend == BackendKind::Firebase && firebase.is_none() {
            return Err(anyhow!(
                "firebase backend needs FIREBASE_API_KEY and FIREBASE_PROJECT_ID"
            ));
        }

        let db_path = get("ROSTER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let http_timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .max(1);

        Ok(Self {
            backend,
            firebase,
            db_path,
            http_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{BackendKind, Config};

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_sqlite_without_firebase_key() {
        let cfg = config_from(&[]).expect("config");
        assert_eq!(cfg.backend, BackendKind::Sqlite);
        assert_eq!(cfg.db_path.to_str(), Some("football_academy.db"));
        assert_eq!(cfg.http_timeout_secs, 10);
    }

    #[test]
    fn firebase_key_selects_firebase_backend() {
        let cfg = config_from(&[
            ("FIREBASE_API_KEY", "key"),
            ("FIREBASE_PROJECT_ID", "academy"),
        ])
        .expect("config");
        assert_eq!(cfg.backend, BackendKind::Firebase);
        assert_eq!(cfg.firebase.map(|f| f.project_id).as_deref(), Some("academy"));
    }

    #[test]
    fn firebase_backend_without_project_is_rejected() {
        let err = config_from(&[("ROSTER_BACKEND", "firebase"), ("FIREBASE_API_KEY", "k")]);
        assert!(err.is_err());
    }

    #[test]
    fn timeout_is_clamped_to_one_second() {
        let cfg = config_from(&[("ROSTER_BACKEND", "memory"), ("HTTP_TIMEOUT_SECS", "0")])
            .expect("config");
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.http_timeout_secs, 1);
    }
}
