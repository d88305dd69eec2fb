use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "academy_roster";
const SESSION_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;

/// What survives a restart: enough to mint a fresh id token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub email: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session: StoredSession,
}

pub fn load_session() -> Option<StoredSession> {
    let path = session_path()?;
    read_session_file(&path)
}

fn read_session_file(path: &Path) -> Option<StoredSession> {
    let raw = fs::read_to_string(path).ok()?;
    let file = serde_json::from_str::<SessionFile>(&raw).ok()?;
    if file.version != SESSION_VERSION || file.session.refresh_token.is_empty() {
        return None;
    }
    Some(file.session)
}

pub fn save_session(session: &StoredSession) -> Result<()> {
    let Some(path) = session_path() else {
        return Ok(());
    };
    write_session_file(&path, session)
}

fn write_session_file(path: &Path, session: &StoredSession) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = SessionFile {
        version: SESSION_VERSION,
        session: session.clone(),
    };
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(&file).context("serialize session")?;
    fs::write(&tmp, json).context("write session")?;
    fs::rename(&tmp, path).context("swap session")?;
    Ok(())
}

pub fn clear_session() {
    if let Some(path) = session_path() {
        let _ = fs::remove_file(path);
    }
}

fn session_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SESSION_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{StoredSession, read_session_file, write_session_file};

    fn scratch(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("academy_roster_{name}_{}_{nanos}", std::process::id()))
    }

    fn stored() -> StoredSession {
        StoredSession {
            email: "coach@academy.test".into(),
            refresh_token: "ref".into(),
        }
    }

    #[test]
    fn session_file_reads_back() {
        let dir = scratch("persist");
        let path = dir.join("session.json");
        write_session_file(&path, &stored()).expect("write");
        assert_eq!(read_session_file(&path), Some(stored()));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn unwritable_cache_dir_is_an_error() {
        let blocker = scratch("blocker");
        std::fs::write(&blocker, b"not a directory").expect("blocker file");
        let err = write_session_file(&blocker.join("session.json"), &stored());
        assert!(err.is_err());
        let _ = std::fs::remove_file(blocker);
    }
}
