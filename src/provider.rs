use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::backend::Backend;
use crate::error::StoreError;
use crate::model::{AGE_GROUPS, Document, PLAYERS, Session};
use crate::state::{AuthOp, Delta, PlayerListing, ProviderCommand, SaveKind};

/// Owns the backend adapters and turns commands into deltas.
pub struct Provider {
    backend: Backend,
    sessions: Receiver<Session>,
    /// Notifications already seen by the store guard but not yet forwarded.
    pending: VecDeque<Session>,
    session: Session,
}

pub fn spawn_provider(
    backend: Backend,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut provider = Provider::new(backend);
        for delta in provider.take_session_deltas() {
            if tx.send(delta).is_err() {
                return;
            }
        }
        // Ends when the UI drops its command sender.
        for cmd in cmd_rx {
            let mut out = provider.handle(cmd);
            out.extend(provider.take_session_deltas());
            for delta in out {
                if tx.send(delta).is_err() {
                    return;
                }
            }
        }
    })
}

impl Provider {
    pub fn new(mut backend: Backend) -> Self {
        let (session_tx, sessions) = mpsc::channel();
        backend.auth.subscribe(session_tx);
        Self {
            backend,
            sessions,
            pending: VecDeque::new(),
            session: Session::Anonymous,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Session notifications received since the last call, oldest first.
    pub fn take_session_deltas(&mut self) -> Vec<Delta> {
        self.poll_sessions();
        self.pending.drain(..).map(Delta::Session).collect()
    }

    fn poll_sessions(&mut self) {
        while let Ok(session) = self.sessions.try_recv() {
            self.session = session.clone();
            self.pending.push_back(session);
        }
    }

    pub fn handle(&mut self, cmd: ProviderCommand) -> Vec<Delta> {
        let mut out = self.run(cmd);
        out.extend(
            self.backend
                .auth
                .take_warnings()
                .into_iter()
                .map(|msg| Delta::Log(format!("[WARN] {msg}"))),
        );
        out
    }

    fn run(&mut self, cmd: ProviderCommand) -> Vec<Delta> {
        match cmd {
            ProviderCommand::SignIn { email, password } => {
                match self.backend.auth.sign_in(&email, &password) {
                    Ok(()) => Vec::new(),
                    Err(err) => vec![
                        Delta::Log(format!("[WARN] Sign-in failed for {email}: {err}")),
                        Delta::AuthFailed {
                            op: AuthOp::Login,
                            message: err.to_string(),
                        },
                    ],
                }
            }
            ProviderCommand::SignUp { email, password } => {
                match self.backend.auth.sign_up(&email, &password) {
                    Ok(()) => vec![Delta::Log(format!("[INFO] Registered {email}"))],
                    Err(err) => vec![
                        Delta::Log(format!("[WARN] Registration failed for {email}: {err}")),
                        Delta::AuthFailed {
                            op: AuthOp::Registration,
                            message: err.to_string(),
                        },
                    ],
                }
            }
            ProviderCommand::SignOut => {
                self.backend.auth.sign_out();
                Vec::new()
            }
            ProviderCommand::LoadPlayers { token } => {
                let mut out = Vec::new();
                let result = self.load_players(&mut out).map_err(|err| err.to_string());
                match &result {
                    Ok(listing) => out.push(Delta::Log(format!(
                        "[INFO] Loaded {} players from {}",
                        listing.players.len(),
                        self.backend.label
                    ))),
                    Err(err) => out.push(Delta::Log(format!("[WARN] Player list failed: {err}"))),
                }
                out.push(Delta::PlayersLoaded { token, result });
                out
            }
            ProviderCommand::LoadStatistics { token } => {
                let result = self.list(AGE_GROUPS).map_err(|err| err.to_string());
                let mut out = Vec::new();
                if let Err(err) = &result {
                    out.push(Delta::Log(format!("[WARN] Statistics failed: {err}")));
                }
                out.push(Delta::StatisticsLoaded { token, result });
                out
            }
            ProviderCommand::LoadAgeGroups { token } => vec![Delta::AgeGroupsLoaded {
                token,
                result: self.list(AGE_GROUPS).map_err(|err| err.to_string()),
            }],
            ProviderCommand::AddPlayer { record } => {
                let result = self
                    .ready_for_store()
                    .and_then(|()| self.backend.store.add(PLAYERS, record));
                let mut out = Vec::new();
                if let Ok(id) = &result {
                    out.push(Delta::Log(format!("[INFO] Added {PLAYERS}/{id}")));
                }
                out.push(Delta::PlayerSaved {
                    kind: SaveKind::Added,
                    result: result.map(|_| ()).map_err(|err| err.to_string()),
                });
                out
            }
            ProviderCommand::UpdatePlayer { id, record } => {
                let result = self
                    .ready_for_store()
                    .and_then(|()| self.backend.store.update(PLAYERS, &id, record));
                let mut out = Vec::new();
                if result.is_ok() {
                    out.push(Delta::Log(format!("[INFO] Updated {PLAYERS}/{id}")));
                }
                out.push(Delta::PlayerSaved {
                    kind: SaveKind::Updated,
                    result: result.map_err(|err| err.to_string()),
                });
                out
            }
            ProviderCommand::DeletePlayer { id } => {
                let result = self
                    .ready_for_store()
                    .and_then(|()| self.backend.store.delete(PLAYERS, &id));
                vec![Delta::PlayerDeleted {
                    id,
                    result: result.map_err(|err| err.to_string()),
                }]
            }
        }
    }

    /// Age groups are only fetched when there is at least one player; failing
    /// there costs the labels, not the list.
    fn load_players(&mut self, out: &mut Vec<Delta>) -> Result<PlayerListing, StoreError> {
        let players = self.list(PLAYERS)?;
        if players.is_empty() {
            return Ok(PlayerListing::default());
        }
        let age_groups = match self.backend.store.list_all(AGE_GROUPS) {
            Ok(groups) => groups,
            Err(err) => {
                out.push(Delta::Log(format!("[WARN] Age group labels unavailable: {err}")));
                Vec::new()
            }
        };
        Ok(PlayerListing {
            players,
            age_groups,
        })
    }

    fn list(&mut self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.ready_for_store()?;
        self.backend.store.list_all(collection)
    }

    fn ready_for_store(&mut self) -> Result<(), StoreError> {
        self.poll_sessions();
        if self.session == Session::Anonymous {
            return Err(StoreError::NotSignedIn);
        }
        let refreshed = self.backend.auth.refresh();
        // A failed refresh signs the account out; pick that up before deciding.
        self.poll_sessions();
        match refreshed {
            Ok(()) => Ok(()),
            Err(_) if self.session == Session::Anonymous => Err(StoreError::NotSignedIn),
            Err(err) => Err(StoreError::Backend(err.to_string())),
        }
    }
}
