use std::collections::VecDeque;

use crate::form::Form;
use crate::model::{AgeGroupStats, Document, PlayerType, Record, Session};
use crate::players_view::PlayerRow;
use crate::reports::{Report, ReportKind};
use crate::router::{Router, Section};

const MAX_LOGS: usize = 200;

/// What the dashboard content area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Idle,
    Loading(&'static str),
    Message(String),
    Players(Vec<PlayerRow>),
    Statistics(Vec<AgeGroupStats>),
    Report(Report),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPane {
    Loading,
    Failed(String),
    Ready(Form),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeletePlayer { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    pub message: String,
    pub action: PendingAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    Login,
    Registration,
}

impl AuthOp {
    pub fn label(self) -> &'static str {
        match self {
            AuthOp::Login => "Login",
            AuthOp::Registration => "Registration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Added,
    Updated,
}

/// Player documents plus the age groups used to label them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerListing {
    pub players: Vec<Document>,
    pub age_groups: Vec<Document>,
}

/// Requests sent to the provider worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignOut,
    LoadPlayers { token: u64 },
    LoadStatistics { token: u64 },
    LoadAgeGroups { token: u64 },
    AddPlayer { record: Record },
    UpdatePlayer { id: String, record: Record },
    DeletePlayer { id: String },
}

/// Results reported back by the provider worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Session(Session),
    AuthFailed { op: AuthOp, message: String },
    PlayersLoaded { token: u64, result: Result<PlayerListing, String> },
    StatisticsLoaded { token: u64, result: Result<Vec<Document>, String> },
    AgeGroupsLoaded { token: u64, result: Result<Vec<Document>, String> },
    PlayerSaved { kind: SaveKind, result: Result<(), String> },
    PlayerDeleted { id: String, result: Result<(), String> },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub router: Router,
    pub session: Session,
    /// Email shown in the header while signed in.
    pub header: Option<String>,
    pub content: Content,
    pub content_token: u64,
    /// Documents behind the last player table, for edit pre-fill.
    pub player_docs: Vec<Document>,
    pub selected: usize,
    pub search: String,
    pub search_active: bool,
    pub type_filter: Option<PlayerType>,
    /// Age Group label the table is narrowed to.
    pub group_filter: Option<String>,
    /// Report the in-flight players load should be shaped into.
    pub report: Option<ReportKind>,
    pub login_form: Form,
    pub register_form: Form,
    pub player_form: FormPane,
    pub form_mode: FormMode,
    pub form_token: u64,
    pub notices: VecDeque<String>,
    pub confirm: Option<Confirm>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub backend_label: String,
    outbox: Vec<ProviderCommand>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            session: Session::Anonymous,
            header: None,
            content: Content::Idle,
            content_token: 0,
            player_docs: Vec::new(),
            selected: 0,
            search: String::new(),
            search_active: false,
            type_filter: None,
            group_filter: None,
            report: None,
            login_form: crate::session::login_form(),
            register_form: crate::session::register_form(),
            player_form: FormPane::Loading,
            form_mode: FormMode::Add,
            form_token: 0,
            notices: VecDeque::new(),
            confirm: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            backend_label: String::new(),
            outbox: Vec::new(),
        }
    }

    pub fn section(&self) -> Section {
        self.router.active()
    }

    /// Routes to `target`. Leaving the dashboard or the player form invalidates
    /// whatever load is still in flight for it.
    pub fn show_section(&mut self, target: Section) {
        let current = self.router.active();
        if current == Section::Dashboard && target != Section::Dashboard {
            self.content_token += 1;
        }
        if matches!(current, Section::AddPlayer | Section::EditPlayer) && current != target {
            self.form_token += 1;
        }
        self.router.show_section(target);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Queues a blocking notice; notices are shown one at a time.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notices.push_back(msg.into());
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    pub fn current_notice(&self) -> Option<&str> {
        self.notices.front().map(String::as_str)
    }

    pub fn request(&mut self, cmd: ProviderCommand) {
        self.outbox.push(cmd);
    }

    pub fn take_commands(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_commands(&self) -> &[ProviderCommand] {
        &self.outbox
    }

    pub(crate) fn next_content_token(&mut self) -> u64 {
        self.content_token += 1;
        self.content_token
    }

    pub(crate) fn next_form_token(&mut self) -> u64 {
        self.form_token += 1;
        self.form_token
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Session(session) => state.on_session_change(session),
        Delta::AuthFailed { op, message } => {
            state.notify(format!("{} Error: {message}", op.label()));
        }
        Delta::PlayersLoaded { token, result } => state.apply_players_loaded(token, result),
        Delta::StatisticsLoaded { token, result } => state.apply_statistics_loaded(token, result),
        Delta::AgeGroupsLoaded { token, result } => state.apply_age_groups_loaded(token, result),
        Delta::PlayerSaved { kind, result } => state.apply_player_saved(kind, result),
        Delta::PlayerDeleted { id, result } => state.apply_player_deleted(&id, result),
        Delta::Log(msg) => state.push_log(msg),
    }
}
