use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PLAYERS: &str = "players";
pub const AGE_GROUPS: &str = "ageGroups";

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Untyped key-value payload of a stored document.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Record,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Record) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        str_field(&self.data, key)
    }

    pub fn int_field(&self, key: &str) -> Option<i64> {
        int_field(&self.data, key)
    }
}

/// Non-empty string value of `key`, if any.
pub fn str_field<'a>(data: &'a Record, key: &str) -> Option<&'a str> {
    match data.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Integer value of `key`. Accepts numbers and numeric strings.
pub fn int_field(data: &Record, key: &str) -> Option<i64> {
    match data.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn bool_field(data: &Record, key: &str) -> bool {
    matches!(data.get(key), Some(Value::Bool(true)))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        email: String,
    },
}

impl Session {
    pub fn email(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { email } => Some(email.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    FullTime,
    Scholarship,
    PartTime,
    Trial,
}

impl PlayerType {
    pub const ALL: [PlayerType; 4] = [
        PlayerType::FullTime,
        PlayerType::Scholarship,
        PlayerType::PartTime,
        PlayerType::Trial,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PlayerType::FullTime => "FT",
            PlayerType::Scholarship => "SC",
            PlayerType::PartTime => "PT",
            PlayerType::Trial => "T",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerType::FullTime => "Full Time",
            PlayerType::Scholarship => "Scholarship",
            PlayerType::PartTime => "Part Time",
            PlayerType::Trial => "Trial",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        PlayerType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// Player fields editable through the roster form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInput {
    pub full_name: String,
    pub player_type: PlayerType,
    pub age_group_id: String,
    pub birth_day: u8,
    pub birth_month: u8,
    pub birth_year: u16,
    pub jersey_number: Option<String>,
    /// In [`PLAYER_FLAGS`] order. `None` leaves stored flags alone on update.
    pub flags: Option<[bool; 6]>,
}

pub const PLAYER_FLAGS: [&str; 6] = [
    "veoMember",
    "photos",
    "idpMeetingSep",
    "idpMeetingApr",
    "chat",
    "files",
];

pub const PLAYER_FLAG_LABELS: [&str; 6] = [
    "Veo Member",
    "Photos",
    "IDP Meeting Sep",
    "IDP Meeting Apr",
    "Chat",
    "Files",
];

impl PlayerInput {
    /// Record for a brand-new player: form fields plus every flag, off unless set.
    /// Timestamps are stamped by the store.
    pub fn to_new_record(&self) -> Record {
        let mut record = self.to_update_record();
        let flags = self.flags.unwrap_or_default();
        for (flag, on) in PLAYER_FLAGS.into_iter().zip(flags) {
            record.insert(flag.to_string(), Value::Bool(on));
        }
        record
    }

    /// Only the form-owned fields; merging it leaves `createdAt` untouched.
    pub fn to_update_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("fullName".into(), Value::from(self.full_name.clone()));
        record.insert("playerType".into(), Value::from(self.player_type.code()));
        record.insert("ageGroupId".into(), Value::from(self.age_group_id.clone()));
        record.insert("birthDay".into(), Value::from(self.birth_day));
        record.insert("birthMonth".into(), Value::from(self.birth_month));
        record.insert("birthYear".into(), Value::from(self.birth_year));
        let jersey = self.jersey_number.clone().unwrap_or_default();
        record.insert("jerseyNumber".into(), Value::from(jersey));
        if let Some(flags) = self.flags {
            for (flag, on) in PLAYER_FLAGS.into_iter().zip(flags) {
                record.insert(flag.to_string(), Value::Bool(on));
            }
        }
        record
    }
}

/// Age-group aggregates, with absent numbers read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgeGroupStats {
    pub id: String,
    pub name: String,
    pub total: i64,
    pub budget: i64,
    pub ft_players: i64,
    pub pt_players: i64,
    pub sc_players: i64,
    pub trial_players: i64,
}

impl AgeGroupStats {
    pub fn from_document(doc: &Document) -> Self {
        let int = |key: &str| doc.int_field(key).unwrap_or(0);
        Self {
            id: doc.id.clone(),
            name: doc.str_field("name").unwrap_or_default().to_string(),
            total: int("total"),
            budget: int("budget"),
            ft_players: int("ftPlayers"),
            pt_players: int("ptPlayers"),
            sc_players: int("scPlayers"),
            trial_players: int("trialPlayers"),
        }
    }

    /// Saturates instead of overflowing on out-of-range stored figures.
    pub fn net(&self) -> i64 {
        self.budget.saturating_sub(self.total)
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("total".into(), Value::from(self.total));
        record.insert("budget".into(), Value::from(self.budget));
        record.insert("ftPlayers".into(), Value::from(self.ft_players));
        record.insert("ptPlayers".into(), Value::from(self.pt_players));
        record.insert("scPlayers".into(), Value::from(self.sc_players));
        record.insert("trialPlayers".into(), Value::from(self.trial_players));
        record
    }
}
