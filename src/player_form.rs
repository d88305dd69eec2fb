use crate::form::{Field, Form, SelectOption};
use crate::model::{
    Document, PLAYER_FLAG_LABELS, PLAYER_FLAGS, PLAYERS, PlayerInput, PlayerType, bool_field,
};
use crate::router::Section;
use crate::state::{AppState, FormMode, FormPane, ProviderCommand, SaveKind};

/// The seven player fields; `with_flags` appends the six flag toggles used when editing.
pub fn build_form(age_groups: &[Document], with_flags: bool) -> Form {
    let types = PlayerType::ALL
        .into_iter()
        .map(|t| SelectOption::new(t.code(), format!("{} ({})", t.label(), t.code())))
        .collect();
    let groups = age_groups
        .iter()
        .map(|g| SelectOption::new(g.id.clone(), g.str_field("name").unwrap_or(g.id.as_str())))
        .collect();

    let mut fields = vec![
        Field::text("fullName", "Full Name", true),
        Field::select("playerType", "Player Type", types),
        Field::select("ageGroupId", "Age Group", groups),
        Field::number("birthDay", "Birth Day", 1, 31),
        Field::number("birthMonth", "Birth Month", 1, 12),
        Field::number("birthYear", "Birth Year", 2000, 2020),
        Field::text("jerseyNumber", "Jersey Number", false),
    ];
    if with_flags {
        fields.extend(
            PLAYER_FLAGS
                .into_iter()
                .zip(PLAYER_FLAG_LABELS)
                .map(|(key, label)| Field::toggle(key, label)),
        );
    }
    Form::new(fields)
}

/// Copies a stored player into the form, leaving unknown fields at their defaults.
pub fn prefill(form: &mut Form, doc: &Document) {
    if let Some(name) = doc.str_field("fullName") {
        form.set_value("fullName", name);
    }
    if let Some(kind) = doc.str_field("playerType").and_then(PlayerType::from_code) {
        form.set_value("playerType", kind.code());
    }
    if let Some(group) = doc.str_field("ageGroupId") {
        form.set_value("ageGroupId", group);
    }
    for key in ["birthDay", "birthMonth", "birthYear"] {
        if let Some(n) = doc.int_field(key) {
            form.set_value(key, n.to_string());
        }
    }
    match doc.data.get("jerseyNumber") {
        Some(serde_json::Value::String(s)) => form.set_value("jerseyNumber", s.clone()),
        Some(serde_json::Value::Number(n)) => form.set_value("jerseyNumber", n.to_string()),
        _ => {}
    }
    for flag in PLAYER_FLAGS {
        form.set_value(flag, bool_field(&doc.data, flag).to_string());
    }
}

/// Reads a validated form. Returns `None` (with `form.error` set) when a
/// constraint fails.
pub fn read_input(form: &mut Form) -> Option<PlayerInput> {
    if !form.validate() {
        return None;
    }
    let number = |key: &str| form.value(key).trim().parse::<i64>().ok();
    let player_type = PlayerType::from_code(form.value("playerType"))?;
    let jersey = form.value("jerseyNumber").trim();
    let flags = form
        .has_field(PLAYER_FLAGS[0])
        .then(|| PLAYER_FLAGS.map(|flag| form.is_checked(flag)));
    Some(PlayerInput {
        full_name: form.value("fullName").trim().to_string(),
        player_type,
        age_group_id: form.value("ageGroupId").to_string(),
        birth_day: u8::try_from(number("birthDay")?).ok()?,
        birth_month: u8::try_from(number("birthMonth")?).ok()?,
        birth_year: u16::try_from(number("birthYear")?).ok()?,
        jersey_number: (!jersey.is_empty()).then(|| jersey.to_string()),
        flags,
    })
}

impl AppState {
    pub fn open_add_player(&mut self) {
        self.form_mode = FormMode::Add;
        self.show_section(Section::AddPlayer);
        self.setup_form();
    }

    pub fn open_edit_selected(&mut self) {
        let Some(id) = self.selected_player().map(|row| row.id.clone()) else {
            return;
        };
        self.push_log(format!("[INFO] Editing {PLAYERS}/{id}"));
        self.form_mode = FormMode::Edit { id };
        self.show_section(Section::EditPlayer);
        self.setup_form();
    }

    pub fn setup_form(&mut self) {
        let token = self.next_form_token();
        self.player_form = FormPane::Loading;
        self.request(ProviderCommand::LoadAgeGroups { token });
    }

    pub(crate) fn apply_age_groups_loaded(&mut self, token: u64, result: Result<Vec<Document>, String>) {
        if token != self.form_token {
            self.push_log(format!("[INFO] Dropped stale age groups (request {token})"));
            return;
        }
        self.player_form = match result {
            Ok(groups) => {
                let editing = matches!(self.form_mode, FormMode::Edit { .. });
                let mut form = build_form(&groups, editing);
                if let FormMode::Edit { id } = &self.form_mode
                    && let Some(doc) = self.player_docs.iter().find(|d| &d.id == id)
                {
                    prefill(&mut form, doc);
                }
                FormPane::Ready(form)
            }
            Err(message) => FormPane::Failed(format!("Error loading form: {message}")),
        };
    }

    pub fn submit_player_form(&mut self) {
        let FormPane::Ready(form) = &mut self.player_form else {
            return;
        };
        let Some(input) = read_input(form) else {
            return;
        };
        let cmd = match &self.form_mode {
            FormMode::Add => ProviderCommand::AddPlayer {
                record: input.to_new_record(),
            },
            FormMode::Edit { id } => ProviderCommand::UpdatePlayer {
                id: id.clone(),
                record: input.to_update_record(),
            },
        };
        self.request(cmd);
    }

    /// Back to the roster without saving.
    pub fn leave_player_form(&mut self) {
        self.load_players();
    }

    pub(crate) fn apply_player_saved(&mut self, kind: SaveKind, result: Result<(), String>) {
        match (kind, result) {
            (kind, Ok(())) => {
                let msg = match kind {
                    SaveKind::Added => "Player added successfully!",
                    SaveKind::Updated => "Player updated successfully!",
                };
                self.notify(msg);
                if let FormPane::Ready(form) = &mut self.player_form {
                    form.reset();
                }
                if self.is_signed_in() {
                    self.load_players();
                }
            }
            (SaveKind::Added, Err(message)) => self.notify(format!("Error adding player: {message}")),
            (SaveKind::Updated, Err(message)) => {
                self.notify(format!("Error updating player: {message}"))
            }
        }
    }
}
