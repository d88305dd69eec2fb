use std::collections::HashMap;

use crate::model::{Document, PLAYERS, PlayerType};
use crate::router::Section;
use crate::state::{AppState, Confirm, Content, PendingAction, PlayerListing, ProviderCommand};

/// One rendered line of the player table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub id: String,
    pub name: String,
    pub player_type: String,
    pub age_group: String,
    pub jersey: String,
}

pub const PLAYER_COLUMNS: [&str; 5] = ["Name", "Type", "Age Group", "Jersey #", "Actions"];

/// Age-group id to display name.
pub(crate) fn group_names(listing: &PlayerListing) -> HashMap<&str, &str> {
    listing
        .age_groups
        .iter()
        .filter_map(|g| g.str_field("name").map(|name| (g.id.as_str(), name)))
        .collect()
}

pub fn build_rows(listing: &PlayerListing) -> Vec<PlayerRow> {
    let group_names = group_names(listing);

    listing
        .players
        .iter()
        .map(|doc| PlayerRow {
            id: doc.id.clone(),
            name: doc.str_field("fullName").unwrap_or_default().to_string(),
            player_type: doc.str_field("playerType").unwrap_or_default().to_string(),
            age_group: age_group_label(doc, &group_names),
            jersey: jersey_label(doc),
        })
        .collect()
}

pub(crate) fn age_group_label(doc: &Document, group_names: &HashMap<&str, &str>) -> String {
    if let Some(name) = doc.str_field("ageGroup") {
        return name.to_string();
    }
    let Some(id) = doc.str_field("ageGroupId") else {
        return String::new();
    };
    group_names.get(id).copied().unwrap_or(id).to_string()
}

/// Jersey numbers may be stored as text or numbers; absent reads as blank.
pub(crate) fn jersey_label(doc: &Document) -> String {
    match doc.data.get("jerseyNumber") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Client-side narrowing of the player table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Case-insensitive name substring.
    pub query: String,
    pub player_type: Option<PlayerType>,
    /// Exact Age Group label.
    pub age_group: Option<String>,
}

impl RowFilter {
    pub fn matches(&self, row: &PlayerRow) -> bool {
        let needle = self.query.trim().to_lowercase();
        if !needle.is_empty() && !row.name.to_lowercase().contains(&needle) {
            return false;
        }
        if let Some(kind) = self.player_type
            && PlayerType::from_code(&row.player_type) != Some(kind)
        {
            return false;
        }
        self.age_group
            .as_deref()
            .is_none_or(|group| row.age_group == group)
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.player_type.is_none() && self.age_group.is_none()
    }
}

pub fn filter_rows<'a>(rows: &'a [PlayerRow], filter: &RowFilter) -> Vec<&'a PlayerRow> {
    rows.iter().filter(|row| filter.matches(row)).collect()
}

/// Distinct non-empty Age Group labels, sorted.
pub fn age_group_options(rows: &[PlayerRow]) -> Vec<String> {
    let mut groups: Vec<String> = rows
        .iter()
        .filter(|row| !row.age_group.is_empty())
        .map(|row| row.age_group.clone())
        .collect();
    groups.sort();
    groups.dedup();
    groups
}

/// Next value in an All → options → All cycle.
fn cycle<T: Clone + PartialEq>(current: Option<&T>, options: &[T]) -> Option<T> {
    match current.and_then(|c| options.iter().position(|o| o == c)) {
        None if current.is_none() => options.first().cloned(),
        None => None,
        Some(idx) => options.get(idx + 1).cloned(),
    }
}

impl AppState {
    pub fn load_players(&mut self) {
        self.report = None;
        self.show_section(Section::Dashboard);
        let token = self.next_content_token();
        self.content = Content::Loading("Loading players...");
        self.request(ProviderCommand::LoadPlayers { token });
    }

    pub(crate) fn apply_players_loaded(&mut self, token: u64, result: Result<PlayerListing, String>) {
        if token != self.content_token {
            self.push_log(format!("[INFO] Dropped stale player list (request {token})"));
            return;
        }
        if let Some(kind) = self.report {
            self.apply_report_loaded(kind, result);
            return;
        }
        match result {
            Ok(listing) if listing.players.is_empty() => {
                self.player_docs.clear();
                self.content = Content::Message("No players found".to_string());
            }
            Ok(listing) => {
                let rows = build_rows(&listing);
                self.player_docs = listing.players;
                self.content = Content::Players(rows);
                self.clamp_selection();
            }
            Err(message) => {
                self.player_docs.clear();
                self.content = Content::Message(format!("Error loading players: {message}"));
            }
        }
    }

    /// Player rows after the name search and filters, in table order.
    pub fn visible_players(&self) -> Vec<&PlayerRow> {
        match &self.content {
            Content::Players(rows) => filter_rows(rows, &self.row_filter()),
            _ => Vec::new(),
        }
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter {
            query: self.search.clone(),
            player_type: self.type_filter,
            age_group: self.group_filter.clone(),
        }
    }

    pub fn cycle_type_filter(&mut self) {
        self.type_filter = cycle(self.type_filter.as_ref(), &PlayerType::ALL);
        self.selected = 0;
    }

    pub fn cycle_group_filter(&mut self) {
        let options = match &self.content {
            Content::Players(rows) => age_group_options(rows),
            _ => Vec::new(),
        };
        self.group_filter = cycle(self.group_filter.as_ref(), &options);
        self.selected = 0;
    }

    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.search_active = false;
        self.type_filter = None;
        self.group_filter = None;
        self.selected = 0;
    }

    pub fn selected_player(&self) -> Option<&PlayerRow> {
        self.visible_players().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible_players().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_players().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.clamp_selection();
    }

    pub fn request_delete_selected(&mut self) {
        let Some((id, name)) = self
            .selected_player()
            .map(|row| (row.id.clone(), row.name.clone()))
        else {
            return;
        };
        self.confirm = Some(Confirm {
            message: format!("Are you sure you want to delete this player? ({name})"),
            action: PendingAction::DeletePlayer { id },
        });
    }

    pub fn answer_confirm(&mut self, accepted: bool) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        if !accepted {
            return;
        }
        match confirm.action {
            PendingAction::DeletePlayer { id } => {
                self.request(ProviderCommand::DeletePlayer { id });
            }
        }
    }

    /// The refresh is only requested once the delete result is in.
    pub(crate) fn apply_player_deleted(&mut self, id: &str, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.push_log(format!("[INFO] Deleted {PLAYERS}/{id}"));
                self.notify("Player deleted successfully!");
                if self.is_signed_in() {
                    self.load_players();
                }
            }
            Err(message) => self.notify(format!("Error deleting player: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PlayerRow, RowFilter, age_group_options, build_rows, cycle, filter_rows};
    use crate::model::{Document, PlayerType};
    use crate::state::PlayerListing;

    fn row(id: &str, name: &str, kind: &str, group: &str) -> PlayerRow {
        PlayerRow {
            id: id.into(),
            name: name.into(),
            player_type: kind.into(),
            age_group: group.into(),
            jersey: String::new(),
        }
    }

    fn doc(id: &str, value: serde_json::Value) -> Document {
        Document::new(id, value.as_object().cloned().expect("object"))
    }

    #[test]
    fn missing_jersey_renders_blank() {
        let listing = PlayerListing {
            players: vec![doc("p1", json!({"fullName": "Ava Morgan", "playerType": "T"}))],
            age_groups: Vec::new(),
        };
        let rows = build_rows(&listing);
        assert_eq!(rows[0].jersey, "");
        assert_eq!(rows[0].age_group, "");
    }

    #[test]
    fn age_group_prefers_name_then_lookup_then_id() {
        let listing = PlayerListing {
            players: vec![
                doc("p1", json!({"ageGroup": "U12", "ageGroupId": "g1"})),
                doc("p2", json!({"ageGroupId": "g1", "jerseyNumber": 9})),
                doc("p3", json!({"ageGroupId": "gone"})),
            ],
            age_groups: vec![doc("g1", json!({"name": "B 11 & 12"}))],
        };
        let rows = build_rows(&listing);
        assert_eq!(rows[0].age_group, "U12");
        assert_eq!(rows[1].age_group, "B 11 & 12");
        assert_eq!(rows[1].jersey, "9");
        assert_eq!(rows[2].age_group, "gone");
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let rows = vec![
            row("1", "Liam Carter", "FT", ""),
            row("2", "Noah Bennett", "SC", ""),
        ];
        let by_name = |query: &str| RowFilter {
            query: query.into(),
            ..RowFilter::default()
        };
        let hits = filter_rows(&rows, &by_name("CART"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(filter_rows(&rows, &by_name("  ")).len(), 2);
        assert!(by_name("  ").is_empty());
    }

    #[test]
    fn type_and_group_filters_combine_with_search() {
        let rows = vec![
            row("1", "Liam Carter", "FT", "B 11 & 12"),
            row("2", "Leo Hart", "ft", "B 12 & 13"),
            row("3", "Noah Bennett", "SC", "B 11 & 12"),
        ];
        let full_time = RowFilter {
            player_type: Some(PlayerType::FullTime),
            ..RowFilter::default()
        };
        assert_eq!(filter_rows(&rows, &full_time).len(), 2);
        let narrowed = RowFilter {
            age_group: Some("B 11 & 12".into()),
            ..full_time.clone()
        };
        let hits = filter_rows(&rows, &narrowed);
        assert_eq!(hits.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["1"]);
        let none = RowFilter {
            query: "noah".into(),
            ..narrowed
        };
        assert!(filter_rows(&rows, &none).is_empty());
    }

    #[test]
    fn group_options_are_sorted_and_cycle_back_to_all() {
        let rows = vec![
            row("1", "A", "FT", "B 12 & 13"),
            row("2", "B", "FT", "B 11 & 12"),
            row("3", "C", "FT", "B 12 & 13"),
            row("4", "D", "FT", ""),
        ];
        let options = age_group_options(&rows);
        assert_eq!(options, vec!["B 11 & 12", "B 12 & 13"]);
        let first = cycle(None, &options);
        assert_eq!(first.as_deref(), Some("B 11 & 12"));
        let second = cycle(first.as_ref(), &options);
        assert_eq!(second.as_deref(), Some("B 12 & 13"));
        assert_eq!(cycle(second.as_ref(), &options), None);
        assert_eq!(cycle(Some(&"gone".to_string()), &options), None);
    }
}
