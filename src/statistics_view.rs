use crate::model::{AgeGroupStats, Document};
use crate::router::Section;
use crate::state::{AppState, Content, ProviderCommand};

pub const STATISTICS_COLUMNS: [&str; 8] = [
    "Age Group",
    "Total Players",
    "Budget",
    "Net",
    "FT Players",
    "PT Players",
    "SC Players",
    "Trial Players",
];

pub fn build_rows(groups: &[Document]) -> Vec<AgeGroupStats> {
    groups.iter().map(AgeGroupStats::from_document).collect()
}

/// Cell texts in [`STATISTICS_COLUMNS`] order.
pub fn row_cells(stats: &AgeGroupStats) -> [String; 8] {
    [
        stats.name.clone(),
        stats.total.to_string(),
        stats.budget.to_string(),
        stats.net().to_string(),
        stats.ft_players.to_string(),
        stats.pt_players.to_string(),
        stats.sc_players.to_string(),
        stats.trial_players.to_string(),
    ]
}

impl AppState {
    pub fn load_statistics(&mut self) {
        self.show_section(Section::Dashboard);
        let token = self.next_content_token();
        self.content = Content::Loading("Loading statistics...");
        self.request(ProviderCommand::LoadStatistics { token });
    }

    pub(crate) fn apply_statistics_loaded(&mut self, token: u64, result: Result<Vec<Document>, String>) {
        if token != self.content_token {
            self.push_log(format!("[INFO] Dropped stale statistics (request {token})"));
            return;
        }
        self.content = match result {
            Ok(groups) if groups.is_empty() => Content::Message("No statistics found".to_string()),
            Ok(groups) => Content::Statistics(build_rows(&groups)),
            Err(message) => Content::Message(format!("Error loading statistics: {message}")),
        };
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_rows, row_cells};
    use crate::model::Document;

    #[test]
    fn net_is_budget_minus_total_and_may_go_negative() {
        let groups = vec![
            Document::new(
                "g1",
                json!({"name": "B 14 & 15", "total": 24, "budget": 16, "ftPlayers": 21, "scPlayers": 3})
                    .as_object()
                    .cloned()
                    .expect("object"),
            ),
            Document::new("g2", json!({"name": "G 10 & 11"}).as_object().cloned().expect("object")),
        ];
        let rows = build_rows(&groups);
        assert_eq!(
            row_cells(&rows[0]),
            ["B 14 & 15", "24", "16", "-8", "21", "0", "3", "0"].map(String::from)
        );
        assert_eq!(row_cells(&rows[1])[3], "0");
    }

    #[test]
    fn extreme_budget_renders_without_overflow() {
        let groups = vec![Document::new(
            "g1",
            json!({"name": "B 16 & 17", "total": 1, "budget": i64::MIN})
                .as_object()
                .cloned()
                .expect("object"),
        )];
        let cells = row_cells(&build_rows(&groups)[0]);
        assert_eq!(cells[3], i64::MIN.to_string());
    }
}
