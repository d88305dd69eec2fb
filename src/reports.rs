//! Read-only roster reports computed from the loaded player documents.

use chrono::{Datelike, Local, Month};

use crate::model::{Document, bool_field};
use crate::players_view::{age_group_label, group_names, jersey_label};
use crate::router::Section;
use crate::state::{AppState, Content, PlayerListing, ProviderCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpMonth {
    September,
    April,
}

impl IdpMonth {
    pub fn flag(self) -> &'static str {
        match self {
            IdpMonth::September => "idpMeetingSep",
            IdpMonth::April => "idpMeetingApr",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IdpMonth::September => "September",
            IdpMonth::April => "April",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Players born in the given calendar month (1-12).
    Birthdays { month: u8 },
    IdpMeetings(IdpMonth),
}

impl ReportKind {
    pub fn title(self) -> String {
        match self {
            ReportKind::Birthdays { month } => format!("Birthdays in {}", month_name(month)),
            ReportKind::IdpMeetings(month) => format!("IDP Meetings ({})", month.name()),
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ReportKind::Birthdays { .. } => &["Name", "Age Group", "Birth Date", "Jersey #"],
            ReportKind::IdpMeetings(_) => &["Name", "Age Group", "Jersey #"],
        }
    }

    pub fn empty_message(self) -> String {
        match self {
            ReportKind::Birthdays { month } => format!("No birthdays in {}", month_name(month)),
            ReportKind::IdpMeetings(month) => format!("No IDP meetings in {}", month.name()),
        }
    }
}

fn month_name(month: u8) -> &'static str {
    Month::try_from(month).map(|m| m.name()).unwrap_or("?")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    pub age_group: String,
    pub birth_date: String,
    pub jersey: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Cell texts in [`ReportKind::columns`] order.
    pub fn cells(&self, row: &ReportRow) -> Vec<String> {
        match self.kind {
            ReportKind::Birthdays { .. } => vec![
                row.name.clone(),
                row.age_group.clone(),
                row.birth_date.clone(),
                row.jersey.clone(),
            ],
            ReportKind::IdpMeetings(_) => {
                vec![row.name.clone(), row.age_group.clone(), row.jersey.clone()]
            }
        }
    }
}

/// `day/month/year`, with missing parts left blank.
fn birth_date(doc: &Document) -> String {
    let part = |key: &str| doc.int_field(key).map(|n| n.to_string()).unwrap_or_default();
    format!("{}/{}/{}", part("birthDay"), part("birthMonth"), part("birthYear"))
}

pub fn build_report(kind: ReportKind, listing: &PlayerListing) -> Vec<ReportRow> {
    let names = group_names(listing);
    let selected = listing.players.iter().filter(|doc| match kind {
        ReportKind::Birthdays { month } => doc.int_field("birthMonth") == Some(i64::from(month)),
        ReportKind::IdpMeetings(month) => bool_field(&doc.data, month.flag()),
    });
    let mut rows: Vec<(i64, ReportRow)> = selected
        .map(|doc| {
            let day = doc.int_field("birthDay").unwrap_or(0);
            let row = ReportRow {
                id: doc.id.clone(),
                name: doc.str_field("fullName").unwrap_or_default().to_string(),
                age_group: age_group_label(doc, &names),
                birth_date: birth_date(doc),
                jersey: jersey_label(doc),
            };
            (day, row)
        })
        .collect();
    match kind {
        ReportKind::Birthdays { .. } => {
            rows.sort_by(|(a, ra), (b, rb)| a.cmp(b).then_with(|| ra.name.cmp(&rb.name)));
        }
        ReportKind::IdpMeetings(_) => rows.sort_by(|(_, a), (_, b)| {
            a.age_group.cmp(&b.age_group).then_with(|| a.name.cmp(&b.name))
        }),
    }
    rows.into_iter().map(|(_, row)| row).collect()
}

impl AppState {
    pub fn load_birthdays(&mut self) {
        let month = Local::now().month() as u8;
        self.load_report(ReportKind::Birthdays { month });
    }

    pub fn load_idp_meetings(&mut self, month: IdpMonth) {
        self.load_report(ReportKind::IdpMeetings(month));
    }

    /// Reports ride on the players load; the listing is shaped on arrival.
    pub fn load_report(&mut self, kind: ReportKind) {
        self.show_section(Section::Dashboard);
        let token = self.next_content_token();
        self.report = Some(kind);
        self.content = Content::Loading("Loading report...");
        self.request(ProviderCommand::LoadPlayers { token });
    }

    pub(crate) fn apply_report_loaded(&mut self, kind: ReportKind, result: Result<PlayerListing, String>) {
        self.content = match result {
            Ok(listing) => {
                let rows = build_report(kind, &listing);
                if rows.is_empty() {
                    Content::Message(kind.empty_message())
                } else {
                    Content::Report(Report { kind, rows })
                }
            }
            Err(message) => Content::Message(format!("Error loading players: {message}")),
        };
    }
}
