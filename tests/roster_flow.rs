use academy_roster::backend::Backend;
use academy_roster::backend::memory::{DEMO_EMAIL, DEMO_PASSWORD, MemoryAuth, MemoryStore, StoreCall, demo_backend};
use academy_roster::model::{AGE_GROUPS, CREATED_AT, PLAYERS, PlayerType, Session, bool_field};
use academy_roster::provider::Provider;
use academy_roster::reports::{IdpMonth, ReportKind};
use academy_roster::router::Section;
use academy_roster::state::{AppState, Content, Delta, FormPane, ProviderCommand, apply_delta};

/// Runs queued commands through the provider until the state settles.
fn pump(state: &mut AppState, provider: &mut Provider) {
    for delta in provider.take_session_deltas() {
        apply_delta(state, delta);
    }
    loop {
        let cmds = state.take_commands();
        if cmds.is_empty() {
            break;
        }
        for cmd in cmds {
            for delta in provider.handle(cmd) {
                apply_delta(state, delta);
            }
            for delta in provider.take_session_deltas() {
                apply_delta(state, delta);
            }
        }
    }
}

fn demo() -> (AppState, Provider, MemoryStore) {
    let (auth, store) = demo_backend();
    let provider = Provider::new(Backend {
        label: "memory",
        auth: Box::new(auth),
        store: Box::new(store.clone()),
    });
    (AppState::new(), provider, store)
}

fn empty() -> (AppState, Provider, MemoryStore) {
    let store = MemoryStore::new();
    let auth = MemoryAuth::new().with_account(DEMO_EMAIL, DEMO_PASSWORD);
    let provider = Provider::new(Backend {
        label: "memory",
        auth: Box::new(auth),
        store: Box::new(store.clone()),
    });
    (AppState::new(), provider, store)
}

fn log_in(state: &mut AppState, provider: &mut Provider) {
    state.login_form.set_value("email", DEMO_EMAIL);
    state.login_form.set_value("password", DEMO_PASSWORD);
    state.submit_login();
    pump(state, provider);
}

fn player_names(state: &AppState) -> Vec<String> {
    match &state.content {
        Content::Players(rows) => rows.iter().map(|r| r.name.clone()).collect(),
        _ => Vec::new(),
    }
}

#[test]
fn login_routes_to_dashboard_with_labelled_players() {
    let (mut state, mut provider, _) = demo();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Login);

    log_in(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Dashboard);
    assert_eq!(state.header.as_deref(), Some(DEMO_EMAIL));
    let Content::Players(rows) = &state.content else {
        panic!("expected players, got {:?}", state.content);
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].name, "Liam Carter");
    assert_eq!(rows[0].age_group, "B 11 & 12");
    assert_eq!(rows[0].jersey, "7");
    assert_eq!(rows[2].jersey, "");
}

#[test]
fn wrong_password_surfaces_login_error() {
    let (mut state, mut provider, _) = demo();
    state.login_form.set_value("email", DEMO_EMAIL);
    state.login_form.set_value("password", "not-it");
    state.submit_login();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Login);
    assert_eq!(
        state.current_notice(),
        Some("Login Error: The email or password is incorrect.")
    );
}

#[test]
fn registration_signs_in_new_account() {
    let (mut state, mut provider, _) = empty();
    pump(&mut state, &mut provider);
    state.toggle_auth_section();
    state.register_form.set_value("email", "assistant@academy.test");
    state.register_form.set_value("password", "secret1");
    state.register_form.set_value("confirm", "secret1");
    state.submit_register();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Dashboard);
    assert_eq!(state.header.as_deref(), Some("assistant@academy.test"));
}

#[test]
fn duplicate_registration_reports_registration_error() {
    let (mut state, mut provider, _) = demo();
    pump(&mut state, &mut provider);
    state.toggle_auth_section();
    assert_eq!(state.section(), Section::Register);
    state.register_form.set_value("email", DEMO_EMAIL);
    state.register_form.set_value("password", "secret1");
    state.register_form.set_value("confirm", "secret1");
    state.submit_register();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Register);
    assert_eq!(
        state.current_notice(),
        Some("Registration Error: The email address is already in use by another account.")
    );
}

#[test]
fn empty_roster_shows_message_without_age_group_fetch() {
    let (mut state, mut provider, store) = empty();
    log_in(&mut state, &mut provider);
    assert_eq!(state.content, Content::Message("No players found".into()));
    assert_eq!(store.calls(), vec![StoreCall::ListAll(PLAYERS.to_string())]);
}

#[test]
fn player_list_failure_is_shown_inline() {
    let (mut state, mut provider, store) = demo();
    store.fail_collection(PLAYERS, "offline");
    log_in(&mut state, &mut provider);
    assert_eq!(
        state.content,
        Content::Message("Error loading players: offline".into())
    );
    assert!(state.current_notice().is_none());
}

#[test]
fn statistics_table_reports_net_budget() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.load_statistics();
    pump(&mut state, &mut provider);
    let Content::Statistics(rows) = &state.content else {
        panic!("expected statistics, got {:?}", state.content);
    };
    assert_eq!(rows.len(), 9);
    let b14 = rows.iter().find(|r| r.name == "B 14 & 15").expect("row");
    assert_eq!(b14.net(), -8);
    let g10 = rows.iter().find(|r| r.name == "G 10 & 11").expect("row");
    assert_eq!(g10.net(), 18);
}

#[test]
fn empty_statistics_show_message() {
    let (mut state, mut provider, _) = empty();
    log_in(&mut state, &mut provider);
    state.load_statistics();
    pump(&mut state, &mut provider);
    assert_eq!(state.content, Content::Message("No statistics found".into()));
}

#[test]
fn adding_a_player_persists_flags_and_reloads() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.open_add_player();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::AddPlayer);

    let FormPane::Ready(form) = &mut state.player_form else {
        panic!("form not ready");
    };
    form.set_value("fullName", "Mia Lopez");
    form.set_value("playerType", "PT");
    form.set_value("ageGroupId", "ag3");
    form.set_value("birthDay", "5");
    form.set_value("birthMonth", "8");
    form.set_value("birthYear", "2011");
    state.submit_player_form();
    pump(&mut state, &mut provider);

    assert_eq!(state.current_notice(), Some("Player added successfully!"));
    assert_eq!(state.section(), Section::Dashboard);
    assert!(player_names(&state).contains(&"Mia Lopez".to_string()));

    let docs = store.documents(PLAYERS);
    let added = docs
        .iter()
        .find(|d| d.str_field("fullName") == Some("Mia Lopez"))
        .expect("stored");
    assert_eq!(added.id.len(), 20);
    assert!(added.data.contains_key(CREATED_AT));
    assert!(!bool_field(&added.data, "veoMember"));
    assert_eq!(added.data.get("jerseyNumber"), Some(&serde_json::json!("")));
}

#[test]
fn invalid_form_never_reaches_store() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.open_add_player();
    pump(&mut state, &mut provider);
    let before = store.calls().len();
    state.submit_player_form();
    pump(&mut state, &mut provider);
    assert_eq!(store.calls().len(), before);
    let FormPane::Ready(form) = &state.player_form else {
        panic!("form not ready");
    };
    assert_eq!(form.error.as_deref(), Some("Please fill out Full Name."));
}

#[test]
fn age_group_failure_replaces_form_with_error() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    store.fail_collection(AGE_GROUPS, "offline");
    state.open_add_player();
    pump(&mut state, &mut provider);
    assert_eq!(
        state.player_form,
        FormPane::Failed("Error loading form: offline".into())
    );
}

#[test]
fn add_failure_keeps_form_and_shows_notice() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.open_add_player();
    pump(&mut state, &mut provider);
    if let FormPane::Ready(form) = &mut state.player_form {
        form.set_value("fullName", "Mia Lopez");
        form.set_value("birthDay", "5");
        form.set_value("birthMonth", "8");
        form.set_value("birthYear", "2011");
    }
    store.fail_collection(PLAYERS, "quota exceeded");
    state.submit_player_form();
    pump(&mut state, &mut provider);
    assert_eq!(
        state.current_notice(),
        Some("Error adding player: quota exceeded")
    );
    assert_eq!(state.section(), Section::AddPlayer);
    let FormPane::Ready(form) = &state.player_form else {
        panic!("form gone");
    };
    assert_eq!(form.value("fullName"), "Mia Lopez");
}

#[test]
fn delete_waits_for_confirmation_then_reloads() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.select_next();
    state.request_delete_selected();
    let confirm = state.confirm.clone().expect("confirm");
    assert!(confirm.message.starts_with("Are you sure you want to delete this player?"));

    state.answer_confirm(false);
    assert!(state.take_commands().is_empty());

    state.request_delete_selected();
    state.answer_confirm(true);
    pump(&mut state, &mut provider);

    assert_eq!(state.current_notice(), Some("Player deleted successfully!"));
    assert_eq!(player_names(&state), vec!["Liam Carter", "Ava Morgan"]);
    let calls = store.calls();
    let delete_at = calls
        .iter()
        .position(|c| *c == StoreCall::Delete(PLAYERS.into(), "p2".into()))
        .expect("delete issued");
    assert_eq!(
        calls.get(delete_at + 1),
        Some(&StoreCall::ListAll(PLAYERS.into()))
    );
}

#[test]
fn delete_failure_shows_notice() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    store.fail_collection(PLAYERS, "offline");
    state.request_delete_selected();
    state.answer_confirm(true);
    pump(&mut state, &mut provider);
    assert_eq!(state.current_notice(), Some("Error deleting player: offline"));
    assert_eq!(store.documents(PLAYERS).len(), 3);

    state.dismiss_notice();
    store.clear_failures();
    state.request_delete_selected();
    state.answer_confirm(true);
    pump(&mut state, &mut provider);
    assert_eq!(state.current_notice(), Some("Player deleted successfully!"));
    assert_eq!(store.documents(PLAYERS).len(), 2);
}

#[test]
fn edit_prefills_and_preserves_stored_flags() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.select_next();
    state.open_edit_selected();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::EditPlayer);

    let created = store
        .documents(PLAYERS)
        .iter()
        .find(|d| d.id == "p2")
        .map(|d| d.data[CREATED_AT].clone())
        .expect("p2");
    let FormPane::Ready(form) = &mut state.player_form else {
        panic!("form not ready");
    };
    assert_eq!(form.value("fullName"), "Noah Bennett");
    assert_eq!(form.value("jerseyNumber"), "10");
    form.set_value("fullName", "Noah J. Bennett");
    form.set_value("jerseyNumber", "");
    state.submit_player_form();
    pump(&mut state, &mut provider);

    assert_eq!(state.current_notice(), Some("Player updated successfully!"));
    let docs = store.documents(PLAYERS);
    let doc = docs.iter().find(|d| d.id == "p2").expect("p2");
    assert_eq!(doc.str_field("fullName"), Some("Noah J. Bennett"));
    assert_eq!(doc.data.get("jerseyNumber"), Some(&serde_json::json!("")));
    assert_eq!(doc.data.get(CREATED_AT), Some(&created));
    assert!(doc.data.contains_key("veoMember"));
}

#[test]
fn stale_player_list_never_overwrites_statistics() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.load_players();
    state.load_statistics();
    pump(&mut state, &mut provider);
    assert!(matches!(state.content, Content::Statistics(_)));
    assert!(state.logs.iter().any(|l| l.contains("Dropped stale player list")));
}

#[test]
fn results_after_logout_are_ignored() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.load_statistics();
    let cmds = state.take_commands();
    state.logout();
    pump(&mut state, &mut provider);
    assert_eq!(state.section(), Section::Login);

    for cmd in cmds {
        for delta in provider.handle(cmd) {
            apply_delta(&mut state, delta);
        }
    }
    assert_eq!(state.content, Content::Idle);
    assert_eq!(state.section(), Section::Login);
}

#[test]
fn store_guard_rejects_commands_without_session() {
    let (_, mut provider, store) = demo();
    let out = provider.handle(ProviderCommand::DeletePlayer { id: "p1".into() });
    assert!(matches!(
        out.as_slice(),
        [Delta::PlayerDeleted { result: Err(_), .. }]
    ));
    assert_eq!(store.documents(PLAYERS).len(), 3);
    assert_eq!(provider.session(), &Session::Anonymous);
}

#[test]
fn search_filters_rows_by_name() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    for c in "ava".chars() {
        state.push_search_char(c);
    }
    let visible: Vec<_> = state.visible_players().iter().map(|r| r.id.clone()).collect();
    assert_eq!(visible, vec!["p3"]);
    state.request_delete_selected();
    assert!(
        state
            .confirm
            .as_ref()
            .is_some_and(|c| c.message.contains("Ava Morgan"))
    );
}

fn visible_ids(state: &AppState) -> Vec<String> {
    state.visible_players().iter().map(|r| r.id.clone()).collect()
}

#[test]
fn type_and_group_filters_narrow_the_table() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.select_next();

    state.cycle_type_filter();
    assert_eq!(state.type_filter, Some(PlayerType::FullTime));
    assert_eq!(state.selected, 0);
    assert_eq!(visible_ids(&state), vec!["p1"]);
    state.cycle_type_filter();
    assert_eq!(visible_ids(&state), vec!["p2"]);
    for _ in 0..3 {
        state.cycle_type_filter();
    }
    assert_eq!(state.type_filter, None);
    assert_eq!(visible_ids(&state).len(), 3);

    state.cycle_group_filter();
    assert_eq!(state.group_filter.as_deref(), Some("B 11 & 12"));
    assert_eq!(visible_ids(&state), vec!["p1"]);
    state.cycle_type_filter();
    state.cycle_type_filter();
    assert!(state.visible_players().is_empty());
    state.request_delete_selected();
    assert!(state.confirm.is_none());

    state.logout();
    pump(&mut state, &mut provider);
    assert_eq!(state.type_filter, None);
    assert_eq!(state.group_filter, None);
}

#[test]
fn birthday_report_lists_players_born_that_month() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.load_report(ReportKind::Birthdays { month: 11 });
    assert_eq!(state.content, Content::Loading("Loading report..."));
    pump(&mut state, &mut provider);
    let Content::Report(report) = &state.content else {
        panic!("expected report, got {:?}", state.content);
    };
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].name, "Noah Bennett");
    assert_eq!(report.rows[0].birth_date, "2/11/2012");
    assert_eq!(report.rows[0].age_group, "B 12 & 13");
    assert!(state.visible_players().is_empty());

    state.load_report(ReportKind::Birthdays { month: 1 });
    pump(&mut state, &mut provider);
    assert_eq!(state.content, Content::Message("No birthdays in January".into()));

    state.load_players();
    pump(&mut state, &mut provider);
    assert_eq!(player_names(&state).len(), 3);
}

#[test]
fn report_failure_is_shown_inline() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    store.fail_collection(PLAYERS, "offline");
    state.load_idp_meetings(IdpMonth::April);
    pump(&mut state, &mut provider);
    assert_eq!(
        state.content,
        Content::Message("Error loading players: offline".into())
    );
}

#[test]
fn edited_flags_are_saved_and_drive_idp_report() {
    let (mut state, mut provider, store) = demo();
    log_in(&mut state, &mut provider);
    state.load_idp_meetings(IdpMonth::September);
    pump(&mut state, &mut provider);
    assert_eq!(
        state.content,
        Content::Message("No IDP meetings in September".into())
    );

    state.load_players();
    pump(&mut state, &mut provider);
    state.open_edit_selected();
    pump(&mut state, &mut provider);
    let FormPane::Ready(form) = &mut state.player_form else {
        panic!("form not ready");
    };
    assert!(!form.is_checked("idpMeetingSep"));
    let sep = form
        .fields
        .iter()
        .position(|f| f.key == "idpMeetingSep")
        .expect("toggle");
    form.focus = sep;
    form.input_char(' ');
    state.submit_player_form();
    pump(&mut state, &mut provider);
    assert_eq!(state.current_notice(), Some("Player updated successfully!"));

    let docs = store.documents(PLAYERS);
    let liam = docs.iter().find(|d| d.id == "p1").expect("p1");
    assert!(bool_field(&liam.data, "idpMeetingSep"));
    assert!(!bool_field(&liam.data, "idpMeetingApr"));

    state.load_idp_meetings(IdpMonth::September);
    pump(&mut state, &mut provider);
    let Content::Report(report) = &state.content else {
        panic!("expected report, got {:?}", state.content);
    };
    assert_eq!(report.rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["p1"]);
}

#[test]
fn add_form_has_no_flag_toggles() {
    let (mut state, mut provider, _) = demo();
    log_in(&mut state, &mut provider);
    state.open_add_player();
    pump(&mut state, &mut provider);
    let FormPane::Ready(form) = &state.player_form else {
        panic!("form not ready");
    };
    assert_eq!(form.fields.len(), 7);
    assert!(!form.has_field("veoMember"));
}
