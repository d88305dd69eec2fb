use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;

use academy_roster::backend::Backend as RosterBackend;
use academy_roster::config::Config;
use academy_roster::form::Form;
use academy_roster::provider::spawn_provider;
use academy_roster::reports::IdpMonth;
use academy_roster::router::Section;
use academy_roster::state::{AppState, Delta, FormPane, ProviderCommand, apply_delta};
use academy_roster::ui;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>, backend_label: &str) -> Self {
        let mut state = AppState::new();
        state.backend_label = backend_label.to_string();
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn flush_commands(&mut self) {
        for cmd in self.state.take_commands() {
            if self.cmd_tx.send(cmd).is_err() {
                self.state.push_log("[WARN] Provider stopped; request dropped");
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.state.confirm.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.state.answer_confirm(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.state.answer_confirm(false)
                }
                _ => {}
            }
            return;
        }
        if self.state.current_notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.state.dismiss_notice();
            }
            return;
        }
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        match self.state.section() {
            Section::Login | Section::Register => self.on_auth_key(key),
            Section::Dashboard => self.on_dashboard_key(key),
            Section::AddPlayer | Section::EditPlayer => self.on_player_form_key(key),
        }
    }

    fn on_auth_key(&mut self, key: KeyEvent) {
        let login = self.state.section() == Section::Login;
        match key.code {
            KeyCode::F(2) => self.state.toggle_auth_section(),
            KeyCode::Enter if login => self.state.submit_login(),
            KeyCode::Enter => self.state.submit_register(),
            _ => edit_form(self.auth_form_mut(), key),
        }
    }

    fn auth_form_mut(&mut self) -> &mut Form {
        if self.state.section() == Section::Login {
            &mut self.state.login_form
        } else {
            &mut self.state.register_form
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state.search_active = false,
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(c) => self.state.push_search_char(c),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('p') => self.state.load_players(),
            KeyCode::Char('a') => self.state.open_add_player(),
            KeyCode::Char('s') => self.state.load_statistics(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('e') => self.state.open_edit_selected(),
            KeyCode::Char('d') => self.state.request_delete_selected(),
            KeyCode::Char('/') => self.state.search_active = true,
            KeyCode::Char('t') => self.state.cycle_type_filter(),
            KeyCode::Char('g') => self.state.cycle_group_filter(),
            KeyCode::Char('b') => self.state.load_birthdays(),
            KeyCode::Char('i') => self.state.load_idp_meetings(IdpMonth::September),
            KeyCode::Char('I') => self.state.load_idp_meetings(IdpMonth::April),
            KeyCode::Char('o') => self.state.logout(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn on_player_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.leave_player_form(),
            KeyCode::Enter => self.state.submit_player_form(),
            _ => {
                if let FormPane::Ready(form) = &mut self.state.player_form {
                    edit_form(form, key);
                }
            }
        }
    }
}

fn edit_form(form: &mut Form, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left => form.cycle_select(-1),
        KeyCode::Right => form.cycle_select(1),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
}

fn main() -> Result<()> {
    let config = Config::load()?;
    let backend = RosterBackend::open(&config).context("opening backend")?;
    let label = backend.label;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let worker = spawn_provider(backend, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut app = App::new(cmd_tx, label);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Hanging up the command channel stops the worker.
    drop(app);
    let _ = worker.join();

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.flush_commands();

        terminal.draw(|f| ui::render(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
            app.flush_commands();
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
