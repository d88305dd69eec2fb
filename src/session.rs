//! Session controller: reacts to session notifications and drives the auth forms.

use crate::form::{Field, Form};
use crate::model::Session;
use crate::router::Section;
use crate::state::{AppState, Content, ProviderCommand};

pub fn login_form() -> Form {
    Form::new(vec![
        Field::text("email", "Email", true),
        Field::password("password", "Password"),
    ])
}

pub fn register_form() -> Form {
    Form::new(vec![
        Field::text("email", "Email", true),
        Field::password("password", "Password"),
        Field::password("confirm", "Confirm Password"),
    ])
}

impl AppState {
    /// Replaces all session-derived UI state. Repeating a notification is harmless.
    pub fn on_session_change(&mut self, session: Session) {
        let changed = self.session != session;
        self.session = session;
        match self.session.clone() {
            Session::Authenticated { email } => {
                self.header = Some(email.clone());
                self.login_form.reset();
                self.register_form.reset();
                if changed {
                    self.push_log(format!("[INFO] Signed in as {email}"));
                }
                self.load_players();
            }
            Session::Anonymous => {
                self.header = None;
                // Drop anything the previous session still has in flight.
                self.content_token += 1;
                self.form_token += 1;
                self.content = Content::Idle;
                self.player_docs.clear();
                self.confirm = None;
                self.report = None;
                self.clear_filters();
                if changed {
                    self.push_log("[INFO] Signed out");
                }
                self.show_section(Section::Login);
            }
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.session, Session::Authenticated { .. })
    }

    pub fn header_line(&self) -> String {
        match self.header.as_deref() {
            Some(email) => format!("Welcome, {email}   [o] Logout"),
            None => String::new(),
        }
    }

    pub fn submit_login(&mut self) {
        if !self.login_form.validate() {
            return;
        }
        let email = self.login_form.value("email").trim().to_string();
        let password = self.login_form.value("password").to_string();
        self.request(ProviderCommand::SignIn { email, password });
    }

    /// Confirm-password mismatch is rejected here; the authenticator never sees it.
    pub fn submit_register(&mut self) {
        if !self.register_form.validate() {
            return;
        }
        if self.register_form.value("password") != self.register_form.value("confirm") {
            self.notify("Passwords don't match!");
            return;
        }
        let email = self.register_form.value("email").trim().to_string();
        let password = self.register_form.value("password").to_string();
        self.request(ProviderCommand::SignUp { email, password });
    }

    pub fn logout(&mut self) {
        if self.is_signed_in() {
            self.request(ProviderCommand::SignOut);
        }
    }

    pub fn toggle_auth_section(&mut self) {
        match self.section() {
            Section::Login => self.show_section(Section::Register),
            Section::Register => self.show_section(Section::Login),
            _ => {}
        }
    }
}
