#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Login,
    Register,
    Dashboard,
    AddPlayer,
    EditPlayer,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Login,
        Section::Register,
        Section::Dashboard,
        Section::AddPlayer,
        Section::EditPlayer,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Login => "Login",
            Section::Register => "Register",
            Section::Dashboard => "Dashboard",
            Section::AddPlayer => "Add Player",
            Section::EditPlayer => "Edit Player",
        }
    }
}

/// Holds the single visible section. Activating one deactivates the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    active: Section,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            active: Section::Login,
        }
    }

    pub fn show_section(&mut self, target: Section) {
        self.active = target;
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn is_active(&self, section: Section) -> bool {
        self.active == section
    }
}
