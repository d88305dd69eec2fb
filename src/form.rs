//! Terminal form model: focusable fields with browser-style constraint checks.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text { required: bool, masked: bool },
    Number { min: i64, max: i64 },
    Select { options: Vec<SelectOption> },
    /// Checkbox; the value is `"true"` or `"false"`.
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl Field {
    pub fn text(key: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text {
                required,
                masked: false,
            },
            value: String::new(),
        }
    }

    pub fn password(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text {
                required: true,
                masked: true,
            },
            value: String::new(),
        }
    }

    pub fn number(key: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Number { min, max },
            value: String::new(),
        }
    }

    /// A select starts on its first option, like an HTML `<select>`.
    pub fn select(key: &'static str, label: &'static str, options: Vec<SelectOption>) -> Self {
        let value = options.first().map(|o| o.value.clone()).unwrap_or_default();
        Self {
            key,
            label,
            kind: FieldKind::Select { options },
            value,
        }
    }

    pub fn toggle(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Toggle,
            value: "false".to_string(),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.value == "true"
    }

    fn flip(&mut self) {
        self.value = (!self.is_checked()).to_string();
    }

    /// Text shown in the input box.
    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Text { masked: true, .. } => "*".repeat(self.value.chars().count()),
            FieldKind::Select { options } => options
                .iter()
                .find(|o| o.value == self.value)
                .map(|o| o.label.clone())
                .unwrap_or_default(),
            FieldKind::Toggle if self.is_checked() => "[x]".to_string(),
            FieldKind::Toggle => "[ ]".to_string(),
            _ => self.value.clone(),
        }
    }

    fn reset(&mut self) {
        self.value = match &self.kind {
            FieldKind::Select { options } => {
                options.first().map(|o| o.value.clone()).unwrap_or_default()
            }
            FieldKind::Toggle => "false".to_string(),
            _ => String::new(),
        };
    }

    fn check(&self) -> Result<(), String> {
        let value = self.value.trim();
        match &self.kind {
            FieldKind::Text { required, .. } => {
                if *required && value.is_empty() {
                    return Err(format!("Please fill out {}.", self.label));
                }
            }
            FieldKind::Number { min, max } => {
                if value.is_empty() {
                    return Err(format!("Please fill out {}.", self.label));
                }
                let Ok(n) = value.parse::<i64>() else {
                    return Err(format!("{} must be a number.", self.label));
                };
                if n < *min || n > *max {
                    return Err(format!("{} must be between {min} and {max}.", self.label));
                }
            }
            FieldKind::Select { options } => {
                if !options.iter().any(|o| o.value == self.value) {
                    return Err(format!("Please select {}.", self.label));
                }
            }
            FieldKind::Toggle => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    /// Inline constraint message from the last rejected submit.
    pub error: Option<String>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn focused(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match field.kind {
            FieldKind::Text { .. } => field.value.push(c),
            FieldKind::Number { .. } if c.is_ascii_digit() || (c == '-' && field.value.is_empty()) => {
                field.value.push(c)
            }
            FieldKind::Toggle if c == ' ' => field.flip(),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && matches!(field.kind, FieldKind::Text { .. } | FieldKind::Number { .. })
        {
            field.value.pop();
        }
    }

    /// Moves the focused select by `step` options, wrapping around. A focused
    /// toggle flips instead.
    pub fn cycle_select(&mut self, step: isize) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        if field.kind == FieldKind::Toggle {
            field.flip();
            return;
        }
        let FieldKind::Select { options } = &field.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let len = options.len() as isize;
        let current = options
            .iter()
            .position(|o| o.value == field.value)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        field.value = options[next].value.clone();
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn is_checked(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key && f.is_checked())
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
            field.value = value.into();
        }
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.focus = 0;
        self.error = None;
    }

    /// Checks every field in order; the first failure is recorded in `error`
    /// and focus jumps to the offending field.
    pub fn validate(&mut self) -> bool {
        for (idx, field) in self.fields.iter().enumerate() {
            if let Err(msg) = field.check() {
                self.error = Some(msg);
                self.focus = idx;
                return false;
            }
        }
        self.error = None;
        true
    }
}
