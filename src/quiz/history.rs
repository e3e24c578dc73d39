use super::equation::{Equation, EquationError};

/// Rendered equations, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Renders an answered equation and puts it at the top of the list.
    pub fn record(&mut self, equation: &Equation) -> Result<(), EquationError> {
        let rendered = equation.render()?;
        self.push_front(rendered);
        Ok(())
    }

    pub fn push_front(&mut self, rendered: String) {
        self.entries.insert(0, rendered);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contents of the app data file: one entry per line, each line terminated by `\n`.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(entry);
            text.push('\n');
        }
        return text;
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            entries: text.lines().map(|line| line.to_string()).collect(),
        }
    }
}
