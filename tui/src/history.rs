/// Previously submitted lines, browsed with Up/Down
#[derive(Default)]
pub struct InputHistory {
    entries: Vec<String>,
    position: Option<usize>,
    draft: String,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line. Consecutive duplicates are stored once.
    pub fn push(&mut self, entry: &str) {
        if !entry.is_empty() && self.entries.last().map(String::as_str) != Some(entry) {
            self.entries.push(entry.to_string());
        }
        self.reset_position();
    }

    /// Step back in time. The line being edited is kept as a draft.
    pub fn prev(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        match self.position {
            None => {
                self.draft = current_input.to_string();
                self.position = Some(self.entries.len() - 1);
            }
            Some(pos) if pos > 0 => self.position = Some(pos - 1),
            _ => return None,
        }

        self.position.map(|p| self.entries[p].as_str())
    }

    /// Step forward; past the newest entry the draft comes back
    pub fn next(&mut self) -> Option<&str> {
        match self.position {
            Some(pos) if pos + 1 < self.entries.len() => {
                self.position = Some(pos + 1);
                Some(&self.entries[pos + 1])
            }
            Some(_) => {
                self.position = None;
                Some(&self.draft)
            }
            None => None,
        }
    }

    pub fn reset_position(&mut self) {
        self.position = None;
        self.draft.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
