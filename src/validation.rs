use std::collections::{HashMap, HashSet};

// Score inputs keep the field names the server's formset expects, so the same key
// addresses the input on screen and the field in the submit payload.
pub const HOME_GOALS_FIELD: &str = "team1_goals";
pub const AWAY_GOALS_FIELD: &str = "team2_goals";

pub fn home_field_key(row: usize) -> String {
    format!("form-{row}-{HOME_GOALS_FIELD}")
}

pub fn away_field_key(row: usize) -> String {
    format!("form-{row}-{AWAY_GOALS_FIELD}")
}

#[derive(Debug, Clone)]
pub struct ValidationTracker {
    // Each registered key maps to the other member of its pair.
    siblings: HashMap<String, String>,
    invalid: HashSet<String>,
    submit_enabled: bool,
    error_visible: bool,
}

impl Default for ValidationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationTracker {
    pub fn new() -> Self {
        Self {
            siblings: HashMap::new(),
            invalid: HashSet::new(),
            submit_enabled: true,
            error_visible: false,
        }
    }

    pub fn register_pair(&mut self, a: impl Into<String>, b: impl Into<String>) {
        let a = a.into();
        let b = b.into();
        self.siblings.insert(a.clone(), b.clone());
        self.siblings.insert(b, a);
    }

    pub fn sibling_of(&self, field: &str) -> Option<&str> {
        self.siblings.get(field).map(String::as_str)
    }

    // One edit to either member of a pair. The caller supplies both current values;
    // which key is the sibling comes from the registry, not from screen adjacency.
    pub fn on_field_changed(&mut self, field: &str, field_value: &str, sibling_value: &str) {
        let Some(sibling) = self.siblings.get(field).cloned() else {
            // Unregistered key: nothing to validate, gate state untouched.
            return;
        };

        if is_empty(field_value) || is_empty(sibling_value) {
            self.submit_enabled = false;
            self.error_visible = true;
            // Only the empty member(s) get tracked. A member that became non-empty
            // while its pair is still incomplete keeps any stale key it already has;
            // the completing edit below clears it.
            if is_empty(field_value) && !self.invalid.contains(field) {
                self.invalid.insert(field.to_string());
            }
            if is_empty(sibling_value) && !self.invalid.contains(&sibling) {
                self.invalid.insert(sibling.clone());
            }
        } else {
            self.invalid.remove(field);
            self.invalid.remove(&sibling);
            if self.invalid.is_empty() {
                self.submit_enabled = true;
                self.error_visible = false;
            }
            // Other pairs may still be incomplete; leave the gate alone otherwise.
        }
    }

    pub fn is_invalid(&self, field: &str) -> bool {
        self.invalid.contains(field)
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn error_visible(&self) -> bool {
        self.error_visible
    }
}

fn is_empty(value: &str) -> bool {
    value.is_empty()
}
