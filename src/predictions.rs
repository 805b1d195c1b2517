use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationTracker, away_field_key, home_field_key};

pub const MAX_GOALS: u8 = 10;
pub const EDIT_CUTOFF_MINS: i64 = 15;

// One row of the answer form as the server hands it out: the fixture plus whatever
// the user answered previously. Field names follow the server's form layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerInit {
    pub fixture: u32,
    pub home: String,
    pub away: String,
    pub kickoff: String,
    #[serde(default)]
    pub team1_goals: Option<u8>,
    #[serde(default)]
    pub team2_goals: Option<u8>,
}

// One row's worth of the submit payload. Values travel as the raw input text; the
// server's integer cleaning is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEntry {
    pub fixture: u32,
    pub team1_goals: String,
    pub team2_goals: String,
}

#[derive(Debug, Clone)]
pub struct FormRow {
    pub fixture: u32,
    pub home: String,
    pub away: String,
    pub kickoff: String,
    pub home_value: String,
    pub away_value: String,
    pub initial_home: Option<u8>,
    pub initial_away: Option<u8>,
}

impl FormRow {
    pub fn complete(&self) -> bool {
        !self.home_value.is_empty() && !self.away_value.is_empty()
    }

    pub fn changed(&self) -> bool {
        let initial_home = self
            .initial_home
            .map(|g| g.to_string())
            .unwrap_or_default();
        let initial_away = self
            .initial_away
            .map(|g| g.to_string())
            .unwrap_or_default();
        self.home_value != initial_home || self.away_value != initial_away
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone)]
pub struct PredictionForm {
    pub rows: Vec<FormRow>,
    pub tracker: ValidationTracker,
    pub cursor: usize,
    pub side: Side,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionForm {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            tracker: ValidationTracker::new(),
            cursor: 0,
            side: Side::Home,
        }
    }

    // Built once per fetched form. Every row gets its pair registered up front;
    // adjacency on screen plays no part in sibling lookup afterwards.
    pub fn rebuild(&mut self, inits: Vec<AnswerInit>) {
        let mut tracker = ValidationTracker::new();
        let rows: Vec<FormRow> = inits
            .into_iter()
            .map(|init| FormRow {
                fixture: init.fixture,
                home: init.home,
                away: init.away,
                kickoff: init.kickoff,
                home_value: init.team1_goals.map(|g| g.to_string()).unwrap_or_default(),
                away_value: init.team2_goals.map(|g| g.to_string()).unwrap_or_default(),
                initial_home: init.team1_goals,
                initial_away: init.team2_goals,
            })
            .collect();
        for idx in 0..rows.len() {
            tracker.register_pair(home_field_key(idx), away_field_key(idx));
        }
        self.rows = rows;
        self.tracker = tracker;
        if self.cursor >= self.rows.len() {
            self.cursor = 0;
        }
        self.side = Side::Home;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_locked(&self, idx: usize, now: NaiveDateTime) -> bool {
        self.rows
            .get(idx)
            .is_some_and(|row| !can_edit(&row.kickoff, now))
    }

    pub fn next_row(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor + 1) % self.rows.len();
    }

    pub fn prev_row(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            return;
        }
        if self.cursor == 0 {
            self.cursor = self.rows.len() - 1;
        } else {
            self.cursor -= 1;
        }
    }

    pub fn focus_home(&mut self) {
        self.side = Side::Home;
    }

    pub fn focus_away(&mut self) {
        self.side = Side::Away;
    }

    pub fn type_digit(&mut self, c: char, now: NaiveDateTime) {
        if !c.is_ascii_digit() {
            return;
        }
        if self.is_locked(self.cursor, now) {
            return;
        }
        let Some(row) = self.rows.get_mut(self.cursor) else {
            return;
        };
        let value = match self.side {
            Side::Home => &mut row.home_value,
            Side::Away => &mut row.away_value,
        };
        let mut next = value.clone();
        next.push(c);
        if !goal_value_ok(&next) {
            return;
        }
        *value = next;
        self.notify_tracker();
    }

    pub fn backspace(&mut self, now: NaiveDateTime) {
        if self.is_locked(self.cursor, now) {
            return;
        }
        let Some(row) = self.rows.get_mut(self.cursor) else {
            return;
        };
        let value = match self.side {
            Side::Home => &mut row.home_value,
            Side::Away => &mut row.away_value,
        };
        if value.pop().is_none() {
            return;
        }
        self.notify_tracker();
    }

    fn notify_tracker(&mut self) {
        let Some(row) = self.rows.get(self.cursor) else {
            return;
        };
        let (field, field_value, sibling_value) = match self.side {
            Side::Home => (
                home_field_key(self.cursor),
                row.home_value.clone(),
                row.away_value.clone(),
            ),
            Side::Away => (
                away_field_key(self.cursor),
                row.away_value.clone(),
                row.home_value.clone(),
            ),
        };
        self.tracker
            .on_field_changed(&field, &field_value, &sibling_value);
    }

    pub fn submit_enabled(&self) -> bool {
        self.tracker.submit_enabled()
    }

    pub fn error_visible(&self) -> bool {
        self.tracker.error_visible()
    }

    pub fn field_invalid(&self, idx: usize, side: Side) -> bool {
        let key = match side {
            Side::Home => home_field_key(idx),
            Side::Away => away_field_key(idx),
        };
        self.tracker.is_invalid(&key)
    }

    // Full formset: one entry per row, blank values included. Locked rows carry
    // whatever values they were fetched with since edits never reach them.
    pub fn entries(&self) -> Vec<AnswerEntry> {
        self.rows
            .iter()
            .map(|row| AnswerEntry {
                fixture: row.fixture,
                team1_goals: row.home_value.clone(),
                team2_goals: row.away_value.clone(),
            })
            .collect()
    }

    // Rows the server would actually write: changed, complete, and still editable.
    pub fn changed_complete_count(&self, now: NaiveDateTime) -> usize {
        self.rows
            .iter()
            .filter(|row| row.changed() && row.complete() && can_edit(&row.kickoff, now))
            .count()
    }

    // Current snapshot in wire shape, for the local cache.
    pub fn snapshot(&self) -> Vec<AnswerInit> {
        self.rows
            .iter()
            .map(|row| AnswerInit {
                fixture: row.fixture,
                home: row.home.clone(),
                away: row.away.clone(),
                kickoff: row.kickoff.clone(),
                team1_goals: row.home_value.parse().ok(),
                team2_goals: row.away_value.parse().ok(),
            })
            .collect()
    }
}

fn goal_value_ok(value: &str) -> bool {
    value.len() <= 2 && value.parse::<u8>().is_ok_and(|v| v <= MAX_GOALS)
}

// Editable strictly before kickoff minus the cutoff window.
pub fn can_edit(kickoff: &str, now: NaiveDateTime) -> bool {
    let Some(kick) = parse_kickoff(kickoff) else {
        // A fixture without a readable kickoff stays editable; the server is the
        // final gate either way.
        return true;
    };
    now < kick - ChronoDuration::minutes(EDIT_CUTOFF_MINS)
}

pub fn parse_kickoff(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw.trim(), fmt) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_kickoff(s).expect("test datetime")
    }

    #[test]
    fn cutoff_is_fifteen_minutes_before_kickoff() {
        let kickoff = "2026-06-11 18:00";
        assert!(can_edit(kickoff, at("2026-06-11 17:44")));
        // The boundary minute itself is already closed.
        assert!(!can_edit(kickoff, at("2026-06-11 17:45")));
        assert!(!can_edit(kickoff, at("2026-06-11 18:30")));
    }

    #[test]
    fn goal_values_capped_at_ten() {
        assert!(goal_value_ok("0"));
        assert!(goal_value_ok("9"));
        assert!(goal_value_ok("10"));
        assert!(!goal_value_ok("11"));
        assert!(!goal_value_ok("100"));
    }

    #[test]
    fn unreadable_kickoff_stays_editable() {
        assert!(can_edit("TBD", at("2026-06-11 17:44")));
    }
}
