use chrono::NaiveDateTime;

use soccerates_terminal::api::formset_payload;
use soccerates_terminal::predictions::{AnswerInit, PredictionForm, Side, parse_kickoff};

fn init(fixture: u32, teams: (&str, &str), kickoff: &str, goals: Option<(u8, u8)>) -> AnswerInit {
    AnswerInit {
        fixture,
        home: teams.0.to_string(),
        away: teams.1.to_string(),
        kickoff: kickoff.to_string(),
        team1_goals: goals.map(|g| g.0),
        team2_goals: goals.map(|g| g.1),
    }
}

fn fresh_form(inits: Vec<AnswerInit>) -> PredictionForm {
    let mut form = PredictionForm::new();
    form.rebuild(inits);
    form
}

fn clock(s: &str) -> NaiveDateTime {
    parse_kickoff(s).expect("test datetime")
}

#[test]
fn typing_fills_the_focused_side() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", None),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
    ]);

    form.type_digit('2', now);
    assert_eq!(form.rows[0].home_value, "2");
    assert!(form.rows[0].away_value.is_empty());
    assert!(!form.submit_enabled());
    assert!(form.error_visible());
    assert!(form.field_invalid(0, Side::Away));
    assert!(!form.field_invalid(0, Side::Home));

    form.focus_away();
    form.type_digit('1', now);
    assert_eq!(form.rows[0].away_value, "1");
    assert!(form.submit_enabled());
    assert!(!form.error_visible());
}

#[test]
fn scores_stop_at_the_ten_goal_cap() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![init(5, ("Spain", "Germany"), "2026-06-16T19:00", None)]);

    form.type_digit('1', now);
    form.type_digit('0', now);
    assert_eq!(form.rows[0].home_value, "10");

    // A third digit never fits, and neither does a value past ten.
    form.type_digit('0', now);
    assert_eq!(form.rows[0].home_value, "10");

    form.backspace(now);
    form.backspace(now);
    form.type_digit('9', now);
    form.type_digit('9', now);
    assert_eq!(form.rows[0].home_value, "9");
}

#[test]
fn backspace_reblocks_a_completed_row() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![init(5, ("Spain", "Germany"), "2026-06-16T19:00", None)]);

    form.type_digit('2', now);
    form.focus_away();
    form.type_digit('1', now);
    assert!(form.submit_enabled());

    form.backspace(now);
    assert!(form.rows[0].away_value.is_empty());
    assert!(!form.submit_enabled());
    assert!(form.field_invalid(0, Side::Away));
}

#[test]
fn rows_inside_the_cutoff_ignore_edits() {
    // Kickoff ten minutes out; the editing window closed five minutes ago.
    let now = clock("2026-06-16 18:50");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", Some((1, 0))),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
    ]);

    assert!(form.is_locked(0, now));
    assert!(!form.is_locked(1, now));

    form.type_digit('5', now);
    form.backspace(now);
    assert_eq!(form.rows[0].home_value, "1");
    assert!(form.submit_enabled());

    form.next_row();
    form.type_digit('3', now);
    assert_eq!(form.rows[1].home_value, "3");
}

#[test]
fn entries_cover_every_row_including_blanks() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", Some((1, 2))),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
        init(7, ("Portugal", "Uruguay"), "2026-06-18T19:00", None),
    ]);

    form.next_row();
    form.type_digit('2', now);
    form.focus_away();
    form.type_digit('1', now);

    let entries = form.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].fixture, 5);
    assert_eq!(entries[0].team1_goals, "1");
    assert_eq!(entries[0].team2_goals, "2");
    assert_eq!(entries[1].team1_goals, "2");
    assert_eq!(entries[1].team2_goals, "1");
    assert_eq!(entries[2].team1_goals, "");
    assert_eq!(entries[2].team2_goals, "");
}

#[test]
fn changed_count_skips_untouched_and_incomplete_rows() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", Some((1, 2))),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
        init(7, ("Portugal", "Uruguay"), "2026-06-18T19:00", None),
    ]);
    assert_eq!(form.changed_complete_count(now), 0);

    // Row 1 gets a full new score, row 2 only half of one.
    form.next_row();
    form.type_digit('2', now);
    form.focus_away();
    form.type_digit('0', now);
    form.next_row();
    form.focus_home();
    form.type_digit('1', now);

    assert_eq!(form.changed_complete_count(now), 1);
}

#[test]
fn changed_count_excludes_rows_past_the_cutoff() {
    let before = clock("2026-06-15 12:00");
    let after = clock("2026-06-16 18:55");
    let mut form = fresh_form(vec![init(5, ("Spain", "Germany"), "2026-06-16T19:00", None)]);

    form.type_digit('2', before);
    form.focus_away();
    form.type_digit('1', before);
    assert_eq!(form.changed_complete_count(before), 1);
    // The same edit stops counting once the window has closed.
    assert_eq!(form.changed_complete_count(after), 0);
}

#[test]
fn rebuild_resets_cursor_and_focus() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", None),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
    ]);
    form.next_row();
    form.focus_away();
    form.type_digit('1', now);
    assert!(!form.submit_enabled());

    form.rebuild(vec![init(7, ("Portugal", "Uruguay"), "2026-06-18T19:00", None)]);
    assert_eq!(form.cursor, 0);
    assert_eq!(form.side, Side::Home);
    assert!(form.rows[0].home_value.is_empty());
    // A rebuilt form starts from a clean gate.
    assert!(form.submit_enabled());
    assert!(!form.error_visible());
}

#[test]
fn formset_payload_leads_with_management_fields() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", Some((1, 2))),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", None),
    ]);
    form.next_row();
    form.type_digit('2', now);

    let fields = formset_payload(&form.entries(), "token123");

    assert_eq!(
        fields[0],
        ("csrfmiddlewaretoken".to_string(), "token123".to_string())
    );
    assert_eq!(fields[1], ("form-TOTAL_FORMS".to_string(), "2".to_string()));
    assert_eq!(
        fields[2],
        ("form-INITIAL_FORMS".to_string(), "2".to_string())
    );
    assert_eq!(fields[3], ("form-MIN_NUM_FORMS".to_string(), "0".to_string()));
    assert_eq!(fields[4], ("form-MAX_NUM_FORMS".to_string(), "2".to_string()));

    assert_eq!(fields[5], ("form-0-fixture".to_string(), "5".to_string()));
    assert_eq!(fields[6], ("form-0-team1_goals".to_string(), "1".to_string()));
    assert_eq!(fields[7], ("form-0-team2_goals".to_string(), "2".to_string()));
    assert_eq!(fields[8], ("form-1-fixture".to_string(), "6".to_string()));
    assert_eq!(fields[9], ("form-1-team1_goals".to_string(), "2".to_string()));
    assert_eq!(fields[10], ("form-1-team2_goals".to_string(), String::new()));
}

#[test]
fn cache_snapshot_restores_as_saved_values() {
    let now = clock("2026-06-15 12:00");
    let mut form = fresh_form(vec![
        init(5, ("Spain", "Germany"), "2026-06-16T19:00", None),
        init(6, ("Brazil", "Switzerland"), "2026-06-17T17:00", Some((2, 1))),
    ]);
    form.type_digit('3', now);
    form.focus_away();
    form.type_digit('0', now);

    let snapshot = form.snapshot();
    assert_eq!(snapshot[0].team1_goals, Some(3));
    assert_eq!(snapshot[0].team2_goals, Some(0));
    assert_eq!(snapshot[1].team1_goals, Some(2));

    let mut restored = PredictionForm::new();
    restored.rebuild(snapshot);
    assert_eq!(restored.rows[0].home_value, "3");
    assert_eq!(restored.rows[0].away_value, "0");
    // Restored values count as saved, not as pending edits.
    assert_eq!(restored.changed_complete_count(now), 0);
}
