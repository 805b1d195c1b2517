use std::fs;
use std::path::PathBuf;

use soccerates_terminal::api::{
    parse_answer_form_json, parse_board_detail_json, parse_board_page_json, parse_create_json,
    parse_fixtures_json, parse_friend_json, parse_join_json, parse_leave_json,
    parse_my_boards_json, parse_prediction_page_json, parse_profile_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_schedule_fixture() {
    let raw = read_fixture("schedule.json");
    let rows = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].home, "USA");
    assert_eq!(rows[0].result_home, Some(1));
    assert_eq!(rows[0].result_away, Some(1));
    assert!(rows[0].has_result());
    assert_eq!(rows[2].group.as_deref(), Some("Group E"));
    assert!(!rows[2].has_result());
    assert!(rows[3].group.is_none());
}

#[test]
fn parses_answer_form_fixture() {
    let raw = read_fixture("answer_form.json");
    let inits = parse_answer_form_json(&raw).expect("fixture should parse");
    assert_eq!(inits.len(), 3);
    assert_eq!(inits[0].fixture, 5);
    assert_eq!(inits[0].team1_goals, Some(1));
    assert_eq!(inits[0].team2_goals, Some(2));
    // The unanswered row comes through with no saved goals at all.
    assert_eq!(inits[2].fixture, 7);
    assert!(inits[2].team1_goals.is_none());
    assert!(inits[2].team2_goals.is_none());
}

#[test]
fn parses_board_page_fixture() {
    let raw = read_fixture("board_page.json");
    let page = parse_board_page_json(&raw).expect("fixture should parse");
    assert_eq!(page.page, 2);
    assert_eq!(page.num_pages, 3);
    assert_eq!(page.boards.len(), 5);
    assert_eq!(page.boards[0].slug, "global-league");
    assert_eq!(page.boards[0].capacity, 50);
    assert!(!page.boards[0].is_private);
    assert!(page.boards[3].is_private);
}

#[test]
fn my_boards_merge_marks_the_private_list() {
    let raw = read_fixture("my_boards.json");
    let boards = parse_my_boards_json(&raw).expect("fixture should parse");
    assert_eq!(boards.len(), 3);
    assert!(!boards[0].is_private);
    assert!(!boards[1].is_private);
    assert_eq!(boards[2].slug, "the-locals");
    assert!(boards[2].is_private);
}

#[test]
fn parses_board_detail_fixture() {
    let raw = read_fixture("board_detail.json");
    let detail = parse_board_detail_json(&raw).expect("fixture should parse");
    assert_eq!(detail.slug, "office-sweepstake");
    assert_eq!(detail.members.len(), 6);
    assert_eq!(detail.members[0].username, "la_pulga");
    assert!(detail.members[0].is_friend);
    assert!(!detail.members[1].is_friend);
    assert!(detail.has_member("alex_hunter"));
    assert!(!detail.has_member("nobody"));
}

#[test]
fn parses_profile_fixture() {
    let raw = read_fixture("profile.json");
    let (summary, friends) = parse_profile_json(&raw).expect("fixture should parse");
    assert_eq!(summary.username, "alex_hunter");
    assert_eq!(summary.points, 7);
    assert_eq!(summary.ranking, 6);
    assert_eq!(summary.user_count, 13);
    assert_eq!(summary.points_percentage, Some(53.8));
    assert_eq!(friends.len(), 3);
    assert_eq!(friends[0].username, "la_pulga");
}

#[test]
fn parses_predictions_fixture() {
    let raw = read_fixture("predictions.json");
    let page = parse_prediction_page_json(&raw).expect("fixture should parse");
    assert_eq!(page.page, 1);
    assert_eq!(page.num_pages, 2);
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0].points, Some(3));
    assert_eq!(page.rows[1].points, Some(1));
    // A prediction on an unplayed fixture has no points yet.
    assert!(page.rows[2].points.is_none());
}

#[test]
fn join_flags_read_absent_keys_as_false() {
    let flags = parse_join_json(r#"{"user_added": true}"#).expect("should parse");
    assert!(flags.user_added);
    assert!(!flags.board_full);

    let flags = parse_join_json(r#"{"board_full": true, "detail": "ignored"}"#)
        .expect("unknown keys should be ignored");
    assert!(!flags.user_added);
    assert!(flags.board_full);
}

#[test]
fn leave_flags_carry_the_destination_url() {
    let raw = r#"{"user_removed": true, "board_empty": true, "url": "/leaderboards/"}"#;
    let flags = parse_leave_json(raw).expect("should parse");
    assert!(flags.user_removed);
    assert!(flags.board_empty);
    assert!(!flags.left_private_board);
    assert_eq!(flags.url.as_deref(), Some("/leaderboards/"));
}

#[test]
fn friend_flags_distinguish_add_from_remove() {
    let added = parse_friend_json(r#"{"friend_added": true}"#).expect("should parse");
    assert!(added.friend_added);
    assert!(!added.friend_removed);

    let removed = parse_friend_json(r#"{"friend_removed": true}"#).expect("should parse");
    assert!(removed.friend_removed);
}

#[test]
fn create_flags_carry_the_new_board_url() {
    let raw = r#"{"board_created": true, "url": "/leaderboards/kane-gang/"}"#;
    let flags = parse_create_json(raw).expect("should parse");
    assert!(flags.board_created);
    assert_eq!(flags.url.as_deref(), Some("/leaderboards/kane-gang/"));
}

#[test]
fn empty_and_null_bodies_fall_back_cleanly() {
    assert!(parse_fixtures_json("null").expect("null should parse").is_empty());
    assert!(parse_fixtures_json("  ").expect("blank should parse").is_empty());
    assert!(
        parse_answer_form_json("null")
            .expect("null should parse")
            .is_empty()
    );

    let page = parse_board_page_json("").expect("blank should parse");
    assert!(page.boards.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.num_pages, 1);

    let flags = parse_join_json("null").expect("null should parse");
    assert!(!flags.user_added);
    assert!(!flags.board_full);

    // Detail and profile bodies are required; an empty one is an error, not a default.
    assert!(parse_board_detail_json("null").is_err());
    assert!(parse_profile_json("").is_err());
}

#[test]
fn malformed_bodies_are_errors() {
    assert!(parse_board_page_json("<html>login</html>").is_err());
    assert!(parse_join_json("not json").is_err());
    assert!(parse_fixtures_json(r#"{"boards": []}"#).is_err());
}
