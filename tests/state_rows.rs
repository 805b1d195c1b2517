use soccerates_terminal::state::{
    AppState, BoardRow, BoardsFocus, FriendRow, MemberRow, board_slug_from_url, board_stats,
};

fn member(username: &str, points: i64) -> MemberRow {
    MemberRow {
        username: username.to_string(),
        points,
        is_friend: false,
    }
}

#[test]
fn board_stats_on_an_empty_board_are_all_zero() {
    let stats = board_stats(&[]);
    assert_eq!(stats.total_points, 0);
    assert_eq!(stats.average_points, 0.0);
    assert_eq!(stats.percent_above_average, 0.0);
}

#[test]
fn board_stats_use_true_division_for_the_average() {
    let stats = board_stats(&[member("a", 3), member("b", 4)]);
    assert_eq!(stats.total_points, 7);
    assert_eq!(stats.average_points, 3.5);
    // Only one of the two sits at or above 3.5.
    assert_eq!(stats.percent_above_average, 50.0);
}

#[test]
fn board_stats_count_members_sitting_exactly_on_the_average() {
    let stats = board_stats(&[member("a", 4), member("b", 4), member("c", 4), member("d", 0)]);
    assert_eq!(stats.total_points, 12);
    assert_eq!(stats.average_points, 3.0);
    assert_eq!(stats.percent_above_average, 75.0);
}

#[test]
fn slug_comes_out_of_a_detail_url() {
    assert_eq!(
        board_slug_from_url("/leaderboards/kane-gang/"),
        Some("kane-gang")
    );
    assert_eq!(
        board_slug_from_url("http://localhost:8000/leaderboards/kop-end/"),
        Some("kop-end")
    );
    assert_eq!(board_slug_from_url("/leaderboards/"), None);
    assert_eq!(board_slug_from_url("/profile/"), None);
}

#[test]
fn board_selection_wraps_in_both_directions() {
    let mut state = AppState::new();
    state.boards = vec![
        BoardRow {
            slug: "a".to_string(),
            name: "A".to_string(),
            capacity: 10,
            member_count: 1,
            is_private: false,
        },
        BoardRow {
            slug: "b".to_string(),
            name: "B".to_string(),
            capacity: 10,
            member_count: 1,
            is_private: false,
        },
    ];

    assert_eq!(state.boards_selected, 0);
    state.select_board_next();
    assert_eq!(state.boards_selected, 1);
    state.select_board_next();
    assert_eq!(state.boards_selected, 0);
    state.select_board_prev();
    assert_eq!(state.boards_selected, 1);
}

#[test]
fn selection_moves_follow_the_focused_panel() {
    let mut state = AppState::new();
    state.boards = vec![BoardRow {
        slug: "a".to_string(),
        name: "A".to_string(),
        capacity: 10,
        member_count: 1,
        is_private: false,
    }];
    state.my_boards = vec![
        BoardRow {
            slug: "m1".to_string(),
            name: "M1".to_string(),
            capacity: 10,
            member_count: 1,
            is_private: false,
        },
        BoardRow {
            slug: "m2".to_string(),
            name: "M2".to_string(),
            capacity: 10,
            member_count: 1,
            is_private: false,
        },
    ];

    state.toggle_boards_focus();
    assert_eq!(state.boards_focus, BoardsFocus::MyBoards);
    state.select_board_next();
    assert_eq!(state.my_boards_selected, 1);
    assert_eq!(state.boards_selected, 0);

    let selected = state.selected_board().expect("a board should be selected");
    assert_eq!(selected.slug, "m2");
}

#[test]
fn friend_selection_on_an_empty_list_stays_at_zero() {
    let mut state = AppState::new();
    state.select_friend_next();
    state.select_friend_prev();
    assert_eq!(state.friends_selected, 0);
    assert!(state.selected_friend().is_none());

    state.friends = vec![FriendRow {
        username: "la_pulga".to_string(),
        points: 12,
    }];
    state.select_friend_next();
    assert_eq!(state.friends_selected, 0);
}

#[test]
fn membership_check_goes_through_my_boards() {
    let mut state = AppState::new();
    state.my_boards = vec![BoardRow {
        slug: "kop-end".to_string(),
        name: "Kop End".to_string(),
        capacity: 12,
        member_count: 4,
        is_private: false,
    }];

    assert!(state.is_my_board("kop-end"));
    assert!(!state.is_my_board("galacticos"));
}

#[test]
fn log_ring_drops_the_oldest_lines() {
    let mut state = AppState::new();
    for i in 0..250 {
        state.push_log(format!("line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
    assert_eq!(state.logs.back().map(String::as_str), Some("line 249"));
}
