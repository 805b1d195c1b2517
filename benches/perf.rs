use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use soccerates_terminal::api::{parse_board_page_json, parse_fixtures_json, parse_profile_json};
use soccerates_terminal::predictions::{AnswerInit, PredictionForm, parse_kickoff};
use soccerates_terminal::state::{MemberRow, board_stats};
use soccerates_terminal::validation::{ValidationTracker, away_field_key, home_field_key};

fn sample_inits(rows: usize) -> Vec<AnswerInit> {
    (0..rows)
        .map(|idx| AnswerInit {
            fixture: idx as u32 + 1,
            home: format!("Home {idx}"),
            away: format!("Away {idx}"),
            kickoff: "2030-06-16T19:00".to_string(),
            team1_goals: None,
            team2_goals: None,
        })
        .collect()
}

fn bench_tracker_edit_storm(c: &mut Criterion) {
    c.bench_function("tracker_edit_storm", |b| {
        b.iter(|| {
            let mut tracker = ValidationTracker::new();
            for row in 0..64 {
                tracker.register_pair(home_field_key(row), away_field_key(row));
            }
            for row in 0..64 {
                tracker.on_field_changed(&home_field_key(row), "1", "");
            }
            for row in 0..64 {
                tracker.on_field_changed(&away_field_key(row), "2", "1");
            }
            black_box(tracker.submit_enabled());
        })
    });
}

fn bench_form_typing(c: &mut Criterion) {
    let inits = sample_inits(48);
    let now = parse_kickoff("2026-06-15 12:00").expect("valid bench datetime");

    c.bench_function("form_typing", |b| {
        b.iter(|| {
            let mut form = PredictionForm::new();
            form.rebuild(inits.clone());
            for _ in 0..form.rows.len() {
                form.type_digit('2', now);
                form.focus_away();
                form.type_digit('1', now);
                form.focus_home();
                form.next_row();
            }
            black_box(form.changed_complete_count(now));
        })
    });
}

fn bench_board_page_parse(c: &mut Criterion) {
    c.bench_function("board_page_parse", |b| {
        b.iter(|| {
            let page = parse_board_page_json(black_box(BOARD_PAGE_JSON)).unwrap();
            black_box(page.boards.len());
        })
    });
}

fn bench_schedule_parse(c: &mut Criterion) {
    c.bench_function("schedule_parse", |b| {
        b.iter(|| {
            let rows = parse_fixtures_json(black_box(SCHEDULE_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_profile_parse(c: &mut Criterion) {
    c.bench_function("profile_parse", |b| {
        b.iter(|| {
            let (summary, friends) = parse_profile_json(black_box(PROFILE_JSON)).unwrap();
            black_box(summary.points);
            black_box(friends.len());
        })
    });
}

fn bench_board_stats(c: &mut Criterion) {
    let members: Vec<MemberRow> = (0..50)
        .map(|idx| MemberRow {
            username: format!("member_{idx}"),
            points: (idx * 7 % 23) as i64,
            is_friend: idx % 5 == 0,
        })
        .collect();

    c.bench_function("board_stats", |b| {
        b.iter(|| {
            let stats = board_stats(black_box(&members));
            black_box(stats.percent_above_average);
        })
    });
}

criterion_group!(
    perf,
    bench_tracker_edit_storm,
    bench_form_typing,
    bench_board_page_parse,
    bench_schedule_parse,
    bench_profile_parse,
    bench_board_stats
);
criterion_main!(perf);

static BOARD_PAGE_JSON: &str = include_str!("../tests/fixtures/board_page.json");
static SCHEDULE_JSON: &str = include_str!("../tests/fixtures/schedule.json");
static PROFILE_JSON: &str = include_str!("../tests/fixtures/profile.json");
