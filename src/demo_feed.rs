use std::collections::HashMap;
use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use crate::predictions::{AnswerEntry, AnswerInit, MAX_GOALS, can_edit};
use crate::state::{
    ActionCommand, BoardDetail, BoardPage, BoardRow, CreateFlags, Delta, FixtureRow, FriendFlags,
    FriendRow, JoinFlags, LeaveFlags, MemberRow, PredictionPage, PredictionRow, ProfileSummary,
    BOARDS_PER_PAGE, PREDICTIONS_PER_PAGE,
};

pub const DEMO_USER: &str = "alex_hunter";

pub fn spawn_demo_feed(tx: Sender<Delta>, cmd_rx: Receiver<ActionCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let mut world = seed_world();

        let result_interval = Duration::from_secs(
            env::var("DEMO_RESULT_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(40)
                .max(10),
        );
        let mut last_result = Instant::now();

        let _ = tx.send(Delta::Log(
            "[INFO] No SOCAPP_BASE_URL set; serving seeded demo data".to_string(),
        ));
        for cmd in bootstrap_commands() {
            run_command(&mut world, &tx, cmd);
        }

        loop {
            thread::sleep(Duration::from_millis(900));

            if last_result.elapsed() >= result_interval {
                if let Some(line) = settle_random_fixture(&mut world, &mut rng) {
                    let _ = tx.send(Delta::Log(line));
                    let _ = tx.send(Delta::SetFixtures(world.fixtures.clone()));
                    run_command(&mut world, &tx, ActionCommand::FetchProfile);
                }
                last_result = Instant::now();
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                run_command(&mut world, &tx, cmd);
            }
        }
    });
}

fn bootstrap_commands() -> Vec<ActionCommand> {
    vec![
        ActionCommand::FetchFixtures,
        ActionCommand::FetchAnswerForm,
        ActionCommand::FetchBoardPage {
            page: 1,
            search: String::new(),
            background: true,
        },
        ActionCommand::FetchMyBoards,
        ActionCommand::FetchProfile,
        ActionCommand::FetchPredictions {
            page: 1,
            background: true,
        },
    ]
}

fn run_command(world: &mut DemoWorld, tx: &Sender<Delta>, cmd: ActionCommand) {
    match cmd {
        ActionCommand::FetchFixtures => {
            let _ = tx.send(Delta::SetFixtures(world.fixtures.clone()));
        }
        ActionCommand::FetchAnswerForm => {
            let _ = tx.send(Delta::SetAnswerForm(world.answer_rows()));
        }
        ActionCommand::FetchBoardPage { page, search, .. } => {
            let _ = tx.send(Delta::SetBoardPage(world.board_page(page, &search)));
        }
        ActionCommand::SearchBoards { search } => {
            let _ = tx.send(Delta::SetBoardPage(world.board_page(1, &search)));
        }
        ActionCommand::FetchMyBoards => {
            let _ = tx.send(Delta::SetMyBoards(world.my_boards()));
        }
        ActionCommand::FetchBoardDetail { slug } => {
            if let Some(detail) = world.board_detail(&slug) {
                let _ = tx.send(Delta::SetBoardDetail(detail));
            } else {
                let _ = tx.send(Delta::Log(format!("[WARN] No such leaderboard: {slug}")));
            }
        }
        ActionCommand::FetchFriends => {
            let _ = tx.send(Delta::SetFriends(world.friend_rows()));
        }
        ActionCommand::FetchPredictions { page, .. } => {
            let _ = tx.send(Delta::SetPredictions(world.prediction_page(page)));
        }
        ActionCommand::FetchProfile => {
            let _ = tx.send(Delta::SetProfile(world.profile()));
            let _ = tx.send(Delta::SetFriends(world.friend_rows()));
        }
        ActionCommand::JoinBoard { slug } => {
            let flags = world.join(&slug);
            let _ = tx.send(Delta::Joined { slug, flags });
        }
        ActionCommand::LeaveBoard { slug } => {
            let flags = world.leave(&slug);
            let _ = tx.send(Delta::Left { slug, flags });
        }
        ActionCommand::AddFriend { username } => {
            let flags = world.add_friend(&username);
            let _ = tx.send(Delta::FriendChanged { username, flags });
        }
        ActionCommand::RemoveFriend { username } => {
            let flags = world.remove_friend(&username);
            let _ = tx.send(Delta::FriendChanged { username, flags });
        }
        ActionCommand::CreateBoard {
            name,
            capacity,
            is_private,
            password,
        } => {
            let flags = world.create_board(&name, capacity, is_private, &password);
            let _ = tx.send(Delta::BoardCreated(flags));
        }
        ActionCommand::SubmitAnswers {
            entries,
            changed: _,
        } => {
            let saved = world.save_answers(&entries);
            let _ = tx.send(Delta::AnswersSaved { saved });
        }
    }
}

struct DemoBoard {
    slug: String,
    name: String,
    capacity: u32,
    is_private: bool,
    members: Vec<String>,
}

struct DemoWorld {
    boards: Vec<DemoBoard>,
    points: HashMap<String, i64>,
    friends: Vec<String>,
    fixtures: Vec<FixtureRow>,
    answers: HashMap<u32, (u8, u8)>,
}

impl DemoWorld {
    fn answer_rows(&self) -> Vec<AnswerInit> {
        self.fixtures
            .iter()
            .map(|fx| {
                let saved = self.answers.get(&fx.id).copied();
                AnswerInit {
                    fixture: fx.id,
                    home: fx.home.clone(),
                    away: fx.away.clone(),
                    kickoff: fx.kickoff.clone(),
                    team1_goals: saved.map(|(home, _)| home),
                    team2_goals: saved.map(|(_, away)| away),
                }
            })
            .collect()
    }

    // Substring match on the name, ordered case-insensitively, five boards per page
    // with out-of-range pages clamped to the last one.
    fn board_page(&self, page: u32, search: &str) -> BoardPage {
        let mut matched: Vec<&DemoBoard> = self
            .boards
            .iter()
            .filter(|b| search.is_empty() || b.name.contains(search))
            .collect();
        matched.sort_by_key(|b| b.name.to_lowercase());

        let num_pages = (matched.len() as u32).div_ceil(BOARDS_PER_PAGE).max(1);
        let page = page.clamp(1, num_pages);
        let start = ((page - 1) * BOARDS_PER_PAGE) as usize;
        let boards = matched
            .iter()
            .skip(start)
            .take(BOARDS_PER_PAGE as usize)
            .map(|b| self.board_row(b))
            .collect();
        BoardPage {
            boards,
            page,
            num_pages,
        }
    }

    fn board_row(&self, board: &DemoBoard) -> BoardRow {
        BoardRow {
            slug: board.slug.clone(),
            name: board.name.clone(),
            capacity: board.capacity,
            member_count: board.members.len() as u32,
            is_private: board.is_private,
        }
    }

    fn my_boards(&self) -> Vec<BoardRow> {
        self.boards
            .iter()
            .filter(|b| b.members.iter().any(|m| m == DEMO_USER))
            .map(|b| self.board_row(b))
            .collect()
    }

    fn board_detail(&self, slug: &str) -> Option<BoardDetail> {
        let board = self.boards.iter().find(|b| b.slug == slug)?;
        let mut members: Vec<MemberRow> = board
            .members
            .iter()
            .map(|name| MemberRow {
                username: name.clone(),
                points: self.points.get(name).copied().unwrap_or(0),
                is_friend: self.friends.iter().any(|f| f == name),
            })
            .collect();
        members.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.username.cmp(&b.username))
        });
        Some(BoardDetail {
            slug: board.slug.clone(),
            name: board.name.clone(),
            capacity: board.capacity,
            is_private: board.is_private,
            members,
        })
    }

    fn friend_rows(&self) -> Vec<FriendRow> {
        let mut rows: Vec<FriendRow> = self
            .friends
            .iter()
            .map(|name| FriendRow {
                username: name.clone(),
                points: self.points.get(name).copied().unwrap_or(0),
            })
            .collect();
        rows.sort_by(|a, b| b.points.cmp(&a.points));
        rows
    }

    fn prediction_page(&self, page: u32) -> PredictionPage {
        let rows: Vec<PredictionRow> = self
            .fixtures
            .iter()
            .filter_map(|fx| {
                let &(home_goals, away_goals) = self.answers.get(&fx.id)?;
                let points = match (fx.result_home, fx.result_away) {
                    (Some(h), Some(a)) => {
                        Some(score_prediction(home_goals, away_goals, h, a) as i32)
                    }
                    _ => None,
                };
                Some(PredictionRow {
                    fixture_id: fx.id,
                    home: fx.home.clone(),
                    away: fx.away.clone(),
                    kickoff: fx.kickoff.clone(),
                    home_goals,
                    away_goals,
                    points,
                })
            })
            .collect();

        let num_pages = (rows.len() as u32).div_ceil(PREDICTIONS_PER_PAGE).max(1);
        let page = page.clamp(1, num_pages);
        let start = ((page - 1) * PREDICTIONS_PER_PAGE) as usize;
        let rows = rows
            .into_iter()
            .skip(start)
            .take(PREDICTIONS_PER_PAGE as usize)
            .collect();
        PredictionPage {
            rows,
            page,
            num_pages,
        }
    }

    fn profile(&self) -> ProfileSummary {
        let mine = self.points.get(DEMO_USER).copied().unwrap_or(0);
        let user_count = self.points.len() as u32;
        let ahead = self.points.values().filter(|&&p| p > mine).count() as u32;
        let below = self.points.values().filter(|&&p| p < mine).count() as f64;
        ProfileSummary {
            username: DEMO_USER.to_string(),
            points: mine,
            ranking: ahead + 1,
            user_count,
            points_percentage: Some(below * 100.0 / user_count.max(1) as f64),
        }
    }

    fn join(&mut self, slug: &str) -> JoinFlags {
        let Some(board) = self.boards.iter_mut().find(|b| b.slug == slug) else {
            return JoinFlags::default();
        };
        if board.members.len() as u32 == board.capacity {
            return JoinFlags {
                user_added: false,
                board_full: true,
            };
        }
        if !board.members.iter().any(|m| m == DEMO_USER) {
            board.members.push(DEMO_USER.to_string());
        }
        JoinFlags {
            user_added: true,
            board_full: false,
        }
    }

    fn leave(&mut self, slug: &str) -> LeaveFlags {
        let Some(pos) = self.boards.iter().position(|b| b.slug == slug) else {
            return LeaveFlags::default();
        };
        let board = &mut self.boards[pos];
        board.members.retain(|m| m != DEMO_USER);
        let left_private_board = board.is_private;
        let board_empty = board.members.is_empty();
        if board_empty {
            // An emptied board is deleted outright.
            self.boards.remove(pos);
        }
        LeaveFlags {
            user_removed: true,
            board_empty,
            left_private_board,
            url: Some("/leaderboards/".to_string()),
        }
    }

    fn add_friend(&mut self, username: &str) -> FriendFlags {
        if username == DEMO_USER || !self.points.contains_key(username) {
            return FriendFlags::default();
        }
        if !self.friends.iter().any(|f| f == username) {
            self.friends.push(username.to_string());
        }
        FriendFlags {
            friend_added: true,
            friend_removed: false,
        }
    }

    fn remove_friend(&mut self, username: &str) -> FriendFlags {
        let before = self.friends.len();
        self.friends.retain(|f| f != username);
        if self.friends.len() == before {
            return FriendFlags::default();
        }
        FriendFlags {
            friend_added: false,
            friend_removed: true,
        }
    }

    fn create_board(
        &mut self,
        name: &str,
        capacity: u32,
        is_private: bool,
        password: &str,
    ) -> CreateFlags {
        let name = name.trim();
        if name.is_empty() || capacity == 0 {
            return CreateFlags::default();
        }
        if is_private && password.trim().is_empty() {
            return CreateFlags::default();
        }

        let base = slugify(name);
        let mut slug = base.clone();
        let mut suffix = 2;
        while self.boards.iter().any(|b| b.slug == slug) {
            slug = format!("{base}-{suffix}");
            suffix += 1;
        }

        self.boards.push(DemoBoard {
            slug: slug.clone(),
            name: name.to_string(),
            capacity,
            is_private,
            members: vec![DEMO_USER.to_string()],
        });
        CreateFlags {
            board_created: true,
            url: Some(format!("/leaderboards/{slug}/")),
        }
    }

    // Only changed rows on still-editable fixtures are stored, like the form layer
    // upstream of the real endpoint.
    fn save_answers(&mut self, entries: &[AnswerEntry]) -> usize {
        let now = Utc::now().naive_utc();
        let mut saved = 0;
        for entry in entries {
            let (Ok(home), Ok(away)) = (
                entry.team1_goals.parse::<u8>(),
                entry.team2_goals.parse::<u8>(),
            ) else {
                continue;
            };
            if home > MAX_GOALS || away > MAX_GOALS {
                continue;
            }
            let Some(fixture) = self.fixtures.iter().find(|fx| fx.id == entry.fixture) else {
                continue;
            };
            if !can_edit(&fixture.kickoff, now) {
                continue;
            }
            if self.answers.get(&entry.fixture) == Some(&(home, away)) {
                continue;
            }
            self.answers.insert(entry.fixture, (home, away));
            saved += 1;
        }
        saved
    }
}

fn settle_random_fixture(world: &mut DemoWorld, rng: &mut impl Rng) -> Option<String> {
    let pending: Vec<usize> = world
        .fixtures
        .iter()
        .enumerate()
        .filter(|(_, fx)| !fx.has_result())
        .map(|(idx, _)| idx)
        .collect();
    if pending.is_empty() {
        return None;
    }

    let idx = pending[rng.gen_range(0..pending.len())];
    let home_goals = rng.gen_range(0..=3u8);
    let away_goals = rng.gen_range(0..=3u8);
    let (fixture_id, line) = {
        let fixture = &mut world.fixtures[idx];
        fixture.result_home = Some(home_goals);
        fixture.result_away = Some(away_goals);
        (
            fixture.id,
            format!(
                "[INFO] Full time: {} {}-{} {}",
                fixture.home, home_goals, away_goals, fixture.away
            ),
        )
    };
    award_points(world, fixture_id, home_goals, away_goals, rng);
    Some(line)
}

fn award_points(
    world: &mut DemoWorld,
    fixture_id: u32,
    home_goals: u8,
    away_goals: u8,
    rng: &mut impl Rng,
) {
    if let Some(&(pred_home, pred_away)) = world.answers.get(&fixture_id) {
        let gained = score_prediction(pred_home, pred_away, home_goals, away_goals);
        if gained > 0 {
            *world.points.entry(DEMO_USER.to_string()).or_insert(0) += gained;
        }
    }

    // The bots predict off-screen; sample their outcomes.
    let names: Vec<String> = world
        .points
        .keys()
        .filter(|name| name.as_str() != DEMO_USER)
        .cloned()
        .collect();
    for name in names {
        let gained = match rng.gen_range(0..10) {
            0..=1 => 3,
            2..=5 => 1,
            _ => 0,
        };
        if gained > 0 {
            *world.points.entry(name).or_insert(0) += gained;
        }
    }
}

// Exact scoreline scores 3, correct outcome 1.
pub fn score_prediction(pred_home: u8, pred_away: u8, home_goals: u8, away_goals: u8) -> i64 {
    if pred_home == home_goals && pred_away == away_goals {
        return 3;
    }
    if pred_home.cmp(&pred_away) == home_goals.cmp(&away_goals) {
        1
    } else {
        0
    }
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn seed_world() -> DemoWorld {
    let now = Utc::now().naive_utc();
    let kick = |offset_mins: i64| {
        (now + ChronoDuration::minutes(offset_mins))
            .format("%Y-%m-%dT%H:%M")
            .to_string()
    };

    let fixtures = vec![
        fixture(1, "USA", "Wales", kick(-2880), "Group B", Some((1, 1))),
        fixture(2, "England", "Iran", kick(-2760), "Group B", Some((3, 0))),
        fixture(3, "Argentina", "Mexico", kick(-1440), "Group C", Some((2, 0))),
        fixture(4, "France", "Denmark", kick(-1320), "Group D", Some((2, 1))),
        fixture(5, "Spain", "Germany", kick(10), "Group E", None),
        fixture(6, "Brazil", "Switzerland", kick(360), "Group G", None),
        fixture(7, "Portugal", "Uruguay", kick(1560), "Group H", None),
        fixture(8, "Netherlands", "Ecuador", kick(1800), "Group A", None),
        fixture(9, "Belgium", "Croatia", kick(3000), "Group F", None),
        fixture(10, "Japan", "Costa Rica", kick(3240), "Group E", None),
        fixture(11, "Ghana", "South Korea", kick(4440), "Group H", None),
        fixture(12, "Cameroon", "Serbia", kick(4680), "Group G", None),
        fixture(13, "Morocco", "Canada", kick(5880), "Group F", None),
        fixture(14, "Australia", "Tunisia", kick(6120), "Group D", None),
    ];

    let mut answers = HashMap::new();
    answers.insert(1, (1, 1));
    answers.insert(2, (2, 0));
    answers.insert(3, (1, 1));
    answers.insert(4, (2, 1));
    answers.insert(6, (2, 1));

    let mut points: HashMap<String, i64> = HashMap::new();
    for (name, pts) in [
        ("kroos_control", 9),
        ("la_pulga", 12),
        ("hurst66", 5),
        ("panenka", 8),
        ("cruyff_turn", 11),
        ("keeper_kasper", 6),
        ("totti_forever", 10),
        ("zlatan_ego", 7),
        ("puskas9", 4),
        ("socceroo", 3),
        ("magic_magyar", 6),
        ("jbloggs", 2),
    ] {
        points.insert(name.to_string(), pts);
    }
    let mine: i64 = answers
        .iter()
        .filter_map(|(id, &(pred_home, pred_away))| {
            let fx = fixtures.iter().find(|fx| fx.id == *id)?;
            Some(score_prediction(
                pred_home,
                pred_away,
                fx.result_home?,
                fx.result_away?,
            ))
        })
        .sum();
    points.insert(DEMO_USER.to_string(), mine);

    let friends = vec![
        "la_pulga".to_string(),
        "kroos_control".to_string(),
        "hurst66".to_string(),
    ];

    let boards = vec![
        demo_board(
            "global-league",
            "Global League",
            50,
            false,
            &[
                DEMO_USER,
                "kroos_control",
                "la_pulga",
                "hurst66",
                "panenka",
                "cruyff_turn",
                "keeper_kasper",
                "totti_forever",
                "zlatan_ego",
                "puskas9",
                "socceroo",
                "magic_magyar",
                "jbloggs",
            ],
        ),
        demo_board(
            "office-sweepstake",
            "Office Sweepstake",
            10,
            false,
            &["kroos_control", "jbloggs", "keeper_kasper"],
        ),
        demo_board("the-locals", "The Locals", 8, true, &[DEMO_USER, "hurst66"]),
        demo_board(
            "kop-end",
            "Kop End",
            12,
            false,
            &["totti_forever", "zlatan_ego", "puskas9"],
        ),
        demo_board(
            "galacticos",
            "Galacticos",
            4,
            false,
            &["la_pulga", "cruyff_turn", "magic_magyar", "socceroo"],
        ),
        demo_board("samba-squad", "Samba Squad", 6, false, &["panenka"]),
        demo_board(
            "tiki-taka",
            "Tiki Taka",
            5,
            true,
            &["la_pulga", "cruyff_turn"],
        ),
    ];

    DemoWorld {
        boards,
        points,
        friends,
        fixtures,
        answers,
    }
}

fn fixture(
    id: u32,
    home: &str,
    away: &str,
    kickoff: String,
    group: &str,
    result: Option<(u8, u8)>,
) -> FixtureRow {
    FixtureRow {
        id,
        home: home.to_string(),
        away: away.to_string(),
        kickoff,
        group: Some(group.to_string()),
        result_home: result.map(|(home_goals, _)| home_goals),
        result_away: result.map(|(_, away_goals)| away_goals),
    }
}

fn demo_board(
    slug: &str,
    name: &str,
    capacity: u32,
    is_private: bool,
    members: &[&str],
) -> DemoBoard {
    DemoBoard {
        slug: slug.to_string(),
        name: name.to_string(),
        capacity,
        is_private,
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_board_rejects_join() {
        let mut world = seed_world();
        let flags = world.join("galacticos");
        assert!(!flags.user_added);
        assert!(flags.board_full);
    }

    #[test]
    fn join_then_leave_updates_memberships() {
        let mut world = seed_world();
        let joined = world.join("samba-squad");
        assert!(joined.user_added);
        assert!(world.my_boards().iter().any(|b| b.slug == "samba-squad"));

        let left = world.leave("samba-squad");
        assert!(left.user_removed);
        assert!(!left.board_empty);
        assert!(!world.my_boards().iter().any(|b| b.slug == "samba-squad"));
    }

    #[test]
    fn leaving_as_last_member_deletes_the_board() {
        let mut world = seed_world();
        let created = world.create_board("Solo Run", 5, false, "");
        assert!(created.board_created);

        let left = world.leave("solo-run");
        assert!(left.user_removed);
        assert!(left.board_empty);
        assert!(!world.boards.iter().any(|b| b.slug == "solo-run"));
    }

    #[test]
    fn board_pages_clamp_out_of_range_requests() {
        let world = seed_world();
        let page = world.board_page(99, "");
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.boards.len(), 2);
    }

    #[test]
    fn search_filters_by_name_substring() {
        let world = seed_world();
        let page = world.board_page(1, "Squad");
        assert_eq!(page.boards.len(), 1);
        assert_eq!(page.boards[0].slug, "samba-squad");
    }

    #[test]
    fn create_board_slugs_collide_with_a_counter() {
        let mut world = seed_world();
        let first = world.create_board("Half Time", 6, false, "");
        let second = world.create_board("Half Time", 6, false, "");
        assert_eq!(first.url.as_deref(), Some("/leaderboards/half-time/"));
        assert_eq!(second.url.as_deref(), Some("/leaderboards/half-time-2/"));
    }

    #[test]
    fn private_board_needs_a_password() {
        let mut world = seed_world();
        let flags = world.create_board("Secret Seven", 7, true, "  ");
        assert!(!flags.board_created);
    }

    #[test]
    fn exact_score_beats_correct_outcome() {
        assert_eq!(score_prediction(2, 1, 2, 1), 3);
        assert_eq!(score_prediction(3, 1, 2, 1), 1);
        assert_eq!(score_prediction(0, 0, 1, 1), 1);
        assert_eq!(score_prediction(0, 2, 2, 0), 0);
    }

    #[test]
    fn locked_fixtures_are_not_overwritten() {
        let mut world = seed_world();
        let saved = world.save_answers(&[AnswerEntry {
            fixture: 5,
            team1_goals: "2".to_string(),
            team2_goals: "2".to_string(),
        }]);
        assert_eq!(saved, 0);
        assert!(!world.answers.contains_key(&5));
    }

    #[test]
    fn resubmitting_the_same_score_saves_nothing() {
        let mut world = seed_world();
        let saved = world.save_answers(&[AnswerEntry {
            fixture: 6,
            team1_goals: "2".to_string(),
            team2_goals: "1".to_string(),
        }]);
        assert_eq!(saved, 0);
    }
}
