use std::collections::VecDeque;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::predictions::{AnswerEntry, AnswerInit, PredictionForm};

pub const ALERT_TRANSPORT: &str = "Request failed. Check your connection.";
pub const ALERT_UNPROCESSED: &str = "Unable to process request.";
pub const ALERT_BOARD_FULL: &str = "This leaderboard is full.";
pub const ALERT_PRIVATE_BOARD: &str = "This leaderboard is private.";

pub const BOARDS_PER_PAGE: u32 = 5;
pub const PREDICTIONS_PER_PAGE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Fixtures,
    Predict,
    Boards,
    BoardDetail { slug: String },
    CreateBoard,
    Profile,
    Friends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardsFocus {
    AllBoards,
    MyBoards,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRow {
    pub slug: String,
    pub name: String,
    pub capacity: u32,
    pub member_count: u32,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPage {
    pub boards: Vec<BoardRow>,
    pub page: u32,
    pub num_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    pub username: String,
    pub points: i64,
    #[serde(default)]
    pub is_friend: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    pub slug: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub is_private: bool,
    // Ordered by points descending, the way the server renders the page.
    pub members: Vec<MemberRow>,
}

impl BoardDetail {
    pub fn has_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m.username == username)
    }

    pub fn stats(&self) -> BoardStats {
        board_stats(&self.members)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardStats {
    pub total_points: i64,
    pub average_points: f64,
    pub percent_above_average: f64,
}

// Same arithmetic the board page shows: sum, true-division average, and the share of
// members at or above that average.
pub fn board_stats(members: &[MemberRow]) -> BoardStats {
    if members.is_empty() {
        return BoardStats {
            total_points: 0,
            average_points: 0.0,
            percent_above_average: 0.0,
        };
    }
    let total: i64 = members.iter().map(|m| m.points).sum();
    let count = members.len() as f64;
    let average = total as f64 / count;
    let at_or_above = members
        .iter()
        .filter(|m| m.points as f64 >= average)
        .count();
    BoardStats {
        total_points: total,
        average_points: average,
        percent_above_average: at_or_above as f64 * 100.0 / count,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRow {
    pub username: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRow {
    pub id: u32,
    pub home: String,
    pub away: String,
    pub kickoff: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub result_home: Option<u8>,
    #[serde(default)]
    pub result_away: Option<u8>,
}

impl FixtureRow {
    pub fn has_result(&self) -> bool {
        self.result_home.is_some() && self.result_away.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub fixture_id: u32,
    pub home: String,
    pub away: String,
    pub kickoff: String,
    pub home_goals: u8,
    pub away_goals: u8,
    #[serde(default)]
    pub points: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPage {
    pub rows: Vec<PredictionRow>,
    pub page: u32,
    pub num_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub username: String,
    pub points: i64,
    pub ranking: u32,
    pub user_count: u32,
    #[serde(default)]
    pub points_percentage: Option<f64>,
}

// Flag payloads the membership endpoints answer with. Absent keys read as false so a
// well-formed response with none of the expected flags still deserializes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JoinFlags {
    #[serde(default)]
    pub user_added: bool,
    #[serde(default)]
    pub board_full: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveFlags {
    #[serde(default)]
    pub user_removed: bool,
    #[serde(default)]
    pub board_empty: bool,
    #[serde(default)]
    pub left_private_board: bool,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FriendFlags {
    #[serde(default)]
    pub friend_added: bool,
    #[serde(default)]
    pub friend_removed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFlags {
    #[serde(default)]
    pub board_created: bool,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateBoardForm {
    pub name: String,
    pub capacity: String,
    pub is_private: bool,
    pub password: String,
    pub field: usize,
}

impl CreateBoardForm {
    // Password input only exists while the private box is ticked.
    pub fn field_count(&self) -> usize {
        if self.is_private { 4 } else { 3 }
    }

    pub fn next_field(&mut self) {
        self.field = (self.field + 1) % self.field_count();
    }

    pub fn prev_field(&mut self) {
        if self.field == 0 {
            self.field = self.field_count() - 1;
        } else {
            self.field -= 1;
        }
    }

    pub fn toggle_private(&mut self) {
        self.is_private = !self.is_private;
        if !self.is_private {
            self.password.clear();
            if self.field >= self.field_count() {
                self.field = 0;
            }
        }
    }

    pub fn capacity_value(&self) -> Option<u32> {
        self.capacity.parse().ok()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub username: String,
    pub fixtures: Vec<FixtureRow>,
    pub fixtures_selected: usize,
    pub fixtures_cached_at: Option<SystemTime>,
    pub form: PredictionForm,
    pub boards: Vec<BoardRow>,
    pub boards_page: u32,
    pub boards_num_pages: u32,
    pub boards_selected: usize,
    pub boards_loading: bool,
    pub boards_cached_at: Option<SystemTime>,
    pub boards_focus: BoardsFocus,
    pub board_search: String,
    pub board_search_active: bool,
    pub my_boards: Vec<BoardRow>,
    pub my_boards_selected: usize,
    pub board_detail: Option<BoardDetail>,
    pub detail_loading: bool,
    pub members_selected: usize,
    pub create_form: CreateBoardForm,
    pub friends: Vec<FriendRow>,
    pub friends_selected: usize,
    pub friends_cached_at: Option<SystemTime>,
    pub friend_input: String,
    pub friend_input_active: bool,
    pub predictions: Vec<PredictionRow>,
    pub predictions_page: u32,
    pub predictions_num_pages: u32,
    pub predictions_selected: usize,
    pub profile: Option<ProfileSummary>,
    pub alert: Option<String>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    // Follow-up fetches produced while applying a delta; the run loop drains these to
    // the provider thread. Keeps delta application free of channel handles.
    pub refresh_pending: Vec<ActionCommand>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Fixtures,
            username: String::new(),
            fixtures: Vec::with_capacity(64),
            fixtures_selected: 0,
            fixtures_cached_at: None,
            form: PredictionForm::new(),
            boards: Vec::with_capacity(BOARDS_PER_PAGE as usize),
            boards_page: 1,
            boards_num_pages: 1,
            boards_selected: 0,
            boards_loading: false,
            boards_cached_at: None,
            boards_focus: BoardsFocus::AllBoards,
            board_search: String::new(),
            board_search_active: false,
            my_boards: Vec::new(),
            my_boards_selected: 0,
            board_detail: None,
            detail_loading: false,
            members_selected: 0,
            create_form: CreateBoardForm::default(),
            friends: Vec::new(),
            friends_selected: 0,
            friends_cached_at: None,
            friend_input: String::new(),
            friend_input_active: false,
            predictions: Vec::with_capacity(PREDICTIONS_PER_PAGE as usize),
            predictions_page: 1,
            predictions_num_pages: 1,
            predictions_selected: 0,
            profile: None,
            alert: None,
            help_overlay: false,
            logs: VecDeque::with_capacity(200),
            refresh_pending: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn show_alert(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[ALERT] {msg}"));
        self.alert = Some(msg);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn cycle_screen_next(&mut self) {
        self.screen = match &self.screen {
            Screen::Fixtures => Screen::Predict,
            Screen::Predict => Screen::Boards,
            Screen::Boards => Screen::Profile,
            Screen::Profile => Screen::Friends,
            Screen::Friends => Screen::Fixtures,
            Screen::BoardDetail { .. } | Screen::CreateBoard => Screen::Boards,
        };
    }

    pub fn cycle_screen_prev(&mut self) {
        self.screen = match &self.screen {
            Screen::Fixtures => Screen::Friends,
            Screen::Predict => Screen::Fixtures,
            Screen::Boards => Screen::Predict,
            Screen::Profile => Screen::Boards,
            Screen::Friends => Screen::Profile,
            Screen::BoardDetail { .. } | Screen::CreateBoard => Screen::Boards,
        };
    }

    pub fn toggle_boards_focus(&mut self) {
        self.boards_focus = match self.boards_focus {
            BoardsFocus::AllBoards => BoardsFocus::MyBoards,
            BoardsFocus::MyBoards => BoardsFocus::AllBoards,
        };
    }

    pub fn selected_board(&self) -> Option<&BoardRow> {
        match self.boards_focus {
            BoardsFocus::AllBoards => self.boards.get(self.boards_selected),
            BoardsFocus::MyBoards => self.my_boards.get(self.my_boards_selected),
        }
    }

    pub fn selected_member(&self) -> Option<&MemberRow> {
        self.board_detail
            .as_ref()
            .and_then(|d| d.members.get(self.members_selected))
    }

    pub fn selected_friend(&self) -> Option<&FriendRow> {
        self.friends.get(self.friends_selected)
    }

    pub fn selected_fixture(&self) -> Option<&FixtureRow> {
        self.fixtures.get(self.fixtures_selected)
    }

    pub fn select_board_next(&mut self) {
        match self.boards_focus {
            BoardsFocus::AllBoards => cycle_next(&mut self.boards_selected, self.boards.len()),
            BoardsFocus::MyBoards => {
                cycle_next(&mut self.my_boards_selected, self.my_boards.len())
            }
        }
    }

    pub fn select_board_prev(&mut self) {
        match self.boards_focus {
            BoardsFocus::AllBoards => cycle_prev(&mut self.boards_selected, self.boards.len()),
            BoardsFocus::MyBoards => {
                cycle_prev(&mut self.my_boards_selected, self.my_boards.len())
            }
        }
    }

    pub fn select_member_next(&mut self) {
        let total = self.board_detail.as_ref().map_or(0, |d| d.members.len());
        cycle_next(&mut self.members_selected, total);
    }

    pub fn select_member_prev(&mut self) {
        let total = self.board_detail.as_ref().map_or(0, |d| d.members.len());
        cycle_prev(&mut self.members_selected, total);
    }

    pub fn select_friend_next(&mut self) {
        cycle_next(&mut self.friends_selected, self.friends.len());
    }

    pub fn select_friend_prev(&mut self) {
        cycle_prev(&mut self.friends_selected, self.friends.len());
    }

    pub fn select_fixture_next(&mut self) {
        cycle_next(&mut self.fixtures_selected, self.fixtures.len());
    }

    pub fn select_fixture_prev(&mut self) {
        cycle_prev(&mut self.fixtures_selected, self.fixtures.len());
    }

    pub fn select_prediction_next(&mut self) {
        cycle_next(&mut self.predictions_selected, self.predictions.len());
    }

    pub fn select_prediction_prev(&mut self) {
        cycle_prev(&mut self.predictions_selected, self.predictions.len());
    }

    pub fn clamp_board_selection(&mut self) {
        clamp(&mut self.boards_selected, self.boards.len());
        clamp(&mut self.my_boards_selected, self.my_boards.len());
    }

    pub fn is_my_board(&self, slug: &str) -> bool {
        self.my_boards.iter().any(|b| b.slug == slug)
    }

    // The three fragments a membership change invalidates: the board page itself, the
    // viewer's own boards, and the all-boards page currently shown.
    pub fn queue_membership_refresh(&mut self, slug: &str) {
        self.refresh_pending.push(ActionCommand::FetchBoardDetail {
            slug: slug.to_string(),
        });
        self.refresh_pending.push(ActionCommand::FetchMyBoards);
        self.refresh_pending.push(ActionCommand::FetchBoardPage {
            page: self.boards_page,
            search: self.board_search.clone(),
            background: true,
        });
    }

    pub fn queue_list_refresh(&mut self) {
        self.refresh_pending.push(ActionCommand::FetchMyBoards);
        self.refresh_pending.push(ActionCommand::FetchBoardPage {
            page: self.boards_page,
            search: self.board_search.clone(),
            background: true,
        });
    }

    // Server-sent destinations arrive as site-relative urls. Anything under the
    // leaderboards index lands on the Boards screen; a detail url opens that board.
    pub fn navigate_to(&mut self, url: &str) {
        if let Some(slug) = board_slug_from_url(url) {
            self.screen = Screen::BoardDetail {
                slug: slug.to_string(),
            };
            return;
        }
        if url.contains("leaderboards") {
            self.screen = Screen::Boards;
            return;
        }
        self.push_log(format!("[WARN] Unhandled destination: {url}"));
    }
}

fn cycle_next(selected: &mut usize, total: usize) {
    if total == 0 {
        *selected = 0;
        return;
    }
    *selected = (*selected + 1) % total;
}

fn cycle_prev(selected: &mut usize, total: usize) {
    if total == 0 {
        *selected = 0;
        return;
    }
    if *selected == 0 {
        *selected = total - 1;
    } else {
        *selected -= 1;
    }
}

fn clamp(selected: &mut usize, total: usize) {
    if total == 0 {
        *selected = 0;
    } else if *selected >= total {
        *selected = total - 1;
    }
}

// "/leaderboards/<slug>/" -> Some("<slug>"); the bare index has no slug segment.
pub fn board_slug_from_url(url: &str) -> Option<&str> {
    let rest = url.split("leaderboards/").nth(1)?;
    let slug = rest.split('/').next().unwrap_or("");
    if slug.is_empty() { None } else { Some(slug) }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetFixtures(Vec<FixtureRow>),
    SetAnswerForm(Vec<AnswerInit>),
    SetBoardPage(BoardPage),
    SetMyBoards(Vec<BoardRow>),
    SetBoardDetail(BoardDetail),
    SetFriends(Vec<FriendRow>),
    SetPredictions(PredictionPage),
    SetProfile(ProfileSummary),
    Joined {
        slug: String,
        flags: JoinFlags,
    },
    Left {
        slug: String,
        flags: LeaveFlags,
    },
    FriendChanged {
        username: String,
        flags: FriendFlags,
    },
    BoardCreated(CreateFlags),
    AnswersSaved {
        saved: usize,
    },
    Alert(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ActionCommand {
    FetchFixtures,
    FetchAnswerForm,
    FetchBoardPage {
        page: u32,
        search: String,
        // True for bootstrap and queued refreshes the user never asked for.
        background: bool,
    },
    SearchBoards {
        search: String,
    },
    FetchMyBoards,
    FetchBoardDetail {
        slug: String,
    },
    FetchFriends,
    FetchPredictions {
        page: u32,
        background: bool,
    },
    FetchProfile,
    JoinBoard {
        slug: String,
    },
    LeaveBoard {
        slug: String,
    },
    AddFriend {
        username: String,
    },
    RemoveFriend {
        username: String,
    },
    CreateBoard {
        name: String,
        capacity: u32,
        is_private: bool,
        password: String,
    },
    SubmitAnswers {
        entries: Vec<AnswerEntry>,
        changed: usize,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetFixtures(fixtures) => {
            state.fixtures = fixtures;
            state.fixtures_cached_at = Some(SystemTime::now());
            clamp(&mut state.fixtures_selected, state.fixtures.len());
        }
        Delta::SetAnswerForm(rows) => {
            state.form.rebuild(rows);
        }
        Delta::SetBoardPage(page) => {
            let selected_slug = state
                .boards
                .get(state.boards_selected)
                .map(|b| b.slug.clone());
            state.boards = page.boards;
            state.boards_page = page.page;
            state.boards_num_pages = page.num_pages.max(1);
            state.boards_loading = false;
            state.boards_cached_at = Some(SystemTime::now());
            if let Some(slug) = selected_slug
                && let Some(pos) = state.boards.iter().position(|b| b.slug == slug)
            {
                state.boards_selected = pos;
            } else {
                clamp(&mut state.boards_selected, state.boards.len());
            }
        }
        Delta::SetMyBoards(boards) => {
            state.my_boards = boards;
            clamp(&mut state.my_boards_selected, state.my_boards.len());
        }
        Delta::SetBoardDetail(detail) => {
            // Stored regardless of the current screen; a reload finishing after the
            // user moved on must not disturb wherever they are now.
            state.detail_loading = false;
            clamp(&mut state.members_selected, detail.members.len());
            state.board_detail = Some(detail);
        }
        Delta::SetFriends(friends) => {
            state.friends = friends;
            state.friends_cached_at = Some(SystemTime::now());
            clamp(&mut state.friends_selected, state.friends.len());
        }
        Delta::SetPredictions(page) => {
            state.predictions = page.rows;
            state.predictions_page = page.page;
            state.predictions_num_pages = page.num_pages.max(1);
            clamp(&mut state.predictions_selected, state.predictions.len());
        }
        Delta::SetProfile(profile) => {
            state.profile = Some(profile);
        }
        Delta::Joined { slug, flags } => {
            if flags.user_added {
                state.push_log(format!("[INFO] Joined leaderboard: {slug}"));
                state.queue_membership_refresh(&slug);
            } else if flags.board_full {
                state.show_alert(ALERT_BOARD_FULL);
            } else {
                state.show_alert(ALERT_UNPROCESSED);
            }
        }
        Delta::Left { slug, flags } => {
            if flags.user_removed {
                state.push_log(format!("[INFO] Left leaderboard: {slug}"));
                if flags.board_empty || flags.left_private_board {
                    // The board is gone or no longer accessible; drop the detail view
                    // and follow the destination the server supplied.
                    state.board_detail = None;
                    state.members_selected = 0;
                    state.navigate_to(flags.url.as_deref().unwrap_or("/leaderboards/"));
                    state.queue_list_refresh();
                } else {
                    state.queue_membership_refresh(&slug);
                }
            } else {
                state.show_alert(ALERT_UNPROCESSED);
            }
        }
        Delta::FriendChanged { username, flags } => {
            if flags.friend_added || flags.friend_removed {
                if let Some(detail) = state.board_detail.as_mut()
                    && let Some(member) =
                        detail.members.iter_mut().find(|m| m.username == username)
                {
                    member.is_friend = flags.friend_added;
                }
                let verb = if flags.friend_added { "added" } else { "removed" };
                state.push_log(format!("[INFO] Friend {verb}: {username}"));
                state.refresh_pending.push(ActionCommand::FetchFriends);
            } else {
                state.show_alert(ALERT_UNPROCESSED);
            }
        }
        Delta::BoardCreated(flags) => {
            if flags.board_created {
                state.create_form.reset();
                if let Some(url) = flags.url.as_deref() {
                    state.navigate_to(url);
                    if let Some(slug) = board_slug_from_url(url) {
                        state.push_log(format!("[INFO] Created leaderboard: {slug}"));
                        state.refresh_pending.push(ActionCommand::FetchBoardDetail {
                            slug: slug.to_string(),
                        });
                    }
                }
                state.queue_list_refresh();
            } else {
                state.show_alert(ALERT_UNPROCESSED);
            }
        }
        Delta::AnswersSaved { saved } => {
            state.push_log(format!("[INFO] Predictions saved: {saved}"));
            state.screen = Screen::Profile;
            state.refresh_pending.push(ActionCommand::FetchProfile);
            state.refresh_pending.push(ActionCommand::FetchPredictions {
                page: 1,
                background: true,
            });
            state.refresh_pending.push(ActionCommand::FetchAnswerForm);
        }
        Delta::Alert(msg) => {
            state.show_alert(msg);
        }
        Delta::Log(msg) => {
            state.push_log(msg);
        }
    }
}
