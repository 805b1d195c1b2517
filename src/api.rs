use anyhow::{Context, Result, bail};
use reqwest::header;
use serde::Deserialize;

use crate::http_client::http_client;
use crate::predictions::{AnswerEntry, AnswerInit};
use crate::session::Session;
use crate::state::{
    BoardDetail, BoardPage, BoardRow, CreateFlags, FixtureRow, FriendFlags, FriendRow, JoinFlags,
    LeaveFlags, PredictionPage, ProfileSummary,
};
use crate::validation::{AWAY_GOALS_FIELD, HOME_GOALS_FIELD};

// Fragment endpoints resolve against the site root; membership actions resolve the
// way the board page resolved them, under /leaderboards/<slug>/.
pub const BOARDS_PATH: &str = "leaderboards/";
pub const GET_PAGE_PATH: &str = "ajax/leaderboards/get_page";
pub const SEARCH_PATH: &str = "ajax/leaderboards/search";
pub const ADD_FRIEND_PATH: &str = "add_friend/";
pub const REMOVE_FRIEND_PATH: &str = "remove_friend/";
pub const SCHEDULE_PATH: &str = "worldcup/schedule/";
pub const ANSWER_FORM_PATH: &str = "answer_form/";
pub const PROFILE_PATH: &str = "profile/";

pub fn join_path(slug: &str) -> String {
    format!("leaderboards/{slug}/join_leaderboard/")
}

pub fn leave_path(slug: &str) -> String {
    format!("leaderboards/{slug}/leave_leaderboard/")
}

pub fn board_detail_path(slug: &str) -> String {
    format!("leaderboards/{slug}/")
}

pub fn predictions_path(username: &str) -> String {
    format!("ajax/{username}/get_predictions")
}

pub fn fetch_fixtures(session: &Session) -> Result<Vec<FixtureRow>> {
    let body = get_fragment(session, SCHEDULE_PATH)?;
    parse_fixtures_json(&body)
}

pub fn fetch_answer_form(session: &Session) -> Result<Vec<AnswerInit>> {
    let body = get_fragment(session, ANSWER_FORM_PATH)?;
    parse_answer_form_json(&body)
}

pub fn fetch_board_page(session: &Session, page: u32, search: &str) -> Result<BoardPage> {
    let fields = [
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("page".to_string(), page.to_string()),
        ("search_term".to_string(), search.to_string()),
    ];
    let body = post_form(session, GET_PAGE_PATH, &fields)?;
    parse_board_page_json(&body)
}

pub fn search_boards(session: &Session, search: &str) -> Result<BoardPage> {
    let fields = [
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("search_term".to_string(), search.to_string()),
    ];
    let body = post_form(session, SEARCH_PATH, &fields)?;
    parse_board_page_json(&body)
}

pub fn fetch_my_boards(session: &Session) -> Result<Vec<BoardRow>> {
    let body = get_fragment(session, BOARDS_PATH)?;
    parse_my_boards_json(&body)
}

pub fn fetch_board_detail(session: &Session, slug: &str) -> Result<BoardDetail> {
    let body = get_fragment(session, &board_detail_path(slug))?;
    parse_board_detail_json(&body)
}

pub fn fetch_profile(session: &Session) -> Result<(ProfileSummary, Vec<FriendRow>)> {
    let body = get_fragment(session, PROFILE_PATH)?;
    parse_profile_json(&body)
}

pub fn fetch_predictions(session: &Session, page: u32) -> Result<PredictionPage> {
    let fields = [
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("page".to_string(), page.to_string()),
    ];
    let body = post_form(session, &predictions_path(&session.username), &fields)?;
    parse_prediction_page_json(&body)
}

pub fn join_board(session: &Session, slug: &str) -> Result<JoinFlags> {
    let fields = [("csrfmiddlewaretoken".to_string(), session.csrf_token.clone())];
    let body = post_form(session, &join_path(slug), &fields)?;
    parse_join_json(&body)
}

pub fn leave_board(session: &Session, slug: &str) -> Result<LeaveFlags> {
    let fields = [("csrfmiddlewaretoken".to_string(), session.csrf_token.clone())];
    let body = post_form(session, &leave_path(slug), &fields)?;
    parse_leave_json(&body)
}

pub fn add_friend(session: &Session, username: &str) -> Result<FriendFlags> {
    let fields = [
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("username".to_string(), username.to_string()),
    ];
    let body = post_form(session, ADD_FRIEND_PATH, &fields)?;
    parse_friend_json(&body)
}

pub fn remove_friend(session: &Session, username: &str) -> Result<FriendFlags> {
    let fields = [
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("username".to_string(), username.to_string()),
    ];
    let body = post_form(session, REMOVE_FRIEND_PATH, &fields)?;
    parse_friend_json(&body)
}

pub fn create_board(
    session: &Session,
    name: &str,
    capacity: u32,
    is_private: bool,
    password: &str,
) -> Result<CreateFlags> {
    let mut fields = vec![
        ("csrfmiddlewaretoken".to_string(), session.csrf_token.clone()),
        ("name".to_string(), name.to_string()),
        ("capacity".to_string(), capacity.to_string()),
    ];
    if is_private {
        // Checkbox convention: present when ticked, absent otherwise.
        fields.push(("is_private".to_string(), "on".to_string()));
        fields.push(("password".to_string(), password.to_string()));
    }
    let body = post_form(session, BOARDS_PATH, &fields)?;
    parse_create_json(&body)
}

pub fn submit_answers(session: &Session, entries: &[AnswerEntry]) -> Result<()> {
    let fields = formset_payload(entries, &session.csrf_token);
    let client = http_client()?;
    let url = session.url(ANSWER_FORM_PATH);
    let resp = client
        .post(&url)
        .header(header::COOKIE, session.cookie_header())
        .header(header::REFERER, session.base_url.clone())
        .form(&fields)
        .send()
        .with_context(|| format!("POST {url}"))?;
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        bail!("answer submit rejected: {status}");
    }
    Ok(())
}

// The whole formset in the field layout the server's form layer expects: management
// counters first, then fixture id and both goal inputs per row.
pub fn formset_payload(entries: &[AnswerEntry], token: &str) -> Vec<(String, String)> {
    let total = entries.len();
    let mut fields = Vec::with_capacity(total * 3 + 5);
    fields.push(("csrfmiddlewaretoken".to_string(), token.to_string()));
    fields.push(("form-TOTAL_FORMS".to_string(), total.to_string()));
    fields.push(("form-INITIAL_FORMS".to_string(), total.to_string()));
    fields.push(("form-MIN_NUM_FORMS".to_string(), "0".to_string()));
    fields.push(("form-MAX_NUM_FORMS".to_string(), total.to_string()));
    for (idx, entry) in entries.iter().enumerate() {
        fields.push((format!("form-{idx}-fixture"), entry.fixture.to_string()));
        fields.push((
            format!("form-{idx}-{HOME_GOALS_FIELD}"),
            entry.team1_goals.clone(),
        ));
        fields.push((
            format!("form-{idx}-{AWAY_GOALS_FIELD}"),
            entry.team2_goals.clone(),
        ));
    }
    fields
}

fn get_fragment(session: &Session, path: &str) -> Result<String> {
    let client = http_client()?;
    let url = session.url(path);
    let resp = client
        .get(&url)
        .header(header::COOKIE, session.cookie_header())
        .header(header::ACCEPT, "application/json")
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .with_context(|| format!("GET {url}"))?;
    resp.text().context("read body")
}

fn post_form(session: &Session, path: &str, fields: &[(String, String)]) -> Result<String> {
    let client = http_client()?;
    let url = session.url(path);
    let resp = client
        .post(&url)
        .header(header::COOKIE, session.cookie_header())
        .header(header::REFERER, session.base_url.clone())
        .header("X-Requested-With", "XMLHttpRequest")
        .form(fields)
        .send()
        .with_context(|| format!("POST {url}"))?;
    resp.text().context("read body")
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<FixtureRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid fixtures json")
}

pub fn parse_answer_form_json(raw: &str) -> Result<Vec<AnswerInit>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid answer form json")
}

pub fn parse_board_page_json(raw: &str) -> Result<BoardPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(BoardPage {
            boards: Vec::new(),
            page: 1,
            num_pages: 1,
        });
    }
    serde_json::from_str(trimmed).context("invalid board page json")
}

#[derive(Debug, Deserialize)]
struct MyBoardsResponse {
    #[serde(default)]
    public_lb: Vec<BoardRow>,
    #[serde(default)]
    private_lb: Vec<BoardRow>,
}

pub fn parse_my_boards_json(raw: &str) -> Result<Vec<BoardRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: MyBoardsResponse = serde_json::from_str(trimmed).context("invalid boards json")?;
    let mut boards = resp.public_lb;
    for mut board in resp.private_lb {
        board.is_private = true;
        boards.push(board);
    }
    Ok(boards)
}

pub fn parse_board_detail_json(raw: &str) -> Result<BoardDetail> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        bail!("empty board detail");
    }
    serde_json::from_str(trimmed).context("invalid board detail json")
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    username: String,
    #[serde(default)]
    points: i64,
    #[serde(default)]
    ranking: u32,
    #[serde(default)]
    usercount: u32,
    #[serde(default)]
    points_percentage: Option<f64>,
    #[serde(default)]
    friends: Vec<FriendRow>,
}

pub fn parse_profile_json(raw: &str) -> Result<(ProfileSummary, Vec<FriendRow>)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        bail!("empty profile");
    }
    let resp: ProfileResponse = serde_json::from_str(trimmed).context("invalid profile json")?;
    let summary = ProfileSummary {
        username: resp.username,
        points: resp.points,
        ranking: resp.ranking,
        user_count: resp.usercount,
        points_percentage: resp.points_percentage,
    };
    Ok((summary, resp.friends))
}

pub fn parse_prediction_page_json(raw: &str) -> Result<PredictionPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(PredictionPage {
            rows: Vec::new(),
            page: 1,
            num_pages: 1,
        });
    }
    serde_json::from_str(trimmed).context("invalid prediction page json")
}

// Flag bodies parse leniently: known keys picked out, everything else ignored, absent
// keys read as false. Classification of an all-false result happens at apply time.
pub fn parse_join_json(raw: &str) -> Result<JoinFlags> {
    parse_flags(raw, "invalid join response")
}

pub fn parse_leave_json(raw: &str) -> Result<LeaveFlags> {
    parse_flags(raw, "invalid leave response")
}

pub fn parse_friend_json(raw: &str) -> Result<FriendFlags> {
    parse_flags(raw, "invalid friend response")
}

pub fn parse_create_json(raw: &str) -> Result<CreateFlags> {
    parse_flags(raw, "invalid create response")
}

fn parse_flags<T: Default + for<'de> Deserialize<'de>>(raw: &str, label: &'static str) -> Result<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(trimmed).context(label)
}
