use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::predictions::AnswerInit;
use crate::state::{AppState, BoardRow, FixtureRow, FriendRow, ProfileSummary};

const CACHE_DIR: &str = "soccerates_terminal";
const CACHE_FILE: &str = "cache.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    version: u32,
    accounts: HashMap<String, AccountCache>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AccountCache {
    fixtures: Vec<FixtureRow>,
    #[serde(default)]
    fixtures_fetched_at: Option<u64>,
    #[serde(default)]
    boards: Vec<BoardRow>,
    #[serde(default)]
    boards_page: u32,
    #[serde(default)]
    boards_num_pages: u32,
    #[serde(default)]
    board_search: String,
    #[serde(default)]
    boards_fetched_at: Option<u64>,
    #[serde(default)]
    my_boards: Vec<BoardRow>,
    #[serde(default)]
    friends: Vec<FriendRow>,
    #[serde(default)]
    friends_fetched_at: Option<u64>,
    #[serde(default)]
    profile: Option<ProfileSummary>,
    #[serde(default)]
    answers: Vec<AnswerInit>,
}

pub fn load_into_state(state: &mut AppState) {
    let Some(path) = cache_path() else {
        return;
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return;
    };
    let Ok(cache) = serde_json::from_str::<CacheFile>(&raw) else {
        return;
    };
    if cache.version != CACHE_VERSION {
        return;
    }

    let Some(account) = cache.accounts.get(&state.username) else {
        return;
    };

    if !account.fixtures.is_empty() {
        state.fixtures = account.fixtures.clone();
        state.fixtures_cached_at = account.fixtures_fetched_at.and_then(system_time_from_secs);
        state.fixtures_selected = 0;
    }
    if !account.boards.is_empty() {
        state.boards = account.boards.clone();
        state.boards_page = account.boards_page.max(1);
        state.boards_num_pages = account.boards_num_pages.max(1);
        state.board_search = account.board_search.clone();
        state.boards_cached_at = account.boards_fetched_at.and_then(system_time_from_secs);
        state.boards_selected = 0;
    }
    state.my_boards = account.my_boards.clone();
    if !account.friends.is_empty() {
        state.friends = account.friends.clone();
        state.friends_cached_at = account.friends_fetched_at.and_then(system_time_from_secs);
        state.friends_selected = 0;
    }
    if account.profile.is_some() {
        state.profile = account.profile.clone();
    }
    if !account.answers.is_empty() {
        state.form.rebuild(account.answers.clone());
    }
    state.clamp_board_selection();
}

pub fn save_from_state(state: &AppState) {
    let Some(path) = cache_path() else {
        return;
    };
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let mut cache = load_cache_file(&path).unwrap_or_else(|| CacheFile {
        version: CACHE_VERSION,
        accounts: HashMap::new(),
    });
    cache.version = CACHE_VERSION;

    cache.accounts.insert(
        state.username.clone(),
        AccountCache {
            fixtures: state.fixtures.clone(),
            fixtures_fetched_at: state.fixtures_cached_at.and_then(system_time_to_secs),
            boards: state.boards.clone(),
            boards_page: state.boards_page,
            boards_num_pages: state.boards_num_pages,
            board_search: state.board_search.clone(),
            boards_fetched_at: state.boards_cached_at.and_then(system_time_to_secs),
            my_boards: state.my_boards.clone(),
            friends: state.friends.clone(),
            friends_fetched_at: state.friends_cached_at.and_then(system_time_to_secs),
            profile: state.profile.clone(),
            answers: state.form.snapshot(),
        },
    );

    if let Ok(json) = serde_json::to_string(&cache) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &path);
        }
    }
}

fn load_cache_file(path: &Path) -> Option<CacheFile> {
    let raw = fs::read_to_string(path).ok()?;
    let cache = serde_json::from_str::<CacheFile>(&raw).ok()?;
    Some(cache)
}

fn cache_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn system_time_from_secs(secs: u64) -> Option<SystemTime> {
    UNIX_EPOCH.checked_add(std::time::Duration::from_secs(secs))
}
