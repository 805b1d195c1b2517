use std::env;

// What the browser carried implicitly: where the server lives, who we are, and the
// cookies/token Django expects on authenticated POSTs.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    pub username: String,
    pub session_id: String,
    pub csrf_token: String,
}

impl Session {
    // None when no base url is configured; the caller falls back to the demo provider.
    pub fn from_env() -> Option<Session> {
        let base_url = non_empty_env("SOCAPP_BASE_URL")?;
        Some(Session {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: non_empty_env("SOCAPP_USERNAME").unwrap_or_default(),
            session_id: non_empty_env("SOCAPP_SESSION_ID").unwrap_or_default(),
            csrf_token: non_empty_env("SOCAPP_CSRF_TOKEN").unwrap_or_default(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn cookie_header(&self) -> String {
        format!(
            "sessionid={}; csrftoken={}",
            self.session_id, self.csrf_token
        )
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_doubled_slashes() {
        let session = Session {
            base_url: "http://localhost:8000".to_string(),
            username: "ann".to_string(),
            session_id: "s".to_string(),
            csrf_token: "t".to_string(),
        };
        assert_eq!(
            session.url("/ajax/leaderboards/get_page"),
            "http://localhost:8000/ajax/leaderboards/get_page"
        );
        assert_eq!(
            session.url("leaderboards/kane-gang/join_leaderboard/"),
            "http://localhost:8000/leaderboards/kane-gang/join_leaderboard/"
        );
    }
}
