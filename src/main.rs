use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use soccerates_terminal::demo_feed::{self, DEMO_USER};
use soccerates_terminal::dispatch;
use soccerates_terminal::persist;
use soccerates_terminal::predictions::{Side, parse_kickoff};
use soccerates_terminal::session::Session;
use soccerates_terminal::state::{
    apply_delta, ActionCommand, AppState, BoardRow, BoardsFocus, Delta, Screen,
    ALERT_PRIVATE_BOARD,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ActionCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ActionCommand>, username: String) -> Self {
        let mut state = AppState::new();
        state.username = username;
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn send(&mut self, cmd: ActionCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Action channel closed");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        // A visible alert is modal; it swallows everything except a dismissal.
        if self.state.alert.is_some() {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')
            ) {
                self.state.dismiss_alert();
            }
            return;
        }
        if self.state.help_overlay {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
            ) {
                self.state.help_overlay = false;
            }
            return;
        }
        if matches!(self.state.screen, Screen::Boards) && self.state.board_search_active {
            self.on_search_key(key);
            return;
        }
        if matches!(self.state.screen, Screen::Friends) && self.state.friend_input_active {
            self.on_friend_input_key(key);
            return;
        }
        if matches!(self.state.screen, Screen::CreateBoard) {
            self.on_create_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Tab => self.state.cycle_screen_next(),
            KeyCode::BackTab => self.state.cycle_screen_prev(),
            _ => match self.state.screen.clone() {
                Screen::Fixtures => self.on_fixtures_key(key),
                Screen::Predict => self.on_predict_key(key),
                Screen::Boards => self.on_boards_key(key),
                Screen::BoardDetail { slug } => self.on_detail_key(key, &slug),
                Screen::CreateBoard => {}
                Screen::Profile => self.on_profile_key(key),
                Screen::Friends => self.on_friends_key(key),
            },
        }
    }

    fn screen_hotkey(&mut self, code: KeyCode) -> bool {
        let target = match code {
            KeyCode::Char('1') => Screen::Fixtures,
            KeyCode::Char('2') => Screen::Predict,
            KeyCode::Char('3') => Screen::Boards,
            KeyCode::Char('4') => Screen::Profile,
            KeyCode::Char('5') => Screen::Friends,
            _ => return false,
        };
        self.state.screen = target;
        true
    }

    fn on_fixtures_key(&mut self, key: KeyEvent) {
        if self.screen_hotkey(key.code) {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_fixture_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_fixture_prev(),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Refreshing schedule");
                self.send(ActionCommand::FetchFixtures);
            }
            KeyCode::Enter => self.state.screen = Screen::Predict,
            _ => {}
        }
    }

    fn on_predict_key(&mut self, key: KeyEvent) {
        let now = Utc::now().naive_utc();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.form.next_row(),
            KeyCode::Char('k') | KeyCode::Up => self.state.form.prev_row(),
            KeyCode::Char('h') | KeyCode::Left => self.state.form.focus_home(),
            KeyCode::Char('l') | KeyCode::Right => self.state.form.focus_away(),
            KeyCode::Char(c) if c.is_ascii_digit() => self.state.form.type_digit(c, now),
            KeyCode::Backspace => self.state.form.backspace(now),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Reloading prediction form");
                self.send(ActionCommand::FetchAnswerForm);
            }
            KeyCode::Char('s') | KeyCode::Enter => self.submit_predictions(now),
            _ => {}
        }
    }

    fn submit_predictions(&mut self, now: NaiveDateTime) {
        if self.state.form.is_empty() {
            return;
        }
        if !self.state.form.submit_enabled() {
            self.state
                .push_log("[WARN] Submit blocked: some predictions are half-filled");
            return;
        }
        let changed = self.state.form.changed_complete_count(now);
        if changed == 0 {
            self.state.push_log("[INFO] No changed predictions to save");
            return;
        }
        let entries = self.state.form.entries();
        self.state
            .push_log(format!("[INFO] Submitting {changed} predictions"));
        self.send(ActionCommand::SubmitAnswers { entries, changed });
    }

    fn on_boards_key(&mut self, key: KeyEvent) {
        if self.screen_hotkey(key.code) {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_board_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_board_prev(),
            KeyCode::Char('m') => self.state.toggle_boards_focus(),
            KeyCode::Char('/') => {
                self.state.boards_focus = BoardsFocus::AllBoards;
                self.state.board_search_active = true;
            }
            KeyCode::Char('n') => self.change_board_page(1),
            KeyCode::Char('p') => self.change_board_page(-1),
            KeyCode::Char('c') => self.state.screen = Screen::CreateBoard,
            KeyCode::Char('J') => self.join_selected(),
            KeyCode::Char('L') => self.leave_selected(),
            KeyCode::Char('r') => self.refresh_board_lists(),
            KeyCode::Enter => self.open_selected_board(),
            KeyCode::Esc => {
                if !self.state.board_search.is_empty() {
                    self.state.board_search.clear();
                    self.request_search();
                }
            }
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.board_search_active = false;
                if !self.state.board_search.is_empty() {
                    self.state.board_search.clear();
                    self.request_search();
                }
            }
            KeyCode::Enter => self.state.board_search_active = false,
            KeyCode::Backspace => {
                if self.state.board_search.pop().is_some() {
                    self.request_search();
                }
            }
            KeyCode::Char(c) => {
                self.state.board_search.push(c);
                self.request_search();
            }
            _ => {}
        }
    }

    // Every keystroke refires the query, like the live search box on the web page.
    fn request_search(&mut self) {
        self.state.boards_loading = true;
        self.send(ActionCommand::SearchBoards {
            search: self.state.board_search.clone(),
        });
    }

    fn change_board_page(&mut self, step: i64) {
        let pages = self.state.boards_num_pages.max(1) as i64;
        let target = (self.state.boards_page as i64 + step).clamp(1, pages) as u32;
        if target == self.state.boards_page {
            return;
        }
        self.state.boards_loading = true;
        self.send(ActionCommand::FetchBoardPage {
            page: target,
            search: self.state.board_search.clone(),
            background: false,
        });
    }

    fn refresh_board_lists(&mut self) {
        self.state.boards_loading = true;
        self.send(ActionCommand::FetchBoardPage {
            page: self.state.boards_page,
            search: self.state.board_search.clone(),
            background: false,
        });
        self.send(ActionCommand::FetchMyBoards);
    }

    fn join_selected(&mut self) {
        let Some(board) = self.state.selected_board().cloned() else {
            return;
        };
        if self.state.is_my_board(&board.slug) {
            self.state
                .push_log(format!("[INFO] Already a member of {}", board.name));
            return;
        }
        if board.is_private {
            self.state.show_alert(ALERT_PRIVATE_BOARD);
            return;
        }
        self.state.push_log(format!("[INFO] Joining {}", board.name));
        self.send(ActionCommand::JoinBoard { slug: board.slug });
    }

    fn leave_selected(&mut self) {
        let Some(board) = self.state.selected_board().cloned() else {
            return;
        };
        if !self.state.is_my_board(&board.slug) {
            self.state
                .push_log(format!("[INFO] Not a member of {}", board.name));
            return;
        }
        self.state.push_log(format!("[INFO] Leaving {}", board.name));
        self.send(ActionCommand::LeaveBoard { slug: board.slug });
    }

    fn open_selected_board(&mut self) {
        let Some(board) = self.state.selected_board().cloned() else {
            return;
        };
        self.state.detail_loading = true;
        self.state.members_selected = 0;
        self.state.screen = Screen::BoardDetail {
            slug: board.slug.clone(),
        };
        self.send(ActionCommand::FetchBoardDetail { slug: board.slug });
    }

    fn on_detail_key(&mut self, key: KeyEvent, slug: &str) {
        if self.screen_hotkey(key.code) {
            return;
        }
        match key.code {
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Boards,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_member_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_member_prev(),
            KeyCode::Char('f') => self.toggle_selected_friend(),
            KeyCode::Char('J') => self.join_current(slug),
            KeyCode::Char('L') => self.leave_current(slug),
            KeyCode::Char('r') => {
                self.state.detail_loading = true;
                self.send(ActionCommand::FetchBoardDetail {
                    slug: slug.to_string(),
                });
            }
            _ => {}
        }
    }

    fn join_current(&mut self, slug: &str) {
        if self.state.is_my_board(slug) {
            self.state.push_log("[INFO] Already a member of this board");
            return;
        }
        let private = self
            .state
            .board_detail
            .as_ref()
            .is_some_and(|d| d.is_private);
        if private {
            self.state.show_alert(ALERT_PRIVATE_BOARD);
            return;
        }
        self.state.push_log(format!("[INFO] Joining {slug}"));
        self.send(ActionCommand::JoinBoard {
            slug: slug.to_string(),
        });
    }

    fn leave_current(&mut self, slug: &str) {
        if !self.state.is_my_board(slug) {
            self.state.push_log("[INFO] Not a member of this board");
            return;
        }
        self.state.push_log(format!("[INFO] Leaving {slug}"));
        self.send(ActionCommand::LeaveBoard {
            slug: slug.to_string(),
        });
    }

    fn toggle_selected_friend(&mut self) {
        let Some(member) = self.state.selected_member().cloned() else {
            return;
        };
        if member.username == self.state.username {
            self.state.push_log("[INFO] That's you");
            return;
        }
        if member.is_friend {
            self.state
                .push_log(format!("[INFO] Removing friend {}", member.username));
            self.send(ActionCommand::RemoveFriend {
                username: member.username,
            });
        } else {
            self.state
                .push_log(format!("[INFO] Adding friend {}", member.username));
            self.send(ActionCommand::AddFriend {
                username: member.username,
            });
        }
    }

    fn on_create_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.create_form.reset();
                self.state.screen = Screen::Boards;
            }
            KeyCode::Tab | KeyCode::Down => self.state.create_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.state.create_form.prev_field(),
            KeyCode::Enter => self.submit_create_form(),
            KeyCode::Backspace => match self.state.create_form.field {
                0 => {
                    self.state.create_form.name.pop();
                }
                1 => {
                    self.state.create_form.capacity.pop();
                }
                3 => {
                    self.state.create_form.password.pop();
                }
                _ => {}
            },
            KeyCode::Char(' ') if self.state.create_form.field == 2 => {
                self.state.create_form.toggle_private();
            }
            KeyCode::Char(c) => match self.state.create_form.field {
                0 => self.state.create_form.name.push(c),
                1 => {
                    if c.is_ascii_digit() {
                        self.state.create_form.capacity.push(c);
                    }
                }
                3 => self.state.create_form.password.push(c),
                _ => {}
            },
            _ => {}
        }
    }

    fn submit_create_form(&mut self) {
        let name = self.state.create_form.name.trim().to_string();
        let capacity = self.state.create_form.capacity_value();
        let is_private = self.state.create_form.is_private;
        let password = self.state.create_form.password.clone();

        let Some(capacity) = capacity else {
            self.state.push_log("[WARN] Capacity must be a number");
            return;
        };
        if name.is_empty() || capacity == 0 {
            self.state
                .push_log("[WARN] A name and a capacity above zero are required");
            return;
        }
        if is_private && password.trim().is_empty() {
            self.state.push_log("[WARN] Private boards need a password");
            return;
        }

        self.state
            .push_log(format!("[INFO] Creating leaderboard {name}"));
        self.send(ActionCommand::CreateBoard {
            name,
            capacity,
            is_private,
            password,
        });
    }

    fn on_profile_key(&mut self, key: KeyEvent) {
        if self.screen_hotkey(key.code) {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_prediction_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prediction_prev(),
            KeyCode::Char('n') => self.change_prediction_page(1),
            KeyCode::Char('p') => self.change_prediction_page(-1),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Refreshing profile");
                self.send(ActionCommand::FetchProfile);
                let page = self.state.predictions_page;
                self.send(ActionCommand::FetchPredictions {
                    page,
                    background: false,
                });
            }
            _ => {}
        }
    }

    fn change_prediction_page(&mut self, step: i64) {
        let pages = self.state.predictions_num_pages.max(1) as i64;
        let target = (self.state.predictions_page as i64 + step).clamp(1, pages) as u32;
        if target == self.state.predictions_page {
            return;
        }
        self.send(ActionCommand::FetchPredictions {
            page: target,
            background: false,
        });
    }

    fn on_friends_key(&mut self, key: KeyEvent) {
        if self.screen_hotkey(key.code) {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_friend_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_friend_prev(),
            KeyCode::Char('a') | KeyCode::Char('/') => {
                self.state.friend_input.clear();
                self.state.friend_input_active = true;
            }
            KeyCode::Char('d') | KeyCode::Char('x') => {
                if let Some(friend) = self.state.selected_friend().cloned() {
                    self.state
                        .push_log(format!("[INFO] Removing friend {}", friend.username));
                    self.send(ActionCommand::RemoveFriend {
                        username: friend.username,
                    });
                }
            }
            KeyCode::Char('r') => self.send(ActionCommand::FetchFriends),
            _ => {}
        }
    }

    fn on_friend_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.friend_input.clear();
                self.state.friend_input_active = false;
            }
            KeyCode::Enter => {
                let username = self.state.friend_input.trim().to_string();
                self.state.friend_input.clear();
                self.state.friend_input_active = false;
                if username.is_empty() {
                    return;
                }
                if username == self.state.username {
                    self.state.push_log("[INFO] That's you");
                    return;
                }
                self.state
                    .push_log(format!("[INFO] Adding friend {username}"));
                self.send(ActionCommand::AddFriend { username });
            }
            KeyCode::Backspace => {
                self.state.friend_input.pop();
            }
            KeyCode::Char(c) => self.state.friend_input.push(c),
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let username = match Session::from_env() {
        Some(session) => {
            let username = session.username.clone();
            dispatch::spawn_dispatcher(session, tx, cmd_rx);
            username
        }
        None => {
            demo_feed::spawn_demo_feed(tx, cmd_rx);
            DEMO_USER.to_string()
        }
    };

    let mut app = App::new(cmd_tx, username);
    persist::load_into_state(&mut app.state);
    let res = run_app(&mut terminal, &mut app, rx);
    persist::save_from_state(&app.state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        for cmd in std::mem::take(&mut app.state.refresh_pending) {
            app.send(cmd);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let full = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(full);

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &app.state.screen {
        Screen::Fixtures => render_fixtures(frame, chunks[1], &app.state),
        Screen::Predict => render_predict(frame, chunks[1], &app.state),
        Screen::Boards => render_boards(frame, chunks[1], &app.state),
        Screen::BoardDetail { slug } => render_board_detail(frame, chunks[1], &app.state, slug),
        Screen::CreateBoard => render_create_board(frame, chunks[1], &app.state),
        Screen::Profile => render_profile(frame, chunks[1], &app.state),
        Screen::Friends => render_friends(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer =
        Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, full);
    }
    if let Some(alert) = &app.state.alert {
        render_alert_overlay(frame, full, alert);
    }
}

fn header_text(state: &AppState) -> String {
    let tab = |active: bool, label: &str| {
        if active {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    };
    let boards_active = matches!(
        state.screen,
        Screen::Boards | Screen::BoardDetail { .. } | Screen::CreateBoard
    );
    let user = if state.username.is_empty() {
        "-"
    } else {
        &state.username
    };
    let line1 = format!("SOCCERATES | logged in as {user}");
    let line2 = [
        tab(matches!(state.screen, Screen::Fixtures), "1 Fixtures"),
        tab(matches!(state.screen, Screen::Predict), "2 Predict"),
        tab(boards_active, "3 Boards"),
        tab(matches!(state.screen, Screen::Profile), "4 Profile"),
        tab(matches!(state.screen, Screen::Friends), "5 Friends"),
    ]
    .join(" ");
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match &state.screen {
        Screen::Fixtures => {
            "j/k Move | Enter Predict | r Refresh | Tab Screens | ? Help | q Quit".to_string()
        }
        Screen::Predict => {
            "j/k Row | h/l Side | 0-9 Score | Backspace Clear | s/Enter Submit | r Reload | q Quit"
                .to_string()
        }
        Screen::Boards => {
            if state.board_search_active {
                "Type to search | Enter Done | Esc Clear".to_string()
            } else {
                "j/k Move | m Mine | Enter Open | J Join | L Leave | n/p Page | / Search | c Create | q Quit"
                    .to_string()
            }
        }
        Screen::BoardDetail { .. } => {
            "j/k Move | f Friend | J Join | L Leave | r Refresh | b/Esc Back | q Quit".to_string()
        }
        Screen::CreateBoard => {
            "Tab Next field | Space Toggle private | Enter Create | Esc Cancel".to_string()
        }
        Screen::Profile => "j/k Move | n/p Page | r Refresh | Tab Screens | q Quit".to_string(),
        Screen::Friends => {
            if state.friend_input_active {
                "Type username | Enter Add | Esc Cancel".to_string()
            } else {
                "j/k Move | a Add | d Remove | r Refresh | Tab Screens | q Quit".to_string()
            }
        }
    }
}

fn render_fixtures(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = fixture_columns();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    render_cell_text(frame, cols[0], "Kickoff", bold);
    render_cell_text(frame, cols[1], "Group", bold);
    render_cell_text(frame, cols[2], "Match", bold);
    render_cell_text(frame, cols[3], "Score", bold);

    let list_area = sections[1];
    if state.fixtures.is_empty() {
        let empty =
            Paragraph::new("No fixtures yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.fixtures_selected, state.fixtures.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = idx == state.fixtures_selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let fx = &state.fixtures[idx];
        let kickoff = format_kickoff(&fx.kickoff);
        let group = fx.group.clone().unwrap_or_else(|| "-".to_string());
        let matchup = format!("{} vs {}", fx.home, fx.away);
        let score = match (fx.result_home, fx.result_away) {
            (Some(h), Some(a)) => format!("{h}-{a} FT"),
            _ => "- : -".to_string(),
        };

        render_cell_text(frame, cols[0], &kickoff, row_style);
        render_cell_text(frame, cols[1], &group, row_style);
        render_cell_text(frame, cols[2], &matchup, row_style);
        render_cell_text(frame, cols[3], &score, row_style);
    }
}

fn fixture_columns() -> [Constraint; 4] {
    [
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Min(26),
        Constraint::Length(9),
    ]
}

fn render_predict(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    let now = Utc::now().naive_utc();
    let status = if state.form.is_empty() {
        "No prediction form loaded".to_string()
    } else {
        let submit = if state.form.submit_enabled() {
            "ready"
        } else {
            "blocked"
        };
        format!(
            "Submit: {submit} | Changed rows: {}",
            state.form.changed_complete_count(now)
        )
    };
    frame.render_widget(Paragraph::new(status), sections[0]);

    if state.form.error_visible() {
        let error = Paragraph::new("Please fill in both score fields for every prediction.")
            .style(Style::default().fg(Color::Red));
        frame.render_widget(error, sections[1]);
    }

    let list_area = sections[2];
    if state.form.is_empty() {
        let empty = Paragraph::new("Waiting for the prediction form")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let widths = predict_columns();
    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.form.cursor, state.form.rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = idx == state.form.cursor;
        let locked = state.form.is_locked(idx, now);
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else if locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let row = &state.form.rows[idx];
        let matchup = format!("{} vs {}", row.home, row.away);
        let home_cell = score_cell(
            &row.home_value,
            selected && state.form.side == Side::Home,
            locked,
        );
        let away_cell = score_cell(
            &row.away_value,
            selected && state.form.side == Side::Away,
            locked,
        );
        let home_style = cell_style(row_style, state.form.field_invalid(idx, Side::Home));
        let away_style = cell_style(row_style, state.form.field_invalid(idx, Side::Away));
        let status = if locked { "locked" } else { "" };

        render_cell_text(frame, cols[0], &matchup, row_style);
        render_cell_text(frame, cols[1], &home_cell, home_style);
        render_cell_text(frame, cols[2], ":", row_style);
        render_cell_text(frame, cols[3], &away_cell, away_style);
        render_cell_text(frame, cols[4], &format_kickoff(&row.kickoff), row_style);
        render_cell_text(frame, cols[5], status, row_style);
    }
}

fn predict_columns() -> [Constraint; 6] {
    [
        Constraint::Min(26),
        Constraint::Length(6),
        Constraint::Length(2),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(7),
    ]
}

fn score_cell(value: &str, focused: bool, locked: bool) -> String {
    let shown = if value.is_empty() { "_" } else { value };
    if locked {
        format!(" {shown} ")
    } else if focused {
        format!(">{shown}<")
    } else {
        format!("[{shown}]")
    }
}

fn cell_style(base: Style, invalid: bool) -> Style {
    if invalid {
        base.fg(Color::Red)
    } else {
        base
    }
}

fn render_boards(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let cursor = if state.board_search_active { "_" } else { "" };
    let search = Paragraph::new(format!("Search: {}{cursor}", state.board_search));
    frame.render_widget(search, sections[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(sections[1]);

    let all_focused = state.boards_focus == BoardsFocus::AllBoards;
    let all_title = format!(
        "All Boards (page {}/{})",
        state.boards_page,
        state.boards_num_pages.max(1)
    );
    let all_text = if state.boards_loading && state.boards.is_empty() {
        "Loading...".to_string()
    } else {
        board_list_text(
            &state.boards,
            if all_focused {
                Some(state.boards_selected)
            } else {
                None
            },
            state,
        )
    };
    let all_block = Block::default()
        .title(all_title)
        .borders(Borders::ALL)
        .border_style(panel_style(all_focused));
    frame.render_widget(Paragraph::new(all_text).block(all_block), columns[0]);

    let my_text = board_list_text(
        &state.my_boards,
        if all_focused {
            None
        } else {
            Some(state.my_boards_selected)
        },
        state,
    );
    let my_block = Block::default()
        .title("My Boards")
        .borders(Borders::ALL)
        .border_style(panel_style(!all_focused));
    frame.render_widget(Paragraph::new(my_text).block(my_block), columns[1]);
}

fn panel_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn board_list_text(boards: &[BoardRow], selected: Option<usize>, state: &AppState) -> String {
    if boards.is_empty() {
        return "No leaderboards".to_string();
    }
    let mut lines = Vec::new();
    for (idx, board) in boards.iter().enumerate() {
        let prefix = if selected == Some(idx) { "> " } else { "  " };
        let private = if board.is_private { " [private]" } else { "" };
        let member = if state.is_my_board(&board.slug) {
            " *"
        } else {
            ""
        };
        lines.push(format!(
            "{prefix}{} {}/{}{private}{member}",
            board.name, board.member_count, board.capacity
        ));
    }
    lines.join("\n")
}

fn render_board_detail(frame: &mut Frame, area: Rect, state: &AppState, slug: &str) {
    let detail = state
        .board_detail
        .as_ref()
        .filter(|detail| detail.slug == slug);
    let Some(detail) = detail else {
        let text = if state.detail_loading {
            "Loading board..."
        } else {
            "Board not loaded"
        };
        let block = Block::default().title(slug.to_string()).borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    };

    let stats = detail.stats();
    let visibility = if detail.is_private {
        "private"
    } else {
        "public"
    };
    let mut lines = vec![
        format!(
            "{} | {}/{} members | {visibility}",
            detail.name,
            detail.members.len(),
            detail.capacity
        ),
        format!(
            "Total: {} | Average: {:.1} | At or above average: {:.0}%",
            stats.total_points, stats.average_points, stats.percent_above_average
        ),
        String::new(),
    ];
    for (idx, member) in detail.members.iter().enumerate() {
        let prefix = if idx == state.members_selected {
            "> "
        } else {
            "  "
        };
        let friend = if member.is_friend { " [friend]" } else { "" };
        let you = if member.username == state.username {
            " (you)"
        } else {
            ""
        };
        lines.push(format!(
            "{prefix}{:<3} {:<20} {:>5}{friend}{you}",
            idx + 1,
            member.username,
            member.points
        ));
    }

    let block = Block::default()
        .title(detail.name.clone())
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines.join("\n")).block(block), area);
}

fn render_create_board(frame: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.create_form;
    let cursor = |field: usize| if form.field == field { "> " } else { "  " };
    let checkbox = if form.is_private { "[x]" } else { "[ ]" };
    let mut lines = vec![
        "Create a leaderboard".to_string(),
        String::new(),
        format!("{}Name:     {}", cursor(0), form.name),
        format!("{}Capacity: {}", cursor(1), form.capacity),
        format!("{}Private:  {checkbox}", cursor(2)),
    ];
    if form.is_private {
        lines.push(format!(
            "{}Password: {}",
            cursor(3),
            "*".repeat(form.password.chars().count())
        ));
    }

    let block = Block::default().title("New Board").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines.join("\n")).block(block), area);
}

fn render_profile(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area);

    let summary = match &state.profile {
        Some(profile) => {
            let mut lines = vec![
                format!("User:    {}", profile.username),
                format!("Points:  {}", profile.points),
                format!("Ranking: #{} of {}", profile.ranking, profile.user_count),
            ];
            if let Some(pct) = profile.points_percentage {
                lines.push(format!("Ahead of {pct:.0}% of players"));
            }
            lines.join("\n")
        }
        None => "No profile loaded".to_string(),
    };
    let summary_block = Block::default().title("Profile").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(summary).block(summary_block), columns[0]);

    let title = format!(
        "My Predictions (page {}/{})",
        state.predictions_page,
        state.predictions_num_pages.max(1)
    );
    let text = if state.predictions.is_empty() {
        "No predictions yet".to_string()
    } else {
        let mut lines = Vec::new();
        for (idx, row) in state.predictions.iter().enumerate() {
            let prefix = if idx == state.predictions_selected {
                "> "
            } else {
                "  "
            };
            let points = row
                .points
                .map(|p| format!("{p:+}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "{prefix}{} {}-{} {:<16} {points:>4}",
                row.home, row.home_goals, row.away_goals, row.away
            ));
        }
        lines.join("\n")
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    frame.render_widget(Paragraph::new(text).block(block), columns[1]);
}

fn render_friends(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let text = if state.friends.is_empty() {
        "No friends yet. Press a to add one.".to_string()
    } else {
        let mut lines = Vec::new();
        for (idx, friend) in state.friends.iter().enumerate() {
            let prefix = if idx == state.friends_selected {
                "> "
            } else {
                "  "
            };
            lines.push(format!(
                "{prefix}{:<20} {:>5}",
                friend.username, friend.points
            ));
        }
        lines.join("\n")
    };
    let block = Block::default().title("Friends").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(text).block(block), sections[0]);

    if state.friend_input_active {
        let input = Paragraph::new(format!("Add friend: {}_", state.friend_input));
        frame.render_widget(input, sections[1]);
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No activity yet".to_string();
    }
    let mut lines: Vec<&str> = state.logs.iter().rev().take(3).map(String::as_str).collect();
    lines.reverse();
    lines.join("\n")
}

fn format_kickoff(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "TBD".to_string();
    }
    let cleaned = raw.trim();
    if let Some(dt) = parse_kickoff(cleaned) {
        return dt.format("%d %b %H:%M").to_string();
    }
    if let Some(prefix) = cleaned.get(..16) {
        return prefix.replace('T', " ");
    }
    cleaned.replace('T', " ")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn render_alert_overlay(frame: &mut Frame, area: Rect, alert: &str) {
    let popup_area = centered_rect(46, 20, area);
    frame.render_widget(Clear, popup_area);

    let text = format!("{alert}\n\nPress Enter to dismiss");
    let body = Paragraph::new(text).block(
        Block::default()
            .title("Alert")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(body, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Soccerates Terminal - Help",
        "",
        "Global:",
        "  1-5          Jump to screen",
        "  Tab          Next screen",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Predict:",
        "  j/k or ↑/↓   Move between fixtures",
        "  h/l or ←/→   Home/away score field",
        "  0-9          Type a score (0-10)",
        "  s / Enter    Submit changed predictions",
        "",
        "Boards:",
        "  m            Switch between all boards and mine",
        "  /            Live search by name",
        "  n/p          Next/previous page",
        "  J / L        Join / leave the selected board",
        "  c            Create a board",
        "",
        "Board detail:",
        "  f            Add/remove the member as a friend",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
