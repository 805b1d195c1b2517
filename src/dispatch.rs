use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::api;
use crate::session::Session;
use crate::state::{ActionCommand, Delta, ALERT_TRANSPORT};

pub fn spawn_dispatcher(session: Session, tx: Sender<Delta>, cmd_rx: Receiver<ActionCommand>) {
    thread::spawn(move || {
        let refresh_interval = Duration::from_secs(
            env::var("SOCAPP_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(60)
                .max(15),
        );
        let mut last_refresh = Instant::now();

        let _ = tx.send(Delta::Log(format!(
            "[INFO] Connected to {} as {}",
            session.base_url, session.username
        )));
        bootstrap(&session, &tx);

        loop {
            thread::sleep(Duration::from_millis(300));

            // Results and standings move on their own during matchdays.
            if last_refresh.elapsed() >= refresh_interval {
                match api::fetch_fixtures(&session) {
                    Ok(fixtures) => {
                        let _ = tx.send(Delta::SetFixtures(fixtures));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Schedule refresh error: {err}")));
                    }
                }
                match api::fetch_profile(&session) {
                    Ok((profile, friends)) => {
                        let _ = tx.send(Delta::SetProfile(profile));
                        let _ = tx.send(Delta::SetFriends(friends));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Profile refresh error: {err}")));
                    }
                }
                last_refresh = Instant::now();
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                run_command(&session, &tx, cmd);
            }
        }
    });
}

fn bootstrap(session: &Session, tx: &Sender<Delta>) {
    run_command(session, tx, ActionCommand::FetchFixtures);
    run_command(session, tx, ActionCommand::FetchAnswerForm);
    run_command(
        session,
        tx,
        ActionCommand::FetchBoardPage {
            page: 1,
            search: String::new(),
            background: true,
        },
    );
    run_command(session, tx, ActionCommand::FetchMyBoards);
    run_command(session, tx, ActionCommand::FetchProfile);
    run_command(
        session,
        tx,
        ActionCommand::FetchPredictions {
            page: 1,
            background: true,
        },
    );
}

fn run_command(session: &Session, tx: &Sender<Delta>, cmd: ActionCommand) {
    match cmd {
        ActionCommand::FetchFixtures => match api::fetch_fixtures(session) {
            Ok(fixtures) => {
                let _ = tx.send(Delta::SetFixtures(fixtures));
            }
            Err(err) => warn(tx, "Schedule fetch", &err),
        },
        ActionCommand::FetchAnswerForm => match api::fetch_answer_form(session) {
            Ok(rows) => {
                let _ = tx.send(Delta::SetAnswerForm(rows));
            }
            Err(err) => warn(tx, "Answer form fetch", &err),
        },
        ActionCommand::FetchBoardPage {
            page,
            search,
            background,
        } => match api::fetch_board_page(session, page, &search) {
            Ok(page) => {
                let _ = tx.send(Delta::SetBoardPage(page));
            }
            Err(err) if background => warn(tx, "Board page fetch", &err),
            Err(err) => alert(tx, "Board page fetch", &err),
        },
        ActionCommand::SearchBoards { search } => match api::search_boards(session, &search) {
            Ok(page) => {
                let _ = tx.send(Delta::SetBoardPage(page));
            }
            Err(err) => alert(tx, "Board search", &err),
        },
        ActionCommand::FetchMyBoards => match api::fetch_my_boards(session) {
            Ok(boards) => {
                let _ = tx.send(Delta::SetMyBoards(boards));
            }
            Err(err) => warn(tx, "Memberships fetch", &err),
        },
        ActionCommand::FetchBoardDetail { slug } => match api::fetch_board_detail(session, &slug) {
            Ok(detail) => {
                let _ = tx.send(Delta::SetBoardDetail(detail));
            }
            Err(err) => warn(tx, "Board detail fetch", &err),
        },
        ActionCommand::FetchFriends => match api::fetch_profile(session) {
            Ok((_, friends)) => {
                let _ = tx.send(Delta::SetFriends(friends));
            }
            Err(err) => warn(tx, "Friends fetch", &err),
        },
        ActionCommand::FetchPredictions { page, background } => {
            match api::fetch_predictions(session, page) {
                Ok(page) => {
                    let _ = tx.send(Delta::SetPredictions(page));
                }
                Err(err) if background => warn(tx, "Predictions fetch", &err),
                Err(err) => alert(tx, "Predictions fetch", &err),
            }
        }
        ActionCommand::FetchProfile => match api::fetch_profile(session) {
            Ok((profile, friends)) => {
                let _ = tx.send(Delta::SetProfile(profile));
                let _ = tx.send(Delta::SetFriends(friends));
            }
            Err(err) => warn(tx, "Profile fetch", &err),
        },
        ActionCommand::JoinBoard { slug } => match api::join_board(session, &slug) {
            Ok(flags) => {
                let _ = tx.send(Delta::Joined { slug, flags });
            }
            Err(err) => alert(tx, "Join request", &err),
        },
        ActionCommand::LeaveBoard { slug } => match api::leave_board(session, &slug) {
            Ok(flags) => {
                let _ = tx.send(Delta::Left { slug, flags });
            }
            Err(err) => alert(tx, "Leave request", &err),
        },
        ActionCommand::AddFriend { username } => match api::add_friend(session, &username) {
            Ok(flags) => {
                let _ = tx.send(Delta::FriendChanged { username, flags });
            }
            Err(err) => alert(tx, "Add friend request", &err),
        },
        ActionCommand::RemoveFriend { username } => match api::remove_friend(session, &username) {
            Ok(flags) => {
                let _ = tx.send(Delta::FriendChanged { username, flags });
            }
            Err(err) => alert(tx, "Remove friend request", &err),
        },
        ActionCommand::CreateBoard {
            name,
            capacity,
            is_private,
            password,
        } => match api::create_board(session, &name, capacity, is_private, &password) {
            Ok(flags) => {
                let _ = tx.send(Delta::BoardCreated(flags));
            }
            Err(err) => alert(tx, "Create board request", &err),
        },
        ActionCommand::SubmitAnswers { entries, changed } => {
            match api::submit_answers(session, &entries) {
                Ok(()) => {
                    let _ = tx.send(Delta::AnswersSaved { saved: changed });
                }
                Err(err) => alert(tx, "Prediction submit", &err),
            }
        }
    }
}

fn warn(tx: &Sender<Delta>, label: &str, err: &anyhow::Error) {
    let _ = tx.send(Delta::Log(format!("[WARN] {label} error: {err}")));
}

// Transport failures on user-triggered requests surface in the alert bar, not
// just the log ring.
fn alert(tx: &Sender<Delta>, label: &str, err: &anyhow::Error) {
    let _ = tx.send(Delta::Log(format!("[WARN] {label} error: {err}")));
    let _ = tx.send(Delta::Alert(ALERT_TRANSPORT.to_string()));
}
