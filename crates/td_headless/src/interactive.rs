//! Interactive JSON-lines session.
//!
//! Reads [`Command`]s line by line and answers each with one [`Response`]
//! line. Ticks that end the match add a trailing `game_over` line.

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use td_core::data::LevelConfig;
use td_core::error::GameError;
use td_core::match_state::{MatchState, MatchSummary};
use td_core::rules::tick_dt;

use crate::protocol::{Command, Response};

/// Error type for interactive sessions.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The level cannot start a match.
    #[error("Cannot start match: {0}")]
    Match(#[from] GameError),
    /// Reading commands or writing responses failed.
    #[error("Session IO failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One protocol session over a match.
#[derive(Debug)]
pub struct Session {
    state: MatchState,
    quit: bool,
}

impl Session {
    /// Start a session on a fresh match of `level`.
    ///
    /// # Errors
    /// Returns an error if the level cannot start a match.
    pub fn new(level: &LevelConfig) -> Result<Self, GameError> {
        Ok(Self {
            state: MatchState::new(level)?,
            quit: false,
        })
    }

    /// The `ready` greeting.
    pub fn greeting(&self) -> Response {
        Response::ready(self.state.level_id(), self.state.get_tick())
    }

    /// Whether a `quit` was received.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The match being played.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Handle one input line and return the responses to send.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        match Command::from_json(line) {
            Ok(command) => self.handle(command),
            Err(e) => {
                warn!(error = %e, "Unparseable command");
                vec![Response::error(format!("Invalid command: {e}"), None)]
            }
        }
    }

    /// Handle one command and return the responses to send.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        debug!(cmd = command.name(), "Command");
        match command {
            Command::Tick { count } => self.run_ticks(count),
            Command::Place { tower, x, y } => {
                let response = match self.state.place_tower_at(&tower, x, y) {
                    Ok(id) => Response::Placed {
                        tower_id: id.0,
                        tower,
                        gold: self.state.gold(),
                    },
                    Err(reason) => Response::Rejected { tower, reason },
                };
                vec![response]
            }
            Command::Preview { tower, x, y } => {
                let reason = self.state.check_placement_at(&tower, x, y).err();
                vec![Response::Preview {
                    tower,
                    x,
                    y,
                    allowed: reason.is_none(),
                    reason,
                }]
            }
            Command::StartWave => {
                let applied = self.state.start_next_wave_now();
                vec![Response::ack("start_wave", applied)]
            }
            Command::Query => vec![Response::State {
                snapshot: self.state.snapshot(),
                events: Vec::new(),
            }],
            Command::Summary => vec![Response::Summary {
                summary: self.state.summary(),
            }],
            Command::Hash => vec![Response::Hash {
                tick: self.state.get_tick(),
                hash: self.state.state_hash(),
            }],
            Command::Quit => {
                self.quit = true;
                vec![Response::ack("quit", true)]
            }
        }
    }

    fn run_ticks(&mut self, count: u32) -> Vec<Response> {
        let dt = tick_dt();
        let mut events = Vec::new();
        let mut ended = false;

        for _ in 0..count {
            let batch = self.state.tick(dt);
            ended |= batch.outcome().is_some();
            events.extend(batch.events);
            if self.state.is_terminal() {
                break;
            }
        }

        let mut responses = vec![Response::State {
            snapshot: self.state.snapshot(),
            events,
        }];
        if ended {
            responses.push(Response::GameOver {
                summary: self.state.summary(),
                ticks: self.state.get_tick(),
            });
        }
        responses
    }
}

/// Serve a session on `level`, reading commands from `reader` and writing
/// responses to `writer` until `quit` or end of input.
///
/// Returns the final match summary.
///
/// # Errors
/// Returns an error if the level cannot start a match or IO fails.
pub fn serve<R: BufRead, W: Write>(
    level: &LevelConfig,
    reader: R,
    mut writer: W,
) -> Result<MatchSummary, SessionError> {
    let mut session = Session::new(level)?;
    info!(level = level.id, name = %level.name, "Session started");

    write_response(&mut writer, &session.greeting())?;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        for response in session.handle_line(line) {
            write_response(&mut writer, &response)?;
        }

        if session.should_quit() {
            break;
        }
    }

    info!(tick = session.state().get_tick(), "Session ended");
    Ok(session.state().summary())
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> std::io::Result<()> {
    writer.write_all(response.to_json_line().as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::events::MatchStatus;
    use td_core::match_state::PlacementError;
    use td_test_utils::fixtures::{green_plains, single_lane};

    fn session() -> Session {
        Session::new(&green_plains()).unwrap()
    }

    #[test]
    fn test_greeting() {
        assert_eq!(session().greeting(), Response::ready(1, 0));
    }

    #[test]
    fn test_place_and_reject() {
        let mut session = session();
        let placed = session.handle(Command::Place {
            tower: "archer".to_string(),
            x: 230.0,
            y: 180.0,
        });
        assert_eq!(
            placed,
            vec![Response::Placed {
                tower_id: 0,
                tower: "archer".to_string(),
                gold: 50,
            }]
        );

        let rejected = session.handle(Command::Place {
            tower: "archer".to_string(),
            x: 235.0,
            y: 185.0,
        });
        assert_eq!(
            rejected,
            vec![Response::Rejected {
                tower: "archer".to_string(),
                reason: PlacementError::TooClose,
            }]
        );
    }

    #[test]
    fn test_preview_does_not_place() {
        let mut session = session();
        let responses = session.handle(Command::Preview {
            tower: "ziggurat".to_string(),
            x: 100.0,
            y: 250.0,
        });
        assert!(matches!(
            responses.as_slice(),
            [Response::Preview {
                allowed: false,
                reason: Some(PlacementError::OnRoad),
                ..
            }]
        ));
        assert!(session.state().towers().is_empty());
    }

    #[test]
    fn test_tick_reports_events() {
        let mut session = session();
        session.handle(Command::StartWave);
        let responses = session.handle(Command::Tick { count: 2 });
        match responses.as_slice() {
            [Response::State { snapshot, events }] => {
                assert_eq!(snapshot.tick, 2);
                assert!(!events.is_empty());
            }
            other => panic!("unexpected responses: {other:?}"),
        }
    }

    #[test]
    fn test_game_over_follows_final_state() {
        let mut session = Session::new(&single_lane(1, 1)).unwrap();
        let responses = session.handle(Command::Tick { count: 10_000 });

        assert_eq!(responses.len(), 2);
        match &responses[1] {
            Response::GameOver { summary, .. } => {
                assert_eq!(summary.outcome, MatchStatus::GameOver);
            }
            other => panic!("expected game_over, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_line_is_an_error_response() {
        let mut session = session();
        let responses = session.handle_line("{\"cmd\":\"fly\"}");
        assert!(matches!(responses.as_slice(), [Response::Error { cmd: None, .. }]));
    }

    #[test]
    fn test_serve_until_quit() {
        let input = "{\"cmd\":\"hash\"}\n\n{\"cmd\":\"quit\"}\n{\"cmd\":\"tick\"}\n";
        let mut output = Vec::new();
        let summary = serve(&green_plains(), input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"ready\""));
        assert!(lines[1].contains("\"hash\""));
        assert!(lines[2].contains("\"ack\""));
        assert_eq!(summary.outcome, MatchStatus::Playing);
    }
}
