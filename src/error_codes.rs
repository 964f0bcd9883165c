//! Error codes carried in the server's `response` message.
//!
//! The server reports the outcome of a command as `{"type":"response","code":n}`.
//! A zero code means success; anything else maps onto [`ServerErrorCode`].

use std::fmt;

/// Structured error codes returned by the game server.
///
/// Codes the client does not recognise are preserved in
/// [`Unknown`](ServerErrorCode::Unknown) so they still reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerErrorCode {
    /// The client sent a message whose `type` the server did not understand.
    InvalidMessageType,
    /// A submission had the wrong number of cards for the prompt.
    WrongCardCount,
    /// The declared winner was the judge or a player that does not exist.
    InvalidWinner,
    /// A winner was declared before every submission was marked read.
    JudgedBeforeRead,
    /// A join was attempted with an empty name.
    BlankNameOnJoin,
    /// A round was requested while one is already running.
    RoundAlreadyActive,
    /// A round was requested without enough players.
    InsufficientPlayers,
    /// Any code not listed above.
    Unknown(i32),
}

impl ServerErrorCode {
    /// Map a nonzero wire code onto an error code.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::InvalidMessageType,
            1 => Self::WrongCardCount,
            2 => Self::InvalidWinner,
            3 => Self::JudgedBeforeRead,
            4 => Self::BlankNameOnJoin,
            5 => Self::RoundAlreadyActive,
            6 => Self::InsufficientPlayers,
            other => Self::Unknown(other),
        }
    }

    /// The numeric code as sent by the server.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidMessageType => -1,
            Self::WrongCardCount => 1,
            Self::InvalidWinner => 2,
            Self::JudgedBeforeRead => 3,
            Self::BlankNameOnJoin => 4,
            Self::RoundAlreadyActive => 5,
            Self::InsufficientPlayers => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns a human-readable description suitable for showing to the player.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidMessageType => "Something went wrong with the code...",
            Self::WrongCardCount => "You tried to submit the wrong number of cards.",
            Self::InvalidWinner => {
                "You tried to declare yourself or a nonexistent player as winner."
            }
            Self::JudgedBeforeRead => {
                "You tried to declare a winner before reading all the cards."
            }
            Self::BlankNameOnJoin => "You tried to join the game with a blank name.",
            Self::RoundAlreadyActive => "You can't start a round while one is in progress.",
            Self::InsufficientPlayers => "There aren't enough players to start the round yet.",
            Self::Unknown(_) => "An unknown error occurred.",
        }
    }
}

impl From<i32> for ServerErrorCode {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for ServerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
