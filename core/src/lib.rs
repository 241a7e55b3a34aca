//! League computations that do not touch the database: expanding a season's
//! weekly recurrence into game dates, and ranking teams and players from
//! their set tallies.

use derive_more::Display;

pub mod schedule;
pub mod standings;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "Day of week must be in 0..=6 (0 = Sunday), got {_0}")]
    InvalidDayOfWeek(u8),

    #[display(fmt = "Set tallies must be non-negative, got won={won} lost={lost}")]
    NegativeTally { won: i64, lost: i64 },

    #[display(fmt = "At most {max} sets per result, got won={won} lost={lost}")]
    TooManySets { won: i64, lost: i64, max: i64 },

    #[display(fmt = "Set tally won={won} lost={lost} is too large to add to")]
    TallyOverflow { won: i64, lost: i64 },
}

impl std::error::Error for Error {}
