use serde::{Deserialize, Serialize};
use std::fmt;

/// Team-size configuration requested by a client.
///
/// `NoMatching` skips the matchmaking queue entirely: the player is dropped
/// into any running free-for-all server with spare room, or a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MatchType {
    NoMatching,
    OneVsOne,
    ThreeVsThree,
    SixVsSix,
}

impl MatchType {
    pub const ALL: [MatchType; 4] = [
        MatchType::NoMatching,
        MatchType::OneVsOne,
        MatchType::ThreeVsThree,
        MatchType::SixVsSix,
    ];

    /// Number of players a server of this type holds.
    pub fn capacity(self) -> usize {
        match self {
            MatchType::NoMatching => 12,
            MatchType::OneVsOne => 2,
            MatchType::ThreeVsThree => 6,
            MatchType::SixVsSix => 12,
        }
    }

    pub fn as_wire(self) -> i64 {
        match self {
            MatchType::NoMatching => 0,
            MatchType::OneVsOne => 1,
            MatchType::ThreeVsThree => 3,
            MatchType::SixVsSix => 6,
        }
    }
}

/// Capacity lookup for a raw wire value.
pub fn capacity_of(raw: i64) -> Result<usize, InvalidMatchType> {
    MatchType::try_from(raw).map(MatchType::capacity)
}

impl TryFrom<i64> for MatchType {
    type Error = InvalidMatchType;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MatchType::NoMatching),
            1 => Ok(MatchType::OneVsOne),
            3 => Ok(MatchType::ThreeVsThree),
            6 => Ok(MatchType::SixVsSix),
            other => Err(InvalidMatchType(other)),
        }
    }
}

impl From<MatchType> for i64 {
    fn from(match_type: MatchType) -> Self {
        match_type.as_wire()
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchType::NoMatching => "no_matching",
            MatchType::OneVsOne => "1v1",
            MatchType::ThreeVsThree => "3v3",
            MatchType::SixVsSix => "6v6",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMatchType(pub i64);

impl fmt::Display for InvalidMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid match type: {}", self.0)
    }
}

impl std::error::Error for InvalidMatchType {}
