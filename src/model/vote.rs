use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// An opaque token tied to a voter, used only to detect repeat voting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(String);

impl Nullifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Deref for Nullifier {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Nullifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Nullifier {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Nullifier {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// A voter's answer to a proposal.
/// Encoded on the wire as `1` for yes and `0` for no.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Choice {
    No = 0,
    Yes = 1,
}

impl Display for Choice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// A single recorded vote. Never modified once accepted by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub nullifier: Nullifier,
    #[serde(rename = "vote")]
    pub choice: Choice,
    /// Accepted as-is; nothing checks it.
    #[serde(default)]
    pub proof: String,
}

impl Vote {
    pub fn new(nullifier: impl Into<Nullifier>, choice: Choice) -> Self {
        Self {
            nullifier: nullifier.into(),
            choice,
            proof: String::new(),
        }
    }
}

/// Running yes/no counts for a session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: u64,
    pub no: u64,
}

impl Tally {
    /// Count one more vote for `choice`.
    pub fn record(&mut self, choice: Choice) {
        match choice {
            Choice::Yes => self.yes += 1,
            Choice::No => self.no += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.yes + self.no
    }
}

/// A consistent snapshot of a session's outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub tally: Tally,
    pub total_votes: u64,
}
