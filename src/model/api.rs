//! Bodies exchanged with HTTP clients.

use serde::{Deserialize, Serialize};

use crate::model::vote::{Nullifier, Tally, Vote};

/// Request to open a voting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub proposal_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub message: String,
    pub proposal_id: String,
}

impl SessionCreated {
    pub fn new(proposal_id: String) -> Self {
        Self {
            message: "Session created".to_string(),
            proposal_id,
        }
    }
}

/// A vote cast against a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    pub proposal_id: String,
    pub vote: Vote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecorded {
    pub message: String,
    pub status: String,
}

impl Default for VoteRecorded {
    fn default() -> Self {
        Self {
            message: "Vote recorded".to_string(),
            status: "success".to_string(),
        }
    }
}

/// Current outcome of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResults {
    pub proposal_id: String,
    pub results: Tally,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullifierRequest {
    pub voter_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierResponse {
    pub nullifier: Nullifier,
}

/// Body sent with every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}
