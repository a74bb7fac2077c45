use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::error::{Error, Result};
use crate::model::session::VotingSession;

/// What to do when a session is created for a proposal that already has one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// Replace the existing session, discarding its votes.
    #[default]
    Overwrite,
    /// Refuse, leaving the existing session untouched.
    Reject,
}

/// All live voting sessions, keyed by proposal ID.
///
/// The registry lock only covers the map itself. Callers fetch a session
/// handle, the lock is released, and the session's own lock is taken for
/// voting or tallying, so different proposals never contend.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Mutex<HashMap<String, Arc<VotingSession>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh, empty session for `proposal_id`.
    pub fn create_session(
        &self,
        proposal_id: &str,
        policy: SessionPolicy,
    ) -> Result<Arc<VotingSession>> {
        let mut sessions = self.lock();
        if sessions.contains_key(proposal_id) {
            match policy {
                SessionPolicy::Overwrite => {
                    warn!("Replacing existing session for proposal '{proposal_id}', prior votes discarded");
                }
                SessionPolicy::Reject => {
                    return Err(Error::Conflict(format!(
                        "Session for proposal '{proposal_id}' already exists"
                    )));
                }
            }
        }
        let session = Arc::new(VotingSession::new(proposal_id));
        sessions.insert(proposal_id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Look up the session for `proposal_id`.
    pub fn get_session(&self, proposal_id: &str) -> Result<Arc<VotingSession>> {
        self.lock()
            .get(proposal_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Session for proposal '{proposal_id}'")))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<VotingSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
