use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::model::vote::{Nullifier, Results, Tally, Vote};

/// The live vote-collection state for one proposal.
///
/// All mutable state sits behind a single lock, so the tally can never be
/// observed out of step with the vote list.
#[derive(Debug)]
pub struct VotingSession {
    proposal_id: String,
    ledger: Mutex<Ledger>,
}

#[derive(Debug, Default)]
struct Ledger {
    /// Accepted votes in acceptance order.
    votes: Vec<Vote>,
    /// Exactly the nullifiers present in `votes`.
    seen: HashSet<Nullifier>,
    tally: Tally,
}

impl VotingSession {
    /// Create an empty session.
    pub fn new(proposal_id: impl Into<String>) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn proposal_id(&self) -> &str {
        &self.proposal_id
    }

    /// Record a vote, unless its nullifier has already been used in this
    /// session. A rejected vote leaves the session untouched.
    pub fn submit_vote(&self, vote: Vote) -> Result<()> {
        let mut ledger = self.lock();
        if ledger.seen.contains(&vote.nullifier) {
            return Err(Error::DuplicateNullifier(format!(
                "'{}' in proposal '{}'",
                vote.nullifier, self.proposal_id
            )));
        }
        ledger.seen.insert(vote.nullifier.clone());
        ledger.tally.record(vote.choice);
        ledger.votes.push(vote);
        Ok(())
    }

    /// Snapshot the current tally.
    pub fn results(&self) -> Results {
        let ledger = self.lock();
        Results {
            tally: ledger.tally,
            total_votes: ledger.votes.len() as u64,
        }
    }

    /// Snapshot the accepted votes, oldest first.
    pub fn votes(&self) -> Vec<Vote> {
        self.lock().votes.clone()
    }

    /// Nothing panics while the lock is held mid-update, so a poisoned
    /// ledger is still consistent.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::model::vote::Choice;

    use super::*;

    fn assert_consistent(session: &VotingSession) {
        let results = session.results();
        let votes = session.votes();
        assert_eq!(results.tally.yes + results.tally.no, results.total_votes);
        assert_eq!(results.total_votes, votes.len() as u64);
        let unique = votes.iter().map(|v| &v.nullifier).collect::<HashSet<_>>();
        assert_eq!(unique.len(), votes.len());
    }

    #[test]
    fn new_session_is_empty() {
        let session = VotingSession::new("P1");
        assert_eq!(session.proposal_id(), "P1");
        assert_eq!(
            session.results(),
            Results {
                tally: Tally { yes: 0, no: 0 },
                total_votes: 0,
            }
        );
        assert!(session.votes().is_empty());
    }

    #[test]
    fn duplicate_nullifier_is_rejected_without_mutation() {
        let session = VotingSession::new("P1");
        session.submit_vote(Vote::new("n1", Choice::Yes)).unwrap();
        session.submit_vote(Vote::new("n2", Choice::No)).unwrap();
        let before = session.results();

        // Same nullifier, different choice: still a repeat voter.
        let err = session
            .submit_vote(Vote::new("n1", Choice::No))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNullifier(_)));

        assert_eq!(session.results(), before);
        assert_eq!(
            session.results(),
            Results {
                tally: Tally { yes: 1, no: 1 },
                total_votes: 2,
            }
        );
        assert_consistent(&session);
    }

    #[test]
    fn tally_matches_votes_after_every_submission() {
        let session = VotingSession::new("P1");
        let submissions = [
            ("a", Choice::Yes, true),
            ("b", Choice::Yes, true),
            ("a", Choice::No, false),
            ("c", Choice::No, true),
            ("b", Choice::Yes, false),
            ("d", Choice::Yes, true),
        ];
        for (nullifier, choice, accepted) in submissions {
            let result = session.submit_vote(Vote::new(nullifier, choice));
            if accepted {
                assert!(result.is_ok(), "{nullifier} should be accepted");
            } else {
                assert!(
                    matches!(result, Err(Error::DuplicateNullifier(_))),
                    "{nullifier} should be a repeat"
                );
            }
            assert_consistent(&session);
        }
        assert_eq!(session.results().tally, Tally { yes: 3, no: 1 });
    }

    #[test]
    fn votes_keep_acceptance_order() {
        let session = VotingSession::new("P1");
        for nullifier in ["z", "y", "x"] {
            session.submit_vote(Vote::new(nullifier, Choice::No)).unwrap();
        }
        let order = session
            .votes()
            .into_iter()
            .map(|v| v.nullifier.to_string())
            .collect::<Vec<_>>();
        assert_eq!(order, ["z", "y", "x"]);
    }

    #[test]
    fn concurrent_distinct_votes_are_all_counted() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let session = VotingSession::new("P1");
        thread::scope(|s| {
            for t in 0..THREADS {
                let session = &session;
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let choice = if i % 2 == 0 { Choice::Yes } else { Choice::No };
                        session
                            .submit_vote(Vote::new(format!("{t}-{i}"), choice))
                            .unwrap();
                    }
                });
            }
        });

        let results = session.results();
        assert_eq!(results.total_votes, (THREADS * PER_THREAD) as u64);
        assert_consistent(&session);
    }

    #[test]
    fn concurrent_repeat_voter_is_accepted_once() {
        let session = VotingSession::new("P1");
        let accepted = thread::scope(|s| {
            let session = &session;
            let handles = (0..16)
                .map(|_| s.spawn(move || session.submit_vote(Vote::new("same", Choice::Yes))))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|result| result.is_ok())
                .count()
        });
        assert_eq!(accepted, 1);
        assert_eq!(session.results().total_votes, 1);
    }
}
