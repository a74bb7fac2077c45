use rocket::Route;

use crate::config::Config;
use crate::error::{Error, Result};

mod health;
mod nullifier;
mod session;
mod vote;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(health::routes());
    routes.extend(session::routes());
    routes.extend(vote::routes());
    routes.extend(nullifier::routes());
    routes
}

/// Reject blank or oversized proposal IDs before they reach the registry.
fn validated_proposal_id<'a>(proposal_id: &'a str, config: &Config) -> Result<&'a str> {
    if proposal_id.trim().is_empty() {
        return Err(Error::bad_request("Missing proposalId"));
    }
    if proposal_id.len() > config.max_id_length() {
        return Err(Error::bad_request(format!(
            "proposalId longer than {} bytes",
            config.max_id_length()
        )));
    }
    Ok(proposal_id)
}
