use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{CreateSessionRequest, ProposalResults, SessionCreated},
    registry::Registry,
};

use super::validated_proposal_id;

pub fn routes() -> Vec<Route> {
    routes![create_session, results]
}

#[post("/api/session/create", data = "<request>")]
async fn create_session(
    id: &RequestId,
    request: Json<CreateSessionRequest>,
    registry: &State<Registry>,
    config: &State<Config>,
) -> Result<Json<SessionCreated>> {
    let proposal_id = validated_proposal_id(&request.proposal_id, config)?;
    registry.create_session(proposal_id, config.session_policy())?;
    info!("{id} opened session for proposal '{proposal_id}'");
    Ok(Json(SessionCreated::new(proposal_id.to_string())))
}

#[derive(Debug, FromForm)]
struct ResultsQuery {
    #[field(name = "proposalId")]
    proposal_id: Option<String>,
}

#[get("/api/results?<query..>")]
async fn results(
    query: ResultsQuery,
    registry: &State<Registry>,
    config: &State<Config>,
) -> Result<Json<ProposalResults>> {
    let proposal_id = query
        .proposal_id
        .ok_or_else(|| Error::bad_request("Missing proposalId"))?;
    validated_proposal_id(&proposal_id, config)?;

    // The registry lock is released before the session is read.
    let session = registry.get_session(&proposal_id)?;
    let snapshot = session.results();

    Ok(Json(ProposalResults {
        proposal_id,
        results: snapshot.tally,
        total_votes: snapshot.total_votes,
    }))
}
