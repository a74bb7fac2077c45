use log::{debug, info};
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{SubmitVoteRequest, VoteRecorded},
    registry::Registry,
};

use super::validated_proposal_id;

pub fn routes() -> Vec<Route> {
    routes![submit_vote]
}

#[post("/api/vote/submit", data = "<request>")]
async fn submit_vote(
    id: &RequestId,
    request: Json<SubmitVoteRequest>,
    registry: &State<Registry>,
    config: &State<Config>,
) -> Result<Json<VoteRecorded>> {
    let SubmitVoteRequest { proposal_id, vote } = request.into_inner();
    validated_proposal_id(&proposal_id, config)?;
    if vote.nullifier.trim().is_empty() {
        return Err(Error::bad_request("Missing nullifier"));
    }

    // Fetch the session under the registry lock, then vote under the session lock.
    let session = registry.get_session(&proposal_id)?;
    debug!("{id} nullifier {} voting {}", vote.nullifier, vote.choice);
    let choice = vote.choice;
    session.submit_vote(vote)?;
    info!("{id} recorded '{choice}' vote for proposal '{proposal_id}'");

    Ok(Json(VoteRecorded::default()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rocket::{
        futures::future::join_all,
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json::json,
    };

    use crate::model::{
        api::{CreateSessionRequest, ErrorBody, ProposalResults},
        vote::{Choice, Tally},
    };

    use super::*;

    async fn open_session(client: &Client) {
        let response = client
            .post("/api/session/create")
            .header(ContentType::JSON)
            .body(json!(CreateSessionRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }

    async fn vote<'c>(client: &'c Client, nullifier: &str, choice: Choice) -> LocalResponse<'c> {
        client
            .post(uri!(submit_vote))
            .header(ContentType::JSON)
            .body(json!(SubmitVoteRequest::example(nullifier, choice)).to_string())
            .dispatch()
            .await
    }

    async fn fetch_results(client: &Client) -> ProposalResults {
        client
            .get("/api/results?proposalId=P1")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap()
    }

    #[backend_test]
    async fn double_vote_scenario(client: Client) {
        open_session(&client).await;

        let response = vote(&client, "n1", Choice::Yes).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<VoteRecorded>().await.unwrap(),
            VoteRecorded::default()
        );
        assert_eq!(Status::Ok, vote(&client, "n2", Choice::No).await.status());
        assert_eq!(
            Status::BadRequest,
            vote(&client, "n1", Choice::Yes).await.status()
        );

        let results = fetch_results(&client).await;
        assert_eq!(results.results, Tally { yes: 1, no: 1 });
        assert_eq!(results.total_votes, 2);
    }

    #[backend_test]
    async fn repeat_vote_reported_apart_from_blank_nullifier(client: Client) {
        open_session(&client).await;
        assert_eq!(Status::Ok, vote(&client, "n1", Choice::Yes).await.status());

        let response = vote(&client, "n1", Choice::Yes).await;
        assert_eq!(Status::BadRequest, response.status());
        let duplicate = response.into_json::<ErrorBody>().await.unwrap();

        let response = vote(&client, "  ", Choice::Yes).await;
        assert_eq!(Status::BadRequest, response.status());
        let blank = response.into_json::<ErrorBody>().await.unwrap();

        assert_ne!(duplicate, blank);
        assert_eq!(duplicate.kind, "duplicate_nullifier");
        assert!(duplicate.error.starts_with("Nullifier already used"));
        assert_eq!(blank.kind, "bad_request");
        assert_eq!(fetch_results(&client).await.total_votes, 1);
    }

    #[backend_test]
    async fn vote_on_unknown_proposal(client: Client) {
        let response = vote(&client, "n1", Choice::Yes).await;
        assert_eq!(Status::NotFound, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.kind, "not_found");
    }

    #[backend_test]
    async fn raw_wire_vote(client: Client) {
        open_session(&client).await;
        let response = client
            .post(uri!(submit_vote))
            .header(ContentType::JSON)
            .body(
                json!({
                    "proposalId": "P1",
                    "vote": {"nullifier": "abc", "vote": 0, "proof": "zk-proof-bytes"},
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let registry = client.rocket().state::<Registry>().unwrap();
        let votes = registry.get_session("P1").unwrap().votes();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].choice, Choice::No);
        assert_eq!(votes[0].proof, "zk-proof-bytes");
    }

    #[backend_test]
    async fn malformed_votes_are_rejected(client: Client) {
        open_session(&client).await;

        for body in [
            json!({"proposalId": "P1", "vote": {"nullifier": "a", "vote": 7}}),
            json!({"proposalId": "P1", "vote": {"vote": 1}}),
            json!({"proposalId": "P1"}),
        ] {
            let response = client
                .post(uri!(submit_vote))
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert!(response.status().code >= 400 && response.status().code < 500);
        }

        let response = vote(&client, "  ", Choice::Yes).await;
        assert_eq!(Status::BadRequest, response.status());

        assert_eq!(fetch_results(&client).await.total_votes, 0);
    }

    #[backend_test]
    async fn concurrent_distinct_votes(client: Client) {
        const VOTERS: usize = 64;
        open_session(&client).await;

        let nullifiers = (0..VOTERS).map(|i| format!("n{i}")).collect::<Vec<_>>();
        let responses = join_all(nullifiers.iter().enumerate().map(|(i, n)| {
            let choice = if i % 3 == 0 { Choice::No } else { Choice::Yes };
            vote(&client, n, choice)
        }))
        .await;
        assert!(responses.iter().all(|r| r.status() == Status::Ok));

        let results = fetch_results(&client).await;
        assert_eq!(results.total_votes, VOTERS as u64);
        assert_eq!(results.results.yes + results.results.no, VOTERS as u64);

        let registry = client.rocket().state::<Registry>().unwrap();
        let recorded = registry
            .get_session("P1")
            .unwrap()
            .votes()
            .into_iter()
            .map(|v| v.nullifier.to_string())
            .collect::<HashSet<_>>();
        assert_eq!(recorded, nullifiers.into_iter().collect::<HashSet<_>>());
    }
}
