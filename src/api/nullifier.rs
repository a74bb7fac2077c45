use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{NullifierRequest, NullifierResponse},
    nullifier::derive_nullifier,
};

pub fn routes() -> Vec<Route> {
    routes![generate_nullifier]
}

#[post("/api/nullifier/generate", data = "<request>")]
async fn generate_nullifier(request: Json<NullifierRequest>) -> Result<Json<NullifierResponse>> {
    if request.voter_id.trim().is_empty() {
        return Err(Error::bad_request("Missing voterId"));
    }
    Ok(Json(NullifierResponse {
        nullifier: derive_nullifier(&request.voter_id),
    }))
}
