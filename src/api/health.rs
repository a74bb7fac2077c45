use rocket::{serde::json::Json, Route};

use crate::model::api::Health;

pub fn routes() -> Vec<Route> {
    routes![health]
}

#[get("/health")]
async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
    })
}
