#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{Config, ConfigFairing};
use crate::logging::LoggerFairing;
use crate::model::registry::Registry;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// Build the server, taking its configuration from Rocket's figment.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Build the server with an explicit configuration.
pub fn build_with_config(config: Config) -> Rocket<Build> {
    assemble(rocket::build().manage(config))
}

/// Every server instance owns a fresh registry; sessions live exactly as
/// long as the instance.
fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .manage(Registry::new())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
}
