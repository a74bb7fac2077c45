use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::registry::SessionPolicy;

const DEFAULT_MAX_ID_LENGTH: usize = 256;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_overwrite_sessions")]
    overwrite_sessions: bool,
    #[serde(default = "default_max_id_length")]
    max_id_length: usize,
}

fn default_overwrite_sessions() -> bool {
    true
}

fn default_max_id_length() -> usize {
    DEFAULT_MAX_ID_LENGTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overwrite_sessions: default_overwrite_sessions(),
            max_id_length: default_max_id_length(),
        }
    }
}

impl Config {
    pub fn new(overwrite_sessions: bool, max_id_length: usize) -> Self {
        Self {
            overwrite_sessions,
            max_id_length,
        }
    }

    /// How re-creating an existing proposal's session is handled.
    /// Configured via `OVERWRITE_SESSIONS`.
    pub fn session_policy(&self) -> SessionPolicy {
        if self.overwrite_sessions {
            SessionPolicy::Overwrite
        } else {
            SessionPolicy::Reject
        }
    }

    /// Longest accepted proposal ID, in bytes.
    /// Configured via `MAX_ID_LENGTH`.
    pub fn max_id_length(&self) -> usize {
        self.max_id_length
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// A config that is already managed (e.g. supplied by a test) is left alone.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        if rocket.state::<Config>().is_some() {
            return Ok(rocket);
        }

        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!(
            "Loaded config: session policy {:?}, max ID length {}",
            config.session_policy(),
            config.max_id_length()
        );

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}
