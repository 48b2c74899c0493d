use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    db::admin::ensure_admin_exists,
    mongodb::{ensure_indexes_exist, Coll},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    registration_threshold: f64,
    login_threshold: f64,
    reconcile_interval: u32,
    default_admin_username: String,
    // secrets
    jwt_secret: String,
    default_admin_password: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Maximum embedding distance at which a new registrant counts as an
    /// already-registered face.
    pub fn registration_threshold(&self) -> f64 {
        self.registration_threshold
    }

    /// Maximum embedding distance at which a login capture identifies a
    /// stored user.
    pub fn login_threshold(&self) -> f64 {
        self.login_threshold
    }

    /// Seconds between vote-count reconciliation runs; zero disables the
    /// reconciler.
    pub fn reconcile_interval(&self) -> u32 {
        self.reconcile_interval
    }

    /// Username for the bootstrap admin created on an empty database.
    pub fn default_admin_username(&self) -> &str {
        &self.default_admin_username
    }

    /// Password for the bootstrap admin created on an empty database.
    pub fn default_admin_password(&self) -> &str {
        &self.default_admin_password
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// Example data for tests.
#[cfg(test)]
impl Config {
    pub fn example() -> Self {
        Self {
            auth_ttl: 3600,
            registration_threshold: 0.5,
            login_threshold: 0.5,
            reconcile_interval: 60,
            default_admin_username: "coordinator".to_string(),
            jwt_secret: "test-jwt-secret-do-not-use".to_string(),
            default_admin_password: "correct horse battery staple".to_string(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
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
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let db_config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist; the unique vote index in
        // particular must be in place before any vote is accepted.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }

        // Ensure there is at least one admin able to register voters.
        // The application config is managed by `ConfigFairing`, which runs first.
        let config = rocket
            .state::<Config>()
            .expect("ConfigFairing must be attached before DatabaseFairing");
        let admins = Coll::from_db(&db);
        if let Err(e) = ensure_admin_exists(&admins, config).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "facevote".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
