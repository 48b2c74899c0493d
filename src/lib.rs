//! Backend for a face-recognition-gated voting system.
//!
//! An admin registers voters by capturing a face embedding, voters
//! authenticate via a webcam face match instead of a password, cast one
//! vote each, and anyone signed in can view the live tallies. Embedding
//! *extraction* (image to vector) happens in the client with a pretrained
//! model; this server consumes the numeric vectors, matches them against
//! the enrolled gallery, and enforces exactly-once voting through a unique
//! index in the store.

#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{figment::Figment, Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod reconcile;

pub use config::Config;

/// Assemble the server: all routes plus the config, database, logging and
/// reconciliation fairings. Connections are established at ignition.
pub fn build() -> Rocket<Build> {
    assemble(rocket::Config::figment())
}

fn assemble(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
        .attach(reconcile::ReconcilerFairing)
}

/// Spin up a full server instance against a fresh scratch database, for
/// tests that exercise real MongoDB behaviour. The reconciler is disabled
/// so its immediate first pass cannot race the scenario under test.
/// Scratch databases are randomly named, so one leaked by a panicking test
/// cannot collide with another run.
#[cfg(test)]
pub(crate) async fn client_and_db() -> (rocket::local::asynchronous::Client, mongodb::Database) {
    let figment = rocket::Config::figment().merge(("reconcile_interval", 0));
    let client = rocket::local::asynchronous::Client::tracked(assemble(figment))
        .await
        .expect("server failed to ignite; is MongoDB up?");
    let db = client
        .rocket()
        .state::<mongodb::Database>()
        .unwrap()
        .clone();
    (client, db)
}
