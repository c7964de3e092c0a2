//! CLI smoke entry point.
//!
//! # Responsibility
//! - Build a seeded datastore from environment config and print collection
//!   counts, verifying `trainhub_core` wiring end to end.
//! - Optionally start file logging when `TRAINHUB_LOG_DIR` is set.

use std::process::ExitCode;
use trainhub_core::{
    init_logging, Datastore, EntityStore, FilterCriteria, ListQuery, StoreConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("trainhub: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Ok(log_dir) = std::env::var("TRAINHUB_LOG_DIR") {
        if let Err(err) = init_logging(&config.log_level, &log_dir) {
            eprintln!("trainhub: {err}");
            return ExitCode::FAILURE;
        }
    }

    let datastore = match Datastore::seeded(&config) {
        Ok(datastore) => datastore,
        Err(err) => {
            eprintln!("trainhub: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("trainhub_core version={}", trainhub_core::core_version());
    for (collection, count) in datastore.counts() {
        println!("{collection}={count}");
    }

    let active_students = datastore
        .students
        .filter(&FilterCriteria::new().with("status", "actif"))
        .await;
    let newest_sessions = datastore
        .sessions
        .list(&ListQuery::sorted_by("-created_date").with_limit(5))
        .await;
    println!("active_students={}", active_students.len());
    println!("recent_sessions={}", newest_sessions.len());
    log::info!("event=cli_smoke module=cli status=ok");

    ExitCode::SUCCESS
}
