#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

#[macro_use]
extern crate slog_scope;

use std::vec::Vec;

use docopt::Docopt;
use serde::Deserialize;

use broker_common::errors::Result;
use broker_settings::{AppState, Settings};
use broker_web::{build_app, config};

const USAGE: &str = "
Usage: broker [options]

Options:
    -h, --help                          Show this message.
    --config=CONFIGFILE                 Connection configuration file path.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_config: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());
    let mut filenames = Vec::new();
    if let Some(config_filename) = args.flag_config {
        filenames.push(config_filename);
    }
    let settings = Settings::with_env_and_config_files(&filenames)?;
    broker_common::logging::init_logging(settings.human_logs)
        .expect("logging failed to initialize");
    debug!("Starting up broker...");

    let port = settings.port;
    let hostname = settings.hostname.clone();
    let app_state = AppState::from_settings(settings)?;

    info!("Starting broker on {}:{}", hostname, port);

    actix_web::HttpServer::new(move || build_app!(app_state, config(app_state.settings.clone())))
        .bind(("0.0.0.0", port))?
        .run()
        .await?;

    info!("Shutting down broker");
    Ok(())
}
