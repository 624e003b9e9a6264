use crate::args::{Cli, Commands};
use crate::config::Config;
use crate::handlers;
use crate::handlers::parse::IngestOptions;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse {
            log,
            resolve_headers,
            parallel,
            db,
            compile_commands,
            verbose,
        } => handlers::parse::handle(
            log,
            IngestOptions {
                resolve_headers,
                parallel,
                db,
                compile_commands,
                verbose,
                echo: false,
            },
            &config,
        ),

        Commands::Build {
            args,
            resolve_headers,
            parallel,
            db,
            compile_commands,
            verbose,
        } => handlers::build::handle(
            &args,
            IngestOptions {
                resolve_headers,
                parallel,
                db,
                compile_commands,
                verbose,
                // The log must stay visible while the build runs
                echo: true,
            },
            &config,
        ),

        Commands::Query { name, db, json } => handlers::query::handle(&name, db, json, &config),
    }
}
