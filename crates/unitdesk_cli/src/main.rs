//! Command-line front end.
//!
//! # Responsibility
//! - Load configuration and open the configured store.
//! - Drive the request boundary and print status plus JSON body.
//! - Host the HTTP routes for `serve`.
//!
//! # Invariants
//! - Exit code 0 only for 2xx responses; 1 for other responses; 2 when
//!   setup fails before any request runs or the server cannot run.

mod args;

use args::{Cli, Commands, UnitsCommand};
use clap::Parser;
use log::info;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use unitdesk_api::{ApiResponse, ListQuery, StatusCode, UnitsApi};
use unitdesk_core::config::{self, CoreConfig};
use unitdesk_core::{
    default_log_level, init_logging, open_store, StoreUnitRepository, UnitService, UnitStore,
};

type CliApi = UnitsApi<StoreUnitRepository<Box<dyn UnitStore>>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ping => {
            println!("unitdesk_core ping={}", unitdesk_core::ping());
            println!("unitdesk_core version={}", unitdesk_core::core_version());
            ExitCode::SUCCESS
        }
        Commands::Units(command) => run_units(cli.config.as_deref(), command),
        Commands::Serve { addr } => run_server(cli.config.as_deref(), addr),
    }
}

fn run_units(config_path: Option<&Path>, command: UnitsCommand) -> ExitCode {
    let api = match setup(config_path) {
        Ok(api) => api,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    let response = run(&api, command);
    print_response(&response);
    if response.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_server(config_path: Option<&Path>, addr: SocketAddr) -> ExitCode {
    let served = setup(config_path).and_then(|api| {
        let runtime = tokio::runtime::Runtime::new().map_err(|err| err.to_string())?;
        runtime
            .block_on(async {
                let listener = TcpListener::bind(addr).await?;
                println!("listening on http://{}", listener.local_addr()?);
                unitdesk_api::serve(listener, Arc::new(api)).await
            })
            .map_err(|err| format!("server on {addr} stopped: {err}"))
    });

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}

fn setup(config_path: Option<&Path>) -> Result<CliApi, String> {
    let config = config::load(config_path).map_err(|err| err.to_string())?;
    start_logging(&config)?;

    let store = open_store(&config.store).map_err(|err| err.to_string())?;
    info!(
        "event=cli_start module=cli status=ok backend={} create_status={}",
        store.backend(),
        config.units.create_status.as_str()
    );
    let service = UnitService::new(StoreUnitRepository::new(store))
        .with_create_status(config.units.create_status);
    Ok(UnitsApi::new(service))
}

fn start_logging(config: &CoreConfig) -> Result<(), String> {
    let Some(dir) = config.logging.dir.as_deref() else {
        return Ok(());
    };
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or_else(|| default_log_level());
    init_logging(level, dir).map_err(|err| err.to_string())
}

fn run(api: &CliApi, command: UnitsCommand) -> ApiResponse {
    match command {
        UnitsCommand::List(filter) => api.list(&ListQuery {
            name: filter.name,
            status: filter.status,
            kind: filter.kind,
        }),
        UnitsCommand::Get { id } => api.get_one(&id),
        UnitsCommand::Create { name, kind, status } => api.create(&json!({
            "unit": { "name": name, "type": kind, "status": status }
        })),
        UnitsCommand::Update {
            id,
            name,
            kind,
            status,
        } => {
            let mut fields = Map::new();
            for (key, value) in [("name", name), ("type", kind), ("status", status)] {
                if let Some(value) = value {
                    fields.insert(key.to_string(), Value::String(value));
                }
            }
            api.update(&id, &json!({ "unit": Value::Object(fields) }))
        }
        UnitsCommand::Clear => match api.service().clear_all() {
            Ok(()) => ApiResponse::json(StatusCode::OK, json!({ "units": [] })),
            Err(err) => unitdesk_api::ApiError::from(err).into_response(),
        },
    }
}

fn print_response(response: &ApiResponse) {
    println!("{}", response.status);
    if let Some(body) = &response.body {
        match serde_json::to_string_pretty(body) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("error: failed to render response: {err}"),
        }
    }
}
