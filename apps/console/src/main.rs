//! AD manager console command-line client.

#![forbid(unsafe_code)]

mod command;
mod console_config;

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use admanager_application::{
    AuthorizationService, NavigationGuard, SessionInterceptor, SessionLifecycleController,
    SessionStore,
};
use admanager_core::{AppError, AppResult};
use admanager_domain::{Credentials, Permission, UserProfile, permissions_for_roles};
use admanager_infrastructure::{AuthorizedApiClient, FileSessionStorage, HttpAuthBackend};
use clap::Parser;
use serde_json::Value;
use tracing::debug;

use crate::command::{Cli, Command};
use crate::console_config::{ConsoleConfig, init_tracing};

const PASSWORD_VAR: &str = "ADMANAGER_PASSWORD";
const LOGIN_HINT: &str = "not signed in; run `admanager-console login <username>`";

struct ConsoleServices {
    controller: Arc<SessionLifecycleController>,
    authorization: AuthorizationService,
    guard: NavigationGuard,
    api: AuthorizedApiClient,
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ConsoleConfig::load()?;
    let services = build_services(&config)?;
    debug!(
        api_base_url = %config.api_base_url,
        session_file = %config.session_file.display(),
        timeout_secs = config.http_timeout.as_secs(),
        "admanager-console configured"
    );

    Ok(run(cli.command, &services).await)
}

fn build_services(config: &ConsoleConfig) -> AppResult<ConsoleServices> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let storage = Arc::new(FileSessionStorage::new(config.session_file.clone()));
    let store = Arc::new(SessionStore::new(storage));
    let backend = Arc::new(HttpAuthBackend::new(
        http_client.clone(),
        config.api_base_url.as_str(),
    ));
    let controller = Arc::new(SessionLifecycleController::new(backend, store.clone()));
    let api = AuthorizedApiClient::new(
        http_client,
        config.api_base_url.as_str(),
        SessionInterceptor::new(controller.clone()),
    );

    Ok(ConsoleServices {
        authorization: AuthorizationService::new(store),
        guard: NavigationGuard::new(controller.clone()),
        controller,
        api,
    })
}

async fn run(command: Command, services: &ConsoleServices) -> ExitCode {
    match command {
        Command::Login {
            username,
            remember_me,
        } => login(services, username, remember_me).await,
        Command::Logout => {
            services.controller.logout();
            println!("signed out");
            ExitCode::SUCCESS
        }
        Command::Status => status(services).await,
        Command::Whoami => whoami(services).await,
        Command::Can { permission } => can(services, permission),
        Command::Routes => routes(services).await,
        Command::Get { path } => get(services, path.as_str()).await,
    }
}

async fn login(services: &ConsoleServices, username: String, remember_me: bool) -> ExitCode {
    let credentials = read_password()
        .and_then(|password| Credentials::new(username, password, remember_me));
    let credentials = match credentials {
        Ok(credentials) => credentials,
        Err(error) => return failure(&error),
    };

    match services.controller.login(credentials).await {
        Ok(session) => {
            print_profile(session.profile());
            ExitCode::SUCCESS
        }
        Err(error) => failure(&error),
    }
}

async fn status(services: &ConsoleServices) -> ExitCode {
    if !services.controller.validate_cached_session().await {
        println!("{LOGIN_HINT}");
        return ExitCode::FAILURE;
    }

    match services.controller.store().load() {
        Some(session) => {
            println!("session valid");
            print_profile(session.profile());
            ExitCode::SUCCESS
        }
        None => {
            println!("{LOGIN_HINT}");
            ExitCode::FAILURE
        }
    }
}

async fn whoami(services: &ConsoleServices) -> ExitCode {
    let Some(profile) = services.controller.current_user().await else {
        println!("{LOGIN_HINT}");
        return ExitCode::FAILURE;
    };

    print_profile(&profile);
    ExitCode::SUCCESS
}

fn can(services: &ConsoleServices, permission: Permission) -> ExitCode {
    match services.authorization.require_permission(permission) {
        Ok(()) => {
            println!("allowed: {}", permission.as_str());
            ExitCode::SUCCESS
        }
        Err(AppError::Unauthorized(_)) => {
            println!("{LOGIN_HINT}");
            ExitCode::FAILURE
        }
        Err(error) => {
            println!("denied: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn routes(services: &ConsoleServices) -> ExitCode {
    services.controller.validate_cached_session().await;

    let routes = services.guard.visible_routes();
    if routes.is_empty() {
        println!("{LOGIN_HINT}");
        return ExitCode::FAILURE;
    }

    for route in routes {
        println!("{:<20} {}", route.path(), route.label());
    }
    ExitCode::SUCCESS
}

async fn get(services: &ConsoleServices, path: &str) -> ExitCode {
    match services.api.get_json::<Value>(path).await {
        Ok(body) => {
            match serde_json::to_string_pretty(&body) {
                Ok(rendered) => println!("{rendered}"),
                Err(_) => println!("{body}"),
            }
            ExitCode::SUCCESS
        }
        Err(AppError::Unauthorized(_)) => {
            eprintln!("session expired; {LOGIN_HINT}");
            ExitCode::FAILURE
        }
        Err(error) => failure(&error),
    }
}

fn read_password() -> AppResult<String> {
    if let Ok(password) = env::var(PASSWORD_VAR) {
        return Ok(password);
    }

    eprint!("password: ");
    io::stderr()
        .flush()
        .map_err(|error| AppError::Internal(format!("failed to write prompt: {error}")))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|error| AppError::Internal(format!("failed to read password: {error}")))?;

    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn print_profile(profile: &UserProfile) {
    match profile.full_name() {
        Some(full_name) => println!("user:        {} ({full_name})", profile.username()),
        None => println!("user:        {}", profile.username()),
    }
    println!("groups:      {}", profile.groups().join(", "));
    println!("roles:       {}", profile.roles().join(", "));

    let permissions: Vec<&str> = permissions_for_roles(profile.roles())
        .into_iter()
        .map(|permission| permission.as_str())
        .collect();
    println!("permissions: {}", permissions.join(", "));
}

fn failure(error: &AppError) -> ExitCode {
    eprintln!("{error}");
    ExitCode::FAILURE
}
