use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, LedgerDispatcher, configure_routes};
use crate::adapters::db::{open_connection, run_migrations};
use crate::adapters::remote::RemoteLedgerClient;
use crate::app::config::AppConfig;
use crate::app::dispatch::Dispatcher;
use crate::app::error::AppError;
use crate::app::ledger::EventLedgerService;
use crate::app::services::SqliteLedgerStore;
use crate::domain::timestamp::SystemClock;

pub fn open_store(db_path: &str) -> Result<SqliteLedgerStore, AppError> {
    let mut connection = open_connection(db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;
    Ok(SqliteLedgerStore::new(Arc::new(Mutex::new(connection))))
}

pub fn build_dispatcher(config: &AppConfig) -> Result<LedgerDispatcher, AppError> {
    Ok(Dispatcher::new(
        open_store(&config.db_path)?,
        SystemClock,
        EventLedgerService::new(config.history_key_mode),
    ))
}

pub fn serve(config: AppConfig) -> Result<(), AppError> {
    let api_state = ApiState {
        dispatcher: Arc::new(build_dispatcher(&config)?),
    };
    let cors_allowed_origin = config.cors_allowed_origin.clone();

    tracing::info!(bind = %config.http_bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .wrap(build_cors(cors_allowed_origin.as_deref()))
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            })
            .bind(&config.http_bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}

/// Runs one invocation, remotely when an API url is configured and against
/// the local database otherwise.
pub fn invoke(config: &AppConfig, function: &str, args: &[String]) -> Result<Vec<u8>, AppError> {
    match &config.api_url {
        Some(api_url) => invoke_remote(
            api_url,
            Duration::from_millis(config.remote_timeout_ms),
            function,
            args,
        ),
        None => {
            tracing::debug!(db_path = %config.db_path, function, "invoking against local ledger");
            build_dispatcher(config)?
                .invoke(function, args)
                .map_err(|error| AppError::invoke(function, error))
        }
    }
}

fn invoke_remote(
    api_url: &str,
    timeout: Duration,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>, AppError> {
    tracing::debug!(api_url, function, "invoking against remote ledger");

    let response = actix_web::rt::System::new()
        .block_on(async {
            let client = RemoteLedgerClient::new(api_url, timeout)?;
            client.invoke(function, args).await
        })
        .map_err(AppError::runtime)?;

    if response.success {
        Ok(response.payload)
    } else {
        Err(AppError::remote(function, response.message))
    }
}

fn build_cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_header(header::CONTENT_TYPE)
            .max_age(3600),
        None => Cors::permissive(),
    }
}
