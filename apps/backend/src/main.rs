use actix_web::{web, App, HttpServer};
use backend::ai::GeneratorConfig;
use backend::config::db::DbProfile;
use backend::config::debate::DebateConfig;
use backend::infra::state::build_state;
use backend::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use backend::routes;
use tracing::{error, info};

mod telemetry;

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!(error = %e, "{context}");
    std::io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables come from the runtime (docker env_file, sourced .env, ...).
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .map_err(|e| startup_error("BACKEND_PORT must be a valid port number", e))?;

    let debate = DebateConfig::from_env().map_err(|e| startup_error("Invalid debate config", e))?;
    let generator = GeneratorConfig::from_env();
    let in_memory = std::env::var("DEBATE_STORE").is_ok_and(|v| v == "memory");

    let mut builder = build_state()
        .with_debate_config(debate)
        .with_generator_config(generator)
        .with_observers(true);
    if !in_memory {
        builder = builder.with_db(DbProfile::Prod);
    }
    let app_state = builder
        .build()
        .await
        .map_err(|e| startup_error("Failed to build application state", e))?;

    info!(
        host = %host,
        port,
        store = if in_memory { "memory" } else { "postgres" },
        generator = app_state.flow.responder_name(),
        "Starting debate backend"
    );

    let data = web::Data::new(app_state.clone());
    let result = HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    app_state.shutdown();
    result
}
