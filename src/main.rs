use std::{process, sync::Arc};

use pulseboard::{
    application::error::AppError,
    config,
    infra::{error::InfraError, http, telemetry, upstream::EvaluationClient},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli().map_err(AppError::from)?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let upstream = Arc::new(EvaluationClient::from_settings(&settings.upstream)?);
    let state = http::ApiState::new(upstream, &settings.ranking);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.listen_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "pulseboard::server",
        addr = %settings.server.listen_addr,
        "listening",
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
