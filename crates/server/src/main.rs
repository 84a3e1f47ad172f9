use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use server_api::{
    contract_summary, generate_contract, set_contract_status, ApiContext, ChatCompletionExtractor,
    ContractFiles,
};
use shared::{
    domain::ContractId,
    error::{ApiError, ErrorCode},
    protocol::{
        ContractSummary, UpdateContractStatusRequest, GENERATE_CONTRACT_ROUTE,
        GENERATE_CONTRACT_SUCCESS, HEALTHZ_ROUTE,
    },
};
use storage::Storage;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url, Settings};

const MAX_REQUEST_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    if settings.openai_api_key.trim().is_empty() {
        warn!("OPENAI_API_KEY is not set; contract generation will fail at requirement extraction");
    }

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = build_state(&settings, storage);
    let app = build_router(Arc::new(state), &settings);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(settings: &Settings, storage: Storage) -> AppState {
    AppState {
        api: ApiContext {
            storage,
            extractor: Arc::new(ChatCompletionExtractor::new(settings.chat_completion())),
            files: ContractFiles {
                template_path: settings.template_path.clone(),
                output_path: settings.contract_output_path.clone(),
            },
        },
        templates_dir: settings.templates_dir.clone(),
    }
}

fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    Router::new()
        .route("/", get(index))
        .route(HEALTHZ_ROUTE, get(healthz))
        .route(GENERATE_CONTRACT_ROUTE, post(http_generate_contract))
        .route("/contracts/:contract_id", get(http_get_contract))
        .route(
            "/contracts/:contract_id/status",
            post(http_update_contract_status),
        )
        .nest_service("/static", ServeDir::new(&settings.static_dir))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    let path = state.templates_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(error) => {
            error!(path = %path.display(), %error, "failed to read index page");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Answers in plain text whatever happens: the submitting form shows the
/// body verbatim and does not look at the status.
async fn http_generate_contract(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match generate_contract(&state.api, &body).await {
        Ok(generated) => {
            info!(
                contract_id = generated.contract_id.0,
                net_payment_amount = generated.net_payment_amount,
                "contract generated"
            );
            plain_text(StatusCode::OK, GENERATE_CONTRACT_SUCCESS)
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error!(%status, detail = %err.detail(), "{err}");
            plain_text(status, err.to_string())
        }
    }
}

async fn http_get_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<i64>,
) -> Result<Json<ContractSummary>, (StatusCode, Json<ApiError>)> {
    contract_summary(&state.api, ContractId(contract_id))
        .await
        .map(Json)
        .map_err(api_error_response)
}

async fn http_update_contract_status(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<i64>,
    payload: Result<Json<UpdateContractStatusRequest>, JsonRejection>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let Json(req) =
        payload.map_err(|rejection| api_error_response(ApiError::validation(rejection.body_text())))?;
    set_contract_status(&state.api, ContractId(contract_id), req.status)
        .await
        .map_err(api_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

fn api_error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
