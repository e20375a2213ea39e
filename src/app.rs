use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Local;
use log::{error, info};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::archive::build_archive;
use crate::backend::SupabaseClient;
use crate::columns::{columns_for, ColumnDef, Dataset, Entity, Surface};
use crate::config::Config;
use crate::downloader::{to_csv, to_xlsx, Sheet};
use crate::normalize::FlatRecord;
use crate::render::Renderer;
use crate::state::{sync_dataset, DashboardState};

pub struct AppState {
    config: Config,
    client: SupabaseClient,
    renderer: Renderer,
    dashboard: Mutex<DashboardState>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct RowsResponse {
    entity: Entity,
    columns: Vec<&'static ColumnDef>,
    rows: Vec<FlatRecord>,
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = SupabaseClient::new(&config)?;
    let renderer = Renderer::new()?;
    let bind_addr = config.bind_addr.clone();

    // Setup app state
    let app_state = Arc::new(AppState {
        config,
        client,
        renderer,
        dashboard: Mutex::new(DashboardState::new()),
    });

    // Build router
    let app = Router::new()
        .route("/", get(serve_dashboard))
        .route("/tab/:entity", get(select_tab))
        .route("/sync/:dataset", post(sync))
        .route("/api/rows/:entity", get(get_rows))
        .route("/export/:dataset/xlsx", get(export_xlsx))
        .route("/export/:entity/csv", get(export_csv))
        .route("/export/:dataset/zip", get(export_zip))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

fn lock(state: &AppState) -> std::sync::MutexGuard<'_, DashboardState> {
    state
        .dashboard
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn status_error(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(StatusResponse {
            status: "error".to_string(),
            message: Some(message.into()),
        }),
    )
        .into_response()
}

fn attachment(content_type: &str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from(bytes),
    )
        .into_response()
}

fn dated_filename(name: &str, ext: &str) -> String {
    format!("{}_{}.{}", name, Local::now().format("%Y-%m-%d"), ext)
}

/// Copy a dataset's rows out of the shared state so no lock is held while
/// exporting
fn snapshot(state: &AppState, dataset: Dataset) -> Option<Vec<(Entity, Vec<FlatRecord>)>> {
    let dashboard = lock(state);
    if !dashboard.has_rows(dataset) {
        return None;
    }
    Some(
        dataset
            .entities()
            .iter()
            .map(|entity| (*entity, dashboard.rows(*entity).to_vec()))
            .collect(),
    )
}

fn sheets(snapshot: &[(Entity, Vec<FlatRecord>)]) -> Vec<Sheet<'_>> {
    snapshot
        .iter()
        .map(|(entity, rows)| Sheet {
            entity: *entity,
            rows,
        })
        .collect()
}

async fn serve_dashboard(State(state): State<Arc<AppState>>) -> Response {
    let dashboard = lock(&state);
    match state.renderer.render_dashboard(&dashboard) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("render failed: {e}");
            status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn select_tab(
    Path(entity): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(entity) = Entity::from_name(&entity) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    lock(&state).set_active_tab(entity);
    Redirect::to("/").into_response()
}

async fn sync(Path(dataset): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(dataset) = Dataset::from_name(&dataset) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let outcome = sync_dataset(&state.client, dataset).await;

    let mut dashboard = lock(&state);
    dashboard.apply_sync(dataset, outcome);
    if !dataset.entities().contains(&dashboard.active_tab()) {
        dashboard.set_active_tab(dataset.entities()[0]);
    }
    Redirect::to("/").into_response()
}

async fn get_rows(Path(entity): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(entity) = Entity::from_name(&entity) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let rows = lock(&state).rows(entity).to_vec();
    Json(RowsResponse {
        entity,
        columns: columns_for(entity, Surface::Ui),
        rows,
    })
    .into_response()
}

async fn export_xlsx(Path(dataset): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(dataset) = Dataset::from_name(&dataset) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(snapshot) = snapshot(&state, dataset) else {
        return status_error(StatusCode::CONFLICT, "Nothing to export, sync first");
    };

    match to_xlsx(&sheets(&snapshot)) {
        Ok(bytes) => attachment(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            &dated_filename(dataset.name(), "xlsx"),
            bytes,
        ),
        Err(e) => {
            error!("xlsx export of {dataset} failed: {e}");
            lock(&state).set_status(format!("Export failed: {e}"));
            status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn export_csv(Path(entity): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(entity) = Entity::from_name(&entity) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let rows = lock(&state).rows(entity).to_vec();
    if rows.is_empty() {
        return status_error(StatusCode::CONFLICT, "Nothing to export, sync first");
    }
    match to_csv(entity, &rows) {
        Ok(csv) => attachment(
            "text/csv; charset=utf-8",
            &dated_filename(entity.name(), "csv"),
            csv.into_bytes(),
        ),
        Err(e) => {
            error!("csv export of {entity} failed: {e}");
            status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn export_zip(Path(dataset): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(dataset) = Dataset::from_name(&dataset) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(snapshot) = snapshot(&state, dataset) else {
        return status_error(StatusCode::CONFLICT, "Nothing to export, sync first");
    };

    let workbook_name = format!("{}.xlsx", dataset.name());
    let outcome = build_archive(
        &sheets(&snapshot),
        &workbook_name,
        &state.client,
        &state.config.buckets,
    )
    .await;

    match outcome {
        Ok(archive) => {
            let message = if archive.missing.is_empty() {
                format!("Exported {} files", archive.downloaded)
            } else {
                format!(
                    "Exported {} files, {} could not be downloaded (see missing_files.txt)",
                    archive.downloaded,
                    archive.missing.len()
                )
            };
            lock(&state).set_status(message);
            attachment(
                "application/zip",
                &dated_filename(dataset.name(), "zip"),
                archive.bytes,
            )
        }
        Err(e) => {
            error!("zip export of {dataset} failed: {e}");
            lock(&state).set_status(format!("Export failed: {e}"));
            status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
