use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::{ChapterOutcome, ErrorBody, SubdivideRequest, SubdivideResponse};
use crate::services::chapterizer::ChapterSubdivider;
use crate::services::llm::ChatCompleter;
use crate::services::tokens::TokenCounter;

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub type SharedSubdivider = ChapterSubdivider<Arc<dyn ChatCompleter>, Arc<dyn TokenCounter>>;

#[derive(Clone)]
pub struct AppState {
    pub subdivider: Arc<SharedSubdivider>,
    pub concurrency: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/chapters/subdivide", post(subdivide))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

const INDEX_PAGE: &str = concat!(
    "<!DOCTYPE html><meta charset=\"utf-8\"><title>subchapterizer</title>",
    "<h1>subchapterizer</h1>",
    "<p>Splits the chapters of a paged document into subchapters. ",
    "Chapter text is taken from the document, never from the model.</p>",
    "<pre>",
    "GET  /health\n",
    "POST /chapters/subdivide  {pages: [{pageNumber, lines}], chapters: [{title, startPage, endPage}], chapterIndex?}",
    "</pre>",
);

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn subdivide(
    State(state): State<AppState>,
    Json(request): Json<SubdivideRequest>,
) -> Result<Json<SubdivideResponse>, StatusCode> {
    if request.chapters.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let indices: Vec<usize> = match request.chapter_index {
        Some(index) => vec![index],
        None => (0..request.chapters.len()).collect(),
    };

    tracing::info!(
        pages = request.pages.len(),
        chapters = request.chapters.len(),
        requested = indices.len(),
        "Subdividing document"
    );

    let outcomes = match request.chapter_index {
        Some(index) => vec![
            state
                .subdivider
                .subdivide_at(&request.pages, &request.chapters, index)
                .await,
        ],
        None => {
            state
                .subdivider
                .subdivide_all(&request.pages, &request.chapters, state.concurrency)
                .await
        }
    };

    let results = indices
        .into_iter()
        .zip(outcomes)
        .map(|(index, outcome)| {
            let title = request
                .chapters
                .get(index)
                .map(|c| c.title.clone())
                .unwrap_or_default();
            match outcome {
                Ok(result) => ChapterOutcome::Ok { title, result },
                Err(e) => {
                    tracing::warn!(chapter = %title, kind = ?e.kind(), error = %e, "Chapter produced no result");
                    ChapterOutcome::Error {
                        title,
                        error: ErrorBody {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    }
                }
            }
        })
        .collect();

    Ok(Json(SubdivideResponse { results }))
}
