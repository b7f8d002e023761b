//! The HTTP front end.

mod form;
mod page;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use tower_http::trace::TraceLayer;

pub use form::{FormValues, Gender, InputError, PatientInput};

use self::page::Panel;
use crate::pipeline::{KickoffInputs, Pipeline};
use crate::report::{DOCX_FILENAME, download_link, generate_docx, normalize};

/// Shared by every request; holds nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<dyn Pipeline>,
}

impl AppState {
    pub fn new<P: Pipeline>(pipeline: P) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(page::render(&FormValues::default(), None))
}

async fn submit(
    State(state): State<AppState>,
    Form(form): Form<FormValues>,
) -> (StatusCode, Html<String>) {
    let input = match PatientInput::try_from(&form) {
        Ok(input) => input,
        Err(err) => {
            info!("rejected form: {err}");
            return error_page(StatusCode::UNPROCESSABLE_ENTITY, &form, &err.to_string());
        }
    };
    debug!(gender = %input.gender, age = input.age, "running pipeline");

    let inputs = KickoffInputs::from(&input);
    let result = match state.pipeline.kickoff(&inputs).await {
        Ok(result) => result,
        Err(err) => {
            error!("pipeline failed: {err}");
            return error_page(
                StatusCode::BAD_GATEWAY,
                &form,
                &format!("Could not generate recommendations: {err}"),
            );
        }
    };

    let text = normalize(result);
    let document = match generate_docx(&text) {
        Ok(document) => document,
        Err(err) => {
            error!("document export failed: {err}");
            return error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                &form,
                "Could not export the recommendations.",
            );
        }
    };
    let link = download_link(&document, DOCX_FILENAME);
    info!("generated {} characters of recommendations", text.len());

    let panel = Panel::Result {
        text: &text,
        download_link: &link,
    };
    (StatusCode::OK, Html(page::render(&form, Some(&panel))))
}

async fn health() -> &'static str {
    "ok"
}

fn error_page(
    status: StatusCode,
    form: &FormValues,
    message: &str,
) -> (StatusCode, Html<String>) {
    (status, Html(page::render(form, Some(&Panel::Error(message)))))
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}
