use crate::AppState;
use crate::api::error::AppError;
use crate::view;
use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Response},
};

/// Upload prompt with no results
pub async fn index() -> Html<String> {
    Html(view::render_page(None, None))
}

/// Form submission: stage, parse, and render the outcome on the same page
pub async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let result = async {
        let payload = super::upload::extract_payload(multipart).await?;
        let interaction = state.pipeline.handle_interaction(payload).await?;
        Ok::<_, AppError>(interaction)
    }
    .await;

    match result {
        Ok(interaction) => Html(view::render_interaction(&interaction)).into_response(),
        Err(e) => {
            let status = e.status();
            (status, Html(view::render_rejection(&e.public_message()))).into_response()
        }
    }
}
