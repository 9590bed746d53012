use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

pub async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.snapshot.to_string(),
    )
}
