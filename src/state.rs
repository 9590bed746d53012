use crate::dashboard::Dashboard;
use crate::errors::AppError;
use crate::ui::render_index;
use std::sync::Arc;

/// The dashboard is built once, so the page and its JSON are rendered once too.
#[derive(Clone)]
pub struct AppState {
    pub page: Arc<str>,
    pub snapshot: Arc<str>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Result<Self, AppError> {
        let page = render_index(&dashboard)?;
        let snapshot = serde_json::to_string(&dashboard)?;
        Ok(Self {
            page: page.into(),
            snapshot: snapshot.into(),
        })
    }
}
