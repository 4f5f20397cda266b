// Application state for HTTP handlers
use crate::application::view_model::DashboardViewModel;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub view_model: Arc<DashboardViewModel>,
}
