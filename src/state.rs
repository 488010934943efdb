use axum::extract::FromRef;

use crate::config::ViewerConfig;
use crate::services::store::SampleStore;

#[derive(Clone)]
pub struct AppState {
    pub config: ViewerConfig,
    pub store: SampleStore,
}

impl FromRef<AppState> for SampleStore {
    fn from_ref(state: &AppState) -> SampleStore {
        state.store.clone()
    }
}
