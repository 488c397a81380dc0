//! Environment handler - effective repository settings.

use axum::extract::State;
use std::collections::BTreeMap;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Report the effective settings as `HELM_*` variables.
pub async fn get(State(state): State<AppState>) -> ApiResponse<BTreeMap<&'static str, String>> {
    let settings = state.settings();
    let mut vars = BTreeMap::new();
    vars.insert(
        "HELM_REPOSITORY_CONFIG",
        settings.repository_config.display().to_string(),
    );
    vars.insert(
        "HELM_REPOSITORY_CACHE",
        settings.repository_cache.display().to_string(),
    );
    vars.insert("HELM_DEBUG", state.debug.to_string());
    ApiResponse::ok(vars)
}
