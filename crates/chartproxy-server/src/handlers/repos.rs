//! Repository handlers - registry management and chart search.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use chartproxy_repo::{ChartListing, ChartQuery, RepoError, RepositoryEntry};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Query string of the chart listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChartsParams {
    pub keyword: String,
    pub version: String,
    /// `"true"` lists every matching version
    pub versions: String,
    /// `"true"` treats the keyword as a regular expression
    pub regexp: String,
}

impl From<ChartsParams> for ChartQuery {
    fn from(params: ChartsParams) -> Self {
        ChartQuery {
            keyword: params.keyword,
            version: params.version,
            all_versions: params.versions == "true",
            regexp: params.regexp == "true",
        }
    }
}

/// Search charts in the cached repository indices.
pub async fn list_charts(
    State(state): State<AppState>,
    params: Result<Query<ChartsParams>, QueryRejection>,
) -> Result<ApiResponse<Vec<ChartListing>>, ApiError> {
    let Query(params) = params?;
    let charts = state.catalog.list_charts(&params.into()).await?;
    Ok(ApiResponse::ok(charts))
}

/// One configured repository.
#[derive(Debug, Serialize)]
pub struct RepositoryListing {
    pub name: String,
    pub url: String,
}

/// List configured repositories.
pub async fn list(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<RepositoryListing>>, ApiError> {
    let repos = state
        .registry
        .list()
        .await?
        .into_iter()
        .map(|r| RepositoryListing {
            name: r.name,
            url: r.url,
        })
        .collect();
    Ok(ApiResponse::ok(repos))
}

/// Body of the add request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddRepoRequest {
    pub name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    /// Reject the request if the name is already registered
    pub no_update: bool,
    pub cert_file: String,
    pub key_file: String,
    pub ca_file: String,
    #[serde(rename = "insecureSkipTLSverify")]
    pub insecure_skip_tls_verify: bool,
    pub pass_credentials_all: bool,
}

impl From<AddRepoRequest> for RepositoryEntry {
    fn from(req: AddRepoRequest) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        RepositoryEntry {
            name: req.name,
            url: req.url,
            username: non_empty(req.username),
            password: non_empty(req.password),
            cert_file: non_empty(req.cert_file),
            key_file: non_empty(req.key_file),
            ca_file: non_empty(req.ca_file),
            insecure_skip_tls_verify: req.insecure_skip_tls_verify,
            pass_credentials_all: req.pass_credentials_all,
        }
    }
}

/// Add a repository, downloading its index first.
pub async fn add(
    State(state): State<AppState>,
    body: Result<Json<AddRepoRequest>, JsonRejection>,
) -> Result<ApiResponse<String>, ApiError> {
    let Json(req) = body?;
    let no_update = req.no_update;
    let entry = RepositoryEntry::from(req);
    let name = entry.name.clone();

    state.registry.add(entry, no_update).await?;
    Ok(ApiResponse::ok(format!(
        "{} has been added to your repositories\n",
        name
    )))
}

/// Remove comma-separated repositories.
pub async fn remove(
    State(state): State<AppState>,
    Path(reponame): Path<String>,
) -> Result<ApiResponse<String>, ApiError> {
    let names: Vec<String> = reponame.split(',').map(str::to_string).collect();
    let removed = state.registry.remove(&names).await?;

    let message: String = removed
        .iter()
        .map(|name| format!("{} has been removed from your repositories\n", name))
        .collect();
    Ok(ApiResponse::ok(message))
}

/// Removal without a repository name.
pub async fn remove_unnamed() -> Result<ApiResponse<String>, ApiError> {
    Err(RepoError::input("repository name can not be empty").into())
}

/// Refresh every repository index.
pub async fn update(State(state): State<AppState>) -> Result<ApiResponse<()>, ApiError> {
    let updated = state.registry.update_all().await?.into_result()?;
    tracing::info!(repositories = updated.len(), "repository indices updated");
    Ok(ApiResponse::empty())
}
