//! Integration tests for the HTTP API.
//!
//! Each test runs against a fresh registry in a temporary directory and a
//! wiremock server standing in for the chart repository.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chartproxy::{AppContext, AppState, CorsConfig, create_router};
use chartproxy_repo::{HttpFetcher, RepoSettings};

const INDEX: &str = r#"apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.0.0
      appVersion: 1.24.0
      description: NGINX web server
    - name: nginx
      version: 1.2.0
      appVersion: 1.25.0
      description: NGINX web server
      tags: web,proxy
  redis:
    - name: redis
      version: 17.0.0
      description: Redis database
      keywords: [cache, database]
"#;

struct TestApp {
    _tmp: TempDir,
    state: AppState,
    repo: MockServer,
}

impl TestApp {
    async fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let settings = RepoSettings::new(
            tmp.path().join("config").join("repositories.yaml"),
            tmp.path().join("cache"),
        )
        .with_lock_timeout(Duration::from_secs(5), Duration::from_millis(20));

        let repo = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/index.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INDEX))
            .mount(&repo)
            .await;

        let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(10)));
        let state = Arc::new(AppContext::new(settings, fetcher, false));
        Self {
            _tmp: tmp,
            state,
            repo,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone(), &CorsConfig::AllowAll)
    }

    fn charts_url(&self) -> String {
        format!("{}/charts", self.repo.uri())
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn add_stable(&self) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/repos/add",
                Some(json!({"name": "stable", "url": self.charts_url()})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

#[tokio::test]
async fn welcome_banner() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(std::str::from_utf8(&body).unwrap().starts_with("Welcome"));
}

#[tokio::test]
async fn list_without_repositories_is_error() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/repos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 1);
    assert_eq!(body["error"], "no repositories configured");
}

#[tokio::test]
async fn add_then_list() {
    let app = TestApp::new().await;
    let body = app.add_stable().await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"], "stable has been added to your repositories\n");

    let (_, body) = app.call(Method::GET, "/api/repos", None).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"], json!([{"name": "stable", "url": app.charts_url()}]));
}

#[tokio::test]
async fn add_duplicate_with_no_update() {
    let app = TestApp::new().await;
    app.add_stable().await;

    let (_, body) = app
        .call(
            Method::POST,
            "/api/repos/add",
            Some(json!({"name": "stable", "url": app.charts_url(), "noUpdate": true})),
        )
        .await;
    assert_eq!(body["code"], 1);
    assert_eq!(
        body["error"],
        "repository name (stable) already exists, please specify a different name"
    );
}

#[tokio::test]
async fn add_missing_password() {
    let app = TestApp::new().await;
    let (_, body) = app
        .call(
            Method::POST,
            "/api/repos/add",
            Some(json!({"name": "private", "url": app.charts_url(), "username": "admin"})),
        )
        .await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["error"], "missing password");
}

#[tokio::test]
async fn add_unreachable_repository_leaves_registry_alone() {
    let app = TestApp::new().await;
    app.add_stable().await;
    let registry_file = app.state.settings().repository_config.clone();
    let before = std::fs::read(&registry_file).unwrap();

    let missing = format!("{}/missing", app.repo.uri());
    let (_, body) = app
        .call(
            Method::POST,
            "/api/repos/add",
            Some(json!({"name": "missing", "url": missing})),
        )
        .await;
    assert_eq!(body["code"], 1);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("is not a valid chart repository or cannot be reached"));

    assert_eq!(std::fs::read(&registry_file).unwrap(), before);
}

#[tokio::test]
async fn malformed_body_uses_envelope() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/repos/add")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 1);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_charts_with_constraint() {
    let app = TestApp::new().await;
    app.add_stable().await;

    let (_, body) = app
        .call(Method::GET, "/api/repos/charts?version=%3E1.0.0", None)
        .await;
    assert_eq!(body["code"], 0);

    let charts = body["data"].as_array().unwrap();
    let nginx: Vec<_> = charts
        .iter()
        .filter(|c| c["name"] == "stable/nginx")
        .collect();
    assert_eq!(nginx.len(), 1);
    assert_eq!(nginx[0]["version"], "1.2.0");
    assert_eq!(nginx[0]["app_version"], "1.25.0");
    assert_eq!(nginx[0]["tags"], "web,proxy");
    assert_eq!(nginx[0]["icon"], "");
}

#[tokio::test]
async fn list_charts_keyword_all_versions() {
    let app = TestApp::new().await;
    app.add_stable().await;

    let (_, body) = app
        .call(Method::GET, "/api/repos/charts?keyword=nginx&versions=true", None)
        .await;
    let versions: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["version"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(versions, vec!["1.2.0", "1.0.0"]);

    let (_, body) = app
        .call(Method::GET, "/api/repos/charts?keyword=database", None)
        .await;
    assert_eq!(body["data"][0]["name"], "stable/redis");
}

#[tokio::test]
async fn list_charts_invalid_constraint() {
    let app = TestApp::new().await;
    let (_, body) = app
        .call(Method::GET, "/api/repos/charts?version=not-a-version", None)
        .await;
    assert_eq!(body["code"], 1);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("an invalid version/constraint format")
    );
}

#[tokio::test]
async fn remove_repository() {
    let app = TestApp::new().await;
    app.add_stable().await;
    let cached = app.state.registry.cache().index_path("stable");
    assert!(cached.exists());

    let (_, body) = app
        .call(Method::DELETE, "/api/repos/remove/stable", None)
        .await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"], "stable has been removed from your repositories\n");
    assert!(!cached.exists());

    let (_, body) = app.call(Method::GET, "/api/repos", None).await;
    assert_eq!(body["code"], 1);
}

#[tokio::test]
async fn remove_unknown_repository() {
    let app = TestApp::new().await;
    app.add_stable().await;

    let (_, body) = app
        .call(Method::DELETE, "/api/repos/remove/stable,ghost", None)
        .await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["error"], "no repo named \"ghost\" found");

    let (_, body) = app.call(Method::GET, "/api/repos", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn remove_without_name() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::DELETE, "/api/repos/remove/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 1);
    assert_eq!(body["error"], "invalid input: repository name can not be empty");
}

#[tokio::test]
async fn unknown_api_route_uses_envelope() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/nope", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 1);
    assert!(body["error"].as_str().unwrap().starts_with("no route for GET"));
}

#[tokio::test]
async fn update_repositories() {
    let app = TestApp::new().await;
    app.add_stable().await;

    let (_, body) = app.call(Method::PUT, "/api/repos/update", None).await;
    assert_eq!(body, json!({"code": 0}));
}

#[tokio::test]
async fn envs_report_paths() {
    let app = TestApp::new().await;
    let (_, body) = app.call(Method::GET, "/api/envs", None).await;

    assert_eq!(body["code"], 0);
    let config = app.state.settings().repository_config.display().to_string();
    assert_eq!(body["data"]["HELM_REPOSITORY_CONFIG"], config);
    assert_eq!(body["data"]["HELM_DEBUG"], "false");
}
