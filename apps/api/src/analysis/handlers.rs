//! Axum route handlers for the Analysis API.
//!
//! Every handler drives the single shared `Session`. Analysis and chat
//! failures are part of the returned state, not HTTP errors.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::encoder::Document;
use crate::analysis::report::render_markdown;
use crate::errors::AppError;
use crate::session::{AskOutcome, SelectOutcome, SessionSnapshot, Transition};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Result of a state-changing request: whether the session acted on it,
/// why not if it did not, and the session as it is now.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub session: SessionSnapshot,
}

impl ActionResponse {
    fn accepted(session: SessionSnapshot) -> Self {
        Self {
            accepted: true,
            reason: None,
            session,
        }
    }

    fn ignored(reason: &'static str, session: SessionSnapshot) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            session,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/analysis
pub async fn handle_get_analysis(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

/// POST /api/v1/analysis
///
/// Multipart upload, one part per résumé. Starts a run in the background
/// (202) or leaves the session untouched (200, `accepted: false`).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    let documents = read_documents(&mut multipart).await?;

    let outcome = state.session.submit(documents).await;
    let snapshot = state.session.snapshot().await;
    Ok(match outcome {
        SelectOutcome::Started { .. } => {
            (StatusCode::ACCEPTED, Json(ActionResponse::accepted(snapshot)))
        }
        SelectOutcome::Ignored { reason } => {
            (StatusCode::OK, Json(ActionResponse::ignored(reason, snapshot)))
        }
    })
}

/// POST /api/v1/analysis/reset
pub async fn handle_reset(State(state): State<AppState>) -> Json<ActionResponse> {
    let transition = state.session.reset().await;
    let snapshot = state.session.snapshot().await;
    Json(match transition {
        Transition::Moved { .. } => ActionResponse::accepted(snapshot),
        Transition::Ignored { reason, .. } => {
            ActionResponse::ignored(reason, snapshot)
        }
    })
}

/// POST /api/v1/analysis/chat
///
/// Waits for the answer; the returned transcript ends with it.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ActionResponse> {
    let outcome = state.session.ask(&request.question).await;
    let snapshot = state.session.snapshot().await;
    Json(match outcome {
        AskOutcome::Answered { .. } => ActionResponse::accepted(snapshot),
        AskOutcome::Ignored { reason } => ActionResponse::ignored(reason, snapshot),
        AskOutcome::Discarded => {
            ActionResponse::ignored("the analysis was reset before the answer arrived", snapshot)
        }
    })
}

/// GET /api/v1/analysis/report
pub async fn handle_report(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let result = state
        .session
        .result()
        .await
        .ok_or_else(|| AppError::NotFound("No finished analysis to report".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&result),
    ))
}

/// Stands in for the file name of parts lost to a broken multipart stream.
const TRUNCATED_UPLOAD: &str = "<truncated upload>";

/// Collects every file part. Non-file parts and parts without a file name
/// (an empty file input) are skipped. A part whose body cannot be read, or
/// a stream that breaks after the first file, is kept as an unreadable
/// document so the run fails instead of evaluating part of the batch.
async fn read_documents(multipart: &mut Multipart) -> Result<Vec<Document>, AppError> {
    let mut documents = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if documents.is_empty() => {
                return Err(AppError::Validation(format!("Malformed multipart body: {e}")))
            }
            Err(e) => {
                warn!("Multipart stream ended early: {e}");
                documents.push(Document::unreadable(TRUNCATED_UPLOAD, e.to_string()));
                break;
            }
        };

        let Some(file_name) = field
            .file_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let media_type = field.content_type().map(str::to_string);

        match field.bytes().await {
            Ok(bytes) => documents.push(Document::new(file_name, media_type.as_deref(), bytes)),
            Err(e) => {
                warn!("Upload of '{file_name}' could not be read: {e}");
                documents.push(Document::unreadable(file_name, e.to_string()));
                break;
            }
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt; // for oneshot

    use super::*;
    use crate::analysis::models::fixtures::TWO_CANDIDATE_JSON;
    use crate::analysis::{Evaluator, FollowUpClient, ValidationPolicy};
    use crate::llm_client::testing::{Reply, ScriptedModel};
    use crate::routes::build_router;
    use crate::session::Session;

    const BOUNDARY: &str = "scouter-test-boundary";

    fn create_test_app(model: Arc<ScriptedModel>) -> Router {
        let session = Arc::new(Session::new(
            Evaluator::new(model.clone(), "English", ValidationPolicy::Strict),
            FollowUpClient::new(model, "English"),
            None,
        ));
        build_router(AppState { session })
    }

    fn multipart_body(files: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (name, content_type, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nignored\r\n"
        ));
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(files: &[(&str, &str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_for_status(app: &Router, status: &str) -> Value {
        for _ in 0..500 {
            let response = app.clone().oneshot(get("/api/v1/analysis")).await.unwrap();
            let snapshot = body_json(response).await;
            if snapshot["status"] == status {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("analysis never reached status {status}");
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(ScriptedModel::new([]));
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let app = create_test_app(ScriptedModel::new([]));
        let response = app.oneshot(get("/api/v1/analysis")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = body_json(response).await;
        assert_eq!(snapshot["status"], "idle");
        assert!(snapshot["result"].is_null());
        assert_eq!(snapshot["transcript"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_upload_runs_analysis_to_done() {
        let model = ScriptedModel::replying(TWO_CANDIDATE_JSON);
        let app = create_test_app(model.clone());

        let response = app
            .clone()
            .oneshot(upload_request(&[
                ("ana.pdf", "application/pdf", "English C1"),
                ("luis.docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document", "no languages"),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["accepted"], true);

        let snapshot = wait_for_status(&app, "done").await;
        assert_eq!(snapshot["result"]["bestCandidateId"], "c1");
        assert_eq!(snapshot["result"]["candidates"][1]["scores"]["languages"], 0.0);

        let request = &model.requests()[0];
        assert_eq!(request.parts.len(), 3);
    }

    #[tokio::test]
    async fn test_truncated_upload_fails_the_run() {
        let model = ScriptedModel::replying(TWO_CANDIDATE_JSON);
        let app = create_test_app(model.clone());

        let mut body = String::new();
        for name in ["a.pdf", "b.pdf"] {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"
            ));
        }
        // Third part cut off in the middle of its headers.
        body.push_str(&format!("--{BOUNDARY}\r\nContent-Disposition: form-da"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let snapshot = wait_for_status(&app, "failed").await;
        assert!(snapshot["error"]
            .as_str()
            .unwrap()
            .contains(TRUNCATED_UPLOAD));
        assert!(snapshot["result"].is_null());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_files_is_noop() {
        let model = ScriptedModel::new([]);
        let app = create_test_app(model.clone());

        let response = app.clone().oneshot(upload_request(&[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["accepted"], false);
        assert_eq!(body["session"]["status"], "idle");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_exposes_error_and_reset_returns_to_idle() {
        let app = create_test_app(ScriptedModel::failing(500, "quota exhausted"));
        app.clone()
            .oneshot(upload_request(&[("a.pdf", "application/pdf", "x")]))
            .await
            .unwrap();

        let snapshot = wait_for_status(&app, "failed").await;
        assert!(snapshot["error"].as_str().unwrap().contains("quota exhausted"));
        assert!(snapshot["result"].is_null());

        let response = app
            .clone()
            .oneshot(json_request("/api/v1/analysis/reset", ""))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["accepted"], true);
        assert_eq!(body["session"]["status"], "idle");
        assert!(body["session"]["error"].is_null());
    }

    #[tokio::test]
    async fn test_chat_and_report_after_done() {
        let model = ScriptedModel::new([
            Reply::Text(TWO_CANDIDATE_JSON.to_string()),
            Reply::Text("Ana speaks English.".to_string()),
        ]);
        let app = create_test_app(model);
        app.clone()
            .oneshot(upload_request(&[("a.pdf", "application/pdf", "x")]))
            .await
            .unwrap();
        wait_for_status(&app, "done").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "/api/v1/analysis/chat",
                r#"{"question": "Languages?"}"#,
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["accepted"], true);
        let transcript = body["session"]["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0]["role"], "analyst");
        assert_eq!(transcript[1]["text"], "Ana speaks English.");

        let response = app.oneshot(get("/api/v1/analysis/report")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/markdown; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let report = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(report.contains("Selected candidate: Ana García"));
    }

    #[tokio::test]
    async fn test_chat_while_idle_is_ignored() {
        let app = create_test_app(ScriptedModel::new([]));
        let response = app
            .oneshot(json_request("/api/v1/analysis/chat", r#"{"question": "hi"}"#))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["accepted"], false);
        assert_eq!(body["reason"], "no finished analysis to ask about");
    }

    #[tokio::test]
    async fn test_report_without_result_is_not_found() {
        let app = create_test_app(ScriptedModel::new([]));
        let response = app.oneshot(get("/api/v1/analysis/report")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
