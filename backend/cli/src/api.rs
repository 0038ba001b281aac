use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{Request, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn};
use uuid::Uuid;

use umlscan_assistant::{
    CardinalityRequest, CardinalitySuggestion, ContextualHelpRequest, ResponseBuilder, ScanRequest,
};
use umlscan_core::{AnalysisResponse, AssistantResponse, DiagramContext, ScanError, Suggestions};
use umlscan_media::{validate_upload, ImageUpload, UploadLimits};

/// Room for multipart boundaries and the optional context field.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared application state for API handlers.
pub struct AppState {
    pub builder: ResponseBuilder,
    pub limits: UploadLimits,
    /// Extraction backends wired at startup, for the health report.
    pub backends: Vec<String>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.limits.max_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/health", get(health))
        .route("/api/ai/scan-diagram", post(scan_diagram))
        .route("/api/ai/analyze-image", post(analyze_image))
        .route("/api/ai/asistente", post(asistente))
        .route("/api/ai/analyze-uml", post(analyze_uml))
        .route("/api/ai/suggest-cardinality", post(suggest_cardinality))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %req.method(),
                    path = %req.uri().path(),
                )
            }),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "umlscan",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "extractionBackends": state.backends,
        "assistant": state.builder.has_assistant(),
    }))
}

fn upload_error(e: MultipartError, limits: UploadLimits) -> ScanError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ScanError::ImageTooLarge {
            size: limits.max_bytes + 1,
            max: limits.max_bytes,
        }
    } else {
        ScanError::InvalidUpload(e.body_text())
    }
}

/// Parse the optional `context` form field. A context that does not parse
/// is ignored rather than failing the scan.
fn parse_context(text: &str) -> Option<DiagramContext> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(context) => Some(context),
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable diagram context");
            None
        }
    }
}

async fn read_image(field: Field<'_>) -> Result<ImageUpload, MultipartError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let mut upload = ImageUpload::new(field.bytes().await?);
    if let Some(filename) = filename {
        upload = upload.with_filename(filename);
    }
    if let Some(content_type) = content_type {
        upload = upload.with_content_type(content_type);
    }
    Ok(upload)
}

/// Turn the multipart body into a scan request. Any transport problem
/// becomes an input error on the request.
async fn read_scan_request(multipart: &mut Multipart, limits: UploadLimits) -> ScanRequest {
    let mut upload = None;
    let mut context = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ScanRequest::rejected(upload_error(e, limits)),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") | Some("file") => match read_image(field).await {
                Ok(image) => upload = Some(image),
                Err(e) => return ScanRequest::rejected(upload_error(e, limits)),
            },
            Some("context") => match field.text().await {
                Ok(text) => context = parse_context(&text),
                Err(e) => return ScanRequest::rejected(upload_error(e, limits)),
            },
            _ => {}
        }
    }

    let mut request = ScanRequest::from(validate_upload(upload, limits));
    request.context = context;
    request
}

/// Scan an uploaded diagram image. Always answers 200 with a response body.
async fn scan_diagram(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Json<AssistantResponse> {
    let request = read_scan_request(&mut multipart, state.limits).await;
    Json(state.builder.scan(request).await.response)
}

/// Same pipeline as `scan_diagram`, answered as `{ content, suggestions }`.
async fn analyze_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Json<AnalysisResponse> {
    let request = read_scan_request(&mut multipart, state.limits).await;
    Json(AnalysisResponse::from(state.builder.scan(request).await.response))
}

fn bad_request(state: &AppState, rejection: JsonRejection) -> (StatusCode, Json<AssistantResponse>) {
    warn!(error = %rejection.body_text(), "Rejected assistant request");
    (
        StatusCode::BAD_REQUEST,
        Json(AssistantResponse::new(
            state.builder.locale().invalid_request(),
            Suggestions::default(),
        )),
    )
}

/// Contextual help for the diagram open in the editor.
async fn asistente(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContextualHelpRequest>, JsonRejection>,
) -> Result<Json<AssistantResponse>, (StatusCode, Json<AssistantResponse>)> {
    let Json(request) = payload.map_err(|e| bad_request(&state, e))?;
    Ok(Json(state.builder.contextual_help(request).await.response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    user_input: String,
}

/// Free-text analysis: contextual help against an empty diagram.
async fn analyze_uml(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AssistantResponse>, (StatusCode, Json<AssistantResponse>)> {
    let Json(request) = payload.map_err(|e| bad_request(&state, e))?;
    let help = ContextualHelpRequest {
        context: DiagramContext::default(),
        message: Some(request.user_input),
    };
    Ok(Json(state.builder.contextual_help(help).await.response))
}

async fn suggest_cardinality(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CardinalityRequest>, JsonRejection>,
) -> Result<Json<CardinalitySuggestion>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    if request.source_class.trim().is_empty() || request.target_class.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "sourceClass and targetClass are required".to_string(),
        ));
    }
    Ok(Json(state.builder.suggest_cardinality(&request)))
}
