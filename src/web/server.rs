use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::alignment::{AlignParams, DEFAULT_EVALUE, DEFAULT_MAX_HITS};
use crate::analysis::{AnalysisParams, Analyzer, DEFAULT_THRESHOLD};
use crate::cli::{analyzer_config, ServeArgs};
use crate::error::AnalysisError;
use crate::observer::TracingObserver;
use crate::utils::validation::{
    validate_evalue, validate_max_hits, validate_threshold, validate_upload, ValidationError,
};

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_MULTIPART_FIELDS: usize = 10;
pub const MAX_FILE_FIELD_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const MAX_TEXT_FIELD_SIZE: usize = 1024;

/// Alignment against a whole genome with the local aligner can take minutes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared application state
pub struct AppState {
    pub analyzer: Analyzer,
}

/// Error body returned by every endpoint
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_response(
    status: StatusCode,
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> Response {
    (
        status,
        Json(create_safe_error_response(error_type, user_message, internal_error)),
    )
        .into_response()
}

/// HTTP response for a failed analysis or alignment
fn analysis_error_response(error: &AnalysisError) -> Response {
    let internal = error.to_string();
    match error {
        AnalysisError::InputFormat(_) => {
            tracing::warn!("Rejected query: {internal}");
            error_response(
                StatusCode::BAD_REQUEST,
                error.kind(),
                "Could not read any sequences from the uploaded file",
                None,
            )
        }
        AnalysisError::ReferenceUnavailable(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            error.kind(),
            "Reference gene database is not available",
            Some(&internal),
        ),
        AnalysisError::AlignmentFailure(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            error.kind(),
            "Sequence alignment failed",
            Some(&internal),
        ),
        AnalysisError::Classification(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            error.kind(),
            "Resistance classification failed",
            Some(&internal),
        ),
    }
}

fn validation_error_response(error: &ValidationError) -> Response {
    let (error_type, message) = match error {
        ValidationError::FilenameTooLong => {
            ("filename_too_long", "Filename exceeds maximum length limit")
        }
        ValidationError::InvalidFilename | ValidationError::EmptyFilename => (
            "invalid_filename",
            "Filename contains invalid or dangerous characters",
        ),
        ValidationError::UnsupportedExtension => (
            "unsupported_format",
            "File must be in FASTA format (.fasta, .fa, or .fna)",
        ),
        ValidationError::InvalidFileContent => {
            ("invalid_content", "File content appears malformed or corrupted")
        }
        ValidationError::FormatValidationFailed => {
            ("format_mismatch", "File content is not FASTA")
        }
        ValidationError::InvalidParameter(_) => ("invalid_parameter", "Invalid request parameter"),
    };
    tracing::warn!("Upload rejected: {error}");
    error_response(StatusCode::BAD_REQUEST, error_type, message, None)
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    // The narrative client blocks; build and drop it outside the runtime
    let analyzer = Analyzer::from_config(&analyzer_config(&args.database, Some(&args.narrative)));
    let state = Arc::new(AppState { analyzer });

    let rt = tokio::runtime::Runtime::new()?;
    let served = rt.block_on(run_server(args, Arc::clone(&state)));
    drop(rt);
    drop(state);
    served
}

/// API routes with body limits but without the rate limiting and timeout layers
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/blast", post(blast_handler))
        .route("/api/genes", get(genes_handler))
        .route("/api/reference-genes", get(reference_genes_handler))
        .with_state(state)
        // Largest upload plus multipart overhead
        .layer(DefaultBodyLimit::max(MAX_FILE_FIELD_SIZE + 4 * 1024 * 1024))
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is rejected.
pub fn create_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?;

    let app = api_routes(state).layer(
        ServiceBuilder::new()
            // Security headers for browser protection
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            // IP-based rate limiting to prevent abuse
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                REQUEST_TIMEOUT,
            ))
            // Alignment is CPU-bound; keep the number in flight small
            .layer(ConcurrencyLimitLayer::new(16)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state)?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting amr-caller web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}/health"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// A validated upload plus any numeric form fields
#[derive(Debug, Default)]
struct UploadRequest {
    content: Vec<u8>,
    filename: String,
    threshold: Option<f64>,
    evalue: Option<f64>,
    max_hits: Option<usize>,
}

impl UploadRequest {
    fn align_params(&self) -> Result<AlignParams, ValidationError> {
        Ok(AlignParams {
            evalue: validate_evalue(self.evalue.unwrap_or(DEFAULT_EVALUE))?,
            max_hits: validate_max_hits(self.max_hits.unwrap_or(DEFAULT_MAX_HITS))?,
        })
    }

    fn analysis_params(&self) -> Result<AnalysisParams, ValidationError> {
        Ok(AnalysisParams {
            align: self.align_params()?,
            threshold: validate_threshold(self.threshold.unwrap_or(DEFAULT_THRESHOLD))?,
        })
    }

    /// Write the upload to a request-scoped temporary file, removed on drop
    fn to_temp_file(&self) -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("amr-query-")
            .suffix(".fasta")
            .tempfile()?;
        file.write_all(&self.content)?;
        file.flush()?;
        Ok(file)
    }
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    let text = field.text().await.map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_parameter",
            "Unreadable form field",
            None,
        )
    })?;
    if text.len() > MAX_TEXT_FIELD_SIZE {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "text_too_large",
            "Text field size exceeds limit",
            None,
        ));
    }
    Ok(text.trim().to_string())
}

fn parse_number<T: std::str::FromStr>(name: &str, text: &str) -> Result<Option<T>, Response> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<T>().map(Some).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_parameter",
            &format!("Field '{name}' must be a number"),
            None,
        )
    })
}

/// Extract the query file and parameters from a multipart form
async fn extract_upload(multipart: &mut Multipart) -> Result<UploadRequest, Response> {
    let mut request = UploadRequest::default();
    let mut has_file = false;
    let mut fields_received = 0usize;

    loop {
        if fields_received >= MAX_MULTIPART_FIELDS {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "field_limit_exceeded",
                "Too many form fields",
                None,
            ));
        }

        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_upload",
                    "Failed to parse upload",
                    Some(&e.to_string()),
                ));
            }
        };
        fields_received += 1;

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        "invalid_upload",
                        "Failed to read uploaded file",
                        Some(&e.to_string()),
                    )
                })?;
                if bytes.len() > MAX_FILE_FIELD_SIZE {
                    return Err(error_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "file_too_large",
                        "File size exceeds limit",
                        None,
                    ));
                }

                request.filename =
                    validate_upload(&filename, &bytes).map_err(|e| validation_error_response(&e))?;
                request.content = bytes.to_vec();
                has_file = true;
            }
            "threshold" => request.threshold = parse_number(&name, &read_text_field(field).await?)?,
            "evalue" => request.evalue = parse_number(&name, &read_text_field(field).await?)?,
            "max_hits" => request.max_hits = parse_number(&name, &read_text_field(field).await?)?,
            _ => {} // Ignore unknown fields
        }
    }

    if !has_file {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing_input",
            "No file received. Please upload a FASTA file.",
            None,
        ));
    }

    Ok(request)
}

/// Run blocking work off the reactor and flatten its outcome into a response
async fn run_blocking<T, F>(work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(e)) => analysis_error_response(&e),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Request could not be completed",
            Some(&e.to_string()),
        ),
    }
}

fn temp_file_error(e: &std::io::Error) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Could not stage the uploaded file",
        Some(&e.to_string()),
    )
}

/// Full resistance analysis of an uploaded FASTA
async fn analyze_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let upload = match extract_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };
    let params = match upload.analysis_params() {
        Ok(params) => params,
        Err(e) => return validation_error_response(&e),
    };
    let query_file = match upload.to_temp_file() {
        Ok(file) => file,
        Err(e) => return temp_file_error(&e),
    };
    tracing::info!("Analyzing upload {}", upload.filename);

    run_blocking(move || {
        state
            .analyzer
            .analyze_file(query_file.path(), params, &TracingObserver)
    })
    .await
}

/// Raw alignment hits for an uploaded FASTA
async fn blast_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let upload = match extract_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };
    let params = match upload.align_params() {
        Ok(params) => params,
        Err(e) => return validation_error_response(&e),
    };
    let query_file = match upload.to_temp_file() {
        Ok(file) => file,
        Err(e) => return temp_file_error(&e),
    };

    run_blocking(move || {
        state
            .analyzer
            .engine()
            .align_file(query_file.path(), params, &TracingObserver)
    })
    .await
}

/// Built-in resistance gene table
async fn genes_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let genes = state.analyzer.registry().entries();
    Json(serde_json::json!({
        "count": genes.len(),
        "genes": genes,
    }))
}

/// Identifiers of the reference sequences
async fn reference_genes_handler(State(state): State<Arc<AppState>>) -> Response {
    run_blocking(move || {
        let ids = state.analyzer.engine().reference_ids(&TracingObserver);
        Ok(serde_json::json!({
            "count": ids.len(),
            "reference_genes": ids,
        }))
    })
    .await
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = state.analyzer.engine().database();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "reference_index": database.has_index(),
        "reference_fasta": database.has_fasta(),
        "narrative": state.analyzer.has_narrator(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "amr-test-boundary";

    fn random_dna(seed: u64, len: usize) -> String {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                char::from(b"ACGT"[(state >> 33) as usize % 4])
            })
            .collect()
    }

    fn app(db_dir: &std::path::Path) -> Router {
        let analyzer = Analyzer::from_config(&AnalyzerConfig::new(db_dir));
        api_routes(Arc::new(AppState { analyzer }))
    }

    /// Reference set with one vanA gene; returns the gene sequence
    fn write_reference(dir: &std::path::Path) -> String {
        let gene = random_dna(17, 400);
        std::fs::write(
            dir.join("resistance_genes.fasta"),
            format!(">vanA_M97297.1\n{gene}\n"),
        )
        .unwrap();
        gene
    }

    /// (field name, optional filename, content)
    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["reference_fasta"], false);
    }

    #[tokio::test]
    async fn test_genes() {
        let dir = TempDir::new().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/api/genes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["count"], 6);
        assert_eq!(json["genes"][0]["symbol"], "mecA");
        assert_eq!(json["genes"][2]["significance_threshold"], 75.0);
    }

    #[tokio::test]
    async fn test_reference_genes() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());
        let response = app(dir.path())
            .oneshot(
                Request::get("/api/reference-genes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["reference_genes"][0], "vanA_M97297.1");
    }

    #[tokio::test]
    async fn test_analyze_resistant_upload() {
        let dir = TempDir::new().unwrap();
        let gene = write_reference(dir.path());
        let query = format!(
            ">isolate7\n{}{gene}{}\n",
            random_dna(101, 120),
            random_dna(202, 120)
        );

        let response = app(dir.path())
            .oneshot(multipart_request(
                "/api/analyze",
                &[
                    ("file", Some("isolate7.fasta"), &query),
                    ("threshold", None, "80"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["sample_id"], "isolate7");
        assert_eq!(json["resistance_status"], "resistant");
        assert_eq!(json["identified_genes"][0], "vanA");
        assert_eq!(json["matching_regions"][0]["query_start"], 121);
        assert!(json["treatment_recommendations"]["avoid_antibiotics"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("vancomycin")));
    }

    #[tokio::test]
    async fn test_blast_upload() {
        let dir = TempDir::new().unwrap();
        let gene = write_reference(dir.path());
        let query = format!(">contig1\n{gene}\n");

        let response = app(dir.path())
            .oneshot(multipart_request(
                "/api/blast",
                &[
                    ("file", Some("contig1.fa"), &query),
                    ("evalue", None, "1e-5"),
                    ("max_hits", None, "3"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json[0]["query_id"], "contig1");
        assert_eq!(json[0]["hits"][0]["subject_id"], "vanA_M97297.1");
        assert_eq!(json[0]["hits"][0]["percent_identity"], 100.0);
    }

    #[tokio::test]
    async fn test_missing_reference_is_503() {
        let dir = TempDir::new().unwrap();
        let response = app(dir.path())
            .oneshot(multipart_request(
                "/api/analyze",
                &[("file", Some("q.fasta"), ">q\nACGTACGT\n")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = json_body(response).await;
        assert_eq!(json["error_type"], "reference_unavailable");
        assert!(json["details"].is_null());
        assert!(!json["error"].as_str().unwrap().contains(dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_rejected_uploads() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());

        let cases: [(&[(&str, Option<&str>, &str)], &str); 5] = [
            (&[("file", Some("../etc/passwd.fasta"), ">q\nACGT\n")], "invalid_filename"),
            (&[("file", Some("reads.bam"), ">q\nACGT\n")], "unsupported_format"),
            (&[("file", Some("q.fasta"), "ACGT\n")], "format_mismatch"),
            (&[("file", Some("q.fasta"), ">q\nACGT\n"), ("threshold", None, "inf")], "invalid_parameter"),
            (&[("threshold", None, "0.5")], "missing_input"),
        ];

        for (parts, expected) in cases {
            let response = app(dir.path())
                .oneshot(multipart_request("/api/analyze", parts))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{expected}");
            assert_eq!(json_body(response).await["error_type"], expected);
        }
    }

    #[tokio::test]
    async fn test_empty_sequence_is_input_error() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());

        let response = app(dir.path())
            .oneshot(multipart_request(
                "/api/analyze",
                &[("file", Some("empty.fasta"), ">empty\n")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_type"], "input_format");
    }
}
