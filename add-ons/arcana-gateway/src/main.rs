//! Axum-based report gateway: entry point for the Arcana Insights pipeline.
//! Config-driven via GatewayConfig; collaborators (LLM bridge, token store,
//! CAPTCHA verifier, email transport, PDF backend) are constructed once at
//! startup and injected through AppState — never re-instantiated per call.

mod handlers;

use arcana_core::{
    AstroDataClient, CaptchaVerifier, EmailClient, EmailTransport, GatewayConfig,
    HtmlFlattenPdfBackend, LlmBridge, LlmMode, NullEmailTransport, Orchestrator, PdfBackend,
    SemanticPdfBackend, SledTokenStore, TokenStore,
};
use axum::http::Method;
use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

/// Gateway version from Cargo.toml (status endpoint).
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<GatewayConfig>,
    pub(crate) llm: Option<Arc<LlmBridge>>,
    pub(crate) orchestrator: Arc<Orchestrator>,
    pub(crate) store: Arc<dyn TokenStore>,
    pub(crate) email: Arc<dyn EmailTransport>,
    pub(crate) captcha: Arc<CaptchaVerifier>,
    pub(crate) pdf: Arc<dyn PdfBackend>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/status — app identity and runtime toggles.
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let llm_mode = match &state.llm {
        Some(bridge) => bridge.mode().as_str(),
        None => "unconfigured",
    };
    Json(serde_json::json!({
        "app_name": state.config.app_name,
        "version": GATEWAY_VERSION,
        "llm_mode": llm_mode,
        "captcha_bypass": state.captcha.bypassed(),
    }))
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/report", post(handlers::report::report_post))
        .route("/api/v1/submission", post(handlers::premium::submission_post))
        .route("/api/v1/premium/redeem", post(handlers::premium::redeem_post))
        .route("/api/v1/webhooks/order", post(handlers::webhook::order_webhook_post))
        .layer(cors)
        .with_state(state)
}

fn pdf_backend_from_env() -> Arc<dyn PdfBackend> {
    match std::env::var("ARCANA_PDF_BACKEND").as_deref() {
        Ok("flatten") => Arc::new(HtmlFlattenPdfBackend),
        _ => Arc::new(SemanticPdfBackend),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(GatewayConfig::from_env());

    let llm = LlmBridge::from_env().map(Arc::new);
    match &llm {
        Some(bridge) if bridge.mode() == LlmMode::Mock => {
            tracing::info!(target: "arcana::gateway", "LLM bridge in mock mode")
        }
        Some(_) => tracing::info!(target: "arcana::gateway", "LLM bridge configured"),
        None => tracing::warn!(
            target: "arcana::gateway",
            "No LLM credential configured; engines will run on fallbacks"
        ),
    }
    let astro = AstroDataClient::from_env().map(Arc::new);

    let store_path = Path::new(&config.storage_path).join("arcana_tokens");
    let store: Arc<dyn TokenStore> = match SledTokenStore::open_path(&store_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(target: "arcana::gateway", error = %e, "Token store open failed");
            std::process::exit(1);
        }
    };

    let email: Arc<dyn EmailTransport> = match &config.email_api_key {
        Some(key) => Arc::new(EmailClient::new(key.clone(), config.email_from.clone())),
        None => {
            tracing::warn!(target: "arcana::gateway", "EMAIL_API_KEY not set; using null transport");
            Arc::new(NullEmailTransport)
        }
    };

    let state = AppState {
        orchestrator: Arc::new(Orchestrator::new(llm.clone(), astro)),
        captcha: Arc::new(CaptchaVerifier::new(
            config.captcha_secret.clone(),
            config.captcha_bypass,
        )),
        pdf: pdf_backend_from_env(),
        config: config.clone(),
        llm,
        store,
        email,
    };

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(target: "arcana::gateway", %addr, app = %config.app_name, "Gateway listening");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(target: "arcana::gateway", error = %e, "Bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, build_app(state)).await {
        tracing::error!(target: "arcana::gateway", error = %e, "Server exited with error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::{
        sign, EmailMessage, MemoryTokenStore, ReportError, ReportResult, SendReceipt, Submission,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records every message instead of sending; optionally fails each send.
    struct RecordingTransport {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()), fail: false }
        }

        fn failing() -> Self {
            Self { sent: Mutex::new(Vec::new()), fail: true }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl EmailTransport for RecordingTransport {
        async fn send(&self, message: &EmailMessage) -> ReportResult<SendReceipt> {
            if self.fail {
                return Err(ReportError::Delivery("transport down".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(SendReceipt { id: "test-email".to_string() })
        }
    }

    const WEBHOOK_SECRET: &str = "webhook-test-secret";

    fn test_state(
        email: Arc<RecordingTransport>,
        store: Arc<MemoryTokenStore>,
    ) -> AppState {
        let config = Arc::new(GatewayConfig {
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            captcha_bypass: true,
            ..GatewayConfig::default()
        });
        AppState {
            // No LLM, no chart API: classifier and engines run their fallbacks.
            orchestrator: Arc::new(Orchestrator::new(None, None)),
            captcha: Arc::new(CaptchaVerifier::new(None, true)),
            pdf: Arc::new(SemanticPdfBackend),
            config,
            llm: None,
            store,
            email,
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const SAMPLE: &str = r#"{"email":"x@y.com","question":"Should I change careers?","fullName":"Jane Doe","birthDate":"1990-05-14"}"#;

    #[tokio::test]
    async fn test_health_and_status() {
        let app = build_app(test_state(
            Arc::new(RecordingTransport::new()),
            Arc::new(MemoryTokenStore::new()),
        ));
        let res = app
            .clone()
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(res).await;
        assert_eq!(json["llm_mode"], "unconfigured");
        assert_eq!(json["captcha_bypass"], true);
    }

    #[tokio::test]
    async fn test_report_end_to_end_on_fallbacks() {
        let email = Arc::new(RecordingTransport::new());
        let app = build_app(test_state(email.clone(), Arc::new(MemoryTokenStore::new())));
        let res = app.oneshot(post_json("/api/v1/report", SAMPLE)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["mode"], "personal");
        assert!(!json["summary"].as_str().unwrap().is_empty());
        // Exactly one email, carrying the PDF attachment.
        assert_eq!(email.sent_count(), 1);
        let sent = email.sent.lock().unwrap();
        assert_eq!(sent[0].to, "x@y.com");
        assert_eq!(sent[0].attachments.len(), 1);
        assert!(sent[0].attachments[0].content.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_report_accepts_multipart_form() {
        let email = Arc::new(RecordingTransport::new());
        let app = build_app(test_state(email.clone(), Arc::new(MemoryTokenStore::new())));

        let b = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\nx@y.com\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\nShould I move?\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"fullName\"\r\n\r\nJane Doe\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"birthDate\"\r\n\r\n1990-05-14\r\n\
             --{b}--\r\n",
            b = b
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/report")
            .header("content-type", format!("multipart/form-data; boundary={}", b))
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["mode"], "personal");
        assert_eq!(email.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_report_missing_fields_is_400() {
        let app = build_app(test_state(
            Arc::new(RecordingTransport::new()),
            Arc::new(MemoryTokenStore::new()),
        ));
        let res = app
            .clone()
            .oneshot(post_json("/api/v1/report", r#"{"question":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app.oneshot(post_json("/api/v1/report", "not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_wrong_method_is_405() {
        let app = build_app(test_state(
            Arc::new(RecordingTransport::new()),
            Arc::new(MemoryTokenStore::new()),
        ));
        let res = app
            .oneshot(Request::builder().uri("/api/v1/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_premium_capture_then_redeem_exactly_once() {
        let email = Arc::new(RecordingTransport::new());
        let store = Arc::new(MemoryTokenStore::new());
        let app = build_app(test_state(email.clone(), store));

        let res = app.clone().oneshot(post_json("/api/v1/submission", SAMPLE)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        let token = json["premiumToken"].as_str().unwrap().to_string();

        let redeem_body = format!(r#"{{"premiumToken":"{}"}}"#, token);
        let res = app.clone().oneshot(post_json("/api/v1/premium/redeem", &redeem_body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(email.sent_count(), 1);

        // Second redemption of the same token is a hard 404.
        let res = app.oneshot(post_json("/api/v1/premium/redeem", &redeem_body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(email.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_redeem_restores_token_when_delivery_fails() {
        let store = Arc::new(MemoryTokenStore::new());
        let app = build_app(test_state(Arc::new(RecordingTransport::failing()), store.clone()));

        let sub: Submission = serde_json::from_str(SAMPLE).unwrap();
        store.save("tok-1", &sub, 60_000).unwrap();

        let res = app
            .oneshot(post_json("/api/v1/premium/redeem", r#"{"premiumToken":"tok-1"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The token survives the failed delivery and stays redeemable.
        assert!(store.load("tok-1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_webhook_bad_signature_touches_no_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let app = build_app(test_state(Arc::new(RecordingTransport::new()), store.clone()));

        let sub: Submission = serde_json::from_str(SAMPLE).unwrap();
        store.save("tok-2", &sub, 60_000).unwrap();

        let body = r#"{"id":1,"note_attributes":[{"name":"premiumToken","value":"tok-2"}]}"#;
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/order")
            .header("x-commerce-hmac-sha256", "bm90IGEgcmVhbCBzaWduYXR1cmU=")
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(store.load("tok-2").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_webhook_valid_signature_delivers_and_consumes() {
        let email = Arc::new(RecordingTransport::new());
        let store = Arc::new(MemoryTokenStore::new());
        let app = build_app(test_state(email.clone(), store.clone()));

        let sub: Submission = serde_json::from_str(SAMPLE).unwrap();
        store.save("tok-3", &sub, 60_000).unwrap();

        let body = r#"{"id":1,"note_attributes":[{"name":"premiumToken","value":"tok-3"}]}"#;
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/order")
            .header("x-commerce-hmac-sha256", sign(WEBHOOK_SECRET, body.as_bytes()))
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(email.sent_count(), 1);
        assert!(store.load("tok-3").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_webhook_unknown_token_is_soft_200() {
        let app = build_app(test_state(
            Arc::new(RecordingTransport::new()),
            Arc::new(MemoryTokenStore::new()),
        ));
        let body = r#"{"id":1,"note_attributes":[{"name":"premiumToken","value":"ghost"}]}"#;
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/order")
            .header("x-commerce-hmac-sha256", sign(WEBHOOK_SECRET, body.as_bytes()))
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["note"], "token not found");
    }
}
