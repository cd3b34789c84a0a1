use axum::{
    Form, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use ussd_flow::{
    FlowError, Ledgers, Menu, MenuStateMachine, SessionStorage, UssdRequest, UssdRunner,
    domain::{Claim, Payment},
    mask_phone,
};
use uuid::Uuid;

const SERVICE_NAME: &str = "USSD Insurance Service";

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub runner: UssdRunner,
    pub ledgers: Ledgers,
}

impl AppState {
    pub fn new(ledgers: Ledgers, sessions: Arc<dyn SessionStorage>) -> Self {
        let machine = Arc::new(MenuStateMachine::new(ledgers.clone()));
        Self {
            runner: UssdRunner::new(machine, sessions),
            ledgers,
        }
    }
}

/// Session as exposed for inspection; the phone number is masked.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub phone_number: String,
    pub menu: Menu,
    pub step: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/ussd", post(handle_ussd))
        .route("/api/session/{id}", get(get_session))
        .route("/api/payments/{reference}/complete", post(complete_payment))
        .route("/api/claims/{number}", get(get_claim))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/ussd": "USSD gateway callback (form: SessionId, PhoneNumber, Text, ServiceCode)",
            "GET /api/session/{id}": "Inspect a live USSD session",
            "POST /api/payments/{reference}/complete": "Payment provider confirmation",
            "GET /api/claims/{number}": "Look up a claim by number",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME
    }))
}

/// Gateway callback. The body is `CON <text>` or `END <text>` in plain text.
async fn handle_ussd(
    State(state): State<AppState>,
    Form(request): Form<UssdRequest>,
) -> impl IntoResponse {
    let reply = state.runner.handle(&request).await;
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        reply.to_string(),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    match state.runner.storage().get(&session_id).await {
        Ok(Some(session)) => Ok(Json(SessionView {
            phone_number: mask_phone(&session.phone_number),
            menu: session.menu.menu(),
            step: session.menu.step(),
            created_at: session.created_at,
            last_accessed_at: session.last_accessed_at,
            session_id: session.id,
        })),
        Ok(None) => Err(not_found_error("Session not found", &session_id)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to get session");
            Err(internal_error("Failed to get session"))
        }
    }
}

async fn complete_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<Payment> {
    match state.ledgers.payments.complete(&reference).await {
        Ok(payment) => {
            info!(
                reference = %reference,
                policy_id = payment.policy_id,
                amount = payment.amount,
                "Payment completed"
            );
            Ok(Json(payment))
        }
        Err(FlowError::PaymentNotFound(_)) => {
            Err(not_found_error("Payment not found", &reference))
        }
        Err(e) => {
            error!(reference = %reference, error = %e, "Failed to complete payment");
            Err(internal_error("Failed to complete payment"))
        }
    }
}

async fn get_claim(
    State(state): State<AppState>,
    Path(claim_number): Path<String>,
) -> ApiResult<Claim> {
    match state.ledgers.claims.find_by_number(&claim_number).await {
        Ok(Some(claim)) => Ok(Json(claim)),
        Ok(None) => Err(not_found_error("Claim not found", &claim_number)),
        Err(e) => {
            error!(claim_number = %claim_number, error = %e, "Failed to get claim");
            Err(internal_error("Failed to get claim"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;
    use ussd_flow::{
        ClaimLedger, CustomerRegistry, InMemoryLedger, InMemorySessionStorage, PaymentLedger,
        PolicyLedger,
        domain::{
            ClaimStatus, ClaimType, NewClaim, NewCustomer, NewPolicy, PolicyStatus, PolicyTerm,
            PolicyType,
        },
    };

    fn app() -> (Router, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new());
        let state = AppState::new(
            Ledgers::in_memory(ledger.clone()),
            Arc::new(InMemorySessionStorage::new()),
        );
        (build_router(state), ledger)
    }

    async fn post_ussd(app: &Router, session_id: &str, text: &str) -> (StatusCode, String) {
        let body = format!(
            "SessionId={session_id}&PhoneNumber=%2B254712345678&Text={}&ServiceCode=*123%23",
            text.replace(' ', "+")
        );
        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/ussd")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send_json(app, "GET", uri).await
    }

    async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_registration_over_http() {
        let (app, ledger) = app();

        let (status, body) = post_ussd(&app, "S1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("CON Welcome to Insurance Services"));

        let (_, body) = post_ussd(&app, "S1", "1").await;
        assert!(body.starts_with("CON Registration"));
        let (_, body) = post_ussd(&app, "S1", "1*Jane Doe").await;
        assert_eq!(body, "CON Enter your ID number:");
        let (_, body) = post_ussd(&app, "S1", "1*Jane Doe*ID123").await;
        assert_eq!(body, "CON Enter date of birth (YYYY-MM-DD):");

        let (status, view) = get_json(&app, "/api/session/S1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["menu"], "registering");
        assert_eq!(view["step"], "dob");
        assert_eq!(view["phone_number"], "*********5678");

        let (_, body) = post_ussd(&app, "S1", "1*Jane Doe*ID123*1990-01-01").await;
        assert!(body.starts_with("END Registration successful!"));

        let customer = ledger.find_by_phone("+254712345678").await.unwrap().unwrap();
        assert_eq!(customer.name, "Jane Doe");

        let (status, _) = get_json(&app, "/api/session/S1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payment_callback_activates_policy() {
        let (app, ledger) = app();
        let customer = ledger
            .register(NewCustomer {
                phone_number: "+254712345678".to_string(),
                name: "Jane Doe".to_string(),
                id_number: "ID123".to_string(),
                date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .await
            .unwrap();
        let term = PolicyTerm::starting(Utc::now()).unwrap();
        let policy = ledger
            .create(NewPolicy {
                customer_id: customer.id,
                policy_type: PolicyType::Funeral,
                status: PolicyStatus::Pending,
                premium: 15,
                cover_amount: 10_000,
                start_date: term.start_date,
                end_date: term.end_date,
                next_payment_date: Some(term.next_payment_date),
            })
            .await
            .unwrap();

        let (_, body) = post_ussd(&app, "S9", "4").await;
        assert!(body.starts_with("CON Select policy to pay:"));
        let (_, body) = post_ussd(&app, "S9", "4*1").await;
        assert!(body.starts_with("END Payment initiated!"));

        let reference = ledger.list_by_policy(policy.id).await.unwrap()[0]
            .transaction_reference
            .clone();
        assert!(body.contains(&reference));

        let (status, payment) =
            send_json(&app, "POST", &format!("/api/payments/{reference}/complete")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payment["status"], "Completed");
        assert_eq!(payment["amount"], 15);
        let activated = ledger.find(policy.id).await.unwrap().unwrap();
        assert_eq!(activated.status, PolicyStatus::Active);

        let (status, _) = send_json(&app, "POST", "/api/payments/TXN0/complete").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_claim_lookup() {
        let (app, ledger) = app();
        let claim = ledger
            .submit(NewClaim {
                policy_id: 1,
                claim_type: ClaimType::Damage,
                description: "Roof leak".to_string(),
                incident_date: Utc::now(),
                status: ClaimStatus::Submitted,
            })
            .await
            .unwrap();

        let (status, body) = get_json(&app, &format!("/api/claims/{}", claim.claim_number)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Roof leak");
        assert_eq!(body["claim_type"], "Damage");

        let (status, _) = get_json(&app, "/api/claims/CLM000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_incomplete_gateway_post_gets_end_reply() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/ussd")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("SessionId=S1&Text=1"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(body, format!("END {}", ussd_flow::GENERIC_ERROR_MESSAGE));

        let (status, _) = get_json(&app, "/api/session/S1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
