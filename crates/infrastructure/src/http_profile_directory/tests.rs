use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use fiscalia_application::{
    ProfileAssignmentRequest, ProfileAssignmentService, ProfileDirectory, ProfileListRefresher,
    SubmitOutcome,
};
use fiscalia_core::{AppError, AppResult, OperatorSession};
use fiscalia_domain::{AssignmentNotes, ProfileId, UserId};

use super::HttpProfileDirectory;

const TOKEN: &str = "token-123";

#[derive(Debug, Clone, PartialEq)]
struct RecordedRequest {
    path: String,
    operator: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct BackendState {
    transient_list_failures: usize,
    list_attempts: Arc<AtomicUsize>,
    profiles_by_user: Arc<Mutex<HashMap<i64, BTreeSet<i64>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Token inválido."})),
    )
        .into_response()
}

async fn list_profiles(State(state): State<BackendState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let attempt = state.list_attempts.fetch_add(1, Ordering::SeqCst);
    if attempt < state.transient_list_failures {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    Json(json!([
        {"id": 1, "nome": "Administrador", "ativo": true},
        {"id": 4, "nome": "Auditor (legado)", "ativo": false},
        {"id": 3, "nome": "Fiscal", "ativo": true},
        {"id": 2, "nome": "Gestor", "ativo": true}
    ]))
    .into_response()
}

async fn user_profiles(
    State(state): State<BackendState>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let profiles = state.profiles_by_user.lock().await;
    let Some(profile_ids) = profiles.get(&user_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Não encontrado."})),
        )
            .into_response();
    };

    Json(json!({
        "id": user_id,
        "nome": "Maria Souza",
        "email": "maria@example.gov",
        "matricula": "00123",
        "perfis": [],
        "perfil_ids": profile_ids,
        "perfis_texto": ""
    }))
    .into_response()
}

async fn record(state: &BackendState, path: String, headers: &HeaderMap, body: &Value) {
    state.requests.lock().await.push(RecordedRequest {
        path,
        operator: headers
            .get("x-fiscalia-operator")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: body.clone(),
    });
}

fn requested_ids(body: &Value) -> BTreeSet<i64> {
    body.get("perfil_ids")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

async fn grant(
    State(state): State<BackendState>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record(
        &state,
        format!("/api/usuarios/{user_id}/perfis/conceder/"),
        &headers,
        &body,
    )
    .await;

    let mut profiles = state.profiles_by_user.lock().await;
    let held = profiles.entry(user_id).or_default();
    held.extend(requested_ids(&body));

    Json(json!({"detail": "Perfis concedidos.", "perfil_ids": held.clone()})).into_response()
}

async fn revoke(
    State(state): State<BackendState>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record(
        &state,
        format!("/api/usuarios/{user_id}/perfis/revogar/"),
        &headers,
        &body,
    )
    .await;

    let mut profiles = state.profiles_by_user.lock().await;
    let held = profiles.entry(user_id).or_default();
    let remaining: BTreeSet<i64> = held.difference(&requested_ids(&body)).copied().collect();
    if remaining.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "O usuário deve manter pelo menos um perfil ativo."})),
        )
            .into_response();
    }
    *held = remaining;

    Json(json!({"detail": "Perfis revogados.", "perfil_ids": held.clone()})).into_response()
}

async fn spawn_backend(state: BackendState) -> String {
    let router = Router::new()
        .route("/api/perfis/", get(list_profiles))
        .route("/api/usuarios/{user_id}/perfis/", get(user_profiles))
        .route("/api/usuarios/{user_id}/perfis/conceder/", post(grant))
        .route("/api/usuarios/{user_id}/perfis/revogar/", post(revoke))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    format!("http://{address}/")
}

fn operator(token: &str) -> OperatorSession {
    OperatorSession::new("admin", token).unwrap_or_else(|_| unreachable!())
}

fn directory(base_url: String) -> HttpProfileDirectory {
    HttpProfileDirectory::new(reqwest::Client::new(), base_url, 3, 50)
}

fn request(ids: &[i64], notes: Option<&str>) -> ProfileAssignmentRequest {
    ProfileAssignmentRequest {
        profile_ids: ids.iter().copied().map(ProfileId::new).collect(),
        notes: AssignmentNotes::new(notes.map(str::to_owned)).unwrap_or_else(|_| unreachable!()),
    }
}

fn state_with_user(user_id: i64, profile_ids: &[i64]) -> BackendState {
    BackendState {
        profiles_by_user: Arc::new(Mutex::new(HashMap::from([(
            user_id,
            profile_ids.iter().copied().collect(),
        )]))),
        ..BackendState::default()
    }
}

#[tokio::test]
async fn list_profiles_keeps_backend_order() {
    let base_url = spawn_backend(BackendState::default()).await;

    let profiles = directory(base_url).list_profiles(&operator(TOKEN)).await;

    let ids: Vec<i64> = profiles
        .unwrap_or_default()
        .iter()
        .map(|profile| profile.id().value())
        .collect();
    assert_eq!(ids, vec![1, 4, 3, 2]);
}

#[tokio::test]
async fn list_profiles_retries_transient_failures() {
    let state = BackendState {
        transient_list_failures: 2,
        ..BackendState::default()
    };
    let attempts = state.list_attempts.clone();
    let base_url = spawn_backend(state).await;

    let profiles = directory(base_url).list_profiles(&operator(TOKEN)).await;

    assert_eq!(profiles.unwrap_or_default().len(), 4);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn list_profiles_gives_up_after_configured_attempts() {
    let state = BackendState {
        transient_list_failures: 10,
        ..BackendState::default()
    };
    let attempts = state.list_attempts.clone();
    let base_url = spawn_backend(state).await;

    let result = HttpProfileDirectory::new(reqwest::Client::new(), base_url, 2, 50)
        .list_profiles(&operator(TOKEN))
        .await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let base_url = spawn_backend(BackendState::default()).await;

    let result = directory(base_url)
        .list_profiles(&operator("other-token"))
        .await;

    assert_eq!(
        result,
        Err(AppError::Unauthorized("Token inválido.".to_owned()))
    );
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let base_url = spawn_backend(BackendState::default()).await;

    let result = directory(base_url)
        .get_user_profile_info(&operator(TOKEN), UserId::new(99))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn user_profile_info_is_mapped() {
    let base_url = spawn_backend(state_with_user(7, &[2, 3])).await;

    let info = directory(base_url)
        .get_user_profile_info(&operator(TOKEN), UserId::new(7))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(info.user_id, UserId::new(7));
    assert_eq!(info.registration.as_deref(), Some("00123"));
    assert_eq!(info.profile_ids, vec![ProfileId::new(2), ProfileId::new(3)]);
}

#[tokio::test]
async fn grant_sends_ids_notes_and_operator() {
    let state = state_with_user(7, &[1]);
    let requests = state.requests.clone();
    let base_url = spawn_backend(state).await;

    let confirmation = directory(base_url)
        .grant_profiles(
            &operator(TOKEN),
            UserId::new(7),
            &request(&[3, 2], Some("nomeação 12/2024")),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        confirmation.profile_ids,
        Some(vec![ProfileId::new(1), ProfileId::new(2), ProfileId::new(3)])
    );
    assert_eq!(
        *requests.lock().await,
        vec![RecordedRequest {
            path: "/api/usuarios/7/perfis/conceder/".to_owned(),
            operator: Some("admin".to_owned()),
            body: json!({"perfil_ids": [2, 3], "observacoes": "nomeação 12/2024"}),
        }]
    );
}

#[tokio::test]
async fn revoking_last_profile_is_recognized() {
    let base_url = spawn_backend(state_with_user(7, &[1])).await;

    let result = directory(base_url)
        .revoke_profiles(&operator(TOKEN), UserId::new(7), &request(&[1], None))
        .await;

    assert_eq!(
        result,
        Err(AppError::LastActiveProfile(
            "O usuário deve manter pelo menos um perfil ativo.".to_owned()
        ))
    );
}

#[tokio::test]
async fn empty_assignment_is_not_sent() {
    let state = state_with_user(7, &[1]);
    let requests = state.requests.clone();
    let base_url = spawn_backend(state).await;

    let result = directory(base_url)
        .revoke_profiles(&operator(TOKEN), UserId::new(7), &request(&[], None))
        .await;

    assert!(result.is_ok());
    assert!(requests.lock().await.is_empty());
}

#[derive(Default)]
struct RecordingRefresher {
    refreshed: Mutex<Vec<UserId>>,
}

#[async_trait]
impl ProfileListRefresher for RecordingRefresher {
    async fn request_refresh(&self, user_id: UserId) -> AppResult<()> {
        self.refreshed.lock().await.push(user_id);
        Ok(())
    }
}

#[tokio::test]
async fn editing_session_round_trip_against_backend() {
    let state = state_with_user(7, &[1, 2]);
    let requests = state.requests.clone();
    let profiles_by_user = state.profiles_by_user.clone();
    let base_url = spawn_backend(state).await;
    let refresher = Arc::new(RecordingRefresher::default());
    let service = ProfileAssignmentService::new(Arc::new(directory(base_url)), refresher.clone());

    let mut session = service
        .start_session(operator(TOKEN), UserId::new(7))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(session.catalog().len(), 3);
    assert!(matches!(session.toggle_profile(ProfileId::new(1)), Ok(false)));
    assert!(matches!(session.toggle_profile(ProfileId::new(3)), Ok(true)));

    let outcome = session.submit(&service, &AssignmentNotes::none()).await;

    assert!(matches!(outcome, SubmitOutcome::Applied(_)));
    let paths: Vec<String> = requests
        .lock()
        .await
        .iter()
        .map(|request| request.path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/usuarios/7/perfis/revogar/".to_owned(),
            "/api/usuarios/7/perfis/conceder/".to_owned(),
        ]
    );
    assert_eq!(
        profiles_by_user.lock().await.get(&7),
        Some(&BTreeSet::from([2, 3]))
    );
    assert_eq!(*refresher.refreshed.lock().await, vec![UserId::new(7)]);
}

#[tokio::test]
async fn swapping_sole_profile_fails_on_revoke() {
    let state = state_with_user(7, &[1]);
    let requests = state.requests.clone();
    let base_url = spawn_backend(state).await;
    let refresher = Arc::new(RecordingRefresher::default());
    let service = ProfileAssignmentService::new(Arc::new(directory(base_url)), refresher.clone());

    let mut session = service
        .start_session(operator(TOKEN), UserId::new(7))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(session.toggle_profile(ProfileId::new(1)).is_ok());
    assert!(session.toggle_profile(ProfileId::new(2)).is_ok());

    let outcome = session.submit(&service, &AssignmentNotes::none()).await;

    let SubmitOutcome::Failed(failure) = outcome else {
        unreachable!()
    };
    assert!(failure.reason.is_last_active_profile());
    assert_eq!(requests.lock().await.len(), 1);
    assert_eq!(session.snapshot().profile_ids(), &BTreeSet::from([ProfileId::new(1)]));
    assert!(refresher.refreshed.lock().await.is_empty());
    assert!(session.handle().is_current());
}
