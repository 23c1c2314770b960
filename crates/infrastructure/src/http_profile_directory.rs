use std::time::Duration;

use async_trait::async_trait;
use fiscalia_application::{
    AssignmentConfirmation, AssignmentOperation, ProfileAssignmentRequest, ProfileDirectory,
};
use fiscalia_core::{AppError, AppResult, OperatorSession};
use fiscalia_domain::{Profile, UserId, UserProfileInfo};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

mod errors;
mod wire;

#[cfg(test)]
mod tests;

use errors::{error_from_response, is_transient_status};
use wire::{
    ProfileAssignmentBody, ProfileListResponse, UserProfileInfoResponse, confirmation_from_body,
};

const OPERATOR_HEADER: &str = "x-fiscalia-operator";

/// HTTP adapter for the user-administration backend.
pub struct HttpProfileDirectory {
    http_client: reqwest::Client,
    base_url: String,
    read_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpProfileDirectory {
    /// Creates a new directory client.
    ///
    /// Reads are retried on transport failures, 429 and 5xx responses.
    /// Grant and revoke calls are sent once.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        read_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            read_attempts: read_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn profiles_endpoint(&self) -> String {
        format!("{}/api/perfis/", self.base_url)
    }

    fn user_profiles_endpoint(&self, user_id: UserId) -> String {
        format!("{}/api/usuarios/{user_id}/perfis/", self.base_url)
    }

    fn assignment_endpoint(&self, user_id: UserId, operation: AssignmentOperation) -> String {
        let action = match operation {
            AssignmentOperation::Grant => "conceder",
            AssignmentOperation::Revoke => "revogar",
        };
        format!("{}/api/usuarios/{user_id}/perfis/{action}/", self.base_url)
    }

    async fn get_json<T>(&self, session: &OperatorSession, endpoint: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.read_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .get(endpoint)
                .bearer_auth(session.access_token())
                .header(OPERATOR_HEADER, session.subject())
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await.map_err(|error| {
                        AppError::Unavailable(format!(
                            "failed to read response body from '{endpoint}': {error}"
                        ))
                    })?;
                    return serde_json::from_str::<T>(&body).map_err(|error| {
                        AppError::Internal(format!(
                            "failed to parse response body from '{endpoint}': {error}"
                        ))
                    });
                }
                Ok(response) if is_transient_status(response.status()) => {
                    last_error = Some(format!(
                        "transient HTTP status {} from '{endpoint}'",
                        response.status()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(error_from_response(status, &body));
                }
                Err(error) => {
                    last_error = Some(format!("transport error calling '{endpoint}': {error}"));
                }
            }

            if attempt < self.read_attempts {
                warn!(
                    endpoint,
                    attempt,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying backend read"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Unavailable(last_error.unwrap_or_else(|| {
            format!("backend read from '{endpoint}' exhausted retries")
        })))
    }

    async fn send_assignment(
        &self,
        session: &OperatorSession,
        user_id: UserId,
        operation: AssignmentOperation,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation> {
        if request.profile_ids.is_empty() {
            debug!(
                user_id = %user_id,
                operation = operation.as_str(),
                "empty profile assignment, no request sent"
            );
            return Ok(AssignmentConfirmation {
                user_id,
                profile_ids: None,
                message: None,
            });
        }

        let endpoint = self.assignment_endpoint(user_id, operation);
        let response = self
            .http_client
            .post(endpoint.as_str())
            .bearer_auth(session.access_token())
            .header(OPERATOR_HEADER, session.subject())
            .json(&ProfileAssignmentBody::from(request))
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to call profile {} endpoint: {error}",
                    operation.as_str()
                ))
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        Ok(confirmation_from_body(user_id, &body))
    }
}

#[async_trait]
impl ProfileDirectory for HttpProfileDirectory {
    async fn list_profiles(&self, session: &OperatorSession) -> AppResult<Vec<Profile>> {
        self.get_json::<ProfileListResponse>(session, &self.profiles_endpoint())
            .await?
            .into_profiles()
    }

    async fn get_user_profile_info(
        &self,
        session: &OperatorSession,
        user_id: UserId,
    ) -> AppResult<UserProfileInfo> {
        self.get_json::<UserProfileInfoResponse>(session, &self.user_profiles_endpoint(user_id))
            .await
            .map(UserProfileInfo::from)
    }

    async fn grant_profiles(
        &self,
        session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation> {
        self.send_assignment(session, user_id, AssignmentOperation::Grant, request)
            .await
    }

    async fn revoke_profiles(
        &self,
        session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation> {
        self.send_assignment(session, user_id, AssignmentOperation::Revoke, request)
            .await
    }
}
