use fiscalia_core::AppError;
use reqwest::StatusCode;
use serde_json::Value;

use super::wire::message_from_value;

/// Error code the backend attaches to last-profile rejections.
const LAST_ACTIVE_PROFILE_CODE: &str = "ultimo_perfil_ativo";

const LAST_ACTIVE_PROFILE_PHRASES: &[&str] = &[
    "pelo menos um perfil",
    "ao menos um perfil",
    "at least one profile",
    "at least one active profile",
];

const MAX_RAW_BODY_MESSAGE: usize = 300;

/// Returns whether a status is worth retrying for idempotent reads.
pub(super) fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Maps a non-success backend response onto the application error categories.
pub(super) fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let value = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    let message = message_from_value(&value)
        .or_else(|| raw_body_message(body))
        .unwrap_or_else(|| format!("backend returned status {}", status.as_u16()));

    if is_last_active_profile_rejection(status, &value, &message) {
        return AppError::LastActiveProfile(message);
    }

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        status if is_transient_status(status) => AppError::Unavailable(message),
        _ => AppError::Internal(message),
    }
}

fn is_last_active_profile_rejection(status: StatusCode, value: &Value, message: &str) -> bool {
    if !matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        return false;
    }

    let has_code = value
        .get("code")
        .and_then(Value::as_str)
        .is_some_and(|code| code.eq_ignore_ascii_case(LAST_ACTIVE_PROFILE_CODE));
    if has_code {
        return true;
    }

    let message = message.to_lowercase();
    LAST_ACTIVE_PROFILE_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

fn raw_body_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() || body.starts_with('{') || body.starts_with('<') {
        return None;
    }

    Some(body.chars().take(MAX_RAW_BODY_MESSAGE).collect())
}

#[cfg(test)]
mod tests {
    use fiscalia_core::AppError;
    use reqwest::StatusCode;

    use super::error_from_response;

    #[test]
    fn last_profile_phrase_is_recognized() {
        let error = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "O usuário deve manter pelo menos um perfil ativo."}"#,
        );

        assert_eq!(
            error,
            AppError::LastActiveProfile("O usuário deve manter pelo menos um perfil ativo.".to_owned())
        );
    }

    #[test]
    fn last_profile_code_is_recognized() {
        let error = error_from_response(
            StatusCode::CONFLICT,
            r#"{"code": "ultimo_perfil_ativo", "mensagem": "Operação não permitida"}"#,
        );

        assert!(matches!(error, AppError::LastActiveProfile(_)));
    }

    #[test]
    fn last_profile_phrase_on_server_error_stays_unavailable() {
        let error = error_from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"detail": "at least one profile"}"#,
        );

        assert!(matches!(error, AppError::Unavailable(_)));
    }

    #[test]
    fn field_errors_become_validation_messages() {
        let error = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"non_field_errors": ["Perfil inexistente: 9"]}"#,
        );

        assert_eq!(error, AppError::Validation("Perfil inexistente: 9".to_owned()));
    }

    #[test]
    fn missing_body_uses_status_message() {
        assert_eq!(
            error_from_response(StatusCode::NOT_FOUND, ""),
            AppError::NotFound("backend returned status 404".to_owned())
        );
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, "<html>denied</html>"),
            AppError::Forbidden(_)
        ));
    }
}
