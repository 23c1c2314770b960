use fiscalia_application::{AssignmentConfirmation, ProfileAssignmentRequest};
use fiscalia_core::{AppError, AppResult};
use fiscalia_domain::{Profile, ProfileId, UserId, UserProfileInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub(super) struct ProfileResponse {
    id: ProfileId,
    #[serde(alias = "nome", default)]
    name: String,
    #[serde(alias = "ativo", default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

/// Profile listing, either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProfileListResponse {
    Plain(Vec<ProfileResponse>),
    Paginated { results: Vec<ProfileResponse> },
}

impl ProfileListResponse {
    /// Converts the listing; invalid inactive entries are skipped.
    pub(super) fn into_profiles(self) -> AppResult<Vec<Profile>> {
        let items = match self {
            Self::Plain(items) | Self::Paginated { results: items } => items,
        };

        let mut profiles = Vec::with_capacity(items.len());
        for item in items {
            match Profile::new(item.id, item.name, item.active) {
                Ok(profile) => profiles.push(profile),
                Err(error) if !item.active => {
                    warn!(
                        profile_id = %item.id,
                        error = %error,
                        "skipping invalid inactive profile in backend listing"
                    );
                }
                Err(error) => {
                    return Err(AppError::Internal(format!(
                        "profile '{}' in backend listing is invalid: {error}",
                        item.id
                    )));
                }
            }
        }

        Ok(profiles)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserProfileInfoResponse {
    id: UserId,
    nome: String,
    email: Option<String>,
    matricula: Option<String>,
    #[serde(default)]
    perfis: Vec<String>,
    #[serde(default)]
    perfil_ids: Vec<ProfileId>,
    perfis_texto: Option<String>,
}

impl From<UserProfileInfoResponse> for UserProfileInfo {
    fn from(value: UserProfileInfoResponse) -> Self {
        Self {
            user_id: value.id,
            name: value.nome,
            email: value.email.filter(|email| !email.trim().is_empty()),
            registration: value.matricula.filter(|number| !number.trim().is_empty()),
            profile_names: value.perfis,
            profile_ids: value.perfil_ids,
            profiles_text: value.perfis_texto,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileAssignmentBody {
    perfil_ids: Vec<ProfileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observacoes: Option<String>,
}

impl From<&ProfileAssignmentRequest> for ProfileAssignmentBody {
    fn from(value: &ProfileAssignmentRequest) -> Self {
        Self {
            perfil_ids: value.profile_ids.iter().copied().collect(),
            observacoes: value.notes.as_deref().map(str::to_owned),
        }
    }
}

/// Reads the optional confirmation body of a grant or revoke call.
///
/// The call already succeeded, so an unreadable body only loses the details.
pub(super) fn confirmation_from_body(user_id: UserId, body: &str) -> AssignmentConfirmation {
    let value = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);

    let profile_ids = value
        .get("perfil_ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_i64)
                .map(ProfileId::new)
                .collect()
        });

    AssignmentConfirmation {
        user_id,
        profile_ids,
        message: message_from_value(&value),
    }
}

const MESSAGE_KEYS: &[&str] = &["detail", "error", "message", "mensagem"];

/// Extracts the human-readable message from a backend JSON body.
pub(super) fn message_from_value(value: &Value) -> Option<String> {
    let object = value.as_object()?;

    MESSAGE_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .chain(object.get("non_field_errors"))
        .find_map(first_text)
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
