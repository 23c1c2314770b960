//! Fiscalia operator tool for user access profiles.

#![forbid(unsafe_code)]

mod profiles_config;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fiscalia_application::{ProfileAssignmentService, ProfileEditingSession, SubmitOutcome};
use fiscalia_core::{AppError, AppResult, OperatorSession};
use fiscalia_domain::{AssignmentNotes, ProfileId, ReconciliationDelta, UserId};
use fiscalia_infrastructure::{HttpProfileDirectory, LoggingListRefresher};
use tracing::info;

use crate::profiles_config::{ProfilesConfig, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "fiscalia-profiles", about = "Inspect and edit user access profiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists the active profiles that can be granted.
    Catalog,
    /// Shows the profiles a user currently holds.
    Show {
        /// User identifier.
        user_id: i64,
    },
    /// Replaces the user's profiles with exactly the given set.
    Set {
        /// User identifier.
        user_id: i64,
        /// Profile to keep or grant; repeat for several.
        #[arg(short = 'p', long = "profile")]
        profiles: Vec<i64>,
        /// Justification recorded with the change.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Flips the given profiles on top of the user's current ones.
    Toggle {
        /// User identifier.
        user_id: i64,
        /// Profile to flip; repeat for several.
        #[arg(short = 'p', long = "profile", required = true)]
        profiles: Vec<i64>,
        /// Justification recorded with the change.
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ProfilesConfig::load()?;
    let operator = OperatorSession::new(config.operator.as_str(), config.access_token.as_str())?;
    let service = build_service(&config)?;

    info!(
        operator = %operator.subject(),
        api_base_url = %config.api_base_url,
        "fiscalia-profiles started"
    );

    match cli.command {
        Command::Catalog => print_catalog(&service, &operator).await,
        Command::Show { user_id } => show_user(&service, &operator, UserId::new(user_id)).await,
        Command::Set {
            user_id,
            profiles,
            notes,
        } => {
            let mut session = open_session(&service, operator, UserId::new(user_id)).await?;
            let desired: Vec<ProfileId> = profiles.into_iter().map(ProfileId::new).collect();

            let dropped: Vec<ProfileId> = session
                .selection()
                .ids()
                .iter()
                .copied()
                .filter(|profile_id| !desired.contains(profile_id))
                .collect();
            for profile_id in dropped {
                session.remove_profile(profile_id);
            }
            for profile_id in desired {
                if !session.selection().contains(profile_id) {
                    session.toggle_profile(profile_id)?;
                }
            }

            submit(&service, &mut session, notes).await
        }
        Command::Toggle {
            user_id,
            profiles,
            notes,
        } => {
            let mut session = open_session(&service, operator, UserId::new(user_id)).await?;
            for profile_id in profiles {
                session.toggle_profile(ProfileId::new(profile_id))?;
            }

            submit(&service, &mut session, notes).await
        }
    }
}

fn build_service(config: &ProfilesConfig) -> AppResult<ProfileAssignmentService> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let directory = Arc::new(HttpProfileDirectory::new(
        http_client,
        config.api_base_url.as_str(),
        config.read_attempts,
        config.retry_backoff_ms,
    ));

    Ok(ProfileAssignmentService::new(
        directory,
        Arc::new(LoggingListRefresher),
    ))
}

async fn print_catalog(
    service: &ProfileAssignmentService,
    operator: &OperatorSession,
) -> AppResult<ExitCode> {
    let catalog = service.load_catalog(operator).await?;

    if catalog.is_empty() {
        println!("No profiles available.");
    }
    for profile in catalog.profiles() {
        println!("{:>6}  {}", profile.id().value(), profile.name());
    }

    Ok(ExitCode::SUCCESS)
}

async fn show_user(
    service: &ProfileAssignmentService,
    operator: &OperatorSession,
    user_id: UserId,
) -> AppResult<ExitCode> {
    let info = service.load_user_info(operator, user_id).await?;

    let Some(info) = info else {
        println!("User {user_id} has no profiles yet.");
        return Ok(ExitCode::SUCCESS);
    };

    println!("User:         {} ({})", info.name, info.user_id);
    if let Some(email) = &info.email {
        println!("Email:        {email}");
    }
    if let Some(registration) = &info.registration {
        println!("Registration: {registration}");
    }
    println!("Profiles:     {}", info.profiles_summary());
    if info.snapshot().is_degraded() {
        println!("Warning: this user holds no profile and must be given at least one.");
    }

    Ok(ExitCode::SUCCESS)
}

async fn open_session(
    service: &ProfileAssignmentService,
    operator: OperatorSession,
    user_id: UserId,
) -> AppResult<ProfileEditingSession> {
    let session = service.start_session(operator, user_id).await?;

    if let Some(error) = session.catalog_error() {
        println!("No profiles available: {error}");
    }
    if session.snapshot().is_degraded() {
        println!("Warning: user {user_id} currently holds no profile.");
    }

    Ok(session)
}

async fn submit(
    service: &ProfileAssignmentService,
    session: &mut ProfileEditingSession,
    notes: Option<String>,
) -> AppResult<ExitCode> {
    let notes = AssignmentNotes::new(notes)?;
    print_delta(&session.pending_delta());

    let outcome = session.submit(service, &notes).await;
    println!("{}", outcome.operator_message());

    match outcome {
        SubmitOutcome::Failed(_) => Ok(ExitCode::FAILURE),
        SubmitOutcome::NoChanges | SubmitOutcome::Applied(_) => Ok(ExitCode::SUCCESS),
    }
}

fn print_delta(delta: &ReconciliationDelta) {
    let render = |ids: &std::collections::BTreeSet<ProfileId>| {
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    if !delta.to_revoke.is_empty() {
        println!("Revoking: {}", render(&delta.to_revoke));
    }
    if !delta.to_grant.is_empty() {
        println!("Granting: {}", render(&delta.to_grant));
    }
}
