//! Invitation codes and links.
//!
//! Three kinds of code exist:
//!
//! - `manager_<id>_<token>` - a manager's permanent, reusable waiter link.
//!   Not stored in `invitations`; validated against the link cached on the
//!   manager's user row.
//! - `admin_manager_<token>` - a one-shot code issued by the admin that
//!   promotes its redeemer to manager. Stored in `invitations`.
//! - anything else - a legacy one-shot waiter code looked up verbatim in
//!   `invitations`.

use sqlx::PgPool;
use tablecraft_core::{Role, UserId};

use crate::db::{ConversationState, InvitationRepository, PendingRegistration, UserRepository};
use crate::error::AppError;

const TOKEN_LENGTH: usize = 8;
const MANAGER_PREFIX: &str = "manager_";
const ADMIN_MANAGER_PREFIX: &str = "admin_manager_";
const START_PAYLOAD_PREFIX: &str = "invite_";

/// A syntactically classified invitation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedInvite {
    /// A manager's reusable waiter link code.
    ManagerLink { manager_id: UserId },
    /// An admin-issued one-shot manager invitation.
    AdminManager,
    /// A bare one-shot waiter code.
    Legacy,
}

/// Classify an invitation code by shape alone; no database access.
///
/// An `invite_` prefix (as carried in `/start` deep-link payloads) is
/// stripped first. A `manager_` code with a malformed ID falls through to
/// `Legacy`, where the verbatim lookup will reject it.
#[must_use]
pub fn decode_invite(code: &str) -> (DecodedInvite, &str) {
    let code = code.strip_prefix(START_PAYLOAD_PREFIX).unwrap_or(code);

    if code.starts_with(ADMIN_MANAGER_PREFIX) {
        return (DecodedInvite::AdminManager, code);
    }
    if let Some(rest) = code.strip_prefix(MANAGER_PREFIX)
        && let Some((id, _token)) = rest.split_once('_')
        && let Ok(id) = id.parse::<i32>()
    {
        return (
            DecodedInvite::ManagerLink {
                manager_id: UserId::new(id),
            },
            code,
        );
    }
    (DecodedInvite::Legacy, code)
}

/// Whether a stored waiter link vouches for a presented code.
///
/// The check is literal containment of the full deep-link payload, so a
/// code forged with another manager's ID never matches the token half
/// stored in that manager's link.
#[must_use]
pub fn manager_link_matches(stored_link: &str, code: &str) -> bool {
    stored_link.contains(&format!("{START_PAYLOAD_PREFIX}{code}"))
}

/// The Telegram deep link that delivers a code to the bot.
#[must_use]
pub fn start_link(bot_username: &str, code: &str) -> String {
    format!("https://t.me/{bot_username}?start={START_PAYLOAD_PREFIX}{code}")
}

fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            char::from(CHARSET[idx])
        })
        .collect()
}

/// Get a manager's permanent waiter link, creating it on first use.
///
/// Creation races are resolved in the database: whichever caller writes
/// first wins and everyone returns the stored link.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the manager row vanished.
pub async fn get_or_create_waiter_link(
    pool: &PgPool,
    manager: &crate::db::User,
    bot_username: &str,
) -> Result<String, AppError> {
    if let Some(link) = &manager.waiter_link {
        return Ok(link.clone());
    }
    let code = format!("{MANAGER_PREFIX}{}_{}", manager.id.as_i32(), generate_token());
    let link = start_link(bot_username, &code);
    let stored = UserRepository::new(pool)
        .claim_waiter_link(manager.id, &link)
        .await?;
    Ok(stored)
}

/// Issue a one-shot manager invitation, returning the deep link to share.
///
/// # Errors
///
/// Returns `AppError::Database` if persisting the code fails.
pub async fn create_admin_manager_invite(
    pool: &PgPool,
    issued_by: UserId,
    bot_username: &str,
) -> Result<String, AppError> {
    let code = format!("{ADMIN_MANAGER_PREFIX}{}", generate_token());
    let invitation = InvitationRepository::new(pool).create(&code, issued_by).await?;
    Ok(start_link(bot_username, &invitation.code))
}

/// Validate an invitation code against the database and decide what the
/// redeemer will become. The returned registration is carried through the
/// bot dialogue and finally consumed by provisioning.
///
/// # Errors
///
/// Returns `AppError::InvalidInvitation` for unknown, spent, or forged
/// codes.
pub async fn resolve_invite(pool: &PgPool, raw_code: &str) -> Result<PendingRegistration, AppError> {
    let (decoded, code) = decode_invite(raw_code.trim());
    match decoded {
        DecodedInvite::ManagerLink { manager_id } => {
            let manager = UserRepository::new(pool)
                .get(manager_id)
                .await?
                .filter(|u| u.role == Role::Manager && u.is_active)
                .ok_or(AppError::InvalidInvitation)?;
            let link = manager.waiter_link.as_deref().ok_or(AppError::InvalidInvitation)?;
            if !manager_link_matches(link, code) {
                return Err(AppError::InvalidInvitation);
            }
            Ok(PendingRegistration {
                role: Role::Waiter,
                manager_id: Some(manager.id),
                invitation_id: None,
            })
        }
        DecodedInvite::AdminManager => {
            let invitation = InvitationRepository::new(pool)
                .get_by_code_unused(code)
                .await?
                .ok_or(AppError::InvalidInvitation)?;
            Ok(PendingRegistration {
                role: Role::Manager,
                manager_id: None,
                invitation_id: Some(invitation.id),
            })
        }
        DecodedInvite::Legacy => {
            let invitation = InvitationRepository::new(pool)
                .get_by_code_unused(code)
                .await?
                .ok_or(AppError::InvalidInvitation)?;
            Ok(PendingRegistration {
                role: Role::Waiter,
                manager_id: Some(invitation.manager_id),
                invitation_id: Some(invitation.id),
            })
        }
    }
}

/// The state a chat should enter after a successful invite resolution.
#[must_use]
pub fn registration_state(registration: PendingRegistration) -> ConversationState {
    ConversationState::AwaitingUsername { registration }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_codes_decode_with_their_id() {
        let (decoded, code) = decode_invite("manager_42_A1B2C3D4");
        assert_eq!(
            decoded,
            DecodedInvite::ManagerLink {
                manager_id: UserId::new(42)
            }
        );
        assert_eq!(code, "manager_42_A1B2C3D4");
    }

    #[test]
    fn start_payload_prefix_is_stripped() {
        let (decoded, code) = decode_invite("invite_manager_42_A1B2C3D4");
        assert_eq!(
            decoded,
            DecodedInvite::ManagerLink {
                manager_id: UserId::new(42)
            }
        );
        assert_eq!(code, "manager_42_A1B2C3D4");
    }

    #[test]
    fn admin_manager_codes_win_over_manager_parsing() {
        let (decoded, _) = decode_invite("admin_manager_A1B2C3D4");
        assert_eq!(decoded, DecodedInvite::AdminManager);
    }

    #[test]
    fn malformed_manager_code_falls_back_to_legacy() {
        assert_eq!(decode_invite("manager_abc_XYZ").0, DecodedInvite::Legacy);
        assert_eq!(decode_invite("manager_").0, DecodedInvite::Legacy);
        assert_eq!(decode_invite("SOMECODE").0, DecodedInvite::Legacy);
    }

    #[test]
    fn link_matching_is_literal_containment() {
        let link = start_link("tablecraft_bot", "manager_42_A1B2C3D4");
        assert!(manager_link_matches(&link, "manager_42_A1B2C3D4"));
        // Forged ID with someone else's token half does not appear in the link.
        assert!(!manager_link_matches(&link, "manager_7_A1B2C3D4"));
        assert!(!manager_link_matches(&link, "manager_42_ZZZZZZZZ"));
    }

    #[test]
    fn start_link_shape() {
        assert_eq!(
            start_link("tablecraft_bot", "admin_manager_A1B2C3D4"),
            "https://t.me/tablecraft_bot?start=invite_admin_manager_A1B2C3D4"
        );
    }

    #[test]
    fn tokens_are_short_and_uppercase() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
