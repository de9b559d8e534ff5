//! Reply-keyboard layouts per role.
//!
//! Button labels double as message matchers in the handlers, so they
//! live here as constants rather than inline strings.

use tablecraft_core::Role;

use crate::telegram::types::ReplyMarkup;

pub const INVITE_MANAGER: &str = "👥 Invite a manager";
pub const STATISTICS: &str = "📊 Statistics";

pub const INVITATION_LINK: &str = "🔗 Invitation link";
pub const MY_WAITERS: &str = "👥 My waiters";
pub const WAITER_STATISTICS: &str = "📊 Waiter statistics";
pub const WORK_WITH_MENU: &str = "🍽 Work with menu";
pub const CREATE_RESTAURANT: &str = "🏠 Create a restaurant";

pub const MENU: &str = "🍽 Menu";

pub const REGISTER_MANAGER: &str = "👑 Register as a manager";
pub const HAVE_INVITE: &str = "📝 I have an invite code";

/// Keyboard shown to a registered user, by role.
#[must_use]
pub fn for_role(role: Role) -> ReplyMarkup {
    match role {
        Role::Admin => ReplyMarkup::keyboard(&[&[INVITE_MANAGER, STATISTICS]]),
        Role::Manager => ReplyMarkup::keyboard(&[
            &[INVITATION_LINK, MY_WAITERS],
            &[WAITER_STATISTICS, WORK_WITH_MENU],
            &[CREATE_RESTAURANT],
        ]),
        Role::Waiter => ReplyMarkup::keyboard(&[&[MENU]]),
    }
}

/// Keyboard shown to an unregistered user on `/start` without a payload.
/// Both registration paths are offered: manager self-signup and
/// invitation-based signup.
#[must_use]
pub fn unregistered() -> ReplyMarkup {
    ReplyMarkup::keyboard(&[&[REGISTER_MANAGER], &[HAVE_INVITE]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_keyboard_has_three_rows() {
        let ReplyMarkup::Keyboard(markup) = for_role(Role::Manager) else {
            panic!("expected a keyboard");
        };
        assert_eq!(markup.keyboard.len(), 3);
        assert!(markup.resize_keyboard);
    }

    #[test]
    fn unregistered_keyboard_offers_both_registration_paths() {
        let ReplyMarkup::Keyboard(markup) = unregistered() else {
            panic!("expected a keyboard");
        };
        assert_eq!(markup.keyboard.len(), 2);
        assert_eq!(markup.keyboard[0][0].text, REGISTER_MANAGER);
        assert_eq!(markup.keyboard[1][0].text, HAVE_INVITE);
    }

    #[test]
    fn waiter_keyboard_only_offers_the_menu() {
        let ReplyMarkup::Keyboard(markup) = for_role(Role::Waiter) else {
            panic!("expected a keyboard");
        };
        assert_eq!(markup.keyboard.len(), 1);
        assert_eq!(markup.keyboard[0].len(), 1);
        assert_eq!(markup.keyboard[0][0].text, MENU);
    }
}
