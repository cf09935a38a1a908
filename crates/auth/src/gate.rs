//! The authorization gate.
//!
//! Pure decision functions over a session snapshot and a required
//! capability:
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)
//!
//! Every protected view and every mutating engine call consults this gate
//! before proceeding. Denial for a view yields a redirect decision, never a
//! partial render.

use clubdesk_core::{DomainError, DomainResult, UserId};

use crate::{Capability, Role, Session};

/// Outcome for a protected view: render, or bounce to the public surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToPublic,
}

/// `true` iff `session` may exercise `capability`.
///
/// Every capability requires a completed resolution (`ready`) and the admin
/// role; an unready session is denied everything, whatever its role field
/// happens to hold.
pub fn can_access(session: &Session, capability: Capability) -> bool {
    if !session.ready {
        return false;
    }
    match capability {
        Capability::ViewAdminConsole
        | Capability::MutateModerationRecord
        | Capability::ChangeUserRole
        | Capability::DeleteUser => session.role == Role::Admin,
    }
}

/// Target-aware check for capabilities that protect the acting account.
///
/// For `ChangeUserRole` and `DeleteUser` the target may never be the acting
/// identity itself; relying on a disabled control in the UI is not a safety
/// guarantee, so the rule is enforced here.
pub fn can_access_target(session: &Session, capability: Capability, target: UserId) -> bool {
    if !can_access(session, capability) {
        return false;
    }
    if capability.protects_target() && session.user_id() == Some(target) {
        return false;
    }
    true
}

/// `can_access` as a fallible check for mutating call sites.
pub fn authorize(session: &Session, capability: Capability) -> DomainResult<()> {
    if can_access(session, capability) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// `can_access_target` as a fallible check for mutating call sites.
pub fn authorize_target(
    session: &Session,
    capability: Capability,
    target: UserId,
) -> DomainResult<()> {
    if can_access_target(session, capability, target) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Decision for a protected view.
pub fn decide(session: &Session, capability: Capability) -> AccessDecision {
    if can_access(session, capability) {
        AccessDecision::Allow
    } else {
        AccessDecision::RedirectToPublic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Identity;

    fn admin_session() -> Session {
        let identity = Identity::new(UserId::new(), "chair@club.example");
        Session::signed_in(identity, Role::Admin)
    }

    #[test]
    fn unready_session_is_denied_every_capability() {
        let mut session = admin_session();
        session.ready = false;
        for capability in Capability::ALL {
            assert!(!can_access(&session, capability));
        }
    }

    #[test]
    fn non_admin_roles_are_denied_every_capability() {
        for role in [Role::User, Role::Member] {
            let session = Session::signed_in(Identity::new(UserId::new(), "m@club.example"), role);
            for capability in Capability::ALL {
                assert!(!can_access(&session, capability));
            }
        }
    }

    #[test]
    fn admin_is_granted_every_capability() {
        let session = admin_session();
        for capability in Capability::ALL {
            assert!(can_access(&session, capability));
        }
    }

    #[test]
    fn self_target_is_rejected_for_protected_capabilities() {
        let session = admin_session();
        let own_id = session.user_id().unwrap();

        for capability in [Capability::ChangeUserRole, Capability::DeleteUser] {
            assert!(!can_access_target(&session, capability, own_id));
            assert_eq!(
                authorize_target(&session, capability, own_id),
                Err(DomainError::Unauthorized)
            );
        }

        // A different target passes.
        assert!(can_access_target(&session, Capability::DeleteUser, UserId::new()));
    }

    #[test]
    fn denial_yields_a_redirect_decision() {
        let session = Session::signed_out();
        assert_eq!(
            decide(&session, Capability::ViewAdminConsole),
            AccessDecision::RedirectToPublic
        );
        assert_eq!(
            decide(&admin_session(), Capability::ViewAdminConsole),
            AccessDecision::Allow
        );
    }
}
