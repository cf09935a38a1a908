//! Ordered role-resolution policy.
//!
//! The allowlist-overrides-stored-document ordering is a trust boundary, so
//! it is expressed as a fixed chain of `(predicate, role provider)` rules
//! evaluated in order, not as scattered conditionals. The caller gathers the
//! evidence (allowlist membership first, and the stored document only when
//! that misses) and feeds it through the chain.

use crate::Role;

/// Evidence gathered for one role resolution.
///
/// `stored` is `None` both when no document exists and when the read failed;
/// either way the chain falls through to the least-privilege default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleEvidence {
    pub allowlisted: bool,
    pub stored: Option<Role>,
}

type Predicate = fn(&RoleEvidence) -> bool;
type Provider = fn(&RoleEvidence) -> Role;

fn is_allowlisted(e: &RoleEvidence) -> bool {
    e.allowlisted
}

fn allowlist_role(_: &RoleEvidence) -> Role {
    Role::Admin
}

fn has_stored_role(e: &RoleEvidence) -> bool {
    e.stored.is_some()
}

fn stored_role(e: &RoleEvidence) -> Role {
    e.stored.unwrap_or_default()
}

fn always(_: &RoleEvidence) -> bool {
    true
}

fn default_role(_: &RoleEvidence) -> Role {
    Role::User
}

/// The resolution chain, highest precedence first. The final rule is a
/// catch-all, so the chain is total.
const RESOLUTION_CHAIN: &[(Predicate, Provider)] = &[
    (is_allowlisted, allowlist_role),
    (has_stored_role, stored_role),
    (always, default_role),
];

/// Resolve a role from gathered evidence. Pure, total, no I/O.
pub fn resolve_role(evidence: &RoleEvidence) -> Role {
    for (applies, provide) in RESOLUTION_CHAIN {
        if applies(evidence) {
            return provide(evidence);
        }
    }
    Role::User
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_wins_over_conflicting_stored_role() {
        let evidence = RoleEvidence {
            allowlisted: true,
            stored: Some(Role::User),
        };
        assert_eq!(resolve_role(&evidence), Role::Admin);
    }

    #[test]
    fn stored_role_wins_over_default() {
        let evidence = RoleEvidence {
            allowlisted: false,
            stored: Some(Role::Member),
        };
        assert_eq!(resolve_role(&evidence), Role::Member);
    }

    #[test]
    fn missing_evidence_degrades_to_least_privilege() {
        let evidence = RoleEvidence {
            allowlisted: false,
            stored: None,
        };
        assert_eq!(resolve_role(&evidence), Role::User);
    }
}
