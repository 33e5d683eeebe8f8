use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::error::SessionError;

/// Roles as assigned by the platform's auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SecurityOps,
    Employer,
    Candidate,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SecurityOps => "security_ops",
            Role::Employer => "employer",
            Role::Candidate => "candidate",
        }
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "security_ops" => Ok(Role::SecurityOps),
            "employer" => Ok(Role::Employer),
            "candidate" => Ok(Role::Candidate),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}

/// Roles allowed into the security operations surface.
pub const CONSOLE_ROLES: [Role; 2] = [Role::Admin, Role::SecurityOps];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Explicit session capability, created once at the composition root and
/// injected into every handler. Authentication itself lives in the backend;
/// this object only gates the console and carries session-scoped flags.
pub struct Session {
    user: CurrentUser,
    started_at: DateTime<Utc>,
    revoked: AtomicBool,
    dismissed: DashSet<String>,
}

impl Session {
    pub fn new(user: CurrentUser) -> Self {
        Self {
            user,
            started_at: Utc::now(),
            revoked: AtomicBool::new(false),
            dismissed: DashSet::new(),
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        !self.revoked.load(Ordering::SeqCst)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user.role == role
    }

    /// Gate an operation on the session being live and the user holding one
    /// of the given roles. Revocation and insufficient role are reported
    /// separately so the surface can offer re-auth vs. nothing.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::Revoked);
        }
        if roles.iter().any(|role| self.has_role(*role)) {
            return Ok(());
        }
        let required = roles
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(SessionError::Forbidden { required })
    }

    pub fn logout(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    /// Record a session-scoped dismissal flag. Returns true the first time
    /// the flag is set.
    pub fn dismiss(&self, flag: &str) -> bool {
        self.dismissed.insert(flag.to_string())
    }

    pub fn is_dismissed(&self, flag: &str) -> bool {
        self.dismissed.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(role: Role) -> Session {
        Session::new(CurrentUser {
            id: Uuid::new_v4(),
            email: "ops@talentgrid.local".to_string(),
            role,
        })
    }

    #[test]
    fn console_roles_pass_the_gate() {
        let session = session_with(Role::SecurityOps);
        assert!(session.require_any(&CONSOLE_ROLES).is_ok());

        let session = session_with(Role::Admin);
        assert!(session.require_any(&CONSOLE_ROLES).is_ok());
    }

    #[test]
    fn candidate_is_refused_with_forbidden() {
        let session = session_with(Role::Candidate);
        match session.require_any(&CONSOLE_ROLES) {
            Err(SessionError::Forbidden { required }) => {
                assert!(required.contains("security_ops"));
            }
            other => panic!("expected Forbidden, got {:?}", other.err()),
        }
    }

    #[test]
    fn logout_revokes_every_subsequent_check() {
        let session = session_with(Role::Admin);
        session.logout();
        assert!(matches!(
            session.require_any(&CONSOLE_ROLES),
            Err(SessionError::Revoked)
        ));
        assert!(!session.is_active());
    }

    #[test]
    fn dismissal_flags_are_once_per_session() {
        let session = session_with(Role::Candidate);
        assert!(!session.is_dismissed("profile-completion-prompt"));
        assert!(session.dismiss("profile-completion-prompt"));
        assert!(!session.dismiss("profile-completion-prompt"));
        assert!(session.is_dismissed("profile-completion-prompt"));
    }

    #[test]
    fn role_parses_from_config_strings() {
        assert_eq!("security_ops".parse::<Role>().unwrap(), Role::SecurityOps);
        assert!("superuser".parse::<Role>().is_err());
    }
}
