use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privilege levels attached to a user account, highest first.
///
/// Every privilege or scope decision in the application compares roles
/// through this type rather than raw strings; [`Role::privilege`] gives the
/// ordered value, so comparisons answer "does A outrank B".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SupremeAdmin,
    Admin,
    UniversityAdmin,
    SeniorLeadership,
    Dean,
    Manager,
    TeamMember,
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SupremeAdmin,
        Role::Admin,
        Role::UniversityAdmin,
        Role::SeniorLeadership,
        Role::Dean,
        Role::Manager,
        Role::TeamMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SupremeAdmin => "supreme_admin",
            Role::Admin => "admin",
            Role::UniversityAdmin => "university_admin",
            Role::SeniorLeadership => "senior_leadership",
            Role::Dean => "dean",
            Role::Manager => "manager",
            Role::TeamMember => "team_member",
        }
    }

    /// True for the two roles with organization/user management privileges.
    pub fn is_admin_level(&self) -> bool {
        matches!(self, Role::SupremeAdmin | Role::Admin)
    }

    /// Numeric privilege, higher means more powerful. Used where an ordered
    /// value reads better than variant comparison.
    pub fn privilege(&self) -> u8 {
        match self {
            Role::SupremeAdmin => 7,
            Role::Admin => 6,
            Role::UniversityAdmin => 5,
            Role::SeniorLeadership => 4,
            Role::Dean => 3,
            Role::Manager => 2,
            Role::TeamMember => 1,
        }
    }

    /// Roles an `admin` caller is allowed to assign: everything strictly
    /// below `admin` in the hierarchy.
    pub fn is_admin_assignable(&self) -> bool {
        self.privilege() < Role::Admin.privilege()
    }

    /// Parse a role string, accepting the legacy two-role scheme.
    ///
    /// Older route variants stored `admin`/`staff`; the compatibility table
    /// lives here and nowhere else so handlers never see legacy values.
    pub fn parse_compat(s: &str) -> Result<Role, RoleParseError> {
        match s {
            "staff" => Ok(Role::TeamMember),
            other => other.parse(),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supreme_admin" => Ok(Role::SupremeAdmin),
            "admin" => Ok(Role::Admin),
            "university_admin" => Ok(Role::UniversityAdmin),
            "senior_leadership" => Ok(Role::SeniorLeadership),
            "dean" => Ok(Role::Dean),
            "manager" => Ok(Role::Manager),
            "team_member" => Ok(Role::TeamMember),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
