pub mod policy;
pub mod role;
pub mod ticket;

use serde::{Deserialize, Serialize};

pub use role::Role;
pub use ticket::{NoteType, TicketCategory, TicketPriority, TicketStatus};

/// Shared active/inactive flag carried by both users and organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = ticket::EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(ticket::EnumParseError::new("account status", other)),
        }
    }
}

impl TryFrom<String> for AccountStatus {
    type Error = ticket::EnumParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization tenant categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgType {
    #[serde(rename = "company")]
    Company,
    #[serde(rename = "university")]
    University,
    #[serde(rename = "department")]
    Department,
    #[serde(rename = "government")]
    Government,
    #[serde(rename = "non-profit")]
    NonProfit,
}

impl OrgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Company => "company",
            OrgType::University => "university",
            OrgType::Department => "department",
            OrgType::Government => "government",
            OrgType::NonProfit => "non-profit",
        }
    }
}

impl std::str::FromStr for OrgType {
    type Err = ticket::EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(OrgType::Company),
            "university" => Ok(OrgType::University),
            "department" => Ok(OrgType::Department),
            "government" => Ok(OrgType::Government),
            "non-profit" => Ok(OrgType::NonProfit),
            other => Err(ticket::EnumParseError::new("organization type", other)),
        }
    }
}

impl TryFrom<String> for OrgType {
    type Error = ticket::EnumParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for OrgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
