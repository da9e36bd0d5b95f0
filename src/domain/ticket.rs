use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticket lifecycle states.
///
/// `Open` is the initial state and `Closed` the resting one, but closed
/// tickets can be reopened. The backend deliberately enforces only
/// membership in this set, not a transition table: any authorized caller
/// may move a ticket between states through the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Pending,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketCategory {
    Academic,
    Technical,
    Administrative,
    Financial,
    Other,
}

/// Classification of a note appended to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    Internal,
    #[serde(rename = "Student Communication")]
    StudentCommunication,
    #[serde(rename = "System Update")]
    SystemUpdate,
}

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct EnumParseError {
    kind: &'static str,
    value: String,
}

impl EnumParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

macro_rules! impl_text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(EnumParseError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = EnumParseError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_text_enum!(TicketStatus, "ticket status", {
    Open => "Open",
    InProgress => "In Progress",
    Pending => "Pending",
    Closed => "Closed",
});

impl_text_enum!(TicketPriority, "ticket priority", {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Urgent => "Urgent",
});

impl_text_enum!(TicketCategory, "ticket category", {
    Academic => "Academic",
    Technical => "Technical",
    Administrative => "Administrative",
    Financial => "Financial",
    Other => "Other",
});

impl_text_enum!(NoteType, "note type", {
    Internal => "Internal",
    StudentCommunication => "Student Communication",
    SystemUpdate => "System Update",
});

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Open
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

impl Default for NoteType {
    fn default() -> Self {
        NoteType::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_including_spaced_variant() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Pending,
            TicketStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }
        assert_eq!("In Progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
    }

    #[test]
    fn status_serde_uses_display_strings() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: TicketStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(back, TicketStatus::InProgress);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!("Reopened".parse::<TicketStatus>().is_err());
        assert!("critical".parse::<TicketPriority>().is_err());
        assert!("internal".parse::<NoteType>().is_err());
    }

    #[test]
    fn defaults_match_new_ticket_expectations() {
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
        assert_eq!(NoteType::default(), NoteType::Internal);
    }

    #[test]
    fn note_type_serde_round_trip() {
        let json = serde_json::to_string(&NoteType::StudentCommunication).unwrap();
        assert_eq!(json, "\"Student Communication\"");
    }
}
