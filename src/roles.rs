use serde::{Deserialize, Serialize};

/// Platform roles. Discriminants are the row ids seeded in the `roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin = 1,
    Creator = 2,
    Attendee = 3,
}

impl Role {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Creator => "CREATOR",
            Role::Attendee => "ATTENDEE",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Creator),
            3 => Some(Role::Attendee),
            _ => None,
        }
    }

    /// Exact match on the seeded names; anything else is not a known role.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ADMIN" => Some(Role::Admin),
            "CREATOR" => Some(Role::Creator),
            "ATTENDEE" => Some(Role::Attendee),
            _ => None,
        }
    }

    /// Only creators and admins get event metrics.
    pub fn is_metrics_eligible(self) -> bool {
        matches!(self, Role::Creator | Role::Admin)
    }
}
