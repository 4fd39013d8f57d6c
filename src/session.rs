use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::quiz::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    Participant,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match normalized.as_str() {
            "creator" => Ok(Role::Creator),
            "participant" => Ok(Role::Participant),
            _ => Err(s.to_owned()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Creator => f.write_str("creator"),
            Role::Participant => f.write_str("participant"),
        }
    }
}

/// Identity obtained once at login. Flows receive it explicitly and treat it
/// as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Id,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn is_creator(&self) -> bool {
        self.role == Role::Creator
    }
}
