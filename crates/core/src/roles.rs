//! Forum roles.
//!
//! The canonical spelling is PascalCase (`Player`, `GameMaster`, `Admin`).
//! Older accounts and tokens may still carry the lowercase names `user`,
//! `moderator` and `admin`; [`Role::normalize`] maps those once at the
//! authentication boundary so nothing downstream ever sees them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_PLAYER: &str = "Player";
pub const ROLE_GAME_MASTER: &str = "GameMaster";
pub const ROLE_ADMIN: &str = "Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    GameMaster,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Player, Role::GameMaster, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player => ROLE_PLAYER,
            Role::GameMaster => ROLE_GAME_MASTER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Map a stored or claimed role name, canonical or legacy, to a [`Role`].
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn normalize(raw: &str) -> Option<Role> {
        match raw.trim() {
            ROLE_PLAYER | "user" => Some(Role::Player),
            ROLE_GAME_MASTER | "moderator" => Some(Role::GameMaster),
            ROLE_ADMIN | "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::normalize(s).ok_or_else(|| CoreError::Validation(format!("Unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::normalize(role.as_str()), Some(role));
        }
    }

    #[test]
    fn legacy_names_map_to_canonical_roles() {
        assert_eq!(Role::normalize("user"), Some(Role::Player));
        assert_eq!(Role::normalize("moderator"), Some(Role::GameMaster));
        assert_eq!(Role::normalize("admin"), Some(Role::Admin));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(Role::normalize("superuser"), None);
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_as_pascal_case() {
        let json = serde_json::to_string(&Role::GameMaster).unwrap();
        assert_eq!(json, "\"GameMaster\"");
    }
}
