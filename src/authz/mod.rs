//! Authorization core: role + ownership gate.
//!
//! Every scoped operation runs through the same decision pipeline:
//! resolve the session to an [`Identity`], check the required role, and for
//! resource-scoped mutations compare the resource's owning record against the
//! caller's via the [`OwnershipResolver`]. Denials short-circuit before any
//! data-store write, and an ownership denial is indistinguishable from a
//! missing resource at the HTTP boundary.

mod gate;
mod ownership;

pub use gate::{authorize, Deny, Identity, OwnershipCheck};
pub use ownership::{OwnershipResolver, SqlOwnership};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// The two account roles of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Seeker,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "SEEKER",
            Role::Company => "COMPANY",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SEEKER" => Ok(Role::Seeker),
            "COMPANY" => Ok(Role::Company),
            other => Err(AppError::internal(format!("unknown role: {other}"))),
        }
    }
}
