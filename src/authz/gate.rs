use uuid::Uuid;

use super::Role;
use crate::errors::AppError;
use crate::jwt::AuthUser;

/// Resolved session state for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { user_id: Uuid, role: Role },
}

impl Identity {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { role, .. } => Some(*role),
        }
    }
}

impl From<&AuthUser> for Identity {
    fn from(auth: &AuthUser) -> Self {
        Identity::Authenticated {
            user_id: auth.user_id,
            role: auth.role,
        }
    }
}

/// Ownership comparison fed by the [`super::OwnershipResolver`].
///
/// `resource_owner` is the owning record of the target resource (None when
/// the resource does not exist) and `caller_owner` is the record the caller
/// is entitled to act through (None when the caller has no such record).
#[derive(Debug, Clone, Copy)]
pub struct OwnershipCheck {
    pub resource_owner: Option<Uuid>,
    pub caller_owner: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    Unauthenticated,
    WrongRole { required: Role },
    NotOwner,
}

impl Deny {
    /// Default HTTP mapping. Wrong-role collapses into 401 alongside
    /// unauthenticated (the profile routes override this with 403), and an
    /// ownership denial reads exactly like a missing resource.
    pub fn into_error(self) -> AppError {
        match self {
            Deny::Unauthenticated => AppError::unauthorized("authentication required"),
            Deny::WrongRole { required } => {
                AppError::unauthorized(format!("{} role required", required.as_str()))
            }
            Deny::NotOwner => AppError::not_found("resource not found"),
        }
    }
}

/// Decide whether `identity` may perform an operation that requires
/// `required` (None for public operations) over an optional ownership scope.
pub fn authorize(
    identity: &Identity,
    required: Option<Role>,
    scope: Option<&OwnershipCheck>,
) -> Result<(), Deny> {
    if let Some(required) = required {
        let role = match identity.role() {
            None => return Err(Deny::Unauthenticated),
            Some(role) => role,
        };

        if role != required {
            return Err(Deny::WrongRole { required });
        }
    }

    if let Some(check) = scope {
        match (check.resource_owner, check.caller_owner) {
            (Some(resource), Some(caller)) if resource == caller => {}
            // Missing resource and foreign resource are the same denial so
            // existence never leaks across ownership boundaries.
            _ => return Err(Deny::NotOwner),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeker() -> Identity {
        Identity::Authenticated {
            user_id: Uuid::new_v4(),
            role: Role::Seeker,
        }
    }

    fn company() -> Identity {
        Identity::Authenticated {
            user_id: Uuid::new_v4(),
            role: Role::Company,
        }
    }

    #[test]
    fn anonymous_passes_public_operations() {
        assert!(authorize(&Identity::Anonymous, None, None).is_ok());
    }

    #[test]
    fn anonymous_denied_on_required_role() {
        assert_eq!(
            authorize(&Identity::Anonymous, Some(Role::Seeker), None),
            Err(Deny::Unauthenticated)
        );
    }

    #[test]
    fn wrong_role_denied_before_ownership() {
        let check = OwnershipCheck {
            resource_owner: Some(Uuid::new_v4()),
            caller_owner: None,
        };
        assert_eq!(
            authorize(&seeker(), Some(Role::Company), Some(&check)),
            Err(Deny::WrongRole {
                required: Role::Company
            })
        );
    }

    #[test]
    fn matching_owner_allowed() {
        let owner = Uuid::new_v4();
        let check = OwnershipCheck {
            resource_owner: Some(owner),
            caller_owner: Some(owner),
        };
        assert!(authorize(&company(), Some(Role::Company), Some(&check)).is_ok());
    }

    #[test]
    fn foreign_owner_and_missing_resource_are_the_same_denial() {
        let caller = Some(Uuid::new_v4());

        let foreign = OwnershipCheck {
            resource_owner: Some(Uuid::new_v4()),
            caller_owner: caller,
        };
        let missing = OwnershipCheck {
            resource_owner: None,
            caller_owner: caller,
        };

        assert_eq!(
            authorize(&company(), Some(Role::Company), Some(&foreign)),
            Err(Deny::NotOwner)
        );
        assert_eq!(
            authorize(&company(), Some(Role::Company), Some(&missing)),
            Err(Deny::NotOwner)
        );
    }

    #[test]
    fn caller_without_owning_record_is_denied() {
        let check = OwnershipCheck {
            resource_owner: Some(Uuid::new_v4()),
            caller_owner: None,
        };
        assert_eq!(
            authorize(&company(), Some(Role::Company), Some(&check)),
            Err(Deny::NotOwner)
        );
    }
}
