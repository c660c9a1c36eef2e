use common_http_errors::ApiError;
use thiserror::Error;
use tracing::warn;

use crate::extractors::AuthenticatedIdentity;
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Only `role` may proceed; everyone else is refused with `denial`.
    Only { role: Role, denial: &'static str },
    AnyAuthenticated,
}

impl RoleRequirement {
    pub fn admits(&self, role: Role) -> bool {
        match self {
            RoleRequirement::Only { role: required, .. } => *required == role,
            RoleRequirement::AnyAuthenticated => true,
        }
    }
}

/// Protected operations and the role each one demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RecordSale,
    ListOwnSales,
    ListAllSales,
    MonthlyReport,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::RecordSale,
        Operation::ListOwnSales,
        Operation::ListAllSales,
        Operation::MonthlyReport,
    ];

    pub const fn requirement(self) -> RoleRequirement {
        match self {
            Operation::RecordSale => RoleRequirement::Only {
                role: Role::Employee,
                denial: "Only employees can add sales entries",
            },
            Operation::ListOwnSales => RoleRequirement::AnyAuthenticated,
            Operation::ListAllSales => RoleRequirement::Only {
                role: Role::Manager,
                denial: "Only managers can view sales",
            },
            Operation::MonthlyReport => RoleRequirement::Only {
                role: Role::Manager,
                denial: "Only managers can view reports",
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GuardError {
    #[error("{message}")]
    Forbidden {
        operation: Operation,
        role: Role,
        message: &'static str,
    },
}

impl From<GuardError> for ApiError {
    fn from(value: GuardError) -> Self {
        ApiError::forbidden(value.to_string())
    }
}

pub fn ensure_role(role: Role, operation: Operation) -> Result<(), GuardError> {
    match operation.requirement() {
        requirement if requirement.admits(role) => Ok(()),
        RoleRequirement::Only { denial, .. } => Err(GuardError::Forbidden {
            operation,
            role,
            message: denial,
        }),
        RoleRequirement::AnyAuthenticated => Ok(()),
    }
}

pub fn ensure_allowed(
    identity: &AuthenticatedIdentity,
    operation: Operation,
) -> Result<(), GuardError> {
    ensure_role(identity.role, operation).map_err(|err| {
        warn!(
            user_id = identity.user_id,
            role = %identity.role,
            ?operation,
            "role_check_failed"
        );
        err
    })
}
