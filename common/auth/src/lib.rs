pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult};
pub use extractors::{authenticate, AuthenticatedIdentity};
pub use guards::{ensure_allowed, ensure_role, GuardError, Operation, RoleRequirement};
pub use roles::{Role, UnknownRole, ROLE_EMPLOYEE, ROLE_MANAGER};
pub use verifier::JwtVerifier;
