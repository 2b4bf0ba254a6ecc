/// Authentication module
///
/// Handles JWT issuance and verification, password hashing, the session
/// guard for protected routes, and the account flow controller.

mod claims;
mod guard;
mod jwt;
mod password;
mod service;

pub use claims::{Claims, TokenKind};
pub use guard::{AuthenticatedUser, SessionGuard};
pub use jwt::{TokenError, TokenPair, TokenService};
pub use password::{BcryptHasher, PasswordHasher};
pub use service::{AuthService, Credentials, LoginOutcome, Registration};
