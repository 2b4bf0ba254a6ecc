/// Middleware module
///
/// Custom middleware for protecting routes behind a valid session.

mod session_guard;

pub use session_guard::SessionGuardMiddleware;
