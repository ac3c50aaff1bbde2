//! Authentication: session tokens, the `CurrentUser` extractor and
//! per-IP rate limiting for the public auth routes.

pub mod rate_limit;
pub mod session;

pub use session::{CurrentUser, SessionClaims, create_token, verify_token};
