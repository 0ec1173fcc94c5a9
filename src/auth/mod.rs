//! Authentication primitives: credential hashing and session tokens.
//!
//! Both components are stateless. Wrong-but-well-formed input never raises an
//! error here; it comes back as `false` / `None` and the account service
//! turns it into `Unauthorized`.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIdentity, TokenSigner};
