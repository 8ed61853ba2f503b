//! Secret detection and masking.
//!
//! Credentials flow through environment variables and vendor CLI arguments.
//! Anything echoed back to the user (env check, CLI errors, debug logs)
//! passes through an [`OutputMasker`] first.
//!
//! # Example
//!
//! ```
//! use hskc::secrets::{OutputMasker, SecretMatcher};
//!
//! let matcher = SecretMatcher::with_builtins();
//! assert!(matcher.is_secret("KEYCLOAK_PASSWORD"));
//! assert!(!matcher.is_secret("KCBASE"));
//!
//! let mut masker = OutputMasker::new();
//! masker.add_secret("hunter2");
//! assert_eq!(masker.mask("--password hunter2"), "--password [REDACTED]");
//! ```

pub mod mask;
pub mod pattern;

pub use mask::{OutputMasker, MASK};
pub use pattern::{SecretMatcher, SecretPattern, BUILTIN_PATTERNS};
