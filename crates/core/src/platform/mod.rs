//! Platform detection and acquisition strategy resolution.
//!
//! A [`StrategyProfile`] is the merged parameter set handed to every extractor
//! call. It is built by layering, in order: the base profile derived from the
//! extractor configuration, the detected platform's override layer, and a
//! per-call layer carrying credentials. Later layers win field by field;
//! header maps are merged key by key.

mod credentials;
mod resolver;
mod types;

pub use credentials::{CookieDirStore, CredentialBundle, CredentialStore, NoCredentials};
pub use resolver::StrategyResolver;
pub use types::{FormatExpression, Platform, RetryPolicy, StrategyLayer, StrategyProfile};
