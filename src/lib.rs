//! # wallet-confirm
//!
//! Client-side verification handshake for linking a Solana wallet to a
//! Discord account. A user arrives with a single-use, time-limited token
//! embedded in a URL; this library parses and validates the token, builds
//! the deterministic challenge message, obtains a signature from the
//! connected wallet, submits it to the bot backend, and drives the state
//! machine behind the confirmation page.
//!
//! No cryptography happens here: token claims are decoded without
//! signature verification (they are routing hints, not authenticated
//! facts) and message signing is delegated to the injected
//! [`wallet::WalletSigner`] capability. The backend re-verifies
//! everything.

pub mod challenge;
pub mod client;
pub mod config;
pub mod messages;
pub mod outcome;
pub mod session;
pub mod token;
pub mod wallet;

// Re-export commonly used types
pub use challenge::{build_challenge, CHALLENGE_PREFIX};
pub use client::VerificationClient;
pub use config::{AppConfig, ConfigError, Environment};
pub use messages::{offers_retry, status_message, StatusMessage};
pub use outcome::{FailureCategory, VerificationFailure, VerificationOutcome};
pub use session::{ConnectedWallet, Phase, RetryError, VerificationSession};
pub use token::{TokenClaims, TokenError};
pub use wallet::WalletSigner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
