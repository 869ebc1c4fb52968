use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    challenge::build_challenge,
    client::VerificationClient,
    outcome::{FailureCategory, VerificationFailure, VerificationOutcome},
    token::{self, TokenClaims},
    wallet::{signing_failure, WalletSigner},
};

/// Query parameter the bot embeds the token under in the confirmation URL.
pub const TOKEN_QUERY_PARAM: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    ConnectWallet,
    Signing,
    Verifying,
    Success,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("no failed attempt to retry")]
    NothingToRetry,
    #[error("this verification link has expired; request a new one")]
    NotRetryable,
}

/// A wallet the user has connected: its public key (base58) plus the
/// signing capability it exposes.
#[derive(Clone)]
pub struct ConnectedWallet {
    pub address: String,
    pub signer: Arc<dyn WalletSigner>,
}

impl ConnectedWallet {
    pub fn new(address: impl Into<String>, signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            address: address.into(),
            signer,
        }
    }
}

/// State machine for one verification page session.
///
/// All transitions are driven by two external events (token load and
/// wallet connection) plus the async completions of signing and the HTTP
/// exchange. `&mut self` methods serialize every transition, and
/// `wallet_connected` only acts from `ConnectWallet`, so at most one
/// verification attempt is ever in flight.
pub struct VerificationSession {
    client: VerificationClient,
    phase: Phase,
    raw_token: Option<String>,
    claims: Option<TokenClaims>,
    wallet: Option<ConnectedWallet>,
    last_failure: Option<VerificationFailure>,
}

impl VerificationSession {
    pub fn new(client: VerificationClient) -> Self {
        Self {
            client,
            phase: Phase::Loading,
            raw_token: None,
            claims: None,
            wallet: None,
            last_failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn claims(&self) -> Option<&TokenClaims> {
        self.claims.as_ref()
    }

    pub fn last_failure(&self) -> Option<&VerificationFailure> {
        self.last_failure.as_ref()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.as_ref().map(|wallet| wallet.address.as_str())
    }

    /// Entry-URL event: pull the token out of the confirmation URL and
    /// load it. A missing parameter is a malformed-token failure, not a
    /// crash.
    pub fn load_from_url(&mut self, url: &Url) -> Phase {
        let raw = token_from_url(url);
        self.load_token(raw.as_deref())
    }

    /// Page-load event: decode the token and decide the starting phase.
    pub fn load_token(&mut self, raw: Option<&str>) -> Phase {
        let Some(raw) = raw else {
            self.fail(VerificationFailure::with_details(
                FailureCategory::MalformedToken,
                "Invalid verification link",
                "No verification token found in URL. Please request a new \
                 verification link from Discord.",
            ));
            return self.phase;
        };

        match token::parse(raw) {
            Ok(claims) => {
                if claims.is_expired(Utc::now()) {
                    self.fail(VerificationFailure::with_details(
                        FailureCategory::ExpiredToken,
                        "Verification link expired",
                        "This verification link has expired. Please request a new \
                         one from Discord.",
                    ));
                } else {
                    info!(
                        account_id = claims.account_id,
                        "Token accepted, waiting for wallet connection"
                    );
                    self.raw_token = Some(raw.to_string());
                    self.claims = Some(claims);
                    self.phase = Phase::ConnectWallet;
                }
            }
            Err(err) => {
                self.fail(VerificationFailure::with_details(
                    FailureCategory::MalformedToken,
                    "Invalid verification token",
                    format!(
                        "{}. Please request a new verification link from Discord.",
                        err
                    ),
                ));
            }
        }

        self.phase
    }

    /// Wallet-connection event. Fires the whole signing and submission
    /// sequence; ignored unless the session is actually waiting for a
    /// wallet, so a reconnect arriving mid-flight cannot start a second
    /// concurrent attempt.
    pub async fn wallet_connected(&mut self, wallet: ConnectedWallet) -> Phase {
        if self.phase != Phase::ConnectWallet {
            debug!(
                phase = ?self.phase,
                "Ignoring wallet connection event outside ConnectWallet"
            );
            return self.phase;
        }

        // Guaranteed by the ConnectWallet transition
        let (Some(claims), Some(raw_token)) = (self.claims.clone(), self.raw_token.clone())
        else {
            self.fail(VerificationFailure::new(
                FailureCategory::Unknown,
                "Wallet not properly connected",
            ));
            return self.phase;
        };

        let signer = Arc::clone(&wallet.signer);
        let address = wallet.address.clone();
        self.wallet = Some(wallet);
        self.phase = Phase::Signing;

        // The token may have expired while the user was picking a wallet
        if claims.is_expired(Utc::now()) {
            self.fail(VerificationFailure::with_details(
                FailureCategory::SigningFailed,
                "Verification token is no longer valid",
                "The token expired before signing. Please request a new \
                 verification link from Discord.",
            ));
            return self.phase;
        }

        let message = build_challenge(&claims);
        debug!("Requesting signature over challenge message");

        let signature = match signer.sign_message(message.as_bytes()).await {
            Ok(bytes) => bs58::encode(bytes).into_string(),
            Err(err) => {
                self.fail(signing_failure(&err));
                return self.phase;
            }
        };

        self.phase = Phase::Verifying;
        info!(wallet = %address, "Submitting signed challenge for verification");

        match self.client.submit(&raw_token, &address, &signature).await {
            VerificationOutcome::Success { .. } => {
                info!("Wallet verification succeeded");
                self.last_failure = None;
                self.phase = Phase::Success;
            }
            VerificationOutcome::Failure(failure) => self.fail(failure),
        }

        self.phase
    }

    /// User-triggered retry. Disconnects any held wallet session first so
    /// the next attempt starts from a clean connection. Refused when the
    /// failure needs a fresh token instead.
    pub async fn retry(&mut self) -> Result<Phase, RetryError> {
        if self.phase != Phase::Failed {
            return Err(RetryError::NothingToRetry);
        }
        if let Some(failure) = &self.last_failure {
            if !failure.is_retryable() {
                return Err(RetryError::NotRetryable);
            }
        }

        if let Some(wallet) = self.wallet.take() {
            debug!("Disconnecting wallet before retry");
            wallet.signer.disconnect().await;
        }

        self.last_failure = None;
        self.phase = Phase::ConnectWallet;
        Ok(self.phase)
    }

    fn fail(&mut self, failure: VerificationFailure) {
        warn!(
            category = ?failure.category,
            "Verification attempt failed: {}",
            failure.message
        );
        self.last_failure = Some(failure);
        self.phase = Phase::Failed;
    }
}

/// Extracts the raw token from a confirmation URL.
pub fn token_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}
