use async_trait::async_trait;

use crate::outcome::{FailureCategory, VerificationFailure};

/// Externally supplied signing capability, implemented by whatever wallet
/// the user connects. Errors are opaque by contract; classification of
/// them is best-effort string matching (see [`classify_signing_error`]).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Asks the wallet to sign the challenge bytes. Resolution is bounded
    /// only by user interaction; declining surfaces as an error.
    async fn sign_message(&self, message: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Tears down the wallet session so a retry starts from a clean
    /// connection.
    async fn disconnect(&self);
}

/// Best-effort classification of an opaque wallet error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningErrorKind {
    /// The user declined the signature prompt.
    Declined,
    /// The wallet cannot sign messages at all.
    Unsupported,
    Other,
}

/// Pattern-matches the error text the wallet produced. Wallets do not
/// share an error vocabulary, so anything unrecognized falls through to
/// `Other` rather than guessing.
pub fn classify_signing_error(err: &anyhow::Error) -> SigningErrorKind {
    let text = err.to_string().to_lowercase();
    if text.contains("user rejected") || text.contains("user declined") {
        SigningErrorKind::Declined
    } else if text.contains("not supported") || text.contains("does not support") {
        SigningErrorKind::Unsupported
    } else {
        SigningErrorKind::Other
    }
}

/// Maps a wallet error to the user-facing failure for the signing phase.
pub fn signing_failure(err: &anyhow::Error) -> VerificationFailure {
    match classify_signing_error(err) {
        SigningErrorKind::Declined => VerificationFailure::with_details(
            FailureCategory::SigningFailed,
            "Signature request was cancelled",
            "Please try again and approve the signature request in your wallet.",
        ),
        SigningErrorKind::Unsupported => VerificationFailure::with_details(
            FailureCategory::SigningFailed,
            "Your wallet does not support message signing",
            "Please try a different wallet.",
        ),
        SigningErrorKind::Other => VerificationFailure::with_details(
            FailureCategory::SigningFailed,
            "Failed to sign verification message",
            err.to_string(),
        ),
    }
}

/// A Solana public key is 32 bytes, base58-encoded.
pub fn is_valid_wallet_address(address: &str) -> bool {
    bs58::decode(address)
        .into_vec()
        .map(|bytes| bytes.len() == 32)
        .unwrap_or(false)
}

/// Shortens an address for display, e.g. "4Nd1...pQrS".
pub fn truncate_address(address: &str, chars: usize) -> String {
    if address.len() <= chars * 2 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..chars],
        &address[address.len() - chars..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    // The classifier is best-effort: these assert today's known wallet
    // phrasings, not an exhaustive contract.
    #[test]
    fn test_classify_known_phrasings() {
        assert_eq!(
            classify_signing_error(&anyhow!("User rejected the request")),
            SigningErrorKind::Declined
        );
        assert_eq!(
            classify_signing_error(&anyhow!("signMessage is not supported by this wallet")),
            SigningErrorKind::Unsupported
        );
    }

    #[test]
    fn test_classify_falls_back_to_other() {
        assert_eq!(
            classify_signing_error(&anyhow!("something exploded")),
            SigningErrorKind::Other
        );
    }

    #[test]
    fn test_signing_failure_messages() {
        let declined = signing_failure(&anyhow!("User rejected the request"));
        assert_eq!(declined.category, FailureCategory::SigningFailed);
        assert!(declined.message.contains("cancelled"));

        let other = signing_failure(&anyhow!("rpc unavailable"));
        assert_eq!(other.category, FailureCategory::SigningFailed);
        assert_eq!(other.details.as_deref(), Some("rpc unavailable"));
    }

    #[test]
    fn test_wallet_address_validation() {
        // System program address: 32 zero bytes
        assert!(is_valid_wallet_address(
            "11111111111111111111111111111111"
        ));
        // Contains characters outside the base58 alphabet
        assert!(!is_valid_wallet_address("0OIl+not-base58"));
        // Valid base58 but too short
        assert!(!is_valid_wallet_address("abc"));
        assert!(!is_valid_wallet_address(""));
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(
            truncate_address("4Nd1mYvR7c9kjBtQpXswXcYrSLBGpQrS", 4),
            "4Nd1...pQrS"
        );
        assert_eq!(truncate_address("short", 4), "short");
    }
}
