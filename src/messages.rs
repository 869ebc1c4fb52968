use crate::{
    outcome::{FailureCategory, VerificationFailure},
    session::Phase,
};

/// Title and subtitle shown for the current phase. The text for failures
/// comes from the normalized failure itself; expired tokens get a
/// call-to-action for a fresh link instead of a retry prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub title: String,
    pub subtitle: String,
}

impl StatusMessage {
    fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        }
    }
}

pub fn status_message(phase: Phase, failure: Option<&VerificationFailure>) -> StatusMessage {
    match phase {
        Phase::Loading => StatusMessage::new(
            "Loading verification...",
            "Please wait while we prepare your verification",
        ),
        Phase::ConnectWallet => StatusMessage::new(
            "Connect Your Solana Wallet",
            "Choose your wallet to begin the verification process",
        ),
        Phase::Signing => StatusMessage::new(
            "Sign Verification Message",
            "Please sign the message in your wallet to prove ownership",
        ),
        Phase::Verifying => StatusMessage::new(
            "Verifying Wallet...",
            "Confirming your wallet ownership with Discord",
        ),
        Phase::Success => StatusMessage::new(
            "Verification Successful!",
            "You can now close this page and return to Discord",
        ),
        Phase::Failed => failure_message(failure),
    }
}

/// Whether the UI should offer a "Try Again" action for this failure.
pub fn offers_retry(failure: Option<&VerificationFailure>) -> bool {
    failure.map(VerificationFailure::is_retryable).unwrap_or(true)
}

fn failure_message(failure: Option<&VerificationFailure>) -> StatusMessage {
    let Some(failure) = failure else {
        return StatusMessage::new(
            "Verification Failed",
            "Please try again or request a new verification link",
        );
    };

    let subtitle = match (&failure.details, failure.category) {
        (Some(details), _) => details.clone(),
        (None, FailureCategory::ExpiredToken) => {
            "This verification link has expired. Please request a new one from Discord."
                .to_string()
        }
        (None, _) => "Please try again or request a new verification link".to_string(),
    };

    StatusMessage {
        title: failure.message.clone(),
        subtitle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_messages() {
        let msg = status_message(Phase::ConnectWallet, None);
        assert_eq!(msg.title, "Connect Your Solana Wallet");

        let msg = status_message(Phase::Success, None);
        assert!(msg.subtitle.contains("return to Discord"));
    }

    #[test]
    fn test_failure_message_uses_failure_text() {
        let failure = VerificationFailure::with_details(
            FailureCategory::RateLimited,
            "Rate limit exceeded",
            "Too many verification attempts.",
        );
        let msg = status_message(Phase::Failed, Some(&failure));
        assert_eq!(msg.title, "Rate limit exceeded");
        assert_eq!(msg.subtitle, "Too many verification attempts.");
        assert!(offers_retry(Some(&failure)));
    }

    #[test]
    fn test_expired_failure_directs_to_fresh_link() {
        let failure =
            VerificationFailure::new(FailureCategory::ExpiredToken, "Verification link expired");
        let msg = status_message(Phase::Failed, Some(&failure));
        assert!(msg.subtitle.contains("request a new one"));
        assert!(!offers_retry(Some(&failure)));
    }
}
