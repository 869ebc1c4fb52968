use serde::{Deserialize, Serialize};

/// Every way a verification attempt can fail, normalized at the boundary
/// where the failure occurs. The state machine only ever sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Token missing, wrong segment count, undecodable, or invalid claims.
    MalformedToken,
    /// Structurally valid token past its expiry. Not retryable in place.
    ExpiredToken,
    /// Wallet declined, wallet unsupported, or re-validation failed at
    /// signing time.
    SigningFailed,
    /// Missing submission fields, or backend 400.
    InvalidRequest,
    /// Backend answered 2xx with an explicit error status.
    ServerRejected,
    /// Backend 429.
    RateLimited,
    /// Backend 500 or other non-specific server failure.
    ServerError,
    /// No response received at all.
    ConnectionFailed,
    /// No response received and the backend address is a local-development
    /// one in a production deployment.
    Misconfigured,
    /// 2xx with an unrecognized payload shape.
    UnexpectedResponse,
    Unknown,
}

impl FailureCategory {
    /// Expired tokens need a fresh link from the bot; everything else can
    /// be retried in place.
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureCategory::ExpiredToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub category: FailureCategory,
    pub message: String,
    pub details: Option<String>,
}

impl VerificationFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        category: FailureCategory,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result of one end-to-end verification exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success { message: Option<String> },
    Failure(VerificationFailure),
}

impl VerificationOutcome {
    pub fn failure(category: FailureCategory, message: impl Into<String>) -> Self {
        VerificationOutcome::Failure(VerificationFailure::new(category, message))
    }

    pub fn failure_with_details(
        category: FailureCategory,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        VerificationOutcome::Failure(VerificationFailure::with_details(
            category, message, details,
        ))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationOutcome::Success { .. })
    }

    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            VerificationOutcome::Success { .. } => None,
            VerificationOutcome::Failure(failure) => Some(failure.category),
        }
    }
}
