use crate::token::TokenClaims;

/// Wire contract shared with the bot backend: it reconstructs the exact
/// same string and checks the signature against it. Changing this breaks
/// every in-flight verification.
pub const CHALLENGE_PREFIX: &str = "Confirming wallet ownership for request: ";

/// Builds the challenge message the wallet must sign.
///
/// Pure function of the request UUID; the codec has already validated the
/// claims by the time this runs.
pub fn build_challenge(claims: &TokenClaims) -> String {
    format!("{}{}", CHALLENGE_PREFIX, claims.subject_uuid)
}
