//! Decoding of the bearer token presented by the calling node.
//!
//! The signature is not verified; the caller is trusted because its client ID
//! is looked up live in the trust registry.  Issuer and expiry are checked.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::err::AuthError;

/// Name of the authorized party claim.
pub const AZP_CLAIM: &str = "azp";

/// The claims we need besides the registered ones.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    azp: Option<String>,
}

/// Extract the token from the `Authorization` header value.
pub fn parse_authorization(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::InvalidHeader)?;
    let (scheme, token) = match header.split(' ').collect::<Vec<_>>().as_slice() {
        [scheme, token] => (*scheme, *token),
        _ => return Err(AuthError::InvalidHeader),
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }
    Ok(token)
}

/// Checks the claims of bearer tokens issued by one identity provider.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    issuer: String,
}

impl TokenValidator {
    /// Construct for tokens issued by `issuer`.
    pub fn new(issuer: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["iss"]);
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }

    /// Return the authorized party of `token`.
    pub fn authorized_party(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &self.validation())
            .map_err(|e| AuthError::InvalidToken(token_error_reason(e.kind())))?;
        match data.claims.azp {
            Some(azp) if !azp.is_empty() => Ok(azp),
            _ => Err(AuthError::InvalidToken(missing_claim(AZP_CLAIM))),
        }
    }
}

fn missing_claim(claim: &str) -> String {
    format!("Token is missing the \"{}\" claim", claim)
}

fn token_error_reason(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::InvalidIssuer => "Invalid issuer".to_string(),
        ErrorKind::ExpiredSignature => "Signature has expired".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => missing_claim(claim),
        ErrorKind::InvalidToken => "Malformed token".to_string(),
        other => format!("Malformed token ({:?})", other),
    }
}
