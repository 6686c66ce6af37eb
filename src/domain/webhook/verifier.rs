//! HMAC-SHA256 webhook signature verification.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]`, signed
//! over `"{t}.{raw body}"`. Several `v1` entries are accepted so a gateway can
//! rotate secrets.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;
use crate::domain::foundation::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Future timestamps tolerated for clock skew.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid signature header".to_string()))?;
            match key {
                "t" => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        WebhookError::ParseError("invalid signature timestamp".to_string())
                    })?);
                }
                "v1" => signatures.push(hex::decode(value).map_err(|_| {
                    WebhookError::ParseError("invalid signature hex".to_string())
                })?),
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

pub struct WebhookSignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, header, Timestamp::now())
    }

    /// Verifies against an explicit clock.
    pub fn verify_at(&self, payload: &[u8], header: &str, now: Timestamp) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(header)?;

        let age = now.as_unix_secs() - header.timestamp;
        if age > self.tolerance_secs || age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        let expected = compute_signature(self.secret.expose_secret(), header.timestamp, payload)?;
        let matched = header
            .signatures
            .iter()
            .any(|candidate| candidate.len() == expected.len() && bool::from(candidate.ct_eq(&expected)));
        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

/// Builds a header value for `payload`, as a sending gateway would.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"charge.refunded"}"#;

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(SecretString::new(SECRET.to_string()), 300)
    }

    #[test]
    fn parses_header_with_multiple_signatures() {
        let header = SignatureHeader::parse("t=123,v1=abcd,v0=ffff,v1=0102").unwrap();
        assert_eq!(header.timestamp, 123);
        assert_eq!(header.signatures, vec![vec![0xab, 0xcd], vec![0x01, 0x02]]);
    }

    #[test]
    fn rejects_header_without_timestamp() {
        assert!(matches!(
            SignatureHeader::parse("v1=abcd"),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn accepts_valid_signature() {
        let now = Timestamp::now();
        let header = sign_payload(SECRET, now.as_unix_secs(), BODY).unwrap();
        assert!(verifier().verify_at(BODY, &header, now).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let now = Timestamp::now();
        let header = sign_payload(SECRET, now.as_unix_secs(), BODY).unwrap();

        let result = verifier().verify_at(br#"{"id":"evt_2"}"#, &header, now);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Timestamp::now();
        let header = sign_payload("other", now.as_unix_secs(), BODY).unwrap();
        assert!(matches!(
            verifier().verify_at(BODY, &header, now),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let now = Timestamp::now();
        let header = sign_payload(SECRET, now.as_unix_secs() - 301, BODY).unwrap();
        assert!(matches!(
            verifier().verify_at(BODY, &header, now),
            Err(WebhookError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn accepts_rotated_secret_in_second_slot() {
        let now = Timestamp::now();
        let old = sign_payload("old_secret", now.as_unix_secs(), BODY).unwrap();
        let new = sign_payload(SECRET, now.as_unix_secs(), BODY).unwrap();
        let combined = format!("{},{}", old, new.split_once(',').unwrap().1);

        assert!(verifier().verify_at(BODY, &combined, now).is_ok());
    }
}
