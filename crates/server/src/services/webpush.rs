//! Web Push wire-protocol primitives.
//!
//! - RFC 8291 `aes128gcm` payload encryption: ECDH over P-256 between a
//!   per-message server key and the subscription's `p256dh` key, HKDF-SHA256
//!   key derivation seeded by the subscription's `auth` secret, AES-128-GCM
//!   over a single record with the 0x02 last-record delimiter. The body is
//!   `salt(16) || rs(4) || idlen(1) || server public key(65) || ciphertext`.
//! - RFC 8292 VAPID authorization: an ES256 JWT over the endpoint origin,
//!   carried as `Authorization: vapid t=<jwt>, k=<public key>`.

use aes_gcm::{Aes128Gcm, KeyInit, Nonce, aead::Aead};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hkdf::Hkdf;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey, ecdh};
use rand_core::OsRng;
use sha2::Sha256;
use thiserror::Error;
use url::Url;

/// Record size written into the aes128gcm header. One record fits any
/// payload a push service accepts (4 KiB limit), so content is never split.
const RECORD_SIZE: u32 = 4096;

/// VAPID token lifetime. Push services reject anything over 24h.
const VAPID_TTL_SECONDS: i64 = 12 * 60 * 60;

/// Errors from Web Push crypto operations.
#[derive(Debug, Error)]
pub enum WebPushCryptoError {
    /// Subscription keys are not valid base64url / P-256 material.
    #[error("invalid subscription keys: {0}")]
    InvalidClientKeys(String),

    /// The configured VAPID private key is unusable.
    #[error("invalid VAPID key: {0}")]
    InvalidVapidKey(String),

    /// The subscription endpoint is not a well-formed URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// AEAD encryption failed.
    #[error("payload encryption failed")]
    Encrypt,
}

/// Encrypt a push payload for a subscription (`p256dh` and `auth` as the
/// browser handed them out, base64url).
///
/// # Errors
///
/// Returns an error if the subscription keys do not decode to valid P-256 /
/// auth-secret material.
pub fn encrypt_payload(
    p256dh: &str,
    auth: &str,
    plaintext: &[u8],
) -> Result<Vec<u8>, WebPushCryptoError> {
    let ua_public = decode_client_public(p256dh)?;
    let auth_secret = URL_SAFE_NO_PAD
        .decode(auth)
        .map_err(|e| WebPushCryptoError::InvalidClientKeys(format!("auth: {e}")))?;

    let server_secret = SecretKey::random(&mut OsRng);
    let salt: [u8; 16] = rand::random();

    encrypt_with(&server_secret, &salt, &ua_public, &auth_secret, plaintext)
}

/// Deterministic core of [`encrypt_payload`]: all randomness is passed in.
fn encrypt_with(
    server_secret: &SecretKey,
    salt: &[u8; 16],
    ua_public: &PublicKey,
    auth_secret: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, WebPushCryptoError> {
    let server_public = server_secret.public_key();
    let server_public_bytes = server_public.to_encoded_point(false);
    let ua_public_bytes = ua_public.to_encoded_point(false);

    let shared =
        ecdh::diffie_hellman(server_secret.to_nonzero_scalar(), ua_public.as_affine());

    // IKM = HKDF(auth_secret, ecdh_secret, "WebPush: info" || 0x00 || ua_pub || as_pub)
    let mut info = Vec::with_capacity(14 + 65 + 65);
    info.extend_from_slice(b"WebPush: info\0");
    info.extend_from_slice(ua_public_bytes.as_bytes());
    info.extend_from_slice(server_public_bytes.as_bytes());

    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(auth_secret), shared.raw_secret_bytes())
        .expand(&info, &mut ikm)
        .map_err(|_| WebPushCryptoError::Encrypt)?;

    // CEK and nonce from the content-encoding labels (RFC 8188)
    let prk = Hkdf::<Sha256>::new(Some(salt), &ikm);
    let mut cek = [0u8; 16];
    prk.expand(b"Content-Encoding: aes128gcm\0", &mut cek)
        .map_err(|_| WebPushCryptoError::Encrypt)?;
    let mut nonce = [0u8; 12];
    prk.expand(b"Content-Encoding: nonce\0", &mut nonce)
        .map_err(|_| WebPushCryptoError::Encrypt)?;

    // Single record: payload followed by the last-record delimiter
    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(0x02);

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|_| WebPushCryptoError::Encrypt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|_| WebPushCryptoError::Encrypt)?;

    // aes128gcm header (RFC 8188 section 2.1)
    let mut body = Vec::with_capacity(16 + 4 + 1 + 65 + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(65);
    body.extend_from_slice(server_public_bytes.as_bytes());
    body.extend_from_slice(&ciphertext);

    Ok(body)
}

fn decode_client_public(p256dh: &str) -> Result<PublicKey, WebPushCryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(p256dh)
        .map_err(|e| WebPushCryptoError::InvalidClientKeys(format!("p256dh: {e}")))?;
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|e| WebPushCryptoError::InvalidClientKeys(format!("p256dh: {e}")))
}

/// Parse the base64url-encoded VAPID private key (32-byte P-256 scalar).
///
/// # Errors
///
/// Returns an error if the key does not decode to a valid scalar.
pub fn parse_vapid_private_key(encoded: &str) -> Result<SigningKey, WebPushCryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| WebPushCryptoError::InvalidVapidKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| WebPushCryptoError::InvalidVapidKey(e.to_string()))
}

/// Build the `Authorization: vapid ...` header value for a push endpoint.
///
/// The JWT audience is the endpoint's origin, per RFC 8292; `public_key` is
/// the base64url application server key the browser subscribed with.
///
/// # Errors
///
/// Returns an error if the endpoint is not a valid URL.
pub fn vapid_authorization(
    endpoint: &str,
    subject: &str,
    signing_key: &SigningKey,
    public_key: &str,
) -> Result<String, WebPushCryptoError> {
    let url =
        Url::parse(endpoint).map_err(|e| WebPushCryptoError::InvalidEndpoint(e.to_string()))?;
    let audience = url.origin().ascii_serialization();

    let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"ES256"}"#);
    let claims = serde_json::json!({
        "aud": audience,
        "exp": Utc::now().timestamp() + VAPID_TTL_SECONDS,
        "sub": subject,
    });
    let claims = URL_SAFE_NO_PAD.encode(claims.to_string());

    let signing_input = format!("{header}.{claims}");
    let signature: Signature = signing_key.sign(signing_input.as_bytes());
    let token = format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    );

    Ok(format!("vapid t={token}, k={public_key}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use p256::ecdsa::VerifyingKey;
    use p256::ecdsa::signature::Verifier;

    fn ua_keypair() -> (SecretKey, PublicKey) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        (secret, public)
    }

    #[test]
    fn test_body_structure() {
        let (_, ua_public) = ua_keypair();
        let auth_secret: [u8; 16] = rand::random();
        let server_secret = SecretKey::random(&mut OsRng);
        let salt: [u8; 16] = rand::random();
        let plaintext = b"{\"title\":\"Order shipped\"}";

        let body =
            encrypt_with(&server_secret, &salt, &ua_public, &auth_secret, plaintext).unwrap();

        // salt || rs || idlen || key || ciphertext(plaintext + delimiter + tag)
        assert_eq!(body.len(), 16 + 4 + 1 + 65 + plaintext.len() + 1 + 16);
        assert_eq!(&body[..16], &salt);
        assert_eq!(&body[16..20], &RECORD_SIZE.to_be_bytes());
        assert_eq!(body[20], 65);
        // Uncompressed SEC1 points start with 0x04
        assert_eq!(body[21], 0x04);
    }

    #[test]
    fn test_roundtrip_decrypts_on_client_side() {
        let (ua_secret, ua_public) = ua_keypair();
        let auth_secret: [u8; 16] = rand::random();
        let server_secret = SecretKey::random(&mut OsRng);
        let salt: [u8; 16] = rand::random();
        let plaintext = b"halfeti restock";

        let body =
            encrypt_with(&server_secret, &salt, &ua_public, &auth_secret, plaintext).unwrap();

        // Re-derive the keys the way a user agent would
        let server_public = PublicKey::from_sec1_bytes(&body[21..86]).unwrap();
        let shared = ecdh::diffie_hellman(ua_secret.to_nonzero_scalar(), server_public.as_affine());

        let mut info = Vec::new();
        info.extend_from_slice(b"WebPush: info\0");
        info.extend_from_slice(ua_public.to_encoded_point(false).as_bytes());
        info.extend_from_slice(server_public.to_encoded_point(false).as_bytes());

        let mut ikm = [0u8; 32];
        Hkdf::<Sha256>::new(Some(&auth_secret), shared.raw_secret_bytes())
            .expand(&info, &mut ikm)
            .unwrap();

        let prk = Hkdf::<Sha256>::new(Some(&body[..16]), &ikm);
        let mut cek = [0u8; 16];
        prk.expand(b"Content-Encoding: aes128gcm\0", &mut cek).unwrap();
        let mut nonce = [0u8; 12];
        prk.expand(b"Content-Encoding: nonce\0", &mut nonce).unwrap();

        let cipher = Aes128Gcm::new_from_slice(&cek).unwrap();
        let record = cipher
            .decrypt(Nonce::from_slice(&nonce), &body[86..])
            .unwrap();

        assert_eq!(&record[..record.len() - 1], plaintext);
        assert_eq!(record[record.len() - 1], 0x02);
    }

    #[test]
    fn test_encrypt_payload_rejects_bad_keys() {
        assert!(encrypt_payload("!!!", "abc", b"x").is_err());
        // Valid base64 but not a curve point
        let bogus = URL_SAFE_NO_PAD.encode([0u8; 65]);
        assert!(encrypt_payload(&bogus, "YXV0aHNlY3JldDE2Ynl0", b"x").is_err());
    }

    #[test]
    fn test_vapid_token_shape_and_signature() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let public_key = URL_SAFE_NO_PAD.encode(
            signing_key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes(),
        );

        let header = vapid_authorization(
            "https://push.example.net/send/abc123",
            "mailto:ops@attar.shop",
            &signing_key,
            &public_key,
        )
        .unwrap();

        assert!(header.starts_with("vapid t="));
        let token = header
            .strip_prefix("vapid t=")
            .unwrap()
            .split(", k=")
            .next()
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        // Audience is the origin, not the full endpoint
        let claims = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&claims).unwrap();
        assert_eq!(claims["aud"], "https://push.example.net");
        assert_eq!(claims["sub"], "mailto:ops@attar.shop");

        // Signature verifies over header.claims
        let verifying: &VerifyingKey = signing_key.verifying_key();
        let sig_bytes = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        let signature = Signature::from_slice(&sig_bytes).unwrap();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        assert!(verifying.verify(signing_input.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn test_vapid_rejects_bad_endpoint() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        assert!(vapid_authorization("not a url", "mailto:x@y.z", &signing_key, "k").is_err());
    }

    #[test]
    fn test_parse_vapid_private_key() {
        let encoded = URL_SAFE_NO_PAD.encode([7u8; 32]);
        assert!(parse_vapid_private_key(&encoded).is_ok());
        assert!(parse_vapid_private_key("%%%").is_err());
        // All-zero scalar is not a valid key
        let zero = URL_SAFE_NO_PAD.encode([0u8; 32]);
        assert!(parse_vapid_private_key(&zero).is_err());
    }
}
