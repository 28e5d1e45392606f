//! Pure, stateless RSA-PSS/SHA-256 signature verification (spec §4.3).
//!
//! This module has no knowledge of HTTP, headers, or the nonce store — it
//! only knows how to build the canonical message and check a signature
//! against a stored public key. The axum-facing middleware in
//! `hostlink-api` owns header extraction, the timestamp skew check, and
//! the nonce insert-or-reject call; this module owns only the
//! cryptography, so it can be unit-tested without spinning up a server.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs8::DecodePublicKey;
use rsa::pss::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;

/// Builds `"<agent_id>|<timestamp>|<nonce>"` with literal `|` separators,
/// byte-exactly as the client signed it (spec §4.3).
pub fn signing_message(agent_id: &str, timestamp: &str, nonce: &str) -> String {
    format!("{agent_id}|{timestamp}|{nonce}")
}

/// Verifies `signature_b64` (base64 `RSA-PSS(SHA-256, privkey, msg)`)
/// against `message` using the agent's stored public key
/// (base64-encoded DER, spec §3).
///
/// Every failure mode — malformed base64, malformed DER, or a signature
/// that simply doesn't verify — collapses to `false`. The caller is
/// responsible for turning that into a generic 401 (spec §4.3: "no body
/// or minimal body"); this function never distinguishes failure reasons
/// so none can leak.
pub fn verify_signature(public_key_der_b64: &str, message: &str, signature_b64: &str) -> bool {
    let Ok(der) = STANDARD.decode(public_key_der_b64) else {
        return false;
    };
    let Ok(public_key) = RsaPublicKey::from_public_key_der(&der) else {
        return false;
    };
    let Ok(sig_bytes) = STANDARD.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(sig_bytes.as_slice()) else {
        return false;
    };

    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    verifying_key.verify(message.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pss::SigningKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::{pkcs8::EncodePublicKey, RsaPrivateKey};

    fn test_keypair() -> (RsaPrivateKey, String) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("keygen");
        let public_key = RsaPublicKey::from(&private_key);
        let der_b64 = STANDARD.encode(
            public_key
                .to_public_key_der()
                .expect("encode der")
                .as_bytes(),
        );
        (private_key, der_b64)
    }

    #[test]
    fn valid_signature_verifies() {
        let (private_key, public_key_b64) = test_keypair();
        let msg = signing_message("agt_01", "1700000000", "nonce-1");

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, msg.as_bytes());
        let signature_b64 = STANDARD.encode(signature.to_bytes());

        assert!(verify_signature(&public_key_b64, &msg, &signature_b64));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let (private_key, public_key_b64) = test_keypair();
        let msg = signing_message("agt_01", "1700000000", "nonce-1");

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, msg.as_bytes());
        let signature_b64 = STANDARD.encode(signature.to_bytes());

        let tampered = signing_message("agt_01", "1700000001", "nonce-1");
        assert!(!verify_signature(&public_key_b64, &tampered, &signature_b64));
    }

    #[test]
    fn malformed_inputs_fail_closed() {
        assert!(!verify_signature("not-base64!!", "msg", "also-not-base64!!"));
        assert!(!verify_signature("", "", ""));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let (private_key, _) = test_keypair();
        let (_, other_public_key_b64) = test_keypair();
        let msg = signing_message("agt_01", "1700000000", "nonce-1");

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, msg.as_bytes());
        let signature_b64 = STANDARD.encode(signature.to_bytes());

        assert!(!verify_signature(&other_public_key_b64, &msg, &signature_b64));
    }
}
