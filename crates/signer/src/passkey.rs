//! WebAuthn (passkey) signers.
//!
//! The on-chain verifiers rebuild `clientDataJSON` from the challenge and the fields that
//! follow it, so a proof carries only those trailing fields. The challenge is the
//! base64url encoding of the digest.

use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256, Bytes, U256};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::{Signature as P256Signature, SigningKey, VerifyingKey, signature::Signer as _};
use safe_primitives::{SafeError, SignerProof, WebAuthnSignature, chain::default_p256_verifier};
use sha2::{Digest as _, Sha256};
use tracing::debug;

use crate::SignerError;

const CLIENT_DATA_PREFIX: &str = r#"{"type":"webauthn.get","challenge":""#;

/// Assertion returned by an authenticator for a `navigator.credentials.get` ceremony.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    pub authenticator_data: Bytes,
    pub client_data_json: String,
    /// ASN.1 DER encoded P-256 signature
    pub signature: Bytes,
}

/// Source of WebAuthn assertions (a platform authenticator, a browser bridge, ...).
///
/// No timeout is applied to the ceremony; callers cancel by dropping the future.
#[async_trait::async_trait]
pub trait PasskeyAuthenticator: Send + Sync {
    async fn get_assertion(&self, challenge: &[u8]) -> Result<WebAuthnAssertion, String>;
}

/// Public key of a passkey and the verifier its signatures are checked with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasskeyCredential {
    pub x: U256,
    pub y: U256,
    /// Custom P-256 verifier. `None` uses the chain default.
    pub verifier: Option<Address>,
}

impl PasskeyCredential {
    pub const fn new(x: U256, y: U256) -> Self {
        Self {
            x,
            y,
            verifier: None,
        }
    }

    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let coordinate = |c: Option<&p256::FieldBytes>| c.map_or(U256::ZERO, |b| U256::from_be_slice(b));
        Self::new(coordinate(point.x()), coordinate(point.y()))
    }

    pub const fn with_verifier(mut self, verifier: Address) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// The custom verifier, or the default verifier of `chain_id`.
    pub fn verifier(&self, chain_id: u64) -> Result<Address, SafeError> {
        match self.verifier {
            Some(verifier) => Ok(verifier),
            None => default_p256_verifier(chain_id),
        }
    }
}

/// A credential together with the authenticator able to use it.
#[derive(Clone)]
pub struct Passkey {
    credential: PasskeyCredential,
    authenticator: Option<Arc<dyn PasskeyAuthenticator>>,
}

impl Passkey {
    pub fn new(credential: PasskeyCredential, authenticator: Arc<dyn PasskeyAuthenticator>) -> Self {
        Self {
            credential,
            authenticator: Some(authenticator),
        }
    }

    /// A credential known only by its public key, e.g. for eligibility checks.
    pub const fn public(credential: PasskeyCredential) -> Self {
        Self {
            credential,
            authenticator: None,
        }
    }

    pub const fn credential(&self) -> &PasskeyCredential {
        &self.credential
    }

    /// Runs the assertion ceremony for `digest` and converts it for the on-chain verifier.
    /// `signer` only labels errors.
    pub(crate) async fn assert(
        &self,
        signer: Address,
        digest: B256,
    ) -> Result<WebAuthnSignature, SignerError> {
        let unavailable = |reason: String| SignerError::PasskeyUnavailable { signer, reason };

        let authenticator = self
            .authenticator
            .as_ref()
            .ok_or_else(|| unavailable("no authenticator attached".to_string()))?;
        let assertion = authenticator
            .get_assertion(digest.as_slice())
            .await
            .map_err(unavailable)?;

        let client_data_fields =
            extract_client_data_fields(&assertion.client_data_json, digest).map_err(unavailable)?;
        let (r, s) = signature_components(&assertion.signature).map_err(unavailable)?;

        Ok(WebAuthnSignature {
            authenticator_data: assertion.authenticator_data,
            client_data_fields,
            r,
            s,
        })
    }
}

impl fmt::Debug for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passkey")
            .field("credential", &self.credential)
            .field("has_authenticator", &self.authenticator.is_some())
            .finish()
    }
}

/// WebAuthn signer proxy owning the Safe; the proxy is bound to one credential.
#[derive(Clone, Debug)]
pub struct PasskeySigner {
    address: Address,
    passkey: Passkey,
}

impl PasskeySigner {
    pub const fn new(address: Address, passkey: Passkey) -> Self {
        Self { address, passkey }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn passkey(&self) -> &Passkey {
        &self.passkey
    }

    pub async fn sign(&self, digest: B256, chain_id: u64) -> Result<SignerProof, SignerError> {
        let verifier = self
            .passkey
            .credential
            .verifier(chain_id)
            .map_err(|err| SignerError::PasskeyUnavailable {
                signer: self.address,
                reason: err.to_string(),
            })?;
        let signature = self.passkey.assert(self.address, digest).await?;
        debug!(signer = %self.address, %verifier, %digest, "passkey assertion collected");

        Ok(SignerProof::Passkey {
            signer: self.address,
            verifier,
            signature,
        })
    }
}

/// Base64url challenge the authenticator must have signed for `digest`.
pub fn challenge(digest: B256) -> String {
    URL_SAFE_NO_PAD.encode(digest)
}

/// `clientDataJSON` the verifier rebuilds for `digest` and the trailing `fields`.
pub fn client_data_json(digest: B256, fields: &str) -> String {
    if fields.is_empty() {
        format!("{CLIENT_DATA_PREFIX}{}\"}}", challenge(digest))
    } else {
        format!("{CLIENT_DATA_PREFIX}{}\",{fields}}}", challenge(digest))
    }
}

/// Returns the fields that follow the challenge in `client_data_json`.
///
/// The JSON must start with the `webauthn.get` type and the challenge of `digest`, in
/// that order, exactly as verifiers reconstruct it.
pub fn extract_client_data_fields(client_data_json: &str, digest: B256) -> Result<String, String> {
    let rest = client_data_json
        .strip_prefix(CLIENT_DATA_PREFIX)
        .ok_or("client data does not start with a webauthn.get challenge")?;
    let expected = challenge(digest);
    let rest = rest
        .strip_prefix(expected.as_str())
        .and_then(|rest| rest.strip_prefix('"'))
        .ok_or("client data challenge does not match the digest")?;

    if rest == "}" {
        return Ok(String::new());
    }
    rest.strip_prefix(',')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::to_string)
        .ok_or_else(|| "client data is not a flat JSON object".to_string())
}

/// Splits a DER signature into `(r, s)` with `s` in the lower half of the curve order.
pub fn signature_components(der: &[u8]) -> Result<(U256, U256), String> {
    let signature = P256Signature::from_der(der).map_err(|err| format!("invalid DER signature: {err}"))?;
    let signature = signature.normalize_s().unwrap_or(signature);
    let bytes = signature.to_bytes();
    Ok((U256::from_be_slice(&bytes[..32]), U256::from_be_slice(&bytes[32..])))
}

/// Message a WebAuthn verifier checks the P-256 signature against:
/// `authenticatorData ‖ sha256(clientDataJSON)`.
pub fn signing_message(authenticator_data: &[u8], client_data_json: &str) -> Vec<u8> {
    let mut message = authenticator_data.to_vec();
    message.extend_from_slice(&Sha256::digest(client_data_json.as_bytes()));
    message
}

/// Authenticator backed by an in-memory P-256 key, for local development and tests.
pub struct SoftwareAuthenticator {
    key: SigningKey,
    rp_id: String,
    origin: String,
}

impl SoftwareAuthenticator {
    pub fn new(key: SigningKey, rp_id: impl Into<String>) -> Self {
        let rp_id = rp_id.into();
        Self {
            origin: format!("https://{rp_id}"),
            key,
            rp_id,
        }
    }

    pub fn credential(&self) -> PasskeyCredential {
        PasskeyCredential::from_verifying_key(self.key.verifying_key())
    }
}

#[async_trait::async_trait]
impl PasskeyAuthenticator for SoftwareAuthenticator {
    async fn get_assertion(&self, challenge: &[u8]) -> Result<WebAuthnAssertion, String> {
        // rpIdHash ‖ flags (user present, user verified) ‖ signCount
        let mut authenticator_data = Sha256::digest(self.rp_id.as_bytes()).to_vec();
        authenticator_data.push(0x05);
        authenticator_data.extend_from_slice(&0u32.to_be_bytes());

        let client_data_json = format!(
            "{CLIENT_DATA_PREFIX}{}\",\"origin\":\"{}\",\"crossOrigin\":false}}",
            URL_SAFE_NO_PAD.encode(challenge),
            self.origin
        );
        let signature: P256Signature = self
            .key
            .sign(&signing_message(&authenticator_data, &client_data_json));

        Ok(WebAuthnAssertion {
            authenticator_data: authenticator_data.into(),
            client_data_json,
            signature: signature.to_der().as_bytes().to_vec().into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use p256::ecdsa::signature::{Signer, Verifier};

    const DIGEST: B256 = b256!("0x6e0d2fe0c2d4d8d91ab0bfa1ab7e1e0e70b8b5e65d4c39e6f2aa19b4b6a0e51c");

    fn authenticator() -> SoftwareAuthenticator {
        let key = SigningKey::from_slice(&[0x42; 32]).unwrap();
        SoftwareAuthenticator::new(key, "safe.example")
    }

    #[test]
    fn test_extract_client_data_fields() {
        let json = client_data_json(DIGEST, r#""origin":"https://safe.example""#);
        assert_eq!(
            extract_client_data_fields(&json, DIGEST).unwrap(),
            r#""origin":"https://safe.example""#
        );
        assert_eq!(
            extract_client_data_fields(&client_data_json(DIGEST, ""), DIGEST).unwrap(),
            ""
        );

        // challenge for another digest
        assert!(extract_client_data_fields(&json, B256::ZERO).is_err());
        // fields reordered
        let reordered = format!(r#"{{"challenge":"{}","type":"webauthn.get"}}"#, challenge(DIGEST));
        assert!(extract_client_data_fields(&reordered, DIGEST).is_err());
    }

    #[test]
    fn test_challenge_is_unpadded_base64url() {
        let challenge = challenge(DIGEST);
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains(['+', '/', '=']));
    }

    #[tokio::test]
    async fn test_passkey_proof_verifies_against_public_key() {
        let authenticator = authenticator();
        let credential = authenticator.credential();
        let verifying_key = *authenticator.key.verifying_key();
        let signer = PasskeySigner::new(
            Address::repeat_byte(0xbe),
            Passkey::new(credential, Arc::new(authenticator)),
        );

        let SignerProof::Passkey { signature, .. } = signer.sign(DIGEST, 100).await.unwrap() else {
            panic!("expected a passkey proof");
        };

        // what the on-chain verifier does with the proof
        let json = client_data_json(DIGEST, &signature.client_data_fields);
        let message = signing_message(&signature.authenticator_data, &json);
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&signature.r.to_be_bytes::<32>());
        rs[32..].copy_from_slice(&signature.s.to_be_bytes::<32>());
        let p256_signature = P256Signature::from_slice(&rs).unwrap();
        assert!(verifying_key.verify(&message, &p256_signature).is_ok());
    }

    #[tokio::test]
    async fn test_passkey_proof_carries_resolved_verifier() {
        let authenticator = Arc::new(authenticator());
        let credential = authenticator.credential();
        let address = Address::repeat_byte(0xbe);

        let signer = PasskeySigner::new(address, Passkey::new(credential, authenticator.clone()));
        let proof = signer.sign(DIGEST, 100).await.unwrap();
        assert!(matches!(
            proof,
            SignerProof::Passkey { signer, verifier, .. }
                if signer == address && verifier == safe_contracts::FCL_P256_VERIFIER_ADDRESS
        ));

        let custom = Address::repeat_byte(0x99);
        let signer = PasskeySigner::new(
            address,
            Passkey::new(credential.with_verifier(custom), authenticator),
        );
        let proof = signer.sign(DIGEST, 31337).await.unwrap();
        assert!(matches!(proof, SignerProof::Passkey { verifier, .. } if verifier == custom));
    }

    #[tokio::test]
    async fn test_passkey_without_authenticator() {
        let signer = PasskeySigner::new(
            Address::repeat_byte(0xbe),
            Passkey::public(PasskeyCredential::new(U256::from(5), U256::from(7))),
        );
        let err = signer.sign(DIGEST, 1).await.unwrap_err();
        assert!(matches!(err, SignerError::PasskeyUnavailable { .. }));

        // unknown chain without a custom verifier
        let err = signer.sign(DIGEST, 31337).await.unwrap_err();
        assert!(err.to_string().contains("chain not supported: 31337"));
    }

    #[test]
    fn test_credential_verifier_fallback() {
        let credential = PasskeyCredential::new(U256::from(5), U256::from(7));
        assert_eq!(
            credential.verifier(10200),
            Ok(safe_contracts::FCL_P256_VERIFIER_ADDRESS)
        );
        let custom = credential.with_verifier(Address::repeat_byte(0x99));
        assert_eq!(custom.verifier(31337), Ok(Address::repeat_byte(0x99)));
    }

    #[test]
    fn test_der_components_are_low_s() {
        let authenticator = authenticator();
        let signature: P256Signature = authenticator.key.sign(b"message");
        let (r, s) = signature_components(signature.to_der().as_bytes()).unwrap();
        let bytes = signature.normalize_s().unwrap_or(signature).to_bytes();
        assert_eq!(r, U256::from_be_slice(&bytes[..32]));
        assert_eq!(s, U256::from_be_slice(&bytes[32..]));
        assert!(signature_components(&[0x30, 0x01]).is_err());
    }
}
