//! Public keys as published by the key management service.

use const_oid::{
    db::{rfc5912, rfc8410, DB},
    ObjectIdentifier,
};
use rand_core::CryptoRngCore;
use signature::hazmat::PrehashVerifier;
use snafu::{ResultExt, Snafu};
use spki::{der::pem::LineEnding, DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoRef};

use crate::{
    algorithm::{CryptoKeyVersionAlgorithm, SignatureScheme},
    hash::DigestAlgorithm,
};

/// A parsed public key.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    Rsa(rsa::RsaPublicKey),
    Dsa(dsa::VerifyingKey),
    Ecdsa(EcdsaPublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

/// ECDSA public key material, per curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcdsaPublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl EcdsaPublicKey {
    /// Standard name
    pub fn curve_name(&self) -> &'static str {
        match self {
            EcdsaPublicKey::P256(_) => "NIST P-256",
            EcdsaPublicKey::P384(_) => "NIST P-384",
            EcdsaPublicKey::P521(_) => "NIST P-521",
        }
    }
}

/// Errors from [`parse_public_key`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
    #[snafu(display("pem is invalid: {source}"))]
    MalformedEnvelope { source: pem::PemError },
    #[snafu(display("failed to parse public key: {source}"))]
    MalformedKey { source: spki::Error },
    #[snafu(display("unknown key type {description}"))]
    UnsupportedKeyType { description: String },
}

/// Errors from using a [`PublicKey`] locally.
#[derive(Debug, Snafu)]
pub enum KeyError {
    #[snafu(display("{algorithm} is not a signing algorithm"))]
    NotSigningAlgorithm {
        algorithm: CryptoKeyVersionAlgorithm,
    },
    #[snafu(display("{scheme} is not supported for {kind} keys"))]
    KeyMismatch {
        scheme: SignatureScheme,
        kind: &'static str,
    },
    #[snafu(display("{kind} keys cannot encrypt"))]
    EncryptionUnsupported { kind: &'static str },
    #[snafu(display("expected a digest of length ({expected} bytes), found ({found} bytes)"))]
    DigestLength { expected: usize, found: usize },
    #[snafu(transparent)]
    Rsa { source: rsa::Error },
    #[snafu(transparent)]
    Signature { source: signature::Error },
    #[snafu(transparent)]
    Encoding { source: spki::Error },
}

/// Extracts the PEM encoded contents of `input` and parses it as a SubjectPublicKeyInfo.
///
/// Anything preceding the first `-----BEGIN` line is skipped.
pub fn parse_public_key(input: &[u8]) -> Result<PublicKey, ParseError> {
    let block = pem::parse(input).context(MalformedEnvelopeSnafu)?;
    let der = block.contents();
    let spki = SubjectPublicKeyInfoRef::try_from(der).context(MalformedKeySnafu)?;

    let oid = spki.algorithm.oid;
    let key = match oid {
        rfc5912::RSA_ENCRYPTION => {
            PublicKey::Rsa(rsa::RsaPublicKey::from_public_key_der(der).context(MalformedKeySnafu)?)
        }
        rfc5912::ID_DSA => {
            PublicKey::Dsa(dsa::VerifyingKey::from_public_key_der(der).context(MalformedKeySnafu)?)
        }
        rfc5912::ID_EC_PUBLIC_KEY => {
            let curve = spki.algorithm.parameters_oid().context(MalformedKeySnafu)?;
            PublicKey::Ecdsa(parse_ecdsa(curve, der)?)
        }
        rfc8410::ID_ED_25519 => PublicKey::Ed25519(
            ed25519_dalek::VerifyingKey::from_public_key_der(der).context(MalformedKeySnafu)?,
        ),
        _ => return UnsupportedKeyTypeSnafu { description: describe(oid) }.fail(),
    };

    log::trace!("parsed {} public key", key.kind());
    Ok(key)
}

fn parse_ecdsa(curve: ObjectIdentifier, der: &[u8]) -> Result<EcdsaPublicKey, ParseError> {
    Ok(match curve {
        rfc5912::SECP_256_R_1 => {
            EcdsaPublicKey::P256(p256::PublicKey::from_public_key_der(der).context(MalformedKeySnafu)?)
        }
        rfc5912::SECP_384_R_1 => {
            EcdsaPublicKey::P384(p384::PublicKey::from_public_key_der(der).context(MalformedKeySnafu)?)
        }
        rfc5912::SECP_521_R_1 => {
            EcdsaPublicKey::P521(p521::PublicKey::from_public_key_der(der).context(MalformedKeySnafu)?)
        }
        _ => {
            return UnsupportedKeyTypeSnafu {
                description: format!("ECDSA on {}", describe(curve)),
            }
            .fail()
        }
    })
}

fn describe(oid: ObjectIdentifier) -> String {
    match DB.by_oid(&oid) {
        Some(name) => format!("{name} ({oid})"),
        None => oid.to_string(),
    }
}

impl PublicKey {
    /// Short name of the key type.
    pub fn kind(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::Dsa(_) => "DSA",
            PublicKey::Ecdsa(_) => "ECDSA",
            PublicKey::Ed25519(_) => "Ed25519",
        }
    }

    pub fn as_rsa(&self) -> Option<&rsa::RsaPublicKey> {
        match self {
            PublicKey::Rsa(key) => Some(key),
            _ => None,
        }
    }

    /// Re-encode the key the way the service publishes it.
    pub fn to_public_key_pem(&self) -> Result<String, KeyError> {
        let pem = match self {
            PublicKey::Rsa(key) => key.to_public_key_pem(LineEnding::LF)?,
            PublicKey::Dsa(key) => key.to_public_key_pem(LineEnding::LF)?,
            PublicKey::Ecdsa(EcdsaPublicKey::P256(key)) => key.to_public_key_pem(LineEnding::LF)?,
            PublicKey::Ecdsa(EcdsaPublicKey::P384(key)) => key.to_public_key_pem(LineEnding::LF)?,
            PublicKey::Ecdsa(EcdsaPublicKey::P521(key)) => key.to_public_key_pem(LineEnding::LF)?,
            PublicKey::Ed25519(key) => key.to_public_key_pem(LineEnding::LF)?,
        };
        Ok(pem)
    }

    /// Verify a signature produced by the service over `digest`, under the scheme implied by
    /// `algorithm`.
    ///
    /// RSA signatures are raw big-endian integers, ECDSA signatures are DER encoded.
    pub fn verify_prehash(
        &self,
        algorithm: CryptoKeyVersionAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), KeyError> {
        let (Some(scheme), Some(hash)) =
            (algorithm.signature_scheme(), algorithm.digest_algorithm())
        else {
            return NotSigningAlgorithmSnafu { algorithm }.fail();
        };
        if digest.len() != hash.size() {
            return DigestLengthSnafu {
                expected: hash.size(),
                found: digest.len(),
            }
            .fail();
        }

        match (scheme, self) {
            (SignatureScheme::RsaPss, PublicKey::Rsa(key)) => {
                key.verify(pss(hash), digest, signature)?;
            }
            (SignatureScheme::RsaPkcs1v15, PublicKey::Rsa(key)) => {
                key.verify(pkcs1v15(hash), digest, signature)?;
            }
            (SignatureScheme::Ecdsa, PublicKey::Ecdsa(EcdsaPublicKey::P256(key))) => {
                let sig = p256::ecdsa::Signature::from_der(signature)?;
                p256::ecdsa::VerifyingKey::from(key).verify_prehash(digest, &sig)?;
            }
            (SignatureScheme::Ecdsa, PublicKey::Ecdsa(EcdsaPublicKey::P384(key))) => {
                let sig = p384::ecdsa::Signature::from_der(signature)?;
                p384::ecdsa::VerifyingKey::from(key).verify_prehash(digest, &sig)?;
            }
            (scheme, key) => {
                return KeyMismatchSnafu {
                    scheme,
                    kind: key.kind(),
                }
                .fail()
            }
        }

        Ok(())
    }

    /// Encrypt `msg` with RSA-OAEP, for decryption by the matching remote key.
    pub fn encrypt_oaep<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        hash: DigestAlgorithm,
        msg: &[u8],
    ) -> Result<Vec<u8>, KeyError> {
        let PublicKey::Rsa(key) = self else {
            return EncryptionUnsupportedSnafu { kind: self.kind() }.fail();
        };
        Ok(key.encrypt(rng, oaep(hash), msg)?)
    }
}

pub(crate) fn pss(hash: DigestAlgorithm) -> rsa::Pss {
    match hash {
        DigestAlgorithm::Sha256 => rsa::Pss::new::<sha2::Sha256>(),
        DigestAlgorithm::Sha384 => rsa::Pss::new::<sha2::Sha384>(),
        DigestAlgorithm::Sha512 => rsa::Pss::new::<sha2::Sha512>(),
    }
}

pub(crate) fn pkcs1v15(hash: DigestAlgorithm) -> rsa::Pkcs1v15Sign {
    match hash {
        DigestAlgorithm::Sha256 => rsa::Pkcs1v15Sign::new::<sha2::Sha256>(),
        DigestAlgorithm::Sha384 => rsa::Pkcs1v15Sign::new::<sha2::Sha384>(),
        DigestAlgorithm::Sha512 => rsa::Pkcs1v15Sign::new::<sha2::Sha512>(),
    }
}

pub(crate) fn oaep(hash: DigestAlgorithm) -> rsa::Oaep {
    match hash {
        DigestAlgorithm::Sha256 => rsa::Oaep::new::<sha2::Sha256>(),
        DigestAlgorithm::Sha384 => rsa::Oaep::new::<sha2::Sha384>(),
        DigestAlgorithm::Sha512 => rsa::Oaep::new::<sha2::Sha512>(),
    }
}
