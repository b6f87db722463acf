use std::str::FromStr;

use num_enum::{FromPrimitive, IntoPrimitive};
use snafu::Snafu;

use crate::hash::DigestAlgorithm;

/// Algorithm of a crypto key version, as reported by the key management service.
///
/// The discriminants are the values used on the wire.
/// Ref: <https://cloud.google.com/kms/docs/reference/rest/v1/CryptoKeyVersionAlgorithm>
#[derive(
    Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive, derive_more::Display,
)]
#[repr(i32)]
pub enum CryptoKeyVersionAlgorithm {
    #[display("CRYPTO_KEY_VERSION_ALGORITHM_UNSPECIFIED")]
    Unspecified = 0,
    #[display("GOOGLE_SYMMETRIC_ENCRYPTION")]
    GoogleSymmetricEncryption = 1,

    #[display("RSA_SIGN_PSS_2048_SHA256")]
    RsaSignPss2048Sha256 = 2,
    #[display("RSA_SIGN_PSS_3072_SHA256")]
    RsaSignPss3072Sha256 = 3,
    #[display("RSA_SIGN_PSS_4096_SHA256")]
    RsaSignPss4096Sha256 = 4,
    #[display("RSA_SIGN_PSS_4096_SHA512")]
    RsaSignPss4096Sha512 = 15,

    #[display("RSA_SIGN_PKCS1_2048_SHA256")]
    RsaSignPkcs1_2048Sha256 = 5,
    #[display("RSA_SIGN_PKCS1_3072_SHA256")]
    RsaSignPkcs1_3072Sha256 = 6,
    #[display("RSA_SIGN_PKCS1_4096_SHA256")]
    RsaSignPkcs1_4096Sha256 = 7,
    #[display("RSA_SIGN_PKCS1_4096_SHA512")]
    RsaSignPkcs1_4096Sha512 = 16,

    #[display("RSA_DECRYPT_OAEP_2048_SHA256")]
    RsaDecryptOaep2048Sha256 = 8,
    #[display("RSA_DECRYPT_OAEP_3072_SHA256")]
    RsaDecryptOaep3072Sha256 = 9,
    #[display("RSA_DECRYPT_OAEP_4096_SHA256")]
    RsaDecryptOaep4096Sha256 = 10,
    #[display("RSA_DECRYPT_OAEP_4096_SHA512")]
    RsaDecryptOaep4096Sha512 = 17,

    #[display("EC_SIGN_P256_SHA256")]
    EcSignP256Sha256 = 12,
    #[display("EC_SIGN_P384_SHA384")]
    EcSignP384Sha384 = 13,

    #[num_enum(catch_all)]
    #[display("UNKNOWN({_0})")]
    Unknown(i32),
}

/// What a key version can be used for.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum KeyPurpose {
    AsymmetricSign,
    AsymmetricDecrypt,
    Other,
}

/// Signature scheme the service applies to a digest.
#[derive(Debug, PartialEq, Eq, Copy, Clone, derive_more::Display)]
pub enum SignatureScheme {
    #[display("RSASSA-PSS")]
    RsaPss,
    #[display("RSASSA-PKCS1-v1_5")]
    RsaPkcs1v15,
    #[display("ECDSA")]
    Ecdsa,
}

/// Static properties of a single algorithm.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Params {
    Sign(SignatureScheme, DigestAlgorithm),
    /// RSA-OAEP decryption with the given label hash.
    Decrypt(DigestAlgorithm),
    None,
}

impl CryptoKeyVersionAlgorithm {
    /// Every algorithm other than the catch-all, in wire order.
    pub const KNOWN: [CryptoKeyVersionAlgorithm; 16] = [
        Self::Unspecified,
        Self::GoogleSymmetricEncryption,
        Self::RsaSignPss2048Sha256,
        Self::RsaSignPss3072Sha256,
        Self::RsaSignPss4096Sha256,
        Self::RsaSignPkcs1_2048Sha256,
        Self::RsaSignPkcs1_3072Sha256,
        Self::RsaSignPkcs1_4096Sha256,
        Self::RsaDecryptOaep2048Sha256,
        Self::RsaDecryptOaep3072Sha256,
        Self::RsaDecryptOaep4096Sha256,
        Self::EcSignP256Sha256,
        Self::EcSignP384Sha384,
        Self::RsaSignPss4096Sha512,
        Self::RsaSignPkcs1_4096Sha512,
        Self::RsaDecryptOaep4096Sha512,
    ];

    // The one place where algorithms are mapped to schemes and hashes.
    const fn params(self) -> Params {
        use CryptoKeyVersionAlgorithm::*;
        use DigestAlgorithm::*;
        use SignatureScheme::*;

        match self {
            RsaSignPss2048Sha256 | RsaSignPss3072Sha256 | RsaSignPss4096Sha256 => {
                Params::Sign(RsaPss, Sha256)
            }
            RsaSignPss4096Sha512 => Params::Sign(RsaPss, Sha512),
            RsaSignPkcs1_2048Sha256 | RsaSignPkcs1_3072Sha256 | RsaSignPkcs1_4096Sha256 => {
                Params::Sign(RsaPkcs1v15, Sha256)
            }
            RsaSignPkcs1_4096Sha512 => Params::Sign(RsaPkcs1v15, Sha512),
            EcSignP256Sha256 => Params::Sign(Ecdsa, Sha256),
            EcSignP384Sha384 => Params::Sign(Ecdsa, Sha384),
            RsaDecryptOaep2048Sha256 | RsaDecryptOaep3072Sha256 | RsaDecryptOaep4096Sha256 => {
                Params::Decrypt(Sha256)
            }
            RsaDecryptOaep4096Sha512 => Params::Decrypt(Sha512),
            Unspecified | GoogleSymmetricEncryption | Unknown(_) => Params::None,
        }
    }

    pub const fn purpose(self) -> KeyPurpose {
        match self.params() {
            Params::Sign(..) => KeyPurpose::AsymmetricSign,
            Params::Decrypt(_) => KeyPurpose::AsymmetricDecrypt,
            Params::None => KeyPurpose::Other,
        }
    }

    /// Is this one of the asymmetric signing algorithms?
    pub const fn is_signing(self) -> bool {
        matches!(self.params(), Params::Sign(..))
    }

    /// Is this one of the RSA-OAEP decryption algorithms?
    pub const fn is_decryption(self) -> bool {
        matches!(self.params(), Params::Decrypt(_))
    }

    /// The digest the caller has to provide when signing with this algorithm.
    pub const fn digest_algorithm(self) -> Option<DigestAlgorithm> {
        match self.params() {
            Params::Sign(_, digest) => Some(digest),
            _ => None,
        }
    }

    pub const fn signature_scheme(self) -> Option<SignatureScheme> {
        match self.params() {
            Params::Sign(scheme, _) => Some(scheme),
            _ => None,
        }
    }

    /// The hash used for OAEP padding when encrypting to this key.
    pub const fn oaep_hash(self) -> Option<DigestAlgorithm> {
        match self.params() {
            Params::Decrypt(hash) => Some(hash),
            _ => None,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("unknown crypto key version algorithm {name:?}"))]
pub struct UnknownAlgorithmError {
    name: String,
}

impl FromStr for CryptoKeyVersionAlgorithm {
    type Err = UnknownAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .into_iter()
            .find(|alg| alg.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownAlgorithmSnafu { name: s }.build())
    }
}
