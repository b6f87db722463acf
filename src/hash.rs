use std::str::FromStr;

use digest::Digest as _;
use snafu::Snafu;

/// Hash functions a caller may declare when asking for a signature.
///
/// Only the SHA-2 members in [`DigestAlgorithm`] are accepted by the service, the
/// others exist so that a mismatching declaration can be reported by name.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, derive_more::Display)]
pub enum HashAlgorithm {
    #[display("MD5")]
    Md5,
    #[display("SHA1")]
    Sha1,
    #[display("SHA224")]
    Sha224,
    #[display("SHA256")]
    Sha256,
    #[display("SHA384")]
    Sha384,
    #[display("SHA512")]
    Sha512,
    #[display("SHA3-256")]
    Sha3_256,
    #[display("SHA3-512")]
    Sha3_512,
}

#[derive(Debug, Snafu)]
#[snafu(display("unknown hash {name:?}"))]
pub struct UnknownHashError {
    name: String,
}

impl FromStr for HashAlgorithm {
    type Err = UnknownHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha224" | "sha-224" => Ok(Self::Sha224),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "sha3-256" => Ok(Self::Sha3_256),
            "sha3-512" => Ok(Self::Sha3_512),
            _ => UnknownHashSnafu { name: s }.fail(),
        }
    }
}

impl HashAlgorithm {
    /// Returns the digest size in bytes.
    pub const fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 => 64,
        }
    }
}

/// The digests the key management service signs over.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, derive_more::Display)]
pub enum DigestAlgorithm {
    #[display("SHA256")]
    Sha256,
    #[display("SHA384")]
    Sha384,
    #[display("SHA512")]
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the digest size in bytes.
    pub const fn size(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Calculate the digest of the given input data.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            DigestAlgorithm::Sha256 => HashAlgorithm::Sha256,
            DigestAlgorithm::Sha384 => HashAlgorithm::Sha384,
            DigestAlgorithm::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

impl From<DigestAlgorithm> for HashAlgorithm {
    fn from(alg: DigestAlgorithm) -> Self {
        alg.hash_algorithm()
    }
}

impl TryFrom<HashAlgorithm> for DigestAlgorithm {
    type Error = HashAlgorithm;

    fn try_from(hash: HashAlgorithm) -> Result<Self, Self::Error> {
        match hash {
            HashAlgorithm::Sha256 => Ok(DigestAlgorithm::Sha256),
            HashAlgorithm::Sha384 => Ok(DigestAlgorithm::Sha384),
            HashAlgorithm::Sha512 => Ok(DigestAlgorithm::Sha512),
            other => Err(other),
        }
    }
}
