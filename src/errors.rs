use snafu::Snafu;

use crate::{
    algorithm::CryptoKeyVersionAlgorithm, hash::HashAlgorithm, public_key::ParseError,
};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Boxed error returned by a [`KmsClient`](crate::client::KmsClient) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("kms client cannot be nil"))]
    InvalidArgument,

    /// A lookup RPC issued while constructing an adapter failed.
    #[snafu(display("failed to lookup key {key_id} ({operation}): {source}"))]
    RemoteLookupFailed {
        operation: LookupOperation,
        key_id: String,
        source: BoxError,
    },

    #[snafu(display("unknown signing algorithm {algorithm}"))]
    UnsupportedSigningAlgorithm {
        algorithm: CryptoKeyVersionAlgorithm,
    },

    #[snafu(display("unknown decryption algorithm {algorithm}"))]
    UnsupportedDecryptionAlgorithm {
        algorithm: CryptoKeyVersionAlgorithm,
    },

    #[snafu(display("failed to parse public key: {source}"))]
    PublicKeyParseFailed { source: ParseError },

    #[snafu(display("signer only supports {expected}, found {found}"))]
    WrongHashFunction {
        expected: HashAlgorithm,
        found: HashAlgorithm,
    },

    #[snafu(display(
        "signer expected a digest of length ({expected} bytes), found ({found} bytes)"
    ))]
    WrongDigestLength { expected: usize, found: usize },

    #[snafu(display("failed to sign: {source}"))]
    RemoteSignFailed { source: BoxError },

    #[snafu(display("failed to decrypt ciphertext: {source}"))]
    RemoteDecryptFailed { source: BoxError },
}

/// The lookup RPC that failed during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LookupOperation {
    #[display("GetCryptoKeyVersion")]
    GetCryptoKeyVersion,
    #[display("GetPublicKey")]
    GetPublicKey,
}

impl Error {
    /// Returns `true` if the error was produced locally, without talking to the service.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Error::RemoteLookupFailed { .. }
                | Error::RemoteSignFailed { .. }
                | Error::RemoteDecryptFailed { .. }
        )
    }
}
