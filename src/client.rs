//! The narrow slice of the key management API the adapters consume.
//!
//! Transport, authentication and retries are the business of whoever implements
//! [`KmsClient`]; this crate only issues the four calls below.

use std::sync::Arc;

use crate::{
    algorithm::CryptoKeyVersionAlgorithm, context::Context, errors::BoxError,
    hash::DigestAlgorithm,
};

/// Request for [`KmsClient::get_crypto_key_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCryptoKeyVersionRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKeyVersion {
    pub name: String,
    pub algorithm: CryptoKeyVersionAlgorithm,
}

/// Request for [`KmsClient::get_public_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPublicKeyRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyResponse {
    /// PEM encoded SubjectPublicKeyInfo.
    pub pem: String,
    pub algorithm: CryptoKeyVersionAlgorithm,
}

/// A precomputed digest, tagged with the function that produced it.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Sha256(#[debug("{}", hex::encode(_0))] Vec<u8>),
    Sha384(#[debug("{}", hex::encode(_0))] Vec<u8>),
    Sha512(#[debug("{}", hex::encode(_0))] Vec<u8>),
}

impl Digest {
    /// Tag `digest` with `alg`. The bytes are embedded as given.
    pub fn new(alg: DigestAlgorithm, digest: Vec<u8>) -> Self {
        match alg {
            DigestAlgorithm::Sha256 => Digest::Sha256(digest),
            DigestAlgorithm::Sha384 => Digest::Sha384(digest),
            DigestAlgorithm::Sha512 => Digest::Sha512(digest),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Digest::Sha256(_) => DigestAlgorithm::Sha256,
            Digest::Sha384(_) => DigestAlgorithm::Sha384,
            Digest::Sha512(_) => DigestAlgorithm::Sha512,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Digest::Sha256(d) | Digest::Sha384(d) | Digest::Sha512(d) => d,
        }
    }
}

/// Request for [`KmsClient::asymmetric_sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricSignRequest {
    pub name: String,
    pub digest: Digest,
}

#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricSignResponse {
    #[debug("{}", hex::encode(signature))]
    pub signature: Vec<u8>,
}

/// Request for [`KmsClient::asymmetric_decrypt`].
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricDecryptRequest {
    pub name: String,
    #[debug("{} bytes", ciphertext.len())]
    pub ciphertext: Vec<u8>,
}

#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricDecryptResponse {
    #[debug("..")]
    pub plaintext: Vec<u8>,
}

/// A handle to the key management service.
///
/// Implementations must be safe to share between threads; the adapters call into the
/// same client from every thread they are used on. Each call should give up once
/// `ctx` is done.
pub trait KmsClient: Send + Sync {
    fn get_crypto_key_version(
        &self,
        ctx: &Context,
        req: GetCryptoKeyVersionRequest,
    ) -> Result<CryptoKeyVersion, BoxError>;

    fn get_public_key(
        &self,
        ctx: &Context,
        req: GetPublicKeyRequest,
    ) -> Result<PublicKeyResponse, BoxError>;

    fn asymmetric_sign(
        &self,
        ctx: &Context,
        req: AsymmetricSignRequest,
    ) -> Result<AsymmetricSignResponse, BoxError>;

    fn asymmetric_decrypt(
        &self,
        ctx: &Context,
        req: AsymmetricDecryptRequest,
    ) -> Result<AsymmetricDecryptResponse, BoxError>;
}

macro_rules! impl_client_for_pointer {
    ($ptr:ident) => {
        impl<T: KmsClient + ?Sized> KmsClient for $ptr<T> {
            fn get_crypto_key_version(
                &self,
                ctx: &Context,
                req: GetCryptoKeyVersionRequest,
            ) -> Result<CryptoKeyVersion, BoxError> {
                (**self).get_crypto_key_version(ctx, req)
            }

            fn get_public_key(
                &self,
                ctx: &Context,
                req: GetPublicKeyRequest,
            ) -> Result<PublicKeyResponse, BoxError> {
                (**self).get_public_key(ctx, req)
            }

            fn asymmetric_sign(
                &self,
                ctx: &Context,
                req: AsymmetricSignRequest,
            ) -> Result<AsymmetricSignResponse, BoxError> {
                (**self).asymmetric_sign(ctx, req)
            }

            fn asymmetric_decrypt(
                &self,
                ctx: &Context,
                req: AsymmetricDecryptRequest,
            ) -> Result<AsymmetricDecryptResponse, BoxError> {
                (**self).asymmetric_decrypt(ctx, req)
            }
        }
    };
}

impl_client_for_pointer!(Arc);
impl_client_for_pointer!(Box);
