//! # gcpkms
//!
//! Signers and decrypters backed by asymmetric key versions in a cloud key management
//! service.
//!
//! [`Signer`] and [`Decrypter`] look like local keys: they expose the public key, sign
//! digests, and decrypt RSA-OAEP ciphertexts. The private key material never leaves the
//! service; every operation is a single remote call through a [`KmsClient`] supplied by the
//! caller.
//!
//! Remote calls run under a [`Context`], which carries cancellation and an optional deadline.
//! A context can be passed per call, or set on the adapter with `with_context` and used by
//! every following call, including calls through the [`signature`] and [`rsa`] traits which
//! have no room for one.

pub mod adapter;
pub mod algorithm;
pub mod client;
pub mod context;
pub mod errors;
pub mod hash;
pub mod public_key;

pub use self::{
    adapter::{
        AsymmetricDecrypter, AsymmetricSigner, DecryptOptions, Decrypter, SignOptions, Signature,
        Signer,
    },
    algorithm::CryptoKeyVersionAlgorithm,
    client::KmsClient,
    context::Context,
    errors::{Error, Result},
    hash::{DigestAlgorithm, HashAlgorithm},
    public_key::{parse_public_key, PublicKey},
};
