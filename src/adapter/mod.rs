//! Adapters exposing remote key versions through local signer and decrypter contracts.
//!
//! The private key never leaves the key management service: each adapter caches the public
//! key and the algorithm of one key version, and forwards every operation to the service.

mod decrypter;
mod signer;

use parking_lot::RwLock;
use rand_core::CryptoRngCore;

pub use self::{
    decrypter::{DecryptOptions, Decrypter},
    signer::{SignOptions, Signature, Signer},
};
use crate::{context::Context, errors::Result, public_key::PublicKey};

/// A key that signs precomputed digests.
///
/// This is object safe, so callers that only need "something that signs" can hold a
/// `Box<dyn AsymmetricSigner>`.
pub trait AsymmetricSigner: Send + Sync {
    fn public(&self) -> &PublicKey;

    /// Sign `digest`. `rng` is accepted for contract compatibility, implementations may
    /// ignore it.
    fn sign(
        &self,
        rng: &mut dyn CryptoRngCore,
        digest: &[u8],
        opts: Option<&SignOptions>,
    ) -> Result<Vec<u8>>;
}

/// A key that decrypts ciphertexts produced with its public key.
pub trait AsymmetricDecrypter: Send + Sync {
    fn public(&self) -> &PublicKey;

    fn decrypt(
        &self,
        rng: &mut dyn CryptoRngCore,
        ciphertext: &[u8],
        opts: Option<&DecryptOptions>,
    ) -> Result<Vec<u8>>;
}

/// Late bound context shared by all operations on an adapter.
///
/// Writers replace the whole value, readers take a clone, so an operation sees either the
/// old or the new context and keeps it for its whole duration.
#[derive(Debug, Default)]
struct ContextSlot(RwLock<Context>);

impl ContextSlot {
    fn set(&self, ctx: Option<Context>) {
        *self.0.write() = ctx.unwrap_or_default();
    }

    fn get(&self) -> Context {
        self.0.read().clone()
    }
}
