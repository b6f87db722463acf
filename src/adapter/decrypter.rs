use std::{fmt, sync::Arc};

use log::{debug, trace, warn};
use rand_core::CryptoRngCore;
use rsa::traits::{Decryptor, RandomizedDecryptor};
use snafu::{OptionExt, ResultExt};

use super::{AsymmetricDecrypter, ContextSlot};
use crate::{
    algorithm::CryptoKeyVersionAlgorithm,
    client::{AsymmetricDecryptRequest, GetCryptoKeyVersionRequest, GetPublicKeyRequest, KmsClient},
    context::Context,
    errors::{
        InvalidArgumentSnafu, LookupOperation, PublicKeyParseFailedSnafu, RemoteDecryptFailedSnafu,
        RemoteLookupFailedSnafu, Result, UnsupportedDecryptionAlgorithmSnafu,
    },
    hash::DigestAlgorithm,
    public_key::{parse_public_key, PublicKey},
};

/// Options for [`Decrypter::decrypt`].
///
/// The padding and label hash are fixed by the key version, so there is nothing to choose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptOptions {}

/// Decrypts ciphertexts with an asymmetric decryption key version held by the key
/// management service.
pub struct Decrypter<C: ?Sized = dyn KmsClient> {
    ctx: ContextSlot,

    client: Arc<C>,
    key_id: String,
    algorithm: CryptoKeyVersionAlgorithm,
    oaep_hash: DigestAlgorithm,
    public_key: PublicKey,
}

impl<C: ?Sized> fmt::Debug for Decrypter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decrypter")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl<C: KmsClient + ?Sized> Decrypter<C> {
    /// Create a new decrypter for the key version `key_id`.
    ///
    /// Looks up the key version first and refuses anything that is not an RSA-OAEP
    /// decryption key, then fetches its public key.
    pub fn new(ctx: &Context, client: Option<Arc<C>>, key_id: impl Into<String>) -> Result<Self> {
        let client = client.context(InvalidArgumentSnafu)?;
        let key_id = key_id.into();

        debug!("looking up key version {key_id}");
        let version = client
            .get_crypto_key_version(
                ctx,
                GetCryptoKeyVersionRequest {
                    name: key_id.clone(),
                },
            )
            .context(RemoteLookupFailedSnafu {
                operation: LookupOperation::GetCryptoKeyVersion,
                key_id: &key_id,
            })?;

        let algorithm = version.algorithm;
        let oaep_hash = algorithm
            .oaep_hash()
            .context(UnsupportedDecryptionAlgorithmSnafu { algorithm })?;

        // the key id given by the caller, not the name echoed back by the service
        debug!("fetching public key for {key_id}");
        let pk = client
            .get_public_key(
                ctx,
                GetPublicKeyRequest {
                    name: key_id.clone(),
                },
            )
            .context(RemoteLookupFailedSnafu {
                operation: LookupOperation::GetPublicKey,
                key_id: &key_id,
            })?;

        let public_key = parse_public_key(pk.pem.as_bytes()).context(PublicKeyParseFailedSnafu)?;
        debug!(
            "created decrypter for {key_id} ({algorithm}, {} key)",
            public_key.kind()
        );

        Ok(Decrypter {
            ctx: ContextSlot::default(),
            client,
            key_id,
            algorithm,
            oaep_hash,
            public_key,
        })
    }

    /// Set the context used by subsequent calls to [`Decrypter::decrypt`].
    ///
    /// Calls already in flight keep the context they started with. `None` resets to a
    /// background context.
    pub fn with_context(&self, ctx: impl Into<Option<Context>>) -> &Self {
        self.ctx.set(ctx.into());
        self
    }

    /// Decrypt `ciphertext` remotely.
    ///
    /// The ciphertext is forwarded as is; the service rejects anything that was not produced
    /// with this key version's public key and padding.
    pub fn decrypt(&self, ciphertext: &[u8], _opts: Option<&DecryptOptions>) -> Result<Vec<u8>> {
        let ctx = self.ctx.get();
        self.remote_decrypt(&ctx, ciphertext)
    }

    /// Like [`Decrypter::decrypt`], with an explicit context instead of the one set on the
    /// decrypter.
    pub fn decrypt_with_context(
        &self,
        ctx: &Context,
        ciphertext: &[u8],
        _opts: Option<&DecryptOptions>,
    ) -> Result<Vec<u8>> {
        self.remote_decrypt(ctx, ciphertext)
    }

    fn remote_decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> Result<Vec<u8>> {
        debug!(
            "AsymmetricDecrypt {} ({}), {} byte ciphertext",
            self.key_id,
            self.algorithm,
            ciphertext.len()
        );
        let resp = self
            .client
            .asymmetric_decrypt(
                ctx,
                AsymmetricDecryptRequest {
                    name: self.key_id.clone(),
                    ciphertext: ciphertext.to_vec(),
                },
            )
            .context(RemoteDecryptFailedSnafu)?;
        trace!("received {} byte plaintext", resp.plaintext.len());

        Ok(resp.plaintext)
    }
}

impl<C: ?Sized> Decrypter<C> {
    /// The public key of the remote key version, fetched once at construction.
    pub fn public(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn algorithm(&self) -> CryptoKeyVersionAlgorithm {
        self.algorithm
    }

    /// Hash function used for OAEP padding and the mask generation function.
    pub fn oaep_hash(&self) -> DigestAlgorithm {
        self.oaep_hash
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl<C: KmsClient + ?Sized> AsymmetricDecrypter for Decrypter<C> {
    fn public(&self) -> &PublicKey {
        Decrypter::public(self)
    }

    fn decrypt(
        &self,
        _rng: &mut dyn CryptoRngCore,
        ciphertext: &[u8],
        opts: Option<&DecryptOptions>,
    ) -> Result<Vec<u8>> {
        Decrypter::decrypt(self, ciphertext, opts)
    }
}

impl<C: KmsClient + ?Sized> Decryptor for Decrypter<C> {
    fn decrypt(&self, ciphertext: &[u8]) -> rsa::Result<Vec<u8>> {
        Decrypter::decrypt(self, ciphertext, None).map_err(|err| {
            warn!("{}: {err}", self.key_id);
            rsa::Error::Decryption
        })
    }
}

impl<C: KmsClient + ?Sized> RandomizedDecryptor for Decrypter<C> {
    fn decrypt_with_rng<R: CryptoRngCore + ?Sized>(
        &self,
        _rng: &mut R,
        ciphertext: &[u8],
    ) -> rsa::Result<Vec<u8>> {
        Decryptor::decrypt(self, ciphertext)
    }
}
