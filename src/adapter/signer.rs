use std::{fmt, sync::Arc};

use log::{debug, trace, warn};
use rand_core::CryptoRngCore;
use signature::{
    hazmat::{PrehashSigner, RandomizedPrehashSigner},
    Keypair, SignatureEncoding,
};
use snafu::{OptionExt, ResultExt};

use super::{AsymmetricSigner, ContextSlot};
use crate::{
    algorithm::CryptoKeyVersionAlgorithm,
    client::{AsymmetricSignRequest, Digest, GetPublicKeyRequest, KmsClient},
    context::Context,
    errors::{
        InvalidArgumentSnafu, LookupOperation, PublicKeyParseFailedSnafu, RemoteLookupFailedSnafu,
        RemoteSignFailedSnafu, Result, UnsupportedSigningAlgorithmSnafu, WrongDigestLengthSnafu,
        WrongHashFunctionSnafu,
    },
    hash::{DigestAlgorithm, HashAlgorithm},
    public_key::{parse_public_key, PublicKey},
};

/// Options for [`Signer::sign`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// The hash function the caller used to compute the digest, if it wants it checked.
    pub hash: Option<HashAlgorithm>,
}

impl SignOptions {
    pub fn new(hash: HashAlgorithm) -> Self {
        SignOptions { hash: Some(hash) }
    }
}

impl From<HashAlgorithm> for SignOptions {
    fn from(hash: HashAlgorithm) -> Self {
        SignOptions::new(hash)
    }
}

impl From<DigestAlgorithm> for SignOptions {
    fn from(hash: DigestAlgorithm) -> Self {
        SignOptions::new(hash.into())
    }
}

/// Signature bytes as returned by the service.
///
/// RSA signatures are the raw signature value, ECDSA signatures are DER encoded.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
#[debug("Signature({})", hex::encode(_0))]
pub struct Signature(Box<[u8]>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Signature(bytes.into_boxed_slice())
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Signature(bytes.into()))
    }
}

impl From<Signature> for Box<[u8]> {
    fn from(sig: Signature) -> Self {
        sig.0
    }
}

impl SignatureEncoding for Signature {
    type Repr = Box<[u8]>;
}

/// Signs digests with an asymmetric signing key version held by the key management service.
pub struct Signer<C: ?Sized = dyn KmsClient> {
    ctx: ContextSlot,

    client: Arc<C>,
    key_id: String,
    algorithm: CryptoKeyVersionAlgorithm,
    digest_alg: DigestAlgorithm,
    public_key: PublicKey,
}

impl<C: ?Sized> fmt::Debug for Signer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl<C: KmsClient + ?Sized> Signer<C> {
    /// Create a new signer for the key version `key_id`, which has the form
    /// `projects/p/locations/l/keyRings/r/cryptoKeys/k/cryptoKeyVersions/v`.
    ///
    /// `ctx` only governs the lookup done here. Issues a single `GetPublicKey` call.
    pub fn new(ctx: &Context, client: Option<Arc<C>>, key_id: impl Into<String>) -> Result<Self> {
        let client = client.context(InvalidArgumentSnafu)?;
        let key_id = key_id.into();

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

        let algorithm = pk.algorithm;
        let digest_alg = algorithm
            .digest_algorithm()
            .context(UnsupportedSigningAlgorithmSnafu { algorithm })?;

        let public_key = parse_public_key(pk.pem.as_bytes()).context(PublicKeyParseFailedSnafu)?;
        debug!(
            "created signer for {key_id} ({algorithm}, {} key)",
            public_key.kind()
        );

        Ok(Signer {
            ctx: ContextSlot::default(),
            client,
            key_id,
            algorithm,
            digest_alg,
            public_key,
        })
    }

    /// Set the context used by subsequent calls to [`Signer::sign`].
    ///
    /// Calls already in flight keep the context they started with. `None` resets to a
    /// background context.
    pub fn with_context(&self, ctx: impl Into<Option<Context>>) -> &Self {
        self.ctx.set(ctx.into());
        self
    }

    /// Sign `digest`, which must have been computed with [`Signer::digest_alg`].
    ///
    /// If `opts` declares a hash function it has to match as well. Uses the context set by
    /// [`Signer::with_context`].
    pub fn sign(&self, digest: &[u8], opts: Option<&SignOptions>) -> Result<Vec<u8>> {
        self.check_digest(digest, opts)?;
        let ctx = self.ctx.get();
        self.remote_sign(&ctx, digest)
    }

    /// Like [`Signer::sign`], with an explicit context instead of the one set on the signer.
    pub fn sign_with_context(
        &self,
        ctx: &Context,
        digest: &[u8],
        opts: Option<&SignOptions>,
    ) -> Result<Vec<u8>> {
        self.check_digest(digest, opts)?;
        self.remote_sign(ctx, digest)
    }

    fn remote_sign(&self, ctx: &Context, digest: &[u8]) -> Result<Vec<u8>> {
        let digest = Digest::new(self.digest_alg, digest.to_vec());

        debug!("AsymmetricSign {} ({})", self.key_id, self.algorithm);
        let resp = self
            .client
            .asymmetric_sign(
                ctx,
                AsymmetricSignRequest {
                    name: self.key_id.clone(),
                    digest,
                },
            )
            .context(RemoteSignFailedSnafu)?;
        trace!("received {} byte signature", resp.signature.len());

        Ok(resp.signature)
    }
}

impl<C: ?Sized> Signer<C> {
    /// The public key of the remote key version, fetched once at construction.
    pub fn public(&self) -> &PublicKey {
        &self.public_key
    }

    /// The digest algorithm callers have to hash with.
    pub fn digest_alg(&self) -> DigestAlgorithm {
        self.digest_alg
    }

    pub fn algorithm(&self) -> CryptoKeyVersionAlgorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn check_digest(&self, digest: &[u8], opts: Option<&SignOptions>) -> Result<()> {
        let expected = self.digest_alg.hash_algorithm();
        if let Some(found) = opts.and_then(|opts| opts.hash) {
            if found != expected {
                warn!("{}: rejecting {found} digest, key uses {expected}", self.key_id);
                return WrongHashFunctionSnafu { expected, found }.fail();
            }
        }

        if digest.len() != self.digest_alg.size() {
            warn!(
                "{}: rejecting digest of {} bytes, expected {}",
                self.key_id,
                digest.len(),
                self.digest_alg.size()
            );
            return WrongDigestLengthSnafu {
                expected: self.digest_alg.size(),
                found: digest.len(),
            }
            .fail();
        }

        Ok(())
    }
}

impl<C: KmsClient + ?Sized> AsymmetricSigner for Signer<C> {
    fn public(&self) -> &PublicKey {
        Signer::public(self)
    }

    fn sign(
        &self,
        _rng: &mut dyn CryptoRngCore,
        digest: &[u8],
        opts: Option<&SignOptions>,
    ) -> Result<Vec<u8>> {
        Signer::sign(self, digest, opts)
    }
}

impl<C: ?Sized> Keypair for Signer<C> {
    type VerifyingKey = PublicKey;

    fn verifying_key(&self) -> Self::VerifyingKey {
        self.public_key.clone()
    }
}

impl<C: KmsClient + ?Sized> PrehashSigner<Signature> for Signer<C> {
    fn sign_prehash(&self, prehash: &[u8]) -> signature::Result<Signature> {
        Signer::sign(self, prehash, None)
            .map(Signature::from)
            .map_err(signature::Error::from_source)
    }
}

impl<C: KmsClient + ?Sized> RandomizedPrehashSigner<Signature> for Signer<C> {
    fn sign_prehash_with_rng(
        &self,
        _rng: &mut impl CryptoRngCore,
        prehash: &[u8],
    ) -> signature::Result<Signature> {
        self.sign_prehash(prehash)
    }
}
