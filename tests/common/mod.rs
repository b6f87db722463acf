#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use gcpkms::{
    algorithm::SignatureScheme, client::*, errors::BoxError, CryptoKeyVersionAlgorithm,
    DigestAlgorithm, KmsClient,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rsa::{pkcs8::DecodePrivateKey, Oaep, Pkcs1v15Sign, Pss, RsaPrivateKey};
use signature::hazmat::PrehashSigner;

pub const RSA2048_KEY: &str = include_str!("../fixtures/rsa2048.key.pem");
pub const RSA2048_PUB: &str = include_str!("../fixtures/rsa2048.pub.pem");
pub const RSA4096_KEY: &str = include_str!("../fixtures/rsa4096.key.pem");
pub const RSA4096_PUB: &str = include_str!("../fixtures/rsa4096.pub.pem");
pub const P256_KEY: &str = include_str!("../fixtures/p256.key.pem");
pub const P256_PUB: &str = include_str!("../fixtures/p256.pub.pem");
pub const P384_KEY: &str = include_str!("../fixtures/p384.key.pem");
pub const P384_PUB: &str = include_str!("../fixtures/p384.pub.pem");

pub const RSA_SIGN_KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/rsa-sign/cryptoKeyVersions/1";
pub const RSA_DECRYPT_KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/rsa-decrypt/cryptoKeyVersions/1";
pub const EC_SIGN_KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/ec-sign/cryptoKeyVersions/1";

enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

struct Entry {
    algorithm: CryptoKeyVersionAlgorithm,
    private: PrivateKey,
    public_pem: String,
}

/// An in-memory key management service holding real private keys.
#[derive(Default)]
pub struct FakeKms {
    keys: HashMap<String, Entry>,
    calls: AtomicUsize,
    blocking: AtomicBool,
    started: Mutex<Option<mpsc::Sender<()>>>,
    rng: Mutex<Option<ChaCha8Rng>>,
}

impl FakeKms {
    pub fn new() -> Self {
        FakeKms {
            rng: Mutex::new(Some(ChaCha8Rng::seed_from_u64(42))),
            ..Default::default()
        }
    }

    /// Register a key version. `key_pem` is a PKCS#8 private key matching `algorithm`.
    pub fn with_key(
        mut self,
        name: &str,
        algorithm: CryptoKeyVersionAlgorithm,
        key_pem: &str,
        public_pem: &str,
    ) -> Self {
        let private = match algorithm {
            CryptoKeyVersionAlgorithm::EcSignP256Sha256 => {
                PrivateKey::P256(p256::ecdsa::SigningKey::from_pkcs8_pem(key_pem).unwrap())
            }
            CryptoKeyVersionAlgorithm::EcSignP384Sha384 => {
                PrivateKey::P384(p384::ecdsa::SigningKey::from_pkcs8_pem(key_pem).unwrap())
            }
            _ => PrivateKey::Rsa(RsaPrivateKey::from_pkcs8_pem(key_pem).unwrap()),
        };
        self.keys.insert(
            name.to_string(),
            Entry {
                algorithm,
                private,
                public_pem: public_pem.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following decrypt call hang until its context is done.
    ///
    /// The returned receiver gets a message each time such a call has started.
    pub fn block_decrypts(&self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel();
        *self.started.lock() = Some(tx);
        self.blocking.store(true, Ordering::SeqCst);
        rx
    }

    pub fn unblock_decrypts(&self) {
        self.blocking.store(false, Ordering::SeqCst);
    }

    fn enter(&self, ctx: &gcpkms::Context, name: &str) -> Result<&Entry, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        self.keys
            .get(name)
            .ok_or_else(|| format!("{name} not found").into())
    }
}

fn hash_of(algorithm: CryptoKeyVersionAlgorithm) -> DigestAlgorithm {
    algorithm.digest_algorithm().unwrap()
}

impl KmsClient for FakeKms {
    fn get_crypto_key_version(
        &self,
        ctx: &gcpkms::Context,
        req: GetCryptoKeyVersionRequest,
    ) -> Result<CryptoKeyVersion, BoxError> {
        let entry = self.enter(ctx, &req.name)?;
        Ok(CryptoKeyVersion {
            name: req.name,
            algorithm: entry.algorithm,
        })
    }

    fn get_public_key(
        &self,
        ctx: &gcpkms::Context,
        req: GetPublicKeyRequest,
    ) -> Result<PublicKeyResponse, BoxError> {
        let entry = self.enter(ctx, &req.name)?;
        Ok(PublicKeyResponse {
            pem: entry.public_pem.clone(),
            algorithm: entry.algorithm,
        })
    }

    fn asymmetric_sign(
        &self,
        ctx: &gcpkms::Context,
        req: AsymmetricSignRequest,
    ) -> Result<AsymmetricSignResponse, BoxError> {
        let entry = self.enter(ctx, &req.name)?;
        if req.digest.algorithm() != hash_of(entry.algorithm) {
            let msg = format!("digest {:?} does not match {}", req.digest, entry.algorithm);
            return Err(msg.into());
        }
        let digest = req.digest.as_bytes();

        let signature = match &entry.private {
            PrivateKey::Rsa(key)
                if entry.algorithm.signature_scheme() == Some(SignatureScheme::RsaPss) =>
            {
                let mut rng = self.rng.lock();
                let rng = rng.as_mut().unwrap();
                match hash_of(entry.algorithm) {
                    DigestAlgorithm::Sha256 => {
                        key.sign_with_rng(rng, Pss::new::<sha2::Sha256>(), digest)?
                    }
                    DigestAlgorithm::Sha384 => {
                        key.sign_with_rng(rng, Pss::new::<sha2::Sha384>(), digest)?
                    }
                    DigestAlgorithm::Sha512 => {
                        key.sign_with_rng(rng, Pss::new::<sha2::Sha512>(), digest)?
                    }
                }
            }
            PrivateKey::Rsa(key) => match hash_of(entry.algorithm) {
                DigestAlgorithm::Sha256 => key.sign(Pkcs1v15Sign::new::<sha2::Sha256>(), digest)?,
                DigestAlgorithm::Sha384 => key.sign(Pkcs1v15Sign::new::<sha2::Sha384>(), digest)?,
                DigestAlgorithm::Sha512 => key.sign(Pkcs1v15Sign::new::<sha2::Sha512>(), digest)?,
            },
            PrivateKey::P256(key) => {
                let sig: p256::ecdsa::Signature = key.sign_prehash(digest)?;
                sig.to_der().as_bytes().to_vec()
            }
            PrivateKey::P384(key) => {
                let sig: p384::ecdsa::Signature = key.sign_prehash(digest)?;
                sig.to_der().as_bytes().to_vec()
            }
        };

        Ok(AsymmetricSignResponse { signature })
    }

    fn asymmetric_decrypt(
        &self,
        ctx: &gcpkms::Context,
        req: AsymmetricDecryptRequest,
    ) -> Result<AsymmetricDecryptResponse, BoxError> {
        let entry = self.enter(ctx, &req.name)?;

        if self.blocking.load(Ordering::SeqCst) {
            if let Some(started) = self.started.lock().as_ref() {
                let _ = started.send(());
            }
            loop {
                if let Some(err) = ctx.err() {
                    return Err(err.into());
                }
                if !self.blocking.load(Ordering::SeqCst) {
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        let PrivateKey::Rsa(key) = &entry.private else {
            return Err("not a decryption key".into());
        };
        let hash = entry
            .algorithm
            .oaep_hash()
            .ok_or("not a decryption key")?;
        let plaintext = match hash {
            DigestAlgorithm::Sha256 => key.decrypt(Oaep::new::<sha2::Sha256>(), &req.ciphertext)?,
            DigestAlgorithm::Sha384 => key.decrypt(Oaep::new::<sha2::Sha384>(), &req.ciphertext)?,
            DigestAlgorithm::Sha512 => key.decrypt(Oaep::new::<sha2::Sha512>(), &req.ciphertext)?,
        };

        Ok(AsymmetricDecryptResponse { plaintext })
    }
}

/// A fake with one RSA signing key, one RSA decryption key and one P-256 signing key.
pub fn fake_kms() -> Arc<FakeKms> {
    Arc::new(
        FakeKms::new()
            .with_key(
                RSA_SIGN_KEY,
                CryptoKeyVersionAlgorithm::RsaSignPss4096Sha512,
                RSA4096_KEY,
                RSA4096_PUB,
            )
            .with_key(
                RSA_DECRYPT_KEY,
                CryptoKeyVersionAlgorithm::RsaDecryptOaep4096Sha512,
                RSA4096_KEY,
                RSA4096_PUB,
            )
            .with_key(
                EC_SIGN_KEY,
                CryptoKeyVersionAlgorithm::EcSignP256Sha256,
                P256_KEY,
                P256_PUB,
            ),
    )
}
