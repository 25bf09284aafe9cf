//! # Keystore
//!
//! Holds the issuer's ES256 signing key. The key is persisted as a PKCS#8
//! PEM file and loaded at startup. A key that is missing, unreadable, or
//! fails a sign/verify self-test is replaced by a freshly generated one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rand_core::OsRng;
use thiserror::Error;

use crate::jose::PublicKeyJwk;
use crate::provider::Signer;

const SELF_TEST_MSG: &[u8] = b"issuer key self-test";

/// Fatal key errors. The issuer cannot operate without a usable key.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The key file could not be read or written.
    #[error("key file {path}: {source}")]
    Io {
        /// Key file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The key could not be encoded.
    #[error("encoding key: {0}")]
    Encoding(String),

    /// A freshly generated key failed its sign/verify self-test.
    #[error("key self-test failed: {0}")]
    SelfTest(String),
}

/// The issuer's signing key together with its public JWK.
#[derive(Clone, Debug)]
pub struct Keyring {
    signing_key: SigningKey,
    jwk: PublicKeyJwk,
}

impl Keyring {
    /// Load the signing key from `path`, generating and saving a new key if
    /// the file is missing or holds an unusable key.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if a new key cannot be generated, validated, or
    /// written.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(pem) => match Self::from_pem(&pem) {
                Ok(keyring) => {
                    tracing::info!(kid = %keyring.jwk.kid, "loaded signing key");
                    return Ok(keyring);
                }
                Err(e) => tracing::warn!("stored signing key unusable, regenerating: {e}"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no signing key found, generating");
            }
            Err(e) => tracing::warn!("cannot read signing key, regenerating: {e}"),
        }

        let keyring = Self::generate()?;
        keyring.save(path)?;
        tracing::info!(kid = %keyring.jwk.kid, "generated signing key");
        Ok(keyring)
    }

    /// Generate a key that is never persisted.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::SelfTest`] if the generated key is unusable.
    pub fn ephemeral() -> Result<Self, KeyError> {
        Self::generate()
    }

    fn generate() -> Result<Self, KeyError> {
        Self::from_key(SigningKey::random(&mut OsRng))
            .map_err(|e| KeyError::SelfTest(e.to_string()))
    }

    fn from_pem(pem: &str) -> Result<Self> {
        let key = SigningKey::from_pkcs8_pem(pem).map_err(|e| anyhow::anyhow!("{e}"))?;
        Self::from_key(key)
    }

    fn from_key(signing_key: SigningKey) -> Result<Self> {
        let sig: Signature = signing_key.sign(SELF_TEST_MSG);
        signing_key
            .verifying_key()
            .verify(SELF_TEST_MSG, &sig)
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        let jwk = PublicKeyJwk::from_verifying_key(signing_key.verifying_key())?;
        Ok(Self { signing_key, jwk })
    }

    fn save(&self, path: &Path) -> Result<(), KeyError> {
        let io_err = |source| KeyError::Io { path: path.to_path_buf(), source };

        let pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(io_err)?;

        // `mode` only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
        file.write_all(pem.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)
    }

    /// The public JWK.
    #[must_use]
    pub const fn jwk(&self) -> &PublicKeyJwk {
        &self.jwk
    }
}

impl Signer for Keyring {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let sig: Signature = self.signing_key.sign(msg);
        Ok(sig.to_bytes().to_vec())
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        Ok(self.jwk.clone())
    }
}
