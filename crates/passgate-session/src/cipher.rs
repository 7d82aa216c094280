//! Secret cipher seam.
//!
//! The session layer never touches key material directly: it hands the
//! verified fingerprint to a [`SecretCipher`] as the passphrase.

use std::future::Future;

use passgate_core::Environment;
use passgate_crypto::{decrypt_armored, encrypt_armored};

use crate::CipherError;

/// Armored passphrase encryption.
///
/// Implementations are stateless with respect to the session; the same
/// passphrase must open what it sealed.
pub trait SecretCipher: Send + Sync + 'static {
    /// Seal `plaintext` into an armored message.
    fn encrypt(
        &self,
        plaintext: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<String, CipherError>> + Send;

    /// Open an armored message.
    fn decrypt(
        &self,
        armored: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<String, CipherError>> + Send;
}

/// Production cipher over `passgate-crypto`.
///
/// Salt and nonce come from the environment. The KDF runs on the blocking
/// pool so a slow derivation never stalls the async runtime.
#[derive(Debug, Clone)]
pub struct ArmoredCipher<E: Environment> {
    env: E,
    kdf_rounds: u32,
}

impl<E: Environment> ArmoredCipher<E> {
    /// Create a cipher sealing new messages with `kdf_rounds`.
    ///
    /// Opening uses whatever round count the message header carries.
    pub fn new(env: E, kdf_rounds: u32) -> Self {
        Self { env, kdf_rounds }
    }
}

impl<E: Environment> SecretCipher for ArmoredCipher<E> {
    fn encrypt(
        &self,
        plaintext: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<String, CipherError>> + Send {
        let plaintext = plaintext.to_owned();
        let passphrase = passphrase.to_owned();
        let salt = self.env.random_array();
        let nonce = self.env.random_array();
        let rounds = self.kdf_rounds;

        async move {
            tokio::task::spawn_blocking(move || {
                encrypt_armored(plaintext.as_bytes(), &passphrase, rounds, salt, nonce)
            })
            .await
            .map_err(|e| CipherError::Worker(e.to_string()))?
            .map_err(CipherError::Encryption)
        }
    }

    fn decrypt(
        &self,
        armored: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<String, CipherError>> + Send {
        let armored = armored.to_owned();
        let passphrase = passphrase.to_owned();

        async move {
            let plaintext =
                tokio::task::spawn_blocking(move || decrypt_armored(&armored, &passphrase))
                    .await
                    .map_err(|e| CipherError::Worker(e.to_string()))?
                    .map_err(CipherError::Decryption)?;

            String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
        }
    }
}

#[cfg(test)]
mod tests {
    use passgate_core::SystemEnv;
    use passgate_crypto::{ARMOR_HEADER, CryptoError, MIN_KDF_ROUNDS};

    use super::*;

    fn cipher() -> ArmoredCipher<SystemEnv> {
        ArmoredCipher::new(SystemEnv::new(), MIN_KDF_ROUNDS)
    }

    #[tokio::test]
    async fn roundtrip() {
        let cipher = cipher();
        let armored = cipher.encrypt("hello", "passphrase").await.unwrap();

        assert!(armored.starts_with(ARMOR_HEADER));
        assert_eq!(cipher.decrypt(&armored, "passphrase").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn fresh_salt_and_nonce_per_message() {
        let cipher = cipher();
        let a = cipher.encrypt("same", "p").await.unwrap();
        let b = cipher.encrypt("same", "p").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn wrong_passphrase_is_decryption_error() {
        let cipher = cipher();
        let armored = cipher.encrypt("secret", "right").await.unwrap();

        assert_eq!(
            cipher.decrypt(&armored, "wrong").await,
            Err(CipherError::Decryption(CryptoError::DecryptionFailed))
        );
    }

    #[tokio::test]
    async fn garbage_is_decryption_error() {
        let result = cipher().decrypt("not armor", "p").await;
        assert!(matches!(result, Err(CipherError::Decryption(CryptoError::MalformedArmor { .. }))));
    }

    #[tokio::test]
    async fn invalid_rounds_is_encryption_error() {
        let cipher = ArmoredCipher::new(SystemEnv::new(), 1);
        assert_eq!(
            cipher.encrypt("x", "p").await,
            Err(CipherError::Encryption(CryptoError::InvalidKdfRounds(1)))
        );
    }
}
