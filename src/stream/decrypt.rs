// SPDX-License-Identifier: MPL-2.0

//! AES-128-CBC decryption of the stream message carried in song pages.

use aes::Aes128;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use std::fmt;
use tracing::debug;

use super::{DecryptStage, ResolveError};

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// Key and IV shared by every decryption.
///
/// These ship in the public web client and are not secret, but they must stay
/// byte-exact: a wrong byte usually yields garbage rather than a padding error.
pub static CIPHER_MATERIAL: CipherMaterial =
    CipherMaterial::from_ascii(b"g@1n!(f1#r.0$)&%", b"asd!@#!@#@!12312");

#[derive(Clone, Copy)]
pub struct CipherMaterial {
    key: [u8; 16],
    iv: [u8; 16],
}

impl CipherMaterial {
    pub const fn from_ascii(key: &[u8; 16], iv: &[u8; 16]) -> Self {
        Self { key: *key, iv: *iv }
    }
}

impl fmt::Debug for CipherMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherMaterial")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// Decrypt a base64 message into its UTF-8 plaintext
pub fn decrypt(message: &str, material: &CipherMaterial) -> Result<String, ResolveError> {
    let fail = |stage| {
        debug!(%stage, "stream message rejected");
        ResolveError::DecryptionFailed(stage)
    };

    let mut buf = STANDARD
        .decode(message.trim())
        .map_err(|_| fail(DecryptStage::Base64))?;
    if buf.is_empty() {
        return Err(fail(DecryptStage::Empty));
    }

    let plaintext = Aes128CbcDec::new(&material.key.into(), &material.iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| fail(DecryptStage::Padding))?;
    if plaintext.is_empty() {
        return Err(fail(DecryptStage::Empty));
    }

    std::str::from_utf8(plaintext)
        .map(str::to_owned)
        .map_err(|_| fail(DecryptStage::Utf8))
}

/// Produce a message in the same format the song pages carry.
///
/// Resolution never calls this. It exists for building song page fixtures,
/// in this crate's tests and in downstream ones.
pub fn encrypt(plaintext: &str, material: &CipherMaterial) -> String {
    let ciphertext = Aes128CbcEnc::new(&material.key.into(), &material.iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    STANDARD.encode(ciphertext)
}
