//! Shared RSA key material for tests.

use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use std::sync::OnceLock;

static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

pub fn private_key() -> &'static RsaPrivateKey {
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("generate test key")
    })
}

pub fn pkcs1_pem() -> String {
    private_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("encode PKCS#1")
        .to_string()
}

pub fn pkcs8_pem() -> String {
    private_key()
        .to_pkcs8_pem(LineEnding::LF)
        .expect("encode PKCS#8")
        .to_string()
}
