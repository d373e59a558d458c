//! PEM key pair parsing for TLS secrets

use crate::TlsError;
use rustls::crypto::ring::sign::any_supported_type;
use rustls::pki_types::PrivateKeyDer;
use rustls::sign::CertifiedKey;
use rustls_pemfile::{certs, read_all, Item};
use std::io::BufReader;
use std::sync::Arc;
use tracing::debug;

/// Secret data key holding the PEM certificate chain
pub const TLS_CERT_KEY: &str = "tls.crt";
/// Secret data key holding the PEM private key
pub const TLS_PRIVATE_KEY: &str = "tls.key";

/// Parse a PEM certificate chain and private key into a certified key.
///
/// The first PKCS#8, PKCS#1 or SEC1 key in `key_pem` is used. The leaf
/// certificate must be valid DER and carry the public half of that key.
pub fn parse_key_pair(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<CertifiedKey>, TlsError> {
    let mut cert_reader = BufReader::new(cert_pem);
    let chain = certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;

    if chain.is_empty() {
        return Err(TlsError::NoCertificates);
    }

    debug!("Loaded {} certificate(s)", chain.len());

    let mut key_reader = BufReader::new(key_pem);
    let items: Vec<_> = read_all(&mut key_reader).collect::<Result<_, _>>()?;

    let private_key = items
        .into_iter()
        .find_map(|item| match item {
            Item::Pkcs8Key(k) => Some(PrivateKeyDer::Pkcs8(k)),
            Item::Pkcs1Key(k) => Some(PrivateKeyDer::Pkcs1(k)),
            Item::Sec1Key(k) => Some(PrivateKeyDer::Sec1(k)),
            _ => None,
        })
        .ok_or(TlsError::NoPrivateKey)?;

    let signing_key = any_supported_type(&private_key)?;

    let certified = CertifiedKey::new(chain, signing_key);
    certified.keys_match().map_err(TlsError::KeyMismatch)?;

    Ok(Arc::new(certified))
}
