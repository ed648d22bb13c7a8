// src/signing/mod.rs

//! Signature wrapper around control records
//!
//! Parsing never looks at signature syntax itself. A [`SignatureVerifier`]
//! turns the signed bytes into the inner payload plus the signer identity;
//! callers that explicitly opt out of verification go through
//! [`strip_cleartext_armor`] instead.

mod addresses;
mod openpgp;

pub use addresses::{
    mail_addresses_for_upload, parse_gpg_listing, GpgListing, KeyAddressCache, KeyAddressSource,
};
pub use openpgp::OpenPgpVerifier;

use crate::error::Result;
use std::path::PathBuf;

const SIGNED_HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";

/// Inner payload of a signed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    pub contents: Vec<u8>,
    /// Primary key fingerprint of the signer, when a signature was checked
    pub signer_fingerprint: Option<String>,
}

/// Pluggable signature checker
pub trait SignatureVerifier {
    /// Verify `data` against the given keyrings and return the signed payload
    fn verify(&self, data: &[u8], keyrings: &[PathBuf]) -> Result<VerifiedPayload>;
}

/// How a control record's signature is treated during parsing
#[derive(Clone, Copy)]
pub enum Verification<'a> {
    /// No signature check (untrusted previews); armor is still removed
    Skip,
    /// A good signature from one of `keyrings` is mandatory
    Required {
        verifier: &'a dyn SignatureVerifier,
        keyrings: &'a [PathBuf],
    },
}

impl Verification<'_> {
    /// Produce the payload to tokenize
    pub fn payload(&self, data: &[u8]) -> Result<VerifiedPayload> {
        match self {
            Self::Skip => Ok(VerifiedPayload {
                contents: strip_cleartext_armor(data),
                signer_fingerprint: None,
            }),
            Self::Required { verifier, keyrings } => verifier.verify(data, keyrings),
        }
    }
}

/// Remove a clear-sign wrapper without checking it
///
/// Unsigned input is returned unchanged. The armor header block (up to the
/// first blank line) and everything from the signature block on are
/// dropped, and dash-escaped lines are unescaped.
pub fn strip_cleartext_armor(data: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(data);
    if !text.trim_start().starts_with(SIGNED_HEADER) {
        return data.to_vec();
    }

    let mut out = String::with_capacity(text.len());
    let mut lines = text.lines().skip_while(|l| l.trim_end() != SIGNED_HEADER);
    lines.next();

    // Armor headers ("Hash: SHA512") end at the first blank line
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
    }

    for line in lines {
        if line.trim_end() == SIGNATURE_HEADER {
            break;
        }
        let line = line.strip_prefix("- ").unwrap_or(line);
        out.push_str(line);
        out.push('\n');
    }

    // The line ending before the signature block belongs to the armor
    if out.ends_with('\n') {
        out.pop();
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_passthrough() {
        let data = b"Source: hello\nVersion: 1.0\n";
        assert_eq!(strip_cleartext_armor(data), data.to_vec());
    }

    #[test]
    fn test_strip_armor() {
        let data = b"-----BEGIN PGP SIGNED MESSAGE-----\n\
Hash: SHA256\n\
\n\
Source: hello\n\
- -dashed: value\n\
-----BEGIN PGP SIGNATURE-----\n\
\n\
iQIzBAEBCAAdFiEE\n\
-----END PGP SIGNATURE-----\n";
        let payload = String::from_utf8(strip_cleartext_armor(data)).unwrap();
        assert_eq!(payload, "Source: hello\n-dashed: value");
    }

    #[test]
    fn test_skip_has_no_signer() {
        let payload = Verification::Skip.payload(b"Source: x\n").unwrap();
        assert!(payload.signer_fingerprint.is_none());
    }
}
