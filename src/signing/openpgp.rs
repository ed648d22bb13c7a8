// src/signing/openpgp.rs

//! OpenPGP verification of clear-signed control records
//!
//! Uses the sequoia-openpgp library (pure Rust implementation). Keyrings
//! are plain certificate files; every certificate they contain is trusted.

use super::{SignatureVerifier, VerifiedPayload};
use crate::error::{Error, Result};
use sequoia_openpgp as openpgp;
use openpgp::cert::CertParser;
use openpgp::parse::stream::{
    MessageLayer, MessageStructure, VerificationHelper, VerifierBuilder,
};
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::{Cert, KeyHandle};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Verifier for clear-signed uploads and source descriptors
pub struct OpenPgpVerifier {
    /// OpenPGP policy for signature verification
    policy: StandardPolicy<'static>,
}

impl Default for OpenPgpVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenPgpVerifier {
    pub fn new() -> Self {
        Self {
            policy: StandardPolicy::new(),
        }
    }

    fn load_keyrings(keyrings: &[PathBuf]) -> Result<Vec<Cert>> {
        let mut certs = Vec::new();

        for path in keyrings {
            let parser = CertParser::from_file(path).map_err(|e| {
                Error::Verification(format!("Failed to read keyring {}: {}", path.display(), e))
            })?;

            for cert in parser {
                match cert {
                    Ok(cert) => certs.push(cert),
                    Err(e) => warn!("Skipping unreadable certificate in {}: {}", path.display(), e),
                }
            }
        }

        debug!("Loaded {} certificates from {} keyrings", certs.len(), keyrings.len());
        Ok(certs)
    }
}

/// Streaming verifier callbacks: hand out the trusted certs, remember the signer
struct Helper {
    certs: Vec<Cert>,
    signer: Option<String>,
}

impl VerificationHelper for Helper {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
        Ok(self.certs.clone())
    }

    fn check(&mut self, structure: MessageStructure) -> openpgp::Result<()> {
        for layer in structure.into_iter() {
            if let MessageLayer::SignatureGroup { results } = layer {
                for result in results {
                    if let Ok(good) = result {
                        self.signer = Some(good.ka.cert().fingerprint().to_hex());
                        return Ok(());
                    }
                }
            }
        }

        Err(anyhow::anyhow!("No valid signature from a trusted key"))
    }
}

impl SignatureVerifier for OpenPgpVerifier {
    fn verify(&self, data: &[u8], keyrings: &[PathBuf]) -> Result<VerifiedPayload> {
        if keyrings.is_empty() {
            return Err(Error::Verification(
                "signature required but no keyrings configured".to_string(),
            ));
        }

        let certs = Self::load_keyrings(keyrings)?;
        if certs.is_empty() {
            return Err(Error::Verification(
                "no usable certificates in the configured keyrings".to_string(),
            ));
        }

        let helper = Helper {
            certs,
            signer: None,
        };

        let mut verifier = VerifierBuilder::from_bytes(data)
            .map_err(|e| Error::Verification(format!("Failed to parse signed data: {}", e)))?
            .with_policy(&self.policy, None, helper)
            .map_err(|e| Error::Verification(e.to_string()))?;

        let mut contents = Vec::new();
        verifier
            .read_to_end(&mut contents)
            .map_err(|e| Error::Verification(e.to_string()))?;

        let signer = verifier.into_helper().signer;
        match signer {
            Some(fingerprint) => {
                info!("Verified control record signed by {}", fingerprint);
                Ok(VerifiedPayload {
                    contents,
                    signer_fingerprint: Some(fingerprint),
                })
            }
            None => Err(Error::Verification(
                "No valid signatures found or verification failed".to_string(),
            )),
        }
    }
}
