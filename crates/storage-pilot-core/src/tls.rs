//! Inspection of uploaded PEM certificates
//!
//! The KMS CA, KMIP client certificate and Postgres client certificate are
//! pasted as PEM. They are parsed before submission so a truncated or expired
//! file is caught in the wizard rather than by the operator.

use crate::error::CoreError;
use x509_parser::pem::parse_x509_pem;

/// Summary of a parsed certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    /// Validity bounds as unix timestamps
    pub not_before: i64,
    pub not_after: i64,
    pub is_ca: bool,
}

impl CertificateInfo {
    pub fn is_valid_at(&self, unix_time: i64) -> bool {
        self.not_before <= unix_time && unix_time <= self.not_after
    }
}

/// Parse the first certificate of a PEM document
pub fn inspect_pem(pem: &str) -> Result<CertificateInfo, CoreError> {
    let (_, pem) = parse_x509_pem(pem.trim().as_bytes())
        .map_err(|e| CoreError::Certificate(format!("invalid PEM: {}", e)))?;
    if pem.label != "CERTIFICATE" {
        return Err(CoreError::Certificate(format!(
            "expected a CERTIFICATE block, found {}",
            pem.label
        )));
    }
    let cert = pem
        .parse_x509()
        .map_err(|e| CoreError::Certificate(e.to_string()))?;

    let validity = cert.validity();
    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before: validity.not_before.timestamp(),
        not_after: validity.not_after.timestamp(),
        is_ca: cert.is_ca(),
    })
}

/// Whether the text looks like a PEM private key
pub fn is_private_key_pem(pem: &str) -> bool {
    match parse_x509_pem(pem.trim().as_bytes()) {
        Ok((_, pem)) => pem.label.ends_with("PRIVATE KEY"),
        Err(_) => false,
    }
}
