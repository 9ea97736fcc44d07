//! Key management service resources
//!
//! The storage operators read KMS settings from a connection-details config
//! map; credentials go into secrets next to it.

use super::{Payload, config_map, string_secret};
use crate::error::CoreError;
use crate::state::{KmipConfig, Kms, VaultConfig};
use crate::types::{KmsProvider, VaultAuthMethod};
use std::collections::BTreeMap;

pub const KMS_CONNECTION_DETAILS: &str = "ocs-kms-connection-details";
pub const KMS_TOKEN_SECRET: &str = "ocs-kms-token";
pub const KMS_CA_SECRET: &str = "ocs-kms-ca-secret";
pub const KMIP_CLIENT_SECRET: &str = "ocs-kmip-client-secret";

fn endpoint(address: &str, port: &str, scheme: Option<&str>) -> String {
    let address = address.trim_end_matches('/');
    let address = match scheme {
        Some(scheme) if !address.contains("://") => format!("{}://{}", scheme, address),
        _ => address.to_string(),
    };
    if port.is_empty() {
        address
    } else {
        format!("{}:{}", address, port)
    }
}

fn vault_payloads(vault: &VaultConfig, namespace: &str) -> Result<Vec<Payload>, CoreError> {
    let mut data = BTreeMap::new();
    data.insert("KMS_PROVIDER".to_string(), "vault".to_string());
    data.insert("KMS_SERVICE_NAME".to_string(), vault.name.clone());
    data.insert(
        "VAULT_ADDR".to_string(),
        endpoint(&vault.address, &vault.port, Some("https")),
    );
    data.insert("VAULT_BACKEND_PATH".to_string(), vault.backend.clone());
    data.insert("VAULT_TLS_SERVER_NAME".to_string(), vault.tls_server_name.clone());
    data.insert("VAULT_NAMESPACE".to_string(), vault.provider_namespace.clone());

    let mut payloads = Vec::new();
    match vault.auth_method {
        VaultAuthMethod::Token => {
            data.insert("VAULT_AUTH_METHOD".to_string(), "token".to_string());
            let mut token = BTreeMap::new();
            token.insert("token".to_string(), vault.token.clone());
            payloads.push(string_secret(KMS_TOKEN_SECRET, namespace, token)?);
        }
        VaultAuthMethod::Kubernetes => {
            data.insert("VAULT_AUTH_METHOD".to_string(), "kubernetes".to_string());
            data.insert("VAULT_AUTH_KUBERNETES_ROLE".to_string(), vault.role.clone());
        }
    }

    if let Some(ca) = &vault.ca_cert {
        data.insert("VAULT_CACERT".to_string(), KMS_CA_SECRET.to_string());
        let mut ca_data = BTreeMap::new();
        ca_data.insert("cert".to_string(), ca.clone());
        payloads.push(string_secret(KMS_CA_SECRET, namespace, ca_data)?);
    }

    payloads.insert(0, config_map(KMS_CONNECTION_DETAILS, namespace, data)?);
    Ok(payloads)
}

fn kmip_payloads(kmip: &KmipConfig, namespace: &str) -> Result<Vec<Payload>, CoreError> {
    let mut data = BTreeMap::new();
    data.insert("KMS_PROVIDER".to_string(), "kmip".to_string());
    data.insert("KMS_SERVICE_NAME".to_string(), kmip.name.clone());
    data.insert("KMIP_ENDPOINT".to_string(), endpoint(&kmip.address, &kmip.port, None));
    data.insert("KMIP_SECRET_NAME".to_string(), KMIP_CLIENT_SECRET.to_string());
    data.insert("TLS_SERVER_NAME".to_string(), kmip.tls_server_name.clone());

    let mut secret = BTreeMap::new();
    secret.insert("CA_CERT".to_string(), kmip.client_ca.clone());
    secret.insert("CLIENT_CERT".to_string(), kmip.client_cert.clone());
    secret.insert("CLIENT_KEY".to_string(), kmip.client_key.clone());
    secret.insert("UNIQUE_IDENTIFIER".to_string(), kmip.unique_identifier.clone());

    Ok(vec![
        config_map(KMS_CONNECTION_DETAILS, namespace, data)?,
        string_secret(KMIP_CLIENT_SECRET, namespace, secret)?,
    ])
}

/// Config map first, then the credential secrets
pub fn kms_payloads(kms: &Kms, namespace: &str) -> Result<Vec<Payload>, CoreError> {
    match kms.provider {
        KmsProvider::Vault => vault_payloads(&kms.vault, namespace),
        KmsProvider::Kmip => kmip_payloads(&kms.kmip, namespace),
    }
}
