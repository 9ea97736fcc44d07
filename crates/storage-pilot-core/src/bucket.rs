//! S3 bucket administration documents
//!
//! Typed bucket policy, CORS and public access block documents using the
//! exact S3 JSON field names, a few policy templates, and the
//! [`BucketAdmin`] seam the object gateway client sits behind.

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use thiserror::Error;

pub const POLICY_VERSION: &str = "2012-10-17";
const LEGACY_POLICY_VERSION: &str = "2008-10-17";
const S3_ARN_PREFIX: &str = "arn:aws:s3:::";
const CORS_METHODS: &[&str] = &["GET", "PUT", "POST", "DELETE", "HEAD"];
const MAX_CORS_RULES: usize = 100;

/// A single value or a list, both accepted by S3
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: Vec<&str> = match self {
            OneOrMany::One(value) => vec![value.as_str()],
            OneOrMany::Many(values) => values.iter().map(String::as_str).collect(),
        };
        items.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(value) => value.is_empty(),
            OneOrMany::Many(values) => values.is_empty(),
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// `"*"` or `{"AWS": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    Wildcard(String),
    Aws {
        #[serde(rename = "AWS")]
        aws: OneOrMany,
    },
}

impl Principal {
    pub fn anyone() -> Self {
        Principal::Wildcard("*".to_string())
    }

    pub fn is_anyone(&self) -> bool {
        match self {
            Principal::Wildcard(p) => p == "*",
            Principal::Aws { aws } => aws.iter().any(|p| p == "*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    pub principal: Principal,
    pub action: OneOrMany,
    pub resource: OneOrMany,
    /// Operator → key → value(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<BTreeMap<String, BTreeMap<String, serde_json::Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl BucketPolicy {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(|e| CoreError::InvalidDocument(e.to_string()))
    }

    /// Grants access to anyone without a condition
    pub fn is_public(&self) -> bool {
        self.statement.iter().any(|s| {
            s.effect == Effect::Allow && s.principal.is_anyone() && s.condition.is_none()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorsRule {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_headers: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfiguration {
    #[serde(rename = "CORSRules")]
    pub cors_rules: Vec<CorsRule>,
}

impl CorsConfiguration {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(|e| CoreError::InvalidDocument(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlockConfiguration {
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfiguration {
    pub fn block_all() -> Self {
        Self {
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidDocument(reason.into())
}

/// Structural checks S3 applies on `PutBucketPolicy`.
///
/// With `bucket` set every resource must also refer to that bucket.
pub fn validate_policy(policy: &BucketPolicy, bucket: Option<&str>) -> Result<(), CoreError> {
    if policy.version != POLICY_VERSION && policy.version != LEGACY_POLICY_VERSION {
        return Err(invalid(format!(
            "unsupported policy version {}",
            policy.version
        )));
    }
    if policy.statement.is_empty() {
        return Err(invalid("policy has no statements"));
    }

    let mut sids = BTreeSet::new();
    for (index, statement) in policy.statement.iter().enumerate() {
        let at = |reason: &str| invalid(format!("statement {}: {}", index, reason));

        if let Some(sid) = &statement.sid {
            if !sids.insert(sid.as_str()) {
                return Err(at(&format!("duplicate Sid {}", sid)));
            }
        }
        if matches!(&statement.principal, Principal::Wildcard(p) if p != "*") {
            return Err(at("principal must be \"*\" or an AWS principal map"));
        }
        if statement.action.is_empty() {
            return Err(at("no actions"));
        }
        if let Some(action) = statement.action.iter().find(|a| !a.starts_with("s3:")) {
            return Err(at(&format!("action {} is not an s3 action", action)));
        }
        if statement.resource.is_empty() {
            return Err(at("no resources"));
        }
        for resource in statement.resource.iter() {
            let Some(path) = resource.strip_prefix(S3_ARN_PREFIX) else {
                return Err(at(&format!("resource {} is not an S3 ARN", resource)));
            };
            if let Some(bucket) = bucket {
                let resource_bucket = path.split('/').next().unwrap_or_default();
                if resource_bucket != bucket && resource_bucket != "*" {
                    return Err(at(&format!(
                        "resource {} does not belong to bucket {}",
                        resource, bucket
                    )));
                }
            }
        }
    }
    Ok(())
}

pub fn validate_cors(config: &CorsConfiguration) -> Result<(), CoreError> {
    if config.cors_rules.is_empty() {
        return Err(invalid("CORS configuration has no rules"));
    }
    if config.cors_rules.len() > MAX_CORS_RULES {
        return Err(invalid(format!(
            "at most {} CORS rules are allowed",
            MAX_CORS_RULES
        )));
    }
    for (index, rule) in config.cors_rules.iter().enumerate() {
        let at = |reason: String| invalid(format!("rule {}: {}", index, reason));

        if rule.allowed_methods.is_empty() {
            return Err(at("no allowed methods".to_string()));
        }
        if let Some(method) = rule
            .allowed_methods
            .iter()
            .find(|m| !CORS_METHODS.contains(&m.as_str()))
        {
            return Err(at(format!("unsupported method {}", method)));
        }
        if rule.allowed_origins.is_empty() {
            return Err(at("no allowed origins".to_string()));
        }
        if let Some(origin) = rule
            .allowed_origins
            .iter()
            .find(|o| o.matches('*').count() > 1)
        {
            return Err(at(format!("origin {} has more than one wildcard", origin)));
        }
        if let Some(header) = rule
            .allowed_headers
            .iter()
            .find(|h| h.matches('*').count() > 1)
        {
            return Err(at(format!("header {} has more than one wildcard", header)));
        }
    }
    Ok(())
}

/// Ready-made bucket policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyTemplate {
    /// Anyone may read objects
    PublicRead,
    /// Full access for one account
    AccountAccess,
    /// Deny requests not made over TLS
    SecureTransport,
    /// Deny object deletion to everyone
    DenyDelete,
}

impl PolicyTemplate {
    pub fn render(&self, bucket: &str, account: Option<&str>) -> Result<BucketPolicy, CoreError> {
        let bucket_arn = format!("{}{}", S3_ARN_PREFIX, bucket);
        let objects_arn = format!("{}/*", bucket_arn);

        let statement = match self {
            PolicyTemplate::PublicRead => Statement {
                sid: Some("PublicRead".to_string()),
                effect: Effect::Allow,
                principal: Principal::anyone(),
                action: "s3:GetObject".into(),
                resource: objects_arn.as_str().into(),
                condition: None,
            },
            PolicyTemplate::AccountAccess => {
                let account = account
                    .filter(|a| !a.trim().is_empty())
                    .ok_or_else(|| invalid("account access needs an account"))?;
                Statement {
                    sid: Some("AccountAccess".to_string()),
                    effect: Effect::Allow,
                    principal: Principal::Aws {
                        aws: vec![account.to_string()].into(),
                    },
                    action: "s3:*".into(),
                    resource: vec![bucket_arn, objects_arn].into(),
                    condition: None,
                }
            }
            PolicyTemplate::SecureTransport => {
                let mut secure = BTreeMap::new();
                secure.insert(
                    "aws:SecureTransport".to_string(),
                    serde_json::Value::String("false".to_string()),
                );
                let mut condition = BTreeMap::new();
                condition.insert("Bool".to_string(), secure);
                Statement {
                    sid: Some("EnforceSecureTransport".to_string()),
                    effect: Effect::Deny,
                    principal: Principal::anyone(),
                    action: "s3:*".into(),
                    resource: vec![bucket_arn, objects_arn].into(),
                    condition: Some(condition),
                }
            }
            PolicyTemplate::DenyDelete => Statement {
                sid: Some("DenyDelete".to_string()),
                effect: Effect::Deny,
                principal: Principal::anyone(),
                action: "s3:DeleteObject".into(),
                resource: objects_arn.as_str().into(),
                condition: None,
            },
        };

        Ok(BucketPolicy {
            version: POLICY_VERSION.to_string(),
            statement: vec![statement],
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("No such bucket: {0}")]
    NoSuchBucket(String),

    /// Rejected by the bucket's public access block
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid document: {0}")]
    Invalid(String),

    #[error("{0}")]
    Backend(String),
}

impl From<CoreError> for BucketError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDocument(reason) => BucketError::Invalid(reason),
            other => BucketError::Backend(other.to_string()),
        }
    }
}

/// Bucket administration calls of the object gateway
#[async_trait]
pub trait BucketAdmin: Send + Sync {
    async fn get_bucket_policy(&self, bucket: &str) -> Result<Option<BucketPolicy>, BucketError>;
    async fn put_bucket_policy(&self, bucket: &str, policy: &BucketPolicy)
    -> Result<(), BucketError>;
    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), BucketError>;

    async fn get_bucket_cors(&self, bucket: &str) -> Result<Option<CorsConfiguration>, BucketError>;
    async fn put_bucket_cors(&self, bucket: &str, cors: &CorsConfiguration)
    -> Result<(), BucketError>;
    async fn delete_bucket_cors(&self, bucket: &str) -> Result<(), BucketError>;

    async fn get_public_access_block(
        &self,
        bucket: &str,
    ) -> Result<Option<PublicAccessBlockConfiguration>, BucketError>;
    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: &PublicAccessBlockConfiguration,
    ) -> Result<(), BucketError>;
}

#[derive(Debug, Default, Clone)]
struct BucketDocuments {
    policy: Option<BucketPolicy>,
    cors: Option<CorsConfiguration>,
    public_access_block: Option<PublicAccessBlockConfiguration>,
}

/// In-memory [`BucketAdmin`] applying the same validation as the gateway
#[derive(Debug, Default)]
pub struct MemoryBucketAdmin {
    buckets: Mutex<HashMap<String, BucketDocuments>>,
}

impl MemoryBucketAdmin {
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buckets = names
            .into_iter()
            .map(|name| (name.into(), BucketDocuments::default()))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    fn with_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut BucketDocuments) -> Result<T, BucketError>,
    ) -> Result<T, BucketError> {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let documents = buckets
            .get_mut(bucket)
            .ok_or_else(|| BucketError::NoSuchBucket(bucket.to_string()))?;
        f(documents)
    }
}

#[async_trait]
impl BucketAdmin for MemoryBucketAdmin {
    async fn get_bucket_policy(&self, bucket: &str) -> Result<Option<BucketPolicy>, BucketError> {
        self.with_bucket(bucket, |docs| Ok(docs.policy.clone()))
    }

    async fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Result<(), BucketError> {
        validate_policy(policy, Some(bucket))?;
        self.with_bucket(bucket, |docs| {
            let blocked = docs
                .public_access_block
                .is_some_and(|pab| pab.block_public_policy);
            if blocked && policy.is_public() {
                return Err(BucketError::AccessDenied(format!(
                    "public policies are blocked on {}",
                    bucket
                )));
            }
            tracing::debug!(bucket, "put bucket policy");
            docs.policy = Some(policy.clone());
            Ok(())
        })
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), BucketError> {
        self.with_bucket(bucket, |docs| {
            docs.policy = None;
            Ok(())
        })
    }

    async fn get_bucket_cors(&self, bucket: &str) -> Result<Option<CorsConfiguration>, BucketError> {
        self.with_bucket(bucket, |docs| Ok(docs.cors.clone()))
    }

    async fn put_bucket_cors(
        &self,
        bucket: &str,
        cors: &CorsConfiguration,
    ) -> Result<(), BucketError> {
        validate_cors(cors)?;
        self.with_bucket(bucket, |docs| {
            docs.cors = Some(cors.clone());
            Ok(())
        })
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> Result<(), BucketError> {
        self.with_bucket(bucket, |docs| {
            docs.cors = None;
            Ok(())
        })
    }

    async fn get_public_access_block(
        &self,
        bucket: &str,
    ) -> Result<Option<PublicAccessBlockConfiguration>, BucketError> {
        self.with_bucket(bucket, |docs| Ok(docs.public_access_block))
    }

    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: &PublicAccessBlockConfiguration,
    ) -> Result<(), BucketError> {
        self.with_bucket(bucket, |docs| {
            docs.public_access_block = Some(*config);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aws_policy_forms() {
        let raw = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Sid": "Read",
                    "Effect": "Allow",
                    "Principal": {"AWS": ["arn:aws:iam::123456789012:root"]},
                    "Action": ["s3:GetObject", "s3:ListBucket"],
                    "Resource": "arn:aws:s3:::logs/*"
                },
                {
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "s3:*",
                    "Resource": ["arn:aws:s3:::logs", "arn:aws:s3:::logs/*"],
                    "Condition": {"Bool": {"aws:SecureTransport": "false"}}
                }
            ]
        }"#;
        let policy = BucketPolicy::from_json(raw).unwrap();
        assert_eq!(policy.statement.len(), 2);
        assert!(!policy.is_public());
        assert!(validate_policy(&policy, Some("logs")).is_ok());
        assert!(validate_policy(&policy, Some("other")).is_err());

        let value = serde_json::to_value(&policy).unwrap();
        assert_eq!(value["Statement"][1]["Principal"], "*");
        assert_eq!(
            value["Statement"][0]["Principal"]["AWS"][0],
            "arn:aws:iam::123456789012:root"
        );
        assert!(value["Statement"][1].get("Sid").is_none());
    }

    #[test]
    fn test_policy_validation_errors() {
        let mut policy = PolicyTemplate::PublicRead.render("site", None).unwrap();
        policy.version = "2020-01-01".to_string();
        assert!(validate_policy(&policy, None).is_err());

        let mut policy = PolicyTemplate::PublicRead.render("site", None).unwrap();
        policy.statement[0].action = "ec2:RunInstances".into();
        let err = validate_policy(&policy, None).unwrap_err();
        assert!(err.to_string().contains("not an s3 action"));

        let mut policy = PolicyTemplate::PublicRead.render("site", None).unwrap();
        policy.statement.push(policy.statement[0].clone());
        assert!(validate_policy(&policy, None).unwrap_err().to_string().contains("duplicate Sid"));

        let mut policy = PolicyTemplate::PublicRead.render("site", None).unwrap();
        policy.statement[0].resource = "site/*".into();
        assert!(validate_policy(&policy, None).is_err());

        let policy = BucketPolicy {
            version: POLICY_VERSION.to_string(),
            statement: vec![],
        };
        assert!(validate_policy(&policy, None).is_err());
    }

    #[test]
    fn test_templates() {
        let public = PolicyTemplate::PublicRead.render("site", None).unwrap();
        assert!(public.is_public());

        assert!(PolicyTemplate::AccountAccess.render("site", None).is_err());
        let account = PolicyTemplate::AccountAccess
            .render("site", Some("arn:aws:iam::123456789012:root"))
            .unwrap();
        assert!(!account.is_public());
        assert_eq!(account.statement[0].resource.iter().count(), 2);

        let secure = PolicyTemplate::SecureTransport.render("site", None).unwrap();
        let value = serde_json::to_value(&secure).unwrap();
        assert_eq!(
            value["Statement"][0]["Condition"]["Bool"]["aws:SecureTransport"],
            "false"
        );

        for template in [
            PolicyTemplate::PublicRead,
            PolicyTemplate::SecureTransport,
            PolicyTemplate::DenyDelete,
        ] {
            let policy = template.render("site", None).unwrap();
            assert!(validate_policy(&policy, Some("site")).is_ok());
        }
    }

    #[test]
    fn test_cors_validation() {
        let raw = r#"{"CORSRules": [{
            "AllowedMethods": ["GET", "PUT"],
            "AllowedOrigins": ["https://*.example.com"],
            "AllowedHeaders": ["*"],
            "MaxAgeSeconds": 3000
        }]}"#;
        let mut cors = CorsConfiguration::from_json(raw).unwrap();
        assert!(validate_cors(&cors).is_ok());

        cors.cors_rules[0].allowed_methods.push("PATCH".to_string());
        assert!(validate_cors(&cors).unwrap_err().to_string().contains("PATCH"));

        cors.cors_rules[0].allowed_methods.pop();
        cors.cors_rules[0].allowed_origins = vec!["https://*.*.example.com".to_string()];
        assert!(validate_cors(&cors).is_err());

        assert!(validate_cors(&CorsConfiguration { cors_rules: vec![] }).is_err());
    }

    #[tokio::test]
    async fn test_memory_admin_round_trip() {
        let admin = MemoryBucketAdmin::with_buckets(["site"]);
        assert_eq!(admin.get_bucket_policy("site").await.unwrap(), None);
        assert!(matches!(
            admin.get_bucket_policy("missing").await,
            Err(BucketError::NoSuchBucket(_))
        ));

        let policy = PolicyTemplate::DenyDelete.render("site", None).unwrap();
        admin.put_bucket_policy("site", &policy).await.unwrap();
        assert_eq!(admin.get_bucket_policy("site").await.unwrap(), Some(policy));

        admin.delete_bucket_policy("site").await.unwrap();
        assert_eq!(admin.get_bucket_policy("site").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_public_access_block_rejects_public_policy() {
        let admin = MemoryBucketAdmin::with_buckets(["site"]);
        admin
            .put_public_access_block("site", &PublicAccessBlockConfiguration::block_all())
            .await
            .unwrap();

        let public = PolicyTemplate::PublicRead.render("site", None).unwrap();
        assert!(matches!(
            admin.put_bucket_policy("site", &public).await,
            Err(BucketError::AccessDenied(_))
        ));

        let secure = PolicyTemplate::SecureTransport.render("site", None).unwrap();
        admin.put_bucket_policy("site", &secure).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_cors_is_not_stored() {
        let admin = MemoryBucketAdmin::with_buckets(["site"]);
        let cors = CorsConfiguration { cors_rules: vec![] };
        assert!(matches!(
            admin.put_bucket_cors("site", &cors).await,
            Err(BucketError::Invalid(_))
        ));
        assert_eq!(admin.get_bucket_cors("site").await.unwrap(), None);
    }
}
