use serde::Serialize;

use super::*;
use crate::regions::{s3_regional_domain_name, s3_website_endpoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub index_document: String,
}

impl Default for Website {
    fn default() -> Self {
        Self {
            index_document: "index.html".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// physical name of the bucket. must be globally unique.
    pub bucket: String,
    pub website: Option<Website>,
    pub acl: String,
    pub versioning: bool,
    /// `BucketOwnerPreferred` keeps ACLs usable, which CloudFront log delivery needs.
    pub object_ownership: Option<String>,
    pub tags: Tags,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            bucket: "".into(),
            website: None,
            acl: "private".into(),
            versioning: false,
            object_ownership: None,
            tags: Tags::new(),
        }
    }
}

impl Bucket {
    pub const ID: &'static str = "id";
    pub const BUCKET: &'static str = "bucket";
    pub const ARN: &'static str = "arn";
    pub const BUCKET_DOMAIN_NAME: &'static str = "bucket_domain_name";
    pub const BUCKET_REGIONAL_DOMAIN_NAME: &'static str = "bucket_regional_domain_name";
    pub const WEBSITE_ENDPOINT: &'static str = "website_endpoint";

    /// the bucket that holds the site itself.
    pub fn content(target_domain: &str, tags: &Tags) -> Self {
        Self {
            bucket: target_domain.to_string(),
            website: Some(Website::default()),
            versioning: true,
            tags: tags.clone(),
            ..Default::default()
        }
    }

    /// the bucket CloudFront writes access logs to.
    pub fn logs(target_domain: &str, tags: &Tags) -> Self {
        Self {
            bucket: format!("{target_domain}-logs"),
            object_ownership: Some("BucketOwnerPreferred".into()),
            tags: tags.clone(),
            ..Default::default()
        }
    }

    pub fn arn(bucket: &str) -> String {
        format!("arn:aws:s3:::{bucket}")
    }
}

pub fn validate_bucket_name(bucket_name: &str) -> std::result::Result<(), String> {
    if bucket_name.len() > 63 || bucket_name.len() < 3 {
        return Err(format!("Invalid bucket name {:?}\nMust be between 3 and 63 characters", bucket_name));
    }
    let valid_char_check = |c: char| -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    };
    if !bucket_name.chars().all(valid_char_check) {
        return Err(format!("Invalid bucket name {:?}\nMay only contain lowercase letters, numbers, dots, and dashes", bucket_name));
    }
    let first_ok = bucket_name.chars().next().map_or(false, |c| c.is_ascii_alphanumeric());
    let last_ok = bucket_name.chars().last().map_or(false, |c| c.is_ascii_alphanumeric());
    if !first_ok || !last_ok {
        return Err(format!("Invalid bucket name {:?}\nFirst and last character must be either lowercase letter, or number", bucket_name));
    }
    if bucket_name.contains("..") {
        return Err(format!("Invalid bucket name {:?}\nMay not contain two consecutive dots", bucket_name));
    }
    Ok(())
}

#[async_trait]
impl Resource for Bucket {
    fn type_string(&self) -> &'static str {
        "sitestack:s3:Bucket"
    }

    fn references(&self) -> Vec<&str> {
        vec![]
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        validate_bucket_name(&self.bucket)
    }

    async fn provision(&self, _ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        provider.create_bucket(self).await?;
        let region = provider.region();
        let name = self.bucket.clone();
        Ok(attributes([
            (Self::ID, name.clone()),
            (Self::ARN, Self::arn(&name)),
            (Self::BUCKET_DOMAIN_NAME, format!("{name}.s3.amazonaws.com")),
            (Self::BUCKET_REGIONAL_DOMAIN_NAME, s3_regional_domain_name(&name, region)),
            (Self::WEBSITE_ENDPOINT, s3_website_endpoint(&name, region)),
            (Self::BUCKET, name),
        ]))
    }
}
