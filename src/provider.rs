use async_trait::async_trait;

use crate::error::Result;
use crate::resources::{
    Bucket, Certificate, CertificateRequest, CertificateValidation, Distribution, DistributionOutputs,
    IdentityOutputs, OriginAccessIdentity, Record,
};

/// The cloud API calls the plan is applied with. One instance is bound to one region.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    fn region(&self) -> &str;

    async fn create_origin_access_identity(
        &self,
        caller_reference: &str,
        identity: &OriginAccessIdentity,
    ) -> Result<IdentityOutputs>;

    /// creates the bucket and applies its website, versioning and tag settings.
    async fn create_bucket(&self, bucket: &Bucket) -> Result<()>;

    /// an issued or pending certificate for the same domain, owned by the same stack, if there is one.
    async fn find_certificate(&self, certificate: &Certificate) -> Result<Option<CertificateRequest>>;

    /// requests a certificate and returns once its first validation option is known.
    async fn request_certificate(&self, idempotency_token: &str, certificate: &Certificate) -> Result<CertificateRequest>;

    /// blocks until the certificate is issued, fails if validation fails or times out.
    async fn wait_for_certificate_validation(&self, validation: &CertificateValidation<String>) -> Result<()>;

    async fn upsert_record(&self, record: &Record<String>) -> Result<()>;

    async fn create_distribution(
        &self,
        caller_reference: &str,
        distribution: &Distribution<String>,
    ) -> Result<DistributionOutputs>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()>;
}

/// Finds Route 53 hosted zones by name while the plan is being built.
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    /// `zone_name` ends in `.`. fails with `Error::ZoneNotFound` when there is no such zone.
    async fn find_zone_id(&self, zone_name: &str) -> Result<String>;
}
