use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_acm::types as acm;
use aws_sdk_cloudfront::types as cf;
use aws_sdk_route53::types as r53;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::types as s3;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::provider::{CloudProvider, ZoneLookup};
use crate::regions::S3_DEFAULT_REGION;
use crate::resources::{
    Bucket, Certificate, CertificateRequest, CertificateValidation, Distribution, DistributionOutputs,
    IdentityOutputs, OriginAccessIdentity, Record, Tags, ValidationOption,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// ACM fills in the validation record shortly after the request is accepted.
const VALIDATION_OPTIONS_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// `CloudProvider` backed by the AWS SDK, with every client bound to one region.
pub struct AwsProvider {
    region: String,
    s3: aws_sdk_s3::Client,
    cloudfront: aws_sdk_cloudfront::Client,
    acm: aws_sdk_acm::Client,
    route53: aws_sdk_route53::Client,
    poll_interval: Duration,
}

impl AwsProvider {
    /// credentials come from the usual environment/profile chain.
    pub async fn new(region: &str) -> Self {
        let shared_config = aws_config::from_env()
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            region: region.to_string(),
            s3: aws_sdk_s3::Client::new(&shared_config),
            cloudfront: aws_sdk_cloudfront::Client::new(&shared_config),
            acm: aws_sdk_acm::Client::new(&shared_config),
            route53: aws_sdk_route53::Client::new(&shared_config),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    async fn describe_certificate(&self, arn: &str) -> Result<acm::CertificateDetail> {
        let resp = self
            .acm
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| Error::provider("acm:DescribeCertificate", e))?;
        resp.certificate()
            .cloned()
            .ok_or_else(|| Error::Provider {
                operation: "acm:DescribeCertificate",
                message: format!("Certificate {arn} not found"),
            })
    }

    async fn wait_for_validation_option(&self, arn: String) -> Result<CertificateRequest> {
        let deadline = Instant::now() + VALIDATION_OPTIONS_TIMEOUT;
        loop {
            let detail = self.describe_certificate(&arn).await?;
            if let Some(validation) = first_validation_option(&detail) {
                return Ok(CertificateRequest { arn, validation });
            }
            if Instant::now() >= deadline {
                return Err(Error::CertificateValidation {
                    arn,
                    reason: "ACM never returned a DNS validation record".to_string(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn certificate_tags(&self, arn: &str) -> Result<Tags> {
        let resp = self
            .acm
            .list_tags_for_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| Error::provider("acm:ListTagsForCertificate", e))?;
        Ok(tag_map(resp.tags().unwrap_or_default()))
    }

    async fn wait_for_record_change(&self, change_id: &str) -> Result<()> {
        loop {
            let resp = self
                .route53
                .get_change()
                .id(change_id)
                .send()
                .await
                .map_err(|e| Error::provider("route53:GetChange", e))?;
            let status = resp.change_info().and_then(|c| c.status()).map(|s| s.as_str().to_string());
            if status.as_deref() == Some("INSYNC") {
                return Ok(());
            }
            tracing::debug!(change = change_id, ?status, "waiting for record change");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn find_distribution_by_alias(&self, alias: &str) -> Result<Option<DistributionOutputs>> {
        let mut marker: Option<String> = None;
        loop {
            let resp = self
                .cloudfront
                .list_distributions()
                .set_marker(marker.clone())
                .send()
                .await
                .map_err(|e| Error::provider("cloudfront:ListDistributions", e))?;
            let Some(list) = resp.distribution_list() else {
                return Ok(None);
            };
            for summary in list.items().unwrap_or_default() {
                let aliases = summary.aliases().and_then(|a| a.items()).unwrap_or_default();
                if aliases.iter().any(|a| a == alias) {
                    return Ok(Some(DistributionOutputs {
                        id: summary.id().unwrap_or_default().to_string(),
                        arn: summary.arn().unwrap_or_default().to_string(),
                        domain_name: summary.domain_name().unwrap_or_default().to_string(),
                        status: summary.status().unwrap_or_default().to_string(),
                    }));
                }
            }
            marker = list.next_marker().map(str::to_string);
            if marker.is_none() {
                return Ok(None);
            }
        }
    }
}

/// ACM tokens may only hold word characters and are capped at 32 of them.
pub fn acm_idempotency_token(token: &str) -> String {
    token.chars().filter(|c| c.is_ascii_alphanumeric()).take(32).collect()
}

fn first_validation_option(detail: &acm::CertificateDetail) -> Option<ValidationOption> {
    let record = detail.domain_validation_options()?.first()?.resource_record()?;
    Some(ValidationOption {
        resource_record_name: record.name()?.to_string(),
        resource_record_type: record.r#type()?.as_str().to_string(),
        resource_record_value: record.value()?.to_string(),
    })
}

fn tag_map(tags: &[acm::Tag]) -> Tags {
    tags.iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
        .collect()
}

/// id of the public zone called `zone_name`, without the `/hostedzone/` prefix.
/// a private zone with the same name can't answer public DNS and is skipped.
fn public_zone_id(zones: &[r53::HostedZone], zone_name: &str) -> Option<String> {
    zones
        .iter()
        .filter(|z| z.config().map_or(true, |c| !c.private_zone()))
        .find(|z| z.name().map_or(false, |n| n.eq_ignore_ascii_case(zone_name)))
        .and_then(|z| z.id())
        .map(|id| id.trim_start_matches("/hostedzone/").to_string())
}

fn bucket_configuration(region: &str) -> Option<s3::CreateBucketConfiguration> {
    if region == S3_DEFAULT_REGION {
        return None;
    }
    Some(
        s3::CreateBucketConfiguration::builder()
            .location_constraint(s3::BucketLocationConstraint::from(region))
            .build(),
    )
}

fn s3_tagging(tags: &Tags) -> s3::Tagging {
    let mut tagging = s3::Tagging::builder();
    for (key, value) in tags {
        tagging = tagging.tag_set(s3::Tag::builder().key(key).value(value).build());
    }
    tagging.build()
}

fn distribution_config(caller_reference: &str, distribution: &Distribution<String>) -> cf::DistributionConfig {
    let cache = &distribution.default_cache_behavior.cache;
    let mut aliases = cf::Aliases::builder().quantity(distribution.aliases.len() as i32);
    for alias in &distribution.aliases {
        aliases = aliases.items(alias);
    }
    let mut origins = cf::Origins::builder().quantity(distribution.origins.len() as i32);
    for origin in &distribution.origins {
        origins = origins.items(
            cf::Origin::builder()
                .id(&origin.origin_id)
                .domain_name(&origin.domain_name)
                .s3_origin_config(
                    cf::S3OriginConfig::builder()
                        .origin_access_identity(&origin.origin_access_identity)
                        .build(),
                )
                .build(),
        );
    }
    let mut allowed = cf::AllowedMethods::builder().quantity(cache.allowed_methods().len() as i32);
    for method in cache.allowed_methods() {
        allowed = allowed.items(cf::Method::from(method.as_str()));
    }
    let mut cached = cf::CachedMethods::builder().quantity(cache.cached_methods().len() as i32);
    for method in cache.cached_methods() {
        cached = cached.items(cf::Method::from(method.as_str()));
    }
    let allowed = allowed.cached_methods(cached.build()).build();

    cf::DistributionConfig::builder()
        .caller_reference(caller_reference)
        .comment("")
        .enabled(distribution.enabled)
        .aliases(aliases.build())
        .origins(origins.build())
        .default_root_object(&distribution.default_root_object)
        .default_cache_behavior(
            cf::DefaultCacheBehavior::builder()
                .target_origin_id(&distribution.default_cache_behavior.target_origin_id)
                .viewer_protocol_policy(cf::ViewerProtocolPolicy::from(
                    distribution.default_cache_behavior.viewer_protocol_policy.as_str(),
                ))
                .allowed_methods(allowed)
                .forwarded_values(
                    cf::ForwardedValues::builder()
                        .query_string(cache.query_string())
                        .cookies(
                            cf::CookiePreference::builder()
                                .forward(cf::ItemSelection::from(cache.cookies_forward()))
                                .build(),
                        )
                        .build(),
                )
                .min_ttl(cache.min_ttl())
                .default_ttl(cache.default_ttl())
                .max_ttl(cache.max_ttl())
                .build(),
        )
        .price_class(cf::PriceClass::from(distribution.price_class.as_str()))
        .viewer_certificate(
            cf::ViewerCertificate::builder()
                .acm_certificate_arn(&distribution.viewer_certificate.acm_certificate_arn)
                .minimum_protocol_version(cf::MinimumProtocolVersion::from(
                    distribution.viewer_certificate.minimum_protocol_version.as_str(),
                ))
                .ssl_support_method(cf::SslSupportMethod::from(
                    distribution.viewer_certificate.ssl_support_method.as_str(),
                ))
                .build(),
        )
        .restrictions(
            cf::Restrictions::builder()
                .geo_restriction(
                    cf::GeoRestriction::builder()
                        .restriction_type(cf::GeoRestrictionType::from(distribution.geo_restriction.as_str()))
                        .quantity(0)
                        .build(),
                )
                .build(),
        )
        .logging(
            cf::LoggingConfig::builder()
                .enabled(true)
                .include_cookies(distribution.logging_config.include_cookies)
                .bucket(&distribution.logging_config.bucket)
                .prefix(&distribution.logging_config.prefix)
                .build(),
        )
        .build()
}

fn resource_record_set(record: &Record<String>) -> r53::ResourceRecordSet {
    let mut set = r53::ResourceRecordSet::builder()
        .name(record.fqdn())
        .r#type(r53::RrType::from(record.record_type.as_str()))
        .set_ttl(record.ttl);
    for value in &record.records {
        set = set.resource_records(r53::ResourceRecord::builder().value(value).build());
    }
    if let Some(alias) = record.aliases.first() {
        set = set.alias_target(
            r53::AliasTarget::builder()
                .dns_name(&alias.name)
                .hosted_zone_id(&alias.zone_id)
                .evaluate_target_health(alias.evaluate_target_health)
                .build(),
        );
    }
    set.build()
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_origin_access_identity(
        &self,
        caller_reference: &str,
        identity: &OriginAccessIdentity,
    ) -> Result<IdentityOutputs> {
        let resp = self
            .cloudfront
            .create_cloud_front_origin_access_identity()
            .cloud_front_origin_access_identity_config(
                cf::CloudFrontOriginAccessIdentityConfig::builder()
                    .caller_reference(caller_reference)
                    .comment(&identity.comment)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::provider("cloudfront:CreateCloudFrontOriginAccessIdentity", e))?;
        let id = resp
            .cloud_front_origin_access_identity()
            .and_then(|i| i.id())
            .ok_or_else(|| Error::Provider {
                operation: "cloudfront:CreateCloudFrontOriginAccessIdentity",
                message: "Response did not contain an identity id".to_string(),
            })?;
        Ok(IdentityOutputs { id: id.to_string() })
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        let mut req = self
            .s3
            .create_bucket()
            .bucket(&bucket.bucket)
            .acl(s3::BucketCannedAcl::from(bucket.acl.as_str()));
        if let Some(configuration) = bucket_configuration(&self.region) {
            req = req.create_bucket_configuration(configuration);
        }
        if let Some(ownership) = &bucket.object_ownership {
            req = req.object_ownership(s3::ObjectOwnership::from(ownership.as_str()));
        }
        if let Err(e) = req.send().await {
            let e_str = format!("{:#?}", e);
            if !e_str.contains("BucketAlreadyOwnedByYou") {
                return Err(Error::Provider { operation: "s3:CreateBucket", message: e_str });
            }
            tracing::warn!(bucket = %bucket.bucket, "bucket already exists, reusing it");
        }

        if let Some(website) = &bucket.website {
            self.s3
                .put_bucket_website()
                .bucket(&bucket.bucket)
                .website_configuration(
                    s3::WebsiteConfiguration::builder()
                        .index_document(s3::IndexDocument::builder().suffix(&website.index_document).build())
                        .build(),
                )
                .send()
                .await
                .map_err(|e| Error::provider("s3:PutBucketWebsite", e))?;
        }
        if bucket.versioning {
            self.s3
                .put_bucket_versioning()
                .bucket(&bucket.bucket)
                .versioning_configuration(
                    s3::VersioningConfiguration::builder()
                        .status(s3::BucketVersioningStatus::Enabled)
                        .build(),
                )
                .send()
                .await
                .map_err(|e| Error::provider("s3:PutBucketVersioning", e))?;
        }
        if !bucket.tags.is_empty() {
            self.s3
                .put_bucket_tagging()
                .bucket(&bucket.bucket)
                .tagging(s3_tagging(&bucket.tags))
                .send()
                .await
                .map_err(|e| Error::provider("s3:PutBucketTagging", e))?;
        }
        Ok(())
    }

    async fn find_certificate(&self, certificate: &Certificate) -> Result<Option<CertificateRequest>> {
        let mut next_token: Option<String> = None;
        loop {
            let resp = self
                .acm
                .list_certificates()
                .certificate_statuses(acm::CertificateStatus::Issued)
                .certificate_statuses(acm::CertificateStatus::PendingValidation)
                .set_next_token(next_token.clone())
                .send()
                .await
                .map_err(|e| Error::provider("acm:ListCertificates", e))?;
            for summary in resp.certificate_summary_list().unwrap_or_default() {
                let (Some(arn), Some(domain_name)) = (summary.certificate_arn(), summary.domain_name()) else {
                    continue;
                };
                if !domain_name.eq_ignore_ascii_case(&certificate.domain_name) {
                    continue;
                }
                let tags = self.certificate_tags(arn).await?;
                if certificate.is_reusable(domain_name, &tags) {
                    tracing::debug!(certificate = arn, "found certificate owned by this stack");
                    return self.wait_for_validation_option(arn.to_string()).await.map(Some);
                }
            }
            next_token = resp.next_token().map(str::to_string);
            if next_token.is_none() {
                return Ok(None);
            }
        }
    }

    async fn request_certificate(&self, idempotency_token: &str, certificate: &Certificate) -> Result<CertificateRequest> {
        let mut req = self
            .acm
            .request_certificate()
            .domain_name(&certificate.domain_name)
            .validation_method(acm::ValidationMethod::from(certificate.validation_method.as_str()))
            .idempotency_token(acm_idempotency_token(idempotency_token));
        for (key, value) in &certificate.tags {
            req = req.tags(acm::Tag::builder().key(key).value(value).build());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| Error::provider("acm:RequestCertificate", e))?;
        let arn = resp
            .certificate_arn()
            .ok_or_else(|| Error::Provider {
                operation: "acm:RequestCertificate",
                message: "Response did not contain a certificate arn".to_string(),
            })?
            .to_string();

        self.wait_for_validation_option(arn).await
    }

    async fn wait_for_certificate_validation(&self, validation: &CertificateValidation<String>) -> Result<()> {
        let arn = &validation.certificate_arn;
        let timeout = Duration::from_secs(validation.timeout_minutes.saturating_mul(60));
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let detail = self.describe_certificate(arn).await?;
            if let Some(option) = first_validation_option(&detail) {
                if !validation.covers(&option.resource_record_name) {
                    return Err(Error::CertificateValidation {
                        arn: arn.clone(),
                        reason: format!(
                            "Validation record {} is not among {:?}",
                            option.resource_record_name, validation.validation_record_fqdns
                        ),
                    });
                }
            }
            let status = detail.status().map(|s| s.as_str().to_string()).unwrap_or_default();
            match status.as_str() {
                "ISSUED" => return Ok(()),
                "PENDING_VALIDATION" | "" => {}
                _ => {
                    let reason = detail
                        .failure_reason()
                        .map(|r| format!("{status}: {}", r.as_str()))
                        .unwrap_or_else(|| status.clone());
                    return Err(Error::CertificateValidation { arn: arn.clone(), reason });
                }
            }
            if deadline.map_or(false, |d| Instant::now() >= d) {
                return Err(Error::CertificateValidation {
                    arn: arn.clone(),
                    reason: format!("Not issued after {} minutes", validation.timeout_minutes),
                });
            }
            tracing::debug!(certificate = %arn, status = %status, "certificate not issued yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn upsert_record(&self, record: &Record<String>) -> Result<()> {
        let resp = self
            .route53
            .change_resource_record_sets()
            .hosted_zone_id(&record.zone.id)
            .change_batch(
                r53::ChangeBatch::builder()
                    .changes(
                        r53::Change::builder()
                            .action(r53::ChangeAction::Upsert)
                            .resource_record_set(resource_record_set(record))
                            .build(),
                    )
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::provider("route53:ChangeResourceRecordSets", e))?;
        match resp.change_info().and_then(|c| c.id()) {
            Some(change_id) => self.wait_for_record_change(change_id).await,
            None => Ok(()),
        }
    }

    async fn create_distribution(
        &self,
        caller_reference: &str,
        distribution: &Distribution<String>,
    ) -> Result<DistributionOutputs> {
        let mut tags = cf::Tags::builder();
        for (key, value) in &distribution.tags {
            tags = tags.items(cf::Tag::builder().key(key).value(value).build());
        }
        let result = self
            .cloudfront
            .create_distribution_with_tags()
            .distribution_config_with_tags(
                cf::DistributionConfigWithTags::builder()
                    .distribution_config(distribution_config(caller_reference, distribution))
                    .tags(tags.build())
                    .build(),
            )
            .send()
            .await;
        let out = match result {
            Ok(resp) => {
                let created = resp.distribution().ok_or_else(|| Error::Provider {
                    operation: "cloudfront:CreateDistributionWithTags",
                    message: "Response did not contain a distribution".to_string(),
                })?;
                DistributionOutputs {
                    id: created.id().unwrap_or_default().to_string(),
                    arn: created.arn().unwrap_or_default().to_string(),
                    domain_name: created.domain_name().unwrap_or_default().to_string(),
                    status: created.status().unwrap_or_default().to_string(),
                }
            }
            Err(e) => {
                let e_str = format!("{:#?}", e);
                if !e_str.contains("DistributionAlreadyExists") && !e_str.contains("CNAMEAlreadyExists") {
                    return Err(Error::Provider {
                        operation: "cloudfront:CreateDistributionWithTags",
                        message: e_str,
                    });
                }
                let alias = distribution.aliases.first().map(String::as_str).unwrap_or_default();
                match self.find_distribution_by_alias(alias).await? {
                    Some(existing) => {
                        tracing::warn!(id = %existing.id, alias, "distribution already exists, reusing it");
                        existing
                    }
                    None => {
                        return Err(Error::Provider {
                            operation: "cloudfront:CreateDistributionWithTags",
                            message: e_str,
                        })
                    }
                }
            }
        };
        Ok(out)
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.s3
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| Error::provider("s3:PutBucketPolicy", e))?;
        Ok(())
    }
}

#[async_trait]
impl ZoneLookup for AwsProvider {
    async fn find_zone_id(&self, zone_name: &str) -> Result<String> {
        let resp = self
            .route53
            .list_hosted_zones_by_name()
            .dns_name(zone_name)
            .send()
            .await
            .map_err(|e| Error::provider("route53:ListHostedZonesByName", e))?;
        public_zone_id(resp.hosted_zones().unwrap_or_default(), zone_name)
            .ok_or_else(|| Error::ZoneNotFound(zone_name.to_string()))
    }
}
