use super::*;
use crate::config::StackConfig;
use crate::domain::split_domain;
use crate::plan::{Plan, ResourceRef, EAST_BINDING};
use crate::policy::PolicyDocument;
use crate::provider::ZoneLookup;

pub const VALIDATION_RECORD_TTL: i64 = TEN_MINUTES;

/// Where the distribution's certificate comes from. Decided once, when the
/// plan is built, from whether the stack configuration carries an ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// an existing certificate. nothing is created for it.
    Supplied(String),
    /// logical ids of the certificate, its DNS validation record and the validation wait.
    Provisioned {
        certificate: String,
        validation_record: String,
        validation: String,
    },
}

impl CertificateSource {
    /// the value the distribution's viewer certificate is bound to.
    pub fn certificate_arn(&self) -> StrVal {
        match self {
            CertificateSource::Supplied(arn) => StrVal::Val(arn.clone()),
            CertificateSource::Provisioned { validation, .. } => {
                get_att(validation, CertificateValidation::CERTIFICATE_ARN)
            }
        }
    }

    pub fn is_supplied(&self) -> bool {
        matches!(self, CertificateSource::Supplied(_))
    }
}

/// Everything that hosts one static website: buckets, identity, certificate,
/// distribution, DNS and bucket policy.
#[derive(Debug)]
pub struct StaticWebsite {
    pub plan: Plan,
    pub certificate: CertificateSource,
}

async fn hosted_zone(zones: &dyn ZoneLookup, domain: &str) -> Result<(String, HostedZone)> {
    let (subdomain, parent_domain) = split_domain(domain)?;
    let id = zones.find_zone_id(&parent_domain).await?;
    Ok((subdomain, HostedZone { id, name: parent_domain }))
}

impl StaticWebsite {
    pub async fn build(config: &StackConfig, zones: &dyn ZoneLookup) -> Result<Self> {
        let domain = config.target_domain.as_str();
        let tags = &config.tags;
        let mut plan = Plan::new(&config.stack, &config.region);

        let identity = plan.add("S3-identity", OriginAccessIdentity::new("S3-access"))?;
        let content_bucket = plan.add("contentBucket", Bucket::content(domain, tags))?;

        let certificate = match &config.certificate_arn {
            Some(arn) => CertificateSource::Supplied(arn.clone()),
            None => provision_certificate(&mut plan, config, zones).await?,
        };

        let logs_bucket = plan.add("requestLogs", Bucket::logs(domain, tags))?;

        let cdn = plan.add(
            "cdn",
            Distribution::static_site(
                StaticSiteOrigin {
                    target_domain: domain.to_string(),
                    bucket_arn: content_bucket.attr(Bucket::ARN),
                    bucket_regional_domain_name: content_bucket.attr(Bucket::BUCKET_REGIONAL_DOMAIN_NAME),
                    access_identity_path: identity.attr(OriginAccessIdentity::ACCESS_IDENTITY_PATH),
                    certificate_arn: certificate.certificate_arn(),
                    logs_bucket_domain_name: logs_bucket.attr(Bucket::BUCKET_DOMAIN_NAME),
                },
                tags,
            ),
        )?;

        create_alias_record(&mut plan, domain, &cdn, zones).await?;

        plan.add(
            "allowAccessFromAnotherAccountBucketPolicy",
            BucketPolicy {
                bucket: content_bucket.attr(Bucket::ID),
                policy: PolicyDocument::allow_identity_read(
                    identity.attr(OriginAccessIdentity::IAM_ARN),
                    content_bucket.attr(Bucket::ARN),
                ),
            },
        )?;

        crate::exports::declare_outputs(&mut plan, domain, &content_bucket, &identity, &cdn);

        plan.validate()?;
        tracing::debug!(
            stack = %config.stack,
            resources = plan.resources().len(),
            certificate_supplied = certificate.is_supplied(),
            "built static website plan"
        );
        Ok(StaticWebsite { plan, certificate })
    }
}

/// Certificate, validation record and validation wait. The certificate and the
/// wait run against the us-east-1 binding, since CloudFront only reads certificates
/// from there.
async fn provision_certificate(
    plan: &mut Plan,
    config: &StackConfig,
    zones: &dyn ZoneLookup,
) -> Result<CertificateSource> {
    let domain = config.target_domain.as_str();
    plan.add_east_binding();

    let certificate = plan.add_with_binding(
        "certificate",
        EAST_BINDING,
        Certificate::dns_validated(domain, &config.tags),
    )?;

    let (_, zone) = hosted_zone(zones, domain).await?;
    let record_id = format!("{domain}-validation");
    let validation_record = plan.add(
        &record_id,
        Record {
            zone,
            name: certificate.attr(Certificate::VALIDATION_RECORD_NAME),
            record_type: certificate.attr(Certificate::VALIDATION_RECORD_TYPE),
            ttl: Some(VALIDATION_RECORD_TTL),
            records: vec![certificate.attr(Certificate::VALIDATION_RECORD_VALUE)],
            aliases: vec![],
        },
    )?;

    let validation = plan.add_with_binding(
        "certificateValidation",
        EAST_BINDING,
        CertificateValidation {
            certificate_arn: certificate.attr(Certificate::ARN),
            validation_record_fqdns: vec![validation_record.attr(Record::FQDN)],
            timeout_minutes: config.validation_timeout.as_secs() / 60,
        },
    )?;

    Ok(CertificateSource::Provisioned {
        certificate: certificate.logical_id().to_string(),
        validation_record: validation_record.logical_id().to_string(),
        validation: validation.logical_id().to_string(),
    })
}

/// Route 53 alias A record from the target domain to the distribution.
pub async fn create_alias_record(
    plan: &mut Plan,
    target_domain: &str,
    distribution: &ResourceRef,
    zones: &dyn ZoneLookup,
) -> Result<ResourceRef> {
    let (subdomain, zone) = hosted_zone(zones, target_domain).await?;
    plan.add(
        target_domain,
        Record {
            zone,
            name: StrVal::Val(subdomain),
            record_type: "A".into(),
            ttl: None,
            records: vec![],
            aliases: vec![AliasTarget {
                name: distribution.attr(Distribution::DOMAIN_NAME),
                zone_id: distribution.attr(Distribution::HOSTED_ZONE_ID),
                evaluate_target_health: true,
            }],
        },
    )
}
