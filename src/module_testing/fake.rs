use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::StackConfig;
use crate::deploy::Providers;
use crate::error::{Error, Result};
use crate::plan::Plan;
use crate::provider::{CloudProvider, ZoneLookup};
use crate::resources::{
    Bucket, Certificate, CertificateRequest, CertificateValidation, Distribution, DistributionOutputs,
    IdentityOutputs, OriginAccessIdentity, Record, Tags, ValidationOption,
};

pub const DEV_STACK: &str = r#"
[config]
targetDomain = "www.example.com"
pathToWebsiteContents = "../site/build"
"#;

pub const SUPPLIED_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/supplied";

pub fn config(target_domain: &str, certificate_arn: Option<&str>) -> StackConfig {
    let mut contents = format!("[config]\ntargetDomain = \"{target_domain}\"\npathToWebsiteContents = \"www\"\n");
    if let Some(arn) = certificate_arn {
        contents.push_str(&format!("certificateArn = \"{arn}\"\n"));
    }
    StackConfig::from_toml("dev", &contents).unwrap()
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub calls: Vec<String>,
    pub records: Vec<Record<String>>,
    pub distributions: Vec<Distribution<String>>,
    pub policies: Vec<(String, String)>,
    pub zone_lookups: Vec<String>,
    /// certificate arn to the name of its validation record.
    pub validation_records: HashMap<String, String>,
}

/// a certificate already present in the account before apply.
#[derive(Debug, Clone)]
pub struct ExistingCertificate {
    pub domain_name: String,
    pub tags: Tags,
    pub request: CertificateRequest,
}

pub const EXISTING_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/existing";

pub fn existing_certificate(domain_name: &str, environment: &str) -> ExistingCertificate {
    let mut tags = Tags::new();
    tags.insert("Environment".into(), environment.into());
    ExistingCertificate {
        domain_name: domain_name.into(),
        tags,
        request: CertificateRequest {
            arn: EXISTING_ARN.into(),
            validation: ValidationOption {
                resource_record_name: format!("_x1.{domain_name}."),
                resource_record_type: "CNAME".into(),
                resource_record_value: "_x2.acm-validations.aws.".into(),
            },
        },
    }
}

/// In-memory cloud. Clones made with `for_region` share one call log, so a
/// test can see calls across bindings in the order they happened.
#[derive(Clone)]
pub struct FakeCloud {
    region: String,
    zones: Arc<HashMap<String, String>>,
    fail_validation: bool,
    certificates: Arc<Vec<ExistingCertificate>>,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl FakeCloud {
    pub fn new(region: &str) -> Self {
        let mut zones = HashMap::new();
        zones.insert("example.com.".to_string(), "ZEXAMPLE".to_string());
        Self {
            region: region.to_string(),
            zones: Arc::new(zones),
            fail_validation: false,
            certificates: Default::default(),
            recorded: Default::default(),
        }
    }

    pub fn without_zones(mut self) -> Self {
        self.zones = Arc::new(HashMap::new());
        self
    }

    pub fn failing_validation(mut self) -> Self {
        self.fail_validation = true;
        self
    }

    pub fn with_certificate(mut self, certificate: ExistingCertificate) -> Self {
        let mut certificates = (*self.certificates).clone();
        certificates.push(certificate);
        self.certificates = Arc::new(certificates);
        self
    }

    pub fn for_region(&self, region: &str) -> Self {
        Self {
            region: region.to_string(),
            ..self.clone()
        }
    }

    /// one clone per binding of the plan, each pinned to the binding's region.
    pub fn providers(&self, plan: &Plan) -> Providers {
        let mut providers = Providers::new();
        for (name, binding) in plan.bindings() {
            providers.insert(name, self.for_region(&binding.region));
        }
        providers
    }

    pub fn calls(&self) -> Vec<String> {
        self.recorded.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.recorded.lock().unwrap().calls.push(format!("{} {call}", self.region));
    }
}

#[async_trait]
impl CloudProvider for FakeCloud {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_origin_access_identity(
        &self,
        caller_reference: &str,
        _identity: &OriginAccessIdentity,
    ) -> Result<IdentityOutputs> {
        self.record(format!("CreateOriginAccessIdentity {caller_reference}"));
        Ok(IdentityOutputs { id: "E2FAKEIDENTITY".into() })
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        self.record(format!("CreateBucket {}", bucket.bucket));
        Ok(())
    }

    async fn find_certificate(&self, certificate: &Certificate) -> Result<Option<CertificateRequest>> {
        self.record(format!("FindCertificate {}", certificate.domain_name));
        let found = self
            .certificates
            .iter()
            .find(|c| certificate.is_reusable(&c.domain_name, &c.tags))
            .map(|c| c.request.clone());
        if let Some(request) = &found {
            self.recorded
                .lock()
                .unwrap()
                .validation_records
                .insert(request.arn.clone(), request.validation.resource_record_name.clone());
        }
        Ok(found)
    }

    async fn request_certificate(&self, idempotency_token: &str, certificate: &Certificate) -> Result<CertificateRequest> {
        self.record(format!("RequestCertificate {}", certificate.domain_name));
        let request = CertificateRequest {
            arn: format!("arn:aws:acm:{}:123456789012:certificate/{idempotency_token}", self.region),
            validation: ValidationOption {
                resource_record_name: format!("_x1.{}.", certificate.domain_name),
                resource_record_type: "CNAME".into(),
                resource_record_value: "_x2.acm-validations.aws.".into(),
            },
        };
        self.recorded
            .lock()
            .unwrap()
            .validation_records
            .insert(request.arn.clone(), request.validation.resource_record_name.clone());
        Ok(request)
    }

    async fn wait_for_certificate_validation(&self, validation: &CertificateValidation<String>) -> Result<()> {
        self.record(format!("WaitForValidation {}", validation.validation_record_fqdns.join(",")));
        let expected = self
            .recorded
            .lock()
            .unwrap()
            .validation_records
            .get(&validation.certificate_arn)
            .cloned();
        if let Some(name) = expected {
            if !validation.covers(&name) {
                return Err(Error::CertificateValidation {
                    arn: validation.certificate_arn.clone(),
                    reason: format!("Validation record {name} is not among {:?}", validation.validation_record_fqdns),
                });
            }
        }
        if self.fail_validation {
            return Err(Error::CertificateValidation {
                arn: validation.certificate_arn.clone(),
                reason: "FAILED: CAA_ERROR".into(),
            });
        }
        Ok(())
    }

    async fn upsert_record(&self, record: &Record<String>) -> Result<()> {
        self.record(format!("UpsertRecord {}", record.fqdn()));
        self.recorded.lock().unwrap().records.push(record.clone());
        Ok(())
    }

    async fn create_distribution(
        &self,
        caller_reference: &str,
        distribution: &Distribution<String>,
    ) -> Result<DistributionOutputs> {
        self.record(format!("CreateDistribution {caller_reference}"));
        self.recorded.lock().unwrap().distributions.push(distribution.clone());
        Ok(DistributionOutputs {
            id: "EDFDVBD6EXAMPLE".into(),
            arn: "arn:aws:cloudfront::123456789012:distribution/EDFDVBD6EXAMPLE".into(),
            domain_name: "d111111abcdef8.cloudfront.net".into(),
            status: "InProgress".into(),
        })
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.record(format!("PutBucketPolicy {bucket}"));
        self.recorded.lock().unwrap().policies.push((bucket.to_string(), policy.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ZoneLookup for FakeCloud {
    async fn find_zone_id(&self, zone_name: &str) -> Result<String> {
        self.recorded.lock().unwrap().zone_lookups.push(zone_name.to_string());
        self.zones
            .get(zone_name)
            .cloned()
            .ok_or_else(|| Error::ZoneNotFound(zone_name.to_string()))
    }
}
