use serde::Serialize;

use super::*;

/// An ACM certificate validated through DNS. Only works if the domain is hosted
/// in Route 53 in the same account, since the validation record is written there.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub domain_name: String,
    pub validation_method: String,
    pub tags: Tags,
}

/// the first domain validation option ACM hands back for a certificate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOption {
    pub resource_record_name: String,
    pub resource_record_type: String,
    pub resource_record_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub arn: String,
    pub validation: ValidationOption,
}

impl Certificate {
    pub const ARN: &'static str = "arn";
    pub const VALIDATION_RECORD_NAME: &'static str = "domain_validation_options[0].resource_record_name";
    pub const VALIDATION_RECORD_TYPE: &'static str = "domain_validation_options[0].resource_record_type";
    pub const VALIDATION_RECORD_VALUE: &'static str = "domain_validation_options[0].resource_record_value";

    /// the tag an existing certificate must carry, with the same value, to be reused by this stack.
    pub const OWNER_TAG: &'static str = "Environment";

    pub fn dns_validated(domain_name: &str, tags: &Tags) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            validation_method: "DNS".into(),
            tags: tags.clone(),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.tags.get(Self::OWNER_TAG).map(String::as_str)
    }

    /// whether a certificate already in the account with these properties belongs to this stack.
    pub fn is_reusable(&self, domain_name: &str, tags: &Tags) -> bool {
        domain_name.eq_ignore_ascii_case(&self.domain_name)
            && self.owner().is_some()
            && tags.get(Self::OWNER_TAG).map(String::as_str) == self.owner()
    }
}

#[async_trait]
impl Resource for Certificate {
    fn type_string(&self) -> &'static str {
        "sitestack:acm:Certificate"
    }

    fn references(&self) -> Vec<&str> {
        vec![]
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.domain_name.is_empty() {
            return Err("Must provide a domain name".to_string());
        }
        if self.domain_name.matches('*').count() > 1 {
            return Err(format!("Must only provide 1 wildcard. {} is invalid.", self.domain_name));
        }
        if self.domain_name.contains('*') && !self.domain_name.starts_with("*.") {
            return Err(format!(
                "If using a wildcard, it must be the first component of your domain, eg: \"*.something.com\". {} is invalid.",
                self.domain_name
            ));
        }
        if self.validation_method != "DNS" {
            return Err(format!("Unsupported validation method {:?}, only DNS is supported", self.validation_method));
        }
        Ok(())
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let req = match provider.find_certificate(self).await? {
            Some(existing) => {
                tracing::info!(certificate = %existing.arn, domain = %self.domain_name, "reusing existing certificate");
                existing
            }
            None => provider.request_certificate(&ctx.idempotency_token(), self).await?,
        };
        let ValidationOption {
            resource_record_name,
            resource_record_type,
            resource_record_value,
        } = req.validation;
        Ok(attributes([
            (Self::ARN, req.arn),
            (Self::VALIDATION_RECORD_NAME, resource_record_name),
            (Self::VALIDATION_RECORD_TYPE, resource_record_type),
            (Self::VALIDATION_RECORD_VALUE, resource_record_value),
        ]))
    }
}

/// Not a real cloud resource: waits until the certificate authority has seen the
/// validation records and issued the certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateValidation<V = StrVal> {
    pub certificate_arn: V,
    pub validation_record_fqdns: Vec<V>,
    pub timeout_minutes: u64,
}

impl CertificateValidation {
    pub const CERTIFICATE_ARN: &'static str = "certificate_arn";
}

fn trim_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

impl CertificateValidation<String> {
    /// whether `record_name` is one of the validation records this waits on. The trailing dot is ignored.
    pub fn covers(&self, record_name: &str) -> bool {
        let record_name = trim_fqdn(record_name);
        self.validation_record_fqdns
            .iter()
            .any(|fqdn| trim_fqdn(fqdn).eq_ignore_ascii_case(record_name))
    }
}

impl Resolve for CertificateValidation {
    type Output = CertificateValidation<String>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        Ok(CertificateValidation {
            certificate_arn: self.certificate_arn.resolve(state)?,
            validation_record_fqdns: self.validation_record_fqdns.resolve(state)?,
            timeout_minutes: self.timeout_minutes,
        })
    }
}

#[async_trait]
impl Resource for CertificateValidation {
    fn type_string(&self) -> &'static str {
        "sitestack:acm:CertificateValidation"
    }

    fn references(&self) -> Vec<&str> {
        collect_references(std::iter::once(&self.certificate_arn).chain(&self.validation_record_fqdns))
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.validation_record_fqdns.is_empty() {
            return Err("Certificate validation needs at least one validation record".to_string());
        }
        Ok(())
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let validation = Resolve::resolve(self, ctx.state)?;
        tracing::info!(certificate = %validation.certificate_arn, "waiting for certificate validation");
        provider.wait_for_certificate_validation(&validation).await?;
        Ok(attributes([(Self::CERTIFICATE_ARN, validation.certificate_arn)]))
    }
}
