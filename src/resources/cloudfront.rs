use serde::Serialize;

use super::*;
use crate::regions::CLOUDFRONT_HOSTED_ZONE_ID;

pub const TEN_MINUTES: i64 = 60 * 10;

pub const STATIC_SITE_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];

/// Cache settings of the default behavior. The only accepted configuration is
/// read-only methods, nothing forwarded to the origin, and a ttl of 0/600/600.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheBehavior {
    allowed_methods: Vec<String>,
    cached_methods: Vec<String>,
    query_string: bool,
    cookies_forward: String,
    min_ttl: i64,
    default_ttl: i64,
    max_ttl: i64,
}

impl CacheBehavior {
    pub fn new(methods: &[&str], min_ttl: i64, default_ttl: i64, max_ttl: i64) -> std::result::Result<Self, String> {
        let mut sorted: Vec<&str> = methods.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut expected = STATIC_SITE_METHODS.to_vec();
        expected.sort_unstable();
        if sorted != expected || sorted.len() != methods.len() {
            return Err(format!("Cache behavior methods must be exactly {:?}, got {:?}", STATIC_SITE_METHODS, methods));
        }
        if (min_ttl, default_ttl, max_ttl) != (0, TEN_MINUTES, TEN_MINUTES) {
            return Err(format!(
                "Cache behavior ttl must be min=0 default={TEN_MINUTES} max={TEN_MINUTES}, got min={min_ttl} default={default_ttl} max={max_ttl}"
            ));
        }
        let methods: Vec<String> = STATIC_SITE_METHODS.iter().map(|m| m.to_string()).collect();
        Ok(Self {
            allowed_methods: methods.clone(),
            cached_methods: methods,
            query_string: false,
            cookies_forward: "none".into(),
            min_ttl,
            default_ttl,
            max_ttl,
        })
    }

    pub fn static_site() -> Self {
        Self {
            allowed_methods: STATIC_SITE_METHODS.iter().map(|m| m.to_string()).collect(),
            cached_methods: STATIC_SITE_METHODS.iter().map(|m| m.to_string()).collect(),
            query_string: false,
            cookies_forward: "none".into(),
            min_ttl: 0,
            default_ttl: TEN_MINUTES,
            max_ttl: TEN_MINUTES,
        }
    }

    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed_methods
    }
    pub fn cached_methods(&self) -> &[String] {
        &self.cached_methods
    }
    pub fn query_string(&self) -> bool {
        self.query_string
    }
    pub fn cookies_forward(&self) -> &str {
        &self.cookies_forward
    }
    pub fn min_ttl(&self) -> i64 {
        self.min_ttl
    }
    pub fn default_ttl(&self) -> i64 {
        self.default_ttl
    }
    pub fn max_ttl(&self) -> i64 {
        self.max_ttl
    }
}

/// An S3 origin reached only through the origin access identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Origin<V = StrVal> {
    pub origin_id: V,
    pub domain_name: V,
    pub origin_access_identity: V,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultCacheBehavior<V = StrVal> {
    pub target_origin_id: V,
    pub viewer_protocol_policy: String,
    #[serde(flatten)]
    pub cache: CacheBehavior,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCertificate<V = StrVal> {
    pub acm_certificate_arn: V,
    pub minimum_protocol_version: String,
    pub ssl_support_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig<V = StrVal> {
    pub bucket: V,
    pub include_cookies: bool,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution<V = StrVal> {
    pub enabled: bool,
    pub aliases: Vec<String>,
    pub origins: Vec<S3Origin<V>>,
    pub default_root_object: String,
    pub default_cache_behavior: DefaultCacheBehavior<V>,
    /// PriceClass_100 is the lowest cost tier (US/EU only).
    pub price_class: String,
    pub viewer_certificate: ViewerCertificate<V>,
    pub geo_restriction: String,
    pub logging_config: LoggingConfig<V>,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionOutputs {
    pub id: String,
    pub arn: String,
    pub domain_name: String,
    pub status: String,
}

/// values a static website distribution is wired from.
pub struct StaticSiteOrigin {
    pub target_domain: String,
    pub bucket_arn: StrVal,
    pub bucket_regional_domain_name: StrVal,
    pub access_identity_path: StrVal,
    pub certificate_arn: StrVal,
    pub logs_bucket_domain_name: StrVal,
}

impl Distribution {
    pub const ID: &'static str = "id";
    pub const ARN: &'static str = "arn";
    pub const DOMAIN_NAME: &'static str = "domain_name";
    pub const HOSTED_ZONE_ID: &'static str = "hosted_zone_id";
    pub const STATUS: &'static str = "status";

    pub fn static_site(origin: StaticSiteOrigin, tags: &Tags) -> Self {
        let StaticSiteOrigin {
            target_domain,
            bucket_arn,
            bucket_regional_domain_name,
            access_identity_path,
            certificate_arn,
            logs_bucket_domain_name,
        } = origin;
        Self {
            enabled: true,
            aliases: vec![target_domain.clone()],
            origins: vec![S3Origin {
                origin_id: bucket_arn.clone(),
                domain_name: bucket_regional_domain_name,
                origin_access_identity: access_identity_path,
            }],
            default_root_object: "index.html".into(),
            default_cache_behavior: DefaultCacheBehavior {
                target_origin_id: bucket_arn,
                viewer_protocol_policy: "redirect-to-https".into(),
                cache: CacheBehavior::static_site(),
            },
            price_class: "PriceClass_100".into(),
            viewer_certificate: ViewerCertificate {
                acm_certificate_arn: certificate_arn,
                minimum_protocol_version: "TLSv1.2_2021".into(),
                ssl_support_method: "sni-only".into(),
            },
            geo_restriction: "none".into(),
            logging_config: LoggingConfig {
                bucket: logs_bucket_domain_name,
                include_cookies: false,
                prefix: format!("{target_domain}/"),
            },
            tags: tags.clone(),
        }
    }
}

impl Resolve for Distribution {
    type Output = Distribution<String>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        let mut origins = vec![];
        for origin in &self.origins {
            origins.push(S3Origin {
                origin_id: origin.origin_id.resolve(state)?,
                domain_name: origin.domain_name.resolve(state)?,
                origin_access_identity: origin.origin_access_identity.resolve(state)?,
            });
        }
        Ok(Distribution {
            enabled: self.enabled,
            aliases: self.aliases.clone(),
            origins,
            default_root_object: self.default_root_object.clone(),
            default_cache_behavior: DefaultCacheBehavior {
                target_origin_id: self.default_cache_behavior.target_origin_id.resolve(state)?,
                viewer_protocol_policy: self.default_cache_behavior.viewer_protocol_policy.clone(),
                cache: self.default_cache_behavior.cache.clone(),
            },
            price_class: self.price_class.clone(),
            viewer_certificate: ViewerCertificate {
                acm_certificate_arn: self.viewer_certificate.acm_certificate_arn.resolve(state)?,
                minimum_protocol_version: self.viewer_certificate.minimum_protocol_version.clone(),
                ssl_support_method: self.viewer_certificate.ssl_support_method.clone(),
            },
            geo_restriction: self.geo_restriction.clone(),
            logging_config: LoggingConfig {
                bucket: self.logging_config.bucket.resolve(state)?,
                include_cookies: self.logging_config.include_cookies,
                prefix: self.logging_config.prefix.clone(),
            },
            tags: self.tags.clone(),
        })
    }
}

#[async_trait]
impl Resource for Distribution {
    fn type_string(&self) -> &'static str {
        "sitestack:cloudfront:Distribution"
    }

    fn references(&self) -> Vec<&str> {
        let vals = self
            .origins
            .iter()
            .flat_map(|o| [&o.origin_id, &o.domain_name, &o.origin_access_identity])
            .chain([
                &self.default_cache_behavior.target_origin_id,
                &self.viewer_certificate.acm_certificate_arn,
                &self.logging_config.bucket,
            ]);
        collect_references(vals)
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.origins.len() != 1 {
            return Err(format!("Distribution must have exactly one origin, found {}", self.origins.len()));
        }
        if self.aliases.is_empty() {
            return Err("Distribution needs at least one alias".to_string());
        }
        if self.origins[0].origin_id != self.default_cache_behavior.target_origin_id {
            return Err("Default cache behavior must target the distribution's origin".to_string());
        }
        if self.viewer_certificate.minimum_protocol_version != "TLSv1.2_2021" || self.viewer_certificate.ssl_support_method != "sni-only" {
            return Err("Viewer certificate must use TLSv1.2_2021 with sni-only".to_string());
        }
        Ok(())
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let distribution = Resolve::resolve(self, ctx.state)?;
        let out = provider
            .create_distribution(&ctx.idempotency_token(), &distribution)
            .await?;
        // a new distribution takes around 15 minutes to deploy globally; apply does not wait for it
        tracing::info!(id = %out.id, status = %out.status, "distribution accepted");
        Ok(attributes([
            (Self::ID, out.id),
            (Self::ARN, out.arn),
            (Self::DOMAIN_NAME, out.domain_name),
            (Self::HOSTED_ZONE_ID, CLOUDFRONT_HOSTED_ZONE_ID.to_string()),
            (Self::STATUS, out.status),
        ]))
    }
}
