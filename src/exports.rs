use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::output::{StackState, StrVal};
use crate::plan::{Plan, ResourceRef};
use crate::resources::{Bucket, Distribution, OriginAccessIdentity};

/// Declares the values a stack hands to whoever consumes it after apply.
pub fn declare_outputs(
    plan: &mut Plan,
    target_domain: &str,
    content_bucket: &ResourceRef,
    identity: &ResourceRef,
    cdn: &ResourceRef,
) {
    plan.export(
        "content_bucket_url",
        StrVal::join([StrVal::from("s3://"), content_bucket.attr(Bucket::BUCKET)]),
    );
    plan.export("content_bucket_website_endpoint", content_bucket.attr(Bucket::WEBSITE_ENDPOINT));
    plan.export("cloudfront_domain", cdn.attr(Distribution::DOMAIN_NAME));
    plan.export("target_domain_endpoint", StrVal::from(format!("https://{target_domain}/")));
    plan.export("identity", identity.attr(OriginAccessIdentity::IAM_ARN));
    plan.export("identity.id", identity.attr(OriginAccessIdentity::ID));
    plan.export("s3", content_bucket.attr(Bucket::ID));
    plan.export("name", content_bucket.attr(Bucket::BUCKET_REGIONAL_DOMAIN_NAME));
}

/// Resolved outputs, in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exports(Vec<(String, String)>);

impl Exports {
    pub fn resolve(plan: &Plan, state: &StackState) -> Result<Self> {
        let mut out = vec![];
        for (name, value) in plan.outputs() {
            out.push((name.clone(), value.resolve(state)?));
        }
        Ok(Exports(out))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.0.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        writeln!(f, "Outputs:")?;
        for (k, v) in &self.0 {
            writeln!(f, "    {k:<width$}: {v}")?;
        }
        Ok(())
    }
}
