use async_trait::async_trait;

pub use crate::config::Tags;
pub use crate::error::{Error, Result};
pub use crate::output::{get_att, Attributes, StackState, StrVal};
pub use crate::provider::CloudProvider;

mod identity;
pub use identity::*;
mod s3_bucket;
pub use s3_bucket::*;
mod certificate;
pub use certificate::*;
mod cloudfront;
pub use cloudfront::*;
mod route53;
pub use route53::*;
mod bucket_policy;
pub use bucket_policy::*;

// higher level resources:
mod static_website;
pub use static_website::*;

/// What a resource sees while it is being provisioned.
pub struct ApplyContext<'a> {
    pub stack: &'a str,
    pub logical_id: &'a str,
    pub state: &'a StackState,
}

impl ApplyContext<'_> {
    /// stable token for APIs that deduplicate create calls.
    pub fn idempotency_token(&self) -> String {
        format!("{}-{}", self.stack, self.logical_id)
    }
}

/// A declared cloud resource. Deferred fields are `StrVal`s that point at
/// attributes of other resources, and those references are the only
/// ordering signal the plan uses.
#[async_trait]
pub trait Resource: Send + Sync + std::fmt::Debug {
    fn type_string(&self) -> &'static str;

    /// logical ids of the resources whose attributes this one consumes.
    fn references(&self) -> Vec<&str>;

    /// declared properties, with unresolved references shown as `${id.attribute}`.
    fn properties(&self) -> Result<serde_json::Value>;

    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes>;
}

/// Turns a declared value into the concrete value the provider API wants.
pub trait Resolve {
    type Output;
    fn resolve(&self, state: &StackState) -> Result<Self::Output>;
}

impl Resolve for StrVal {
    type Output = String;
    fn resolve(&self, state: &StackState) -> Result<String> {
        StrVal::resolve(self, state)
    }
}

impl<T: Resolve> Resolve for Vec<T> {
    type Output = Vec<T::Output>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        self.iter().map(|v| v.resolve(state)).collect()
    }
}

impl<T: Resolve> Resolve for Option<T> {
    type Output = Option<T::Output>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        self.as_ref().map(|v| v.resolve(state)).transpose()
    }
}

pub(crate) fn collect_references<'a>(vals: impl IntoIterator<Item = &'a StrVal>) -> Vec<&'a str> {
    let mut out: Vec<&str> = vec![];
    for val in vals {
        for r in val.references() {
            if !out.contains(&r) {
                out.push(r);
            }
        }
    }
    out
}

pub(crate) fn attributes<const N: usize>(pairs: [(&str, String); N]) -> Attributes {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
