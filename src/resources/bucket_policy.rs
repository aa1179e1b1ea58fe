use serde::Serialize;

use super::*;
use crate::policy::{PolicyDocument, IDENTITY_READ_ACTIONS};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketPolicy {
    pub bucket: StrVal,
    pub policy: PolicyDocument,
}

impl BucketPolicy {
    pub const ID: &'static str = "id";
}

#[async_trait]
impl Resource for BucketPolicy {
    fn type_string(&self) -> &'static str {
        "sitestack:s3:BucketPolicy"
    }

    fn references(&self) -> Vec<&str> {
        collect_references(std::iter::once(&self.bucket).chain(self.policy.values()))
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for statement in &self.policy.statements {
            if statement.effect != "Allow" {
                return Err(format!("Unexpected policy effect {:?}", statement.effect));
            }
            if statement.principal.aws.len() != 1 {
                return Err("Bucket policy must grant exactly one principal".to_string());
            }
            if statement.actions != IDENTITY_READ_ACTIONS {
                return Err(format!(
                    "Bucket policy may only grant {:?}, got {:?}",
                    IDENTITY_READ_ACTIONS, statement.actions
                ));
            }
        }
        Ok(())
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let bucket = self.bucket.resolve(ctx.state)?;
        let policy = self.policy.resolve(ctx.state)?.to_json()?;
        provider.put_bucket_policy(&bucket, &policy).await?;
        Ok(attributes([(Self::ID, bucket)]))
    }
}
