use serde::Serialize;

use super::*;

/// CloudFront principal that is allowed to read the otherwise private content bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginAccessIdentity {
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityOutputs {
    pub id: String,
}

impl OriginAccessIdentity {
    pub const ID: &'static str = "id";
    pub const IAM_ARN: &'static str = "iam_arn";
    pub const ACCESS_IDENTITY_PATH: &'static str = "cloudfront_access_identity_path";

    pub fn new(comment: &str) -> Self {
        Self { comment: comment.to_string() }
    }

    pub fn iam_arn(id: &str) -> String {
        format!("arn:aws:iam::cloudfront:user/CloudFront Origin Access Identity {id}")
    }

    pub fn access_identity_path(id: &str) -> String {
        format!("origin-access-identity/cloudfront/{id}")
    }
}

#[async_trait]
impl Resource for OriginAccessIdentity {
    fn type_string(&self) -> &'static str {
        "sitestack:cloudfront:OriginAccessIdentity"
    }

    fn references(&self) -> Vec<&str> {
        vec![]
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let out = provider
            .create_origin_access_identity(&ctx.idempotency_token(), self)
            .await?;
        Ok(attributes([
            (Self::IAM_ARN, Self::iam_arn(&out.id)),
            (Self::ACCESS_IDENTITY_PATH, Self::access_identity_path(&out.id)),
            (Self::ID, out.id),
        ]))
    }
}
