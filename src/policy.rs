use serde::Serialize;

use crate::error::Result;
use crate::output::{StackState, StrVal};
use crate::resources::Resolve;

pub const POLICY_VERSION: &str = "2012-10-17";
/// the only actions the content bucket ever grants to its origin access identity.
pub const IDENTITY_READ_ACTIONS: &[&str] = &["s3:GetObject", "s3:ListBucket"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal<V = StrVal> {
    #[serde(rename = "AWS")]
    pub aws: Vec<V>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement<V = StrVal> {
    #[serde(rename = "Effect")]
    pub effect: String,
    #[serde(rename = "Principal")]
    pub principal: Principal<V>,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<V>,
}

/// IAM policy document. Principals and resources may be deferred, so the JSON
/// text only exists once they resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDocument<V = StrVal> {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement<V>>,
}

impl PolicyDocument {
    /// lets the origin access identity read objects and list the bucket, nothing else.
    pub fn allow_identity_read(identity_iam_arn: StrVal, bucket_arn: StrVal) -> Self {
        let objects = StrVal::join([bucket_arn.clone(), StrVal::from("/*")]);
        Self {
            version: POLICY_VERSION.into(),
            statements: vec![Statement {
                effect: "Allow".into(),
                principal: Principal { aws: vec![identity_iam_arn] },
                actions: IDENTITY_READ_ACTIONS.iter().map(|a| a.to_string()).collect(),
                resources: vec![bucket_arn, objects],
            }],
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &StrVal> {
        self.statements
            .iter()
            .flat_map(|s| s.principal.aws.iter().chain(s.resources.iter()))
    }
}

impl PolicyDocument<String> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Resolve for PolicyDocument {
    type Output = PolicyDocument<String>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        let mut statements = vec![];
        for s in &self.statements {
            statements.push(Statement {
                effect: s.effect.clone(),
                principal: Principal { aws: s.principal.aws.resolve(state)? },
                actions: s.actions.clone(),
                resources: s.resources.resolve(state)?,
            });
        }
        Ok(PolicyDocument {
            version: self.version.clone(),
            statements,
        })
    }
}
