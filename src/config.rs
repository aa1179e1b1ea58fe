use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::regions::{verify_region, DEFAULT_REGION};

pub type Tags = BTreeMap<String, String>;

pub const STACK_ENV_VAR: &str = "SITESTACK_STACK";
const DEFAULT_VALIDATION_TIMEOUT_MINUTES: u64 = 75;

/// Settings for one stack, read once and then passed to every resource
/// that needs them.
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    pub stack: String,
    pub target_domain: String,
    /// kept for parity with the stack file. nothing uploads from it.
    pub path_to_website_contents: PathBuf,
    pub certificate_arn: Option<String>,
    pub region: String,
    pub validation_timeout: Duration,
    pub tags: Tags,
}

#[derive(Debug, Default, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: StackValues,
}

#[derive(Debug, Default, Deserialize)]
struct StackValues {
    #[serde(rename = "targetDomain")]
    target_domain: Option<String>,
    #[serde(rename = "pathToWebsiteContents")]
    path_to_website_contents: Option<String>,
    #[serde(rename = "certificateArn")]
    certificate_arn: Option<String>,
    #[serde(rename = "aws:region")]
    region: Option<String>,
    #[serde(rename = "validationTimeoutMinutes")]
    validation_timeout_minutes: Option<u64>,
}

/// the file holding the settings of `stack`, relative to the project directory.
pub fn stack_file_path(dir: &Path, stack: &str) -> PathBuf {
    dir.join(format!("Sitestack.{stack}.toml"))
}

impl StackConfig {
    pub fn load(dir: &Path, stack: &str) -> Result<Self> {
        let stack = validate_stack_name(stack)?;
        let path = stack_file_path(dir, &stack);
        let contents = std::fs::read_to_string(&path).map_err(|source| Error::ReadConfig {
            path: path.clone(),
            source,
        })?;
        let file: StackFile = toml::from_str(&contents).map_err(|source| Error::ParseConfig {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(stack = %stack, path = ?path, "loaded stack configuration");
        Self::from_values(stack, file.config)
    }

    pub fn from_toml(stack: &str, contents: &str) -> Result<Self> {
        let stack = validate_stack_name(stack)?;
        let file: StackFile = toml::from_str(contents).map_err(|source| Error::ParseConfig {
            path: PathBuf::from(format!("<{stack}>")),
            source,
        })?;
        Self::from_values(stack, file.config)
    }

    fn from_values(stack: String, values: StackValues) -> Result<Self> {
        let target_domain = values
            .target_domain
            .filter(|d| !d.is_empty())
            .ok_or(Error::MissingConfig("targetDomain"))?;
        if !target_domain.contains('.') {
            return Err(Error::InvalidConfig {
                key: "targetDomain",
                reason: format!("{target_domain:?} must contain at least one dot"),
            });
        }
        let path_to_website_contents = values
            .path_to_website_contents
            .filter(|p| !p.is_empty())
            .ok_or(Error::MissingConfig("pathToWebsiteContents"))?;
        let certificate_arn = values.certificate_arn.filter(|a| !a.is_empty());
        if let Some(arn) = &certificate_arn {
            if !arn.starts_with("arn:") {
                return Err(Error::InvalidConfig {
                    key: "certificateArn",
                    reason: format!("{arn:?} is not an ARN"),
                });
            }
        }
        let region = values.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if let Some(reason) = verify_region(&region) {
            return Err(Error::InvalidConfig { key: "aws:region", reason });
        }
        let minutes = values
            .validation_timeout_minutes
            .unwrap_or(DEFAULT_VALIDATION_TIMEOUT_MINUTES);
        let validation_timeout = minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| Error::InvalidConfig {
                key: "validationTimeoutMinutes",
                reason: format!("{minutes} minutes is too long"),
            })?;

        let mut tags = Tags::new();
        tags.insert("Environment".to_string(), stack.clone());
        tags.insert("Name".to_string(), target_domain.clone());

        Ok(StackConfig {
            stack,
            target_domain,
            path_to_website_contents: PathBuf::from(path_to_website_contents),
            certificate_arn,
            region,
            validation_timeout,
            tags,
        })
    }
}

/// A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
/// It must start with an alphabetical character and can't be longer than 128 characters.
pub fn validate_stack_name(stack_name: &str) -> Result<String> {
    let restriction = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    let invalid = || Error::InvalidStackName {
        name: stack_name.to_string(),
        reason: restriction,
    };
    let mut chars = stack_name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid()),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid());
    }
    if stack_name.len() > 128 {
        return Err(invalid());
    }
    Ok(stack_name.to_string())
}
