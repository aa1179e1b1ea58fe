use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Attribute values a provisioned resource exposes to the resources after it.
pub type Attributes = BTreeMap<String, String>;

/// A string that may not be known until apply time.
///
/// `GetAtt` points at an attribute of another resource in the same plan, and is
/// what the plan uses to work out ordering. `Join` concatenates its parts once they
/// are all known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrVal {
    Val(String),
    GetAtt { logical_id: String, attribute: String },
    Join(Vec<StrVal>),
}

pub fn get_att(logical_id: &str, attribute: &str) -> StrVal {
    StrVal::GetAtt {
        logical_id: logical_id.to_string(),
        attribute: attribute.to_string(),
    }
}

impl StrVal {
    pub fn join(parts: impl IntoIterator<Item = StrVal>) -> Self {
        StrVal::Join(parts.into_iter().collect())
    }

    pub fn is_known(&self) -> bool {
        match self {
            StrVal::Val(_) => true,
            StrVal::GetAtt { .. } => false,
            StrVal::Join(parts) => parts.iter().all(StrVal::is_known),
        }
    }

    /// logical ids this value waits on.
    pub fn references(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            StrVal::Val(_) => {}
            StrVal::GetAtt { logical_id, .. } => {
                if !out.contains(&logical_id.as_str()) {
                    out.push(logical_id);
                }
            }
            StrVal::Join(parts) => {
                for part in parts {
                    part.collect_references(out);
                }
            }
        }
    }

    pub fn resolve(&self, state: &StackState) -> Result<String> {
        match self {
            StrVal::Val(s) => Ok(s.clone()),
            StrVal::GetAtt { logical_id, attribute } => state
                .attribute(logical_id, attribute)
                .map(str::to_string)
                .ok_or_else(|| Error::UnresolvedReference {
                    logical_id: logical_id.clone(),
                    attribute: attribute.clone(),
                }),
            StrVal::Join(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.resolve(state)?);
                }
                Ok(out)
            }
        }
    }
}

impl std::fmt::Display for StrVal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrVal::Val(s) => f.write_str(s),
            StrVal::GetAtt { logical_id, attribute } => write!(f, "${{{logical_id}.{attribute}}}"),
            StrVal::Join(parts) => {
                for part in parts {
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for StrVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::Val(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::Val(value)
    }
}

/// Attributes of every resource provisioned so far, keyed by logical id.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StackState {
    resources: BTreeMap<String, Attributes>,
}

impl StackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical_id: &str, attributes: Attributes) {
        self.resources.insert(logical_id.to_string(), attributes);
    }

    pub fn get(&self, logical_id: &str) -> Option<&Attributes> {
        self.resources.get(logical_id)
    }

    pub fn attribute(&self, logical_id: &str, attribute: &str) -> Option<&str> {
        self.resources
            .get(logical_id)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
