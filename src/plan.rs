use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::StrVal;
use crate::regions::CERTIFICATE_REGION;
use crate::resources::Resource;

pub const DEFAULT_BINDING: &str = "default";
/// secondary binding pinned to the region CloudFront reads certificates from.
pub const EAST_BINDING: &str = "east";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderBinding {
    #[serde(rename = "Region")]
    pub region: String,
}

#[derive(Debug)]
pub struct PlannedResource {
    pub logical_id: String,
    pub binding: String,
    pub resource: Box<dyn Resource>,
}

impl PlannedResource {
    pub fn dependencies(&self) -> Vec<&str> {
        self.resource.references()
    }
}

/// Every resource of a stack in declaration order, plus the values it exports.
#[derive(Debug)]
pub struct Plan {
    stack: String,
    bindings: BTreeMap<String, ProviderBinding>,
    resources: Vec<PlannedResource>,
    outputs: Vec<(String, StrVal)>,
}

#[derive(Serialize)]
struct ManifestResource {
    #[serde(rename = "Type")]
    ty: &'static str,
    #[serde(rename = "Provider")]
    provider: String,
    #[serde(rename = "DependsOn")]
    depends_on: Vec<String>,
    #[serde(rename = "Properties")]
    properties: serde_json::Value,
}

#[derive(Serialize)]
struct Manifest<'a> {
    #[serde(rename = "Stack")]
    stack: &'a str,
    #[serde(rename = "Providers")]
    providers: &'a BTreeMap<String, ProviderBinding>,
    #[serde(rename = "Resources")]
    resources: BTreeMap<&'a str, ManifestResource>,
    #[serde(rename = "Outputs")]
    outputs: BTreeMap<&'a str, &'a StrVal>,
}

impl Plan {
    pub fn new(stack: &str, default_region: &str) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(
            DEFAULT_BINDING.to_string(),
            ProviderBinding { region: default_region.to_string() },
        );
        Self {
            stack: stack.to_string(),
            bindings,
            resources: vec![],
            outputs: vec![],
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// registers the `east` binding the certificate resources run under.
    pub fn add_east_binding(&mut self) {
        self.bindings.insert(
            EAST_BINDING.to_string(),
            ProviderBinding { region: CERTIFICATE_REGION.to_string() },
        );
    }

    pub fn bindings(&self) -> &BTreeMap<String, ProviderBinding> {
        &self.bindings
    }

    pub fn add(&mut self, logical_id: &str, resource: impl Resource + 'static) -> Result<ResourceRef> {
        self.add_with_binding(logical_id, DEFAULT_BINDING, resource)
    }

    pub fn add_with_binding(
        &mut self,
        logical_id: &str,
        binding: &str,
        resource: impl Resource + 'static,
    ) -> Result<ResourceRef> {
        if self.get(logical_id).is_some() {
            return Err(Error::DuplicateResource(logical_id.to_string()));
        }
        if !self.bindings.contains_key(binding) {
            return Err(Error::MissingProvider(binding.to_string()));
        }
        self.resources.push(PlannedResource {
            logical_id: logical_id.to_string(),
            binding: binding.to_string(),
            resource: Box::new(resource),
        });
        Ok(ResourceRef(logical_id.to_string()))
    }

    pub fn export(&mut self, name: &str, value: StrVal) {
        self.outputs.push((name.to_string(), value));
    }

    pub fn outputs(&self) -> &[(String, StrVal)] {
        &self.outputs
    }

    pub fn resources(&self) -> &[PlannedResource] {
        &self.resources
    }

    pub fn get(&self, logical_id: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    pub fn contains_type(&self, type_string: &str) -> bool {
        self.resources.iter().any(|r| r.resource.type_string() == type_string)
    }

    /// runs each resource's own checks, then checks every reference points at
    /// a declared resource and that the graph has no cycles.
    pub fn validate(&self) -> Result<()> {
        for planned in &self.resources {
            planned.resource.validate().map_err(|reason| Error::InvalidResource {
                logical_id: planned.logical_id.clone(),
                reason,
            })?;
            for dep in planned.dependencies() {
                if self.get(dep).is_none() {
                    return Err(Error::UnknownResource {
                        from: planned.logical_id.clone(),
                        to: dep.to_string(),
                    });
                }
            }
        }
        for (name, value) in &self.outputs {
            for dep in value.references() {
                if self.get(dep).is_none() {
                    return Err(Error::UnknownResource {
                        from: format!("output {name}"),
                        to: dep.to_string(),
                    });
                }
            }
        }
        self.order().map(|_| ())
    }

    /// Resources sorted so that each comes after everything it references.
    /// Ties keep declaration order.
    pub fn order(&self) -> Result<Vec<&PlannedResource>> {
        let mut placed: Vec<&PlannedResource> = Vec::with_capacity(self.resources.len());
        let mut remaining: Vec<&PlannedResource> = self.resources.iter().collect();
        while !remaining.is_empty() {
            let ready = remaining.iter().position(|candidate| {
                candidate.dependencies().iter().all(|dep| {
                    placed.iter().any(|p| p.logical_id == *dep) || self.get(dep).is_none()
                })
            });
            match ready {
                Some(i) => placed.push(remaining.remove(i)),
                None => {
                    let stuck = remaining.iter().map(|r| r.logical_id.clone()).collect();
                    return Err(Error::DependencyCycle(stuck));
                }
            }
        }
        Ok(placed)
    }

    /// Groups of resources that could be provisioned at the same time:
    /// every resource sits one wave after its deepest dependency.
    pub fn waves(&self) -> Result<Vec<Vec<&str>>> {
        let mut depth: HashMap<&str, usize> = HashMap::new();
        let mut waves: Vec<Vec<&str>> = vec![];
        for planned in self.order()? {
            let level = planned
                .dependencies()
                .iter()
                .filter_map(|dep| depth.get(dep).map(|d| d + 1))
                .max()
                .unwrap_or(0);
            depth.insert(&planned.logical_id, level);
            if waves.len() <= level {
                waves.resize_with(level + 1, Vec::new);
            }
            waves[level].push(&planned.logical_id);
        }
        Ok(waves)
    }

    /// JSON description of the plan for an external engine, in the spirit of a
    /// CloudFormation template: providers, resources with their dependencies, outputs.
    pub fn to_manifest(&self) -> Result<serde_json::Value> {
        let mut resources = BTreeMap::new();
        for planned in &self.resources {
            resources.insert(
                planned.logical_id.as_str(),
                ManifestResource {
                    ty: planned.resource.type_string(),
                    provider: planned.binding.clone(),
                    depends_on: planned.dependencies().iter().map(|d| d.to_string()).collect(),
                    properties: planned.resource.properties()?,
                },
            );
        }
        let manifest = Manifest {
            stack: &self.stack,
            providers: &self.bindings,
            resources,
            outputs: self.outputs.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        };
        Ok(serde_json::to_value(manifest)?)
    }
}

/// Handle to a resource that was just added, for building references to its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef(String);

impl ResourceRef {
    /// a reference by id alone, for resources declared later in the plan.
    pub fn new(logical_id: &str) -> Self {
        ResourceRef(logical_id.to_string())
    }

    pub fn logical_id(&self) -> &str {
        &self.0
    }

    pub fn attr(&self, attribute: &str) -> StrVal {
        crate::output::get_att(&self.0, attribute)
    }
}
