use serde::Serialize;

use super::*;
use crate::domain::fqdn;

/// A hosted zone found at plan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedZone {
    pub id: String,
    /// zone name, always ending in `.`
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasTarget<V = StrVal> {
    pub name: V,
    pub zone_id: V,
    pub evaluate_target_health: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<V = StrVal> {
    pub zone: HostedZone,
    /// relative to the zone, or absolute when it ends in `.`. empty means the apex.
    pub name: V,
    #[serde(rename = "type")]
    pub record_type: V,
    pub ttl: Option<i64>,
    pub records: Vec<V>,
    pub aliases: Vec<AliasTarget<V>>,
}

impl Record {
    pub const NAME: &'static str = "name";
    pub const FQDN: &'static str = "fqdn";
}

impl Record<String> {
    pub fn fqdn(&self) -> String {
        fqdn(&self.name, &self.zone.name)
    }
}

impl Resolve for AliasTarget {
    type Output = AliasTarget<String>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        Ok(AliasTarget {
            name: self.name.resolve(state)?,
            zone_id: self.zone_id.resolve(state)?,
            evaluate_target_health: self.evaluate_target_health,
        })
    }
}

impl Resolve for Record {
    type Output = Record<String>;
    fn resolve(&self, state: &StackState) -> Result<Self::Output> {
        Ok(Record {
            zone: self.zone.clone(),
            name: self.name.resolve(state)?,
            record_type: self.record_type.resolve(state)?,
            ttl: self.ttl,
            records: self.records.resolve(state)?,
            aliases: self.aliases.resolve(state)?,
        })
    }
}

#[async_trait]
impl Resource for Record {
    fn type_string(&self) -> &'static str {
        "sitestack:route53:Record"
    }

    fn references(&self) -> Vec<&str> {
        let vals = [&self.name, &self.record_type]
            .into_iter()
            .chain(&self.records)
            .chain(self.aliases.iter().flat_map(|a| [&a.name, &a.zone_id]));
        collect_references(vals)
    }

    fn properties(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.zone.id.is_empty() {
            return Err("Route53 record must have a hosted zone id".to_string());
        }
        if !self.zone.name.ends_with('.') {
            return Err(format!("hosted zone name {:?} must end in .", self.zone.name));
        }
        match (self.aliases.is_empty(), self.records.is_empty()) {
            (true, true) => Err("Route53 record needs either records or an alias target".to_string()),
            (false, false) => Err("Route53 alias records cannot also carry records".to_string()),
            (false, true) if self.ttl.is_some() => Err("Route53 alias records cannot set a ttl".to_string()),
            (true, false) if self.ttl.is_none() => Err("Route53 records without an alias need a ttl".to_string()),
            _ => Ok(()),
        }
    }

    async fn provision(&self, ctx: &ApplyContext<'_>, provider: &dyn CloudProvider) -> Result<Attributes> {
        let record = Resolve::resolve(self, ctx.state)?;
        provider.upsert_record(&record).await?;
        Ok(attributes([
            (Self::FQDN, record.fqdn()),
            (Self::NAME, record.name),
        ]))
    }
}
