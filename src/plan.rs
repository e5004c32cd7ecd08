//! Offline delta planning over item lists read from YAML or JSON.

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::reconcilers::{compute_delta, Subresource};
use crate::resources::managed_prefix_list::PrefixListEntry;
use crate::resources::network_acl::NetworkAclEntry;
use crate::resources::route_table::Route;
use crate::resources::security_group::{flatten, IpPermission};
use crate::resources::Tag;
use crate::Result;

/// Sub-resource collections that can be planned
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    Tags,
    SecurityGroupRules,
    NetworkAclEntries,
    Routes,
    PrefixListEntries,
}

/// Classify `latest` against `desired` and render `{toDelete, toUpdate, toAdd}`.
///
/// Both documents are YAML (and so also JSON) lists of items of `kind`.
pub fn plan(kind: Kind, desired: &str, latest: &str) -> Result<Value> {
    match kind {
        Kind::Tags => plan_items::<Tag>(desired, latest, |items| items),
        Kind::SecurityGroupRules => {
            plan_items::<IpPermission>(desired, latest, |rules| flatten(&rules))
        }
        Kind::NetworkAclEntries => plan_items::<NetworkAclEntry>(desired, latest, |items| items),
        Kind::Routes => plan_items::<Route>(desired, latest, |items| items),
        Kind::PrefixListEntries => plan_items::<PrefixListEntry>(desired, latest, |items| items),
    }
}

fn plan_items<T>(desired: &str, latest: &str, prepare: fn(Vec<T>) -> Vec<T>) -> Result<Value>
where
    T: Subresource + DeserializeOwned,
{
    let desired = prepare(parse(desired)?);
    let latest = prepare(parse(latest)?);
    let delta = compute_delta(&desired, &latest)?;
    Ok(serde_json::to_value(delta)?)
}

fn parse<T: DeserializeOwned>(document: &str) -> Result<Vec<T>> {
    if document.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(document)
        .map_err(|e| crate::Error::Terminal(format!("unreadable item list: {e}")))
}

/// JSON schema of a list of `kind` items.
pub fn schema(kind: Kind) -> RootSchema {
    match kind {
        Kind::Tags => list_schema::<Tag>(),
        Kind::SecurityGroupRules => list_schema::<IpPermission>(),
        Kind::NetworkAclEntries => list_schema::<NetworkAclEntry>(),
        Kind::Routes => list_schema::<Route>(),
        Kind::PrefixListEntries => list_schema::<PrefixListEntry>(),
    }
}

fn list_schema<T: JsonSchema>() -> RootSchema {
    schema_for!(Vec<T>)
}
