/*!

Reads the plugins that a workspace asks for from its `editor` and `plugins` attributes. An entry
is either `[<registry>/]<publisher>/<name>/<version>` or the URL of a plugin meta file ending in
`.yaml`, in which case the id is taken from the three path segments that precede the file name.

!*/

use crate::error::{self, Result};
use lazy_static::lazy_static;
use regex::Regex;
use snafu::{ensure, OptionExt};
use std::collections::{BTreeMap, BTreeSet};
use tooling_model::constants::{
    WORKSPACE_TOOLING_EDITOR_ATTRIBUTE, WORKSPACE_TOOLING_PLUGINS_ATTRIBUTE,
};
use tooling_model::PluginFQN;

lazy_static! {
    static ref PLUGIN_ID: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^(?:(?P<registry>.+)/)?(?P<id>[^/\s]+/[^/\s]+/[^/\s]+)$").unwrap()
    };
    static ref META_REFERENCE: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^.+/(?P<id>[^/\s]+/[^/\s]+/[^/\s]+)/[^/\s]+\.yaml$").unwrap()
    };
}

/// The plugins that `attributes` reference, the editor first. Duplicate ids are rejected.
pub(crate) fn parse_plugins(attributes: &BTreeMap<String, String>) -> Result<Vec<PluginFQN>> {
    let entries = [
        WORKSPACE_TOOLING_EDITOR_ATTRIBUTE,
        WORKSPACE_TOOLING_PLUGINS_ATTRIBUTE,
    ]
    .iter()
    .filter_map(|attribute| attributes.get(*attribute))
    .flat_map(|value| value.split(','))
    .map(str::trim)
    .filter(|entry| !entry.is_empty());

    let mut ids = BTreeSet::new();
    let mut plugins = Vec::new();
    for entry in entries {
        let plugin = parse_entry(entry)?;
        ensure!(
            ids.insert(plugin.id.clone()),
            error::DuplicatePluginSnafu { id: &plugin.id }
        );
        plugins.push(plugin);
    }
    Ok(plugins)
}

fn parse_entry(entry: &str) -> Result<PluginFQN> {
    if entry.ends_with(".yaml") {
        let captures =
            META_REFERENCE
                .captures(entry)
                .context(error::InvalidPluginReferenceSnafu {
                    reference: entry,
                    reason: "a meta file must be in a '<publisher>/<name>/<version>' directory",
                })?;
        return Ok(PluginFQN {
            registry: None,
            id: captures["id"].to_string(),
            reference: Some(entry.to_string()),
        });
    }
    let captures = PLUGIN_ID
        .captures(entry)
        .context(error::InvalidPluginReferenceSnafu {
            reference: entry,
            reason: "expected '[<registry>/]<publisher>/<name>/<version>'",
        })?;
    Ok(PluginFQN {
        registry: captures
            .name("registry")
            .map(|registry| registry.as_str().to_string()),
        id: captures["id"].to_string(),
        reference: None,
    })
}
