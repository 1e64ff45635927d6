//! Tree persistence: `[{ "Type": <type>, "Value": <member value> }, ...]`.

use serde::Deserialize;

use super::ElementStruct;
use crate::Result;
use crate::constants::{TYPE_KEY, VALUE_KEY};
use crate::types::TypeTag;

impl ElementStruct {
    /// Saves every element with its declared type.
    pub fn save(&self) -> Result<serde_json::Value> {
        let mut nodes = Vec::with_capacity(self.elements.len());
        for record in &self.elements {
            let mut node = serde_json::Map::new();
            node.insert(TYPE_KEY.to_string(), serde_json::to_value(&record.ty)?);
            node.insert(VALUE_KEY.to_string(), record.member.save());
            nodes.push(serde_json::Value::Object(node));
        }
        Ok(serde_json::Value::Array(nodes))
    }

    /// Appends the elements saved in `node`.
    ///
    /// Entries that are not objects or lack a type are skipped; an entry
    /// without a value keeps the member's defaults.
    pub fn load(&mut self, node: &serde_json::Value) -> Result<()> {
        let Some(list) = node.as_array() else {
            tracing::warn!("Expected a list node; nothing loaded");
            return Ok(());
        };
        for child in list {
            let Some(dict) = child.as_object() else {
                continue;
            };
            let Some(type_node) = dict.get(TYPE_KEY) else {
                continue;
            };
            let ty = TypeTag::deserialize(type_node)?;
            let member = self.add(ty)?;
            if let Some(value) = dict.get(VALUE_KEY) {
                member.load(value)?;
            }
        }
        Ok(())
    }
}
