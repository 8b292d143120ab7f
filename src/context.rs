//! Evaluation context: where in the form an expression is evaluated, and the
//! data it can read.

use crate::datamodel::DataPath;
use crate::errors::{ExprError, Result};
use crate::layout::{LayoutComponent, Layouts};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata about the instance being filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_owner_party_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl InstanceContext {
    fn get(&self, key: &str) -> Option<Option<&str>> {
        match key {
            "instanceOwnerPartyId" => Some(self.instance_owner_party_id.as_deref()),
            "instanceId" => Some(self.instance_id.as_deref()),
            "appId" => Some(self.app_id.as_deref()),
            _ => None,
        }
    }
}

/// Everything an expression can look up. Read-only during evaluation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    #[serde(default, rename = "dataModel")]
    pub form_data: Value,
    #[serde(default)]
    pub instance_context: Option<InstanceContext>,
    #[serde(default, rename = "frontendSettings")]
    pub application_settings: Map<String, Value>,
    #[serde(default)]
    pub layouts: Layouts,
}

/// A position in the form: a component, the repeating group rows it sits in
/// (outermost first) and the page being shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_layout: Option<String>,
}

impl NodeContext {
    pub fn component(id: impl Into<String>) -> Self {
        Self {
            component: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.row_indices = rows;
        self
    }

    pub fn on_layout(mut self, layout: impl Into<String>) -> Self {
        self.current_layout = Some(layout.into());
        self
    }
}

/// The bundle handed to the evaluator for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ExprContext<'a> {
    pub node: &'a NodeContext,
    pub sources: &'a DataSources,
}

impl<'a> ExprContext<'a> {
    pub fn new(node: &'a NodeContext, sources: &'a DataSources) -> Self {
        Self { node, sources }
    }

    /// Innermost row index of the current node.
    pub fn row_index(&self) -> Result<usize> {
        self.node.row_indices.last().copied().ok_or_else(|| {
            ExprError::context("rowIndex", "not inside a repeating group")
        })
    }

    /// Value bound to component `id` through its simple binding.
    pub fn component_value(&self, id: &str) -> Result<Value> {
        let reference = format!("component({id})");
        let layouts = &self.sources.layouts;
        let active = self.node.current_layout.as_deref();
        let (page, comp) = layouts.find(id, active).ok_or_else(|| match active {
            Some(_) => ExprError::context(&reference, "component not found in active layout"),
            None => ExprError::context(&reference, "component not found in any layout"),
        })?;
        let binding = comp
            .simple_binding()
            .ok_or_else(|| ExprError::context(&reference, "component has no simple binding"))?;
        let path = DataPath::parse(binding)
            .map_err(|e| ExprError::context(&reference, format!("invalid binding '{binding}': {e}")))?;

        let ancestors = layouts.repeating_ancestors(page, id);
        if ancestors.len() > self.node.row_indices.len() {
            return Err(ExprError::context(
                &reference,
                "component is inside a repeating group, but no row index is known",
            ));
        }
        let groups = group_paths(&ancestors)?;
        let path = path.with_row_indices(&groups, &self.node.row_indices);
        Ok(path.lookup(&self.sources.form_data).cloned().unwrap_or(Value::Null))
    }

    /// Value at a data model path, or null when nothing is stored there.
    pub fn data_model(&self, raw: &str) -> Result<Value> {
        let path = DataPath::parse(raw).map_err(|e| {
            ExprError::context(format!("dataModel({raw})"), format!("invalid path: {e}"))
        })?;
        let groups = match self.current_component() {
            Some((page, id)) => group_paths(&self.sources.layouts.repeating_ancestors(page, id))?,
            None => Vec::new(),
        };
        let path = path.with_row_indices(&groups, &self.node.row_indices);
        Ok(path.lookup(&self.sources.form_data).cloned().unwrap_or(Value::Null))
    }

    pub fn instance_context(&self, key: &str) -> Result<Value> {
        let reference = format!("instanceContext({key})");
        let instance = self
            .sources
            .instance_context
            .as_ref()
            .ok_or_else(|| ExprError::context(&reference, "no instance context available"))?;
        let value = instance
            .get(key)
            .ok_or_else(|| ExprError::context(&reference, "unknown instance context key"))?;
        Ok(value.map_or(Value::Null, |v| Value::String(v.to_string())))
    }

    pub fn frontend_setting(&self, key: &str) -> Value {
        self.sources
            .application_settings
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn current_component(&self) -> Option<(&'a str, &'a str)> {
        let id = self.node.component.as_deref()?;
        let (page, comp) = self
            .sources
            .layouts
            .find(id, self.node.current_layout.as_deref())?;
        Some((page, comp.id.as_str()))
    }
}

fn group_paths(groups: &[&LayoutComponent]) -> Result<Vec<DataPath>> {
    groups
        .iter()
        .map(|g| {
            let binding = g.group_binding().ok_or_else(|| {
                ExprError::context(format!("component({})", g.id), "repeating group has no group binding")
            })?;
            DataPath::parse(binding)
                .map(|p| p.without_indices())
                .map_err(|e| {
                    ExprError::context(format!("component({})", g.id), format!("invalid group binding: {e}"))
                })
        })
        .collect()
}

/// Every node in the form, depth first in layout order. Repeating groups
/// expand into one set of child nodes per row present in the form data.
pub fn resolve_contexts(sources: &DataSources) -> Result<Vec<NodeContext>> {
    let mut out = Vec::new();
    for (page, comps) in sources.layouts.pages() {
        let top_level = comps
            .iter()
            .filter(|c| !comps.iter().any(|g| g.is_group() && g.has_child(&c.id)));
        let mut walker = Walker {
            page,
            comps,
            data: &sources.form_data,
            out: &mut out,
        };
        for comp in top_level {
            walker.visit(comp, &mut Vec::new(), &mut Vec::new(), 0)?;
        }
    }
    Ok(out)
}

struct Walker<'a, 'o> {
    page: &'a str,
    comps: &'a [LayoutComponent],
    data: &'a Value,
    out: &'o mut Vec<NodeContext>,
}

impl<'a> Walker<'a, '_> {
    fn visit(
        &mut self,
        comp: &'a LayoutComponent,
        rows: &mut Vec<usize>,
        groups: &mut Vec<DataPath>,
        depth: usize,
    ) -> Result<()> {
        self.out.push(NodeContext {
            component: Some(comp.id.clone()),
            row_indices: rows.clone(),
            current_layout: Some(self.page.to_string()),
        });
        if !comp.is_group() || depth > self.comps.len() {
            return Ok(());
        }
        let comps = self.comps;
        let children: Vec<&'a LayoutComponent> = comp
            .child_ids()
            .filter_map(|id| comps.iter().find(|c| c.id == id))
            .collect();

        if !comp.is_repeating() {
            for child in children {
                self.visit(child, rows, groups, depth + 1)?;
            }
            return Ok(());
        }

        let own = group_paths(&[comp])?.remove(0);
        let row_count = own
            .with_row_indices(groups, rows)
            .lookup(self.data)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        groups.push(own);
        for row in 0..row_count {
            rows.push(row);
            for &child in &children {
                self.visit(child, rows, groups, depth + 1)?;
            }
            rows.pop();
        }
        groups.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sources() -> DataSources {
        serde_json::from_value(json!({
            "dataModel": {
                "Name": "Kari",
                "People": [{"Age": 20}, {"Age": 15}]
            },
            "instanceContext": {"instanceId": "512345/abc", "appId": "org/app"},
            "frontendSettings": {"showSummary": true},
            "layouts": {
                "Page1": {"data": {"layout": [
                    {"id": "name", "type": "Input", "dataModelBindings": {"simpleBinding": "Name"}},
                    {"id": "people", "type": "Group", "maxCount": 10, "children": ["age"],
                     "dataModelBindings": {"group": "People"}},
                    {"id": "age", "type": "Input", "dataModelBindings": {"simpleBinding": "People.Age"}}
                ]}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn component_in_repeating_group_uses_row() {
        let src = sources();
        let node = NodeContext::component("age").with_rows(vec![1]);
        let ctx = ExprContext::new(&node, &src);
        assert_eq!(ctx.component_value("age").unwrap(), json!(15));
        assert_eq!(ctx.data_model("People.Age").unwrap(), json!(15));
    }

    #[test]
    fn component_in_repeating_group_without_row_fails() {
        let src = sources();
        let node = NodeContext::component("name");
        let ctx = ExprContext::new(&node, &src);
        let err = ctx.component_value("age").unwrap_err();
        assert!(matches!(err, ExprError::ContextResolution { .. }));
    }

    #[test]
    fn instance_context_rejects_unknown_keys() {
        let src = sources();
        let node = NodeContext::default();
        let ctx = ExprContext::new(&node, &src);
        assert_eq!(ctx.instance_context("appId").unwrap(), json!("org/app"));
        assert_eq!(ctx.instance_context("instanceOwnerPartyId").unwrap(), Value::Null);
        assert!(ctx.instance_context("partyType").is_err());
    }

    #[test]
    fn resolves_rows_depth_first() {
        let contexts = resolve_contexts(&sources()).unwrap();
        let summary: Vec<_> = contexts
            .iter()
            .map(|c| (c.component.clone().unwrap(), c.row_indices.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("name".to_string(), vec![]),
                ("people".to_string(), vec![]),
                ("age".to_string(), vec![0]),
                ("age".to_string(), vec![1]),
            ]
        );
    }
}
