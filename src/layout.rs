//! Layout pages and the components on them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_model_bindings: BTreeMap<String, String>,
    /// Child component ids, for groups. Multi-page groups prefix them with `n:`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// Raw `hidden` expression, parsed when evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Value>,
}

impl LayoutComponent {
    pub fn is_group(&self) -> bool {
        self.component_type.eq_ignore_ascii_case("group")
    }

    pub fn is_repeating(&self) -> bool {
        self.is_group() && self.max_count.unwrap_or(0) > 1
    }

    pub fn simple_binding(&self) -> Option<&str> {
        self.data_model_bindings.get("simpleBinding").map(String::as_str)
    }

    pub fn group_binding(&self) -> Option<&str> {
        self.data_model_bindings.get("group").map(String::as_str)
    }

    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| strip_page_prefix(c))
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.child_ids().any(|c| c == id)
    }
}

fn strip_page_prefix(child: &str) -> &str {
    match child.split_once(':') {
        Some((page, id)) if page.chars().all(|c| c.is_ascii_digit()) => id,
        _ => child,
    }
}

fn component_in<'a>(
    (name, comps): &'a (String, Vec<LayoutComponent>),
    id: &str,
) -> Option<(&'a str, &'a LayoutComponent)> {
    comps.iter().find(|c| c.id == id).map(|c| (name.as_str(), c))
}

/// On-disk shape of one layout page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFile {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub data: LayoutData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutData {
    pub layout: Vec<LayoutComponent>,
}

/// All layout pages, in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Layouts {
    pages: Vec<(String, Vec<LayoutComponent>)>,
}

impl TryFrom<Map<String, Value>> for Layouts {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let pages = map
            .into_iter()
            .map(|(name, raw)| {
                let file: LayoutFile = serde_json::from_value(raw)?;
                Ok((name, file.data.layout))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        Ok(Self { pages })
    }
}

impl Layouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, name: impl Into<String>, components: Vec<LayoutComponent>) -> Self {
        self.pages.push((name.into(), components));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = (&str, &[LayoutComponent])> {
        self.pages.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    pub fn page(&self, name: &str) -> Option<&[LayoutComponent]> {
        self.pages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
    }

    /// Find a component by id. With an active page only that page is
    /// searched; otherwise every page, in declaration order.
    pub fn find(&self, id: &str, active: Option<&str>) -> Option<(&str, &LayoutComponent)> {
        match active {
            Some(active) => self
                .pages
                .iter()
                .find(|(n, _)| n == active)
                .and_then(|page| component_in(page, id)),
            None => self.pages.iter().find_map(|page| component_in(page, id)),
        }
    }

    /// The enclosing repeating groups of `id` on `page`, outermost first.
    pub fn repeating_ancestors(&self, page: &str, id: &str) -> Vec<&LayoutComponent> {
        let Some(comps) = self.page(page) else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut current = id;
        // Group nesting is shallow; the depth bound stops malformed cycles.
        for _ in 0..comps.len() {
            let Some(parent) = comps.iter().find(|c| c.is_group() && c.has_child(current)) else {
                break;
            };
            if parent.is_repeating() {
                chain.push(parent);
            }
            current = parent.id.as_str();
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Layouts {
        serde_json::from_value(json!({
            "FormLayout": {
                "$schema": "https://example.org/layout.schema.v1.json",
                "data": {"layout": [
                    {"id": "outer", "type": "Group", "maxCount": 5, "children": ["inner"],
                     "dataModelBindings": {"group": "Outer"}},
                    {"id": "inner", "type": "Group", "maxCount": 3, "children": ["0:field"],
                     "dataModelBindings": {"group": "Outer.Inner"}},
                    {"id": "field", "type": "Input",
                     "dataModelBindings": {"simpleBinding": "Outer.Inner.value"}}
                ]}
            },
            "Summary": {"data": {"layout": [
                {"id": "field", "type": "Summary"}
            ]}}
        }))
        .unwrap()
    }

    #[test]
    fn keeps_declared_page_order() {
        let names: Vec<_> = sample().pages().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["FormLayout", "Summary"]);
    }

    #[test]
    fn find_uses_active_page() {
        let layouts = sample();
        let (page, comp) = layouts.find("field", Some("Summary")).unwrap();
        assert_eq!(page, "Summary");
        assert_eq!(comp.component_type, "Summary");
        let (page, _) = layouts.find("field", None).unwrap();
        assert_eq!(page, "FormLayout");
    }

    #[test]
    fn find_stays_on_active_page() {
        let layouts = sample();
        assert!(layouts.find("outer", Some("Summary")).is_none());
        assert!(layouts.find("field", Some("Missing")).is_none());
        assert_eq!(layouts.find("outer", None).map(|(p, _)| p), Some("FormLayout"));
    }

    #[test]
    fn repeating_ancestors_outermost_first() {
        let layouts = sample();
        let ids: Vec<_> = layouts
            .repeating_ancestors("FormLayout", "field")
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, vec!["outer", "inner"]);
    }
}
