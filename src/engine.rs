use crate::cast::as_boolean;
use crate::context::{resolve_contexts, DataSources, ExprContext, NodeContext};
use crate::errors::Result;
use crate::expression::LayoutExpression;
use itertools::Itertools;
use serde_json::Value;

/// =========================
/// Public API (Evaluation)
/// =========================

/// Evaluate a parsed expression. Pure: the same expression and context
/// always give the same result.
pub fn evaluate(expr: &LayoutExpression, ctx: &ExprContext<'_>) -> Result<Value> {
    match expr {
        LayoutExpression::Literal(v) => Ok(v.clone()),
        LayoutExpression::Call { function, args } => function.call(args, ctx),
    }
}

/// Parse raw JSON and evaluate it. Unknown functions and wrong argument
/// counts surface here as evaluation failures.
pub fn evaluate_json(expr: &Value, ctx: &ExprContext<'_>) -> Result<Value> {
    let parsed = LayoutExpression::parse(expr)?;
    evaluate(&parsed, ctx)
}

/// Evaluate, falling back to `default` when the expression is broken. The
/// failure is logged rather than returned.
pub fn evaluate_or_default(expr: &Value, ctx: &ExprContext<'_>, default: Value) -> Value {
    match evaluate_json(expr, ctx) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                error = %e,
                component = ctx.node.component.as_deref().unwrap_or("<none>"),
                expression = %expr,
                "expression failed, using default value"
            );
            default
        }
    }
}

/// =========================
/// Public API (Layout helpers)
/// =========================

/// Node id as rendered in the form: the component id, suffixed with each
/// row index when inside repeating groups (`field-0-2`).
pub fn node_id(node: &NodeContext) -> String {
    let id = node.component.as_deref().unwrap_or_default();
    if node.row_indices.is_empty() {
        id.to_string()
    } else {
        format!("{id}-{}", node.row_indices.iter().join("-"))
    }
}

/// Ids of every node whose `hidden` expression evaluates to true, in layout
/// order.
pub fn hidden_components(sources: &DataSources) -> Result<Vec<String>> {
    let mut hidden = Vec::new();
    for node in resolve_contexts(sources)? {
        let Some(id) = node.component.as_deref() else {
            continue;
        };
        let Some((_, comp)) = sources.layouts.find(id, node.current_layout.as_deref()) else {
            continue;
        };
        let Some(expr) = &comp.hidden else {
            continue;
        };
        let ctx = ExprContext::new(&node, sources);
        if as_boolean(&evaluate_json(expr, &ctx)?)? {
            hidden.push(node_id(&node));
        }
    }
    Ok(hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExprError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sources() -> DataSources {
        serde_json::from_value(json!({
            "dataModel": {"Age": 17, "Kids": [{"Name": "Ola"}, {"Name": ""}]},
            "frontendSettings": {"minAge": 18},
            "layouts": {
                "Page": {"data": {"layout": [
                    {"id": "age", "type": "Input", "dataModelBindings": {"simpleBinding": "Age"}},
                    {"id": "warning", "type": "Paragraph",
                     "hidden": ["greaterThanEq", ["component", "age"], ["frontendSettings", "minAge"]]},
                    {"id": "kids", "type": "Group", "maxCount": 4, "children": ["kidName"],
                     "dataModelBindings": {"group": "Kids"}},
                    {"id": "kidName", "type": "Input", "dataModelBindings": {"simpleBinding": "Kids.Name"},
                     "hidden": ["equals", ["component", "kidName"], ""]}
                ]}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn literal_passes_through() {
        let src = DataSources::default();
        let node = NodeContext::default();
        let ctx = ExprContext::new(&node, &src);
        assert_eq!(evaluate_json(&json!("hello"), &ctx).unwrap(), json!("hello"));
        assert_eq!(evaluate_json(&json!(null), &ctx).unwrap(), json!(null));
    }

    #[test]
    fn falls_back_to_default() {
        let src = sources();
        let node = NodeContext::default();
        let ctx = ExprContext::new(&node, &src);
        let out = evaluate_or_default(&json!(["component", "missing"]), &ctx, json!(false));
        assert_eq!(out, json!(false));
    }

    #[test]
    fn hidden_components_uses_row_ids() {
        assert_eq!(hidden_components(&sources()).unwrap(), vec!["kidName-1".to_string()]);
    }

    #[test]
    fn row_index_outside_group_fails() {
        let src = sources();
        let node = NodeContext::component("age");
        let ctx = ExprContext::new(&node, &src);
        let err = evaluate_json(&json!(["rowIndex"]), &ctx).unwrap_err();
        assert!(matches!(err, ExprError::ContextResolution { .. }));
    }
}
