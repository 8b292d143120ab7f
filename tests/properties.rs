use layout_expressions::{evaluate_json, DataSources, ExprContext, ExprError, NodeContext};
use proptest::prelude::*;
use serde_json::{json, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

fn context_data() -> impl Strategy<Value = (Value, Vec<usize>)> {
    (scalar(), prop::collection::vec(0usize..5, 0..3))
}

/// Functions with a fixed argument count, and that count.
const FIXED: &[(&str, usize)] = &[
    ("equals", 2),
    ("notEquals", 2),
    ("not", 1),
    ("greaterThan", 2),
    ("lessThanEq", 2),
    ("contains", 2),
    ("stringLength", 1),
    ("dataModel", 1),
    ("component", 1),
    ("instanceContext", 1),
];

proptest! {
    #[test]
    fn literals_pass_through(lit in scalar(), (data, rows) in context_data()) {
        let sources = DataSources { form_data: json!({"Field": data}), ..DataSources::default() };
        let node = NodeContext::default().with_rows(rows);
        let ctx = ExprContext::new(&node, &sources);
        prop_assert_eq!(evaluate_json(&lit, &ctx), Ok(lit.clone()));
    }

    #[test]
    fn evaluation_is_deterministic(a in scalar(), b in scalar()) {
        let sources = DataSources::default();
        let node = NodeContext::default();
        let ctx = ExprContext::new(&node, &sources);
        let expr = json!(["concat", ["equals", a.clone(), b.clone()], a, b]);
        prop_assert_eq!(evaluate_json(&expr, &ctx), evaluate_json(&expr, &ctx));
    }

    #[test]
    fn wrong_argument_count_is_an_arity_error(
        idx in 0..FIXED.len(),
        extra in any::<bool>(),
        arg in scalar(),
    ) {
        let (name, n) = FIXED[idx];
        let count = if extra { n + 1 } else { n - 1 };
        let mut expr = vec![json!(name)];
        expr.extend(std::iter::repeat(arg).take(count));

        let sources = DataSources::default();
        let node = NodeContext::default();
        let ctx = ExprContext::new(&node, &sources);
        let err = evaluate_json(&Value::Array(expr), &ctx).unwrap_err();
        prop_assert_eq!(
            err,
            ExprError::Arity { function: name.to_string(), expected: n.to_string(), actual: count }
        );
    }

    #[test]
    fn row_index_needs_a_group(component in "[a-z]{1,8}") {
        let sources = DataSources::default();
        let node = NodeContext::component(component);
        let ctx = ExprContext::new(&node, &sources);
        let is_context_error = matches!(
            evaluate_json(&json!(["rowIndex"]), &ctx),
            Err(ExprError::ContextResolution { .. })
        );
        prop_assert!(is_context_error);
    }
}
