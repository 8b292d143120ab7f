//! Layout expression evaluation for dynamic forms, plus the loader for the
//! shared JSON test corpus that exercises it.
//!
//! ```
//! use layout_expressions::{evaluate_json, DataSources, ExprContext, NodeContext};
//! use serde_json::json;
//!
//! let sources = DataSources::default();
//! let node = NodeContext::default();
//! let ctx = ExprContext::new(&node, &sources);
//! let out = evaluate_json(&json!(["concat", "a", 1, true]), &ctx).unwrap();
//! assert_eq!(out, json!("a1true"));
//! ```

pub mod errors;
pub mod context;
pub mod engine;
pub mod expression;
pub mod functions;
pub mod layout;
pub mod shared_tests;
mod cast;
mod comparison;
mod datamodel;
mod parser;

pub use context::{resolve_contexts, DataSources, ExprContext, InstanceContext, NodeContext};
pub use engine::{evaluate, evaluate_json, evaluate_or_default, hidden_components, node_id};
pub use errors::{ExprError, FixtureError, Result};
pub use expression::LayoutExpression;
pub use functions::{Arity, ExprFunction};
pub use layout::{LayoutComponent, Layouts};
