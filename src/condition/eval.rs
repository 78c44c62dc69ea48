use super::ast::{CmpOp, Expr, Value};
use crate::error::ConditionError;
use ahash::AHashMap;

/// Evaluates a compiled condition AST against the variable map.
///
/// `and`/`or` short-circuit on truthiness. Comparisons are numeric when both
/// sides coerce to numbers; otherwise they fall back to string comparison of
/// the displayed values, so `status == "open"` and `count > 3` both behave
/// as a designer expects.
pub fn evaluate(
    expr: &Expr,
    variables: &AHashMap<String, Value>,
) -> Result<Value, ConditionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UndefinedVariable(name.clone())),
        Expr::Not(inner) => {
            let value = evaluate(inner, variables)?;
            Ok(Value::Bool(!value.is_truthy()))
        }
        Expr::And(left, right) => {
            let lv = evaluate(left, variables)?;
            if !lv.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let rv = evaluate(right, variables)?;
            Ok(Value::Bool(rv.is_truthy()))
        }
        Expr::Or(left, right) => {
            let lv = evaluate(left, variables)?;
            if lv.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let rv = evaluate(right, variables)?;
            Ok(Value::Bool(rv.is_truthy()))
        }
        Expr::Compare(op, left, right) => {
            let lv = evaluate(left, variables)?;
            let rv = evaluate(right, variables)?;
            Ok(Value::Bool(compare(*op, &lv, &rv)))
        }
        Expr::Contains(left, right) => {
            let haystack = evaluate(left, variables)?.to_string();
            let needle = evaluate(right, variables)?.to_string();
            Ok(Value::Bool(haystack.contains(&needle)))
        }
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return match op {
            CmpOp::Eq => l == r,
            CmpOp::Neq => l != r,
            CmpOp::Gt => l > r,
            CmpOp::Gte => l >= r,
            CmpOp::Lt => l < r,
            CmpOp::Lte => l <= r,
        };
    }
    let l = left.to_string();
    let r = right.to_string();
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Neq => l != r,
        CmpOp::Gt => l > r,
        CmpOp::Gte => l >= r,
        CmpOp::Lt => l < r,
        CmpOp::Lte => l <= r,
    }
}
