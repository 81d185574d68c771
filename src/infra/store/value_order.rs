//! Total order over JSON values, ranked by type the way Postgres orders JSONB.

use std::cmp::Ordering;

use serde_json::Value;

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub(super) fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => {
                let l = l.as_f64().unwrap_or(f64::NAN);
                let r = r.as_f64().unwrap_or(f64::NAN);
                l.partial_cmp(&r).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(
            compare_values(&json!(1_717_243_200_000_i64), &json!(1_717_243_200_000_i64)),
            Ordering::Equal
        );
    }

    #[test]
    fn mixed_types_follow_type_rank() {
        assert_eq!(compare_values(&json!(null), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("z"), &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(5)), Ordering::Greater);
    }
}
