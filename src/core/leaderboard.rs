use crate::core::review::ReviewRecord;
use serde_json::Value;
use std::cmp::Ordering;

/// Numeric value of a score as the model gave it. Numbers are used as-is,
/// strings only when the whole trimmed text parses as a number.
pub fn score_value(score: &Value) -> Option<f64> {
    let n = match score {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Highest score first; scores without a numeric value go last. Ties keep
/// ledger order.
pub fn rank_reviews(mut reviews: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
    reviews.sort_by(|a, b| match (score_value(&a.score), score_value(&b.score)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    reviews
}

pub fn display_score(score: &Value) -> String {
    match score {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
