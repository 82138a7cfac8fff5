//! Pattern rule evaluation (spec §4.6): `field op value` predicates over
//! an event/context JSON payload.

use agentflow_types::MatchingRule;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

/// Looks up `field` in `payload`, treating a dotted path as nested object
/// access (`"agent.status"` -> `payload["agent"]["status"]`).
fn lookup<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    field.split('.').try_fold(payload, |acc, key| acc.get(key))
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Evaluates one `MatchingRule` against `payload`. Unknown operators and
/// missing fields evaluate to `false` rather than erroring, so a
/// malformed or partially-populated payload never panics a pattern scan.
pub fn evaluate_rule(rule: &MatchingRule, payload: &Value) -> bool {
    let Some(actual) = lookup(payload, &rule.field) else { return false };
    match rule.operator.as_str() {
        "eq" => actual == &rule.value,
        "ne" => actual != &rule.value,
        "gt" => matches!((as_f64(actual), as_f64(&rule.value)), (Some(a), Some(b)) if a > b),
        "gte" => matches!((as_f64(actual), as_f64(&rule.value)), (Some(a), Some(b)) if a >= b),
        "lt" => matches!((as_f64(actual), as_f64(&rule.value)), (Some(a), Some(b)) if a < b),
        "lte" => matches!((as_f64(actual), as_f64(&rule.value)), (Some(a), Some(b)) if a <= b),
        "regex" => match (actual.as_str(), rule.value.as_str()) {
            (Some(text), Some(pattern)) => Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false),
            _ => false,
        },
        "in" => match rule.value.as_array() {
            Some(set) => set.iter().any(|v| v == actual),
            None => false,
        },
        // `value` is a duration in seconds; matches when `actual` (an
        // RFC3339 timestamp) is older than that many seconds.
        "older_than" => match (actual.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()), as_f64(&rule.value)) {
            (Some(ts), Some(secs)) => (Utc::now() - ts.with_timezone(&Utc)).num_seconds() as f64 > secs,
            _ => false,
        },
        _ => false,
    }
}

/// A Pattern matches a payload when every one of its `matching_rules`
/// evaluates true (conjunctive rule-set, per spec §4.6). A Pattern with
/// no rules never matches anything.
pub fn pattern_matches(rules: &[MatchingRule], payload: &Value) -> bool {
    !rules.is_empty() && rules.iter().all(|rule| evaluate_rule(rule, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(field: &str, op: &str, value: Value) -> MatchingRule {
        MatchingRule { field: field.into(), operator: op.into(), value }
    }

    #[test]
    fn equality_and_inequality() {
        let payload = json!({"status": "failed"});
        assert!(evaluate_rule(&rule("status", "eq", json!("failed")), &payload));
        assert!(evaluate_rule(&rule("status", "ne", json!("ok")), &payload));
        assert!(!evaluate_rule(&rule("status", "eq", json!("ok")), &payload));
    }

    #[test]
    fn numeric_comparisons() {
        let payload = json!({"latency_ms": 250});
        assert!(evaluate_rule(&rule("latency_ms", "gt", json!(100)), &payload));
        assert!(evaluate_rule(&rule("latency_ms", "gte", json!(250)), &payload));
        assert!(evaluate_rule(&rule("latency_ms", "lt", json!(300)), &payload));
        assert!(!evaluate_rule(&rule("latency_ms", "lte", json!(249)), &payload));
    }

    #[test]
    fn regex_and_set_membership() {
        let payload = json!({"message": "connection reset by peer", "code": "ECONNRESET"});
        assert!(evaluate_rule(&rule("message", "regex", json!("^connection reset")), &payload));
        assert!(evaluate_rule(&rule("code", "in", json!(["ECONNRESET", "ETIMEDOUT"])), &payload));
        assert!(!evaluate_rule(&rule("code", "in", json!(["EPIPE"])), &payload));
    }

    #[test]
    fn older_than_compares_duration_in_seconds() {
        let stale = (Utc::now() - chrono::Duration::seconds(3_600)).to_rfc3339();
        let payload = json!({"last_seen": stale});
        assert!(evaluate_rule(&rule("last_seen", "older_than", json!(1_800)), &payload));
        assert!(!evaluate_rule(&rule("last_seen", "older_than", json!(7_200)), &payload));
    }

    #[test]
    fn pattern_matches_requires_every_rule() {
        let payload = json!({"status": "failed", "retries": 3});
        let rules = vec![rule("status", "eq", json!("failed")), rule("retries", "gte", json!(3))];
        assert!(pattern_matches(&rules, &payload));

        let rules_one_fails = vec![rule("status", "eq", json!("failed")), rule("retries", "gte", json!(4))];
        assert!(!pattern_matches(&rules_one_fails, &payload));
    }
}
