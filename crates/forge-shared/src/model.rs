//! Structured objects the stages exchange: the problem brief, the detail
//! spec, and the two transient question envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Problem category assigned by the classifier. Unknown categories from the
/// model collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemCategory {
    Bug,
    Performance,
    ManualProcess,
    Reliability,
    #[default]
    Other,
}

impl ProblemCategory {
    fn from_model_value(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_str)
            .and_then(|s| {
                serde_json::from_value(Value::String(s.trim().to_ascii_lowercase())).ok()
            })
            .unwrap_or_default()
    }
}

/// Normalized description of a user problem judged worth automating.
/// Immutable for the rest of the session once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemBrief {
    pub summary: String,
    #[serde(default)]
    pub category: ProblemCategory,
    #[serde(default)]
    pub signals: Vec<String>,
}

impl ProblemBrief {
    /// Lenient decode of a model-produced object. Returns `None` unless the
    /// object is tagged `"type": "ProblemBrief"`; accepts `summary` or
    /// `description` for the summary field.
    pub fn from_model_value(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some("ProblemBrief") {
            return None;
        }
        let summary = value
            .get("summary")
            .or_else(|| value.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        Some(Self {
            summary,
            category: ProblemCategory::from_model_value(value.get("category")),
            signals: string_list(value.get("signals")),
        })
    }
}

/// Requirements gathered by the elicitor, keyed by requirement name.
/// Refined in place across turns until complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailSpec {
    pub fields: BTreeMap<String, Value>,
}

impl DetailSpec {
    /// Decodes a model object tagged `"type": "DetailSpec"`. Fields may be
    /// nested under a `fields` key or spread across the object itself.
    pub fn from_model_value(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some("DetailSpec") {
            return None;
        }
        let object = value.as_object()?;
        let mut fields = BTreeMap::new();
        if let Some(inner) = object.get("fields").and_then(Value::as_object) {
            for (key, val) in inner {
                fields.insert(key.clone(), val.clone());
            }
        } else {
            for (key, val) in object {
                if key != "type" {
                    fields.insert(key.clone(), val.clone());
                }
            }
        }
        Some(Self { fields })
    }

    /// True once every requirement carries a concrete, non-empty value.
    pub fn is_complete(&self) -> bool {
        !self.fields.is_empty()
            && self.fields.values().all(|value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    /// Folds a newer spec into this one. Newer concrete values win; a null
    /// or blank value never clobbers an answer already gathered.
    pub fn merge_from(&mut self, newer: DetailSpec) {
        for (key, value) in newer.fields {
            let blank = match &value {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            };
            if blank {
                self.fields.entry(key).or_insert(value);
            } else {
                self.fields.insert(key, value);
            }
        }
    }
}

/// Transient elicitor output: the next thing to ask the user. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub questions: Vec<String>,
}

impl FollowUpQuestion {
    pub fn from_model_value(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some("FollowUpQuestion") {
            return None;
        }
        Some(Self {
            questions: string_list(value.get("questions")),
        })
    }

    pub fn first(&self) -> Option<&str> {
        self.questions.first().map(String::as_str)
    }
}

/// Transient generator output: what is still missing before the artifact can
/// be produced. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingInfoRequest {
    pub questions: Vec<String>,
}

impl MissingInfoRequest {
    pub fn from_model_value(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some("MissingInfoRequest") {
            return None;
        }
        Some(Self {
            questions: string_list(value.get("questions")),
        })
    }

    pub fn first(&self) -> Option<&str> {
        self.questions.first().map(String::as_str)
    }
}

/// One conversational turn, as kept in session history and appended to the
/// transcript store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TurnRecord {
    pub fn new(user_text: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_text: user_text.into(),
            reply: reply.into(),
            model: None,
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn brief_decodes_summary_or_description() {
        let tagged = json!({
            "type": "ProblemBrief",
            "summary": "CI pipeline flakes",
            "category": "reliability",
            "signals": ["flaky", "restart"]
        });
        let brief = ProblemBrief::from_model_value(&tagged).unwrap();
        assert_eq!(brief.summary, "CI pipeline flakes");
        assert_eq!(brief.category, ProblemCategory::Reliability);
        assert_eq!(brief.signals, vec!["flaky", "restart"]);

        let legacy = json!({ "type": "ProblemBrief", "description": "manual deploys" });
        let brief = ProblemBrief::from_model_value(&legacy).unwrap();
        assert_eq!(brief.summary, "manual deploys");
        assert_eq!(brief.category, ProblemCategory::Other);
    }

    #[test]
    fn brief_rejects_untagged_objects() {
        assert!(ProblemBrief::from_model_value(&json!({ "summary": "x" })).is_none());
        assert!(ProblemBrief::from_model_value(&json!({ "type": "DetailSpec" })).is_none());
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        let value = json!({ "type": "ProblemBrief", "summary": "x", "category": "weird" });
        let brief = ProblemBrief::from_model_value(&value).unwrap();
        assert_eq!(brief.category, ProblemCategory::Other);
    }

    #[test]
    fn spec_decodes_flat_and_nested_fields() {
        let flat = json!({ "type": "DetailSpec", "service": "ci", "schedule": "5m" });
        let spec = DetailSpec::from_model_value(&flat).unwrap();
        assert_eq!(spec.fields.len(), 2);
        assert_eq!(spec.fields["service"], json!("ci"));

        let nested = json!({ "type": "DetailSpec", "fields": { "action": "notify" } });
        let spec = DetailSpec::from_model_value(&nested).unwrap();
        assert_eq!(spec.fields["action"], json!("notify"));
    }

    #[test]
    fn spec_completeness_requires_concrete_values() {
        let mut spec = DetailSpec::default();
        assert!(!spec.is_complete());
        spec.fields.insert("service".into(), json!("ci"));
        assert!(spec.is_complete());
        spec.fields.insert("schedule".into(), Value::Null);
        assert!(!spec.is_complete());
        spec.fields.insert("schedule".into(), json!("  "));
        assert!(!spec.is_complete());
    }

    #[test]
    fn merge_keeps_gathered_answers() {
        let mut spec = DetailSpec::from_model_value(&json!({
            "type": "DetailSpec", "service": "ci", "schedule": "5m"
        }))
        .unwrap();
        let newer = DetailSpec::from_model_value(&json!({
            "type": "DetailSpec", "service": "ci-main", "schedule": null, "action": "alert"
        }))
        .unwrap();
        spec.merge_from(newer);
        assert_eq!(spec.fields["service"], json!("ci-main"));
        assert_eq!(spec.fields["schedule"], json!("5m"));
        assert_eq!(spec.fields["action"], json!("alert"));
    }

    #[test]
    fn question_envelopes_expose_first_question() {
        let follow_up = FollowUpQuestion::from_model_value(&json!({
            "type": "FollowUpQuestion",
            "questions": ["Which service?", "How often?"]
        }))
        .unwrap();
        assert_eq!(follow_up.first(), Some("Which service?"));

        let missing = MissingInfoRequest::from_model_value(&json!({
            "type": "MissingInfoRequest",
            "questions": []
        }))
        .unwrap();
        assert_eq!(missing.first(), None);
    }
}
