//! Domain Models
//!
//! The opportunity record plus the input shapes used to create, patch and
//! filter it. Every entry point (agent tools, HTTP handlers, storage
//! backends) goes through these types, so normalization and validation rules
//! live here and nowhere else.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalystError, Result};

/// Free-form supporting numbers/strings keyed by metric name
pub type Metrics = BTreeMap<String, Value>;

pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Kind of signal an opportunity represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OpportunityType {
    Buy,
    Sell,
    Hold,
    Watch,
}

impl OpportunityType {
    pub const ALL: [Self; 4] = [Self::Buy, Self::Sell, Self::Hold, Self::Watch];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
            Self::Watch => "watch",
        }
    }
}

impl FromStr for OpportunityType {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                AnalystError::validation(format!(
                    "unknown opportunity type '{wanted}' (expected buy, sell, hold or watch)"
                ))
            })
    }
}

impl TryFrom<String> for OpportunityType {
    type Error = AnalystError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory lifecycle state. Nothing in the store changes it on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OpportunityStatus {
    #[default]
    Active,
    Expired,
    Executed,
    Dismissed,
}

impl OpportunityStatus {
    pub const ALL: [Self; 4] = [Self::Active, Self::Expired, Self::Executed, Self::Dismissed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Executed => "executed",
            Self::Dismissed => "dismissed",
        }
    }
}

impl FromStr for OpportunityStatus {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                AnalystError::validation(format!(
                    "unknown status '{wanted}' (expected active, expired, executed or dismissed)"
                ))
            })
    }
}

impl TryFrom<String> for OpportunityStatus {
    type Error = AnalystError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded investment signal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Store-assigned, never reused
    pub id: String,

    pub title: String,

    /// Ticker or coin identifier (e.g. "bitcoin", "ETH")
    pub asset: String,

    #[serde(rename = "type")]
    pub kind: OpportunityType,

    /// 0-100 inclusive
    pub confidence: f64,

    pub rationale: String,

    /// Where the supporting data came from, in the order given
    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub metrics: Metrics,

    pub created_at: DateTime<Utc>,

    /// Equal to `created_at` until the first update; never moves backwards
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: OpportunityStatus,

    /// Set-like: unique, order of first appearance
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Opportunity {
    /// Check record-level constraints
    pub fn validate(&self) -> Result<()> {
        validate_confidence(self.confidence)?;
        if self.title.trim().is_empty() {
            return Err(AnalystError::validation("title must not be empty"));
        }
        if self.asset.trim().is_empty() {
            return Err(AnalystError::validation("asset must not be empty"));
        }
        Ok(())
    }

    /// True when at least one of `tags` is on this record
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

fn validate_confidence(confidence: f64) -> Result<()> {
    if confidence.is_finite() && (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
        Ok(())
    } else {
        Err(AnalystError::validation(format!(
            "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}, got {confidence}"
        )))
    }
}

/// Caller-supplied fields for a new opportunity (no id, no timestamps)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewOpportunity {
    pub title: String,

    pub asset: String,

    #[serde(rename = "type")]
    pub kind: OpportunityType,

    #[serde(deserialize_with = "de::confidence")]
    pub confidence: f64,

    pub rationale: String,

    #[serde(default, deserialize_with = "de::string_list")]
    pub sources: Vec<String>,

    #[serde(default, deserialize_with = "de::metrics")]
    pub metrics: Metrics,

    #[serde(default, deserialize_with = "de::string_list")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "de::optional_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Defaults to active
    #[serde(default)]
    pub status: Option<OpportunityStatus>,
}

impl NewOpportunity {
    pub fn new(
        title: impl Into<String>,
        asset: impl Into<String>,
        kind: OpportunityType,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            asset: asset.into(),
            kind,
            confidence,
            rationale: rationale.into(),
            sources: Vec::new(),
            metrics: Metrics::new(),
            tags: Vec::new(),
            expires_at: None,
            status: None,
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    pub const fn with_status(mut self, status: OpportunityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Normalize, stamp and validate into a full record
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> Result<Opportunity> {
        let record = Opportunity {
            id,
            title: self.title.trim().to_string(),
            asset: self.asset.trim().to_string(),
            kind: self.kind,
            confidence: self.confidence,
            rationale: self.rationale,
            sources: normalize_sources(self.sources),
            metrics: self.metrics,
            created_at,
            updated_at: created_at,
            expires_at: self.expires_at,
            status: self.status.unwrap_or_default(),
            tags: normalize_tags(self.tags),
        };
        record.validate()?;
        Ok(record)
    }
}

/// Partial update. `None` leaves a field alone; for `expires_at`,
/// `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpportunityPatch {
    pub title: Option<String>,
    pub asset: Option<String>,
    pub kind: Option<OpportunityType>,
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
    pub sources: Option<Vec<String>>,
    pub metrics: Option<Metrics>,
    pub tags: Option<Vec<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub status: Option<OpportunityStatus>,
}

impl OpportunityPatch {
    /// Build a patch from loosely typed fields (HTTP `updates`, tool arguments).
    ///
    /// Unknown keys and immutable keys (`id`, `created_at`, `updated_at`) are
    /// ignored. A recognized key with a value of the wrong shape is a
    /// validation error. `null` means "not supplied", except for `expires_at`
    /// where it clears the expiry.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut patch = Self::default();

        for (key, value) in fields {
            if value.is_null() {
                if key == "expires_at" {
                    patch.expires_at = Some(None);
                }
                continue;
            }

            match key.as_str() {
                "title" => patch.title = Some(fields::string(key, value)?),
                "asset" => patch.asset = Some(fields::string(key, value)?),
                "type" => patch.kind = Some(fields::string(key, value)?.parse()?),
                "confidence" => patch.confidence = Some(fields::number(key, value)?),
                "rationale" => patch.rationale = Some(fields::string(key, value)?),
                "sources" => patch.sources = Some(fields::string_list(key, value)?),
                "metrics" => patch.metrics = Some(fields::metrics(key, value)?),
                "tags" => patch.tags = Some(fields::string_list(key, value)?),
                "expires_at" => patch.expires_at = Some(Some(fields::timestamp(key, value)?)),
                "status" => patch.status = Some(fields::string(key, value)?.parse()?),
                other => tracing::trace!(field = other, "Ignoring unrecognized update field"),
            }
        }

        Ok(patch)
    }

    pub const fn with_status(mut self, status: OpportunityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// True when no recognized field was supplied
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Names of the supplied fields, in record order
    pub fn field_names(&self) -> Vec<&'static str> {
        let present = [
            ("title", self.title.is_some()),
            ("asset", self.asset.is_some()),
            ("type", self.kind.is_some()),
            ("confidence", self.confidence.is_some()),
            ("rationale", self.rationale.is_some()),
            ("sources", self.sources.is_some()),
            ("metrics", self.metrics.is_some()),
            ("tags", self.tags.is_some()),
            ("expires_at", self.expires_at.is_some()),
            ("status", self.status.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// Merge into `record` and validate the result. On error `record` is
    /// left untouched. Does not touch `updated_at`.
    pub fn apply_to(&self, record: &mut Opportunity) -> Result<()> {
        let mut merged = record.clone();

        if let Some(title) = &self.title {
            merged.title = title.trim().to_string();
        }
        if let Some(asset) = &self.asset {
            merged.asset = asset.trim().to_string();
        }
        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(confidence) = self.confidence {
            merged.confidence = confidence;
        }
        if let Some(rationale) = &self.rationale {
            merged.rationale.clone_from(rationale);
        }
        if let Some(sources) = &self.sources {
            merged.sources = normalize_sources(sources.clone());
        }
        if let Some(metrics) = &self.metrics {
            merged.metrics.clone_from(metrics);
        }
        if let Some(tags) = &self.tags {
            merged.tags = normalize_tags(tags.clone());
        }
        if let Some(expires_at) = self.expires_at {
            merged.expires_at = expires_at;
        }
        if let Some(status) = self.status {
            merged.status = status;
        }

        merged.validate()?;
        *record = merged;
        Ok(())
    }
}

/// Which records `list` returns
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpportunityFilter {
    /// Exact status match
    pub status: Option<OpportunityStatus>,

    /// Match if the record shares any of these tags; empty disables the check
    pub tags: Vec<String>,
}

impl OpportunityFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub const fn with_status(mut self, status: OpportunityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Build from raw query values: `status=active&tags=btc,eth`
    pub fn from_query(status: Option<&str>, tags: Option<&str>) -> Result<Self> {
        let status = match status.map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.parse()?),
            _ => None,
        };
        let tags = tags.map(split_list).unwrap_or_default();
        Ok(Self {
            status,
            tags: normalize_tags(tags),
        })
    }

    /// Build from tool arguments, where `tags` may be an array or a
    /// comma-separated string. Non-string tag items are rejected.
    pub fn from_arguments(status: Option<&str>, tags: Option<&Value>) -> Result<Self> {
        let filter = Self::from_query(status, None)?;
        match tags {
            None | Some(Value::Null) => Ok(filter),
            Some(value) => Ok(filter.with_tags(fields::string_list("tags", value)?)),
        }
    }

    pub fn matches(&self, record: &Opportunity) -> bool {
        self.status.is_none_or(|s| record.status == s)
            && (self.tags.is_empty() || record.has_any_tag(&self.tags))
    }
}

/// Current time at the precision every backend can store (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp for a mutation: now, but never earlier than `previous`
pub fn next_update_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous)
}

/// Canonical text form used for persistence
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse RFC 3339, or a zone-less ISO-8601 date/datetime taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(6));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc().trunc_subsecs(6));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(AnalystError::validation(format!(
        "'{raw}' is not an ISO-8601 timestamp"
    )))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn normalize_sources(sources: Vec<String>) -> Vec<String> {
    sources
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Shape checks for loosely typed JSON fields
mod fields {
    use super::{parse_timestamp, split_list, Metrics};
    use crate::error::{AnalystError, Result};
    use serde_json::Value;

    pub fn string(key: &str, value: &Value) -> Result<String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AnalystError::validation(format!("'{key}' must be a string")))
    }

    /// Numbers, or numeric strings (models often quote numbers)
    pub fn number(key: &str, value: &Value) -> Result<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| AnalystError::validation(format!("'{key}' must be a number")))
    }

    /// JSON array of strings, or one comma-separated string
    pub fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::String(s) => Ok(split_list(s)),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        AnalystError::validation(format!("'{key}' must contain only strings"))
                    })
                })
                .collect(),
            _ => Err(AnalystError::validation(format!(
                "'{key}' must be a list of strings"
            ))),
        }
    }

    pub fn metrics(key: &str, value: &Value) -> Result<Metrics> {
        value
            .as_object()
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .ok_or_else(|| AnalystError::validation(format!("'{key}' must be an object")))
    }

    pub fn timestamp(key: &str, value: &Value) -> Result<chrono::DateTime<chrono::Utc>> {
        parse_timestamp(&string(key, value)?)
    }
}

/// Serde adapters sharing the `fields` leniency
mod de {
    use super::{fields, Metrics};
    use chrono::{DateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn confidence<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(d)?;
        fields::number("confidence", &value).map_err(D::Error::custom)
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            value => fields::string_list("list", &value).map_err(D::Error::custom),
        }
    }

    pub fn metrics<'de, D: Deserializer<'de>>(d: D) -> Result<Metrics, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Metrics::new()),
            value => fields::metrics("metrics", &value).map_err(D::Error::custom),
        }
    }

    pub fn optional_timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            value => fields::timestamp("expires_at", &value)
                .map(Some)
                .map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Opportunity {
        NewOpportunity::new("BTC buy", "bitcoin", OpportunityType::Buy, 75.0, "Support at 60k")
            .with_tags(["btc", "accumulation"])
            .into_record("opp_test".into(), now())
            .unwrap()
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!(" BUY ".parse::<OpportunityType>().unwrap(), OpportunityType::Buy);
        assert_eq!(
            "Dismissed".parse::<OpportunityStatus>().unwrap(),
            OpportunityStatus::Dismissed
        );
        assert!("moon".parse::<OpportunityType>().unwrap_err().is_validation());
    }

    #[test]
    fn test_new_opportunity_accepts_loose_json() {
        let new: NewOpportunity = serde_json::from_value(json!({
            "title": "ETH watch",
            "asset": "ethereum",
            "type": "Watch",
            "confidence": "85",
            "rationale": "L2 growth",
            "tags": "eth, layer2, eth",
            "sources": ["santiment", "firecrawl"],
            "expires_at": "2030-01-01T00:00:00"
        }))
        .unwrap();

        let rec = new.into_record("opp_1".into(), now()).unwrap();
        assert_eq!(rec.kind, OpportunityType::Watch);
        assert!((rec.confidence - 85.0).abs() < f64::EPSILON);
        assert_eq!(rec.tags, ["eth", "layer2"]);
        assert_eq!(rec.sources, ["santiment", "firecrawl"]);
        assert_eq!(rec.status, OpportunityStatus::Active);
        assert_eq!(rec.created_at, rec.updated_at);
        assert!(rec.expires_at.is_some());
    }

    #[test]
    fn test_confidence_bounds() {
        let make = |c| {
            NewOpportunity::new("t", "a", OpportunityType::Hold, c, "r")
                .into_record("id".into(), now())
        };
        assert!(make(0.0).is_ok());
        assert!(make(100.0).is_ok());
        assert!(make(150.0).unwrap_err().is_validation());
        assert!(make(-0.5).unwrap_err().is_validation());
        assert!(make(f64::NAN).unwrap_err().is_validation());
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = NewOpportunity::new("   ", "btc", OpportunityType::Buy, 10.0, "r")
            .into_record("id".into(), now())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_patch_ignores_unknown_and_immutable_fields() {
        let fields = json!({"status": "executed", "colour": "red", "id": "hijack", "created_at": "2001-01-01"});
        let patch = OpportunityPatch::from_fields(fields.as_object().unwrap()).unwrap();

        assert_eq!(patch.field_names(), ["status"]);

        let mut rec = record();
        let before = rec.clone();
        patch.apply_to(&mut rec).unwrap();
        assert_eq!(rec.status, OpportunityStatus::Executed);
        assert_eq!(rec.id, before.id);
        assert_eq!(rec.created_at, before.created_at);
        assert_eq!(rec.title, before.title);
    }

    #[test]
    fn test_patch_rejects_wrong_shapes() {
        let bad = json!({"confidence": [1, 2]});
        assert!(OpportunityPatch::from_fields(bad.as_object().unwrap())
            .unwrap_err()
            .is_validation());

        let bad_status = json!({"status": "pending"});
        assert!(OpportunityPatch::from_fields(bad_status.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_empty_patch() {
        let fields = json!({"unknown": 1, "confidence": null});
        let patch = OpportunityPatch::from_fields(fields.as_object().unwrap()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_invalid_patch_leaves_record_untouched() {
        let mut rec = record();
        let before = rec.clone();
        let err = OpportunityPatch::default()
            .with_status(OpportunityStatus::Executed)
            .with_confidence(101.0)
            .apply_to(&mut rec)
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(rec, before);
    }

    #[test]
    fn test_expires_at_null_clears() {
        let mut rec = record();
        rec.expires_at = Some(now());

        let fields = json!({"expires_at": null});
        let patch = OpportunityPatch::from_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(patch.field_names(), ["expires_at"]);
        patch.apply_to(&mut rec).unwrap();
        assert!(rec.expires_at.is_none());
    }

    #[test]
    fn test_filter_matching() {
        let rec = record();
        assert!(OpportunityFilter::all().matches(&rec));
        assert!(OpportunityFilter::all().with_tags(["eth", "btc"]).matches(&rec));
        assert!(!OpportunityFilter::all().with_tags(["eth"]).matches(&rec));
        assert!(!OpportunityFilter::all()
            .with_status(OpportunityStatus::Dismissed)
            .matches(&rec));
    }

    #[test]
    fn test_filter_from_query() {
        let filter = OpportunityFilter::from_query(Some("active"), Some("btc, eth,,")).unwrap();
        assert_eq!(filter.status, Some(OpportunityStatus::Active));
        assert_eq!(filter.tags, ["btc", "eth"]);

        assert_eq!(OpportunityFilter::from_query(Some(""), None).unwrap(), OpportunityFilter::all());

        let from_args =
            OpportunityFilter::from_arguments(None, Some(&json!(["btc", " eth", "btc"]))).unwrap();
        assert_eq!(from_args.tags, vec!["btc", "eth"]);
        assert_eq!(
            OpportunityFilter::from_arguments(None, Some(&json!("btc,eth"))).unwrap().tags,
            vec!["btc", "eth"]
        );
        assert!(OpportunityFilter::from_arguments(None, Some(&json!([1]))).is_err());
        assert!(OpportunityFilter::from_arguments(None, Some(&json!(7))).is_err());
        assert!(OpportunityFilter::from_query(Some("bogus"), None).is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let with_zone = parse_timestamp("2025-03-01T12:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(&with_zone), "2025-03-01T10:00:00.000000Z");

        let naive = parse_timestamp("2025-03-01T12:00:00.5").unwrap();
        assert_eq!(format_timestamp(&naive), "2025-03-01T12:00:00.500000Z");

        assert!(parse_timestamp("2025-03-01").is_ok());
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn test_update_stamp_never_goes_backwards() {
        let future = now() + chrono::Duration::hours(1);
        assert_eq!(next_update_stamp(future), future);
    }
}
