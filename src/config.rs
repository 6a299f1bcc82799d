//! Configuration - Raw Input, Engine Settings, Host Document
//!
//! `RawConfig` is the author-supplied object. Recognized options are typed;
//! everything else is kept in `extra` and handed through untouched.

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dates::NormalizedDate;
use crate::diagnostics::Diagnostic;

const RULE: &str = "config";

/// Single-valued text options; `null` means "not provided".
const TEXT_OPTIONS: [&str; 16] = [
    "specStatus",
    "shortName",
    "license",
    "previousMaturity",
    "thisVersion",
    "latestVersion",
    "prevVersion",
    "historyURI",
    "edDraftURI",
    "prevRecShortname",
    "prevRecURI",
    "group",
    "groupType",
    "wgPublicList",
    "errata",
    "implementationReportURI",
];

const GROUP_OPTIONS: [&str; 4] = ["wg", "wgURI", "wgPatentURI", "wgPatentPolicy"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration must be a JSON object")]
    NotAnObject,
}

/// Distinguishes an omitted key from an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Dates arrive as text or as epoch milliseconds. Anything else is kept
/// verbatim so it can be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Timestamp(i64),
    Text(String),
    Other(Value),
}

impl DateValue {
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ms) => write!(f, "{ms}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Options such as `wg` accept a single value or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }
}

/// Text or number, e.g. `copyrightStart` or `w3cid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// An editor, author or former editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, rename = "companyURL", skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w3cid: Option<Scalar>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub retired_date: Option<Option<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// The key alone marks retirement, whatever its value.
    pub fn is_retired(&self) -> bool {
        self.retired_date.is_some()
    }

    pub fn has_w3cid(&self) -> bool {
        self.w3cid.as_ref().map_or(false, Scalar::is_truthy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternateFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_publish_date: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_maturity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cr_end: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_end: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_end: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_rec_end: Option<DateValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub this_version: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_version: Option<String>,
    #[serde(default, rename = "historyURI", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub history_uri: Option<Option<String>>,
    #[serde(default, rename = "edDraftURI", skip_serializing_if = "Option::is_none")]
    pub ed_draft_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_rec_shortname: Option<String>,
    #[serde(default, rename = "prevRecURI", skip_serializing_if = "Option::is_none")]
    pub prev_rec_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wg: Option<OneOrMany<String>>,
    #[serde(default, rename = "wgURI", skip_serializing_if = "Option::is_none")]
    pub wg_uri: Option<OneOrMany<String>>,
    #[serde(default, rename = "wgPatentURI", skip_serializing_if = "Option::is_none")]
    pub wg_patent_uri: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wg_patent_policy: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wg_public_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errata: Option<String>,

    #[serde(default)]
    pub editors: Vec<Person>,
    #[serde(default)]
    pub former_editors: Vec<Person>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_formats: Option<Vec<AlternateFormat>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_start: Option<Scalar>,

    #[serde(default)]
    pub no_rec_track: bool,
    #[serde(default, rename = "implementationReportURI", skip_serializing_if = "Option::is_none")]
    pub implementation_report_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updateable_rec: Option<bool>,

    /// Options dropped while loading because their value had the wrong type.
    #[serde(skip)]
    pub issues: Vec<Diagnostic>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Only a document that is not an object is rejected. A mistyped option
    /// is dropped and recorded in `issues`; `null` falls back to the default.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(mut map) = value else {
            return Err(ConfigError::NotAnObject);
        };
        let mut issues = vec![];

        for key in TEXT_OPTIONS {
            accept::<Option<String>>(&mut map, key, &mut issues);
        }
        for key in GROUP_OPTIONS {
            accept::<Option<OneOrMany<String>>>(&mut map, key, &mut issues);
        }
        accept::<Option<Vec<AlternateFormat>>>(&mut map, "alternateFormats", &mut issues);
        accept::<Option<Scalar>>(&mut map, "copyrightStart", &mut issues);
        accept::<bool>(&mut map, "noRecTrack", &mut issues);
        accept::<Option<Vec<String>>>(&mut map, "revisionTypes", &mut issues);
        accept::<Option<bool>>(&mut map, "updateableRec", &mut issues);
        accept_people(&mut map, "editors", &mut issues);
        accept_people(&mut map, "formerEditors", &mut issues);

        let mut raw: Self = serde_json::from_value(Value::Object(map))?;
        raw.issues = issues;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn short_name(&self) -> Option<&str> {
        non_empty(&self.short_name)
    }

    pub fn has_github(&self) -> bool {
        match &self.github {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

fn unsupported(key: &str, value: &Value) -> Diagnostic {
    Diagnostic::error(RULE, format!("`{key}` has an unsupported value: {value}. It is ignored."))
        .with_element(key)
}

/// Keeps `key` only if it deserializes as `T`.
fn accept<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str, issues: &mut Vec<Diagnostic>) {
    let fits = match map.get(key) {
        None => return,
        Some(value) => T::deserialize(value).is_ok(),
    };
    if fits {
        return;
    }
    if let Some(value) = map.remove(key) {
        if !value.is_null() {
            issues.push(unsupported(key, &value));
        }
    }
}

/// Drops malformed entries one by one rather than the whole list.
fn accept_people(map: &mut Map<String, Value>, key: &str, issues: &mut Vec<Diagnostic>) {
    let items = match map.remove(key) {
        None | Some(Value::Null) => return,
        Some(Value::Array(items)) => items,
        Some(other) => {
            issues.push(unsupported(key, &other));
            return;
        }
    };
    let mut people = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if Person::deserialize(&item).is_ok() {
            people.push(item);
        } else {
            issues.push(unsupported(&format!("{key}[{i}]"), &item));
        }
    }
    map.insert(key.to_string(), Value::Array(people));
}

/// Empty strings count as "not provided".
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub const DEFAULT_PUBLISHER_ORIGIN: &str = "https://www.w3.org/";
pub const DEFAULT_HISTORY_BASE: &str = "https://www.w3.org/standards/history/";

/// Engine-level knobs, independent of any one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(default = "default_publisher_origin")]
    pub publisher_origin: String,
    #[serde(default = "default_history_base")]
    pub history_base: String,
    /// The probe has no timeout unless one is configured.
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
}

fn default_publisher_origin() -> String { DEFAULT_PUBLISHER_ORIGIN.to_string() }
fn default_history_base() -> String { DEFAULT_HISTORY_BASE.to_string() }

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            publisher_origin: default_publisher_origin(),
            history_base: default_history_base(),
            probe_timeout_secs: None,
        }
    }
}

/// Facts about the host document the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContext {
    pub today: NormalizedDate,
    #[serde(default)]
    pub last_modified: Option<NormalizedDate>,
    /// The status section carries the updateable-rec marker.
    #[serde(default)]
    pub sotd_updateable_rec: bool,
}

impl DocumentContext {
    pub fn now() -> Self {
        Self::on(Utc::now().date_naive())
    }

    pub fn on(today: NaiveDate) -> Self {
        Self {
            today: NormalizedDate::from(today),
            last_modified: None,
            sotd_updateable_rec: false,
        }
    }

    pub fn with_last_modified(mut self, date: NaiveDate) -> Self {
        self.last_modified = Some(NormalizedDate::from(date));
        self
    }
}
