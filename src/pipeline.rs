//! Resolution Pipeline - Single Entry Point
//!
//! CRITICAL: every stage runs on every call, in a fixed order. Diagnostics
//! never abort a run; only infrastructure setup can fail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{non_empty, ConfigError, DocumentContext, EngineSettings, OneOrMany, RawConfig};
use crate::dates::{resolve_dates, NormalizedDate, ResolvedDates};
use crate::diagnostics::Diagnostics;
use crate::editors::{resolve_editors, EditorRoster};
use crate::hashing::input_digest;
use crate::history::{resolve_history, ExistenceProbe, HttpProbe, OfflineProbe, ProbeError};
use crate::license::{resolve_license, LicenseDescriptor};
use crate::rules::{is_updateable_rec, resolve_patent_policy, RuleInput, RuleSet};
use crate::status::{classify, PublicationTrack, ResolvedFacets, SpecStatus};
use crate::versions::{finalize, resolve_versions, VersionUrls};
use crate::ENGINE_VERSION;

/// Keys the version stage owns; author values never leak past it.
const VERSION_KEYS: [&str; 5] = ["thisVersion", "latestVersion", "prevVersion", "prevRecURI", "historyURI"];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid {name} \"{value}\": {source}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        source: url::ParseError,
    },

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Every derived field, keyed as it appears in the enriched configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub spec_status: SpecStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub track: PublicationTrack,
    #[serde(flatten)]
    pub facets: ResolvedFacets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_status: Option<&'static str>,
    #[serde(rename = "prependW3C")]
    pub prepend_w3c: bool,
    pub license_info: LicenseDescriptor,
    #[serde(flatten)]
    pub dates: ResolvedDates,
    #[serde(flatten)]
    pub versions: VersionUrls,
    pub show_previous_version: bool,
    #[serde(flatten)]
    pub roster: EditorRoster,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wg_patent_policy: Option<String>,
    #[serde(rename = "multipleWGs")]
    pub multiple_wgs: bool,
    pub multiple_alternates: bool,
    pub updateable_rec: bool,
}

/// Outcome of one run: the input, what was derived, and what went wrong.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub raw: RawConfig,
    pub config: ResolvedConfig,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub engine_version: String,
    /// SHA-256 of the canonical input
    pub input_digest: String,
    pub valid: bool,
    pub config: Map<String, Value>,
    pub diagnostics: Diagnostics,
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// The author's options, unknown ones included, overlaid with every
    /// derived field.
    pub fn enriched(&self) -> Result<Map<String, Value>, PipelineError> {
        let mut out = match serde_json::to_value(&self.raw)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for key in VERSION_KEYS {
            out.remove(key);
        }
        if let Value::Object(derived) = serde_json::to_value(&self.config)? {
            out.extend(derived);
        }
        Ok(out)
    }

    pub fn report(&self) -> Result<ResolutionReport, PipelineError> {
        Ok(ResolutionReport {
            engine_version: ENGINE_VERSION.to_string(),
            input_digest: input_digest(&self.raw)?,
            valid: self.is_valid(),
            config: self.enriched()?,
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// The resolution pipeline - single entry point for header metadata
pub struct ResolutionPipeline {
    origin: Url,
    history_base: Url,
    probe: Arc<dyn ExistenceProbe>,
    rules: RuleSet,
}

impl ResolutionPipeline {
    pub fn new(settings: &EngineSettings, probe: Arc<dyn ExistenceProbe>) -> Result<Self, PipelineError> {
        Ok(Self {
            origin: parse_setting("publisherOrigin", &settings.publisher_origin)?,
            history_base: parse_setting("historyBase", &settings.history_base)?,
            probe,
            rules: RuleSet::new(),
        })
    }

    /// Probes history over HTTP, honoring `probeTimeoutSecs`.
    pub fn with_http_probe(settings: &EngineSettings) -> Result<Self, PipelineError> {
        let timeout = settings.probe_timeout_secs.map(Duration::from_secs);
        let probe = HttpProbe::new(timeout)?;
        Self::new(settings, Arc::new(probe))
    }

    pub fn offline(settings: &EngineSettings) -> Result<Self, PipelineError> {
        Self::new(settings, Arc::new(OfflineProbe))
    }

    pub fn publisher_origin(&self) -> &Url {
        &self.origin
    }

    /// Loads a configuration file; its modification day stands in for the
    /// host's last-modified date unless the context already has one.
    pub async fn resolve_file(&self, path: &Path, context: &DocumentContext) -> Result<Resolution, PipelineError> {
        let raw = RawConfig::from_path(path)?;
        let mut context = context.clone();
        if context.last_modified.is_none() {
            context.last_modified = file_modified(path).map(NormalizedDate::from);
        }
        Ok(self.resolve(&raw, &context).await)
    }

    pub async fn resolve_json(&self, json: &str, context: &DocumentContext) -> Result<Resolution, PipelineError> {
        let raw = RawConfig::from_json_str(json)?;
        Ok(self.resolve(&raw, context).await)
    }

    /// Runs every stage. Always produces a complete configuration.
    pub async fn resolve(&self, raw: &RawConfig, context: &DocumentContext) -> Resolution {
        let mut diags = Diagnostics::new();
        for issue in &raw.issues {
            diags.push(issue.clone());
        }

        tracing::debug!(stage = "status", "resolving");
        let status = classify(&SpecStatus::parse(raw.spec_status.as_deref().unwrap_or_default()));

        tracing::debug!(stage = "license", "resolving");
        let license_info = resolve_license(non_empty(&raw.license), &status, &mut diags);

        tracing::debug!(stage = "dates", "resolving");
        let dates = resolve_dates(raw, context, &mut diags);

        tracing::debug!(stage = "versions", "resolving");
        let mut versions = resolve_versions(raw, &status, &dates, &self.origin, &mut diags);

        tracing::debug!(stage = "history", "resolving");
        versions.history_uri = resolve_history(
            raw,
            &status,
            &versions.latest_version,
            &self.history_base,
            self.probe.as_ref(),
            &mut diags,
        )
        .await;
        let versions = finalize(versions, &status);

        tracing::debug!(stage = "editors", "resolving");
        let roster = resolve_editors(&raw.editors, &raw.former_editors, &status, &mut diags);

        tracing::debug!(stage = "rules", "resolving");
        let input = RuleInput {
            raw,
            status: &status,
            context,
            origin: &self.origin,
        };
        self.rules.check(&input, &mut diags);

        let config = ResolvedConfig {
            spec_status: status.status.clone(),
            short_name: raw.short_name().map(str::to_string),
            track: status.track,
            facets: status.facets,
            text_status: status.text,
            long_status: status.long_text,
            prepend_w3c: status.prepend_w3c(),
            license_info,
            show_previous_version: status.facets.is_tag_finding && dates.previous_publish_date.is_some(),
            dates,
            versions,
            roster,
            wg_patent_policy: resolve_patent_policy(raw),
            multiple_wgs: matches!(&raw.wg, Some(OneOrMany::Many(groups)) if groups.len() > 1),
            multiple_alternates: raw.alternate_formats.as_ref().map_or(false, |alts| alts.len() > 1),
            updateable_rec: is_updateable_rec(raw, context),
        };

        tracing::info!(
            status = %config.spec_status,
            errors = diags.errors().count(),
            warnings = diags.warnings().count(),
            "resolution complete"
        );

        Resolution {
            raw: raw.clone(),
            config,
            diagnostics: diags,
        }
    }
}

fn file_modified(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).date_naive())
}

/// Base URLs are treated as directories so joins append.
fn parse_setting(name: &'static str, value: &str) -> Result<Url, PipelineError> {
    let mut url = Url::parse(value).map_err(|source| PipelineError::InvalidSetting {
        name,
        value: value.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> DocumentContext {
        DocumentContext::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    async fn resolve(config: Value) -> Resolution {
        let raw = RawConfig::from_value(config).unwrap();
        let pipeline = ResolutionPipeline::offline(&EngineSettings::default()).unwrap();
        pipeline.resolve(&raw, &context()).await
    }

    #[test]
    fn settings_must_be_urls() {
        let settings = EngineSettings {
            publisher_origin: "not a url".into(),
            ..EngineSettings::default()
        };
        let err = ResolutionPipeline::offline(&settings).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidSetting { name: "publisherOrigin", .. }));
    }

    #[test]
    fn history_base_gains_trailing_slash() {
        let url = parse_setting("historyBase", "https://example.org/history").unwrap();
        assert_eq!(url.as_str(), "https://example.org/history/");
    }

    #[tokio::test]
    async fn enriched_keeps_unknown_options_and_overlays_derived() {
        let resolution = resolve(json!({
            "specStatus": "WD",
            "shortName": "s",
            "github": "w3c/s",
            "publishDate": "2024-03-15",
            "localBiblio": { "X": {} },
            "editors": [{ "name": "Ada", "w3cid": 1 }],
        }))
        .await;
        assert!(resolution.is_valid(), "{:?}", resolution.diagnostics);

        let enriched = resolution.enriched().unwrap();
        assert_eq!(enriched["localBiblio"], json!({ "X": {} }));
        assert_eq!(enriched["publishDate"], json!("2024-03-15"));
        assert_eq!(enriched["isRecTrack"], json!(true));
        assert_eq!(enriched["track"], json!("recommendation"));
        assert_eq!(enriched["prependW3C"], json!(true));
        assert_eq!(enriched["multipleWGs"], json!(false));
        assert_eq!(
            enriched["thisVersion"],
            json!("https://www.w3.org/TR/2024/WD-s-20240315/")
        );
        assert!(!enriched.contains_key("historyURI"));
    }

    #[tokio::test]
    async fn author_version_keys_do_not_survive_unresolved() {
        let resolution = resolve(json!({
            "specStatus": "unofficial",
            "shortName": "s",
            "prevVersion": "",
            "editors": [{ "name": "Ada" }],
        }))
        .await;
        let enriched = resolution.enriched().unwrap();
        assert!(!enriched.contains_key("prevVersion"));
    }

    #[tokio::test]
    async fn report_carries_digest_and_validity() {
        let resolution = resolve(json!({ "specStatus": "ED", "shortName": "s" })).await;
        let report = resolution.report().unwrap();

        assert!(!report.valid);
        assert_eq!(report.engine_version, ENGINE_VERSION);
        assert_eq!(report.input_digest.len(), 64);
        assert!(report.diagnostics.iter().any(|d| d.rule == "editors"));

        let again = resolve(json!({ "shortName": "s", "specStatus": "ED" })).await;
        assert_eq!(again.report().unwrap().input_digest, report.input_digest);
    }

    #[tokio::test]
    async fn load_issues_become_diagnostics() {
        let resolution = resolve(json!({
            "specStatus": "WD",
            "shortName": "s",
            "github": "w3c/s",
            "editors": [{ "name": "Ada", "w3cid": 1 }],
            "noRecTrack": "no",
        }))
        .await;
        let errors: Vec<_> = resolution.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "config");
        assert_eq!(errors[0].elements, ["noRecTrack"]);
        assert_eq!(resolution.enriched().unwrap()["noRecTrack"], json!(false));
    }

    #[tokio::test]
    async fn unreadable_inputs_are_config_errors() {
        let pipeline = ResolutionPipeline::offline(&EngineSettings::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let missing = pipeline.resolve_file(&dir.path().join("nope.json"), &context()).await;
        assert!(matches!(missing, Err(PipelineError::Config(ConfigError::Io { .. }))));

        let listed = pipeline.resolve_json("[]", &context()).await;
        assert!(matches!(listed, Err(PipelineError::Config(ConfigError::NotAnObject))));
    }

    #[tokio::test]
    async fn file_modification_day_is_the_default_publish_date() {
        let pipeline = ResolutionPipeline::offline(&EngineSettings::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "specStatus": "ED", "shortName": "s" }"#).unwrap();
        let expected = file_modified(&path).unwrap();

        let resolution = pipeline.resolve_file(&path, &context()).await.unwrap();
        assert_eq!(resolution.config.dates.publish_date, NormalizedDate::from(expected));

        let pinned = context().with_last_modified(NaiveDate::from_ymd_opt(2020, 2, 2).unwrap());
        let resolution = pipeline.resolve_file(&path, &pinned).await.unwrap();
        assert_eq!(resolution.config.dates.publish_date.to_string(), "2020-02-02");
    }

    #[tokio::test]
    async fn multiple_groups_resolve_policy_and_flag() {
        let resolution = resolve(json!({
            "specStatus": "ED",
            "shortName": "s",
            "editors": [{ "name": "Ada" }],
            "wg": ["A WG", "B WG"],
            "wgURI": ["https://example.org/a", "https://example.org/b"],
            "wgPatentURI": ["https://example.org/pa", "https://example.org/pb"],
            "wgPatentPolicy": ["PP2020", "PP2020"],
        }))
        .await;
        assert!(resolution.is_valid(), "{:?}", resolution.diagnostics);
        assert!(resolution.config.multiple_wgs);
        assert_eq!(resolution.config.wg_patent_policy.as_deref(), Some("PP2020"));
    }
}
