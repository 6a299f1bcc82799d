//! History URI Resolution
//!
//! The only suspending stage. At most one existence probe is issued; any
//! probe failure simply leaves the history link out.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::RawConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::status::{SpecStatus, StatusInfo};
use crate::versions::VersionLink;

const RULE: &str = "history";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("HTTP error probing {url}: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Existence probe disabled")]
    Disabled,
}

/// Checks whether a URL resolves, without fetching its content.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Returns the final URL (after redirects) when the target exists.
    async fn probe(&self, url: &Url) -> Result<Url, ProbeError>;
}

/// HEAD request over `reqwest`; redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProbeError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ExistenceProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> Result<Url, ProbeError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|source| ProbeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.url().clone())
    }
}

/// Never reaches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProbe;

#[async_trait]
impl ExistenceProbe for OfflineProbe {
    async fn probe(&self, _url: &Url) -> Result<Url, ProbeError> {
        Err(ProbeError::Disabled)
    }
}

/// Statuses whose history link is accepted without probing.
fn skips_probe(status: &SpecStatus) -> bool {
    matches!(
        status,
        SpecStatus::Fpwd | SpecStatus::Dnote | SpecStatus::Note | SpecStatus::Dry
    )
}

pub async fn resolve_history(
    raw: &RawConfig,
    status: &StatusInfo,
    latest_version: &VersionLink,
    history_base: &Url,
    probe: &dyn ExistenceProbe,
    diags: &mut Diagnostics,
) -> VersionLink {
    let declared = match &raw.history_uri {
        Some(None) => VersionLink::Null,
        Some(Some(uri)) if !uri.is_empty() => VersionLink::Url(uri.clone()),
        _ => VersionLink::Absent,
    };

    let (Some(short_name), Some(_)) = (raw.short_name(), latest_version.as_url()) else {
        return declared;
    };
    if declared == VersionLink::Null {
        return declared;
    }

    let explicit = declared.as_url();
    let can_show_history = status.facets.is_ed || status.status.is_tr_status();
    if explicit.is_some() && !can_show_history {
        diags.push(
            Diagnostic::error(RULE, "The `historyURI` can't be used with non technical report documents.")
                .with_hint("Please remove `historyURI`.")
                .with_element("historyURI"),
        );
        return VersionLink::Null;
    }

    let target = match history_base.join(explicit.unwrap_or(short_name)) {
        Ok(target) => target,
        Err(e) => {
            diags.push(
                Diagnostic::error(RULE, format!("`historyURI` could not be resolved: {e}."))
                    .with_element("historyURI"),
            );
            return VersionLink::Absent;
        }
    };

    if explicit.is_some() || skips_probe(&status.status) {
        return VersionLink::Url(target.into());
    }

    match probe.probe(&target).await {
        Ok(found) => {
            tracing::debug!(history = %found, "history found");
            VersionLink::Url(found.into())
        }
        Err(e) => {
            tracing::debug!(url = %target, error = %e, "no history available");
            VersionLink::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::classify;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProbe {
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeProbe {
        fn answering(answer: Option<&'static str>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExistenceProbe for FakeProbe {
        async fn probe(&self, _url: &Url) -> Result<Url, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(found) => Ok(Url::parse(found).unwrap()),
                None => Err(ProbeError::Disabled),
            }
        }
    }

    fn base() -> Url {
        Url::parse("https://www.w3.org/standards/history/").unwrap()
    }

    fn latest() -> VersionLink {
        VersionLink::Url("https://www.w3.org/TR/s/".into())
    }

    async fn run(config: serde_json::Value, probe: &FakeProbe) -> (VersionLink, Diagnostics) {
        let raw: RawConfig = serde_json::from_value(config).unwrap();
        let status = classify(&SpecStatus::parse(raw.spec_status.as_deref().unwrap_or("")));
        let mut diags = Diagnostics::new();
        let link = resolve_history(&raw, &status, &latest(), &base(), probe, &mut diags).await;
        (link, diags)
    }

    #[tokio::test]
    async fn probe_success_adopts_reported_url() {
        let probe = FakeProbe::answering(Some("https://www.w3.org/standards/history/s/"));
        let (link, diags) = run(json!({ "specStatus": "WD", "shortName": "s" }), &probe).await;
        assert_eq!(link, VersionLink::Url("https://www.w3.org/standards/history/s/".into()));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn probe_failure_is_silent() {
        let probe = FakeProbe::answering(None);
        let (link, diags) = run(json!({ "specStatus": "REC", "shortName": "s" }), &probe).await;
        assert!(link.is_absent());
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn allow_listed_statuses_skip_the_probe() {
        let probe = FakeProbe::answering(None);
        let (link, _) = run(json!({ "specStatus": "FPWD", "shortName": "s" }), &probe).await;
        assert_eq!(link, VersionLink::Url("https://www.w3.org/standards/history/s".into()));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn explicit_history_is_accepted_for_tr_documents() {
        let probe = FakeProbe::answering(None);
        let (link, diags) = run(
            json!({ "specStatus": "CR", "shortName": "s", "historyURI": "https://example.org/h" }),
            &probe,
        )
        .await;
        assert_eq!(link, VersionLink::Url("https://example.org/h".into()));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn explicit_history_is_rejected_elsewhere() {
        let probe = FakeProbe::answering(None);
        let (link, diags) = run(
            json!({ "specStatus": "CG-DRAFT", "shortName": "s", "historyURI": "https://example.org/h" }),
            &probe,
        )
        .await;
        assert_eq!(link, VersionLink::Null);
        assert_eq!(diags.errors().count(), 1);
    }

    #[tokio::test]
    async fn null_history_short_circuits() {
        let probe = FakeProbe::answering(Some("https://www.w3.org/x"));
        let (link, _) = run(json!({ "specStatus": "WD", "shortName": "s", "historyURI": null }), &probe).await;
        assert_eq!(link, VersionLink::Null);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_short_name_is_a_no_op() {
        let probe = FakeProbe::answering(Some("https://www.w3.org/x"));
        let (link, _) = run(json!({ "specStatus": "WD" }), &probe).await;
        assert!(link.is_absent());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_probe_reports_disabled() {
        let url = Url::parse("https://www.w3.org/").unwrap();
        assert!(matches!(OfflineProbe.probe(&url).await, Err(ProbeError::Disabled)));
    }
}
