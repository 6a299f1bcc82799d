//! Version URL Synthesis
//!
//! Derives "this", "latest" and "previous" version URLs from the publication
//! track, the short name and the normalized dates. Relative paths resolve
//! against the publisher origin.

use serde::{Serialize, Serializer};
use url::Url;

use crate::config::{non_empty, RawConfig};
use crate::dates::ResolvedDates;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::status::{SpecStatus, StatusInfo};

const RULE: &str = "versions";

/// One URL slot. Absence and emptiness carry different meanings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionLink {
    /// Not applicable to this track.
    #[default]
    Absent,
    /// Explicitly declared as nonexistent by the author.
    Null,
    /// Known not to exist.
    Empty,
    Url(String),
}

impl VersionLink {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(u) => Some(u),
            _ => None,
        }
    }

    fn from_override(value: &Option<String>) -> Self {
        non_empty(value).map_or(Self::Absent, |v| Self::Url(v.to_string()))
    }
}

impl Serialize for VersionLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Empty => serializer.serialize_str(""),
            Self::Url(u) => serializer.serialize_str(u),
        }
    }
}

/// Output of the version stage; `history_uri` is filled by the history stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionUrls {
    #[serde(rename = "thisVersion", skip_serializing_if = "VersionLink::is_absent")]
    pub this_version: VersionLink,
    #[serde(rename = "latestVersion", skip_serializing_if = "VersionLink::is_absent")]
    pub latest_version: VersionLink,
    #[serde(rename = "prevVersion", skip_serializing_if = "VersionLink::is_absent")]
    pub prev_version: VersionLink,
    #[serde(rename = "prevRecURI", skip_serializing_if = "VersionLink::is_absent")]
    pub prev_rec_uri: VersionLink,
    #[serde(rename = "historyURI", skip_serializing_if = "VersionLink::is_absent")]
    pub history_uri: VersionLink,
}

/// Path prefix under which the document's dated versions live.
pub fn publication_space(status: &StatusInfo, raw: &RawConfig) -> Option<String> {
    if status.facets.is_rec_track || raw.group_type.as_deref() == Some("wg") {
        return Some("/TR".to_string());
    }
    match status.status {
        SpecStatus::CgFinal | SpecStatus::BgFinal => {
            non_empty(&raw.group).map(|group| format!("/community/reports/{group}"))
        }
        SpecStatus::Finding | SpecStatus::DraftFinding => Some("/2001/tag/doc".to_string()),
        SpecStatus::MemberSubm => Some("/Submission".to_string()),
        _ => None,
    }
}

/// Same scheme and host as the publisher, with or without `www.`.
pub(crate) fn same_publisher(origin: &Url, candidate: &Url) -> bool {
    fn bare(host: Option<&str>) -> Option<&str> {
        host.map(|h| h.strip_prefix("www.").unwrap_or(h))
    }
    origin.scheme() == candidate.scheme() && bare(origin.host_str()) == bare(candidate.host_str())
}

fn in_report_space(origin: &Url, href: &str) -> bool {
    Url::parse(href).map_or(false, |u| same_publisher(origin, &u) && u.path().starts_with("/TR/"))
}

fn link(origin: &Url, href: &str, field: &str, diags: &mut Diagnostics) -> VersionLink {
    match origin.join(href) {
        Ok(url) => VersionLink::Url(url.into()),
        Err(e) => {
            diags.push(
                Diagnostic::error(RULE, format!("`{field}` is not a valid URL: \"{href}\" ({e})."))
                    .with_element(field),
            );
            VersionLink::Absent
        }
    }
}

pub fn resolve_versions(
    raw: &RawConfig,
    status: &StatusInfo,
    dates: &ResolvedDates,
    origin: &Url,
    diags: &mut Diagnostics,
) -> VersionUrls {
    let facets = &status.facets;
    let short_name = raw.short_name();
    let space = publication_space(status, raw);
    let space_path = space.as_deref().unwrap_or_default();

    let mut this_version = VersionLink::from_override(&raw.this_version);
    if let (Some(space), Some(short), true) = (&space, short_name, this_version.is_absent()) {
        let dated_by_year = status.status.is_tr_status() || status.status == SpecStatus::MemberSubm;
        let year = if dated_by_year {
            format!("{}/", dates.publish_date.year())
        } else {
            String::new()
        };
        let href = format!(
            "{space}/{year}{}-{short}-{}/",
            status.status.maturity_alias(),
            dates.publish_date.compact()
        );
        this_version = link(origin, &href, "thisVersion", diags);
    }

    if facets.is_ed {
        this_version = VersionLink::from_override(&raw.ed_draft_uri);
        if this_version.is_absent() {
            diags.push(
                Diagnostic::warning(RULE, "Editor's Drafts should set the `edDraftURI` configuration option.")
                    .with_hint("Please set `edDraftURI` to the URL of the Editor's Draft.")
                    .with_element("edDraftURI"),
            );
        }
    }

    let latest_version = match &raw.latest_version {
        Some(None) => VersionLink::Null,
        Some(Some(explicit)) if !explicit.is_empty() => link(origin, explicit, "latestVersion", diags),
        _ => match short_name {
            Some(short) => link(origin, &format!("{space_path}/{short}/"), "latestVersion", diags),
            None => VersionLink::Absent,
        },
    };

    if let Some(latest) = latest_version.as_url() {
        let eligible = facets.is_ed || status.status.is_tr_status();
        if in_report_space(origin, latest) && !eligible {
            diags.push(
                Diagnostic::error(
                    RULE,
                    format!(
                        "Documents with a status of `\"{}\"` can't be published in the technical report space (/TR/).",
                        status.status
                    ),
                )
                .with_hint("Ask for a URL where the report can be published and change `latestVersion` to it.")
                .with_element("latestVersion"),
            );
        }
    }

    let mut prev_version = VersionLink::from_override(&raw.prev_version);
    if let Some(previous) = dates.previous_publish_date {
        let previous_maturity = non_empty(&raw.previous_maturity);
        if previous_maturity.is_none() && !facets.is_tag_finding {
            diags.push(
                Diagnostic::error(RULE, "`previousPublishDate` is set, but missing `previousMaturity`.")
                    .with_element("previousMaturity"),
            );
        }

        if facets.is_tag_finding && latest_version.as_url().is_some() {
            if let Some(short) = short_name {
                let latest_path = format!("{space_path}/{short}");
                let current = format!("{latest_path}-{}", dates.publish_date);
                this_version = link(origin, &current, "thisVersion", diags);
                let prior = format!("{latest_path}-{previous}");
                prev_version = link(origin, &prior, "prevVersion", diags);
            }
        } else if facets.is_cgbg || facets.is_basic {
            if prev_version.is_absent() {
                prev_version = VersionLink::Empty;
            }
        } else if let (Some(maturity), Some(short)) = (previous_maturity, short_name) {
            let alias = SpecStatus::parse(maturity).maturity_alias().to_string();
            let href = format!(
                "{space_path}/{}/{alias}-{short}-{}/",
                previous.year(),
                previous.compact()
            );
            prev_version = link(origin, &href, "prevVersion", diags);
        }
    }

    let prev_rec_uri = match (non_empty(&raw.prev_rec_uri), non_empty(&raw.prev_rec_shortname)) {
        (Some(uri), _) => VersionLink::Url(uri.to_string()),
        (None, Some(name)) => link(origin, &format!("{space_path}/{name}"), "prevRecURI", diags),
        (None, None) => VersionLink::Absent,
    };

    VersionUrls {
        this_version,
        latest_version,
        prev_version,
        prev_rec_uri,
        history_uri: VersionLink::Absent,
    }
}

/// Applied once history is known: editor-draft findings publish no dated links.
pub fn finalize(mut urls: VersionUrls, status: &StatusInfo) -> VersionUrls {
    if status.facets.is_tag_editor_finding {
        urls.this_version = VersionLink::Absent;
        urls.latest_version = VersionLink::Absent;
    }
    urls
}
