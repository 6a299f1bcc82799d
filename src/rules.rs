//! Process Rules - Cross-Field Requirements
//!
//! Rules produce structured diagnostics.
//! The rule set runs them all; none of them stops the others.

use url::Url;

use crate::config::{non_empty, DateValue, DocumentContext, OneOrMany, RawConfig};
use crate::diagnostics::{join_or, Diagnostic, Diagnostics};
use crate::status::StatusInfo;
use crate::versions::same_publisher;

pub const PATENT_POLICIES: [&str; 2] = ["PP2017", "PP2020"];
pub const REVISION_TYPES: [&str; 2] = ["addition", "correction"];

/// Everything a rule may look at.
pub struct RuleInput<'a> {
    pub raw: &'a RawConfig,
    pub status: &'a StatusInfo,
    pub context: &'a DocumentContext,
    pub origin: &'a Url,
}

/// Config rule trait - produces diagnostics
pub trait ConfigRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic>;
}

fn given(value: &Option<DateValue>) -> bool {
    value.as_ref().map_or(false, |v| !v.is_blank())
}

fn given_group(value: &Option<OneOrMany<String>>) -> bool {
    match value {
        None => false,
        Some(OneOrMany::One(s)) => !s.is_empty(),
        Some(OneOrMany::Many(_)) => true,
    }
}

/// The deprecated option or the status-section marker.
pub fn is_updateable_rec(raw: &RawConfig, context: &DocumentContext) -> bool {
    context.sotd_updateable_rec || raw.updateable_rec == Some(true)
}

/// Distinct policies in declaration order; the first one wins.
pub fn resolve_patent_policy(raw: &RawConfig) -> Option<String> {
    distinct_policies(raw).into_iter().next()
}

fn distinct_policies(raw: &RawConfig) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    if let Some(policies) = &raw.wg_patent_policy {
        for policy in policies.as_slice() {
            if !out.contains(policy) {
                out.push(policy.clone());
            }
        }
    }
    out
}

// --- Concrete Rules ---

pub struct SpecStatusRule;

impl ConfigRule for SpecStatusRule {
    fn name(&self) -> &'static str { "spec_status" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if non_empty(&input.raw.spec_status).is_some() {
            return vec![];
        }
        vec![Diagnostic::error(self.name(), "The `specStatus` configuration option is required.")
            .with_hint("Set `specStatus` to the document's maturity, e.g. `\"ED\"` or `\"WD\"`.")]
    }
}

pub struct ShortNameRule;

impl ConfigRule for ShortNameRule {
    fn name(&self) -> &'static str { "short_name" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if !input.status.facets.is_regular || input.raw.short_name().is_some() {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            "The `shortName` configuration option is required for this kind of document.",
        )
        .with_hint("Please set `shortName` to a short name for the specification.")]
    }
}

pub struct PublicFeedbackRule;

impl ConfigRule for PublicFeedbackRule {
    fn name(&self) -> &'static str { "public_feedback" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let raw = input.raw;
        if !input.status.facets.is_rec_track || raw.has_github() || non_empty(&raw.wg_public_list).is_some() {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            "The process requires either a link to a public repository or a mailing list.",
        )
        .with_hint("Use the `github` option to link a repository, or `wgPublicList` for a mailing list.")]
    }
}

pub struct ErrataRule;

impl ConfigRule for ErrataRule {
    fn name(&self) -> &'static str { "errata" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if !input.status.facets.is_rec || non_empty(&input.raw.errata).is_some() {
            return vec![];
        }
        vec![Diagnostic::error(self.name(), "Recommendations must have an errata link.")
            .with_hint("Add an `errata` URL to the configuration.")]
    }
}

pub struct AlternateFormatsRule;

impl ConfigRule for AlternateFormatsRule {
    fn name(&self) -> &'static str { "alternate_formats" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let incomplete = input.raw.alternate_formats.iter().flatten().any(|alt| {
            non_empty(&alt.uri).is_none() || non_empty(&alt.label).is_none()
        });
        if !incomplete {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            "Every `alternateFormats` entry must have a `uri` and a `label`.",
        )]
    }
}

pub struct ReviewWindowRule;

impl ConfigRule for ReviewWindowRule {
    fn name(&self) -> &'static str { "review_window" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let (raw, facets) = (input.raw, &input.status.facets);
        let mut out = vec![];

        if facets.is_pr && !given(&raw.cr_end) {
            out.push(Diagnostic::error(
                self.name(),
                "`specStatus` is \"PR\" but no `crEnd` is specified (needed to indicate end of previous CR).",
            ));
        }
        if facets.is_cr && !given(&raw.cr_end) {
            out.push(Diagnostic::error(
                self.name(),
                format!("`specStatus` is \"{}\", but no `crEnd` is specified.", input.status.status),
            ));
        }
        // Enforced for every PR, even though older header tooling never fired this check.
        if facets.is_pr && !given(&raw.pr_end) {
            out.push(Diagnostic::error(self.name(), "`specStatus` is \"PR\" but no `prEnd` is specified."));
        }
        if facets.is_per && !given(&raw.per_end) {
            out.push(Diagnostic::error(self.name(), "`specStatus` is \"PER\", but no `perEnd` is specified."));
        }
        out
    }
}

pub struct RevisionRule;

impl ConfigRule for RevisionRule {
    fn name(&self) -> &'static str { "revisions" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let raw = input.raw;
        let updateable = is_updateable_rec(raw, input.context);
        let mut out = vec![];

        if raw.updateable_rec.is_some() {
            out.push(
                Diagnostic::warning(self.name(), "Configuration option `updateableRec` is deprecated.")
                    .with_hint("Mark the Status of This Document section as updateable instead."),
            );
        }

        let revisions = raw.revision_types.as_deref().unwrap_or_default();
        if !input.status.facets.is_rec || revisions.is_empty() {
            return out;
        }

        let unknown: Vec<&String> = revisions
            .iter()
            .filter(|r| !REVISION_TYPES.contains(&r.as_str()))
            .collect();
        if !unknown.is_empty() {
            out.push(
                Diagnostic::error(
                    self.name(),
                    format!("`specStatus` is \"REC\" with unknown `revisionTypes`: {}.", join_or(&unknown)),
                )
                .with_hint(format!("The valid values for `revisionTypes` are: {}.", join_or(&REVISION_TYPES))),
            );
        }
        if revisions.iter().any(|r| r == "addition") && !updateable {
            out.push(Diagnostic::error(
                self.name(),
                "`specStatus` is \"REC\" with proposed additions but the Recommendation is not marked as allowing new features.",
            ));
        }
        if updateable && !given(&raw.revised_rec_end) {
            out.push(Diagnostic::error(
                self.name(),
                "`specStatus` is \"REC\" with proposed corrections or additions but no `revisedRecEnd` is specified.",
            ));
        }
        out
    }
}

pub struct NoRecTrackRule;

impl ConfigRule for NoRecTrackRule {
    fn name(&self) -> &'static str { "no_rec_track" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if !input.raw.no_rec_track || !input.status.facets.is_rec_track {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            format!(
                "Document configured as `noRecTrack`, but its status (\"{}\") puts it on the Recommendation track.",
                input.status.status
            ),
        )]
    }
}

pub struct ImplementationReportRule;

impl ConfigRule for ImplementationReportRule {
    fn name(&self) -> &'static str { "implementation_report" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if non_empty(&input.raw.implementation_report_uri).is_some() {
            return vec![];
        }
        let facets = &input.status.facets;
        if facets.is_cr {
            vec![Diagnostic::error(self.name(), "Missing `implementationReportURI` configuration option.")
                .with_hint("CR documents must link to a report describing implementation experience.")]
        } else if facets.is_pr {
            vec![Diagnostic::warning(
                self.name(),
                "PR documents should include an `implementationReportURI` describing implementation experience.",
            )]
        } else {
            vec![]
        }
    }
}

pub struct PatentPolicyRule;

impl ConfigRule for PatentPolicyRule {
    fn name(&self) -> &'static str { "patent_policy" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        if input.raw.wg_patent_policy.is_none() {
            return vec![];
        }
        let policies = distinct_policies(input.raw);
        let mut out = vec![];

        let invalid: Vec<&String> = policies
            .iter()
            .filter(|p| !PATENT_POLICIES.contains(&p.as_str()))
            .collect();
        if !invalid.is_empty() {
            let listed: Vec<String> = invalid.iter().map(|p| format!("`{p}`")).collect();
            out.push(
                Diagnostic::error(self.name(), format!("Invalid `wgPatentPolicy` value(s): {}.", listed.join(", ")))
                    .with_hint(format!("Please use one of: {}.", join_or(&PATENT_POLICIES))),
            );
        }
        if policies.len() != 1 {
            out.push(
                Diagnostic::error(
                    self.name(),
                    "When collaborating across multiple groups, they must use the same patent policy.",
                )
                .with_hint(format!("The patent policies were: {}.", policies.join(", "))),
            );
        }
        out
    }
}

pub struct GroupListsRule;

impl ConfigRule for GroupListsRule {
    fn name(&self) -> &'static str { "group_lists" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let raw = input.raw;
        let arrays = [&raw.wg, &raw.wg_uri, &raw.wg_patent_uri].map(|v| v.as_ref().map_or(false, OneOrMany::is_many));
        if !arrays.iter().any(|a| *a) || arrays.iter().all(|a| *a) {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            "If one of `wg`, `wgURI`, or `wgPatentURI` is an array, they all have to be.",
        )
        .with_hint("Use the `group` option with an array instead.")]
    }
}

pub struct CommunityGroupRule;

impl ConfigRule for CommunityGroupRule {
    fn name(&self) -> &'static str { "community_group" }

    fn check(&self, input: &RuleInput<'_>) -> Vec<Diagnostic> {
        let (raw, status) = (input.raw, input.status);
        if !status.facets.is_cgbg {
            return vec![];
        }
        let report_type = status.text.unwrap_or_default();

        if !given_group(&raw.wg) {
            return vec![Diagnostic::error(
                self.name(),
                format!("The `group` configuration option is required for this kind of document ({report_type})."),
            )];
        }

        if status.facets.is_cg_final {
            let on_publisher = match &raw.latest_version {
                Some(Some(latest)) if !latest.is_empty() => input
                    .origin
                    .join(latest)
                    .map_or(false, |u| same_publisher(input.origin, &u)),
                _ => false,
            };
            if !on_publisher {
                return vec![Diagnostic::error(
                    self.name(),
                    format!("For {report_type}, the `latestVersion` URL must point to somewhere at {}.", input.origin),
                )
                .with_hint("Ask for a URL on the publisher's site where the report can be published.")];
            }
        }
        vec![]
    }
}

/// Rule set runs every registered rule in order.
pub struct RuleSet {
    rules: Vec<Box<dyn ConfigRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SpecStatusRule),
                Box::new(ShortNameRule),
                Box::new(PublicFeedbackRule),
                Box::new(ErrataRule),
                Box::new(AlternateFormatsRule),
                Box::new(ReviewWindowRule),
                Box::new(RevisionRule),
                Box::new(NoRecTrackRule),
                Box::new(ImplementationReportRule),
                Box::new(PatentPolicyRule),
                Box::new(GroupListsRule),
                Box::new(CommunityGroupRule),
            ],
        }
    }

    pub fn check(&self, input: &RuleInput<'_>, diags: &mut Diagnostics) {
        for rule in &self.rules {
            for diagnostic in rule.check(input) {
                diags.push(diagnostic);
            }
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{classify, SpecStatus};
    use chrono::NaiveDate;
    use serde_json::json;

    fn check(config: serde_json::Value) -> Diagnostics {
        check_in(config, DocumentContext::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()))
    }

    fn check_in(config: serde_json::Value, context: DocumentContext) -> Diagnostics {
        let raw: RawConfig = serde_json::from_value(config).unwrap();
        let status = classify(&SpecStatus::parse(raw.spec_status.as_deref().unwrap_or("")));
        let origin = Url::parse("https://www.w3.org/").unwrap();
        let mut diags = Diagnostics::new();
        let input = RuleInput { raw: &raw, status: &status, context: &context, origin: &origin };
        RuleSet::new().check(&input, &mut diags);
        diags
    }

    fn rules_hit(diags: &Diagnostics) -> Vec<String> {
        diags.iter().map(|d| d.rule.clone()).collect()
    }

    #[test]
    fn complete_working_draft_passes() {
        let diags = check(json!({
            "specStatus": "WD",
            "shortName": "s",
            "github": "w3c/s",
        }));
        assert!(diags.is_empty(), "{:?}", rules_hit(&diags));
    }

    #[test]
    fn missing_status_and_short_name() {
        let diags = check(json!({ "specStatus": "WD", "wgPublicList": "public-s" }));
        assert_eq!(rules_hit(&diags), ["short_name"]);

        let diags = check(json!({}));
        assert_eq!(rules_hit(&diags), ["spec_status"]);
    }

    #[test]
    fn recommendation_needs_errata_and_feedback() {
        let diags = check(json!({ "specStatus": "REC", "shortName": "s" }));
        assert_eq!(rules_hit(&diags), ["public_feedback", "errata"]);
    }

    #[test]
    fn candidate_recommendation_needs_review_end_and_report() {
        let diags = check(json!({ "specStatus": "CR", "shortName": "s", "github": "w3c/s" }));
        assert_eq!(rules_hit(&diags), ["review_window", "implementation_report"]);
        assert!(diags.iter().all(Diagnostic::is_error));
    }

    #[test]
    fn proposed_recommendation_needs_both_review_ends() {
        let diags = check(json!({
            "specStatus": "PR",
            "shortName": "s",
            "github": "w3c/s",
            "implementationReportURI": "https://example.org/ir",
        }));
        assert_eq!(diags.errors().count(), 2);
        assert!(diags.iter().all(|d| d.rule == "review_window"));
    }

    #[test]
    fn proposed_edited_recommendation_needs_review_end() {
        let diags = check(json!({ "specStatus": "PER", "shortName": "s", "github": "w3c/s" }));
        assert_eq!(rules_hit(&diags), ["review_window"]);
        assert!(diags.errors().all(|d| d.message.contains("perEnd")));
    }

    #[test]
    fn pr_without_report_only_warns() {
        let diags = check(json!({
            "specStatus": "PR",
            "shortName": "s",
            "github": "w3c/s",
            "crEnd": "2024-01-01",
            "prEnd": "2024-02-01",
        }));
        assert_eq!(diags.warnings().count(), 1);
        assert!(!diags.has_errors());
    }

    #[test]
    fn revisions_on_recommendation() {
        let diags = check(json!({
            "specStatus": "REC",
            "shortName": "s",
            "github": "w3c/s",
            "errata": "https://example.org/errata",
            "revisionTypes": ["addition", "rewrite"],
        }));
        let messages: Vec<_> = diags.errors().map(|d| d.message.clone()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("rewrite"));
        assert!(messages[1].contains("additions"));

        let mut context = DocumentContext::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        context.sotd_updateable_rec = true;
        let diags = check_in(
            json!({
                "specStatus": "REC",
                "shortName": "s",
                "github": "w3c/s",
                "errata": "https://example.org/errata",
                "revisionTypes": ["correction"],
            }),
            context,
        );
        let messages: Vec<_> = diags.errors().map(|d| d.message.clone()).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("revisedRecEnd"));
    }

    #[test]
    fn deprecated_updateable_rec_warns() {
        let diags = check(json!({ "specStatus": "ED", "shortName": "s", "updateableRec": false }));
        assert_eq!(rules_hit(&diags), ["revisions"]);
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn no_rec_track_conflict() {
        let diags = check(json!({ "specStatus": "WD", "shortName": "s", "github": "g", "noRecTrack": true }));
        assert_eq!(rules_hit(&diags), ["no_rec_track"]);
    }

    #[test]
    fn patent_policy_must_be_known_and_single() {
        let diags = check(json!({ "specStatus": "ED", "shortName": "s", "wgPatentPolicy": ["PP2020", "PP1999"] }));
        assert_eq!(diags.errors().count(), 2);

        let diags = check(json!({ "specStatus": "ED", "shortName": "s", "wgPatentPolicy": ["PP2020", "PP2020"] }));
        assert!(diags.is_empty());

        let raw: RawConfig = serde_json::from_value(json!({ "wgPatentPolicy": ["PP2017", "PP2020"] })).unwrap();
        assert_eq!(resolve_patent_policy(&raw).as_deref(), Some("PP2017"));
    }

    #[test]
    fn group_lists_must_agree() {
        let diags = check(json!({
            "specStatus": "ED",
            "shortName": "s",
            "wg": ["A", "B"],
            "wgURI": "https://example.org/a",
            "wgPatentURI": ["x", "y"],
        }));
        assert_eq!(rules_hit(&diags), ["group_lists"]);
    }

    #[test]
    fn alternate_formats_need_uri_and_label() {
        let diags = check(json!({
            "specStatus": "ED",
            "shortName": "s",
            "alternateFormats": [{ "uri": "a.pdf", "label": "PDF" }, { "uri": "b.epub" }, { "label": "x" }],
        }));
        assert_eq!(rules_hit(&diags), ["alternate_formats"]);
    }

    #[test]
    fn community_reports_need_group_and_publisher_url() {
        let diags = check(json!({ "specStatus": "CG-DRAFT" }));
        assert_eq!(rules_hit(&diags), ["community_group"]);

        let diags = check(json!({
            "specStatus": "CG-FINAL",
            "wg": "Web Incubator CG",
            "latestVersion": "https://wicg.github.io/x/",
        }));
        assert_eq!(rules_hit(&diags), ["community_group"]);

        let diags = check(json!({
            "specStatus": "BG-FINAL",
            "wg": "Some BG",
            "latestVersion": "https://www.w3.org/community/reports/bg/x/",
        }));
        assert!(diags.is_empty());
    }
}
