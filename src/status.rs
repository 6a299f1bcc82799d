//! Status Taxonomy - Closed Vocabulary, One Track Each
//!
//! Every known status code maps to exactly one publication track via an
//! exhaustive match. Codes outside the vocabulary are kept as `Unknown` and
//! resolve to the unofficial track with every facet false.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpecStatus {
    Dnote,
    Note,
    Stmt,
    MemberSubm,
    Mo,
    Ed,
    Ls,
    Ld,
    Fpwd,
    Wd,
    Cr,
    Crd,
    Pr,
    Per,
    Rec,
    Disc,
    Rscnd,
    Dry,
    Cryd,
    Cry,
    Ry,
    Unofficial,
    Ud,
    Base,
    Finding,
    DraftFinding,
    EditorDraftFinding,
    CgDraft,
    CgFinal,
    BgDraft,
    BgFinal,
    Unknown(String),
}

impl SpecStatus {
    /// Every code of the closed vocabulary, in display order.
    pub const KNOWN: [SpecStatus; 31] = [
        SpecStatus::Dnote,
        SpecStatus::Note,
        SpecStatus::Stmt,
        SpecStatus::MemberSubm,
        SpecStatus::Mo,
        SpecStatus::Ed,
        SpecStatus::Ls,
        SpecStatus::Ld,
        SpecStatus::Fpwd,
        SpecStatus::Wd,
        SpecStatus::Cr,
        SpecStatus::Crd,
        SpecStatus::Pr,
        SpecStatus::Per,
        SpecStatus::Rec,
        SpecStatus::Disc,
        SpecStatus::Rscnd,
        SpecStatus::Dry,
        SpecStatus::Cryd,
        SpecStatus::Cry,
        SpecStatus::Ry,
        SpecStatus::Unofficial,
        SpecStatus::Ud,
        SpecStatus::Base,
        SpecStatus::Finding,
        SpecStatus::DraftFinding,
        SpecStatus::EditorDraftFinding,
        SpecStatus::CgDraft,
        SpecStatus::CgFinal,
        SpecStatus::BgDraft,
        SpecStatus::BgFinal,
    ];

    /// Never fails: unrecognized codes become `Unknown`.
    pub fn parse(code: &str) -> Self {
        match code {
            "DNOTE" => Self::Dnote,
            "NOTE" => Self::Note,
            "STMT" => Self::Stmt,
            "Member-SUBM" => Self::MemberSubm,
            "MO" => Self::Mo,
            "ED" => Self::Ed,
            "LS" => Self::Ls,
            "LD" => Self::Ld,
            "FPWD" => Self::Fpwd,
            "WD" => Self::Wd,
            "CR" => Self::Cr,
            "CRD" => Self::Crd,
            "PR" => Self::Pr,
            "PER" => Self::Per,
            "REC" => Self::Rec,
            "DISC" => Self::Disc,
            "RSCND" => Self::Rscnd,
            "DRY" => Self::Dry,
            "CRYD" => Self::Cryd,
            "CRY" => Self::Cry,
            "RY" => Self::Ry,
            "unofficial" => Self::Unofficial,
            "UD" => Self::Ud,
            "base" => Self::Base,
            "finding" => Self::Finding,
            "draft-finding" => Self::DraftFinding,
            "editor-draft-finding" => Self::EditorDraftFinding,
            "CG-DRAFT" => Self::CgDraft,
            "CG-FINAL" => Self::CgFinal,
            "BG-DRAFT" => Self::BgDraft,
            "BG-FINAL" => Self::BgFinal,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Dnote => "DNOTE",
            Self::Note => "NOTE",
            Self::Stmt => "STMT",
            Self::MemberSubm => "Member-SUBM",
            Self::Mo => "MO",
            Self::Ed => "ED",
            Self::Ls => "LS",
            Self::Ld => "LD",
            Self::Fpwd => "FPWD",
            Self::Wd => "WD",
            Self::Cr => "CR",
            Self::Crd => "CRD",
            Self::Pr => "PR",
            Self::Per => "PER",
            Self::Rec => "REC",
            Self::Disc => "DISC",
            Self::Rscnd => "RSCND",
            Self::Dry => "DRY",
            Self::Cryd => "CRYD",
            Self::Cry => "CRY",
            Self::Ry => "RY",
            Self::Unofficial => "unofficial",
            Self::Ud => "UD",
            Self::Base => "base",
            Self::Finding => "finding",
            Self::DraftFinding => "draft-finding",
            Self::EditorDraftFinding => "editor-draft-finding",
            Self::CgDraft => "CG-DRAFT",
            Self::CgFinal => "CG-FINAL",
            Self::BgDraft => "BG-DRAFT",
            Self::BgFinal => "BG-FINAL",
            Self::Unknown(code) => code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    pub fn track(&self) -> PublicationTrack {
        match self {
            Self::Dnote | Self::Note | Self::Stmt => PublicationTrack::Note,
            Self::Fpwd
            | Self::Wd
            | Self::Cr
            | Self::Crd
            | Self::Pr
            | Self::Per
            | Self::Rec
            | Self::Disc
            | Self::Rscnd => PublicationTrack::Recommendation,
            Self::Dry | Self::Cryd | Self::Cry | Self::Ry => PublicationTrack::Registry,
            Self::Finding | Self::DraftFinding | Self::EditorDraftFinding => {
                PublicationTrack::TagFinding
            }
            Self::CgDraft | Self::CgFinal | Self::BgDraft | Self::BgFinal => {
                PublicationTrack::CommunityOrBusinessGroup
            }
            Self::Base => PublicationTrack::Basic,
            Self::MemberSubm
            | Self::Mo
            | Self::Ed
            | Self::Ls
            | Self::Ld
            | Self::Unofficial
            | Self::Ud
            | Self::Unknown(_) => PublicationTrack::Unofficial,
        }
    }

    /// Short human-readable name; `None` for unknown codes.
    pub fn text(&self) -> Option<&'static str> {
        let text = match self {
            Self::Dnote => "Group Draft Note",
            Self::Note => "Group Note",
            Self::Stmt => "Statement",
            Self::MemberSubm => "Member Submission",
            Self::Mo => "Member-Only Document",
            Self::Ed => "Editor's Draft",
            Self::Ls => "Living Standard",
            Self::Ld => "Living Document",
            Self::Fpwd => "First Public Working Draft",
            Self::Wd => "Working Draft",
            Self::Cr | Self::Crd => "Candidate Recommendation",
            Self::Pr => "Proposed Recommendation",
            Self::Per => "Proposed Edited Recommendation",
            Self::Rec => "Recommendation",
            Self::Disc => "Discontinued Draft",
            Self::Rscnd => "Rescinded Recommendation",
            Self::Dry => "Draft Registry",
            Self::Cryd | Self::Cry => "Candidate Registry",
            Self::Ry => "Registry",
            Self::Unofficial | Self::Ud => "Unofficial Draft",
            Self::Base => "",
            Self::Finding => "TAG Finding",
            Self::DraftFinding | Self::EditorDraftFinding => "Draft TAG Finding",
            Self::CgDraft => "Draft Community Group Report",
            Self::CgFinal => "Final Community Group Report",
            Self::BgDraft => "Draft Business Group Report",
            Self::BgFinal => "Final Business Group Report",
            Self::Unknown(_) => return None,
        };
        Some(text)
    }

    /// Long name; snapshot and draft flavours of CR and CRY are spelled out.
    pub fn long_text(&self) -> Option<&'static str> {
        match self {
            Self::Cr => Some("Candidate Recommendation Snapshot"),
            Self::Crd => Some("Candidate Recommendation Draft"),
            Self::Cry => Some("Candidate Registry Snapshot"),
            Self::Cryd => Some("Candidate Registry Draft"),
            other => other.text(),
        }
    }

    /// Code used when naming dated versions. LS, LD and FPWD publish as WD.
    pub fn maturity_alias(&self) -> &str {
        match self {
            Self::Ls | Self::Ld | Self::Fpwd => "WD",
            other => other.code(),
        }
    }

    /// Statuses that may be published in the technical report space.
    pub fn is_tr_status(&self) -> bool {
        matches!(
            self.track(),
            PublicationTrack::Note | PublicationTrack::Recommendation | PublicationTrack::Registry
        )
    }
}

impl From<String> for SpecStatus {
    fn from(code: String) -> Self {
        Self::parse(&code)
    }
}

impl From<SpecStatus> for String {
    fn from(status: SpecStatus) -> Self {
        status.code().to_string()
    }
}

impl fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicationTrack {
    Note,
    Recommendation,
    Registry,
    TagFinding,
    CommunityOrBusinessGroup,
    Basic,
    /// No formal track: unofficial drafts, editor's drafts, member documents.
    Unofficial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFacets {
    pub is_basic: bool,
    #[serde(rename = "isCGBG")]
    pub is_cgbg: bool,
    #[serde(rename = "isCGFinal")]
    pub is_cg_final: bool,
    #[serde(rename = "isCR")]
    pub is_cr: bool,
    #[serde(rename = "isCRDraft")]
    pub is_cr_draft: bool,
    #[serde(rename = "isCRY")]
    pub is_cry: bool,
    pub is_ed: bool,
    pub is_member_submission: bool,
    #[serde(rename = "isMO")]
    pub is_mo: bool,
    pub is_note: bool,
    pub is_no_track: bool,
    #[serde(rename = "isPER")]
    pub is_per: bool,
    #[serde(rename = "isPR")]
    pub is_pr: bool,
    pub is_rec_track: bool,
    pub is_rec: bool,
    pub is_registry: bool,
    pub is_regular: bool,
    pub is_tag_editor_finding: bool,
    pub is_tag_finding: bool,
    pub is_unofficial: bool,
}

impl ResolvedFacets {
    fn of(status: &SpecStatus) -> Self {
        use SpecStatus as S;

        if !status.is_known() {
            return Self::default();
        }
        let track = status.track();
        let is_cgbg = track == PublicationTrack::CommunityOrBusinessGroup;
        let is_basic = track == PublicationTrack::Basic;
        let is_tag_finding = track == PublicationTrack::TagFinding;

        Self {
            is_basic,
            is_cgbg,
            is_cg_final: matches!(status, S::CgFinal | S::BgFinal),
            is_cr: matches!(status, S::Cr | S::Crd),
            is_cr_draft: *status == S::Crd,
            is_cry: matches!(status, S::Cry | S::Cryd),
            is_ed: *status == S::Ed,
            is_member_submission: *status == S::MemberSubm,
            is_mo: *status == S::Mo,
            is_note: track == PublicationTrack::Note,
            is_no_track: is_basic
                || is_cgbg
                || is_tag_finding
                || matches!(status, S::Mo | S::Unofficial),
            is_per: *status == S::Per,
            is_pr: *status == S::Pr,
            is_rec_track: track == PublicationTrack::Recommendation,
            is_rec: *status == S::Rec,
            is_registry: track == PublicationTrack::Registry,
            is_regular: !is_cgbg && !is_basic,
            is_tag_editor_finding: *status == S::EditorDraftFinding,
            is_tag_finding,
            is_unofficial: *status == S::Unofficial,
        }
    }
}

/// Output of the status stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub status: SpecStatus,
    pub track: PublicationTrack,
    pub facets: ResolvedFacets,
    pub text: Option<&'static str>,
    pub long_text: Option<&'static str>,
}

impl StatusInfo {
    /// Whether the "W3C" prefix is shown before the status name.
    pub fn prepend_w3c(&self) -> bool {
        !self.facets.is_basic && !self.facets.is_unofficial
    }
}

/// Pure: the same status always yields the same facets.
pub fn classify(status: &SpecStatus) -> StatusInfo {
    StatusInfo {
        status: status.clone(),
        track: status.track(),
        facets: ResolvedFacets::of(status),
        text: status.text(),
        long_text: status.long_text(),
    }
}
