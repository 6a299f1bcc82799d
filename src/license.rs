//! License Resolver
//!
//! Maps a license key to its descriptor. The permissive licenses are reserved
//! for unofficial documents; using one elsewhere is reported, never corrected.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{join_or, Diagnostic, Diagnostics};
use crate::status::StatusInfo;

const RULE: &str = "license";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum License {
    Cc0,
    W3cSoftware,
    W3cSoftwareDoc,
    CcBy,
    Document,
    Dual,
}

impl License {
    pub const ALL: [License; 6] = [
        License::Cc0,
        License::W3cSoftware,
        License::W3cSoftwareDoc,
        License::CcBy,
        License::Document,
        License::Dual,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Cc0 => "cc0",
            Self::W3cSoftware => "w3c-software",
            Self::W3cSoftwareDoc => "w3c-software-doc",
            Self::CcBy => "cc-by",
            Self::Document => "document",
            Self::Dual => "dual",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_key(key: &str) -> Option<Self> {
        let lower = key.to_lowercase();
        Self::ALL.into_iter().find(|l| l.key() == lower)
    }

    /// Attribution-only and public-domain licenses.
    pub fn is_permissive(self) -> bool {
        matches!(self, Self::CcBy | Self::Cc0)
    }

    pub fn descriptor(self) -> LicenseDescriptor {
        let (name, short, url) = match self {
            Self::Cc0 => (
                "Creative Commons 0 Public Domain Dedication",
                "CC0",
                "https://creativecommons.org/publicdomain/zero/1.0/",
            ),
            Self::W3cSoftware => (
                "W3C Software Notice and License",
                "W3C Software",
                "https://www.w3.org/Consortium/Legal/2002/copyright-software-20021231",
            ),
            Self::W3cSoftwareDoc => (
                "W3C Software and Document Notice and License",
                "permissive document license",
                "https://www.w3.org/Consortium/Legal/2015/copyright-software-and-document",
            ),
            Self::CcBy => (
                "Creative Commons Attribution 4.0 International Public License",
                "CC-BY",
                "https://creativecommons.org/licenses/by/4.0/legalcode",
            ),
            Self::Document => (
                "W3C Document License",
                "document use",
                "https://www.w3.org/Consortium/Legal/copyright-documents",
            ),
            Self::Dual => (
                "W3C Dual License",
                "dual license",
                "https://www.w3.org/Consortium/Legal/2013/copyright-documents-dual.html",
            ),
        };
        LicenseDescriptor {
            name: name.to_string(),
            short: short.to_string(),
            url: Some(url.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDescriptor {
    pub name: String,
    pub short: String,
    pub url: Option<String>,
}

impl LicenseDescriptor {
    pub fn unlicensed() -> Self {
        Self {
            name: "unlicensed".to_string(),
            short: "UNLICENSED".to_string(),
            url: None,
        }
    }
}

pub fn resolve_license(
    requested: Option<&str>,
    status: &StatusInfo,
    diags: &mut Diagnostics,
) -> LicenseDescriptor {
    let mut license = None;

    if let Some(raw) = requested {
        match License::from_key(raw) {
            Some(known) => license = Some(known),
            None => {
                let keys: Vec<_> = License::ALL.iter().map(|l| l.key()).collect();
                diags.push(
                    Diagnostic::error(RULE, format!("The license \"`{raw}`\" is not supported."))
                        .with_hint(format!(
                            "Please set `license` to one of: {}. If in doubt, remove `license` and let a default be picked.",
                            join_or(&keys)
                        )),
                );
            }
        }
    }

    if status.facets.is_unofficial && license.is_none() {
        license = Some(License::CcBy);
    }

    if let Some(chosen) = license {
        if !status.facets.is_unofficial && chosen.is_permissive() {
            diags.push(
                Diagnostic::error(
                    RULE,
                    format!("License \"`{}`\" is not allowed for official specifications.", chosen.key()),
                )
                .with_hint("Please set `license` to `\"w3c-software-doc\"` instead."),
            );
        }
    }

    license
        .map(License::descriptor)
        .unwrap_or_else(LicenseDescriptor::unlicensed)
}
