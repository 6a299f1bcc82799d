//! Specmeta Core - Header Metadata Resolver
//!
//! Turns an author's header configuration into a fully resolved one.
//!
//! # Stage Order (Fixed)
//! 1. Status taxonomy
//! 2. License
//! 3. Dates
//! 4. Version URLs
//! 5. History (the only suspending stage)
//! 6. Editors
//! 7. Process rules
//!
//! Problems are collected as diagnostics; a run always completes.

pub mod config;
pub mod dates;
pub mod diagnostics;
pub mod editors;
pub mod hashing;
pub mod history;
pub mod license;
pub mod pipeline;
pub mod rules;
pub mod status;
pub mod versions;

pub use config::{ConfigError, DocumentContext, EngineSettings, RawConfig};
pub use dates::{validate_date, NormalizedDate};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use hashing::{canonical_json, input_digest};
pub use history::{ExistenceProbe, HttpProbe, OfflineProbe, ProbeError};
pub use license::{License, LicenseDescriptor};
pub use pipeline::{PipelineError, Resolution, ResolutionPipeline, ResolutionReport, ResolvedConfig};
pub use status::{classify, PublicationTrack, SpecStatus, StatusInfo};
pub use versions::{VersionLink, VersionUrls};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
