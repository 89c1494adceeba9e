pub mod analyzer;
pub mod bindings;
pub mod catalog;
pub mod config;
pub mod error;
pub mod redactor;
pub mod report;
pub mod resolver;
pub mod scanner;

pub use analyzer::UsageAnalyzer;
pub use bindings::{BindingTracker, Origin};
pub use catalog::{ArgCount, Arity, Catalog, CatalogEntry};
pub use config::ScanConfig;
pub use error::{CatalogLoadError, DiagnosticKind, FileDiagnostic, FileError};
pub use redactor::{Redaction, Redactor};
pub use report::{ArgKind, FrequencyTable, Granularity, Match, ScanOutcome, ScanResult};
pub use resolver::{CallResolver, CallSite, CallSiteExtractor, FileAnalysis, Resolution, TieBreakPolicy};
pub use scanner::FileScanner;
