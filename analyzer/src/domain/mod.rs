//! Domain logic for call-site SQL validation
//!
//! - `types` - host type model and conversion classification
//! - `callsite` - call-site description consumed by analyzers
//! - `analyzers` - call-site normalization strategies
//! - `reconcile` - parameter and result-set diffing
//! - `registry` - provider and analyzer lookup
//! - `driver` - per-call-site orchestration

pub mod analyzers;
pub mod callsite;
pub mod connection;
pub mod definition;
pub mod diagnostics;
pub mod driver;
pub mod outcome;
pub mod query;
pub mod reconcile;
pub mod registry;
pub mod types;

pub use analyzers::{CallSiteAnalyzer, DapperAnalyzer, DefaultAnalyzer};
pub use callsite::{Argument, CallSite, Invocation, MethodSymbol, SourceLocation};
pub use connection::{ConnectionStringData, DatabaseType, parse_database_type};
pub use definition::{
    ExpectedField, InputParameter, NormalizedQueryDefinition, NormalizedQueryDefinitionBuilder,
};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticSink, Severity};
pub use driver::AnalysisDriver;
pub use outcome::Outcome;
pub use query::{ColumnInfo, ParameterInfo, ValidatedQuery, ValidatedQueryBuilder};
pub use reconcile::Reconciler;
pub use registry::{ProviderFactory, ServiceRegistry};
pub use types::{
    Conversion, PropertyInfo, RecordType, ScalarKind, ScalarType, SemanticModel,
    StandardConversions, TypeRef,
};
