//! Drilldown Core - filter compilation for dashboard drill-downs
//!
//! When a user clicks a chart element, the dashboard needs the filter
//! document that reproduces the clicked slice as a table. This crate
//! compiles that document from the click context, the widget's saved query,
//! the dashboard's global filters and the report's static metadata.
//!
//! # Main Components
//!
//! - **Registry**: report descriptors keyed by report type
//! - **Transforms**: per-report rewrites that build the base document
//! - **Pipeline**: the ordered passes every document goes through
//! - **Export**: row projection for table downloads
//!
//! # Example
//!
//! ```
//! use drilldown_core::{compile, DrillDownRequest, ReportRegistry};
//!
//! let request = DrillDownRequest::from_json(r#"{
//!     "context": {"application": "levelops", "x_axis": {"name": "NEW", "id": "27"}},
//!     "widget": {"type": "levelops_workitem_count_report", "query": {"across": "state"}}
//! }"#).unwrap();
//!
//! let outcome = compile(&request, &ReportRegistry::builtin());
//! let compiled = outcome.compiled().unwrap();
//! assert_eq!(compiled.across_value, "state");
//! assert_eq!(compiled.filters.filter["status"], "NEW");
//! ```
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

pub mod across;
pub mod constants;
pub mod custom_fields;
pub mod dates;
pub mod error;
pub mod export;
pub mod json;
pub mod legacy;
pub mod normalize;
pub mod ou;
pub mod pipeline;
pub mod registry;
pub mod transform;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use export::{TabularColumn, TabularInput, TabularKind, TabularTransformer};
pub use json::FilterMap;
pub use pipeline::{compile, CompilationPipeline, FilterPass, PassContext};
pub use registry::{ReportDescriptor, ReportFamily, ReportRegistry};
pub use transform::{TransformInput, TransformKind, TransformOutput};
pub use types::{
    // Request types
    DrillDownContext, DrillDownRequest, DashboardMetadata, WidgetDescriptor, XAxis,
    CustomFieldDef, IntegrationRef,

    // Output types
    CompiledDrilldown, DrilldownOutcome, FilterDocument,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
