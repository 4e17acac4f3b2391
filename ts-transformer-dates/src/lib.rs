//! Compile-time rewrite pass for `ts-transformer-dates`.
//!
//! Runtime code cannot tell which fields of a deserialized payload were
//! `Date`s: that knowledge only exists while types are available. This pass
//! runs inside the host compiler, finds calls to the marker function
//! `toDates<T>(payload)`, walks `T` for `Date`-typed fields, and rewrites the
//! call to pass the discovered field paths to the runtime support module.
//!
//! - [`matcher`] recognizes marker imports and calls by resolved identity
//! - [`analysis`] walks a type graph for timestamp field paths
//! - [`transform`] rewrites one compilation unit
//!
//! ## Example
//!
//! ```rust,ignore
//! use ts_transformer_dates::{DatesTransformer, NodeModuleResolver, TransformConfig};
//!
//! let config = TransformConfig::load("ts-transformer-dates.toml")?;
//! let transformer = DatesTransformer::new(&type_checker, &NodeModuleResolver::new(), config);
//! let rewritten = transformer.transform(&unit);
//! ```

pub mod analysis;
pub mod config;
pub mod emit;
pub mod error;
pub mod matcher;
pub mod program;
pub mod resolve;
pub mod syntax;
pub mod transform;
pub mod types;
pub mod utils;

pub use analysis::{discover_timestamp_paths, FieldPath, FieldType, PathSet, TimestampPathFinder};
pub use config::{MarkerIdentity, RuntimeConfig, TransformConfig, TypesConfig};
pub use emit::{print_node, print_source_file};
pub use error::*;
pub use matcher::MarkerMatcher;
pub use program::{parse_type_table_content, parse_type_table_file, TypeTable};
pub use resolve::{ModuleResolver, NodeModuleResolver, StaticModuleResolver};
pub use syntax::*;
pub use transform::{transformer_factory, DatesTransformer, UnitRewrite};
pub use types::*;
