//! arcsql - provider-independent SQL statement trees
//!
//! This library provides an in-memory representation of SQL statements and
//! the passes applied to it before execution:
//! - SQL text front end (lexer, parser) with `##name::type` placeholders
//! - Statement tree model and builder API
//! - Structural validation
//! - Catalog-driven normalization
//! - INSERT/UPDATE/DELETE synthesis from a SELECT
//! - Default-value and NULL-parameter rewriting
//! - SQL text and JSON rendering
//!
//! ```no_run
//! use arcsql::catalog::{Catalog, DataType, TableBuilder};
//! use arcsql::dml::{compute_dml, DmlRequest};
//!
//! let mut catalog = Catalog::new();
//! TableBuilder::new("customers")
//!     .primary_key("id", DataType::Integer)
//!     .column("name", DataType::Text)
//!     .build(&mut catalog)?;
//!
//! let select = arcsql::sql::parse("SELECT id, name FROM customers")?;
//! let dml = compute_dml(&select, &catalog, &DmlRequest::all())?;
//! assert!(matches!(dml.update, Some(Ok(_))));
//! # Ok::<(), arcsql::Error>(())
//! ```

pub mod catalog;
pub mod config;
pub mod dml;
pub mod error;
pub mod functions;
pub mod normalize;
pub mod render;
pub mod rewrite;
pub mod sql;
pub mod stmt;
pub mod validate;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use stmt::{Statement, StatementKind};
