//! # sqlscript
//!
//! A library for splitting sql scripts into named, addressable statements.
//!
//! # Features
//!
//! - Split a script into statements and the tags and markers written above them.
//! - Name every statement, either from its tag (`/*-create table~sample-*/`) or from its sql.
//! - Look statements up by index (negative indices count from the end) or by name.
//! - Filter a script by regex patterns over name components; the script is restored when the filter is dropped.
//! - Run statements through any `Executor`, with QA statements asserting empty results.
//!
//! # Example
//!
//! ```rust
//! use sqlscript::{Config, Script};
//! use sqlscript::scope::{Component, Filter};
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let sql = r#"
//!         create table sample_table as select 1 as col1;
//!
//!         /*-select all~sample_table-*/
//!         select * from sample_table;
//!
//!         drop table sample_table;
//!     "#;
//!
//!     let mut script = Script::new(sql, Config::default())?;
//!     assert_eq!(script.statement(1)?.nm(), "create table~s1");
//!     assert_eq!(script.statement(2)?.nm(), "select all~sample_table");
//!     assert_eq!(script.statement(-1)?.nm(), "drop table~s3");
//!
//!     {
//!         let view = script.filter(Filter::new().exclude(Component::Keyword, ["select"]))?;
//!         assert_eq!(view.names(), vec!["create table~s1", "drop table~s2"]);
//!     }
//!     assert_eq!(script.depth(), 3);
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod marker;
pub mod name;
pub mod scanner;
pub mod scope;
pub mod script;
pub mod statement;
pub mod tag;
pub mod test_utils;

pub use config::Config;
pub use error::{ScriptError, ScriptResult};
pub use script::{Script, StatementId};
pub use statement::Statement;
