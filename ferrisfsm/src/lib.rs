//! # Ferrisfsm
//!
//! Template-driven parser that turns network device CLI output into
//! structured records.
//!
//! Ferrisfsm reads the same template and index formats as Python's TextFSM
//! and ntc-templates: a template describes the values to capture and a small
//! state machine of regex rules, and an index picks the template for a given
//! vendor and command.
//!
//! ## Features
//!
//! - Template parsing with load-time validation (states, values, patterns)
//! - `Required`, `Filldown`, `Fillup`, `List` and `Key` value options
//! - `Next`/`Continue`, `Record`/`Clear`/`Clearall`, `Error`, `End` and `EOF`
//! - Index resolution with most-specific-wins and `sh[[ow]]` completion
//! - Records keyed by lower-cased field name, serialisable with serde
//! - No global state: one [`Pipeline`] can serve many threads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrisfsm::{Attributes, PipelineBuilder};
//!
//! fn main() -> Result<(), ferrisfsm::Error> {
//!     let pipeline = PipelineBuilder::from_dir("templates").build();
//!
//!     let attrs = Attributes::new()
//!         .with("Vendor", "cisco_ios")
//!         .with("Command", "show vlan");
//!
//!     let output = "10   data       active\n20   voice      active\n";
//!     for record in pipeline.run(&attrs, output)? {
//!         println!("{} => {}", record["vlan_id"], record["name"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Templates can also be used directly, without an index:
//!
//! ```rust
//! use ferrisfsm::Template;
//!
//! let template = Template::parse_str(
//!     "Value Required PORT (\\S+)\nValue STATUS (up|down)\n\nStart\n  ^${PORT}\\s+${STATUS} -> Record\n",
//! )?;
//! let records = ferrisfsm::engine::parse(&template, "Gi0/1 up\nGi0/2 down\n")?.to_records();
//! assert_eq!(records[1]["status"], "down");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod record;
pub mod template;

// Re-export main types for convenience
pub use engine::{Cell, Table};
pub use error::{Error, Failure, Result, Stage};
pub use index::{Attributes, Index, IndexRule};
pub use pipeline::{
    DirectorySource, MemorySource, Parsed, Pipeline, PipelineBuilder, PipelineConfig,
    TemplateSource,
};
pub use record::Record;
pub use template::{EofPolicy, Template};
