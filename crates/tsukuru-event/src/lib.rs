//! Event command interpreter.
//!
//! Event pages store their script as a flat list of `(code, indent,
//! parameters)` commands. This crate groups head commands with their
//! continuation lines, renders each group as an English [`Instruction`] and
//! attaches the database [`Mention`]s it contains. Pages are also classified
//! by trigger, appearance conditions and purpose.
//!
//! Interpretation never fails: unknown opcodes render as such, and nesting
//! problems come back as warnings.
//!
//! # Example
//!
//! ```no_run
//! use tsukuru_data::{load_project, ProjectHandle};
//! use tsukuru_event::Interpreter;
//!
//! let handle = ProjectHandle::open("path/to/game".as_ref())?;
//! let project = load_project(&handle)?.value;
//! let interpreter = Interpreter::new(&project.database);
//! for (id, map) in &project.maps {
//!     let interpreter = interpreter.for_map(*id);
//!     for event in &map.events {
//!         let analysis = interpreter.interpret_event(event, &format!("Map{id:03}")).value;
//!         println!("{} {:?}", analysis.name, analysis.kind);
//!     }
//! }
//! # Ok::<(), tsukuru_data::Error>(())
//! ```

mod balance;
mod coalesce;
mod instruction;
mod interpreter;
mod page;
mod render;
mod style;

pub mod opcode;

pub use balance::check_balance;
pub use coalesce::{coalesce, Coalescer, Group};
pub use instruction::{Instruction, Mention};
pub use interpreter::Interpreter;
pub use page::{conditions, is_story_page, visual, Condition, EventAnalysis, EventKind, PageAnalysis, Trigger, Visual};
pub use style::Style;
