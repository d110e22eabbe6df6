//! Cross-references and the browsable catalog.
//!
//! [`Resolver`] turns any [`Reference`](tsukuru_data::Reference) into a name,
//! expanding troops and map encounter tables into member lists. [`Catalog`]
//! builds one entry per named item, weapon, armor, skill, enemy and troop,
//! with traits, effects and damage formulas put into words, and flags
//! battles that no random encounter table can start.
//!
//! ```no_run
//! use tsukuru_catalog::Catalog;
//! use tsukuru_data::{load_project, ProjectHandle, RefKind};
//!
//! let handle = ProjectHandle::open("path/to/game".as_ref())?;
//! let project = load_project(&handle)?.value;
//! let catalog = Catalog::build(&project).value;
//! for entry in catalog.category(RefKind::Weapon, "sword") {
//!     println!("{} {}", entry.id, entry.name);
//! }
//! # Ok::<(), tsukuru_data::Error>(())
//! ```

mod catalog;
mod describe;
mod entry;
mod formula;
mod passability;
mod resolve;
mod special;

pub mod labels;

pub use catalog::Catalog;
pub use describe::{describe_effect, describe_trait, Line};
pub use entry::{Attribute, CatalogEntry, CATALOG_KINDS};
pub use formula::explain_formula;
pub use passability::{Passability, DOWN, LEFT, RIGHT, UP};
pub use resolve::{
    EncounterDetail, EncounterRow, GroupDetail, MemberGroup, Resolution, ResolvedReference, Resolver, TroopDetail,
};
pub use special::{SpecialEncounter, SpecialReason, SpecialTroop};
