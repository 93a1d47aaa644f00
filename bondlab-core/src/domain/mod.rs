//! Domain types for BondLab

pub mod kind;
pub mod page;
pub mod params;

pub use kind::{Mode, RecordKind};
pub use page::{Cursor, Page, Scalar};
pub use params::{DateRange, IsinSelection, ParamsError, RunParams};
