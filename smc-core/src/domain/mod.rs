//! Domain types for the SMC engine

pub mod bar;
pub mod events;

pub use bar::Bar;
pub use events::{
    Direction, FairValueGap, OrderBlock, StructureEvent, StructureKind, SwingKind, SwingPoint,
    Trend,
};
