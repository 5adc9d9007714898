pub mod asset;
pub mod cell;
pub mod flags;
pub mod tag;

pub use cell::CellInfo;
pub use flags::CellFlags;
