// libs/reception-cell/src/services/mod.rs

pub mod complexity;
pub mod compose;
pub mod normalize;
pub mod resolver;
pub mod scheduling;

pub use complexity::*;
pub use compose::*;
pub use normalize::*;
pub use resolver::*;
pub use scheduling::*;
