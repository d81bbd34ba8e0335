pub mod athena;
pub mod client;
pub mod models;
pub mod token;

pub use athena::*;
pub use client::*;
pub use models::*;
pub use token::*;
