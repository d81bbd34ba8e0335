pub mod dispatch;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use dispatch::{dispatch, ToolOperation};
pub use handlers::ReceptionState;
pub use models::*;
pub use router::reception_routes;
