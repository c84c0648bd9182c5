pub mod category;
pub mod config;
pub mod task;
pub mod user;

pub use category::*;
pub use config::*;
pub use task::*;
pub use user::*;
