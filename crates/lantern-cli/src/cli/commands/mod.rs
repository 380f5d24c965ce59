pub mod dispatch;
pub mod embed;
pub mod run_types;
pub mod tree;
pub mod upgrade;
pub mod validate;

pub use dispatch::dispatch;
