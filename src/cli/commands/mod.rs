//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod load;
pub mod record;
pub mod status;

pub use config::execute as config;
pub use fetch::execute as fetch;
pub use load::execute as load;
pub use record::execute as record;
pub use status::execute as status;
