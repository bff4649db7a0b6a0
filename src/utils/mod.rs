pub mod logging;
pub mod query;
