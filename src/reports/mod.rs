pub mod formatter;
pub mod rate_reporter;
pub mod splicer;
pub mod table;
