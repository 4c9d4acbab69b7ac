pub mod filesystem;
pub mod parser;
