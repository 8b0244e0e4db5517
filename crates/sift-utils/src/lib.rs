pub mod error;
pub mod path;
pub mod pattern;
