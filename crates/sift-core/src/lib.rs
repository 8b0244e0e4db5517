use error::SiftError;

pub mod entity_set;
pub mod error;
pub mod evr;
pub mod nevra;
pub mod package;
pub mod pool;
pub mod query;
pub mod reldep;
pub mod search;

#[cfg(test)]
pub mod test_utils;

pub type SiftResult<T> = std::result::Result<T, SiftError>;
