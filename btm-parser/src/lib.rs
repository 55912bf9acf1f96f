#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod parsed;
pub mod parser;
pub mod records;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
