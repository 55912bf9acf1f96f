use btm_parser::parsed::{ParsedData, ParsedItem};

use crate::app::{error::RuntimeError, runtime::Config};

/// Defines behavior for writing the decoded data to its destination
pub trait Exporter<'a> {
    /// Create a new exporter with a reference to the decoded data
    fn new(config: &'a Config) -> Self;
    /// Render the data and write it out
    fn export(&mut self) -> Result<(), RuntimeError>;
}

/// Defines behavior for formatting the decoded data to the desired output format
pub(super) trait Writer {
    type Output;
    /// Format the whole file
    fn format_data(&self, data: &ParsedData) -> Self::Output;
    /// Format a single background item
    fn format_item(&self, item: &ParsedItem) -> Self::Output;
}
