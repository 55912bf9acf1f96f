use btm_parser::{parsed::ParsedData, parser::BTMParser};
use tracing::info;

use crate::{
    app::{error::RuntimeError, options::Options},
    exporters::{exporter::Exporter, json::JSON},
};

/// Stores the application state and handles application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// The decoded BTM file
    pub data: ParsedData,
}

impl Config {
    /// Decode the file named in `options`
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        let data = BTMParser::parse(&options.file)?;
        info!(
            "Decoded {} items for {} users from {}",
            data.item_count(),
            data.items_by_user.len(),
            options.file.display()
        );
        Ok(Config { options, data })
    }

    /// Write the decoded data
    pub fn start(&self) -> Result<(), RuntimeError> {
        JSON::new(self).export()
    }
}
