/*!
 Non-fatal problems found while extracting records.
*/

use thiserror::Error;
use tracing::warn;

/// A problem that did not stop the parse, collected on
/// [`ParsedData::diagnostics`](crate::parsed::ParsedData::diagnostics)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A record was dropped from its user scope
    #[error("Skipping record for user {user}: {reason}")]
    RecordSkipped { user: String, reason: String },
    /// A login item or app kept its archived `executablePath`
    #[error("Could not resolve executable path for {identifier}: {reason}")]
    PathResolutionWarning { identifier: String, reason: String },
}

impl Diagnostic {
    /// Log the diagnostic and add it to `sink`
    pub(crate) fn report(self, sink: &mut Vec<Diagnostic>) {
        warn!("{self}");
        sink.push(self);
    }
}
