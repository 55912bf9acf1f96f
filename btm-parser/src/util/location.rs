/*!
 Contains the representation of archived `NSURL` values.
*/

use std::fmt::{Display, Formatter, Result as FmtResult};

use url::Url;

/// A file-system location decoded from an `NSURL`
///
/// The string form is kept verbatim; for a URL with a base it is the base joined with the
/// relative part, otherwise it is the relative part as archived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileLocation {
    location: String,
}

impl FileLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Build a location from the `NS.base` and `NS.relative` parts of an archived URL
    pub fn resolve(base: Option<&FileLocation>, relative: &str) -> Result<Self, url::ParseError> {
        match base {
            Some(base) => {
                let base = Url::parse(&base.location)?;
                Ok(Self::new(base.join(relative)?.to_string()))
            }
            None => Ok(Self::new(relative)),
        }
    }

    /// The string form of the location
    pub fn as_str(&self) -> &str {
        &self.location
    }

    /// The file-system path of the location, percent-decoded and without a trailing `/`
    ///
    /// A relative location keeps its relative form.
    pub fn path(&self) -> Option<String> {
        let path = match Url::parse(&self.location) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().ok()?.to_string_lossy().into_owned()
            }
            Ok(url) => url.path().to_string(),
            Err(_) => {
                // Anchor the relative reference so the url crate can decode it
                let anchored = Url::parse("file:///").ok()?.join(&self.location).ok()?;
                let decoded = anchored.to_file_path().ok()?.to_string_lossy().into_owned();
                if self.location.starts_with('/') {
                    decoded
                } else {
                    decoded.trim_start_matches('/').to_string()
                }
            }
        };

        match path.trim_end_matches('/') {
            "" if path.starts_with('/') => Some("/".to_string()),
            trimmed => Some(trimmed.to_string()),
        }
    }
}

impl Display for FileLocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.location)
    }
}
