//! Resource URIs: `<host>/<driver>/<lid>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::validate_identifier;

/// Stable address of a resource.
///
/// The local id may itself contain `/`, so `kitchen/light/ceiling/left`
/// names host `kitchen`, driver `light` and local id `ceiling/left`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri {
    host: String,
    driver: String,
    lid: String,
}

impl ResourceUri {
    /// Build a URI from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if a segment is invalid.
    pub fn new(
        host: impl Into<String>,
        driver: impl Into<String>,
        lid: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let uri = Self {
            host: host.into(),
            driver: driver.into(),
            lid: lid.into(),
        };
        validate_identifier(&uri.host, false)?;
        validate_identifier(&uri.driver, false)?;
        validate_identifier(&uri.lid, true)?;
        if uri.lid.starts_with('/') || uri.lid.ends_with('/') || uri.lid.contains("//") {
            return Err(ValidationError::InvalidIdentifier(uri.lid));
        }
        Ok(uri)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    #[must_use]
    pub fn lid(&self) -> &str {
        &self.lid
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.driver, self.lid)
    }
}

impl FromStr for ResourceUri {
    type Err = ValidationError;

    /// Accepts `host/driver/lid`, optionally prefixed by `/` or `/host/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedUri(s.to_string());
        let path = s
            .strip_prefix("/host/")
            .or_else(|| s.strip_prefix('/'))
            .unwrap_or(s);
        let mut parts = path.splitn(3, '/');
        let (Some(host), Some(driver), Some(lid)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Self::new(host, driver, lid).map_err(|_| malformed())
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceUri> for String {
    fn from(value: ResourceUri) -> Self {
        value.to_string()
    }
}
