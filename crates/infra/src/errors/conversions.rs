//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use lantern_domain::LanternError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LanternError);

impl From<InfraError> for LanternError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LanternError> for InfraError {
    fn from(value: LanternError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLanternError {
    fn into_lantern(self) -> LanternError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LanternError */
/* -------------------------------------------------------------------------- */

impl IntoLanternError for HttpError {
    fn into_lantern(self) -> LanternError {
        if self.is_timeout() {
            return LanternError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return LanternError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return LanternError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => LanternError::NotFound(message),
                400..=499 if code != 408 && code != 429 => LanternError::InvalidInput(message),
                _ => LanternError::Network(message),
            };
        }

        LanternError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_lantern())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → LanternError */
/* -------------------------------------------------------------------------- */

impl IntoLanternError for UrlError {
    fn into_lantern(self) -> LanternError {
        LanternError::InvalidInput(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_lantern())
    }
}

/* -------------------------------------------------------------------------- */
/* Config formats → LanternError */
/* -------------------------------------------------------------------------- */

impl IntoLanternError for JsonError {
    fn into_lantern(self) -> LanternError {
        LanternError::Config(format!("Invalid JSON format: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_lantern())
    }
}

impl IntoLanternError for TomlError {
    fn into_lantern(self) -> LanternError {
        LanternError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_lantern())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LanternError */
/* -------------------------------------------------------------------------- */

impl IntoLanternError for IoError {
    fn into_lantern(self) -> LanternError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => LanternError::NotFound(self.to_string()),
            ErrorKind::AddrInUse | ErrorKind::AddrNotAvailable => {
                LanternError::Config(format!("cannot bind address: {self}"))
            }
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut => LanternError::Network(self.to_string()),
            _ => LanternError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_lantern())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
