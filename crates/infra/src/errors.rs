//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use packtrail_domain::PacktrailError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and
/// can be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PacktrailError);

impl From<InfraError> for PacktrailError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PacktrailError> for InfraError {
    fn from(value: PacktrailError) -> Self {
        InfraError(value)
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let message = value.to_string();
        let mapped = if value.is_decode() {
            PacktrailError::Decoding(format!("http body decode failed: {message}"))
        } else if value.is_builder() {
            PacktrailError::InvalidUrl(message)
        } else {
            PacktrailError::Network(format!("http request failed: {message}"))
        };
        InfraError(mapped)
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        let mapped = match value {
            SqlError::QueryReturnedNoRows => {
                PacktrailError::NotFound("no rows returned by query".into())
            }
            SqlError::FromSqlConversionFailure(_, _, cause) => {
                PacktrailError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            SqlError::InvalidColumnType(_, _, ty) => {
                PacktrailError::Storage(format!("invalid column type: {ty}"))
            }
            other => PacktrailError::Storage(other.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        let mapped = match value {
            KeyringError::NoEntry => PacktrailError::NotFound("keychain entry not found".into()),
            KeyringError::BadEncoding(_) => {
                PacktrailError::Decoding("credential in keychain is not valid UTF-8".into())
            }
            other => PacktrailError::Storage(format!("keychain error: {other}")),
        };
        InfraError(mapped)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(PacktrailError::Decoding(value.to_string()))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(PacktrailError::Storage(format!("connection pool error: {value}")))
    }
}
