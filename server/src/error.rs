use thiserror::Error;
use warp::http::StatusCode;

use crate::flight_csv::CsvError;

/// Failures surfaced to the client of an action.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingUpload(&'static str),
    #[error("Invalid time format: {0}")]
    InvalidTime(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Error processing GeoTIFF file: {0}")]
    Raster(String),
    #[error("An unexpected error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

pub fn internal<E: Into<anyhow::Error>>(err: E) -> ApiError {
    ApiError::Internal(err.into())
}

impl From<CsvError> for ApiError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::InvalidTime(value) => ApiError::InvalidTime(value),
            CsvError::MissingColumn(_) => {
                ApiError::BadRequest(format!("Missing required column in file: {}", err))
            }
            CsvError::InvalidNumber(_) => {
                ApiError::BadRequest(format!("Invalid data in file: {}", err))
            }
            CsvError::NameTooLong(_) | CsvError::Malformed(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        assert_eq!(
            ApiError::InvalidTime("25:00".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Raster("not a TIFF".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_csv_error() {
        let err: ApiError = CsvError::MissingColumn("Latitude").into();
        assert_eq!(err.to_string(), "Missing required column in file: 'Latitude'");

        let err: ApiError = CsvError::InvalidNumber("abc".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid data in file: could not convert string to float: 'abc'"
        );

        let err: ApiError = CsvError::InvalidTime("noon".into()).into();
        assert!(matches!(err, ApiError::InvalidTime(_)));
    }

    #[test]
    fn test_into_rejection() {
        let rejection: warp::Rejection = ApiError::BadRequest("bad".into()).into();
        assert!(matches!(
            rejection.find::<ApiError>(),
            Some(ApiError::BadRequest(message)) if message == "bad"
        ));
    }

    #[test]
    fn test_name_too_long_is_bad_request() {
        let err: ApiError = CsvError::NameTooLong(100).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Location name cannot exceed 100 characters");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::InvalidTime("14:00".into()).to_string(),
            "Invalid time format: 14:00"
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).to_string(),
            "An unexpected error occurred: boom"
        );
    }
}
