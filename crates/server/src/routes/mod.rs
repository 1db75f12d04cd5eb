pub mod auth;
pub mod booking;
pub mod component;
pub mod dashboard;
pub mod health;
pub mod penalty;
pub mod profile;
pub mod root;
pub mod user;

use crate::error::ApiError;
use std::str::FromStr;

/// Parses an optional enum-like parameter, rejecting unknown values with 400
pub(crate) fn parse_param<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = String>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(ApiError::bad_request))
        .transpose()
}
