//! Version extraction strategies
//!
//! A strategy says where a request carries its version. The fallback says
//! what happens when it carries none.

use crate::error::ApiError;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use versa_core::{ApiVersion, VersionBundle};

const PLACEHOLDER: &str = "{version}";

/// Strategy for extracting the API version from requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStrategy {
    /// Extract version from HTTP header
    ///
    /// Example: `x-api-version: 2024-01-01`
    Header {
        /// Header name to read version from
        name: String,
    },

    /// Extract version from query parameter
    ///
    /// Example: `?version=2024-01-01`
    Query {
        /// Query parameter name
        param: String,
    },

    /// Extract version from the leading segment(s) of the URL path
    ///
    /// The pattern includes a `{version}` placeholder, e.g. `/{version}/`.
    /// The matched prefix is stripped before routing.
    Path {
        /// Pattern for matching version in path
        pattern: String,
    },

    /// Extract version from Accept header media type
    ///
    /// Example: `Accept: application/vnd.api.v2024-01-01+json`
    Accept {
        /// Media type pattern with version placeholder
        pattern: String,
    },
}

impl VersionStrategy {
    /// Header strategy reading `x-api-version`
    pub fn header() -> Self {
        Self::header_with_name("x-api-version")
    }

    pub fn header_with_name(name: impl Into<String>) -> Self {
        Self::Header {
            name: name.into().to_ascii_lowercase(),
        }
    }

    /// Query strategy reading `?version=`
    pub fn query() -> Self {
        Self::query_with_param("version")
    }

    pub fn query_with_param(param: impl Into<String>) -> Self {
        Self::Query { param: param.into() }
    }

    /// Path strategy with pattern `/{version}/`
    pub fn path() -> Self {
        Self::path_with_pattern("/{version}/")
    }

    pub fn path_with_pattern(pattern: impl Into<String>) -> Self {
        Self::Path {
            pattern: pattern.into(),
        }
    }

    /// Accept strategy with pattern `application/vnd.api.v{version}+json`
    pub fn accept() -> Self {
        Self::accept_with_pattern("application/vnd.api.v{version}+json")
    }

    pub fn accept_with_pattern(pattern: impl Into<String>) -> Self {
        Self::Accept {
            pattern: pattern.into(),
        }
    }

    /// Where the version is expected, for error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Header { name } => format!("the \"{name}\" header"),
            Self::Query { param } => format!("the \"{param}\" query parameter"),
            Self::Path { pattern } => format!("the path, as \"{pattern}\""),
            Self::Accept { pattern } => format!("the Accept header, as \"{pattern}\""),
        }
    }

    /// Raw version value and the path to route on
    pub(crate) fn extract(&self, parts: &Parts) -> Extracted {
        let path = parts.uri.path();
        let unchanged = |raw: Option<String>| Extracted {
            raw,
            path: path.to_string(),
        };

        match self {
            Self::Header { name } => unchanged(
                parts
                    .headers
                    .get(name.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            ),
            Self::Query { param } => unchanged(
                serde_urlencoded::from_str::<Vec<(String, String)>>(parts.uri.query().unwrap_or(""))
                    .ok()
                    .and_then(|pairs| pairs.into_iter().find(|(k, _)| k == param))
                    .map(|(_, v)| v),
            ),
            Self::Accept { pattern } => unchanged(
                parts
                    .headers
                    .get_all(http::header::ACCEPT)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .flat_map(|v| v.split(','))
                    .find_map(|media| extract_between(media.trim(), pattern)),
            ),
            Self::Path { pattern } => match extract_path_version(path, pattern) {
                Some((raw, rest)) => Extracted {
                    raw: Some(raw),
                    path: rest,
                },
                None => unchanged(None),
            },
        }
    }
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::header()
    }
}

/// What to do with requests that name no version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VersionFallback {
    #[default]
    Latest,
    Oldest,
    /// Resolved like a requested version
    Fixed(ApiVersion),
    /// Answer 400 `missing_api_version`
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extracted {
    pub(crate) raw: Option<String>,
    pub(crate) path: String,
}

/// Outcome of version picking
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Picked {
    pub(crate) version: ApiVersion,
    pub(crate) path: String,
}

/// Pick the version a request is served in
pub(crate) fn pick(
    strategy: &VersionStrategy,
    fallback: VersionFallback,
    bundle: &VersionBundle,
    parts: &Parts,
) -> Result<Picked, ApiError> {
    let Extracted { raw, path } = strategy.extract(parts);

    let requested = match raw.as_deref().map(str::trim) {
        None | Some("") => match fallback {
            VersionFallback::Latest => bundle.latest(),
            VersionFallback::Oldest => bundle.oldest(),
            VersionFallback::Fixed(version) => version,
            VersionFallback::Reject => return Err(ApiError::missing_version(&strategy.describe())),
        },
        Some(raw) => raw
            .parse::<ApiVersion>()
            .map_err(|_| ApiError::invalid_version(raw))?,
    };

    let version = bundle
        .resolve(requested)
        .ok_or_else(|| ApiError::unsupported_version(requested, bundle.oldest()))?;
    Ok(Picked { version, path })
}

fn extract_between(value: &str, pattern: &str) -> Option<String> {
    let (before, after) = pattern.split_once(PLACEHOLDER)?;
    let rest = value.strip_prefix(before)?;
    let raw = if after.is_empty() {
        rest.split(';').next().unwrap_or(rest)
    } else {
        rest.split_once(after).map(|(raw, _)| raw)?
    };
    Some(raw.trim().to_string())
}

fn extract_path_version(path: &str, pattern: &str) -> Option<(String, String)> {
    let (before, after) = pattern.split_once(PLACEHOLDER)?;
    let rest = path.strip_prefix(before)?;

    let end = if after.is_empty() || after == "/" {
        rest.find('/').unwrap_or(rest.len())
    } else {
        rest.find(after)?
    };
    let raw = &rest[..end];
    if raw.is_empty() {
        return None;
    }

    let remaining = rest[end..].strip_prefix(after).unwrap_or(&rest[end..]);
    Some((raw.to_string(), format!("/{}", remaining.trim_start_matches('/'))))
}
