//! Versions and the version bundle

use super::change::VersionChange;
use crate::error::BundleError;
use crate::version::ApiVersion;
use std::collections::HashSet;

/// A declared API version and the changes it introduced
#[derive(Debug, Clone)]
pub struct Version {
    value: ApiVersion,
    changes: Vec<VersionChange>,
}

impl Version {
    pub fn new(value: ApiVersion) -> Self {
        Self {
            value,
            changes: Vec::new(),
        }
    }

    /// Parse `YYYY-MM-DD` and create a version
    pub fn parse(value: &str) -> Result<Self, BundleError> {
        Ok(Self::new(value.parse()?))
    }

    pub fn change(mut self, change: VersionChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn value(&self) -> ApiVersion {
        self.value
    }

    pub fn changes(&self) -> &[VersionChange] {
        &self.changes
    }
}

/// All versions of an API, newest first
///
/// # Example
///
/// ```rust
/// use versa_core::structure::{Version, VersionBundle, VersionChange};
///
/// let bundle = VersionBundle::new(vec![
///     Version::parse("2024-06-01").unwrap().change(
///         VersionChange::new("RemoveNickname").description("`nickname` was removed"),
///     ),
///     Version::parse("2024-01-01").unwrap(),
/// ])
/// .unwrap();
///
/// assert_eq!(bundle.latest().to_string(), "2024-06-01");
/// assert_eq!(
///     bundle.resolve("2024-03-15".parse().unwrap()).unwrap().to_string(),
///     "2024-01-01"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct VersionBundle {
    versions: Vec<Version>,
}

impl VersionBundle {
    pub fn new(versions: Vec<Version>) -> Result<Self, BundleError> {
        let (oldest, _) = versions.split_last().ok_or(BundleError::Empty)?;

        for pair in versions.windows(2) {
            let (newer, older) = (pair[0].value, pair[1].value);
            if newer == older {
                return Err(BundleError::Duplicate(newer));
            }
            if newer < older {
                return Err(BundleError::NotSorted { newer: older, older: newer });
            }
        }

        if !oldest.changes.is_empty() {
            return Err(BundleError::OldestHasChanges(oldest.value));
        }

        let mut names = HashSet::new();
        for change in versions.iter().flat_map(|v| v.changes.iter()) {
            if !names.insert(change.name()) {
                return Err(BundleError::ChangeBoundTwice(change.name().to_string()));
            }
            if change.description_text().trim().is_empty() {
                return Err(BundleError::MissingDescription(change.name().to_string()));
            }
        }

        Ok(Self { versions })
    }

    pub fn latest(&self) -> ApiVersion {
        self.versions[0].value
    }

    pub fn oldest(&self) -> ApiVersion {
        self.versions[self.versions.len() - 1].value
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn values(&self) -> Vec<ApiVersion> {
        self.versions.iter().map(|v| v.value).collect()
    }

    pub fn contains(&self, version: ApiVersion) -> bool {
        self.get(version).is_some()
    }

    pub fn get(&self, version: ApiVersion) -> Option<&Version> {
        self.versions.iter().find(|v| v.value == version)
    }

    /// Newest declared version released on or before `requested`
    pub fn resolve(&self, requested: ApiVersion) -> Option<ApiVersion> {
        self.versions
            .iter()
            .map(|v| v.value)
            .find(|value| *value <= requested)
    }

    /// Parse a version that must be declared in this bundle
    pub fn parse(&self, raw: &str) -> Result<ApiVersion, BundleError> {
        let version: ApiVersion = raw.parse()?;
        if self.contains(version) {
            Ok(version)
        } else {
            Err(BundleError::UnknownVersion(version))
        }
    }

    /// Versions newer than `version`, oldest first
    pub fn versions_newer_than(&self, version: ApiVersion) -> impl Iterator<Item = &Version> {
        self.versions.iter().rev().filter(move |v| v.value > version)
    }

    pub fn is_latest(&self, version: ApiVersion) -> bool {
        version == self.latest()
    }
}

impl<'a> IntoIterator for &'a VersionBundle {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> ApiVersion {
        raw.parse().unwrap()
    }

    fn change(name: &str) -> VersionChange {
        VersionChange::new(name).description("something changed")
    }

    fn bundle() -> VersionBundle {
        VersionBundle::new(vec![
            Version::new(v("2024-03-01")).change(change("C3")),
            Version::new(v("2024-02-01")).change(change("C2")),
            Version::new(v("2024-01-01")),
        ])
        .unwrap()
    }

    #[test]
    fn test_bundle_accessors() {
        let bundle = bundle();
        assert_eq!(bundle.latest(), v("2024-03-01"));
        assert_eq!(bundle.oldest(), v("2024-01-01"));
        assert_eq!(bundle.values().len(), 3);
        assert!(bundle.contains(v("2024-02-01")));
        assert!(!bundle.contains(v("2024-02-02")));
        assert!(bundle.is_latest(v("2024-03-01")));
    }

    #[test]
    fn test_resolve_picks_closest_older() {
        let bundle = bundle();
        assert_eq!(bundle.resolve(v("2024-02-15")), Some(v("2024-02-01")));
        assert_eq!(bundle.resolve(v("2024-02-01")), Some(v("2024-02-01")));
        assert_eq!(bundle.resolve(v("2030-01-01")), Some(v("2024-03-01")));
        assert_eq!(bundle.resolve(v("2023-12-31")), None);
    }

    #[test]
    fn test_parse_requires_member() {
        let bundle = bundle();
        assert_eq!(bundle.parse("2024-02-01").unwrap(), v("2024-02-01"));
        assert_eq!(
            bundle.parse("2024-02-02"),
            Err(BundleError::UnknownVersion(v("2024-02-02")))
        );
        assert!(matches!(bundle.parse("tomorrow"), Err(BundleError::Parse(_))));
    }

    #[test]
    fn test_versions_newer_than_is_oldest_first() {
        let bundle = bundle();
        let path: Vec<_> = bundle.versions_newer_than(v("2024-01-01")).map(|v| v.value()).collect();
        assert_eq!(path, [v("2024-02-01"), v("2024-03-01")]);
        assert_eq!(bundle.versions_newer_than(v("2024-03-01")).count(), 0);
    }

    #[test]
    fn test_bundle_validation() {
        assert!(matches!(VersionBundle::new(vec![]), Err(BundleError::Empty)));

        let err = VersionBundle::new(vec![Version::new(v("2024-01-01")), Version::new(v("2024-01-01"))]);
        assert!(matches!(err, Err(BundleError::Duplicate(_))));

        let err = VersionBundle::new(vec![
            Version::new(v("2024-01-01")).change(change("A")),
            Version::new(v("2024-02-01")),
        ]);
        assert!(matches!(err, Err(BundleError::NotSorted { .. })));

        let err = VersionBundle::new(vec![Version::new(v("2024-01-01")).change(change("A"))]);
        assert!(matches!(err, Err(BundleError::OldestHasChanges(_))));

        let err = VersionBundle::new(vec![
            Version::new(v("2024-03-01")).change(change("A")),
            Version::new(v("2024-02-01")).change(change("A")),
            Version::new(v("2024-01-01")),
        ]);
        assert!(matches!(err, Err(BundleError::ChangeBoundTwice(name)) if name == "A"));

        let err = VersionBundle::new(vec![
            Version::new(v("2024-02-01")).change(VersionChange::new("Quiet")),
            Version::new(v("2024-01-01")),
        ]);
        assert!(matches!(err, Err(BundleError::MissingDescription(_))));
    }
}
