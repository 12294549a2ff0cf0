//! Profile file parsing.
//!
//! Parses TOML profile definitions into [`MetadataProfile`] values. The TOML
//! schema mirrors the runtime types closely, so the raw structs here exist
//! mainly to keep field optionality out of the public API.

use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;

use crate::{MetadataProfile, ProfileElement, ProfileError};

/// Raw profile as parsed directly from a TOML file.
#[derive(Debug, Clone, Deserialize)]
struct RawProfile {
    /// Profile name.
    name: String,
    /// Element definitions in display order.
    #[serde(default, rename = "element")]
    elements: Vec<RawElement>,
}

/// Raw element definition from TOML.
#[derive(Debug, Clone, Deserialize)]
struct RawElement {
    /// Engine field name.
    name: String,
    /// Human-readable label (defaults to the field name).
    label: Option<String>,
    /// Relevance weight for free-text queries.
    weight: Option<f32>,
    /// Whether the element participates in free-text search.
    #[serde(default = "default_true")]
    searchable: bool,
    /// Whether the element is offered as a facet.
    #[serde(default)]
    facetable: bool,
}

/// Serde default helper for flags that default to true.
fn default_true() -> bool {
    true
}

/// Parses a profile file from disk.
pub fn parse_profile_file(path: &Path) -> Result<MetadataProfile, ProfileError> {
    let contents = fs::read_to_string(path).map_err(|source| ProfileError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_profile_str(&contents, path)
}

/// Parses a profile from a TOML string.
///
/// The `path` parameter is used for error reporting only.
pub fn parse_profile_str(contents: &str, path: &Path) -> Result<MetadataProfile, ProfileError> {
    let raw: RawProfile =
        toml::from_str(contents).map_err(|source| ProfileError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut elements = Vec::with_capacity(raw.elements.len());

    for element in raw.elements {
        if !seen.insert(element.name.clone()) {
            return Err(ProfileError::DuplicateElement {
                profile: raw.name,
                element: element.name,
            });
        }
        if let Some(weight) = element.weight
            && weight <= 0.0
        {
            return Err(ProfileError::InvalidWeight {
                element: element.name,
                weight,
            });
        }

        let label = element.label.unwrap_or_else(|| element.name.clone());
        elements.push(ProfileElement {
            name: element.name,
            label,
            weight: element.weight,
            searchable: element.searchable,
            facetable: element.facetable,
        });
    }

    Ok(MetadataProfile {
        name: raw.name,
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_profile() {
        let profile = parse_profile_str("name = \"default\"\n", Path::new("p.toml")).unwrap();
        assert_eq!(profile.name, "default");
        assert!(profile.elements.is_empty());
    }

    #[test]
    fn parse_full_profile() {
        let toml = r#"
name = "engineering"

[[element]]
name = "title"
label = "Title"
weight = 10.0

[[element]]
name = "subject"
facetable = true

[[element]]
name = "internal_notes"
searchable = false
"#;
        let profile = parse_profile_str(toml, Path::new("p.toml")).unwrap();
        assert_eq!(profile.name, "engineering");
        assert_eq!(profile.elements.len(), 3);

        let title = &profile.elements[0];
        assert_eq!(title.label, "Title");
        assert_eq!(title.weight, Some(10.0));
        assert!(title.searchable);
        assert!(!title.facetable);

        let subject = &profile.elements[1];
        assert_eq!(subject.label, "subject");
        assert!(subject.facetable);

        assert!(!profile.elements[2].searchable);
    }

    #[test]
    fn duplicate_element_rejected() {
        let toml = r#"
name = "p"

[[element]]
name = "title"

[[element]]
name = "title"
"#;
        let err = parse_profile_str(toml, Path::new("p.toml")).unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateElement { .. }));
    }

    #[test]
    fn non_positive_weight_rejected() {
        let toml = r#"
name = "p"

[[element]]
name = "title"
weight = 0.0
"#;
        let err = parse_profile_str(toml, Path::new("p.toml")).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidWeight { .. }));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let result = parse_profile_str("not valid [[[", Path::new("broken.toml"));
        assert!(matches!(result, Err(ProfileError::ParseToml { .. })));
    }

    #[test]
    fn parse_profile_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        fs::write(&path, "name = \"ondisk\"\n").unwrap();

        let profile = parse_profile_file(&path).unwrap();
        assert_eq!(profile.name, "ondisk");
    }

    #[test]
    fn parse_profile_file_not_found() {
        let result = parse_profile_file(Path::new("/nonexistent/profile.toml"));
        assert!(matches!(result, Err(ProfileError::ReadFile { .. })));
    }
}
