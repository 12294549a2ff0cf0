//! Metadata profiles and institution scoping for atrium.
//!
//! A [`MetadataProfile`] describes the searchable and facetable elements of
//! an institution's records together with their relevance weights. Profiles
//! are defined in TOML files and resolved once at startup; query compilation
//! reads them but never mutates them.

#![warn(missing_docs)]

mod error;
mod parse;

pub use error::ProfileError;
pub use parse::{parse_profile_file, parse_profile_str};

/// Relevance weight applied to searchable fields without an explicit weight.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Engine field holding the analyzed full text of a record.
///
/// Always appended to the weighted field list for free-text queries, so a
/// profile that names no searchable elements still matches on extracted text.
pub const FULL_TEXT_FIELD: &str = "full_text";

/// Engine field holding the owning institution's key.
pub const INSTITUTION_KEY_FIELD: &str = "institution_key";

/// One metadata element of a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileElement {
    /// Engine field name (analyzed variant).
    pub name: String,
    /// Human-readable label, used for facet display.
    pub label: String,
    /// Relevance weight for free-text queries; `None` uses [`DEFAULT_WEIGHT`].
    pub weight: Option<f32>,
    /// Whether the element participates in weighted free-text search.
    pub searchable: bool,
    /// Whether the element is offered as a facet.
    pub facetable: bool,
}

impl ProfileElement {
    /// Creates a searchable, non-facetable element with no explicit weight.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            weight: None,
            searchable: true,
            facetable: false,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the relevance weight.
    #[must_use]
    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Marks the element facetable.
    #[must_use]
    pub fn facetable(mut self) -> Self {
        self.facetable = true;
        self
    }

    /// Marks the element as excluded from free-text search.
    #[must_use]
    pub fn unsearchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// Returns the keyword-suffixed variant of the field name.
    ///
    /// The index stores each element twice: an analyzed variant under the
    /// plain name for full-text matching, and an untokenized `.keyword`
    /// variant for exact matching and facet aggregation.
    pub fn keyword_field(&self) -> String {
        format!("{}.keyword", self.name)
    }

    /// Renders the field annotated with its relevance weight (`field^weight`).
    pub fn weighted_field(&self) -> String {
        format!("{}^{}", self.name, self.weight.unwrap_or(DEFAULT_WEIGHT))
    }
}

/// A named, ordered set of metadata elements.
///
/// Element order is significant: facets are assembled and presented in
/// profile order, not in engine response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataProfile {
    /// Profile name.
    pub name: String,
    /// Elements in display order.
    pub elements: Vec<ProfileElement>,
}

impl MetadataProfile {
    /// Creates an empty profile with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// Adds an element, preserving insertion order.
    #[must_use]
    pub fn element(mut self, element: ProfileElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Returns the facetable elements in profile order.
    pub fn facetable_elements(&self) -> impl Iterator<Item = &ProfileElement> {
        self.elements.iter().filter(|e| e.facetable)
    }

    /// Returns the weighted field list for free-text queries.
    ///
    /// Searchable elements in profile order, each rendered `field^weight`,
    /// followed by the full-text field at the default weight.
    pub fn weighted_query_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .elements
            .iter()
            .filter(|e| e.searchable)
            .map(ProfileElement::weighted_field)
            .collect();
        fields.push(format!("{FULL_TEXT_FIELD}^{DEFAULT_WEIGHT}"));
        fields
    }
}

/// An institution (tenant) with its default metadata profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Institution {
    /// Stable tenant key, stored on every indexed document.
    pub key: String,
    /// Profile adopted by queries scoped to this institution when no
    /// profile was set explicitly.
    pub default_profile: MetadataProfile,
}

impl Institution {
    /// Creates an institution with the given key and default profile.
    pub fn new(key: impl Into<String>, default_profile: MetadataProfile) -> Self {
        Self {
            key: key.into(),
            default_profile,
        }
    }
}
