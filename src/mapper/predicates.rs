//! Ontology predicates understood by the concept annotation model.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Full predicate URI paired with its short name.
pub const PREDICATES: [(&str, &str); 6] = [
    (
        "http://www.ft.com/ontology/classification/isClassifiedBy",
        "isClassifiedBy",
    ),
    (
        "http://www.ft.com/ontology/annotation/hasAuthor",
        "hasAuthor",
    ),
    (
        "http://www.ft.com/ontology/annotation/hasContributor",
        "hasContributor",
    ),
    ("http://www.ft.com/ontology/annotation/about", "about"),
    (
        "http://www.ft.com/ontology/annotation/hasDisplayTag",
        "hasDisplayTag",
    ),
    ("http://www.ft.com/ontology/annotation/mentions", "mentions"),
];

static PREDICATE_TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| PREDICATES.into_iter().collect());

/// Returns the short name for a predicate URI.
///
/// Matching is exact and case-sensitive.
pub fn short_name(predicate_uri: &str) -> Option<&'static str> {
    PREDICATE_TABLE.get(predicate_uri).copied()
}
