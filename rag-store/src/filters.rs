//! Qdrant filters scoping points to one document namespace.

use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};

/// Payload field holding the namespace (keyword-indexed).
pub const NAMESPACE_FIELD: &str = "namespace";
/// Payload field distinguishing chunk points from the completion marker.
pub const KIND_FIELD: &str = "kind";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    Chunk,
    Marker,
}

impl PointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PointKind::Chunk => "chunk",
            PointKind::Marker => "marker",
        }
    }
}

/// Exact keyword equality, never a full-text match.
fn keyword(field: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}

/// `namespace == ns AND kind == kind`.
pub fn namespace_filter(namespace: &str, kind: PointKind) -> Filter {
    Filter {
        must: vec![
            keyword(NAMESPACE_FIELD, namespace),
            keyword(KIND_FIELD, kind.as_str()),
        ],
        ..Default::default()
    }
}

/// `(field, keyword)` pairs of a filter's `must` clause.
#[cfg(test)]
pub(crate) fn must_keywords(filter: &Filter) -> Vec<(String, String)> {
    filter
        .must
        .iter()
        .filter_map(|c| match c.condition_one_of.as_ref()? {
            ConditionOneOf::Field(f) => match f.r#match.as_ref()?.match_value.as_ref()? {
                MatchValue::Keyword(v) => Some((f.key.clone(), v.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn marker_and_chunk_filters_differ_only_in_kind() {
        let marker = namespace_filter("doc-1", PointKind::Marker);
        assert_eq!(
            must_keywords(&marker),
            vec![pair("namespace", "doc-1"), pair("kind", "marker")]
        );

        let chunk = namespace_filter("doc-1", PointKind::Chunk);
        assert_eq!(
            must_keywords(&chunk),
            vec![pair("namespace", "doc-1"), pair("kind", "chunk")]
        );
        assert!(chunk.should.is_empty() && chunk.must_not.is_empty());
    }

    #[test]
    fn namespaces_with_spaces_stay_exact() {
        let f = namespace_filter("my doc", PointKind::Chunk);
        assert_eq!(must_keywords(&f)[0], pair("namespace", "my doc"));
    }
}
