//! Static safety and schema-conformance gate for generated queries.
//!
//! Rules run in a fixed order and the first violation wins:
//! 1. a MATCH clause must be present (`NotAQuery`)
//! 2. no write keyword anywhere in the text (`WriteOperationForbidden`)
//! 3. node labels must exist (`UnknownLabel`)
//! 4. relationship types must exist (`UnknownRelationshipType`)
//! 5. `alias.property` names must exist on some label (`UnknownProperty`)
//! 6. variable-length hops must be bounded (`UnboundedPath`)
//!
//! Everything here is lexical. Rule 2 scans the raw text, so a write keyword
//! inside a string literal or identifier is rejected too. Rules 3-6 scan the
//! text with string literals blanked out.

use once_cell::sync::Lazy;
use regex::Regex;

use kratos_core::error::Result;
use kratos_core::{ErrorKind, SchemaSnapshot, ValidationOutcome};

/// Write keywords, matched case-insensitively as substrings.
pub const FORBIDDEN_OPERATIONS: &[&str] = &["create", "merge", "delete", "set", "drop", "remove"];

static READ_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmatch\b").unwrap());

/// `(alias:Label:Other`, capturing the label chain.
static NODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(?:[A-Za-z_]\w*)?\s*((?::\s*(?:`[^`]+`|[A-Za-z_]\w*)\s*)+)").unwrap()
});

static LABEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*(`[^`]+`|[A-Za-z_]\w*)").unwrap());

/// `[alias:TYPE|OTHER`, capturing the type alternation.
static REL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[\s*(?:[A-Za-z_]\w*)?\s*:\s*((?:`[^`]+`|[A-Za-z_]\w*)(?:\s*\|\s*:?\s*(?:`[^`]+`|[A-Za-z_]\w*))*)",
    )
    .unwrap()
});

static PROPERTY_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_]\w*\.([A-Za-z_]\w*)").unwrap());

/// Relationship brackets attached to an edge: `-[...]`.
static REL_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*(\[[^\[\]]*\])").unwrap());

static HOP_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\s*(\d+)?\s*(\.\.\s*(\d+)?)?").unwrap());

/// Knobs on top of the fixed rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Largest allowed upper bound on `*min..max` hops. `None` disables rule 6.
    pub max_path_hops: Option<u32>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_path_hops: Some(5),
        }
    }
}

/// A query that passed every rule. Only the validator can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery(String);

impl ValidatedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryValidator {
    policy: ValidationPolicy,
}

impl QueryValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Check `query` against `schema`. Pure: no I/O.
    pub fn validate(&self, query: &str, schema: &SchemaSnapshot) -> ValidationOutcome {
        if !READ_CLAUSE.is_match(query) {
            return ValidationOutcome::rejected(ErrorKind::NotAQuery, "query has no MATCH clause");
        }

        if let Some(token) = find_forbidden_operation(query) {
            return ValidationOutcome::rejected(ErrorKind::WriteOperationForbidden, token);
        }

        let masked = mask_string_literals(query);

        if let Some(label) = extract_labels(&masked)
            .into_iter()
            .find(|l| !schema.has_label(l))
        {
            return ValidationOutcome::rejected(ErrorKind::UnknownLabel, label);
        }

        if let Some(rel_type) = extract_relationship_types(&masked)
            .into_iter()
            .find(|r| !schema.has_relationship_type(r))
        {
            return ValidationOutcome::rejected(ErrorKind::UnknownRelationshipType, rel_type);
        }

        if let Some(property) = extract_properties(&masked)
            .into_iter()
            .find(|p| !schema.has_property(p))
        {
            return ValidationOutcome::rejected(ErrorKind::UnknownProperty, property);
        }

        if let Some(max_hops) = self.policy.max_path_hops {
            if let Some(pattern) = find_unbounded_path(&masked, max_hops) {
                return ValidationOutcome::rejected(ErrorKind::UnboundedPath, pattern);
            }
        }

        ValidationOutcome::Accepted
    }

    /// Validate and, on acceptance, wrap the query for execution.
    pub fn admit(&self, query: &str, schema: &SchemaSnapshot) -> Result<ValidatedQuery> {
        self.validate(query, schema).into_result()?;
        Ok(ValidatedQuery(query.to_string()))
    }
}

/// Validate with the default policy.
pub fn validate(query: &str, schema: &SchemaSnapshot) -> ValidationOutcome {
    QueryValidator::default().validate(query, schema)
}

/// Earliest forbidden keyword in the text, lowercased.
pub fn find_forbidden_operation(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    FORBIDDEN_OPERATIONS
        .iter()
        .filter_map(|token| lower.find(token).map(|pos| (pos, *token)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, token)| token)
}

/// Node labels in order of appearance.
pub fn extract_labels(query: &str) -> Vec<String> {
    NODE_PATTERN
        .captures_iter(query)
        .flat_map(|caps| {
            LABEL_NAME
                .captures_iter(&caps[1])
                .map(|l| unquote(&l[1]))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Relationship types in order of appearance, alternations expanded.
pub fn extract_relationship_types(query: &str) -> Vec<String> {
    REL_PATTERN
        .captures_iter(query)
        .flat_map(|caps| {
            caps[1]
                .split('|')
                .map(|t| unquote(t.trim().trim_start_matches(':').trim()))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Property names from `alias.property` references, in order of appearance.
pub fn extract_properties(query: &str) -> Vec<String> {
    PROPERTY_REF
        .captures_iter(query)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// First relationship bracket whose hop count is unbounded or above `max_hops`.
fn find_unbounded_path(query: &str, max_hops: u32) -> Option<String> {
    for caps in REL_BRACKET.captures_iter(query) {
        let bracket = &caps[1];
        let Some(hops) = HOP_RANGE.captures(bracket) else {
            continue;
        };

        let upper = match (hops.get(1), hops.get(2), hops.get(3)) {
            // `*min..max` or `*..max`
            (_, Some(_), Some(max)) => max.as_str().parse::<u32>().ok(),
            // `*min..`
            (_, Some(_), None) => None,
            // `*n`
            (Some(exact), None, _) => exact.as_str().parse::<u32>().ok(),
            // `*`
            (None, None, _) => None,
        };

        match upper {
            Some(n) if n <= max_hops => {}
            _ => return Some(bracket.to_string()),
        }
    }
    None
}

fn unquote(name: &str) -> String {
    name.trim_matches('`').to_string()
}

/// Blank out the contents of '...' and "..." literals, keeping byte offsets.
///
/// Backtick-quoted identifiers are copied through untouched; quotes inside
/// them do not open a literal.
fn mask_string_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in query.chars() {
        match quote {
            None => {
                if c == '\'' || c == '"' || c == '`' {
                    quote = Some(c);
                }
                out.push(c);
            }
            Some('`') => {
                if c == '`' {
                    quote = None;
                }
                out.push(c);
            }
            Some(q) => {
                if escaped {
                    escaped = false;
                    push_blank(&mut out, c);
                } else if c == '\\' {
                    escaped = true;
                    push_blank(&mut out, c);
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    push_blank(&mut out, c);
                }
            }
        }
    }
    out
}

fn push_blank(out: &mut String, c: char) {
    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn schema() -> SchemaSnapshot {
        let mut props = BTreeMap::new();
        props.insert(
            "Person".to_string(),
            BTreeSet::from(["name".to_string(), "born".to_string()]),
        );
        props.insert(
            "Project".to_string(),
            BTreeSet::from(["title".to_string()]),
        );
        SchemaSnapshot::new(
            ["Person".to_string(), "Project".to_string()],
            ["WORKS_ON".to_string(), "KNOWS".to_string()],
            props,
        )
    }

    fn rejection(query: &str) -> (ErrorKind, String) {
        match validate(query, &schema()) {
            ValidationOutcome::Rejected { reason, detail } => (reason, detail),
            ValidationOutcome::Accepted => panic!("expected rejection for {query}"),
        }
    }

    #[test]
    fn accepts_simple_lookup() {
        let q = "MATCH (n:Person) WHERE n.name = 'Rahul' RETURN n";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn accepts_aliased_relationship_with_whitespace() {
        let q = "MATCH ( p : Person {name: 'Rahul'} ) - [ r : WORKS_ON ] -> (proj:Project)\n\
                 RETURN proj.title";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn missing_match_is_not_a_query() {
        assert_eq!(rejection("RETURN 1").0, ErrorKind::NotAQuery);
        // Ordering: structure is checked before the denylist.
        assert_eq!(rejection("CREATE (n:Robot)").0, ErrorKind::NotAQuery);
    }

    #[test]
    fn write_keywords_are_forbidden_in_any_case_and_position() {
        for (query, token) in [
            ("MATCH (n:Person) DELETE n", "delete"),
            ("MATCH (n:Person) DETACH delete n", "delete"),
            ("match (n:Person) SeT n.name = 'x'", "set"),
            ("MATCH (n:Person) MERGE (m:Person {name: 'x'})", "merge"),
            ("MATCH (n) CALL { CREATE (x) } RETURN n", "create"),
            ("MATCH (n:Person) REMOVE n.born", "remove"),
            ("MATCH (n) RETURN n // DROP INDEX", "drop"),
        ] {
            assert_eq!(
                rejection(query),
                (ErrorKind::WriteOperationForbidden, token.to_string()),
                "{query}"
            );
        }
    }

    #[test]
    fn earliest_forbidden_keyword_is_reported() {
        let (_, token) = rejection("MATCH (n:Person) SET n.born = 1 DELETE n");
        assert_eq!(token, "set");
    }

    #[test]
    fn keyword_inside_literal_is_still_rejected() {
        let (kind, token) = rejection("MATCH (n:Person) WHERE n.name = 'Delete Me' RETURN n");
        assert_eq!(kind, ErrorKind::WriteOperationForbidden);
        assert_eq!(token, "delete");
    }

    #[test]
    fn first_unknown_label_in_pattern_order() {
        let q = "MATCH (a:Person)-[:KNOWS]-(b:Robot), (c:Alien) RETURN a";
        assert_eq!(rejection(q), (ErrorKind::UnknownLabel, "Robot".to_string()));
    }

    #[test]
    fn every_label_in_a_chain_is_checked() {
        let q = "MATCH (a:Person:Employee) RETURN a";
        assert_eq!(rejection(q), (ErrorKind::UnknownLabel, "Employee".to_string()));
    }

    #[test]
    fn unknown_relationship_type() {
        let q = "MATCH (a:Person)-[r:MANAGES]->(b:Person) RETURN b";
        assert_eq!(
            rejection(q),
            (ErrorKind::UnknownRelationshipType, "MANAGES".to_string())
        );
    }

    #[test]
    fn relationship_alternation_is_expanded() {
        let q = "MATCH (a:Person)-[:KNOWS|FOLLOWS]-(b:Person) RETURN b";
        assert_eq!(
            rejection(q),
            (ErrorKind::UnknownRelationshipType, "FOLLOWS".to_string())
        );
    }

    #[test]
    fn property_check_is_loose_across_labels() {
        // `title` belongs to Project, yet is accepted on a Person alias.
        let q = "MATCH (n:Person) RETURN n.title";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn unknown_property() {
        let q = "MATCH (n:Person) WHERE n.salary > 10 RETURN n.name";
        assert_eq!(rejection(q), (ErrorKind::UnknownProperty, "salary".to_string()));
    }

    #[test]
    fn literals_do_not_contribute_references() {
        let q = "MATCH (n:Person) WHERE n.name = 'rahul@example.com (x:Ghost)' RETURN n";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn numbers_are_not_property_references() {
        let q = "MATCH (n:Person) WHERE n.born > 1990.5 RETURN n";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn bounded_variable_length_paths_pass() {
        for q in [
            "MATCH (a:Person)-[*1..3]-(b:Person) RETURN b",
            "MATCH (a:Person)-[r:KNOWS*..2]-(b:Person) RETURN b",
            "MATCH (a:Person)-[:KNOWS*2]-(b:Person) RETURN b",
        ] {
            assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted, "{q}");
        }
    }

    #[test]
    fn unbounded_paths_are_rejected_after_conformance() {
        for q in [
            "MATCH (a:Person)-[*]-(b:Person) RETURN b",
            "MATCH (a:Person)-[:KNOWS*2..]-(b:Person) RETURN b",
            "MATCH (a:Person)-[:KNOWS*1..20]-(b:Person) RETURN b",
        ] {
            assert_eq!(rejection(q).0, ErrorKind::UnboundedPath, "{q}");
        }
        // Conformance rules still run first.
        let q = "MATCH (a:Robot)-[*]-(b:Person) RETURN b";
        assert_eq!(rejection(q).0, ErrorKind::UnknownLabel);
    }

    #[test]
    fn multiplication_is_not_a_path() {
        let q = "MATCH (n:Person) RETURN [x IN [1, 2] | x * 100] AS xs";
        assert_eq!(validate(q, &schema()), ValidationOutcome::Accepted);
    }

    #[test]
    fn hop_rule_can_be_disabled() {
        let validator = QueryValidator::new(ValidationPolicy {
            max_path_hops: None,
        });
        let q = "MATCH (a:Person)-[*]-(b:Person) RETURN b";
        assert!(validator.validate(q, &schema()).is_accepted());
    }

    #[test]
    fn admit_wraps_accepted_queries_only() {
        let validator = QueryValidator::default();
        let ok = validator
            .admit("MATCH (n:Person) RETURN n", &schema())
            .unwrap();
        assert_eq!(ok.as_str(), "MATCH (n:Person) RETURN n");

        let err = validator
            .admit("MATCH (n:Person) DELETE n", &schema())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteOperationForbidden);
    }

    #[test]
    fn extraction_handles_backticks() {
        assert_eq!(
            extract_labels("MATCH (n:`Data Set`)-[:`FEEDS`]->(m) RETURN n"),
            vec!["Data Set".to_string()]
        );
        assert_eq!(
            extract_relationship_types("MATCH (n)-[:`FEEDS`]->(m) RETURN n"),
            vec!["FEEDS".to_string()]
        );
    }

    #[test]
    fn apostrophe_in_backticked_label_does_not_hide_later_labels() {
        let (kind, detail) =
            rejection("MATCH (n:`Rahul's`)-[:KNOWS]-(m:Robot) RETURN m");
        assert_eq!(kind, ErrorKind::UnknownLabel);
        assert_eq!(detail, "Rahul's");
    }

    #[test]
    fn apostrophe_in_backticked_type_does_not_hide_the_rest() {
        let (kind, detail) =
            rejection("MATCH (p:Person)-[:`O'KNOWS`]-(m:Robot) RETURN m.salary");
        assert_eq!(kind, ErrorKind::UnknownLabel);
        assert_eq!(detail, "Robot");

        let (kind, detail) =
            rejection("MATCH (p:Person)-[:`O'KNOWS`]-(m:Person) RETURN m.name");
        assert_eq!(kind, ErrorKind::UnknownRelationshipType);
        assert_eq!(detail, "O'KNOWS");
    }

    #[test]
    fn masking_keeps_backticked_identifiers() {
        let q = "MATCH (n:`Rahul's`) WHERE n.name = 'x' RETURN n";
        assert_eq!(
            mask_string_literals(q),
            "MATCH (n:`Rahul's`) WHERE n.name = ' ' RETURN n"
        );
    }

    #[test]
    fn masking_preserves_length() {
        let q = "WHERE n.name = 'a\\'b' AND m.x = \"é\"";
        assert_eq!(mask_string_literals(q).len(), q.len());
        assert!(!mask_string_literals(q).contains('é'));
    }
}
