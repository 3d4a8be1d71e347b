//! # Documents and queries
//!
//! A [`crate::DocumentStore`] keeps JSON objects ([`Document`]) keyed by id
//! inside named collections. Reads go through a [`Query`]: a conjunction of
//! [`Filter`]s, an optional sort on one field, and an offset/limit window.
//!
//! | Piece | Meaning |
//! |-------|---------|
//! | [`Filter::Eq`] | field equals value |
//! | [`Filter::Gte`] / [`Filter::Lte`] | inclusive range bound on a field |
//! | [`Query::order_by`] | sort on a field; documents missing the field are dropped, ties break on id |
//! | [`Query::offset`] / [`Query::limit`] | window applied after sorting |
//!
//! [`Query::apply`] is the single evaluator. Every store implementation hands
//! its candidate documents to it, so the memory and file stores always agree.

use std::cmp::Ordering;

use serde_json::Value;

/// A stored JSON object.
pub type Document = serde_json::Map<String, Value>;

/// A document together with the id it is stored under.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Document,
}

/// One predicate on a document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
}

impl Filter {
    /// Whether `doc` satisfies this predicate. A missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(field, value) => {
                field_cmp(doc, field, value).is_some_and(|o| o == Ordering::Equal)
            }
            Filter::Gte(field, value) => {
                field_cmp(doc, field, value).is_some_and(|o| o != Ordering::Less)
            }
            Filter::Lte(field, value) => {
                field_cmp(doc, field, value).is_some_and(|o| o != Ordering::Greater)
            }
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::Gte(field, _) | Filter::Lte(field, _) => field,
        }
    }
}

fn field_cmp(doc: &Document, field: &str, value: &Value) -> Option<Ordering> {
    compare_values(doc.get(field)?, value)
}

/// Ordering between two JSON scalars of the same kind. Values of different
/// kinds (or arrays/objects) are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A conjunctive query over one collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order_by: Option<(String, Direction)>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn where_gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(field.to_string(), value.into()));
        self
    }

    pub fn where_lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether `doc` satisfies every filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, sort and window a set of candidate documents.
    pub fn apply(&self, docs: impl IntoIterator<Item = Snapshot>) -> Vec<Snapshot> {
        let mut hits: Vec<Snapshot> = docs.into_iter().filter(|s| self.matches(&s.data)).collect();

        if let Some((field, direction)) = &self.order_by {
            hits.retain(|s| s.data.contains_key(field));
            hits.sort_by(|a, b| {
                let by_field = match (a.data.get(field), b.data.get(field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                let by_field = match direction {
                    Direction::Ascending => by_field,
                    Direction::Descending => by_field.reverse(),
                };
                by_field.then_with(|| a.id.cmp(&b.id))
            });
        } else {
            hits.sort_by(|a, b| a.id.cmp(&b.id));
        }

        let windowed = hits.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => windowed.take(limit).collect(),
            None => windowed.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(id: &str, value: Value) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            data: value.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let docs = vec![
            snap("a", json!({"userId": "u1", "dateAdded": 10})),
            snap("b", json!({"userId": "u1", "dateAdded": 30})),
            snap("c", json!({"userId": "u2", "dateAdded": 20})),
        ];
        let query = Query::new()
            .where_eq("userId", "u1")
            .where_gte("dateAdded", 5)
            .where_lte("dateAdded", 20);

        let hits = query.apply(docs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let docs = vec![
            snap("a", json!({"dateAdded": 10})),
            snap("b", json!({"dateAdded": 20})),
        ];
        let hits = Query::new()
            .where_gte("dateAdded", 10)
            .where_lte("dateAdded", 20)
            .apply(docs);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_descending_order_with_id_tiebreak_and_window() {
        let docs = vec![
            snap("b", json!({"dateAdded": 5})),
            snap("a", json!({"dateAdded": 5})),
            snap("c", json!({"dateAdded": 9})),
            snap("d", json!({"other": true})),
        ];
        let query = Query::new().order_by("dateAdded", Direction::Descending);
        let ids: Vec<_> = query.apply(docs.clone()).into_iter().map(|s| s.id).collect();
        // "d" has no dateAdded and is dropped by the sort
        assert_eq!(ids, vec!["c", "a", "b"]);

        let ids: Vec<_> = query
            .offset(1)
            .limit(1)
            .apply(docs)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_mixed_kinds_never_match() {
        let doc = json!({"dateAdded": "10"}).as_object().cloned().unwrap();
        assert!(!Filter::Gte("dateAdded".into(), json!(1)).matches(&doc));
        assert!(!Filter::Eq("missing".into(), json!(1)).matches(&doc));
    }

    #[test]
    fn test_float_and_integer_compare() {
        assert_eq!(compare_values(&json!(1.5), &json!(1)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(-3), &json!(-3.0)), Some(Ordering::Equal));
    }
}
