//! Predicate query builder for document lookups.
//!
//! Predicates are composable boolean expressions over document fields.
//! They are the only query language that crosses the store boundary;
//! backends translate them into their native query syntax, so callers
//! never depend on a specific storage engine.

use serde_json::Value;

/// A boolean expression over the fields of a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Scalar equality. A `null` value matches documents where the field
    /// is absent or explicitly null.
    Eq {
        /// The document field name.
        field: String,
        /// The value to compare against.
        value: Value,
    },
    /// Scalar set-membership: the field value equals one of the given values.
    In {
        /// The document field name.
        field: String,
        /// The candidate values.
        values: Vec<Value>,
    },
    /// Array overlap: the field is an array containing at least one of the
    /// given values.
    AnyOf {
        /// The document field name.
        field: String,
        /// The candidate values.
        values: Vec<Value>,
    },
    /// Numeric less-than comparison.
    Lt {
        /// The document field name.
        field: String,
        /// The exclusive upper bound.
        value: Value,
    },
    /// Numeric greater-than-or-equal comparison.
    Gte {
        /// The document field name.
        field: String,
        /// The inclusive lower bound.
        value: Value,
    },
    /// Conjunction. `All([])` matches every document.
    All(Vec<Predicate>),
    /// Disjunction. `Any([])` matches no document.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Starts building a predicate on the given field.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Field {
        Field { name: name.into() }
    }

    /// A predicate that matches every document.
    #[must_use]
    pub fn always() -> Self {
        Self::All(Vec::new())
    }

    /// Combines this predicate with another under conjunction.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::All(mut parts) => {
                parts.push(other);
                Self::All(parts)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Combines this predicate with another under disjunction.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Any(mut parts) => {
                parts.push(other);
                Self::Any(parts)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Evaluates this predicate against a JSON document.
    ///
    /// This is the reference semantics every backend must reproduce. The
    /// in-memory backend evaluates predicates with it directly.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Eq { field, value } => match doc.get(field) {
                Some(found) => found == value,
                None => value.is_null(),
            },
            Self::In { field, values } => doc
                .get(field)
                .is_some_and(|found| values.iter().any(|v| v == found)),
            Self::AnyOf { field, values } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| values.contains(item))),
            Self::Lt { field, value } => compare_numeric(doc.get(field), value)
                .is_some_and(|ordering| ordering == std::cmp::Ordering::Less),
            Self::Gte { field, value } => compare_numeric(doc.get(field), value)
                .is_some_and(|ordering| ordering != std::cmp::Ordering::Less),
            Self::All(parts) => parts.iter().all(|p| p.matches(doc)),
            Self::Any(parts) => parts.iter().any(|p| p.matches(doc)),
        }
    }
}

/// A named field, the entry point of the builder.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
}

impl Field {
    /// Equality on this field.
    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        Predicate::Eq {
            field: self.name,
            value: value.into(),
        }
    }

    /// Matches documents where this field is absent or null.
    #[must_use]
    pub fn is_null(self) -> Predicate {
        Predicate::Eq {
            field: self.name,
            value: Value::Null,
        }
    }

    /// Set-membership on this scalar field.
    #[must_use]
    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In {
            field: self.name,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Array overlap on this array field.
    #[must_use]
    pub fn any_of<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::AnyOf {
            field: self.name,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Numeric less-than on this field.
    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        Predicate::Lt {
            field: self.name,
            value: value.into(),
        }
    }

    /// Numeric greater-than-or-equal on this field.
    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Predicate {
        Predicate::Gte {
            field: self.name,
            value: value.into(),
        }
    }
}

fn compare_numeric(found: Option<&Value>, bound: &Value) -> Option<std::cmp::Ordering> {
    let found = found?;
    if let (Some(a), Some(b)) = (found.as_i64(), bound.as_i64()) {
        return Some(a.cmp(&b));
    }
    let a = found.as_f64()?;
    let b = bound.as_f64()?;
    a.partial_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_matches() {
        let doc = json!({"clientId": "app", "enabled": true});
        assert!(Predicate::field("clientId").eq("app").matches(&doc));
        assert!(!Predicate::field("clientId").eq("other").matches(&doc));
        assert!(Predicate::field("enabled").eq(true).matches(&doc));
    }

    #[test]
    fn test_eq_null_matches_absent_field() {
        let doc = json!({"key": "k1"});
        assert!(Predicate::field("subjectId").is_null().matches(&doc));
        assert!(
            Predicate::field("subjectId")
                .is_null()
                .matches(&json!({"subjectId": null}))
        );
        assert!(
            !Predicate::field("subjectId")
                .is_null()
                .matches(&json!({"subjectId": "alice"}))
        );
    }

    #[test]
    fn test_in_matches() {
        let doc = json!({"name": "openid"});
        assert!(
            Predicate::field("name")
                .is_in(["openid", "profile"])
                .matches(&doc)
        );
        assert!(!Predicate::field("name").is_in(["profile"]).matches(&doc));
        let empty: [&str; 0] = [];
        assert!(!Predicate::field("name").is_in(empty).matches(&doc));
    }

    #[test]
    fn test_any_of_matches_array_overlap() {
        let doc = json!({"scopes": ["api1.read", "api1.write"]});
        assert!(
            Predicate::field("scopes")
                .any_of(["api1.read"])
                .matches(&doc)
        );
        assert!(
            Predicate::field("scopes")
                .any_of(["api2.read", "api1.write"])
                .matches(&doc)
        );
        assert!(
            !Predicate::field("scopes")
                .any_of(["api2.read"])
                .matches(&doc)
        );
        // Scalar fields never overlap
        assert!(
            !Predicate::field("name")
                .any_of(["x"])
                .matches(&json!({"name": "x"}))
        );
    }

    #[test]
    fn test_numeric_range() {
        let doc = json!({"expiration": 1000});
        assert!(Predicate::field("expiration").lt(2000).matches(&doc));
        assert!(!Predicate::field("expiration").lt(1000).matches(&doc));
        assert!(Predicate::field("expiration").gte(1000).matches(&doc));
        assert!(!Predicate::field("expiration").gte(1001).matches(&doc));
        // Missing field never satisfies a range bound
        assert!(!Predicate::field("missing").lt(2000).matches(&doc));
    }

    #[test]
    fn test_conjunction_and_disjunction() {
        let doc = json!({"clientId": "app", "subjectId": "alice"});
        let both = Predicate::field("clientId")
            .eq("app")
            .and(Predicate::field("subjectId").eq("alice"));
        assert!(both.matches(&doc));

        let miss = Predicate::field("clientId")
            .eq("app")
            .and(Predicate::field("subjectId").eq("bob"));
        assert!(!miss.matches(&doc));

        let either = Predicate::field("subjectId")
            .eq("bob")
            .or(Predicate::field("clientId").eq("app"));
        assert!(either.matches(&doc));
    }

    #[test]
    fn test_always_matches_everything() {
        assert!(Predicate::always().matches(&json!({})));
        assert!(Predicate::always().matches(&json!({"any": "doc"})));
        assert!(!Predicate::Any(Vec::new()).matches(&json!({})));
    }

    #[test]
    fn test_and_flattens_conjunctions() {
        let p = Predicate::field("a")
            .eq(1)
            .and(Predicate::field("b").eq(2))
            .and(Predicate::field("c").eq(3));
        match p {
            Predicate::All(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected All, got {other:?}"),
        }
    }
}
