//! Predicate-to-SQL compilation.
//!
//! Predicates compile to a parameterized `WHERE` clause over the JSONB
//! `doc` column. Field names are restricted to identifier characters and
//! values always travel as bind parameters, so no caller-provided data is
//! ever interpolated into SQL text.

use std::fmt::Write as _;

use serde_json::Value;

use keystone_store::{Predicate, StoreError};

/// A bind parameter for a compiled predicate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    TextArray(Vec<String>),
}

/// A compiled predicate: `WHERE` clause text plus its bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlPredicate {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

/// Compiles `predicate` into a clause whose first placeholder is
/// `$first_param`.
pub(crate) fn compile(predicate: &Predicate, first_param: usize) -> Result<SqlPredicate, StoreError> {
    let mut compiled = SqlPredicate {
        clause: String::new(),
        params: Vec::new(),
    };
    let mut next_param = first_param;
    compile_into(predicate, &mut compiled, &mut next_param)?;
    Ok(compiled)
}

fn compile_into(
    predicate: &Predicate,
    out: &mut SqlPredicate,
    next_param: &mut usize,
) -> Result<(), StoreError> {
    match predicate {
        Predicate::Eq { field, value } => {
            let field = checked_field(field)?;
            match value {
                Value::Null => {
                    let _ = write!(out.clause, "doc->>'{field}' IS NULL");
                }
                Value::String(text) => {
                    let n = push_param(out, next_param, SqlParam::Text(text.clone()));
                    let _ = write!(out.clause, "doc->>'{field}' = ${n}");
                }
                Value::Bool(flag) => {
                    let n = push_param(out, next_param, SqlParam::Bool(*flag));
                    let _ = write!(out.clause, "(doc->>'{field}')::boolean = ${n}");
                }
                Value::Number(_) => {
                    let n = push_param(out, next_param, numeric_param(value, field)?);
                    let _ = write!(out.clause, "(doc->>'{field}')::numeric = ${n}");
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(unsupported(field, "equality on a composite value"));
                }
            }
        }
        Predicate::In { field, values } => {
            let field = checked_field(field)?;
            let texts = text_values(values, field)?;
            let n = push_param(out, next_param, SqlParam::TextArray(texts));
            let _ = write!(out.clause, "doc->>'{field}' = ANY(${n})");
        }
        Predicate::AnyOf { field, values } => {
            let field = checked_field(field)?;
            let texts = text_values(values, field)?;
            let n = push_param(out, next_param, SqlParam::TextArray(texts));
            let _ = write!(out.clause, "doc->'{field}' ?| ${n}");
        }
        Predicate::Lt { field, value } => {
            compile_range(out, next_param, field, value, "<")?;
        }
        Predicate::Gte { field, value } => {
            compile_range(out, next_param, field, value, ">=")?;
        }
        Predicate::All(parts) => {
            compile_group(parts, out, next_param, " AND ", "TRUE")?;
        }
        Predicate::Any(parts) => {
            compile_group(parts, out, next_param, " OR ", "FALSE")?;
        }
    }
    Ok(())
}

fn compile_group(
    parts: &[Predicate],
    out: &mut SqlPredicate,
    next_param: &mut usize,
    separator: &str,
    empty: &str,
) -> Result<(), StoreError> {
    if parts.is_empty() {
        out.clause.push_str(empty);
        return Ok(());
    }
    out.clause.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            out.clause.push_str(separator);
        }
        compile_into(part, out, next_param)?;
    }
    out.clause.push(')');
    Ok(())
}

fn compile_range(
    out: &mut SqlPredicate,
    next_param: &mut usize,
    field: &str,
    value: &Value,
    operator: &str,
) -> Result<(), StoreError> {
    let field = checked_field(field)?;
    let n = push_param(out, next_param, numeric_param(value, field)?);
    let _ = write!(out.clause, "(doc->>'{field}')::numeric {operator} ${n}");
    Ok(())
}

fn push_param(out: &mut SqlPredicate, next_param: &mut usize, param: SqlParam) -> usize {
    out.params.push(param);
    let n = *next_param;
    *next_param += 1;
    n
}

fn numeric_param(value: &Value, field: &str) -> Result<SqlParam, StoreError> {
    if let Some(int) = value.as_i64() {
        Ok(SqlParam::Int(int))
    } else if let Some(float) = value.as_f64() {
        Ok(SqlParam::Float(float))
    } else {
        Err(unsupported(field, "a non-numeric range bound"))
    }
}

fn text_values(values: &[Value], field: &str) -> Result<Vec<String>, StoreError> {
    values
        .iter()
        .map(|value| match value {
            Value::String(text) => Ok(text.clone()),
            other => other
                .as_i64()
                .map(|int| int.to_string())
                .ok_or_else(|| unsupported(field, "a non-scalar membership value")),
        })
        .collect()
}

fn checked_field<'a>(field: &'a str) -> Result<&'a str, StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(field)
    } else {
        Err(StoreError::backend(format!(
            "invalid predicate field name '{field}'"
        )))
    }
}

fn unsupported(field: &str, what: &str) -> StoreError {
    StoreError::backend(format!("predicate on field '{field}' uses {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_string_equality() {
        let compiled = compile(&Predicate::field("clientId").eq("app"), 1).unwrap();
        assert_eq!(compiled.clause, "doc->>'clientId' = $1");
        assert_eq!(compiled.params, vec![SqlParam::Text("app".into())]);
    }

    #[test]
    fn test_compile_null_equality_has_no_param() {
        let compiled = compile(&Predicate::field("subjectId").is_null(), 1).unwrap();
        assert_eq!(compiled.clause, "doc->>'subjectId' IS NULL");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_compile_conjunction_numbers_params() {
        let predicate = Predicate::field("subjectId")
            .eq("alice")
            .and(Predicate::field("clientId").eq("app"))
            .and(Predicate::field("type").eq("refresh_token"));
        let compiled = compile(&predicate, 1).unwrap();
        assert_eq!(
            compiled.clause,
            "(doc->>'subjectId' = $1 AND doc->>'clientId' = $2 AND doc->>'type' = $3)"
        );
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_compile_respects_first_param_offset() {
        let compiled = compile(&Predicate::field("clientId").eq("app"), 2).unwrap();
        assert_eq!(compiled.clause, "doc->>'clientId' = $2");
    }

    #[test]
    fn test_compile_membership_and_overlap() {
        let compiled = compile(&Predicate::field("name").is_in(["openid", "profile"]), 1).unwrap();
        assert_eq!(compiled.clause, "doc->>'name' = ANY($1)");
        assert_eq!(
            compiled.params,
            vec![SqlParam::TextArray(vec!["openid".into(), "profile".into()])]
        );

        let compiled = compile(&Predicate::field("scopes").any_of(["api1.read"]), 1).unwrap();
        assert_eq!(compiled.clause, "doc->'scopes' ?| $1");
    }

    #[test]
    fn test_compile_numeric_range() {
        let compiled = compile(&Predicate::field("expiration").lt(1_700_000_000_i64), 1).unwrap();
        assert_eq!(compiled.clause, "(doc->>'expiration')::numeric < $1");
        assert_eq!(compiled.params, vec![SqlParam::Int(1_700_000_000)]);
    }

    #[test]
    fn test_compile_empty_groups() {
        let compiled = compile(&Predicate::always(), 1).unwrap();
        assert_eq!(compiled.clause, "TRUE");

        let compiled = compile(&Predicate::Any(Vec::new()), 1).unwrap();
        assert_eq!(compiled.clause, "FALSE");
    }

    #[test]
    fn test_compile_rejects_malformed_field_names() {
        let predicate = Predicate::field("doc'; DROP TABLE clients; --").eq("x");
        assert!(compile(&predicate, 1).is_err());
    }
}
