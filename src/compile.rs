//! Query compiler: validated search documents → [`FilterExpr`].
//!
//! Each constraint of a [`QueryDescription`] becomes one conjunct:
//!
//! 1. the compound filter, textual operators only
//! 2. the free-text term, as "id is in the full-text hit set"
//! 3. one "has a matching property" constraint per property filter, typed
//!    by the filter value's classification
//!
//! The compiler never executes the query. It only consults the store to
//! confirm that every full-text hit still names a stored material.

use std::collections::BTreeSet;

use crate::error::CompileError;
use crate::filter::{FilterExpr, ValuePredicate};
use crate::fulltext::TextSearch;
use crate::operator::Operator;
use crate::schema::{CompoundFilter, PropertyFilter, SearchDocument};
use crate::store::MaterialStore;
use crate::value::{self, ValueKind};

/// Request-scoped description of one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescription {
    pub compound: Option<CompoundFilter>,
    /// Free-text term; blank terms are treated as absent.
    pub search: Option<String>,
    pub properties: Vec<PropertyFilter>,
}

impl QueryDescription {
    /// Combine a validated document with an optional free-text term.
    pub fn new(document: SearchDocument, term: Option<String>) -> Self {
        Self {
            compound: document.compound,
            search: term.filter(|t| !t.trim().is_empty()),
            properties: document.properties,
        }
    }
}

/// Compiles queries against a store and an optional full-text provider.
pub struct QueryCompiler<'a> {
    store: &'a dyn MaterialStore,
    search: Option<&'a dyn TextSearch>,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(store: &'a dyn MaterialStore, search: Option<&'a dyn TextSearch>) -> Self {
        Self { store, search }
    }

    /// Build the conjunctive filter for `query`.
    pub fn compile(&self, query: &QueryDescription) -> Result<FilterExpr, CompileError> {
        let mut filter = FilterExpr::All;

        if let Some(compound) = &query.compound {
            filter = filter.and(compile_compound(compound)?);
        }
        if let Some(term) = &query.search {
            filter = filter.and(self.compile_term(term)?);
        }
        for property in &query.properties {
            filter = filter.and(compile_property(property)?);
        }

        tracing::debug!(
            constraints = filter.constraint_count(),
            full_text = query.search.is_some(),
            "compiled search query"
        );
        Ok(filter)
    }

    fn compile_term(&self, term: &str) -> Result<FilterExpr, CompileError> {
        let search = self.search.ok_or_else(|| CompileError::SearchUnavailable {
            term: term.to_string(),
        })?;
        let mut ids = BTreeSet::new();
        for hit in search.raw_search(term)? {
            let stored = self
                .store
                .contains(hit.id)
                .map_err(|e| CompileError::Search {
                    message: format!("could not resolve hit {}: {e}", hit.id),
                })?;
            if !stored {
                return Err(CompileError::IndexOutOfSync { id: hit.id.get() });
            }
            ids.insert(hit.id);
        }
        Ok(FilterExpr::IdIn(ids))
    }
}

/// Resolve `token` and check it against `kind`.
///
/// `target` and `value` only feed the error message.
pub fn resolve_for(
    token: &str,
    kind: ValueKind,
    target: &str,
    value: &str,
) -> Result<Operator, CompileError> {
    let op = Operator::resolve(token).ok_or_else(|| CompileError::UnknownOperator {
        token: token.to_string(),
        target: target.to_string(),
    })?;
    if !op.permits(kind) {
        return Err(CompileError::OperatorMismatch {
            operator: token.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        });
    }
    Ok(op)
}

/// Compound names are always textual.
pub fn compile_compound(compound: &CompoundFilter) -> Result<FilterExpr, CompileError> {
    let op = resolve_for(
        &compound.logic,
        ValueKind::Textual,
        "compound name",
        &compound.value,
    )?;
    Ok(FilterExpr::Compound {
        op,
        value: compound.value.clone(),
    })
}

/// One self-contained "has at least one matching property" constraint.
pub fn compile_property(property: &PropertyFilter) -> Result<FilterExpr, CompileError> {
    let value = property.value.canonical();
    let kind = value::classify(&value);
    let target = format!("property \"{}\"", property.name);
    let op = resolve_for(&property.logic, kind, &target, &value)?;

    let predicate = match value::numeric(&value) {
        Some(number) => ValuePredicate::Numeric { op, value: number },
        None => ValuePredicate::Text { op, value },
    };
    Ok(FilterExpr::HasProperty {
        name: property.name.clone(),
        predicate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::prepare_for_save;
    use crate::fulltext::TokenIndex;
    use crate::model::{Material, MaterialId};
    use crate::schema::{ScalarValue, validate_search};
    use crate::store::MemStore;

    fn prop(name: &str, value: &str, logic: &str) -> PropertyFilter {
        PropertyFilter {
            name: name.into(),
            value: ScalarValue::Text(value.into()),
            logic: logic.into(),
        }
    }

    fn query(json: &str) -> QueryDescription {
        QueryDescription::new(validate_search(json.as_bytes()).unwrap(), None)
    }

    #[test]
    fn numeric_property_compiles_to_float_predicate() {
        let f = compile_property(&prop("mass", "18", "gt")).unwrap();
        assert_eq!(
            f,
            FilterExpr::HasProperty {
                name: "mass".into(),
                predicate: ValuePredicate::Numeric {
                    op: Operator::Greater,
                    value: 18.0
                },
            }
        );
    }

    #[test]
    fn textual_property_compiles_to_text_predicate() {
        let f = compile_property(&prop("structure", "cubic", "contains")).unwrap();
        assert!(matches!(
            f,
            FilterExpr::HasProperty {
                predicate: ValuePredicate::Text {
                    op: Operator::Contains,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn numeric_value_with_contains_is_a_mismatch() {
        let err = compile_property(&prop("mass", "18", "contains")).unwrap_err();
        assert!(matches!(err, CompileError::OperatorMismatch { .. }));
        assert!(err.to_string().contains("\"18\""));
    }

    #[test]
    fn textual_value_with_ordering_is_a_mismatch() {
        let err = compile_property(&prop("structure", "cubic", ">")).unwrap_err();
        assert!(matches!(err, CompileError::OperatorMismatch { .. }));
    }

    #[test]
    fn unknown_operator_is_reported_with_token() {
        let err = compile_property(&prop("mass", "18", "about")).unwrap_err();
        match err {
            CompileError::UnknownOperator { token, target } => {
                assert_eq!(token, "about");
                assert_eq!(target, "property \"mass\"");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bare_number_and_string_compile_identically() {
        let number = PropertyFilter {
            name: "mass".into(),
            value: serde_json::from_str("18").unwrap(),
            logic: "eq".into(),
        };
        assert_eq!(
            compile_property(&number).unwrap(),
            compile_property(&prop("mass", "18", "eq")).unwrap()
        );
    }

    #[test]
    fn compound_rejects_numeric_operators() {
        let store = MemStore::new();
        let compiler = QueryCompiler::new(&store, None);
        let q = query(r#"{"compound":{"logic":"gt","value":"H2O"}}"#);
        assert!(matches!(
            compiler.compile(&q),
            Err(CompileError::OperatorMismatch { .. })
        ));
        let q = query(r#"{"compound":{"logic":"like","value":"H2O"}}"#);
        assert!(matches!(
            compiler.compile(&q),
            Err(CompileError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn constraints_are_conjoined() {
        let store = MemStore::new();
        let compiler = QueryCompiler::new(&store, None);
        let q = query(
            r#"{"compound":{"logic":"contains","value":"O"},
                "properties":[{"name":"mass","value":"18","logic":">="},
                              {"name":"phase","value":"liquid","logic":"eq"}]}"#,
        );
        let f = compiler.compile(&q).unwrap();
        assert_eq!(f.constraint_count(), 3);
        assert_eq!(compiler.compile(&query("{}")).unwrap(), FilterExpr::All);
    }

    #[test]
    fn term_without_search_provider_fails() {
        let store = MemStore::new();
        let compiler = QueryCompiler::new(&store, None);
        let q = QueryDescription::new(SearchDocument::default(), Some("oxide".into()));
        assert!(matches!(
            compiler.compile(&q),
            Err(CompileError::SearchUnavailable { .. })
        ));
    }

    #[test]
    fn blank_term_is_ignored() {
        let q = QueryDescription::new(SearchDocument::default(), Some("  ".into()));
        assert!(q.search.is_none());
    }

    #[test]
    fn term_narrows_to_hits() {
        let store = MemStore::new();
        let index = TokenIndex::new();
        let mut m = Material::new("TiO2");
        m.add_property("structure", "rutile");
        prepare_for_save(&mut m).unwrap();
        let id = store.save(&mut m).unwrap();
        index.index(&m);

        let compiler = QueryCompiler::new(&store, Some(&index));
        let q = QueryDescription::new(SearchDocument::default(), Some("rutile".into()));
        assert_eq!(
            compiler.compile(&q).unwrap(),
            FilterExpr::IdIn([id].into())
        );
    }

    #[test]
    fn stale_index_entry_is_out_of_sync() {
        let store = MemStore::new();
        let index = TokenIndex::new();
        let mut ghost = Material::new("KCl");
        ghost.id = MaterialId::new(99);
        prepare_for_save(&mut ghost).unwrap();
        index.index(&ghost);

        let compiler = QueryCompiler::new(&store, Some(&index));
        let q = QueryDescription::new(SearchDocument::default(), Some("kcl".into()));
        assert!(matches!(
            compiler.compile(&q),
            Err(CompileError::IndexOutOfSync { id: 99 })
        ));
    }
}
