//! Reconciliation of a call site against its validated query
//!
//! Two independent checks, each gated by the definition:
//! - parameters: query parameters vs supplied parameters, matched by name
//! - result: output columns vs expected fields, either the anonymous
//!   single-column mapping or a full outer join by name
//!
//! Types are compared in the direction query type -> call-site type; only
//! identity and implicit conversions are compatible.
//!
//! Names match exactly (case-sensitive). List-parameter rewriting in the
//! Dapper analyzer normalizes casing before names get here; scalar tokens do
//! not, so a casing difference shows up as a missing plus an unused parameter.

use std::cmp::Ordering;

use super::callsite::{CallSite, SourceLocation};
use super::definition::NormalizedQueryDefinition;
use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::query::ValidatedQuery;
use super::types::SemanticModel;
use crate::core::constants::INTRINSIC_PARAMETER_SUFFIX;

pub struct Reconciler<'a> {
    semantic: &'a dyn SemanticModel,
    location: &'a SourceLocation,
}

impl<'a> Reconciler<'a> {
    pub fn new(semantic: &'a dyn SemanticModel, location: &'a SourceLocation) -> Self {
        Self { semantic, location }
    }

    pub fn for_call_site(call_site: &CallSite<'a>) -> Self {
        Self::new(call_site.semantic(), call_site.location())
    }

    /// Run every check the definition enables
    pub fn reconcile(
        &self,
        definition: &NormalizedQueryDefinition,
        query: &ValidatedQuery,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if definition.check_parameters() {
            diagnostics.extend(self.check_parameters(definition, query));
        }
        if definition.check_result() {
            diagnostics.extend(self.check_result(definition, query));
        }
        diagnostics
    }

    pub fn check_parameters(
        &self,
        definition: &NormalizedQueryDefinition,
        query: &ValidatedQuery,
    ) -> Vec<Diagnostic> {
        let supplied = definition.input_parameters();
        let mut used = vec![false; supplied.len()];
        let mut missing = Vec::new();
        let mut diagnostics = Vec::new();

        for parameter in query
            .parameters()
            .iter()
            .filter(|p| !p.name.ends_with(INTRINSIC_PARAMETER_SUFFIX))
        {
            match supplied.iter().position(|s| s.name == parameter.name) {
                Some(i) => {
                    used[i] = true;
                    let found = &supplied[i];
                    if !self.semantic.is_compatible(&parameter.ty, &found.ty) {
                        diagnostics.push(self.diagnostic(
                            DiagnosticKind::ParameterTypeMismatch,
                            vec![
                                parameter.name.clone(),
                                parameter.ty.display_name(),
                                found.ty.display_name(),
                            ],
                        ));
                    }
                }
                None => missing.push(format!("{} ({})", parameter.name, parameter.ty)),
            }
        }

        let unused: Vec<&str> = supplied
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(p, _)| p.name.as_str())
            .collect();

        if !unused.is_empty() {
            diagnostics.push(
                self.diagnostic(DiagnosticKind::UnusedParameters, vec![unused.join("\n")]),
            );
        }
        if !missing.is_empty() {
            diagnostics.push(
                self.diagnostic(DiagnosticKind::MissingParameters, vec![missing.join("\n")]),
            );
        }
        diagnostics
    }

    pub fn check_result(
        &self,
        definition: &NormalizedQueryDefinition,
        query: &ValidatedQuery,
    ) -> Vec<Diagnostic> {
        let columns = query.output_columns();
        let fields = definition.expected_fields();

        if definition.is_anonymous() {
            let field = &fields[0];
            return match columns {
                [column] => {
                    if self.semantic.is_compatible(&column.ty, &field.ty) {
                        Vec::new()
                    } else {
                        vec![self.diagnostic(
                            DiagnosticKind::SingleColumnTypeMismatch,
                            vec![column.ty.display_name(), field.ty.display_name()],
                        )]
                    }
                }
                _ => vec![self.diagnostic(
                    DiagnosticKind::ExpectedSingleColumn,
                    vec![field.ty.display_name()],
                )],
            };
        }

        let mut diagnostics = Vec::new();
        let mut missing = Vec::new();
        let mut unused = Vec::new();

        let joined = full_join(
            columns,
            fields,
            |c| c.name.as_str(),
            |f| f.name.as_deref().unwrap_or_default(),
        );
        for pair in joined {
            match pair {
                (Some(column), None) => unused.push(column.name.as_str()),
                (None, Some(field)) => missing.push(format!(
                    "{} ({})",
                    field.name.as_deref().unwrap_or_default(),
                    field.ty
                )),
                (Some(column), Some(field)) => {
                    if !self.semantic.is_compatible(&column.ty, &field.ty) {
                        diagnostics.push(self.diagnostic(
                            DiagnosticKind::ColumnTypeMismatch,
                            vec![
                                column.name.clone(),
                                column.ty.display_name(),
                                field.ty.display_name(),
                            ],
                        ));
                    }
                }
                (None, None) => {}
            }
        }

        if !missing.is_empty() {
            diagnostics
                .push(self.diagnostic(DiagnosticKind::MissingColumns, vec![missing.join("\n")]));
        }
        if !unused.is_empty() {
            diagnostics
                .push(self.diagnostic(DiagnosticKind::UnusedColumns, vec![unused.join("\n")]));
        }
        diagnostics
    }

    fn diagnostic(&self, kind: DiagnosticKind, arguments: Vec<String>) -> Diagnostic {
        Diagnostic::new(kind, self.location, arguments)
    }
}

/// Full outer join of two lists by key, as a merge over both lists sorted by key.
///
/// Pairs come out in key order. Equal keys pair up one to one; surplus
/// duplicates on either side come out unmatched.
pub(crate) fn full_join<'a, L, R, K, FL, FR>(
    left: &'a [L],
    right: &'a [R],
    left_key: FL,
    right_key: FR,
) -> Vec<(Option<&'a L>, Option<&'a R>)>
where
    K: Ord,
    FL: Fn(&'a L) -> K,
    FR: Fn(&'a R) -> K,
{
    let mut left: Vec<&'a L> = left.iter().collect();
    let mut right: Vec<&'a R> = right.iter().collect();
    left.sort_by(|a, b| left_key(*a).cmp(&left_key(*b)));
    right.sort_by(|a, b| right_key(*a).cmp(&right_key(*b)));

    let mut joined = Vec::with_capacity(left.len().max(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left_key(left[i]).cmp(&right_key(right[j])) {
            Ordering::Less => {
                joined.push((Some(left[i]), None));
                i += 1;
            }
            Ordering::Greater => {
                joined.push((None, Some(right[j])));
                j += 1;
            }
            Ordering::Equal => {
                joined.push((Some(left[i]), Some(right[j])));
                i += 1;
                j += 1;
            }
        }
    }
    joined.extend(left[i..].iter().map(|l| (Some(*l), None)));
    joined.extend(right[j..].iter().map(|r| (None, Some(*r))));
    joined
}
