//! Micro-ORM (Dapper) call sites
//!
//! `SqlMapper` extension methods take the SQL text and an optional parameters
//! object whose public properties are bound by name. A property holding a list
//! of scalars is expanded by the library into `IN (...)` lists at run time; to
//! keep the SQL valid for the provider, each such token is rewritten into a pair
//! `(@ids, @ids__sqlaintr)` and the synthetic half is ignored by the reconciler.
//!
//! List tokens match the property case-insensitively and are rewritten with the
//! property's own spelling, so `IN @IDS` reaches the reconciler as `ids`. Scalar
//! tokens are left as written and the reconciler compares names exactly, so
//! `@Status` against a `status` property is reported as missing and unused.

use regex::{Captures, Regex};

use super::{CallSiteAnalyzer, expect_result_shape};
use crate::core::constants::{
    DAPPER_DYNAMIC_PARAMETERS_TYPE, DAPPER_MAPPER_TYPE, DAPPER_PARAM_ARGUMENT,
    INTRINSIC_PARAMETER_SUFFIX,
};
use crate::domain::callsite::CallSite;
use crate::domain::definition::{NormalizedQueryDefinition, NormalizedQueryDefinitionBuilder};
use crate::domain::outcome::Outcome;
use crate::domain::types::TypeRef;

#[derive(Debug, Default)]
pub struct DapperAnalyzer;

impl DapperAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Collect the parameters object; returns the names of list-valued properties
    fn supplied_parameters(
        builder: &mut NormalizedQueryDefinitionBuilder,
        call_site: &CallSite<'_>,
    ) -> Vec<String> {
        let Some(argument) = call_site.argument_for(DAPPER_PARAM_ARGUMENT) else {
            // no parameters object: the query must not need any
            builder.check_parameters(true);
            return Vec::new();
        };

        let record = match &argument.ty {
            TypeRef::Record(record) if record.name != DAPPER_DYNAMIC_PARAMETERS_TYPE => record,
            _ => {
                builder.check_parameters(false);
                return Vec::new();
            }
        };

        builder.check_parameters(true);
        let mut lists = Vec::new();
        for property in record.properties.iter().filter(|p| p.is_readable()) {
            match &property.ty {
                TypeRef::Sequence(element) if element.is_basic() => {
                    builder.add_input_parameter(property.name.clone(), element.as_ref().clone());
                    lists.push(property.name.clone());
                }
                ty => {
                    builder.add_input_parameter(property.name.clone(), ty.clone());
                }
            }
        }
        lists
    }

    /// Whether the method maps rows back into the call site
    fn maps_result(method_name: &str) -> bool {
        if method_name.starts_with("QueryMultiple") {
            return false;
        }
        if method_name.starts_with("ExecuteScalar") {
            return true;
        }
        method_name.starts_with("Query")
    }
}

/// Rewrite every `[?@:]name` token not followed by a word character into
/// `(<p>name, <p>name__sqlaintr)`. Matching is case-insensitive.
pub(crate) fn expand_list_parameter(sql: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?i)([?@:]){}\b", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(sql) {
        return None;
    }

    let expanded = re.replace_all(sql, |caps: &Captures<'_>| {
        let prefix = &caps[1];
        format!("({prefix}{name}, {prefix}{name}{INTRINSIC_PARAMETER_SUFFIX})")
    });
    Some(expanded.into_owned())
}

impl CallSiteAnalyzer for DapperAnalyzer {
    fn name(&self) -> &'static str {
        "dapper"
    }

    fn can_analyze(&self, call_site: &CallSite<'_>) -> bool {
        call_site
            .method()
            .is_some_and(|m| m.containing_type == DAPPER_MAPPER_TYPE)
    }

    fn normalize_query_definition(
        &self,
        call_site: &CallSite<'_>,
    ) -> Outcome<NormalizedQueryDefinition> {
        let Some(method) = call_site.method() else {
            return Outcome::failure("Method symbol could not be resolved");
        };

        let mut builder = NormalizedQueryDefinition::builder();
        let lists = Self::supplied_parameters(&mut builder, call_site);

        let mut sql: Option<String> = None;
        for name in &lists {
            let current = sql.as_deref().unwrap_or(call_site.sql());
            if let Some(expanded) = expand_list_parameter(current, name) {
                sql = Some(expanded);
            }
        }
        if let Some(sql) = sql {
            tracing::trace!(sql = %sql, "Expanded list parameters");
            builder.normalized_sql(sql);
        }

        if Self::maps_result(&method.name) {
            expect_result_shape(&mut builder, &method.return_type);
        } else {
            builder.check_result(false);
        }

        Outcome::Success(builder.build())
    }
}
