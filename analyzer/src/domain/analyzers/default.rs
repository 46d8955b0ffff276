//! Fallback analyzer
//!
//! Accepts every call site. Parameters are not checked since nothing is known
//! about how the method binds them; the result shape comes from the method's
//! return type.

use super::{CallSiteAnalyzer, expect_result_shape};
use crate::domain::callsite::CallSite;
use crate::domain::definition::NormalizedQueryDefinition;
use crate::domain::outcome::Outcome;

#[derive(Debug, Default)]
pub struct DefaultAnalyzer;

impl DefaultAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl CallSiteAnalyzer for DefaultAnalyzer {
    fn name(&self) -> &'static str {
        "default"
    }

    fn can_analyze(&self, _call_site: &CallSite<'_>) -> bool {
        true
    }

    fn normalize_query_definition(
        &self,
        call_site: &CallSite<'_>,
    ) -> Outcome<NormalizedQueryDefinition> {
        let Some(method) = call_site.method() else {
            return Outcome::failure("Method symbol could not be resolved");
        };

        let mut builder = NormalizedQueryDefinition::builder();
        builder.check_parameters(false);
        expect_result_shape(&mut builder, &method.return_type);
        Outcome::Success(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::callsite::{Invocation, MethodSymbol, SourceLocation};
    use crate::domain::types::{PropertyInfo, RecordType, ScalarKind, StandardConversions, TypeRef};

    fn invocation(method: Option<MethodSymbol>) -> Invocation {
        Invocation {
            location: SourceLocation::default(),
            method,
            sql: "SELECT Id, Name FROM Customers".to_string(),
            arguments: Vec::new(),
            connection: None,
        }
    }

    #[test]
    fn test_accepts_any_call_site() {
        let inv = invocation(None);
        let call_site = CallSite::new(&inv, &StandardConversions);
        assert!(DefaultAnalyzer::new().can_analyze(&call_site));
    }

    #[test]
    fn test_unresolved_method_fails() {
        let inv = invocation(None);
        let call_site = CallSite::new(&inv, &StandardConversions);
        let outcome = DefaultAnalyzer::new().normalize_query_definition(&call_site);
        assert!(!outcome.is_success());
        assert!(!outcome.is_empty_failure());
    }

    #[test]
    fn test_record_return_type() {
        let record = RecordType::new(
            "Shop.Customer",
            vec![
                PropertyInfo::new("Id", TypeRef::scalar(ScalarKind::Int)),
                PropertyInfo::new("Name", TypeRef::scalar(ScalarKind::String)),
            ],
        );
        let inv = invocation(Some(MethodSymbol {
            name: "LoadCustomers".to_string(),
            containing_type: "Shop.CustomerRepository".to_string(),
            return_type: TypeRef::sequence_of(TypeRef::record(record)),
        }));
        let call_site = CallSite::new(&inv, &StandardConversions);

        let def = DefaultAnalyzer::new()
            .normalize_query_definition(&call_site)
            .into_value();
        assert!(!def.check_parameters());
        assert!(def.check_result());
        assert_eq!(def.expected_fields().len(), 2);
        assert!(def.normalized_sql().is_none());
    }
}
