//! Call-site analyzers
//!
//! An analyzer translates one calling convention into a
//! [`NormalizedQueryDefinition`]: which parameters the call site supplies, which
//! fields it expects back, and optionally a rewritten SQL text. The registry
//! picks the first registered analyzer whose `can_analyze` accepts the call
//! site, so specific conventions must be registered before the fallback.
//!
//! - `dapper` - micro-ORM extension methods with a parameters object
//! - `default` - generic record mapping from the method's return type

mod dapper;
mod default;

pub use dapper::DapperAnalyzer;
pub use default::DefaultAnalyzer;

use super::callsite::CallSite;
use super::definition::{NormalizedQueryDefinition, NormalizedQueryDefinitionBuilder};
use super::outcome::Outcome;
use super::types::TypeRef;

/// Normalization strategy for one calling convention
pub trait CallSiteAnalyzer: Send + Sync {
    /// Analyzer name for debugging/logging
    fn name(&self) -> &'static str;

    fn can_analyze(&self, call_site: &CallSite<'_>) -> bool;

    /// A failure stops analysis of the call site without a diagnostic
    fn normalize_query_definition(
        &self,
        call_site: &CallSite<'_>,
    ) -> Outcome<NormalizedQueryDefinition>;
}

/// Describe the rows a call site expects from its (possibly async) return type.
///
/// `Task<T>` unwraps to `T`, then `IEnumerable<T>` unwraps to `T`. Dynamic,
/// unresolved and still-nested shapes disable the result check; a scalar maps
/// the single column; a record maps its public settable properties.
pub(crate) fn expect_result_shape(
    builder: &mut NormalizedQueryDefinitionBuilder,
    return_type: &TypeRef,
) {
    let ty = match return_type {
        TypeRef::Awaitable(inner) => inner.as_ref(),
        other => other,
    };
    let row = match ty {
        TypeRef::Sequence(element) => element.as_ref(),
        other => other,
    };

    match row {
        TypeRef::Scalar(_) => {
            builder.check_result(true).add_anonymous_field(row.clone());
        }
        TypeRef::Record(record) => {
            builder.check_result(true);
            for property in record.properties.iter().filter(|p| p.is_settable()) {
                builder.add_expected_field(
                    property.name.clone(),
                    property.ty.clone(),
                    Some(record.name.clone()),
                );
            }
        }
        TypeRef::Sequence(_) | TypeRef::Awaitable(_) | TypeRef::Dynamic | TypeRef::Error => {
            builder.check_result(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{PropertyInfo, RecordType, ScalarKind};

    fn shape_of(ty: TypeRef) -> NormalizedQueryDefinition {
        let mut builder = NormalizedQueryDefinition::builder();
        expect_result_shape(&mut builder, &ty);
        builder.build()
    }

    fn customer() -> TypeRef {
        TypeRef::record(RecordType::new(
            "Shop.Customer",
            vec![
                PropertyInfo::new("Id", TypeRef::scalar(ScalarKind::Int)),
                PropertyInfo::new("Name", TypeRef::scalar(ScalarKind::String)),
                PropertyInfo::read_only("DisplayName", TypeRef::scalar(ScalarKind::String)),
                PropertyInfo {
                    is_public: false,
                    ..PropertyInfo::new("Secret", TypeRef::scalar(ScalarKind::String))
                },
            ],
        ))
    }

    #[test]
    fn test_scalar_maps_anonymous_field() {
        let def = shape_of(TypeRef::scalar(ScalarKind::Guid));
        assert!(def.check_result());
        assert!(def.is_anonymous());
        assert_eq!(def.expected_fields()[0].ty, TypeRef::scalar(ScalarKind::Guid));
    }

    #[test]
    fn test_sequence_of_record_maps_settable_properties() {
        let def = shape_of(TypeRef::sequence_of(customer()));
        assert!(def.check_result());
        assert!(!def.is_anonymous());

        let names: Vec<_> = def
            .expected_fields()
            .iter()
            .map(|f| f.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Id", "Name"]);
        assert_eq!(
            def.expected_fields()[0].containing_type.as_deref(),
            Some("Shop.Customer")
        );
    }

    #[test]
    fn test_awaitable_sequence_unwraps() {
        let def = shape_of(TypeRef::awaitable_of(TypeRef::sequence_of(TypeRef::scalar(
            ScalarKind::Long,
        ))));
        assert!(def.is_anonymous());
        assert_eq!(def.expected_fields()[0].ty, TypeRef::scalar(ScalarKind::Long));
    }

    #[test]
    fn test_opaque_types_skip_result_check() {
        assert!(!shape_of(TypeRef::Dynamic).check_result());
        assert!(!shape_of(TypeRef::sequence_of(TypeRef::Dynamic)).check_result());
        assert!(!shape_of(TypeRef::Error).check_result());
        assert!(
            !shape_of(TypeRef::sequence_of(TypeRef::sequence_of(TypeRef::scalar(
                ScalarKind::Int
            ))))
            .check_result()
        );
    }
}
