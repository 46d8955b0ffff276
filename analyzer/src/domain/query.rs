//! Database-confirmed shape of a query

use std::sync::Arc;

use super::types::TypeRef;

/// One output column of a validated query
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Assignment order, not necessarily the SQL position
    pub ordinal: usize,
    pub name: String,
    pub ty: TypeRef,
}

/// One input parameter a validated query requires
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub position: usize,
    pub name: String,
    pub ty: TypeRef,
}

/// Parameters and output columns of a query as reported by a provider.
///
/// Immutable; clones share the underlying lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    parameters: Arc<[ParameterInfo]>,
    output_columns: Arc<[ColumnInfo]>,
}

impl ValidatedQuery {
    pub fn builder() -> ValidatedQueryBuilder {
        ValidatedQueryBuilder::default()
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn output_columns(&self) -> &[ColumnInfo] {
        &self.output_columns
    }
}

/// Append-only accumulator for [`ValidatedQuery`]
#[derive(Debug, Default)]
pub struct ValidatedQueryBuilder {
    parameters: Vec<ParameterInfo>,
    output_columns: Vec<ColumnInfo>,
}

impl ValidatedQueryBuilder {
    pub fn add_parameter(&mut self, name: impl Into<String>, ty: TypeRef) -> &mut Self {
        let position = self.parameters.len();
        self.parameters.push(ParameterInfo {
            position,
            name: name.into(),
            ty,
        });
        self
    }

    pub fn add_column(&mut self, name: impl Into<String>, ty: TypeRef) -> &mut Self {
        let ordinal = self.output_columns.len();
        self.output_columns.push(ColumnInfo {
            ordinal,
            name: name.into(),
            ty,
        });
        self
    }

    pub fn build(self) -> ValidatedQuery {
        ValidatedQuery {
            parameters: self.parameters.into(),
            output_columns: self.output_columns.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ScalarKind;

    #[test]
    fn test_builder_assigns_positions_and_ordinals() {
        let mut builder = ValidatedQuery::builder();
        builder
            .add_parameter("p1", TypeRef::nullable(ScalarKind::Int))
            .add_parameter("p2", TypeRef::nullable(ScalarKind::Bool))
            .add_column("Id", TypeRef::scalar(ScalarKind::Guid));
        let query = builder.build();

        assert_eq!(query.parameters().len(), 2);
        assert_eq!(query.parameters()[1].position, 1);
        assert_eq!(query.parameters()[1].name, "p2");
        assert_eq!(query.output_columns()[0].ordinal, 0);
        assert_eq!(query.output_columns()[0].name, "Id");
    }

    #[test]
    fn test_clone_shares_lists() {
        let mut builder = ValidatedQuery::builder();
        builder.add_column("Name", TypeRef::scalar(ScalarKind::String));
        let query = builder.build();
        let copy = query.clone();
        assert!(std::ptr::eq(
            query.output_columns().as_ptr(),
            copy.output_columns().as_ptr()
        ));
    }
}
