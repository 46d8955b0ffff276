//! Call-site expectations in provider-agnostic form

use super::types::TypeRef;

/// A parameter the call site supplies
#[derive(Debug, Clone, PartialEq)]
pub struct InputParameter {
    pub name: String,
    pub ty: TypeRef,
}

/// A field the call site maps a result column into.
///
/// `name` is `None` only for the anonymous single-field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedField {
    pub name: Option<String>,
    pub ty: TypeRef,
    pub containing_type: Option<String>,
}

/// What a call site supplies to and expects from its query
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQueryDefinition {
    check_parameters: bool,
    input_parameters: Vec<InputParameter>,
    normalized_sql: Option<String>,
    check_result: bool,
    expected_fields: Vec<ExpectedField>,
    anonymous: bool,
}

impl NormalizedQueryDefinition {
    pub fn builder() -> NormalizedQueryDefinitionBuilder {
        NormalizedQueryDefinitionBuilder::default()
    }

    pub fn check_parameters(&self) -> bool {
        self.check_parameters
    }

    pub fn input_parameters(&self) -> &[InputParameter] {
        &self.input_parameters
    }

    /// Rewritten SQL to validate instead of the raw text
    pub fn normalized_sql(&self) -> Option<&str> {
        self.normalized_sql.as_deref()
    }

    pub fn check_result(&self) -> bool {
        self.check_result
    }

    pub fn expected_fields(&self) -> &[ExpectedField] {
        &self.expected_fields
    }

    /// The whole row maps to one primitive value
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

/// Append-only accumulator for [`NormalizedQueryDefinition`]
#[derive(Debug, Default)]
pub struct NormalizedQueryDefinitionBuilder {
    check_parameters: bool,
    input_parameters: Vec<InputParameter>,
    normalized_sql: Option<String>,
    check_result: bool,
    expected_fields: Vec<ExpectedField>,
    anonymous: bool,
}

impl NormalizedQueryDefinitionBuilder {
    pub fn check_parameters(&mut self, check: bool) -> &mut Self {
        self.check_parameters = check;
        self
    }

    /// Add a supplied parameter; a repeated name keeps the first entry
    pub fn add_input_parameter(&mut self, name: impl Into<String>, ty: TypeRef) -> &mut Self {
        let name = name.into();
        if !self.input_parameters.iter().any(|p| p.name == name) {
            self.input_parameters.push(InputParameter { name, ty });
        }
        self
    }

    pub fn normalized_sql(&mut self, sql: impl Into<String>) -> &mut Self {
        self.normalized_sql = Some(sql.into());
        self
    }

    pub fn check_result(&mut self, check: bool) -> &mut Self {
        self.check_result = check;
        self
    }

    /// # Panics
    /// Panics if an anonymous field was already added.
    pub fn add_expected_field(
        &mut self,
        name: impl Into<String>,
        ty: TypeRef,
        containing_type: Option<String>,
    ) -> &mut Self {
        assert!(
            !self.anonymous,
            "named expected fields cannot be combined with an anonymous field"
        );
        self.expected_fields.push(ExpectedField {
            name: Some(name.into()),
            ty,
            containing_type,
        });
        self
    }

    /// # Panics
    /// Panics if any expected field (named or anonymous) was already added.
    pub fn add_anonymous_field(&mut self, ty: TypeRef) -> &mut Self {
        assert!(
            self.expected_fields.is_empty(),
            "an anonymous field must be the only expected field"
        );
        self.expected_fields.push(ExpectedField {
            name: None,
            ty,
            containing_type: None,
        });
        self.anonymous = true;
        self
    }

    pub fn build(self) -> NormalizedQueryDefinition {
        NormalizedQueryDefinition {
            check_parameters: self.check_parameters,
            input_parameters: self.input_parameters,
            normalized_sql: self.normalized_sql,
            check_result: self.check_result,
            expected_fields: self.expected_fields,
            anonymous: self.anonymous,
        }
    }
}
