//! Call-site description supplied by the host analyzer
//!
//! The host resolves syntax and symbols; this module only carries the parts the
//! analyzers and reconciler read: the method symbol, the SQL literal, the
//! argument list and the source location diagnostics are reported at.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::connection::ConnectionStringData;
use super::types::{SemanticModel, TypeRef};

/// Where a call site lives in the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SourceLocation {
    pub file_path: String,
    /// Offset of the invocation span in the file
    pub span_start: usize,
    #[serde(default)]
    pub span_length: usize,
    /// 1-based
    #[serde(default)]
    pub line: u32,
    /// 1-based
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path, self.line, self.column)
    }
}

/// Resolved symbol of the invoked method
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodSymbol {
    pub name: String,
    /// Fully qualified name of the type declaring the method
    pub containing_type: String,
    pub return_type: TypeRef,
}

/// One argument of the invocation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Argument {
    /// Method parameter the argument binds to, if the host resolved it
    #[serde(default)]
    pub parameter: Option<String>,
    pub ty: TypeRef,
}

/// Host payload describing one invocation that receives a SQL literal
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Invocation {
    pub location: SourceLocation,
    /// `None` when the host could not resolve the method
    #[serde(default)]
    pub method: Option<MethodSymbol>,
    pub sql: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// Connection hint discovered by the host for this call site
    #[serde(default)]
    pub connection: Option<ConnectionStringData>,
}

/// An invocation together with the semantic model used to reason about its types
#[derive(Clone, Copy)]
pub struct CallSite<'a> {
    invocation: &'a Invocation,
    semantic: &'a dyn SemanticModel,
}

impl<'a> CallSite<'a> {
    pub fn new(invocation: &'a Invocation, semantic: &'a dyn SemanticModel) -> Self {
        Self {
            invocation,
            semantic,
        }
    }

    pub fn invocation(&self) -> &'a Invocation {
        self.invocation
    }

    pub fn method(&self) -> Option<&'a MethodSymbol> {
        self.invocation.method.as_ref()
    }

    pub fn sql(&self) -> &'a str {
        &self.invocation.sql
    }

    pub fn location(&self) -> &'a SourceLocation {
        &self.invocation.location
    }

    pub fn semantic(&self) -> &'a dyn SemanticModel {
        self.semantic
    }

    /// Argument bound to the named method parameter
    pub fn argument_for(&self, parameter: &str) -> Option<&'a Argument> {
        self.invocation
            .arguments
            .iter()
            .find(|a| a.parameter.as_deref() == Some(parameter))
    }
}

impl fmt::Debug for CallSite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite")
            .field("location", &self.invocation.location)
            .field("method", &self.invocation.method.as_ref().map(|m| &m.name))
            .finish()
    }
}
