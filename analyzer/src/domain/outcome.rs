//! Success/failure outcome of validation and normalization

/// Either a value or an ordered list of error messages.
///
/// There is no partial state. Reading the wrong side (`value()` of a failure,
/// `errors()` of a success) is a programming error and panics.
///
/// `Outcome::default()` is the empty failure (no value, zero errors). Caches treat
/// it as "not an answer" and never store it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Vec<String>),
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::Failure(Vec::new())
    }
}

impl<T> Outcome<T> {
    /// Failure with a single message
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(vec![message.into()])
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The empty failure sentinel
    pub fn is_empty_failure(&self) -> bool {
        matches!(self, Self::Failure(errors) if errors.is_empty())
    }

    /// # Panics
    /// Panics if the outcome is a failure.
    pub fn value(&self) -> &T {
        match self {
            Self::Success(value) => value,
            Self::Failure(_) => panic!("Outcome::value called on a failure"),
        }
    }

    /// # Panics
    /// Panics if the outcome is a failure.
    pub fn into_value(self) -> T {
        match self {
            Self::Success(value) => value,
            Self::Failure(_) => panic!("Outcome::into_value called on a failure"),
        }
    }

    /// # Panics
    /// Panics if the outcome is a success.
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Failure(errors) => errors,
            Self::Success(_) => panic!("Outcome::errors called on a success"),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(errors) => Outcome::Failure(errors),
        }
    }
}
