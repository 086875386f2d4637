/**
 * context.rs
 * Validation errors and the report collecting them
 */

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    UnknownProperty,
    MissingRequiredValue,
    InvalidValue,
    InvalidDatatype,
    InvalidUri,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::UnknownProperty => "UNKNOWN_PROPERTY",
            ValidationErrorKind::MissingRequiredValue => "MISSING_REQUIRED_VALUE",
            ValidationErrorKind::InvalidValue => "INVALID_VALUE",
            ValidationErrorKind::InvalidDatatype => "INVALID_DATATYPE",
            ValidationErrorKind::InvalidUri => "INVALID_URI",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation: which instance, which property, which value and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    pub kind: ValidationErrorKind,
    /// Position of the instance in the validated batch
    pub instance: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_uri: Option<String>,
    pub property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl ValidationContext {
    pub fn new(kind: ValidationErrorKind, instance: usize, property: impl Into<String>) -> Self {
        Self {
            kind,
            instance,
            instance_uri: None,
            property: property.into(),
            value: None,
            message: String::new(),
        }
    }

    pub fn with_uri(mut self, uri: Option<&str>) -> Self {
        self.instance_uri = uri.map(str::to_string);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] #{} <{}>", self.kind, self.instance, self.property)?;
        if let Some(value) = &self.value {
            write!(f, " = {:?}", value)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every violation recorded over one batch, up to the error limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub(crate) errors: Vec<ValidationContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) nb_error_limit: Option<usize>,
    /// Violations were dropped because the limit was reached
    pub(crate) truncated: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn nb_error(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationContext] {
        &self.errors
    }

    pub fn errors_of_kind(&self, kind: ValidationErrorKind) -> impl Iterator<Item = &ValidationContext> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn limit_reached(&self) -> bool {
        self.nb_error_limit.is_some_and(|limit| self.errors.len() >= limit)
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        if self.truncated {
            f.write_str(" (limit reached)")?;
        }
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}
