use std::fmt;

/// Outcome of checking a single configuration form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidation {
    Ok,
    Warning(String),
    Error(String),
}

impl FormValidation {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for FormValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warning(message) => write!(f, "warning: {message}"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Checks the name field of the settings form.
///
/// Advisory only; nothing at run time depends on it.
pub fn check_name(value: &str) -> FormValidation {
    if value.is_empty() {
        return FormValidation::Error("Please set a name".to_string());
    }
    if value.chars().count() < 4 {
        return FormValidation::Warning("Isn't the name too short?".to_string());
    }
    FormValidation::Ok
}
