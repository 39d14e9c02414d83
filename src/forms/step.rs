//! Per-screen form state.
//!
//! A `StepForm` owns the raw text of each field, the per-field error, and a
//! `submitted` flag. Errors stay hidden until the first submit attempt;
//! from then on every edit re-validates the edited field immediately.

use std::fmt;

use super::validate::{self, ValidationError, Validated};
use crate::profile::model::CUISINES;

/// Validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Non-empty; the label is used in the message.
    Required(&'static str),
    Email,
    LoginPassword,
    NewPassword,
    /// Must equal the named field exactly.
    ConfirmOf(&'static str),
    /// Digits only, exactly this many.
    Otp(usize),
    Age,
    Weight,
    Height,
    Gender,
    Activity,
    Cuisine,
    Goal,
    CustomRestrictions,
}

impl Rule {
    fn check(&self, value: &str, form: &StepForm) -> Validated<()> {
        match self {
            Rule::Required(label) => validate::required(label, value).map(drop),
            Rule::Email => validate::email(value).map(drop),
            Rule::LoginPassword => validate::login_password(value).map(drop),
            Rule::NewPassword => validate::new_password(value).map(drop),
            Rule::ConfirmOf(other) => validate::confirm_password(form.value(other), value),
            Rule::Otp(len) => validate::otp(value, *len).map(drop),
            Rule::Age => validate::age(value).map(drop),
            Rule::Weight => validate::weight_kg(value).map(drop),
            Rule::Height => validate::height_cm(value).map(drop),
            Rule::Gender => validate::gender(value).map(drop),
            Rule::Activity => validate::activity(value).map(drop),
            Rule::Cuisine => validate::one_of("Cuisine", value, CUISINES).map(drop),
            Rule::Goal => validate::goal(value).map(drop),
            Rule::CustomRestrictions => validate::custom_restrictions(value).map(drop),
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    name: &'static str,
    rule: Rule,
    value: String,
    error: Option<String>,
}

/// Why a step refused to advance: one aggregate alert plus inline errors.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRejection {
    pub alert: String,
    pub field_errors: Vec<(&'static str, String)>,
}

impl StepRejection {
    fn from_errors(field_errors: Vec<(&'static str, String)>) -> Self {
        let mut alert = String::from("Please correct the following:");
        for (_, message) in &field_errors {
            alert.push_str("\n- ");
            alert.push_str(message);
        }
        Self {
            alert,
            field_errors,
        }
    }

    /// Rejection for a single field, used when a typed parse fails after
    /// the rule check (should not happen with matching rules).
    pub fn field(name: &'static str, error: ValidationError) -> Self {
        Self::from_errors(vec![(name, error.message)])
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, message)| message.as_str())
    }
}

impl fmt::Display for StepRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alert)
    }
}

impl std::error::Error for StepRejection {}

/// Form state for one screen.
#[derive(Debug, Clone, Default)]
pub struct StepForm {
    fields: Vec<Field>,
    submitted: bool,
}

impl StepForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style).
    pub fn field(mut self, name: &'static str, rule: Rule) -> Self {
        self.fields.push(Field {
            name,
            rule,
            value: String::new(),
            error: None,
        });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Current raw value of a field; empty for unknown names.
    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    /// Inline error for a field. Always `None` before the first submit.
    pub fn error(&self, name: &str) -> Option<&str> {
        if !self.submitted {
            return None;
        }
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.error.as_deref())
    }

    /// Update a field as the user types. Returns `false` for unknown fields.
    ///
    /// OTP fields drop non-digit characters instead of rejecting them. After
    /// the first submit the field (and any confirmation bound to it) is
    /// re-validated on the spot.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let Some(idx) = self.fields.iter().position(|f| f.name == name) else {
            return false;
        };
        let value = match self.fields[idx].rule {
            Rule::Otp(len) => validate::sanitize_otp(value, len),
            _ => value.to_string(),
        };
        self.fields[idx].value = value;

        if self.submitted {
            self.revalidate(idx);
            let source = self.fields[idx].name;
            let dependents: Vec<usize> = self
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f.rule == Rule::ConfirmOf(source))
                .map(|(i, _)| i)
                .collect();
            for dep in dependents {
                self.revalidate(dep);
            }
        }
        true
    }

    fn revalidate(&mut self, idx: usize) {
        let field = &self.fields[idx];
        let error = field.rule.check(&field.value, self).err().map(|e| e.message);
        self.fields[idx].error = error;
    }

    /// Handle a "Next" press: mark the form submitted and validate every
    /// field. Entered values are kept either way.
    pub fn submit(&mut self) -> Result<(), StepRejection> {
        self.submitted = true;
        for idx in 0..self.fields.len() {
            self.revalidate(idx);
        }

        let errors: Vec<(&'static str, String)> = self
            .fields
            .iter()
            .filter_map(|f| f.error.clone().map(|e| (f.name, e)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(fields = errors.len(), "Step rejected by validation");
            Err(StepRejection::from_errors(errors))
        }
    }
}
