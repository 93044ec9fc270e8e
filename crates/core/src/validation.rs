//! Field-level validation results for form-shaped input.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// One problem with a draft, addressed by a field path such as `items[2].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Every issue found in a draft, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// Collapse into a single [`DomainError::Validation`] listing every issue.
    pub fn into_result(self) -> DomainResult<()> {
        if self.issues.is_empty() {
            return Ok(());
        }
        let joined = self
            .issues
            .iter()
            .map(|i| format!("{}: {}", i.field, i.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(DomainError::validation(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        assert_eq!(ValidationReport::new().into_result(), Ok(()));
    }

    #[test]
    fn issues_are_joined_in_order() {
        let mut report = ValidationReport::new();
        report.push("reason", "cannot be empty");
        report.push("items", "at least one item is required");
        assert!(report.has_issue_for("items"));
        assert_eq!(
            report.into_result(),
            Err(DomainError::validation(
                "reason: cannot be empty; items: at least one item is required"
            ))
        );
    }
}
