//! Audit trace models.
//!
//! Every payroll computation records the ordered list of rules it applied,
//! with their inputs and outputs, so a payslip can be defended line by line.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Where the rule's parameters came from (a config table, the contract).
    pub basis: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a payroll computation.
///
/// # Example
///
/// ```
/// use hr_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// assert_eq!(trace.next_step_number(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// The number the next recorded step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Appends a step.
    pub fn push(&mut self, step: AuditStep) {
        self.steps.push(step);
    }

    /// Appends a warning.
    pub fn warn(&mut self, code: &str, message: String, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
            severity: severity.to_string(),
        });
    }

    /// Returns the step recorded for `rule_id`, if any.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.rule_id == rule_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(number: u32, rule_id: &str) -> AuditStep {
        AuditStep {
            step_number: number,
            rule_id: rule_id.to_string(),
            rule_name: "Rule".to_string(),
            basis: "contract".to_string(),
            input: serde_json::json!({}),
            output: serde_json::json!({}),
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_step_numbers_follow_push_order() {
        let mut trace = AuditTrace::default();
        trace.push(step(trace.next_step_number(), "contract_resolution"));
        trace.push(step(trace.next_step_number(), "working_days"));
        assert_eq!(trace.steps[1].step_number, 2);
        assert_eq!(trace.next_step_number(), 3);
        assert!(trace.step("working_days").is_some());
        assert!(trace.step("income_tax").is_none());
    }

    #[test]
    fn test_warning_serialization() {
        let mut trace = AuditTrace::default();
        trace.warn("missing_check_out", "Record skipped".to_string(), "medium");
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["warnings"][0]["code"], "missing_check_out");
        assert_eq!(json["warnings"][0]["severity"], "medium");
    }
}
