//! Financial domain entities.
//!
//! These are thin mirrors of the remote collections. The server owns
//! identity: `id` fields are assigned remotely and absent on create payloads.
//! The only client-side invariant is required-field presence before submit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether a transaction is money out or money in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
}

impl TransactionKind {
    /// Returns the display label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Income => "Income",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            TransactionKind::Expense => TransactionKind::Income,
            TransactionKind::Income => TransactionKind::Expense,
        }
    }
}

/// A single expense or income entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Server-assigned id; `None` until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, rename = "type")]
    pub kind: TransactionKind,
}

impl Transaction {
    /// Validates required fields before submission.
    ///
    /// # Errors
    /// Returns the name of the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.amount <= 0.0 {
            return Err("amount must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// A per-category spending budget.
///
/// Keyed by category name; there is no separate server id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub limit: f64,
    #[serde(default)]
    pub spent: f64,
}

impl Budget {
    /// Validates required fields before submission.
    ///
    /// # Errors
    /// Returns the name of the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        if self.category.trim().is_empty() {
            return Err("category is required".to_string());
        }
        if self.limit <= 0.0 {
            return Err("limit must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Fraction of the limit already spent, clamped to [0, 1].
    pub fn utilization(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        (self.spent / self.limit).clamp(0.0, 1.0)
    }

    /// Returns true when spending exceeded the limit.
    pub fn over_limit(&self) -> bool {
        self.spent > self.limit
    }
}

/// A generated financial report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// Reporting period, e.g. "2026-07" or "2026-Q2".
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Report {
    /// Validates required fields before requesting generation.
    ///
    /// # Errors
    /// Returns the name of the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.period.trim().is_empty() {
            return Err("period is required".to_string());
        }
        Ok(())
    }
}

/// User profile settings stored on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePreferences {
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// ISO 4217 code used for display formatting.
    pub currency: String,
    pub email_notifications: bool,
    pub two_factor: bool,
}

impl Default for ProfilePreferences {
    fn default() -> Self {
        Self {
            email: None,
            full_name: None,
            currency: "USD".to_string(),
            email_notifications: false,
            two_factor: false,
        }
    }
}

/// Aggregate view served by the dashboard collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardSummary {
    pub income_total: f64,
    pub expense_total: f64,
    pub recent_transactions: Vec<Transaction>,
    pub budget_goal: f64,
    pub budget_spent: f64,
}

impl DashboardSummary {
    /// Net balance over the summarized window.
    pub fn net(&self) -> f64 {
        self.income_total - self.expense_total
    }
}

/// Result of a sign-up that still needs code confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub user_id: String,
    /// Where the confirmation code was delivered, when the provider says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction() -> Transaction {
        Transaction {
            id: None,
            name: "Groceries".to_string(),
            amount: 120.0,
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            kind: TransactionKind::Expense,
        }
    }

    /// Test: transaction validation rejects blank name and non-positive amount.
    #[test]
    fn test_transaction_validate() {
        assert!(sample_transaction().validate().is_ok());

        let mut blank = sample_transaction();
        blank.name = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut zero = sample_transaction();
        zero.amount = 0.0;
        assert!(zero.validate().is_err());
    }

    /// Test: budget utilization is clamped and over_limit reflects overspend.
    #[test]
    fn test_budget_utilization() {
        let budget = Budget {
            category: "Transport".to_string(),
            limit: 300.0,
            spent: 200.0,
        };
        assert!((budget.utilization() - 2.0 / 3.0).abs() < 1e-9);
        assert!(!budget.over_limit());

        let blown = Budget {
            category: "Entertainment".to_string(),
            limit: 500.0,
            spent: 650.0,
        };
        assert!((blown.utilization() - 1.0).abs() < 1e-9);
        assert!(blown.over_limit());
    }

    /// Test: transaction JSON round-trip keeps the `type` field name.
    #[test]
    fn test_transaction_json_shape() {
        let json = serde_json::to_value(sample_transaction()).unwrap();
        assert_eq!(json["type"], "expense");
        assert!(json.get("id").is_none());

        let parsed: Transaction = serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "name": "Salary",
            "amount": 2000.0,
            "date": "2026-07-01",
            "type": "income"
        }))
        .unwrap();
        assert_eq!(parsed.kind, TransactionKind::Income);
        assert_eq!(parsed.id.as_deref(), Some("t-1"));
    }

    /// Test: dashboard summary defaults decode from an empty object.
    #[test]
    fn test_dashboard_summary_defaults() {
        let summary: DashboardSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(summary.recent_transactions.len(), 0);
        assert!((summary.net()).abs() < f64::EPSILON);
    }
}
