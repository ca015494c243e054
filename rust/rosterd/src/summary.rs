use crate::entities::{BudgetCategory, CheckRecord, School, StaffMember, Student, Teacher};
use crate::record::Entity;
use serde_json::json;
use std::collections::BTreeMap;

/// Derived figures shown above a screen's table, computed over the filtered rows.
pub trait Summary: Entity {
    fn summarize(rows: &[&Self]) -> serde_json::Value {
        json!({
            "count": rows.len(),
            "byStatus": count_by(rows, "status"),
        })
    }
}

fn count_by<E: Entity>(rows: &[&E], field: &str) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for r in rows {
        if let Some(v) = r.field(field).render() {
            *out.entry(v).or_insert(0) += 1;
        }
    }
    out
}

impl Summary for Student {}
impl Summary for Teacher {}
impl Summary for School {}
impl Summary for StaffMember {}

impl Summary for CheckRecord {
    fn summarize(rows: &[&Self]) -> serde_json::Value {
        let mut amounts: BTreeMap<&'static str, f64> = BTreeMap::new();
        for r in rows {
            *amounts.entry(r.status.as_str()).or_insert(0.0) += r.amount;
        }
        json!({
            "count": rows.len(),
            "byStatus": count_by(rows, "status"),
            "amountByStatus": amounts,
            "totalAmount": rows.iter().map(|r| r.amount).sum::<f64>(),
        })
    }
}

impl Summary for BudgetCategory {
    fn summarize(rows: &[&Self]) -> serde_json::Value {
        let allocated: f64 = rows.iter().map(|r| r.allocated).sum();
        let spent: f64 = rows.iter().map(|r| r.spent).sum();
        let over_budget: Vec<_> = rows
            .iter()
            .filter(|r| r.spent > r.allocated)
            .map(|r| r.id.clone())
            .collect();
        let utilization = if allocated > 0.0 {
            100.0 * spent / allocated
        } else {
            0.0
        };
        json!({
            "count": rows.len(),
            "allocated": allocated,
            "spent": spent,
            "remaining": allocated - spent,
            "utilization": utilization,
            "overBudget": over_budget,
        })
    }
}
