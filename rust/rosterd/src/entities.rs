use crate::record::{ActivityStatus, Entity, FieldValue, IdStrategy, RecordId, Schema};
use serde::{Deserialize, Serialize};

fn default_active() -> ActivityStatus {
    ActivityStatus::Active
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    pub class_name: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub guardian: String,
    #[serde(default = "default_active")]
    pub status: ActivityStatus,
}

impl Entity for Student {
    const KIND: &'static str = "students";
    const SCHEMA: Schema = Schema {
        searchable: &["name", "rollNo", "email"],
        filterable: &["className", "section", "status"],
        sortable: &["name", "rollNo", "className", "status"],
        export_columns: &["id", "name", "rollNo", "className", "section", "email", "guardian", "status"],
        unique_groups: &[&["rollNo", "className", "section"]],
        id_strategy: IdStrategy::NextInteger,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "name" => FieldValue::Text(&self.name),
            "rollNo" => FieldValue::Text(&self.roll_no),
            "className" => FieldValue::Text(&self.class_name),
            "section" => FieldValue::Text(&self.section),
            "email" => FieldValue::Text(&self.email),
            "guardian" => FieldValue::Text(&self.guardian),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }

    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        Some(&mut self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub school_id: Option<i64>,
    #[serde(default)]
    pub incharge_class: Option<String>,
    #[serde(default)]
    pub incharge_section: Option<String>,
    #[serde(default = "default_active")]
    pub status: ActivityStatus,
}

impl Entity for Teacher {
    const KIND: &'static str = "teachers";
    const SCHEMA: Schema = Schema {
        searchable: &["name", "email", "subject"],
        filterable: &["subject", "schoolId", "inchargeClass", "status"],
        sortable: &["name", "subject", "schoolId", "status"],
        export_columns: &[
            "id",
            "name",
            "email",
            "subject",
            "schoolId",
            "inchargeClass",
            "inchargeSection",
            "status",
        ],
        // One teacher in charge of a given class/section.
        unique_groups: &[&["inchargeClass", "inchargeSection"]],
        id_strategy: IdStrategy::NextInteger,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "name" => FieldValue::Text(&self.name),
            "email" => FieldValue::Text(&self.email),
            "subject" => FieldValue::Text(&self.subject),
            "schoolId" => match self.school_id {
                Some(v) => FieldValue::Number(v as f64),
                None => FieldValue::Missing,
            },
            "inchargeClass" => FieldValue::from_opt(self.incharge_class.as_deref()),
            "inchargeSection" => FieldValue::from_opt(self.incharge_section.as_deref()),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }

    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        Some(&mut self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_active")]
    pub status: ActivityStatus,
}

impl Entity for School {
    const KIND: &'static str = "schools";
    const SCHEMA: Schema = Schema {
        searchable: &["name", "code", "email"],
        filterable: &["status"],
        sortable: &["name", "code", "status"],
        export_columns: &["id", "name", "code", "email", "address", "status"],
        unique_groups: &[&["code"]],
        id_strategy: IdStrategy::NextInteger,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "name" => FieldValue::Text(&self.name),
            "code" => FieldValue::Text(&self.code),
            "email" => FieldValue::Text(&self.email),
            "address" => FieldValue::Text(&self.address),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }

    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        Some(&mut self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_active")]
    pub status: ActivityStatus,
}

impl Entity for StaffMember {
    const KIND: &'static str = "staff";
    const SCHEMA: Schema = Schema {
        searchable: &["name", "email", "role", "phone"],
        filterable: &["role", "department", "status"],
        sortable: &["name", "role", "department", "status"],
        export_columns: &["id", "name", "role", "department", "email", "phone", "status"],
        unique_groups: &[],
        id_strategy: IdStrategy::Timestamp,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "name" => FieldValue::Text(&self.name),
            "role" => FieldValue::Text(&self.role),
            "department" => FieldValue::Text(&self.department),
            "email" => FieldValue::Text(&self.email),
            "phone" => FieldValue::Text(&self.phone),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }

    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        Some(&mut self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Cleared,
    Bounced,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Cleared => "cleared",
            CheckStatus::Bounced => "bounced",
        }
    }
}

fn default_pending() -> CheckStatus {
    CheckStatus::Pending
}

/// A fee cheque tracked by the check-bounce screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRecord {
    pub id: RecordId,
    pub check_no: String,
    pub payer: String,
    #[serde(default)]
    pub bank: String,
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_pending")]
    pub status: CheckStatus,
}

impl Entity for CheckRecord {
    const KIND: &'static str = "checks";
    const SCHEMA: Schema = Schema {
        searchable: &["checkNo", "payer", "bank"],
        filterable: &["bank", "status"],
        sortable: &["checkNo", "payer", "amount", "date", "status"],
        export_columns: &["id", "checkNo", "payer", "bank", "amount", "date", "status"],
        unique_groups: &[&["checkNo", "bank"]],
        id_strategy: IdStrategy::Timestamp,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "checkNo" => FieldValue::Text(&self.check_no),
            "payer" => FieldValue::Text(&self.payer),
            "bank" => FieldValue::Text(&self.bank),
            "amount" => FieldValue::Number(self.amount),
            "date" => FieldValue::Text(&self.date),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub allocated: f64,
    #[serde(default)]
    pub spent: f64,
    #[serde(default = "default_active")]
    pub status: ActivityStatus,
}

impl BudgetCategory {
    pub fn remaining(&self) -> f64 {
        self.allocated - self.spent
    }
}

impl Entity for BudgetCategory {
    const KIND: &'static str = "budgets";
    const SCHEMA: Schema = Schema {
        searchable: &["name", "category"],
        filterable: &["category", "status"],
        sortable: &["name", "category", "allocated", "spent", "remaining"],
        export_columns: &["id", "name", "category", "allocated", "spent", "remaining", "status"],
        unique_groups: &[&["name"]],
        id_strategy: IdStrategy::NextInteger,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_field(&self.id),
            "name" => FieldValue::Text(&self.name),
            "category" => FieldValue::Text(&self.category),
            "allocated" => FieldValue::Number(self.allocated),
            "spent" => FieldValue::Number(self.spent),
            "remaining" => FieldValue::Number(self.remaining()),
            "status" => FieldValue::Text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }

    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        Some(&mut self.status)
    }
}

fn id_field(id: &RecordId) -> FieldValue<'_> {
    match id {
        RecordId::Num(n) => FieldValue::Number(*n as f64),
        RecordId::Text(s) => FieldValue::Text(s),
    }
}
