//! Demo rows each screen starts with when nothing is stored yet.

use crate::entities::{BudgetCategory, CheckRecord, CheckStatus, School, StaffMember, Student, Teacher};
use crate::record::{ActivityStatus, RecordId};

use ActivityStatus::{Active, Inactive};

pub fn students() -> Vec<Student> {
    let rows = [
        (1, "Aarav Sharma", "R-101", "5", "A", "aarav.s@greenfield.edu", "Meera Sharma", Active),
        (2, "Diya Patel", "R-102", "5", "A", "diya.p@greenfield.edu", "Rakesh Patel", Active),
        (3, "Kabir Singh", "R-103", "5", "B", "kabir.s@greenfield.edu", "Harpreet Singh", Inactive),
        (4, "Ananya Iyer", "R-201", "6", "A", "ananya.i@greenfield.edu", "Lakshmi Iyer", Active),
        (5, "Vihaan Gupta", "R-202", "6", "B", "vihaan.g@greenfield.edu", "Sunil Gupta", Active),
        (6, "Ishita Rao", "R-203", "6", "B", "ishita.r@greenfield.edu", "Kiran Rao", Active),
        (7, "Arjun Nair", "R-301", "7", "A", "arjun.n@greenfield.edu", "Deepa Nair", Inactive),
        (8, "Saanvi Joshi", "R-302", "7", "A", "saanvi.j@greenfield.edu", "Amit Joshi", Active),
    ];
    rows.into_iter()
        .map(|(id, name, roll, class, section, email, guardian, status)| Student {
            id: RecordId::Num(id),
            name: name.into(),
            roll_no: roll.into(),
            class_name: class.into(),
            section: section.into(),
            email: email.into(),
            guardian: guardian.into(),
            status,
        })
        .collect()
}

pub fn teachers() -> Vec<Teacher> {
    let rows = [
        (1, "Neha Kapoor", "neha.k@greenfield.edu", "Mathematics", Some(1), Some("5"), Some("A"), Active),
        (2, "Rohan Mehta", "rohan.m@greenfield.edu", "Science", Some(1), Some("6"), Some("B"), Active),
        (3, "Priya Desai", "priya.d@sunshine.edu", "English", Some(2), None, None, Active),
        (4, "Vikram Reddy", "vikram.r@excellence.edu", "History", Some(3), Some("7"), Some("A"), Inactive),
    ];
    rows.into_iter()
        .map(|(id, name, email, subject, school, class, section, status)| Teacher {
            id: RecordId::Num(id),
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            school_id: school,
            incharge_class: class.map(Into::into),
            incharge_section: section.map(Into::into),
            status,
        })
        .collect()
}

pub fn schools() -> Vec<School> {
    let rows = [
        (1, "Greenfield Public School", "GPS-01", "info@greenfield.edu", "12 Park Avenue", Active),
        (2, "Sunshine Academy", "SUN-02", "contact@sunshine.edu", "48 Lake Road", Active),
        (3, "Excellence International", "EXC-03", "admin@excellence.edu", "7 Ring Road", Inactive),
    ];
    rows.into_iter()
        .map(|(id, name, code, email, address, status)| School {
            id: RecordId::Num(id),
            name: name.into(),
            code: code.into(),
            email: email.into(),
            address: address.into(),
            status,
        })
        .collect()
}

pub fn staff() -> Vec<StaffMember> {
    let rows = [
        ("1700000000001", "Sunita Verma", "Accountant", "Finance", "sunita.v@greenfield.edu", "555-0101", Active),
        ("1700000000002", "Manoj Kumar", "Librarian", "Library", "manoj.k@greenfield.edu", "555-0102", Active),
        ("1700000000003", "Farah Khan", "Counselor", "Student Services", "farah.k@greenfield.edu", "555-0103", Inactive),
        ("1700000000004", "George Thomas", "Driver", "Transport", "george.t@greenfield.edu", "555-0104", Active),
    ];
    rows.into_iter()
        .map(|(id, name, role, dept, email, phone, status)| StaffMember {
            id: RecordId::Text(id.into()),
            name: name.into(),
            role: role.into(),
            department: dept.into(),
            email: email.into(),
            phone: phone.into(),
            status,
        })
        .collect()
}

pub fn checks() -> Vec<CheckRecord> {
    let rows = [
        ("1700000000101", "004512", "Rakesh Patel", "City Bank", 1200.0, "2024-04-02", CheckStatus::Cleared),
        ("1700000000102", "117803", "Sunil Gupta", "National Bank", 1200.0, "2024-04-05", CheckStatus::Bounced),
        ("1700000000103", "220019", "Amit Joshi", "City Bank", 950.0, "2024-04-09", CheckStatus::Pending),
        ("1700000000104", "009934", "Kiran Rao", "Union Bank", 1500.0, "2024-04-11", CheckStatus::Bounced),
    ];
    rows.into_iter()
        .map(|(id, no, payer, bank, amount, date, status)| CheckRecord {
            id: RecordId::Text(id.into()),
            check_no: no.into(),
            payer: payer.into(),
            bank: bank.into(),
            amount,
            date: date.into(),
            status,
        })
        .collect()
}

pub fn budgets() -> Vec<BudgetCategory> {
    let rows = [
        (1, "Library Books", "academic", 50000.0, 32000.0, Active),
        (2, "Sports Equipment", "sports", 30000.0, 31500.0, Active),
        (3, "Science Lab", "academic", 75000.0, 41000.0, Active),
        (4, "Office Supplies", "admin", 12000.0, 4000.0, Active),
        (5, "Annual Day", "events", 25000.0, 0.0, Inactive),
        (6, "Transport Fuel", "admin", 40000.0, 38000.0, Active),
    ];
    rows.into_iter()
        .map(|(id, name, category, allocated, spent, status)| BudgetCategory {
            id: RecordId::Num(id),
            name: name.into(),
            category: category.into(),
            allocated,
            spent,
            status,
        })
        .collect()
}
