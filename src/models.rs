// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub client_id: Option<i64>,
    pub shoot_date: Option<NaiveDate>,
    pub status: String, // active | completed | cancelled
    pub amount: Decimal,
    pub outsourcing_amt: Decimal,
    pub received_amt: Decimal,
    pub pending_amt: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub project_id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub project_id: Option<i64>,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPayment {
    pub id: i64,
    pub project_id: i64,
    pub income_id: Option<i64>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: String, // advance | partial | final
    pub note: Option<String>,
}

pub const PROJECT_STATUSES: [&str; 3] = ["active", "completed", "cancelled"];
pub const PAYMENT_TYPES: [&str; 3] = ["advance", "partial", "final"];
