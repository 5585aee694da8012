// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod clients;
pub mod projects;
pub mod incomes;
pub mod expenses;
pub mod payments;
pub mod budgets;
pub mod reports;
pub mod reconcile;
pub mod settings;
pub mod exporter;
