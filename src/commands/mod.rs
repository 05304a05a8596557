// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod transactions;
pub mod recurring;
pub mod summary;
pub mod balances;
pub mod tax;
pub mod exporter;
pub mod doctor;
pub mod settings;
