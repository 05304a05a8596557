// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod month;
pub mod change;
pub mod ledger;
pub mod carry;
pub mod summary;
pub mod invalidation;
pub mod tax;
