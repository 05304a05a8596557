// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use crate::error::{BalanceError, BalanceResult};
use crate::models::Direction;

/// Anything that moves a balance by a non-negative amount in one direction.
pub trait Movement {
    fn direction(&self) -> Direction;
    fn amount(&self) -> Decimal;
}

impl Movement for (Direction, Decimal) {
    fn direction(&self) -> Direction {
        self.0
    }

    fn amount(&self) -> Decimal {
        self.1
    }
}

impl<T: Movement + ?Sized> Movement for &T {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn amount(&self) -> Decimal {
        (**self).amount()
    }
}

pub fn checked_add(a: Decimal, b: Decimal) -> BalanceResult<Decimal> {
    a.checked_add(b).ok_or(BalanceError::Overflow)
}

/// Sum of `values`, failing instead of panicking when it leaves `Decimal`'s range.
pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> BalanceResult<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, checked_add)
}

/// Income minus expense. Zero for an empty set.
pub fn net_change<I>(movements: I) -> BalanceResult<Decimal>
where
    I: IntoIterator,
    I::Item: Movement,
{
    movements
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, m| checked_add(acc, m.direction().apply(m.amount())))
}

/// `(income, expense)` totals, both as positive magnitudes.
pub fn totals<I>(movements: I) -> BalanceResult<(Decimal, Decimal)>
where
    I: IntoIterator,
    I::Item: Movement,
{
    movements
        .into_iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), m| match m.direction() {
            Direction::Income => Ok((checked_add(inc, m.amount())?, exp)),
            Direction::Expense => Ok((inc, checked_add(exp, m.amount())?)),
        })
}
