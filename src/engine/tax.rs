// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Resident tax: an annual amount paid in four installments (June, August and
//! October of the fiscal year, January of the next).

use rust_decimal::{Decimal, RoundingStrategy};

use crate::engine::month::YearMonth;
use crate::error::BalanceResult;
use crate::models::ensure_non_negative;

const INSTALLMENT_MONTHS: [(i32, u32); 4] = [(0, 6), (0, 8), (0, 10), (1, 1)];

/// Installment schedule for `annual` in `fiscal_year`. Installments are whole
/// units; the remainder goes to the first one so the four always add up to
/// `annual`.
pub fn installments(fiscal_year: i32, annual: Decimal) -> BalanceResult<Vec<(YearMonth, Decimal)>> {
    ensure_non_negative(annual)?;
    let base = (annual / Decimal::from(4)).round_dp_with_strategy(0, RoundingStrategy::ToZero);
    let first = annual - base * Decimal::from(3);

    INSTALLMENT_MONTHS
        .iter()
        .enumerate()
        .map(|(i, (year_offset, month))| {
            let ym = YearMonth::new(fiscal_year + year_offset, *month)?;
            Ok((ym, if i == 0 { first } else { base }))
        })
        .collect()
}
