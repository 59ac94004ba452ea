//! Attendance-driven salary formula.
//!
//! Pay is derived from hours actually worked, not from the monthly salary:
//! an employee with no attendance in the month earns 0.

use crate::model::payroll::AdjustmentKind;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const WORKING_DAYS_PER_MONTH: Decimal = dec!(22);
pub const HOURS_PER_DAY: Decimal = dec!(8);
/// Largest value the `DECIMAL(12, 2)` money columns hold.
pub const MAX_MONEY: Decimal = dec!(9999999999.99);

#[derive(Debug, Clone, PartialEq)]
pub struct PayBreakdown {
    pub daily_rate: Decimal,
    pub hourly_rate: Decimal,
    pub attendance_pay: Decimal,
    pub unpaid_deduction: Decimal,
    /// Never negative; rounded to cents.
    pub net_salary: Decimal,
}

pub fn calculate(base_salary: Decimal, worked_hours: Decimal, unpaid_leave_days: u32) -> PayBreakdown {
    let daily_rate = base_salary / WORKING_DAYS_PER_MONTH;
    let hourly_rate = daily_rate / HOURS_PER_DAY;
    let attendance_pay = worked_hours * hourly_rate;
    let unpaid_deduction = Decimal::from(unpaid_leave_days) * HOURS_PER_DAY * hourly_rate;
    let net_salary = round_money((attendance_pay - unpaid_deduction).max(Decimal::ZERO));

    PayBreakdown {
        daily_rate,
        hourly_rate,
        attendance_pay,
        unpaid_deduction,
        net_salary,
    }
}

/// Monetary columns of a payroll row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollAmounts {
    pub base_salary: Decimal,
    pub bonuses: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
}

/// Adds `amount` to bonuses or deductions and recomputes the net as
/// `base + bonuses - deductions`.
///
/// Unlike [`calculate`], the result is not floored at zero. `None` when any
/// column would leave the storable range.
pub fn apply_adjustment(
    current: PayrollAmounts,
    kind: AdjustmentKind,
    amount: Decimal,
) -> Option<PayrollAmounts> {
    let (bonuses, deductions) = match kind {
        AdjustmentKind::Bonus => (current.bonuses.checked_add(amount)?, current.deductions),
        AdjustmentKind::Deduction => (current.bonuses, current.deductions.checked_add(amount)?),
    };
    let net_salary = round_money(
        current
            .base_salary
            .checked_add(bonuses)?
            .checked_sub(deductions)?,
    );

    let in_range = |v: Decimal| v.abs() <= MAX_MONEY;
    (in_range(bonuses) && in_range(deductions) && in_range(net_salary)).then_some(PayrollAmounts {
        base_salary: current.base_salary,
        bonuses,
        deductions,
        net_salary,
    })
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
