use crate::model::{
    attendance::Attendance,
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
};
use crate::payroll::month::Month;
use rust_decimal::Decimal;

/// Sum of `hours_worked` over the attendance rows dated inside `month`.
///
/// Rows still waiting for a check-out contribute whatever is stored (0 until
/// check-out).
pub fn worked_hours<'a, I>(records: I, month: Month) -> Decimal
where
    I: IntoIterator<Item = &'a Attendance>,
{
    records
        .into_iter()
        .filter(|a| month.contains(a.date))
        .map(|a| a.hours_worked)
        .sum()
}

/// Number of approved unpaid leave requests starting inside `month`.
///
/// Every request counts as a single day whatever its span, and one that
/// crosses into the next month is attributed to its start month only.
pub fn unpaid_leave_days<'a, I>(leaves: I, month: Month) -> u32
where
    I: IntoIterator<Item = &'a LeaveRequest>,
{
    leaves
        .into_iter()
        .filter(|l| {
            l.status == LeaveStatus::Approved
                && l.leave_type == LeaveType::Unpaid
                && month.contains(l.start_date)
        })
        .count() as u32
}
