//! Summaries of a user's finances: totals, a running balance and expenses by category.

mod aggregation;
mod summary_endpoint;

pub use aggregation::{
    BalancePoint, Summary, Totals, calculate_category_breakdown, calculate_running_balance,
    calculate_totals, summarise,
};
pub use summary_endpoint::get_summary_endpoint;
