//! Row types for the sales reporting queries.

use common::Money;
use serde::Serialize;

/// How completed orders are bucketed in the sales chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesGranularity {
    /// One bucket per calendar day, keyed `YYYY-MM-DD`.
    Daily,
    /// One bucket per calendar month, keyed `YYYY-MM`.
    Monthly,
}

impl SalesGranularity {
    /// The `to_char`-compatible key format for this granularity.
    pub fn key_format(&self) -> &'static str {
        match self {
            SalesGranularity::Daily => "YYYY-MM-DD",
            SalesGranularity::Monthly => "YYYY-MM",
        }
    }

    /// The equivalent chrono format string.
    pub fn chrono_format(&self) -> &'static str {
        match self {
            SalesGranularity::Daily => "%Y-%m-%d",
            SalesGranularity::Monthly => "%Y-%m",
        }
    }
}

/// Completed sales for one date bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesBucket {
    /// Bucket key (`YYYY-MM-DD` or `YYYY-MM`).
    pub date: String,
    pub sales: Money,
    pub count: u64,
}

/// Completed sales for one product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub sales: Money,
}
