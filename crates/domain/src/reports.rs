//! Sales reporting and the admin dashboard.

use chrono::{DateTime, Datelike, Duration, Utc};
use common::Money;
use serde::Serialize;
use store::{CategorySales, OrderStatus, SalesBucket, SalesGranularity, Store};

use crate::error::DomainError;
use crate::orders::{AdminOrderView, BuyerSummary, OrderItemView, OrderView};

/// How many recent orders the dashboard shows.
const DASHBOARD_RECENT_ORDERS: u32 = 5;

/// Reporting window selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalesPeriod {
    /// The last 7 days including today.
    #[default]
    Week,
    /// The last 31 days including today.
    Month,
    /// The current calendar year.
    Year,
}

impl SalesPeriod {
    /// Parses the query-string selector; anything unrecognized falls back
    /// to the weekly window.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("month") => SalesPeriod::Month,
            Some("year") => SalesPeriod::Year,
            _ => SalesPeriod::Week,
        }
    }

    /// Returns the selector name as served.
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesPeriod::Week => "week",
            SalesPeriod::Month => "month",
            SalesPeriod::Year => "year",
        }
    }

    /// The window start: now minus 6 days, now minus 30 days, or January 1
    /// of the current year (keeping the time of day, so the year window is
    /// exact to the day like the others).
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            SalesPeriod::Week => now - Duration::days(6),
            SalesPeriod::Month => now - Duration::days(30),
            SalesPeriod::Year => now - Duration::days(i64::from(now.ordinal0())),
        }
    }

    /// Chart bucketing: daily, except the year view which groups by month.
    pub fn granularity(&self) -> SalesGranularity {
        match self {
            SalesPeriod::Year => SalesGranularity::Monthly,
            _ => SalesGranularity::Daily,
        }
    }
}

/// The sales report served to the back-office charts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    /// Completed-order revenue inside the window.
    pub total_sales: Money,
    /// Orders of any status inside the window.
    pub monthly_orders: u64,
    /// Pending orders regardless of date.
    pub pending_orders: u64,
    /// Completed revenue per date bucket, ascending.
    pub daily_sales: Vec<SalesBucket>,
    /// Completed revenue per product category, descending.
    pub sales_by_category: Vec<CategorySales>,
    pub period: &'static str,
}

/// The admin dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: u64,
    pub recent_orders: Vec<AdminOrderView>,
    /// All-time completed revenue.
    pub total_sales: Money,
}

/// Read-only reporting over the order store; recomputed on every call.
pub struct ReportService<S: Store> {
    store: S,
}

impl<S: Store> ReportService<S> {
    /// Creates a new report service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Computes the sales report for a window.
    #[tracing::instrument(skip(self))]
    pub async fn sales(&self, period: SalesPeriod) -> Result<SalesReport, DomainError> {
        let start = period.start(Utc::now());

        let total_sales = self.store.completed_total_since(Some(start)).await?;
        let monthly_orders = self.store.count_orders_since(start).await?;
        let pending_orders = self
            .store
            .count_orders_with_status(OrderStatus::Pending)
            .await?;
        let daily_sales = self
            .store
            .sales_buckets(start, period.granularity())
            .await?;
        let sales_by_category = self.store.sales_by_category(start).await?;

        Ok(SalesReport {
            total_sales,
            monthly_orders,
            pending_orders,
            daily_sales,
            sales_by_category,
            period: period.as_str(),
        })
    }

    /// Computes the dashboard summary.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary, DomainError> {
        let product_count = self.store.count_products().await?;
        let total_sales = self.store.completed_total_since(None).await?;

        let orders = self.store.list_recent_orders(DASHBOARD_RECENT_ORDERS).await?;
        let mut recent_orders = Vec::with_capacity(orders.len());
        for order in orders {
            let user = self.store.get_user(order.user_id).await?.map(|u| BuyerSummary {
                id: u.id,
                username: u.username,
                email: u.email,
            });
            let items = order
                .items
                .iter()
                .map(|item| OrderItemView {
                    product: None,
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect();
            recent_orders.push(AdminOrderView {
                user,
                order: OrderView {
                    id: order.id,
                    user_id: order.user_id,
                    items,
                    total: order.total,
                    shipping_address: order.shipping_address,
                    payment_method: order.payment_method,
                    status: order.status,
                    created_at: order.created_at,
                },
            });
        }

        Ok(DashboardSummary {
            product_count,
            recent_orders,
            total_sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_defaults_to_week() {
        assert_eq!(SalesPeriod::parse(None), SalesPeriod::Week);
        assert_eq!(SalesPeriod::parse(Some("month")), SalesPeriod::Month);
        assert_eq!(SalesPeriod::parse(Some("year")), SalesPeriod::Year);
        assert_eq!(SalesPeriod::parse(Some("quarter")), SalesPeriod::Week);
    }

    #[test]
    fn start_windows() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();

        assert_eq!(
            SalesPeriod::Week.start(now),
            Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap()
        );
        assert_eq!(
            SalesPeriod::Month.start(now),
            Utc.with_ymd_and_hms(2026, 7, 7, 12, 0, 0).unwrap()
        );
        assert_eq!(
            SalesPeriod::Year.start(now),
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn year_buckets_monthly_others_daily() {
        assert_eq!(SalesPeriod::Week.granularity(), SalesGranularity::Daily);
        assert_eq!(SalesPeriod::Month.granularity(), SalesGranularity::Daily);
        assert_eq!(SalesPeriod::Year.granularity(), SalesGranularity::Monthly);
    }
}
