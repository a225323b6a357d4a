//! Domain services for the dairy shop backend.
//!
//! One canonical implementation per flow, each parameterized by the
//! injected store (and mailer, where mail is sent):
//! - [`OrderService`] — order placement, retrieval, and the admin status
//!   workflow
//! - [`CartService`] — the user's embedded cart
//! - [`CatalogService`] — product catalog reads and admin CRUD
//! - [`AccountService`] — signup, login, profile updates
//! - [`ReportService`] — sales reporting and the admin dashboard

pub mod account;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod notify;
pub mod orders;
pub mod reports;

pub use account::{AccountService, Credentials, Signup, UpdateProfile};
pub use cart::{CartLine, CartService};
pub use catalog::{CatalogService, NewProduct, ProductUpdate};
pub use error::DomainError;
pub use notify::{InMemoryMailer, MailError, Mailer, OutboundMail};
pub use orders::{
    AdminOrderView, BuyerSummary, OrderItemView, OrderService, OrderView, PlaceOrder,
    PlaceOrderItem, ShippingDetails,
};
pub use reports::{DashboardSummary, ReportService, SalesPeriod, SalesReport};
