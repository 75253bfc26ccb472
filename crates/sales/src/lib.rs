//! `storekeep-sales` — checkout records and totals computation.

pub mod check;

pub use check::{Check, CheckNumber, CheckTotals, Sale, VAT_RATE, compute_totals};
