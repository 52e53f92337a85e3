//! Core ledger rules for Tally.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! Every decision an operation makes about money (how an expense splits,
//! whether a repayment fits under its cap, which row to lock first) lives
//! here; `tally-db` only reads locked rows, asks, and writes the answer back.
//!
//! # Modules
//!
//! - `ledger` - Balance rules, lock ordering, validation, threshold events
//! - `subscription` - Billing frequencies and the catch-up driver

pub mod ledger;
pub mod subscription;
