//! Population balancing and scenario scoring.
//!
//! This module aggregates the prepared block table per grouping column,
//! derives the balance target (average and ±3% band) from the current ward
//! assignment, scores candidate assignments against it, and assembles the
//! named tables the workbook export writes out.

pub mod aggregate;
pub mod balance;
pub mod report;
pub mod scenario;
pub mod types;
