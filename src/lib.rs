//! Core library for the marmoset-bids command line application.
//!
//! The library converts the spreadsheet metadata of the NA216 marmoset MRI
//! dataset into BIDS-style tab-separated tables. Spreadsheet and TSV adapters
//! live under [`io`], the cell model inside [`model`], path conventions in
//! [`layout`], and one module per output family: [`participants`],
//! [`variables`] and [`labels`]. [`convert`] runs them in order.

pub mod convert;
pub mod error;
pub mod io;
pub mod labels;
pub mod layout;
pub mod model;
pub mod participants;
pub mod variables;

pub use error::{Result, ToolError};
