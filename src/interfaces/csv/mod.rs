//! Batch quoting over CSV.

pub mod quote_reader;
pub mod quote_writer;
