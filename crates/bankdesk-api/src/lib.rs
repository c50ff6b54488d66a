//! bankdesk-api — mock banking lookup service
//!
//! An axum HTTP server answering balance, loan balance and loan status
//! lookups from a customer record set loaded once from JSON.

pub mod records;
pub mod server;

pub use records::{CustomerBook, CustomerRecord, RecordsError};
pub use server::LookupServer;
