//! Customer records — the read-only data behind the lookup service

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// One customer.
///
/// Amounts are `serde_json::Number`, so integers stay integers (`4500`) and
/// floats print in shortest round-trip form (`5000.0`, but `12000.50` prints
/// as `12000.5`). Trailing zeros after the first decimal are not kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub account_number: String,
    pub loan_id: String,
    pub account_balance: Number,
    pub loan_balance: Number,
    pub loan_status: String,
}

#[derive(Debug, Deserialize)]
struct DataFile {
    customers: Vec<CustomerRecord>,
}

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("failed to read customer data {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse customer data {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All customers known to the service
#[derive(Debug, Clone, Default)]
pub struct CustomerBook {
    customers: Vec<CustomerRecord>,
}

impl CustomerBook {
    /// Load `{"customers": [...]}` from a JSON file
    pub fn load(path: &Path) -> Result<Self, RecordsError> {
        let content = std::fs::read_to_string(path).map_err(|source| RecordsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data: DataFile =
            serde_json::from_str(&content).map_err(|source| RecordsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "Loaded {} customers from {}",
            data.customers.len(),
            path.display()
        );
        Ok(Self::from_records(data.customers))
    }

    pub fn from_records(customers: Vec<CustomerRecord>) -> Self {
        Self { customers }
    }

    /// First customer with this account number
    pub fn find_by_account(&self, account_number: &str) -> Option<&CustomerRecord> {
        self.customers
            .iter()
            .find(|c| c.account_number == account_number)
    }

    /// First customer with this loan ID
    pub fn find_by_loan(&self, loan_id: &str) -> Option<&CustomerRecord> {
        self.customers.iter().find(|c| c.loan_id == loan_id)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE: &str = r#"{
        "customers": [
            {"account_number": "123456789", "loan_id": "LN1001", "account_balance": 4500,
             "loan_balance": 12000, "loan_status": "Approved"},
            {"account_number": "987654321", "loan_id": "LN1002", "account_balance": 1500.75,
             "loan_balance": 5000.0, "loan_status": "Pending"}
        ]
    }"#;

    pub(crate) fn sample_book() -> CustomerBook {
        let data: DataFile = serde_json::from_str(SAMPLE).unwrap();
        CustomerBook::from_records(data.customers)
    }

    #[test]
    fn test_find_by_account_and_loan() {
        let book = sample_book();
        assert_eq!(book.len(), 2);
        assert_eq!(book.find_by_account("123456789").unwrap().loan_id, "LN1001");
        assert_eq!(
            book.find_by_loan("LN1002").unwrap().account_number,
            "987654321"
        );
        assert!(book.find_by_account("000000").is_none());
        assert!(book.find_by_loan("LN9999").is_none());
    }

    #[test]
    fn test_amounts_keep_their_json_text() {
        let book = sample_book();
        let first = book.find_by_account("123456789").unwrap();
        assert_eq!(first.account_balance.to_string(), "4500");
        let second = book.find_by_account("987654321").unwrap();
        assert_eq!(second.account_balance.to_string(), "1500.75");
        assert_eq!(second.loan_balance.to_string(), "5000.0");
    }

    #[test]
    fn test_float_amounts_use_shortest_form() {
        let record: CustomerRecord = serde_json::from_str(
            r#"{"account_number": "1", "loan_id": "LN1", "account_balance": 12000.50,
                "loan_balance": 0, "loan_status": "Pending"}"#,
        )
        .unwrap();
        assert_eq!(record.account_balance.to_string(), "12000.5");
        assert_eq!(record.loan_balance.to_string(), "0");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let book = CustomerBook::load(file.path()).unwrap();
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_load_errors() {
        let missing = CustomerBook::load(Path::new("/nonexistent/sample_data.json"));
        assert!(matches!(missing, Err(RecordsError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"clients\": []}").unwrap();
        let bad = CustomerBook::load(file.path());
        assert!(matches!(bad, Err(RecordsError::Parse { .. })));
    }

    #[test]
    fn test_shipped_sample_data_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/sample_data.json");
        let book = CustomerBook::load(&path).unwrap();
        assert!(book.find_by_account("123456789").is_some());
        assert!(book.find_by_loan("LN1002").is_some());
    }
}
