//! Status derivation and the namespaced fields outcomes are written to.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParseError;
use crate::models::{Outcome, ResponseItem};

/// Object key → outcome, for one reconciliation pass.
pub type StatusMap = BTreeMap<String, Outcome>;

/// HTTP status code every item of a successful chain must carry.
pub const OK_STATUS: u16 = 200;

/// Crawl outcome of a chain.
///
/// `Success` iff the chain is non-empty and every item has status 200.
pub fn derive_status(items: &[ResponseItem]) -> Outcome {
    if !items.is_empty() && items.iter().all(|i| i.status_code == OK_STATUS) {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}

/// Parse outcome: only whether the parser raised, never the HTTP status.
pub fn parse_outcome<T>(result: &Result<T, ParseError>) -> Outcome {
    match result {
        Ok(_) => Outcome::Success,
        Err(_) => Outcome::Failure,
    }
}

/// Which status field an outcome is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Crawl,
    Parse,
}

impl StatusKind {
    pub fn field_name(&self) -> &'static str {
        match self {
            StatusKind::Crawl => "crawl_status",
            StatusKind::Parse => "parse_status",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Dotted path of a handler-scoped field: `<namespace>.<collector>.<field>`.
pub fn namespaced_field(namespace: &str, collector: &str, field: &str) -> String {
    format!("{}.{}.{}", namespace, collector, field)
}

/// Field holding the parsed data object of a handler.
pub const DATA_FIELD: &str = "data";

/// Dotted path of a status field, e.g. `pricera.rozetka_product.crawl_status`.
pub fn status_field(namespace: &str, collector: &str, kind: StatusKind) -> String {
    namespaced_field(namespace, collector, kind.field_name())
}

/// Dotted path of the parsed data object, e.g. `pricera.rozetka_product.data`.
pub fn data_field(namespace: &str, collector: &str) -> String {
    namespaced_field(namespace, collector, DATA_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: u16) -> ResponseItem {
        ResponseItem::new("https://example.com", "", status, "k")
    }

    #[test]
    fn test_all_200_is_success() {
        assert_eq!(derive_status(&[item(200), item(200)]), Outcome::Success);
    }

    #[test]
    fn test_any_non_200_is_failure() {
        assert_eq!(derive_status(&[item(200), item(404)]), Outcome::Failure);
        assert_eq!(derive_status(&[item(301)]), Outcome::Failure);
    }

    #[test]
    fn test_empty_chain_is_failure() {
        assert_eq!(derive_status(&[]), Outcome::Failure);
    }

    #[test]
    fn test_parse_outcome_ignores_value() {
        let ok: Result<u8, ParseError> = Ok(1);
        let err: Result<u8, ParseError> = Err(ParseError::new("bad"));
        assert_eq!(parse_outcome(&ok), Outcome::Success);
        assert_eq!(parse_outcome(&err), Outcome::Failure);
    }

    #[test]
    fn test_status_field_paths() {
        assert_eq!(
            status_field("pricera", "rozetka_product", StatusKind::Crawl),
            "pricera.rozetka_product.crawl_status"
        );
        assert_eq!(
            status_field("pricera", "rozetka_product", StatusKind::Parse),
            "pricera.rozetka_product.parse_status"
        );
        assert_eq!(
            data_field("pricera", "rozetka_product"),
            "pricera.rozetka_product.data"
        );
    }
}
