//! Namespace-aware element accessors over a parsed NFC-e tree
//!
//! Lookups return `Option` and never substitute defaults themselves. The
//! decoding helpers at the bottom of the module are where each field states
//! whether absence means a default or a failure.

use crate::error::{ExtractError, Result};
use chrono::NaiveDate;
use roxmltree::Node;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// XML namespace of NF-e / NFC-e documents
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// An element in the NF-e namespace
#[derive(Debug, Clone, Copy)]
pub struct NfeElement<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input: 'a> NfeElement<'a, 'input> {
    #[inline]
    #[must_use]
    pub fn new(node: Node<'a, 'input>) -> Self {
        Self { node }
    }

    /// Local name of the element, without namespace
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &'a str {
        self.node.tag_name().name()
    }

    #[inline]
    fn matches(node: &Node<'_, '_>, name: &str) -> bool {
        node.is_element() && node.has_tag_name((NFE_NAMESPACE, name))
    }

    /// Direct child with the given local name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Self> {
        self.node
            .children()
            .find(|n| Self::matches(n, name))
            .map(Self::new)
    }

    /// First descendant (excluding this element) with the given local name
    #[must_use]
    pub fn descendant(&self, name: &str) -> Option<Self> {
        self.node
            .descendants()
            .skip(1)
            .find(|n| Self::matches(n, name))
            .map(Self::new)
    }

    /// All descendants (excluding this element) with the given local name, in document order
    pub fn descendants(&self, name: &'a str) -> impl Iterator<Item = Self> + 'a {
        self.node
            .descendants()
            .skip(1)
            .filter(move |n| Self::matches(n, name))
            .map(Self::new)
    }

    /// First descendant with the given local name, or `MissingElement`
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::MissingElement` when no such element exists.
    pub fn require_descendant(&self, name: &'static str) -> Result<Self> {
        self.descendant(name)
            .ok_or(ExtractError::MissingElement(name))
    }

    /// Follow a chain of direct children
    #[must_use]
    pub fn at(&self, path: &[&str]) -> Option<Self> {
        path.iter()
            .try_fold(*self, |element, name| element.child(name))
    }

    /// Element children regardless of name (used for ICMS group wrappers such as `ICMS00`)
    pub fn element_children(&self) -> impl Iterator<Item = Self> + 'a {
        self.node.children().filter(Node::is_element).map(Self::new)
    }

    /// Trimmed text content; `None` when absent or blank
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.node
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Text of the element reached by `path`
    #[must_use]
    pub fn text_at(&self, path: &[&str]) -> Option<&'a str> {
        self.at(path).and_then(|element| element.text())
    }

    /// Attribute value (attributes of NF-e elements are not namespaced)
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node.attribute(name)
    }
}

// =============================================================================
// Field decoding
// =============================================================================

/// Required non-negative integer
///
/// # Errors
///
/// `MissingElement` when absent, `InvalidNumber` when not all digits.
pub fn required_number(field: &'static str, raw: Option<&str>) -> Result<u64> {
    let raw = raw.ok_or(ExtractError::MissingElement(field))?;
    raw.parse::<u64>()
        .map_err(|_| ExtractError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Decimal amount that defaults to zero when absent
///
/// # Errors
///
/// `InvalidDecimal` when present but not a decimal number.
pub fn decimal_or_zero(field: &'static str, raw: Option<&str>) -> Result<Decimal> {
    raw.map_or(Ok(Decimal::ZERO), |raw| parse_decimal(field, raw))
}

/// Percentage rendered with two fraction digits, `"0.00"` when absent
///
/// # Errors
///
/// `InvalidDecimal` when present but not a decimal number.
pub fn rate_or_default(field: &'static str, raw: Option<&str>) -> Result<String> {
    let rate = decimal_or_zero(field, raw)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    Ok(format!("{rate:.2}"))
}

/// Date taken from the first ten characters of an ISO timestamp
///
/// `2024-03-05T10:15:00-03:00` yields 2024-03-05; the offset is not applied,
/// so the date is the issuer's local date.
///
/// # Errors
///
/// `InvalidDate` when present but not starting with `YYYY-MM-DD`.
pub fn optional_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(Some)
        .ok_or_else(|| ExtractError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|_| ExtractError::InvalidDecimal {
        field,
        value: raw.to_string(),
    })
}
