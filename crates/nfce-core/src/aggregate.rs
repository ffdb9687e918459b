//! Tax summaries and numbering gaps
//!
//! Both computations are pure functions of a finished batch.

use crate::error::AggregateError;
use crate::record::{DocumentRecord, LineItem, SequenceGap, SummaryRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Key used to bucket line items in the summary sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryGrouping {
    /// One bucket per (CST, CFOP); the rates of a bucket are listed together
    #[default]
    TaxCodes,
    /// One bucket per (CST, CFOP, rate)
    TaxCodesAndRate,
}

type BucketKey = (Option<String>, Option<String>, Option<String>);

#[derive(Default)]
struct Bucket {
    rates: BTreeSet<String>,
    product_value: Decimal,
    tax_base_value: Decimal,
    tax_amount: Decimal,
}

impl Bucket {
    fn add(&mut self, item: &LineItem, key: &BucketKey) -> Result<(), AggregateError> {
        let overflow = |field| AggregateError::Overflow {
            field,
            cst: key.0.clone(),
            cfop: key.1.clone(),
        };

        self.product_value = self
            .product_value
            .checked_add(item.product_value)
            .ok_or_else(|| overflow("vProd"))?;
        self.tax_base_value = self
            .tax_base_value
            .checked_add(item.tax_base_value)
            .ok_or_else(|| overflow("vBC"))?;
        self.tax_amount = self
            .tax_amount
            .checked_add(item.tax_amount)
            .ok_or_else(|| overflow("vICMS"))?;
        self.rates.insert(item.tax_rate.clone());
        Ok(())
    }
}

/// Numeric order for rate strings, falling back to text order
fn compare_rates(a: &str, b: &str) -> Ordering {
    match (Decimal::from_str(a), Decimal::from_str(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Group line items into summary buckets
///
/// Buckets come out in ascending key order. Items without CST or CFOP form
/// their own bucket (the missing code sorts first) and are never dropped.
///
/// # Errors
///
/// Returns `AggregateError::Overflow` when a bucket total leaves the decimal range.
pub fn summarize(
    items: &[LineItem],
    grouping: SummaryGrouping,
) -> Result<Vec<SummaryRecord>, AggregateError> {
    let mut buckets: BTreeMap<BucketKey, Bucket> = BTreeMap::new();

    for item in items {
        let rate = match grouping {
            SummaryGrouping::TaxCodes => None,
            SummaryGrouping::TaxCodesAndRate => Some(item.tax_rate.clone()),
        };
        let key = (
            item.tax_situation_code.clone(),
            item.operation_code.clone(),
            rate,
        );
        let bucket = buckets.entry(key.clone()).or_default();
        bucket.add(item, &key)?;
    }

    Ok(buckets
        .into_iter()
        .map(|((cst, cfop, _), bucket)| {
            let mut rates: Vec<String> = bucket.rates.into_iter().collect();
            rates.sort_by(|a, b| compare_rates(a, b));
            SummaryRecord {
                tax_situation_code: cst,
                operation_code: cfop,
                tax_rates: rates.join(", "),
                product_value: bucket.product_value,
                tax_base_value: bucket.tax_base_value,
                tax_amount: bucket.tax_amount,
            }
        })
        .collect())
}

/// Find breaks in a set of document numbers
///
/// Numbers are de-duplicated and sorted; every adjacent pair that is not
/// consecutive yields one gap, in ascending order.
#[must_use]
pub fn find_gaps<I>(numbers: I) -> Vec<SequenceGap>
where
    I: IntoIterator<Item = u64>,
{
    let numbers: BTreeSet<u64> = numbers.into_iter().collect();

    numbers
        .iter()
        .zip(numbers.iter().skip(1))
        .filter(|(previous, current)| **current - **previous != 1)
        .map(|(&previous_number, &current_number)| SequenceGap {
            previous_number,
            current_number,
        })
        .collect()
}

/// Find breaks in the numbering of a batch's documents
#[must_use]
pub fn detect_gaps(documents: &[DocumentRecord]) -> Vec<SequenceGap> {
    find_gaps(documents.iter().map(|d| d.document_number))
}
