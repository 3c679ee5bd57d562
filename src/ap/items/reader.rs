use std::io::Read;

use tracing::debug;

use crate::ap::config::InputConfig;
use crate::ap::error::{AprioriError, Result};
use crate::ap::items::ItemBase;
use crate::ap::tract::TransactionBag;

/// Reads whitespace/separator delimited records, one transaction each.
///
/// Every record gets weight 1. Records whose first character is the
/// comment character and records without any item are skipped.
pub fn read_transactions<R: Read>(
    mut reader: R,
    input: &InputConfig,
    base: &mut ItemBase,
) -> Result<TransactionBag> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(AprioriError::FileRead)?;

    let mut bag = TransactionBag::new();
    let mut skipped = 0usize;
    for record in text.split(|c| input.record_separators.contains(c)) {
        let record = record.trim_matches(|c| input.blanks.contains(c));
        if record.is_empty() {
            continue;
        }
        if input.comment.chars().next().is_some_and(|c| record.starts_with(c)) {
            skipped += 1;
            continue;
        }
        let names: Vec<&str> = record
            .split(|c| input.field_separators.contains(c) || input.blanks.contains(c))
            .filter(|name| !name.is_empty())
            .collect();
        let transaction = base.register(&names, 1);
        bag.push(transaction);
    }
    debug!(
        transactions = bag.len(),
        items = base.len(),
        comments = skipped,
        "read transactions"
    );
    Ok(bag)
}
