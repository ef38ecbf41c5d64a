//! Running numbers for pages like `Cycle 12.md`

use crate::error::Result;
use crate::path::VaultPath;
use crate::storage::{EntryKind, StorageError, StorageGateway};
use crate::template::SequenceRule;

/// One more than the highest `<prefix><N>` file in `folder`, or `rule.start`
pub(crate) fn next_sequence(
    storage: &dyn StorageGateway,
    folder: &VaultPath,
    rule: &SequenceRule,
) -> Result<u32> {
    let entries = match storage.list_children(folder) {
        Ok(entries) => entries,
        Err(StorageError::NotFound(_)) => return Ok(rule.start),
        Err(e) => return Err(e.into()),
    };

    let highest = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::File)
        .filter_map(|entry| sequence_number(&entry.name, &rule.prefix))
        .max();

    Ok(highest.map_or(rule.start, |n| n.saturating_add(1)))
}

fn sequence_number(name: &str, prefix: &str) -> Option<u32> {
    let rest = name.strip_prefix(prefix)?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
