//! Record grouping (map stage)
//!
//! Re-keys each input line by its document id so the shuffle can bring every
//! fragment of a target graph together. Pure: no state, no I/O.

use graphmatch_core::{DocumentId, Record};

/// `"<id>\t<payload>"` → `(id, record)`; the record keeps the full line.
pub fn group_record(line: impl Into<String>) -> graphmatch_core::Result<(DocumentId, Record)> {
    let record = Record::parse(line)?;
    Ok((record.document_id(), record))
}
