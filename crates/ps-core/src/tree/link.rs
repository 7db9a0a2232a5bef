//! Link stage: turn scanned records into processes with children.

use super::Process;
use crate::collect::ProcessRecord;
use ps_common::{Error, ProcessId, Result};
use std::collections::HashMap;
use tracing::warn;

/// Link every record to its parent.
///
/// Records are placed in a pid-sorted arena; children accumulate per arena
/// slot and are frozen into [`Process`] values only once every record has
/// been linked. A nonzero ppid that is not among the records fails with
/// [`Error::MissingParent`].
pub(crate) fn link(mut records: Vec<ProcessRecord>) -> Result<Vec<Process>> {
    records.sort_by_key(ProcessRecord::pid);

    let mut slots: HashMap<ProcessId, usize> = HashMap::with_capacity(records.len());
    for (slot, record) in records.iter().enumerate() {
        if slots.insert(record.pid(), slot).is_some() {
            return Err(Error::Internal(format!(
                "pid {} scanned twice in one snapshot",
                record.pid()
            )));
        }
    }

    let mut children: Vec<Vec<ProcessId>> = vec![Vec::new(); records.len()];
    for record in &records {
        let ppid = record.ppid();
        if ppid.is_none() {
            continue;
        }
        let Some(&slot) = slots.get(&ppid) else {
            warn!(pid = %record.pid(), %ppid, "parent missing from snapshot");
            return Err(Error::MissingParent {
                pid: record.pid().0,
                ppid: ppid.0,
            });
        };
        children[slot].push(record.pid());
    }

    for list in &mut children {
        list.sort_unstable();
        list.dedup();
    }

    Ok(records
        .into_iter()
        .zip(children)
        .map(|(record, children)| Process { record, children })
        .collect())
}
