//! Scanning a single listed process into a [`ProcessRecord`].

use super::source::{ProcessHandle, ProcessSource};
use super::stat::parse_stat;
use super::types::{AuxPolicy, ProcessRecord, ScanOptions};
use ps_common::{AuxField, Error, Result};
use std::io;
use tracing::{debug, trace};

/// Outcome of scanning one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The stat record was read and parsed.
    Found(ProcessRecord),
    /// The process exited between listing and reading.
    Vanished,
}

impl ScanOutcome {
    pub fn into_record(self) -> Option<ProcessRecord> {
        match self {
            ScanOutcome::Found(record) => Some(record),
            ScanOutcome::Vanished => None,
        }
    }
}

/// Scan one process.
///
/// Reads and parses the stat record, then each selected auxiliary field
/// in turn. A process that is gone by the time its stat record is read
/// yields [`ScanOutcome::Vanished`]; a stat record of the wrong shape, or
/// one naming a pid other than the listed one, is an
/// [`Error::MalformedRecord`].
pub fn scan_process<S>(
    source: &S,
    handle: &ProcessHandle,
    options: &ScanOptions,
) -> Result<ScanOutcome>
where
    S: ProcessSource + ?Sized,
{
    let data = match source.read_primary_record(handle) {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!(pid = %handle.pid(), "process vanished before its stat record was read");
            return Ok(ScanOutcome::Vanished);
        }
        Err(source) => {
            return Err(Error::PrimaryRead {
                path: handle.stat_path(),
                source,
            })
        }
    };

    let stat = parse_stat(&data, &handle.stat_path())?;
    if stat.pid != handle.pid() {
        return Err(Error::MalformedRecord {
            path: handle.stat_path(),
            message: format!("record is for pid {}, not {}", stat.pid, handle.pid()),
        });
    }
    let mut record = ProcessRecord::new(stat);

    for field in AuxField::ALL {
        if !options.aux_fields.contains(field) {
            continue;
        }
        match source.read_aux_field(handle, field) {
            Ok(value) => record.set_aux(field, value),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                trace!(pid = %handle.pid(), %field, "auxiliary field not readable");
            }
            Err(e) => match options.aux_policy {
                AuxPolicy::Strict => {
                    return Err(Error::AuxiliaryField {
                        field,
                        path: handle.aux_path(field),
                        source: e,
                    })
                }
                AuxPolicy::Lenient => {
                    debug!(pid = %handle.pid(), %field, error = %e, "ignoring auxiliary field read failure");
                }
            },
        }
    }

    Ok(ScanOutcome::Found(record))
}
