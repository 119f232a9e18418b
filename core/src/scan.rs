//! Index builder: one pass over the working directory.

use log::debug;

use crate::config::MAX_NAME_SCRATCH;
use crate::driver::{DirectoryHandle, EntryHandle, OpenMode};
use crate::error::{ExploreError, Result};
use crate::filter::matches_suffix;
use crate::index::PositionIndex;
use crate::name::terminated_str;

/// Rebuild `index` from the files in `dir` whose names end with `filter`.
///
/// The index is cleared first, even when the directory turns out not to be
/// open. Hidden files and subdirectories are skipped. Names are read into a
/// scratch buffer of `max_name_len` bytes, so the filter sees the name as
/// the resolver would return it. Stops once the index is full.
pub fn scan_directory<D: DirectoryHandle>(
    dir: &mut D,
    filter: &[u8],
    index: &mut PositionIndex,
    max_name_len: usize,
) -> Result<usize> {
    index.clear();
    if !dir.is_open() {
        return Err(ExploreError::DirectoryUnavailable);
    }

    let mut scratch = [0u8; MAX_NAME_SCRATCH];
    let name_buf = &mut scratch[..max_name_len.clamp(1, MAX_NAME_SCRATCH)];

    dir.rewind();
    while !index.is_full() {
        let Some(candidate) = dir.open_next(OpenMode::ReadOnly) else {
            break;
        };

        if candidate.is_file() && !candidate.is_hidden() {
            let len = candidate.name(name_buf);
            if matches_suffix(&name_buf[..len], filter) {
                let position = candidate.dir_index();
                index.push(position);
                debug!(
                    "{} - Folder Index: {} - System Index: {}",
                    terminated_str(name_buf),
                    position.index(),
                    index.len() - 1
                );
            }
        }

        candidate.close();
    }

    if index.is_full() {
        debug!("scan stopped at capacity ({} files)", index.capacity());
    }
    Ok(index.len())
}
