//! Name resolution from logical index back to the directory entry.
//!
//! Nothing but positions is kept between calls. Every lookup reopens the
//! entry through the directory handle, copies its name out and closes it
//! again, so at most one entry is open at any time.

use log::debug;

use crate::driver::{DirectoryHandle, EntryHandle, OpenMode};
use crate::error::{ExploreError, Result};
use crate::index::PositionIndex;
use crate::name::{clear_name, terminated_str};

/// Resolve logical index `logical` into `out`.
///
/// An index outside `[0, index.len())` leaves `out` untouched. An entry that
/// can no longer be opened yields the empty name.
pub fn resolve_name<D: DirectoryHandle>(
    dir: &mut D,
    index: &PositionIndex,
    logical: usize,
    out: &mut [u8],
) -> Result<usize> {
    let position = index.get(logical).ok_or(ExploreError::OutOfRangeIndex)?;

    match dir.open_at(position, OpenMode::ReadOnly) {
        Some(entry) => {
            let len = entry.name(out);
            entry.close();
            Ok(len)
        }
        None => {
            clear_name(out);
            Err(ExploreError::EntryOpenFailure)
        }
    }
}

/// Number of rows a window of `radius` covers.
pub fn window_rows(radius: usize) -> Option<usize> {
    radius.checked_mul(2)?.checked_add(1)
}

/// Resolve the names of `center - radius ..= center + radius` into `rows`.
///
/// `rows` is split into fixed `row_width` rows in ascending logical order.
/// Rows outside the index get the empty name; every row's last byte is
/// forced to NUL. With an empty index nothing is written and zero is
/// returned; otherwise the row count is returned.
pub fn resolve_window<D: DirectoryHandle>(
    dir: &mut D,
    index: &PositionIndex,
    center: usize,
    radius: usize,
    rows: &mut [u8],
    row_width: usize,
) -> Result<usize> {
    if index.is_empty() {
        return Ok(0);
    }

    let (count, needed) = window_layout(radius, rows.len(), row_width)?;
    for (row_no, row) in rows[..needed].chunks_exact_mut(row_width).enumerate() {
        let logical = center
            .checked_add(row_no)
            .and_then(|n| n.checked_sub(radius));

        match logical.and_then(|n| index.get(n)) {
            Some(position) => match dir.open_at(position, OpenMode::ReadOnly) {
                Some(entry) => {
                    entry.name(row);
                    entry.close();
                }
                None => {
                    debug!("window row {}: entry {} gone", row_no, position.index());
                    clear_name(row);
                }
            },
            None => clear_name(row),
        }

        row[row_width - 1] = 0;
    }

    Ok(count)
}

/// Fill the rows of a window with empty names, for when the directory
/// itself cannot be read. Same size rules and return value as
/// [`resolve_window`].
pub fn clear_window(radius: usize, rows: &mut [u8], row_width: usize) -> Result<usize> {
    let (count, needed) = window_layout(radius, rows.len(), row_width)?;
    for row in rows[..needed].chunks_exact_mut(row_width) {
        clear_name(row);
        row[row_width - 1] = 0;
    }
    Ok(count)
}

/// Row count and bytes used by a window of `radius`, if `available` bytes
/// hold it.
fn window_layout(radius: usize, available: usize, row_width: usize) -> Result<(usize, usize)> {
    let count = window_rows(radius).ok_or(ExploreError::WindowTooSmall)?;
    let needed = count
        .checked_mul(row_width)
        .ok_or(ExploreError::WindowTooSmall)?;
    if row_width == 0 || available < needed {
        return Err(ExploreError::WindowTooSmall);
    }
    Ok((count, needed))
}

/// Row `row_no` of a window buffer, read back as text.
pub fn window_row(rows: &[u8], row_width: usize, row_no: usize) -> &str {
    let start = row_no.saturating_mul(row_width);
    match rows.get(start..start.saturating_add(row_width)) {
        Some(row) if row_width > 0 => terminated_str(row),
        _ => "",
    }
}
