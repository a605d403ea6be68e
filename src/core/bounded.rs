//! Copy-out into caller-sized buffers
//!
//! Every string handed out through a fixed-capacity buffer follows the same
//! rule:
//!
//! - no buffer (or an empty one): report the full length, copy nothing
//! - fits with room for the terminator: copy, terminate, report the length
//! - does not fit, capacity >= 4: copy `capacity - 1` bytes, replace the
//!   last three with `...`, terminate, report `capacity - 1`
//! - does not fit, capacity < 4: report nothing

/// Result of a bounded copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Data copied whole (or, with no buffer, the length it needs)
    Found(usize),
    /// Data cut short and marked with an ellipsis
    Truncated(usize),
    /// No such item
    NotFound,
    /// Item exists but the buffer cannot hold even a truncated copy
    Invalid,
}

impl CopyOutcome {
    /// Bytes written before the terminator, 0 when nothing usable was produced
    pub fn len(&self) -> usize {
        match *self {
            CopyOutcome::Found(len) | CopyOutcome::Truncated(len) => len,
            CopyOutcome::NotFound | CopyOutcome::Invalid => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CopyOutcome::Found(_) | CopyOutcome::Truncated(_))
    }
}

/// Clear a caller buffer to an empty C string
pub fn clear(out: Option<&mut [u8]>) {
    if let Some(first) = out.and_then(|buf| buf.first_mut()) {
        *first = 0;
    }
}

/// Copy `data` into `out` under the truncation contract
pub fn copy_bounded(data: &[u8], out: Option<&mut [u8]>) -> CopyOutcome {
    let out = match out {
        Some(out) if !out.is_empty() => out,
        _ => return CopyOutcome::Found(data.len()),
    };

    let capacity = out.len();
    if data.len() < capacity {
        out[..data.len()].copy_from_slice(data);
        out[data.len()] = 0;
        CopyOutcome::Found(data.len())
    } else if capacity >= 4 {
        let kept = capacity - 1;
        out[..kept].copy_from_slice(&data[..kept]);
        out[kept - 3..kept].copy_from_slice(b"...");
        out[kept] = 0;
        CopyOutcome::Truncated(kept)
    } else {
        CopyOutcome::Invalid
    }
}
