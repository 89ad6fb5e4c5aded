//! Tighten-only stop ratchet.

use crate::domain::Side;

/// Accept a proposed stop only if it is tighter than the current one.
///
/// For longs a tighter stop is higher, for shorts lower. Returns the new
/// stop when the proposal tightens, `None` when it would loosen or leave
/// the stop unchanged.
pub fn ratchet_stop(side: Side, current: f64, proposal: f64) -> Option<f64> {
    match side {
        Side::Long if proposal > current => Some(proposal),
        Side::Short if proposal < current => Some(proposal),
        _ => None,
    }
}
