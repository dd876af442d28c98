//! Resident occupancy: derives an aggregate "anyone home" flag from the
//! reconciled device list and reports edge-triggered transitions.

use crate::registry::Device;

/// An occupancy edge. Raised once per flip, never on a stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyTransition {
    BecameOccupied,
    BecameVacant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyOutcome {
    pub occupied: bool,
    pub residents_online: usize,
    pub transition: Option<OccupancyTransition>,
}

/// Count residents currently online and compare against the previous flag.
///
/// The evaluator only reports the transition; acting on it (forwarding the
/// configured occupied/vacant command descriptor) is the caller's job.
pub fn evaluate(
    devices: &[Device],
    residents: &[String],
    previously_occupied: bool,
) -> OccupancyOutcome {
    let residents_online = devices
        .iter()
        .filter(|d| d.online && residents.iter().any(|r| r == &d.name))
        .count();
    let occupied = residents_online > 0;

    let transition = match (previously_occupied, occupied) {
        (false, true) => Some(OccupancyTransition::BecameOccupied),
        (true, false) => Some(OccupancyTransition::BecameVacant),
        _ => None,
    };

    OccupancyOutcome {
        occupied,
        residents_online,
        transition,
    }
}
