//! Room assignment.
//!
//! Gives every occupied cell a room that is free at that cell, seats the
//! session type and (optionally) carries its equipment. Among candidates
//! the room used least so far wins, so load spreads evenly across rooms.
//!
//! # Requirements by session type
//!
//! | Type | Seats | Equipment |
//! |------|-------|-----------|
//! | lab | 30 | computers, projector |
//! | practical | 30 | equipment |
//! | theory | 60 | projector |
//! | tutorial | 40 | projector |

use serde::Serialize;
use tracing::{debug, info};

use crate::context::RunContext;
use crate::models::{required_capacity, required_equipment, Cell, Day, Grid, Room, SessionAssignment};

/// One room booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAssignment {
    pub subject_id: String,
    pub room_id: String,
    pub day: Day,
    pub slot: usize,
    /// Seats of the room.
    pub capacity: u32,
    /// Final occupancy of the room, percent of usable cells.
    pub utilization: f64,
}

/// Occupancy of a room as a percentage of the grid's non-break cells.
pub fn room_utilization(grid: &Grid, room_id: &str) -> f64 {
    let usable = grid.total_cells().saturating_sub(grid.break_count());
    if usable == 0 {
        return 0.0;
    }
    grid.room_hours(room_id) as f64 / usable as f64 * 100.0
}

/// Least-used-first room assigner.
#[derive(Debug, Clone, Copy)]
pub struct RoomAssigner<'a> {
    ctx: RunContext<'a>,
}

impl<'a> RoomAssigner<'a> {
    pub fn new(ctx: RunContext<'a>) -> Self {
        Self { ctx }
    }

    /// Assigns rooms to every occupied cell that has none yet.
    ///
    /// Cells already holding a room keep it. Cells with no eligible room
    /// stay unassigned. Returns one record per roomed cell in grid order.
    pub fn assign(&self, grid: &mut Grid) -> Vec<RoomAssignment> {
        let rooms = &self.ctx.input.rooms;
        let mut counters: Vec<u32> = rooms.iter().map(|r| grid.room_hours(&r.id)).collect();

        let pending: Vec<Cell> = grid
            .occupied()
            .filter(|(_, s)| s.room_id.is_none())
            .map(|(c, _)| c)
            .collect();

        let mut unassigned = 0usize;
        for cell in pending {
            let Some(session) = grid.get(cell) else {
                continue;
            };
            let choice = rooms
                .iter()
                .enumerate()
                .filter(|(_, room)| self.is_candidate(grid, room, session, cell))
                .min_by_key(|&(i, _)| counters[i])
                .map(|(i, _)| i);

            match choice {
                Some(i) => {
                    counters[i] += 1;
                    if let Some(session) = grid.get_mut(cell) {
                        session.room_id = Some(rooms[i].id.clone());
                    }
                    debug!(cell = %cell, room = %rooms[i].id, "Room assigned");
                }
                None => unassigned += 1,
            }
        }

        let records = self.records(grid);
        info!(assigned = records.len(), unassigned, "Room assignment finished");
        records
    }

    fn is_candidate(&self, grid: &Grid, room: &Room, session: &SessionAssignment, cell: Cell) -> bool {
        room.is_available_at(cell)
            && !grid.room_in_use(&room.id, cell)
            && room.capacity >= required_capacity(session.session_type)
            && (!self.ctx.config.match_equipment
                || room.has_equipment(required_equipment(session.session_type)))
    }

    /// Booking records for every roomed cell of a grid.
    pub fn records(&self, grid: &Grid) -> Vec<RoomAssignment> {
        grid.occupied()
            .filter_map(|(cell, session)| {
                let room = self.ctx.input.room(session.room_id.as_deref()?)?;
                Some(RoomAssignment {
                    subject_id: session.subject_id.clone(),
                    room_id: room.id.clone(),
                    day: cell.day,
                    slot: cell.slot,
                    capacity: room.capacity,
                    utilization: room_utilization(grid, &room.id),
                })
            })
            .collect()
    }
}
