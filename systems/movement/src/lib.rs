#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement arbitration for agents sharing the street grid.
//!
//! Movement is a two-phase commit. Every agent that wants to move submits a
//! [`Proposal`]; [`Movement::resolve`] classifies all proposals against the
//! occupancy snapshot taken before anyone moved, grants reservations through a
//! fresh [`ReservationTable`], and only then commits the granted moves to the
//! occupancy index. Ties are always broken in favour of the lower
//! [`AgentId`], so replays of the same configuration resolve identically.

use std::collections::BTreeMap;

use grid_traffic_core::{AgentId, Cell, ConflictKind, Event};
use grid_traffic_world::OccupancyIndex;
use tracing::debug;

/// Request from one agent to enter an adjacent cell this movement tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// Agent asking to move.
    pub agent: AgentId,
    /// Cell the agent currently occupies.
    pub from: Cell,
    /// Cell the agent wants to enter.
    pub to: Cell,
}

/// Outcome assigned to a single proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The move was granted and committed.
    Advance {
        /// Cell the agent left.
        from: Cell,
        /// Cell the agent entered.
        to: Cell,
    },
    /// The agent keeps its path and retries next movement tick.
    Wait {
        /// Agent standing on the requested cell.
        blocked_by: AgentId,
    },
    /// The agent must discard its path and plan again.
    Replan,
}

/// Decision paired with the agent it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Agent the decision applies to.
    pub agent: AgentId,
    /// Decision reached for the agent's proposal.
    pub decision: Decision,
}

/// Result of claiming a cell in the [`ReservationTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The claimant now holds the reservation.
    Granted,
    /// Another agent reserved the cell first.
    Contested {
        /// Agent holding the reservation.
        holder: AgentId,
    },
}

/// Per-tick mapping from contested cells to the agent entitled to enter them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationTable {
    claims: BTreeMap<Cell, AgentId>,
}

impl ReservationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `cell` for `agent` unless someone else already holds it.
    pub fn claim(&mut self, cell: Cell, agent: AgentId) -> Claim {
        match self.holder(cell) {
            Some(holder) if holder != agent => Claim::Contested { holder },
            Some(_) => Claim::Granted,
            None => {
                let _ = self.claims.insert(cell, agent);
                Claim::Granted
            }
        }
    }

    /// Agent currently holding the reservation for `cell`.
    #[must_use]
    pub fn holder(&self, cell: Cell) -> Option<AgentId> {
        self.claims.get(&cell).copied()
    }

    /// Number of live reservations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the table holds no reservations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Drops every reservation.
    pub fn clear(&mut self) {
        self.claims.clear();
    }
}

/// Pure system that arbitrates movement proposals.
#[derive(Debug, Default)]
pub struct Movement {
    reservations: ReservationTable,
}

impl Movement {
    /// Resolves every proposal and commits the granted moves to `occupancy`.
    ///
    /// Verdicts are returned in ascending agent order. Conflicts are reported
    /// through `out` as [`Event::ConflictResolved`]. Conflicts that a
    /// resolution creates downstream are left for the next movement tick.
    pub fn resolve(
        &mut self,
        proposals: &[Proposal],
        occupancy: &mut OccupancyIndex,
        out: &mut Vec<Event>,
    ) -> Vec<Verdict> {
        let mut ordered: Vec<&Proposal> = proposals.iter().collect();
        ordered.sort_by_key(|proposal| proposal.agent);

        let targets: BTreeMap<AgentId, Cell> = ordered
            .iter()
            .map(|proposal| (proposal.agent, proposal.to))
            .collect();

        self.reservations.clear();
        let mut verdicts = Vec::with_capacity(ordered.len());

        for proposal in ordered {
            let decision = self.classify(proposal, &targets, occupancy, out);
            verdicts.push(Verdict {
                agent: proposal.agent,
                decision,
            });
        }

        for verdict in &verdicts {
            if let Decision::Advance { from, to } = verdict.decision {
                let _ = occupancy.vacate(from);
                let _ = occupancy.occupy(verdict.agent, to);
            }
        }
        self.reservations.clear();

        verdicts
    }

    fn classify(
        &mut self,
        proposal: &Proposal,
        targets: &BTreeMap<AgentId, Cell>,
        occupancy: &OccupancyIndex,
        out: &mut Vec<Event>,
    ) -> Decision {
        let Proposal { agent, from, to } = *proposal;

        if !from.is_adjacent(to) {
            return Decision::Replan;
        }

        if let Some(occupant) = occupancy.occupant(to).filter(|occupant| *occupant != agent) {
            let occupant_target = targets.get(&occupant).copied();

            if occupant_target == Some(from) {
                if agent < occupant {
                    debug!(%agent, %occupant, cell = %to, "head-on conflict, yielding");
                    out.push(Event::ConflictResolved {
                        kind: ConflictKind::HeadOn,
                        cell: to,
                        prevailing: occupant,
                        yielding: agent,
                    });
                    return Decision::Replan;
                }
                return Decision::Wait {
                    blocked_by: occupant,
                };
            }

            debug!(%agent, %occupant, cell = %to, "target occupied");
            out.push(Event::ConflictResolved {
                kind: ConflictKind::BlockedTarget,
                cell: to,
                prevailing: occupant,
                yielding: agent,
            });
            return if occupant_target.is_some() {
                Decision::Wait {
                    blocked_by: occupant,
                }
            } else {
                Decision::Replan
            };
        }

        match self.reservations.claim(to, agent) {
            Claim::Granted => Decision::Advance { from, to },
            Claim::Contested { holder } => {
                debug!(%agent, %holder, cell = %to, "contested target");
                out.push(Event::ConflictResolved {
                    kind: ConflictKind::ContestedTarget,
                    cell: to,
                    prevailing: holder,
                    yielding: agent,
                });
                Decision::Replan
            }
        }
    }
}
