//! Agent run-state and the per-tick decision ladder.
//!
//! One call to [`Agent::step`] is one tick: death and timeout checks, a
//! knowledge update from the current cell's percepts, then a priority ladder
//! of policies — pickups, shots, return home, safe step, hunt, backtrack,
//! frontier, gamble. The first rule that fires ends the tick, so every tick
//! produces at most one move or one shot.
//!
//! Neighbour ties always resolve in N, S, W, E order; candidate scans over
//! the whole grid resolve in row-major order with strict improvement.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{orthogonal, Cell, Tile, World};
use crate::knowledge::{CellBelief, KnowledgeGrid};
use crate::planner::{astar, risk, PathPlan};

/// Minimum heuristic wumpus probability for a speculative shot.
const SHOT_THRESHOLD: f64 = 0.65;

/// Weight of hazard mass against path cost when ranking frontier cells.
const FRONTIER_HAZARD_WEIGHT: f64 = 40.0;

/// Policy that produced the last movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Returning,
    SafeMove,
    Hunt,
    Backtrack,
    Frontier,
    Gamble,
}

/// Side-effecting action recorded on the last tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentAction {
    PickGold,
    PickArrow,
    ShootArrow,
}

/// Why a dead agent died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathCause {
    Pit,
    Wumpus,
    Timeout,
}

/// One tick's outcome. A dead agent keeps answering `Terminated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(Cell),
    Terminated,
}

/// Opaque deep copy of the whole engine state, for undo.
#[derive(Clone, Debug)]
pub struct Snapshot(Box<Agent>);

/// Read-only view of the engine state, serializable for transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub size: usize,
    pub world: Vec<Vec<Tile>>,
    pub pos: Cell,
    pub path: Vec<Cell>,
    pub alive: bool,
    pub mode: Option<Mode>,
    pub action: Option<AgentAction>,
    pub death_cause: Option<DeathCause>,
    pub arrows: u32,
    pub gold_found: bool,
    pub returning: bool,
    pub steps: u64,
    pub max_steps: u64,
    pub arrow_positions: Vec<Cell>,
    pub killed_wumpus_positions: Vec<Cell>,
    pub wumpus_kill_count: u32,
    pub total_arrows_collected: u32,
    pub knowledge: Vec<Vec<CellBelief>>,
}

/// The belief-and-decision engine for one run.
#[derive(Clone, Debug)]
pub struct Agent {
    world: World,
    size: usize,
    knowledge: KnowledgeGrid,
    pos: Cell,
    path: Vec<Cell>,
    alive: bool,
    death_cause: Option<DeathCause>,
    mode: Option<Mode>,
    action: Option<AgentAction>,
    arrows: u32,
    gold_found: bool,
    returning: bool,
    steps: u64,
    max_steps: u64,
    arrow_positions: Vec<Cell>,
    killed_wumpus_positions: Vec<Cell>,
    wumpus_kill_count: u32,
    total_arrows_collected: u32,
}

impl Agent {
    /// Install a new world and arrow budget. The origin starts known-safe;
    /// the step cap is `6 * N^2`.
    pub fn new(world: World, arrows: u32) -> Self {
        let size = world.size();
        Self {
            knowledge: KnowledgeGrid::new(size),
            pos: (0, 0),
            path: vec![(0, 0)],
            alive: true,
            death_cause: None,
            mode: None,
            action: None,
            arrows,
            gold_found: false,
            returning: false,
            steps: 0,
            max_steps: (size * size * 6) as u64,
            arrow_positions: Vec::new(),
            killed_wumpus_positions: Vec::new(),
            wumpus_kill_count: 0,
            total_arrows_collected: 0,
            size,
            world,
        }
    }

    // ─── Read-only accessors ─────────────────────────────────────────────

    pub fn pos(&self) -> Cell {
        self.pos
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn arrows(&self) -> u32 {
        self.arrows
    }

    pub fn gold_found(&self) -> bool {
        self.gold_found
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death_cause
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn action(&self) -> Option<AgentAction> {
        self.action
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn knowledge(&self) -> &KnowledgeGrid {
        &self.knowledge
    }

    /// Gold retrieved and carried back to the origin.
    pub fn returned_home(&self) -> bool {
        self.gold_found && self.pos == (0, 0)
    }

    /// Deep copy of the engine state, including the variable registry.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Box::new(self.clone()))
    }

    /// Replace the engine state with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        *self = *snapshot.0;
    }

    /// Full observable state, one flat structure.
    pub fn observe(&self) -> Observation {
        Observation {
            size: self.size,
            world: self.world.rows(),
            pos: self.pos,
            path: self.path.clone(),
            alive: self.alive,
            mode: self.mode,
            action: self.action,
            death_cause: self.death_cause,
            arrows: self.arrows,
            gold_found: self.gold_found,
            returning: self.returning,
            steps: self.steps,
            max_steps: self.max_steps,
            arrow_positions: self.arrow_positions.clone(),
            killed_wumpus_positions: self.killed_wumpus_positions.clone(),
            wumpus_kill_count: self.wumpus_kill_count,
            total_arrows_collected: self.total_arrows_collected,
            knowledge: self.knowledge.rows(),
        }
    }

    // ─── The tick ────────────────────────────────────────────────────────

    /// Advance one tick. Death and timeout are terminal states, not errors;
    /// once dead, further calls are no-ops.
    pub fn step(&mut self) -> StepOutcome {
        if !self.alive {
            return StepOutcome::Terminated;
        }
        self.action = None;
        self.steps += 1;

        // Standing on a hazard kills before the cell could ever be recorded
        // as visited-safe.
        match self.world.get(self.pos.0, self.pos.1) {
            Tile::Pit => return self.die(DeathCause::Pit),
            Tile::Wumpus => return self.die(DeathCause::Wumpus),
            _ => {}
        }

        if self.steps > self.max_steps {
            return self.die(DeathCause::Timeout);
        }

        let percepts = self.world.percepts(self.pos.0, self.pos.1);
        self.knowledge.update(self.pos, percepts);

        // Pickups consume the tick in place.
        if percepts.glitter && !self.gold_found {
            self.gold_found = true;
            self.returning = true;
            self.world.set(self.pos.0, self.pos.1, Tile::Empty);
            self.action = Some(AgentAction::PickGold);
            info!(pos = ?self.pos, steps = self.steps, "gold picked up, heading home");
            return StepOutcome::Moved(self.pos);
        }
        if percepts.arrow {
            self.arrows += 1;
            self.total_arrows_collected += 1;
            self.arrow_positions.push(self.pos);
            self.world.set(self.pos.0, self.pos.1, Tile::Empty);
            self.action = Some(AgentAction::PickArrow);
            debug!(pos = ?self.pos, arrows = self.arrows, "arrow picked up");
            return StepOutcome::Moved(self.pos);
        }

        if self.arrows > 0 {
            // Immediate shot at a logically confirmed wumpus next door.
            let confirmed = orthogonal(self.size, self.pos.0, self.pos.1)
                .find(|&n| self.knowledge.cell(n).confirmed_wumpus);
            if let Some(target) = confirmed {
                self.fire_at(target);
                return StepOutcome::Moved(self.pos);
            }

            // Speculative shot: standing in stench next to a strongly
            // suspected cell. First maximal candidate in N, S, W, E wins.
            if percepts.stench {
                let mut best: Option<(f64, Cell)> = None;
                for n in orthogonal(self.size, self.pos.0, self.pos.1) {
                    let belief = self.knowledge.cell(n);
                    if belief.visited {
                        continue;
                    }
                    if best.map_or(true, |(p, _)| belief.p_wumpus > p) {
                        best = Some((belief.p_wumpus, n));
                    }
                }
                if let Some((p, target)) = best {
                    if p > SHOT_THRESHOLD {
                        self.fire_at(target);
                        return StepOutcome::Moved(self.pos);
                    }
                }
            }
        }

        // Head home with the gold; with the exit walled off, fall through
        // and keep exploring.
        if self.returning {
            if let Some(plan) = astar(&self.knowledge, self.pos, (0, 0), self.arrows, false) {
                self.mode = Some(Mode::Returning);
                self.advance(&plan);
                return StepOutcome::Moved(self.pos);
            }
        }

        // Safe step: the cheapest proven-safe unexplored neighbour.
        let mut safest: Option<(f64, Cell)> = None;
        for n in orthogonal(self.size, self.pos.0, self.pos.1) {
            let belief = self.knowledge.cell(n);
            if !belief.safe || belief.visited {
                continue;
            }
            let r = risk(belief, self.arrows);
            if safest.map_or(true, |(best, _)| r < best) {
                safest = Some((r, n));
            }
        }
        if let Some((_, n)) = safest {
            self.mode = Some(Mode::SafeMove);
            self.move_to(n);
            return StepOutcome::Moved(self.pos);
        }

        // Hunt: exploration has run dry and a confirmed wumpus is the
        // obstacle worth clearing.
        if self.arrows > 0 && self.no_zero_risk_frontier() {
            if let Some(plan) = self.hunt_plan() {
                self.mode = Some(Mode::Hunt);
                self.advance(&plan);
                return StepOutcome::Moved(self.pos);
            }
        }

        if let Some(plan) = self.backtrack_plan() {
            self.mode = Some(Mode::Backtrack);
            self.advance(&plan);
            return StepOutcome::Moved(self.pos);
        }

        if let Some(plan) = self.frontier_plan() {
            self.mode = Some(Mode::Frontier);
            self.advance(&plan);
            return StepOutcome::Moved(self.pos);
        }

        self.gamble();
        StepOutcome::Moved(self.pos)
    }

    // ─── Shooting ────────────────────────────────────────────────────────

    fn fire_at(&mut self, target: Cell) {
        self.action = Some(AgentAction::ShootArrow);
        self.arrows -= 1;
        debug!(from = ?self.pos, at = ?target, "arrow fired");
        let killed = self.shoot(target);
        if !killed.is_empty() {
            self.absorb_kills(&killed);
        }
    }

    /// Fire along the straight ray from the current cell toward `target`.
    /// The arrow flies cell by cell while in bounds and stops at the first
    /// wumpus, killing it. Pits underneath are harmless.
    fn shoot(&mut self, target: Cell) -> Vec<Cell> {
        let di = (target.0 as isize - self.pos.0 as isize).signum();
        let dj = (target.1 as isize - self.pos.1 as isize).signum();
        if di == 0 && dj == 0 {
            return Vec::new();
        }

        let mut killed = Vec::new();
        let mut ci = self.pos.0 as isize + di;
        let mut cj = self.pos.1 as isize + dj;
        while ci >= 0 && ci < self.size as isize && cj >= 0 && cj < self.size as isize {
            let cell = (ci as usize, cj as usize);
            if self.world.get(cell.0, cell.1) == Tile::Wumpus {
                self.world.set(cell.0, cell.1, Tile::Empty);
                self.killed_wumpus_positions.push(cell);
                self.wumpus_kill_count += 1;
                info!(?cell, "wumpus killed");
                killed.push(cell);
                break;
            }
            ci += di;
            cj += dj;
        }
        killed
    }

    /// Fold a kill back into the knowledge base: the dead wumpus's cell is
    /// now known clear, and stench readings near it may have vanished, so
    /// every visited cell re-reads its percepts before the rebuild.
    fn absorb_kills(&mut self, killed: &[Cell]) {
        for &cell in killed {
            let belief = self.knowledge.cell_mut(cell);
            belief.visited = true;
            belief.safe = true;
            belief.confirmed_pit = false;
            belief.confirmed_wumpus = false;
            belief.p_pit = 0.0;
            belief.p_wumpus = 0.0;
        }
        for i in 0..self.size {
            for j in 0..self.size {
                if self.knowledge.cell((i, j)).visited {
                    let percepts = self.world.percepts(i, j);
                    self.knowledge.cell_mut((i, j)).percepts = percepts;
                }
            }
        }
        self.knowledge.rebuild();
    }

    // ─── Movement helpers ────────────────────────────────────────────────

    fn move_to(&mut self, cell: Cell) {
        self.pos = cell;
        self.path.push(cell);
    }

    fn advance(&mut self, plan: &PathPlan) {
        if let Some(&first) = plan.path.first() {
            self.move_to(first);
        }
    }

    fn die(&mut self, cause: DeathCause) -> StepOutcome {
        self.alive = false;
        self.death_cause = Some(cause);
        info!(?cause, pos = ?self.pos, steps = self.steps, "agent terminated");
        StepOutcome::Terminated
    }

    // ─── Policy helpers ──────────────────────────────────────────────────

    /// True when no unvisited neighbour of any visited cell is free of
    /// heuristic hazard mass — exploration has nothing cheap left.
    fn no_zero_risk_frontier(&self) -> bool {
        for i in 0..self.size {
            for j in 0..self.size {
                if !self.knowledge.cell((i, j)).visited {
                    continue;
                }
                for n in orthogonal(self.size, i, j) {
                    let belief = self.knowledge.cell(n);
                    if !belief.visited && belief.p_pit == 0.0 && belief.p_wumpus == 0.0 {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn confirmed_wumpus_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for i in 0..self.size {
            for j in 0..self.size {
                if self.knowledge.cell((i, j)).confirmed_wumpus {
                    cells.push((i, j));
                }
            }
        }
        cells
    }

    /// Cheapest path to a confirmed wumpus, allowed to end on it.
    fn hunt_plan(&self) -> Option<PathPlan> {
        let mut best: Option<PathPlan> = None;
        for target in self.confirmed_wumpus_cells() {
            if let Some(plan) = astar(&self.knowledge, self.pos, target, self.arrows, true) {
                if plan.path.is_empty() {
                    continue;
                }
                if best.as_ref().map_or(true, |b| plan.cost < b.cost) {
                    best = Some(plan);
                }
            }
        }
        best
    }

    /// Cheapest path back to a visited cell that still has a proven-safe
    /// unexplored neighbour.
    fn backtrack_plan(&self) -> Option<PathPlan> {
        let mut best: Option<PathPlan> = None;
        for i in 0..self.size {
            for j in 0..self.size {
                if !self.knowledge.cell((i, j)).visited {
                    continue;
                }
                let has_safe_unvisited = orthogonal(self.size, i, j).any(|n| {
                    let b = self.knowledge.cell(n);
                    b.safe && !b.visited
                });
                if !has_safe_unvisited {
                    continue;
                }
                if let Some(plan) = astar(&self.knowledge, self.pos, (i, j), self.arrows, false) {
                    if plan.path.is_empty() {
                        continue;
                    }
                    if best.as_ref().map_or(true, |b| plan.cost < b.cost) {
                        best = Some(plan);
                    }
                }
            }
        }
        best
    }

    /// Best frontier cell by path cost plus weighted hazard mass.
    fn frontier_plan(&self) -> Option<PathPlan> {
        let mut best: Option<(f64, PathPlan)> = None;
        for i in 0..self.size {
            for j in 0..self.size {
                let belief = self.knowledge.cell((i, j));
                if belief.visited {
                    continue;
                }
                let on_frontier = orthogonal(self.size, i, j)
                    .any(|n| self.knowledge.cell(n).visited);
                if !on_frontier {
                    continue;
                }
                if let Some(plan) = astar(&self.knowledge, self.pos, (i, j), self.arrows, false) {
                    if plan.path.is_empty() {
                        continue;
                    }
                    let utility =
                        plan.cost + FRONTIER_HAZARD_WEIGHT * (belief.p_pit + belief.p_wumpus);
                    if best.as_ref().map_or(true, |(u, _)| utility < *u) {
                        best = Some((utility, plan));
                    }
                }
            }
        }
        best.map(|(_, plan)| plan)
    }

    /// Last resort: accept a risky neighbour. Confirmed hazards are excluded
    /// unless every neighbour is one.
    fn gamble(&mut self) {
        self.mode = Some(Mode::Gamble);
        let neighbours: Vec<Cell> = orthogonal(self.size, self.pos.0, self.pos.1).collect();
        let mut candidates: Vec<Cell> = neighbours
            .iter()
            .copied()
            .filter(|&n| {
                let b = self.knowledge.cell(n);
                !b.confirmed_pit && !b.confirmed_wumpus
            })
            .collect();
        if candidates.is_empty() {
            candidates = neighbours;
        }
        let target = candidates.iter().copied().min_by(|&a, &b| {
            let ra = risk(self.knowledge.cell(a), self.arrows);
            let rb = risk(self.knowledge.cell(b), self.arrows);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(cell) = target {
            debug!(to = ?cell, "gambling on a risky step");
            self.move_to(cell);
        }
    }
}
