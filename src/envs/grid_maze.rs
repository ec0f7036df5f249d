use crate::common::defs::*;
use crate::error::{ConfigError, Result};
use crate::mdps::mdp_simulator::*;
use rand::prelude::*;
use serde_json::json;

pub const UP: Discrete = 0;
pub const RIGHT: Discrete = 1;
pub const DOWN: Discrete = 2;
pub const LEFT: Discrete = 3;

const MOVES: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Deterministic rectangular maze.
///
/// Built from rows of characters, similar to the FrozenLake `desc` argument:
/// `S` start, `G` goal (terminal, rewarded on entry), `#` wall, `.` free.
/// Every non-wall cell is a state, numbered row-major. Moving into a wall or
/// off the grid leaves the agent where it is.
#[derive(Debug, Clone)]
pub struct GridMaze {
    rows: usize,
    cols: usize,
    /// Cell index -> state, `None` for walls.
    cell_states: Vec<Option<Discrete>>,
    /// State -> (row, col).
    state_cells: Vec<(usize, usize)>,
    start: Discrete,
    goals: Vec<Discrete>,
    goal_reward: Continous,
    current: Discrete,
    steps: usize,
    timeout: usize,
    done: bool,
}

impl GridMaze {
    pub fn from_desc(desc: &[&str], goal_reward: Continous) -> Result<Self> {
        let rows = desc.len();
        let cols = desc.first().map(|r| r.chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidMaze("maze is empty".into()));
        }

        let mut cell_states = Vec::with_capacity(rows * cols);
        let mut state_cells = vec![];
        let mut start = None;
        let mut goals = vec![];
        for (r, line) in desc.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(ConfigError::InvalidMaze(format!(
                    "row {r} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }
            for (c, ch) in line.chars().enumerate() {
                if ch == '#' {
                    cell_states.push(None);
                    continue;
                }
                let s = state_cells.len();
                match ch {
                    '.' => {}
                    'S' if start.is_none() => start = Some(s),
                    'S' => return Err(ConfigError::InvalidMaze("more than one start".into())),
                    'G' => goals.push(s),
                    other => {
                        return Err(ConfigError::InvalidMaze(format!(
                            "unknown cell '{other}' at ({r}, {c})"
                        )))
                    }
                }
                cell_states.push(Some(s));
                state_cells.push((r, c));
            }
        }

        let start = start.ok_or_else(|| ConfigError::InvalidMaze("no start cell".into()))?;
        if goals.is_empty() {
            return Err(ConfigError::InvalidMaze("no goal cell".into()));
        }

        Ok(Self {
            rows,
            cols,
            cell_states,
            state_cells,
            start,
            goals,
            goal_reward,
            current: start,
            steps: 0,
            timeout: usize::MAX,
            done: false,
        })
    }

    /// Open `rows` x `cols` room with the start in the top-left corner and the
    /// goal in the bottom-right one.
    pub fn open_room(rows: usize, cols: usize, goal_reward: Continous) -> Result<Self> {
        let desc = (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| match (r, c) {
                        (0, 0) => 'S',
                        (r, c) if r == rows - 1 && c == cols - 1 => 'G',
                        _ => '.',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        let desc = desc.iter().map(String::as_str).collect::<Vec<_>>();

        Self::from_desc(&desc, goal_reward)
    }

    pub fn state_at(&self, row: usize, col: usize) -> Option<Discrete> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cell_states[row * self.cols + col]
    }

    pub fn cell_of(&self, s: Discrete) -> (usize, usize) {
        self.state_cells[s]
    }

    /// Successor of `a` in `s`, ignoring episode bookkeeping.
    pub fn successor(&self, s: Discrete, a: Discrete) -> Discrete {
        assert!(a < MOVES.len(), "Action {a} is out of range.");
        let (r, c) = self.state_cells[s];
        let (dr, dc) = MOVES[a];
        let (nr, nc) = (r as isize + dr, c as isize + dc);
        if nr < 0 || nc < 0 {
            return s;
        }
        self.state_at(nr as usize, nc as usize).unwrap_or(s)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                let ch = match self.cell_states[r * self.cols + c] {
                    None => '#',
                    Some(s) if s == self.current => 'A',
                    Some(s) if self.goals.contains(&s) => 'G',
                    Some(s) if s == self.start => 'S',
                    Some(_) => '.',
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

impl MdpSimulator for GridMaze {
    fn name(&self) -> String {
        format!("GridMaze-{}x{}", self.rows, self.cols)
    }

    fn n_s(&self) -> usize {
        self.state_cells.len()
    }

    fn n_a(&self) -> usize {
        MOVES.len()
    }

    fn terminal_states(&self) -> &[Discrete] {
        &self.goals
    }

    fn start_state(&self) -> Discrete {
        self.start
    }

    fn reset(&mut self, uniform: bool, rng: &mut StdRng) -> Discrete {
        self.current = if uniform {
            rng.gen_range(0..self.n_s())
        } else {
            self.start
        };
        self.steps = 0;
        self.done = false;
        self.current
    }

    fn step(&mut self, a: Discrete) -> StepInfo {
        let (s_next, reward, terminated) = if self.is_terminal(self.current) {
            (self.current, 0., true)
        } else {
            let s_next = self.successor(self.current, a);
            let terminated = self.is_terminal(s_next);
            let reward = if terminated { self.goal_reward } else { 0. };
            (s_next, reward, terminated)
        };

        self.current = s_next;
        self.steps += 1;
        let truncated = !terminated && self.steps >= self.timeout;
        self.done = terminated || truncated;

        let (row, col) = self.state_cells[s_next];
        StepInfo {
            observation: s_next,
            reward,
            truncated,
            terminated,
            info: json!({ "steps": self.steps, "row": row, "col": col }),
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn set_timeout(&mut self, max_episode_steps: usize) {
        self.timeout = max_episode_steps;
    }

    fn force_state(&mut self, s: Discrete) {
        assert!(s < self.n_s(), "State {s} is out of range.");
        self.current = s;
        self.done = false;
    }
}
