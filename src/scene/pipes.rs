//! 3D 管道模拟
//!
//! 管道在 N×N×N 的网格中生长：每一步每根活动管道前进一格，
//! 按概率转向或在受阻时转向，无路可走时死亡。活动管道少于上限时
//! 在随机空格生成新管道。段数达到上限或网格填满后整体重置。
//!
//! 同一个种子总是产生相同的管道序列。

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::core::config::PipesConfig;
use crate::core::math::{compose, rotation_from_y, Quaternion, Vector3};
use crate::geometry::PrimitiveKind;
use crate::scene::material::Material;
use crate::scene::world::Drawable;

/// 网格坐标
pub type Cell = [i32; 3];

/// 六个轴向方向
const DIRECTIONS: [Cell; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

/// 相邻格中心的世界距离
pub const CELL_SIZE: f32 = 1.0;

/// 关节球相对管道直径的放大倍数
const JOINT_SCALE: f32 = 1.3;

/// 单次 `advance` 最多执行的步数
const MAX_STEPS_PER_ADVANCE: usize = 32;

/// 一段管道：相邻两格之间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: Cell,
    pub to: Cell,
    pub pipe: usize,
}

/// 管道起点、转弯或终点处的球形关节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joint {
    pub cell: Cell,
    pub pipe: usize,
}

#[derive(Debug, Clone)]
struct Pipe {
    id: usize,
    head: Cell,
    direction: usize,
}

/// 管道模拟
#[derive(Debug, Clone)]
pub struct PipesSimulation {
    config: PipesConfig,
    grid_size: i32,
    rng: SmallRng,
    occupied: Vec<bool>,
    free_cells: usize,
    pipes: Vec<Pipe>,
    segments: Vec<Segment>,
    joints: Vec<Joint>,
    next_pipe_id: usize,
    accumulator: f32,
    generation: u32,
    steps: u64,
}

impl PipesSimulation {
    pub fn new(config: &PipesConfig) -> Self {
        let grid_size = config.grid_size.max(2) as i32;
        let cell_count = (grid_size * grid_size * grid_size) as usize;
        Self {
            config: config.clone(),
            grid_size,
            rng: SmallRng::seed_from_u64(config.seed),
            occupied: vec![false; cell_count],
            free_cells: cell_count,
            pipes: Vec::new(),
            segments: Vec::new(),
            joints: Vec::new(),
            next_pipe_id: 0,
            accumulator: 0.0,
            generation: 0,
            steps: 0,
        }
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn active_pipes(&self) -> usize {
        self.pipes.len()
    }

    /// 已发生的重置次数
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn free_cells(&self) -> usize {
        self.free_cells
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.iter().all(|&c| (0..self.grid_size).contains(&c))
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.occupied[i]).unwrap_or(true)
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let n = self.grid_size;
        Some((cell[0] + cell[1] * n + cell[2] * n * n) as usize)
    }

    fn occupy(&mut self, cell: Cell) {
        if let Some(i) = self.index(cell) {
            if !self.occupied[i] {
                self.occupied[i] = true;
                self.free_cells -= 1;
            }
        }
    }

    /// 清空网格，开始新一轮
    pub fn reset(&mut self) {
        self.occupied.iter_mut().for_each(|c| *c = false);
        self.free_cells = self.occupied.len();
        self.pipes.clear();
        self.segments.clear();
        self.joints.clear();
        self.generation += 1;
        debug!(generation = self.generation, "Pipes simulation reset");
    }

    /// 按时间推进，返回执行的步数
    pub fn advance(&mut self, dt: f32) -> usize {
        if self.config.steps_per_second <= 0.0 || dt <= 0.0 {
            return 0;
        }
        let interval = 1.0 / self.config.steps_per_second;
        self.accumulator += dt;

        let mut taken = 0;
        while self.accumulator >= interval && taken < MAX_STEPS_PER_ADVANCE {
            self.accumulator -= interval;
            self.step();
            taken += 1;
        }
        // 追不上时丢弃积压的时间
        if taken == MAX_STEPS_PER_ADVANCE {
            self.accumulator = 0.0;
        }
        taken
    }

    /// 执行一步
    pub fn step(&mut self) {
        self.steps += 1;

        let exhausted = self.pipes.is_empty() && self.free_cells == 0;
        if self.segments.len() >= self.config.max_segments as usize || exhausted {
            self.reset();
        }

        self.spawn_pipes();
        self.grow_pipes();
    }

    fn spawn_pipes(&mut self) {
        while self.pipes.len() < self.config.max_pipes as usize && self.free_cells > 0 {
            let Some(cell) = self.random_free_cell() else {
                break;
            };
            self.occupy(cell);
            let pipe = Pipe {
                id: self.next_pipe_id,
                head: cell,
                direction: self.rng.gen_range(0..DIRECTIONS.len()),
            };
            self.next_pipe_id += 1;
            self.joints.push(Joint { cell, pipe: pipe.id });
            self.pipes.push(pipe);
        }
    }

    fn grow_pipes(&mut self) {
        let mut pipes = std::mem::take(&mut self.pipes);
        pipes.retain_mut(|pipe| self.grow(pipe));
        self.pipes = pipes;
    }

    /// 前进一格；无路可走时返回 false
    fn grow(&mut self, pipe: &mut Pipe) -> bool {
        let free: Vec<usize> = (0..DIRECTIONS.len())
            .filter(|&d| !self.is_occupied(offset(pipe.head, d)))
            .collect();

        if free.is_empty() {
            self.joints.push(Joint {
                cell: pipe.head,
                pipe: pipe.id,
            });
            return false;
        }

        let straight_free = free.contains(&pipe.direction);
        let wants_turn = self.rng.gen::<f32>() < self.config.turn_chance;
        if !straight_free || wants_turn {
            let choice = free[self.rng.gen_range(0..free.len())];
            if choice != pipe.direction {
                self.joints.push(Joint {
                    cell: pipe.head,
                    pipe: pipe.id,
                });
            }
            pipe.direction = choice;
        }

        let next = offset(pipe.head, pipe.direction);
        self.occupy(next);
        self.segments.push(Segment {
            from: pipe.head,
            to: next,
            pipe: pipe.id,
        });
        pipe.head = next;
        true
    }

    fn random_free_cell(&mut self) -> Option<Cell> {
        if self.free_cells == 0 {
            return None;
        }
        let target = self.rng.gen_range(0..self.free_cells);
        let index = self
            .occupied
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .nth(target)
            .map(|(i, _)| i as i32)?;
        let n = self.grid_size;
        Some([index % n, (index / n) % n, index / (n * n)])
    }

    /// 格子中心的世界坐标，网格以原点为中心
    pub fn cell_center(&self, cell: Cell) -> Vector3 {
        let half = (self.grid_size - 1) as f32 * 0.5;
        Vector3::new(
            (cell[0] as f32 - half) * CELL_SIZE,
            (cell[1] as f32 - half) * CELL_SIZE,
            (cell[2] as f32 - half) * CELL_SIZE,
        )
    }

    /// 生成绘制项：先所有管段（圆柱），后所有关节（球）
    pub fn drawables(&self, out: &mut Vec<Drawable>) {
        let diameter = self.config.pipe_radius * 2.0;

        for segment in &self.segments {
            let from = self.cell_center(segment.from);
            let to = self.cell_center(segment.to);
            let model = compose(
                &((from + to) * 0.5),
                &rotation_from_y(&(to - from)),
                &Vector3::new(diameter, CELL_SIZE, diameter),
            );
            out.push(Drawable {
                mesh: PrimitiveKind::Cylinder,
                model,
                material: Material::pipe_palette(segment.pipe),
            });
        }

        let joint_size = diameter * JOINT_SCALE;
        for joint in &self.joints {
            let model = compose(
                &self.cell_center(joint.cell),
                &Quaternion::identity(),
                &Vector3::repeat(joint_size),
            );
            out.push(Drawable {
                mesh: PrimitiveKind::Sphere,
                model,
                material: Material::pipe_palette(joint.pipe),
            });
        }
    }

    /// 当前绘制项数量
    pub fn drawable_count(&self) -> usize {
        self.segments.len() + self.joints.len()
    }
}

fn offset(cell: Cell, direction: usize) -> Cell {
    let d = DIRECTIONS[direction];
    [cell[0] + d[0], cell[1] + d[1], cell[2] + d[2]]
}
