//! 依赖图构建和拓扑排序
//!
//! Pass 按声明顺序执行，依赖图只用于分析：计算每个 Pass 的依赖层级，
//! 供执行计划日志和 graphviz 导出使用。

use std::collections::VecDeque;

use itertools::Itertools;

use super::pass::RgPassNode;

/// 依赖图
///
/// 边 `producer -> consumer`：consumer 在 producer 之后声明，并读取了 producer 写入的资源。
/// 被剔除的 Pass 不参与。
pub struct RgDependencyGraph {
    pass_count: usize,
    /// 邻接表（出边）
    adjacency: Vec<Vec<usize>>,
    in_degrees: Vec<usize>,
    /// 每个 Pass 的层级，被剔除的 Pass 为 `None`
    levels: Vec<Option<usize>>,
}

// new & init
impl RgDependencyGraph {
    pub fn new(pass_count: usize) -> Self {
        Self {
            pass_count,
            adjacency: vec![Vec::new(); pass_count],
            in_degrees: vec![0; pass_count],
            levels: vec![None; pass_count],
        }
    }

    /// 从 Pass 列表构建依赖图并计算层级
    pub fn build(passes: &[RgPassNode]) -> Self {
        let mut graph = Self::new(passes.len());

        for (producer, producer_node) in passes.iter().enumerate() {
            if producer_node.is_culled() {
                continue;
            }
            for (consumer, consumer_node) in passes.iter().enumerate().skip(producer + 1) {
                if consumer_node.is_culled() {
                    continue;
                }
                let texture_dep = consumer_node.texture_reads.iter().any(|id| producer_node.texture_writes.contains(id));
                let buffer_dep = consumer_node.buffer_reads.iter().any(|id| producer_node.buffer_writes.contains(id));
                if texture_dep || buffer_dep {
                    graph.add_edge(producer, consumer);
                }
            }
        }

        let alive = passes.iter().map(|pass| !pass.is_culled()).collect_vec();
        graph.compute_levels(&alive);
        graph
    }

    /// 添加依赖边，重复的边会被忽略
    pub fn add_edge(&mut self, producer: usize, consumer: usize) {
        if !self.adjacency[producer].contains(&consumer) {
            self.adjacency[producer].push(consumer);
            self.in_degrees[consumer] += 1;
        }
    }

    /// 层级 = 从任一源点出发的最长路径长度
    fn compute_levels(&mut self, alive: &[bool]) {
        let order = match self.topological_sort() {
            Ok(order) => order,
            Err(cycle) => panic!("RenderGraph: dependency cycle between passes {cycle:?}"),
        };

        for &pass in &order {
            if alive[pass] && self.levels[pass].is_none() {
                self.levels[pass] = Some(0);
            }
            let Some(level) = self.levels[pass] else {
                continue;
            };
            for &next in &self.adjacency[pass] {
                let next_level = self.levels[next].map_or(level + 1, |l| l.max(level + 1));
                self.levels[next] = Some(next_level);
            }
        }
    }
}

// getter & iter
impl RgDependencyGraph {
    /// 执行拓扑排序
    ///
    /// # 返回
    /// - `Ok(order)`: 拓扑排序后的 Pass 下标
    /// - `Err(cycle)`: 检测到循环依赖，返回参与循环的 Pass 下标
    pub fn topological_sort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut in_degrees = self.in_degrees.clone();
        let mut queue = (0..self.pass_count).filter(|&i| in_degrees[i] == 0).collect::<VecDeque<_>>();
        let mut result = Vec::with_capacity(self.pass_count);

        while let Some(node) = queue.pop_front() {
            result.push(node);
            for &neighbor in &self.adjacency[node] {
                in_degrees[neighbor] -= 1;
                if in_degrees[neighbor] == 0 {
                    queue.push_back(neighbor);
                }
            }
        }

        if result.len() != self.pass_count {
            Err((0..self.pass_count).filter(|&i| in_degrees[i] > 0).collect())
        } else {
            Ok(result)
        }
    }

    #[inline]
    pub fn successors(&self, pass: usize) -> &[usize] {
        &self.adjacency[pass]
    }

    pub fn predecessors(&self, pass: usize) -> Vec<usize> {
        (0..self.pass_count).filter(|&i| self.adjacency[i].contains(&pass)).collect()
    }

    #[inline]
    pub fn level(&self, pass: usize) -> Option<usize> {
        self.levels[pass]
    }

    /// 按层级分组的 Pass 下标，同一层级内保持声明顺序
    pub fn passes_by_level(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (pass, level) in self.levels.iter().enumerate() {
            let Some(level) = *level else {
                continue;
            };
            if groups.len() <= level {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(pass);
        }
        groups
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(producer, consumers)| consumers.iter().map(move |&consumer| (producer, consumer)))
    }
}
