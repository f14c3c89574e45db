//! Random forest classifier (bagged CART trees, Gini impurity).

use crate::error::{TrainingError, TrainingResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self { n_trees: 100, max_depth: 20, min_samples_split: 2, seed: 42 }
    }
}

impl ForestParams {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.n_trees == 0 {
            return Err(TrainingError::TrainingFailed("n_trees must be >= 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(TrainingError::TrainingFailed("max_depth must be >= 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(TrainingError::TrainingFailed("min_samples_split must be >= 2".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Leaf { class: u32 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct GrowContext<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u32],
    n_classes: usize,
    params: &'a ForestParams,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / total).powi(2)).sum::<f64>()
}

fn class_counts(y: &[u32], idx: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in idx {
        counts[y[i] as usize] += 1;
    }
    counts
}

/// Index of the largest count; ties resolve to the lowest class index.
fn majority(counts: &[usize]) -> u32 {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best as u32
}

impl DecisionTree {
    fn fit(ctx: &GrowContext<'_>, sample: Vec<usize>, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(ctx, sample, 0, rng);
        tree
    }

    fn grow(&mut self, ctx: &GrowContext<'_>, idx: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let counts = class_counts(ctx.y, &idx, ctx.n_classes);
        let leaf = Node::Leaf { class: majority(&counts) };
        let node_id = self.nodes.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth >= ctx.params.max_depth || idx.len() < ctx.params.min_samples_split {
            self.nodes.push(leaf);
            return node_id;
        }

        let parent_impurity = gini(&counts, idx.len());
        let Some(split) = Self::best_split(ctx, &idx, &counts, rng) else {
            self.nodes.push(leaf);
            return node_id;
        };
        if split.impurity >= parent_impurity {
            self.nodes.push(leaf);
            return node_id;
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            idx.into_iter().partition(|&i| ctx.x[i][split.feature] <= split.threshold);

        // Placeholder, patched once both children exist.
        self.nodes.push(leaf);
        let left = self.grow(ctx, left_idx, depth + 1, rng);
        let right = self.grow(ctx, right_idx, depth + 1, rng);
        self.nodes[node_id] = Node::Split { feature: split.feature, threshold: split.threshold, left, right };
        node_id
    }

    fn best_split(ctx: &GrowContext<'_>, idx: &[usize], counts: &[usize], rng: &mut StdRng) -> Option<BestSplit> {
        let n_features = ctx.x[0].len();
        let mtry = ((n_features as f64).sqrt() as usize).clamp(1, n_features);
        let features = rand::seq::index::sample(rng, n_features, mtry).into_vec();

        let n = idx.len();
        let mut best: Option<BestSplit> = None;
        let mut order = idx.to_vec();

        for feature in features {
            order.sort_by(|&a, &b| ctx.x[a][feature].total_cmp(&ctx.x[b][feature]));

            let mut left = vec![0usize; ctx.n_classes];
            let mut right = counts.to_vec();
            for k in 0..n - 1 {
                let class = ctx.y[order[k]] as usize;
                left[class] += 1;
                right[class] -= 1;

                let value = ctx.x[order[k]][feature];
                let next = ctx.x[order[k + 1]][feature];
                if next <= value {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                let impurity = (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    best = Some(BestSplit { feature, threshold: (value + next) / 2.0, impurity });
                }
            }
        }

        best
    }

    #[must_use]
    pub fn predict(&self, row: &[f64]) -> u32 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { class } => return *class,
                Node::Split { feature, threshold, left, right } => {
                    node = if row.get(*feature).copied().unwrap_or(f64::NAN) <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on row-major features `x` and class indices `y` in `0..n_classes`.
    pub fn fit(x: &[Vec<f64>], y: &[u32], n_classes: usize, params: &ForestParams) -> TrainingResult<Self> {
        params.validate()?;
        if x.len() != y.len() {
            return Err(TrainingError::TrainingFailed(format!(
                "feature rows ({}) and labels ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(TrainingError::TrainingFailed(format!("insufficient rows: {}", x.len())));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(TrainingError::TrainingFailed("feature rows must be non-empty and uniform".to_string()));
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TrainingError::TrainingFailed("feature values must be finite".to_string()));
        }
        if let Some(bad) = y.iter().find(|&&c| c as usize >= n_classes) {
            return Err(TrainingError::TrainingFailed(format!("class index {bad} out of range 0..{n_classes}")));
        }

        let ctx = GrowContext { x, y, n_classes, params };
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(&ctx, sample, &mut rng)
            })
            .collect();

        Ok(Self { n_features, n_classes, trees })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Majority vote across trees.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> u32 {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict(row) as usize;
            if let Some(v) = votes.get_mut(class) {
                *v += 1;
            }
        }
        majority(&votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u32>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let v = f64::from(i);
            x.push(vec![v, 100.0 - v]);
            y.push(u32::from(i >= 15));
        }
        (x, y)
    }

    #[test]
    fn test_forest_learns_separable_data() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &ForestParams { n_trees: 10, ..ForestParams::default() }).unwrap();

        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.predict(&[1.0, 99.0]), 0);
        assert_eq!(forest.predict(&[28.0, 72.0]), 1);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let (x, y) = separable();
        let params = ForestParams { n_trees: 5, ..ForestParams::default() };
        let a = RandomForest::fit(&x, &y, 2, &params).unwrap();
        let b = RandomForest::fit(&x, &y, 2, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_forest_rejects_insufficient_rows() {
        let err = RandomForest::fit(&[vec![1.0]], &[0], 2, &ForestParams::default()).unwrap_err();
        assert!(matches!(err, TrainingError::TrainingFailed(_)));
    }

    #[test]
    fn test_forest_rejects_out_of_range_class() {
        let err = RandomForest::fit(&[vec![1.0], vec![2.0]], &[0, 3], 2, &ForestParams::default()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_forest_rejects_nan_features() {
        let mut x = vec![vec![0.0], vec![1.0], vec![2.0]];
        x.extend(std::iter::repeat_n(vec![f64::NAN], 7));
        let y = [0, 0, 0, 1, 1, 1, 1, 1, 1, 1];

        let err = RandomForest::fit(&x, &y, 2, &ForestParams { n_trees: 25, ..ForestParams::default() }).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_params_validate() {
        assert!(ForestParams { n_trees: 0, ..ForestParams::default() }.validate().is_err());
        assert!(ForestParams::default().validate().is_ok());
    }
}
