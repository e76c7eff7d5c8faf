//! Relevance regressor — a small feed-forward network trained with Adam on
//! squared loss.
//!
//! Architecture: `input → 50 → 25 → 1`, ReLU hidden layers, identity output.
//! Weights are Glorot-uniform initialised from a fixed seed so that identical
//! training data always yields identical parameters. Predictions are NOT
//! clipped; callers clip to [0, 1].

use ndarray::{Array, Array1, Array2, ArrayView2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::scoring::{ScoringError, ScoringResult};

#[derive(Debug, Clone)]
pub struct RegressorConfig {
    pub hidden_layers: Vec<usize>,
    pub max_iter: usize,
    pub seed: u64,
    pub learning_rate: f64,
    /// L2 penalty.
    pub alpha: f64,
    pub batch_size: usize,
    pub tol: f64,
    pub n_iter_no_change: usize,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![50, 25],
            max_iter: 500,
            seed: 42,
            learning_rate: 0.001,
            alpha: 1e-4,
            batch_size: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
        }
    }
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Dense layer; `weights` is `fan_in × fan_out`.
#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

impl Layer {
    fn glorot(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Self {
        let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
        let weights = Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-bound..bound));
        let biases = Array1::from_shape_fn(fan_out, |_| rng.gen_range(-bound..bound));
        Self { weights, biases }
    }

    fn forward(&self, input: ArrayView2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.biases
    }
}

/// Adam moment estimates for one layer.
#[derive(Debug, Clone)]
struct Moments {
    m_weights: Array2<f64>,
    v_weights: Array2<f64>,
    m_biases: Array1<f64>,
    v_biases: Array1<f64>,
}

impl Moments {
    fn zeros_like(layer: &Layer) -> Self {
        Self {
            m_weights: Array2::zeros(layer.weights.raw_dim()),
            v_weights: Array2::zeros(layer.weights.raw_dim()),
            m_biases: Array1::zeros(layer.biases.raw_dim()),
            v_biases: Array1::zeros(layer.biases.raw_dim()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceRegressor {
    config: RegressorConfig,
    layers: Option<Vec<Layer>>,
    epochs_run: usize,
    final_loss: f64,
}

impl Default for RelevanceRegressor {
    fn default() -> Self {
        Self::new(RegressorConfig::default())
    }
}

impl RelevanceRegressor {
    pub fn new(config: RegressorConfig) -> Self {
        Self {
            config,
            layers: None,
            epochs_run: 0,
            final_loss: f64::NAN,
        }
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    pub fn final_loss(&self) -> f64 {
        self.final_loss
    }

    /// Trains from scratch on rows of `x` against targets `y`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> ScoringResult<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ScoringError::Numeric(format!(
                "training set has {} rows and {} targets",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() == 0 {
            return Err(ScoringError::EmptyVocabulary);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sizes = vec![x.ncols()];
        sizes.extend(&self.config.hidden_layers);
        sizes.push(1);
        let mut layers: Vec<Layer> = sizes
            .windows(2)
            .map(|w| Layer::glorot(w[0], w[1], &mut rng))
            .collect();
        let mut moments: Vec<Moments> = layers.iter().map(Moments::zeros_like).collect();

        let targets = y.view().insert_axis(Axis(1)).to_owned();
        let batch_size = self.config.batch_size.clamp(1, x.nrows());
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut converged = false;
        let mut epoch_loss = f64::NAN;
        let mut step = 0;
        let mut epochs = 0;

        for _ in 0..self.config.max_iter {
            epochs += 1;
            order.shuffle(&mut rng);
            let mut accumulated = 0.0;
            for batch in order.chunks(batch_size) {
                step += 1;
                let xb = x.select(Axis(0), batch);
                let yb = targets.select(Axis(0), batch);
                let loss = self.train_batch(&mut layers, &mut moments, &xb, &yb, step);
                accumulated += loss * batch.len() as f64;
            }
            epoch_loss = accumulated / x.nrows() as f64;

            if !epoch_loss.is_finite() {
                return Err(ScoringError::Numeric(format!(
                    "training loss diverged at epoch {epochs}"
                )));
            }

            if epoch_loss > best_loss - self.config.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);
            if no_improvement > self.config.n_iter_no_change {
                converged = true;
                break;
            }
        }

        if converged {
            debug!("Regressor converged after {epochs} epochs (loss {epoch_loss:.6})");
        } else {
            warn!(
                "Regressor reached max_iter={} without converging (loss {epoch_loss:.6})",
                self.config.max_iter
            );
        }

        self.layers = Some(layers);
        self.epochs_run = epochs;
        self.final_loss = epoch_loss;
        Ok(())
    }

    /// One Adam step on a mini-batch; returns the penalised batch loss.
    fn train_batch(
        &self,
        layers: &mut [Layer],
        moments: &mut [Moments],
        x: &Array2<f64>,
        y: &Array2<f64>,
        step: i32,
    ) -> f64 {
        let n = x.nrows() as f64;
        let alpha = self.config.alpha;
        let activations = forward_all(layers, x);
        let output = &activations[activations.len() - 1];

        let residual = output - y;
        let penalty: f64 = layers.iter().map(|l| l.weights.mapv(|w| w * w).sum()).sum();
        let loss = residual.mapv(|r| r * r).sum() / (2.0 * n) + 0.5 * alpha * penalty / n;

        // Identity output: the output delta is the residual.
        let mut delta = residual;
        let mut grads = Vec::with_capacity(layers.len());
        for li in (0..layers.len()).rev() {
            let input = &activations[li];
            let grad_w = (input.t().dot(&delta) + &layers[li].weights * alpha) / n;
            let grad_b = delta.sum_axis(Axis(0)) / n;
            if li > 0 {
                let relu_grad = input.mapv(|a| if a > 0.0 { 1.0 } else { 0.0 });
                delta = delta.dot(&layers[li].weights.t()) * relu_grad;
            }
            grads.push((li, grad_w, grad_b));
        }

        let lr = self.config.learning_rate * (1.0 - BETA2.powi(step)).sqrt()
            / (1.0 - BETA1.powi(step));
        for (li, grad_w, grad_b) in grads {
            let (layer, state) = (&mut layers[li], &mut moments[li]);
            adam_update(&mut layer.weights, &mut state.m_weights, &mut state.v_weights, &grad_w, lr);
            adam_update(&mut layer.biases, &mut state.m_biases, &mut state.v_biases, &grad_b, lr);
        }

        loss
    }

    pub fn predict(&self, x: &Array2<f64>) -> ScoringResult<Array1<f64>> {
        let layers = self.layers.as_ref().ok_or(ScoringError::NotFitted)?;
        let dims = layers[0].weights.nrows();
        if x.ncols() != dims {
            return Err(ScoringError::Numeric(format!(
                "input has {} features, regressor expects {dims}",
                x.ncols()
            )));
        }
        let activations = forward_all(layers, x);
        Ok(activations[activations.len() - 1].column(0).to_owned())
    }
}

/// Returns the input followed by every layer's activation.
fn forward_all(layers: &[Layer], input: &Array2<f64>) -> Vec<Array2<f64>> {
    let mut activations = Vec::with_capacity(layers.len() + 1);
    activations.push(input.to_owned());
    for (li, layer) in layers.iter().enumerate() {
        let mut out = layer.forward(activations[li].view());
        if li + 1 < layers.len() {
            out.mapv_inplace(|o| o.max(0.0));
        }
        activations.push(out);
    }
    activations
}

fn adam_update<D: Dimension>(
    params: &mut Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    lr: f64,
) {
    Zip::from(params)
        .and(m)
        .and(v)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            *p -= lr * *m / (v.sqrt() + EPSILON);
        });
}
