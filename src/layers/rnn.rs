//! Vanilla (Elman) recurrent layer
//!
//! `RnnCell` advances the hidden state by one time step:
//!
//! h_t = act(x_t · W_ihᵀ + b_ih + h_{t-1} · W_hhᵀ + b_hh)
//!
//! with `act = tanh` unless configured otherwise. `Rnn` unrolls the cell over
//! a whole sequence.
//!
//! Shapes (batch-first):
//!   input:  [batch, seq_len, input_size]
//!   output: [batch, seq_len, hidden_size]
//!   h_n:    [batch, hidden_size]
//!
//! Weights and biases are initialised from U(-k, k) with k = sqrt(1 / hidden_size).

use crate::error::{Error, Result};
use crate::utils::{Activation, SimpleRng};

/// Single-step vanilla RNN cell.
///
/// `w_ih` is `hidden_size × input_size` and `w_hh` is
/// `hidden_size × hidden_size`, both row-major.
#[derive(Debug)]
pub struct RnnCell {
    input_size: usize,
    hidden_size: usize,
    w_ih: Vec<f32>,
    w_hh: Vec<f32>,
    b_ih: Vec<f32>,
    b_hh: Vec<f32>,
    activation: Activation,
}

impl RnnCell {
    /// Weights and biases drawn from U(-k, k) with k = sqrt(1 / hidden_size).
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when either size is zero.
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut SimpleRng) -> Result<Self> {
        check_sizes(input_size, hidden_size)?;
        let k = (1.0f32 / hidden_size as f32).sqrt();
        Ok(Self {
            input_size,
            hidden_size,
            w_ih: rng.uniform_vec(hidden_size * input_size, -k, k),
            w_hh: rng.uniform_vec(hidden_size * hidden_size, -k, k),
            b_ih: rng.uniform_vec(hidden_size, -k, k),
            b_hh: rng.uniform_vec(hidden_size, -k, k),
            activation: Activation::Tanh,
        })
    }

    /// Build a cell from explicit parameters.
    pub fn from_weights(
        input_size: usize,
        hidden_size: usize,
        w_ih: Vec<f32>,
        w_hh: Vec<f32>,
        b_ih: Vec<f32>,
        b_hh: Vec<f32>,
    ) -> Result<Self> {
        check_sizes(input_size, hidden_size)?;
        let expected = [
            (w_ih.len(), hidden_size * input_size),
            (w_hh.len(), hidden_size * hidden_size),
            (b_ih.len(), hidden_size),
            (b_hh.len(), hidden_size),
        ];
        for (got, expected) in expected {
            if got != expected {
                return Err(Error::ElementCountMismatch { expected, got });
            }
        }

        Ok(Self {
            input_size,
            hidden_size,
            w_ih,
            w_hh,
            b_ih,
            b_hh,
            activation: Activation::Tanh,
        })
    }

    /// Use `activation` instead of tanh.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn parameter_count(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b_ih.len() + self.b_hh.len()
    }

    /// Advance `batch_size` hidden states by one step.
    ///
    /// - `x`: `[batch, input_size]`
    /// - `h`: `[batch, hidden_size]`
    /// - `h_next`: `[batch, hidden_size]`, overwritten
    ///
    /// # Panics
    ///
    /// Panics if any buffer length disagrees with `batch_size`.
    pub fn step(&self, x: &[f32], h: &[f32], h_next: &mut [f32], batch_size: usize) {
        assert_eq!(x.len(), batch_size * self.input_size, "x len mismatch");
        assert_eq!(h.len(), batch_size * self.hidden_size, "h len mismatch");
        assert_eq!(h_next.len(), batch_size * self.hidden_size, "h_next len mismatch");

        for ((xb, hb), out) in x
            .chunks_exact(self.input_size)
            .zip(h.chunks_exact(self.hidden_size))
            .zip(h_next.chunks_exact_mut(self.hidden_size))
        {
            for (j, o) in out.iter_mut().enumerate() {
                let w_in = &self.w_ih[j * self.input_size..(j + 1) * self.input_size];
                let w_rec = &self.w_hh[j * self.hidden_size..(j + 1) * self.hidden_size];

                let mut z = self.b_ih[j] + self.b_hh[j];
                z += xb.iter().zip(w_in).map(|(a, b)| a * b).sum::<f32>();
                z += hb.iter().zip(w_rec).map(|(a, b)| a * b).sum::<f32>();
                *o = self.activation.apply(z);
            }
        }
    }
}

fn check_sizes(input_size: usize, hidden_size: usize) -> Result<()> {
    if input_size == 0 || hidden_size == 0 {
        return Err(Error::config(
            "RNN input_size and hidden_size must be greater than 0",
        ));
    }
    Ok(())
}

/// Hidden states produced by [`Rnn::forward`].
#[derive(Debug, Clone)]
pub struct RnnOutput {
    /// Every hidden state, `[batch, seq_len, hidden_size]`.
    pub outputs: Vec<f32>,
    /// Hidden state after the last step, `[batch, hidden_size]`.
    pub h_n: Vec<f32>,
}

/// A vanilla RNN cell unrolled over the sequence dimension.
pub struct Rnn {
    cell: RnnCell,
}

impl Rnn {
    pub fn new(cell: RnnCell) -> Self {
        Self { cell }
    }

    pub fn cell(&self) -> &RnnCell {
        &self.cell
    }

    /// Run the recurrence over `seq_len` steps starting from `h0` (zeros when
    /// `None`).
    ///
    /// # Errors
    ///
    /// `ElementCountMismatch` when `input` or `h0` do not match the given
    /// batch and sequence sizes.
    pub fn forward(
        &self,
        input: &[f32],
        h0: Option<&[f32]>,
        batch_size: usize,
        seq_len: usize,
    ) -> Result<RnnOutput> {
        let input_size = self.cell.input_size;
        let hidden_size = self.cell.hidden_size;

        let expected = batch_size * seq_len * input_size;
        if input.len() != expected {
            return Err(Error::ElementCountMismatch {
                expected,
                got: input.len(),
            });
        }

        let mut h = match h0 {
            Some(h0) if h0.len() != batch_size * hidden_size => {
                return Err(Error::ElementCountMismatch {
                    expected: batch_size * hidden_size,
                    got: h0.len(),
                });
            }
            Some(h0) => h0.to_vec(),
            None => vec![0.0f32; batch_size * hidden_size],
        };

        let mut outputs = vec![0.0f32; batch_size * seq_len * hidden_size];
        let mut x_t = vec![0.0f32; batch_size * input_size];
        let mut h_next = vec![0.0f32; batch_size * hidden_size];

        for t in 0..seq_len {
            // Gather step t of every sequence in the batch.
            for b in 0..batch_size {
                let src = (b * seq_len + t) * input_size;
                x_t[b * input_size..(b + 1) * input_size]
                    .copy_from_slice(&input[src..src + input_size]);
            }

            self.cell.step(&x_t, &h, &mut h_next, batch_size);
            std::mem::swap(&mut h, &mut h_next);

            for b in 0..batch_size {
                let dst = (b * seq_len + t) * hidden_size;
                outputs[dst..dst + hidden_size]
                    .copy_from_slice(&h[b * hidden_size..(b + 1) * hidden_size]);
            }
        }

        Ok(RnnOutput { outputs, h_n: h })
    }
}
