//! Dense Tensors for the Classifier and Embedding Tables
//!
//! A deliberately small tensor type: a flat `Vec<f32>` plus a shape, stored in
//! row-major order. Everything in this crate is either a matrix
//! (`[rows, cols]`) or a batch of sequences (`[batch, seq, dim]`), so the
//! operations here only cover those two cases.
//!
//! ## Memory Layout
//!
//! For shape `[2, 3]` the data is laid out as
//! `[r0c0, r0c1, r0c2, r1c0, r1c1, r1c2]`. A `[batch, seq, dim]` tensor is the
//! same thing with `batch * seq` rows of width `dim`, which is why most
//! operations can treat it as a matrix.
//!
//! ## Example
//!
//! ```rust
//! use wordbag::Tensor;
//!
//! let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
//! let b = Tensor::new(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], vec![3, 2]);
//! let c = a.matmul(&b);
//! assert_eq!(c.shape, vec![2, 2]);
//! assert_eq!(c.data, vec![4.0, 5.0, 10.0, 11.0]);
//! ```
//!
//! ## Performance
//!
//! Matrix multiplication, row-wise softmax and row normalization run rows in
//! parallel with Rayon once the work is large enough to pay for the thread
//! hand-off. Small matrices stay sequential.

use rayon::prelude::*;

/// Work threshold (multiply-adds) above which matmul goes parallel
const PARALLEL_MATMUL_WORK: usize = 4_096;

/// A dense row-major tensor
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Flat storage of all elements
    pub data: Vec<f32>,
    /// Dimensions of the tensor
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Create a tensor from flat data and a shape
    ///
    /// # Panics
    ///
    /// Panics if the product of `shape` does not equal `data.len()`
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected,
            "Data length ({}) doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected
        );
        Self { data, shape }
    }

    /// Create a tensor filled with zeros
    ///
    /// ```rust
    /// # use wordbag::Tensor;
    /// let t = Tensor::zeros(vec![3, 4]);
    /// assert_eq!(t.numel(), 12);
    /// assert!(t.data.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self::new(vec![0.0; size], shape)
    }

    /// Build a matrix from equally sized rows
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths
    pub fn from_rows(rows: &[Vec<f32>]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "All rows must have the same length");
            data.extend_from_slice(row);
        }
        Self::new(data, vec![rows.len(), cols])
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Width of the last dimension
    pub fn cols(&self) -> usize {
        *self.shape.last().unwrap_or(&0)
    }

    /// Number of rows when the tensor is viewed as `[numel / cols, cols]`
    pub fn rows(&self) -> usize {
        match self.cols() {
            0 => 0,
            cols => self.data.len() / cols,
        }
    }

    /// Borrow row `i` of the matrix view
    pub fn row(&self, i: usize) -> &[f32] {
        let cols = self.cols();
        &self.data[i * cols..(i + 1) * cols]
    }

    /// Mutably borrow row `i` of the matrix view
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let cols = self.cols();
        &mut self.data[i * cols..(i + 1) * cols]
    }

    /// Copy of the tensor with a new shape (same element count)
    ///
    /// Used to flatten `[batch, seq, dim]` into `[batch * seq, dim]` and back.
    pub fn reshape(&self, new_shape: &[usize]) -> Tensor {
        let new_size: usize = new_shape.iter().product();
        assert_eq!(
            self.data.len(),
            new_size,
            "Cannot reshape {:?} into {:?}: element count mismatch",
            self.shape,
            new_shape
        );
        Tensor::new(self.data.clone(), new_shape.to_vec())
    }

    /// Inner loop of matmul: `out[j] += a * b[j]`
    ///
    /// Kept as a plain zip so LLVM auto-vectorizes it.
    #[inline(always)]
    fn axpy(a: f32, b: &[f32], out: &mut [f32]) {
        for (o, &bv) in out.iter_mut().zip(b.iter()) {
            *o += a * bv;
        }
    }

    /// 2D matrix multiplication: `[m, k] @ [k, n] -> [m, n]`
    ///
    /// # Panics
    ///
    /// Panics if either operand is not 2D or the inner dimensions differ
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert!(
            self.shape.len() == 2 && other.shape.len() == 2,
            "matmul expects 2D operands, got {:?} @ {:?}",
            self.shape,
            other.shape
        );
        let (m, k) = (self.shape[0], self.shape[1]);
        let n = other.shape[1];
        assert_eq!(
            k, other.shape[0],
            "Matrix dimensions incompatible: [{}, {}] @ [{}, {}]",
            m, k, other.shape[0], n
        );

        let mut result = vec![0.0; m * n];
        if n == 0 {
            return Tensor::new(result, vec![m, n]);
        }

        let row_kernel = |(i, out_row): (usize, &mut [f32])| {
            let a_row = &self.data[i * k..(i + 1) * k];
            for (l, &a_val) in a_row.iter().enumerate() {
                if a_val != 0.0 {
                    Self::axpy(a_val, &other.data[l * n..(l + 1) * n], out_row);
                }
            }
        };

        if m * n * k >= PARALLEL_MATMUL_WORK {
            result.par_chunks_mut(n).enumerate().for_each(row_kernel);
        } else {
            result.chunks_mut(n).enumerate().for_each(row_kernel);
        }

        Tensor::new(result, vec![m, n])
    }

    /// Transpose of a 2D matrix
    pub fn transpose(&self) -> Tensor {
        assert_eq!(self.shape.len(), 2, "transpose expects a 2D tensor");
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut result = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                result[j * rows + i] = self.data[i * cols + j];
            }
        }
        Tensor::new(result, vec![cols, rows])
    }

    /// Add a vector to every row (bias broadcast): `[*, n] + [n]`
    pub fn add_row(&self, bias: &Tensor) -> Tensor {
        let cols = self.cols();
        assert_eq!(
            bias.numel(),
            cols,
            "Cannot broadcast {:?} over rows of {:?}",
            bias.shape,
            self.shape
        );
        let mut result = self.data.clone();
        for row in result.chunks_mut(cols.max(1)) {
            for (x, &b) in row.iter_mut().zip(&bias.data) {
                *x += b;
            }
        }
        Tensor::new(result, self.shape.clone())
    }

    /// Sum over rows, producing one value per column
    ///
    /// This is the bias gradient of a dense layer.
    pub fn sum_rows(&self) -> Tensor {
        let cols = self.cols();
        let mut sums = vec![0.0; cols];
        for row in self.data.chunks(cols.max(1)) {
            for (s, &x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        Tensor::new(sums, vec![cols])
    }

    /// Multiply every element by a scalar
    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        let result = self.data.par_iter().map(|&x| x * scalar).collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Numerically stable softmax along the last dimension
    ///
    /// ```text
    /// softmax(x)[i] = exp(x[i] - max(x)) / Σ exp(x[j] - max(x))
    /// ```
    pub fn softmax_rows(&self) -> Tensor {
        let cols = self.cols();
        let mut result = self.data.clone();
        result.par_chunks_mut(cols.max(1)).for_each(|row| {
            let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            let mut sum = 0.0;
            for x in row.iter_mut() {
                *x = (*x - max).exp();
                sum += *x;
            }
            for x in row.iter_mut() {
                *x /= sum;
            }
        });
        Tensor::new(result, self.shape.clone())
    }

    /// Index of the largest value in each row (first one wins on ties)
    pub fn argmax_rows(&self) -> Vec<usize> {
        let cols = self.cols();
        if cols == 0 {
            return Vec::new();
        }
        self.data
            .chunks(cols)
            .map(|row| {
                let mut best = 0;
                for (j, &x) in row.iter().enumerate() {
                    if x > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }

    /// Copy of the matrix with every row scaled to unit L2 norm
    ///
    /// All-zero rows are left as zeros.
    pub fn normalize_rows(&self) -> Tensor {
        let cols = self.cols();
        let mut result = self.data.clone();
        result
            .par_chunks_mut(cols.max(1))
            .for_each(normalize_in_place);
        Tensor::new(result, self.shape.clone())
    }
}

/// Dot product of two equal-length slices
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2 norm of a slice
pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Scale a slice to unit L2 norm; a zero vector stays zero
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
