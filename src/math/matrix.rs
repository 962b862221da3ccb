use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::io::{self, Read, Write};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::math::codec;

/// Dense 2-D matrix stored as a flat row-major buffer of `rows * cols` values.
///
/// Binary elementwise operators require equal shapes and `*` between two
/// matrices requires `left.cols == right.rows`; both panic otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Uniform samples in `[-1, 1)` from the thread-local generator.
    pub fn random(rows: usize, cols: usize) -> Matrix {
        Matrix::random_with_rng(rows, cols, &mut rand::thread_rng())
    }

    pub fn random_with_rng<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let data = (0..rows * cols)
            .map(|_| rng.gen::<f64>() * 2.0 - 1.0)
            .collect();
        Matrix { rows, cols, data }
    }

    /// Column vector (`values.len() x 1`).
    pub fn column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    /// Builds a matrix from a list of equally long rows.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let rows = data.len();
        let cols = data.first().map_or(0, |row| row.len());
        if data.iter().any(|row| row.len() != cols) {
            panic!("Rows must all have the same length")
        }
        Matrix {
            rows,
            cols,
            data: data.into_iter().flatten().collect(),
        }
    }

    /// Column vector of length `size` with a single `1.0` at `hot`.
    pub fn one_hot(hot: usize, size: usize) -> Matrix {
        if hot >= size {
            panic!("One-hot index {hot} out of range for size {size}")
        }
        let mut res = Matrix::zeros(size, 1);
        res.data[hot] = 1.0;
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    fn index(&self, row: usize, col: usize) -> usize {
        if row >= self.rows || col >= self.cols {
            panic!("Index ({row}, {col}) out of range for {}x{} matrix", self.rows, self.cols)
        }
        row * self.cols + col
    }

    /// Values of a single-column matrix.
    pub fn column_vector(&self) -> Vec<f64> {
        if self.cols != 1 {
            panic!("Column vector requested from a {}x{} matrix", self.rows, self.cols)
        }
        self.data.clone()
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn map_in_place<F>(&mut self, mut functor: F)
    where
        F: FnMut(f64) -> f64,
    {
        for x in self.data.iter_mut() {
            *x = functor(*x);
        }
    }

    /// Combines two same-shape matrices element by element.
    pub fn zip_map<F>(&self, other: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        self.assert_same_shape(other);
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| functor(a, b))
                .collect(),
        }
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.zip_map(other, |a, b| a * b)
    }

    pub fn hadamard_in_place(&mut self, other: &Matrix) {
        self.assert_same_shape(other);
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a *= b;
        }
    }

    /// Element-wise quotient.
    pub fn divide(&self, other: &Matrix) -> Matrix {
        self.zip_map(other, |a, b| a / b)
    }

    /// Element-wise maximum of two same-shape matrices.
    pub fn max(first: &Matrix, second: &Matrix) -> Matrix {
        first.zip_map(second, f64::max)
    }

    /// Writes `[rows:u32][cols:u32][values:f64 x rows*cols]`, little-endian.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        codec::write_u32(writer, codec::dim_to_u32(self.rows)?)?;
        codec::write_u32(writer, codec::dim_to_u32(self.cols)?)?;
        for &value in &self.data {
            codec::write_f64(writer, value)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Matrix> {
        let rows = codec::read_u32(reader)? as usize;
        let cols = codec::read_u32(reader)? as usize;
        let len = rows.checked_mul(cols).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "matrix dimensions overflow")
        })?;
        // A corrupt header must not trigger a huge up-front allocation.
        let mut data = Vec::with_capacity(len.min(1 << 16));
        for _ in 0..len {
            data.push(codec::read_f64(reader)?);
        }
        Ok(Matrix { rows, cols, data })
    }

    fn assert_same_shape(&self, other: &Matrix) {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "Matrices are of incorrect sizes: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add<&Matrix> for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub<&Matrix> for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: &Matrix) -> Matrix {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!(
                "Matrices are of incorrect sizes: {}x{} * {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..self.rows {
            for k in 0..self.cols {
                let left = self.data[i * self.cols + k];
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                let res_row = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
                for (out, &right) in res_row.iter_mut().zip(rhs_row) {
                    *out += left * right;
                }
            }
        }

        res
    }
}

// Owned operands forward to the borrowed implementations.
macro_rules! forward_owned_binop {
    ($($trait:ident :: $method:ident),*) => {$(
        impl $trait for Matrix {
            type Output = Matrix;

            fn $method(self, rhs: Matrix) -> Matrix {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Matrix> for Matrix {
            type Output = Matrix;

            fn $method(self, rhs: &Matrix) -> Matrix {
                (&self).$method(rhs)
            }
        }

        impl $trait<Matrix> for &Matrix {
            type Output = Matrix;

            fn $method(self, rhs: Matrix) -> Matrix {
                self.$method(&rhs)
            }
        }
    )*};
}

forward_owned_binop!(Add::add, Sub::sub, Mul::mul);

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, scalar: f64) -> Matrix {
        self.map(|x| x * scalar)
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(mut self, scalar: f64) -> Matrix {
        self *= scalar;
        self
    }
}

impl Mul<Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, matrix: Matrix) -> Matrix {
        matrix * self
    }
}

impl Mul<&Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, matrix: &Matrix) -> Matrix {
        matrix * self
    }
}

impl Div<f64> for &Matrix {
    type Output = Matrix;

    fn div(self, scalar: f64) -> Matrix {
        let mut res = self.clone();
        res /= scalar;
        res
    }
}

impl Div<f64> for Matrix {
    type Output = Matrix;

    fn div(mut self, scalar: f64) -> Matrix {
        self /= scalar;
        self
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    fn neg(mut self) -> Matrix {
        self.map_in_place(|x| -x);
        self
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs);
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += b;
        }
    }
}

impl AddAssign for Matrix {
    fn add_assign(&mut self, rhs: Matrix) {
        *self += &rhs;
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs);
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a -= b;
        }
    }
}

impl SubAssign for Matrix {
    fn sub_assign(&mut self, rhs: Matrix) {
        *self -= &rhs;
    }
}

impl MulAssign<f64> for Matrix {
    fn mul_assign(&mut self, scalar: f64) {
        self.map_in_place(|x| x * scalar);
    }
}

impl DivAssign<f64> for Matrix {
    fn div_assign(&mut self, scalar: f64) {
        if scalar == 0.0 {
            panic!("Cannot divide a matrix by zero")
        }
        self.map_in_place(|x| x / scalar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let t = sample().transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), sample());
    }

    #[test]
    fn multiply_matches_hand_computed_product() {
        let a = sample();
        let b = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        let p = &a * &b;
        assert_eq!(p.shape(), (2, 2));
        assert_eq!(p.data, vec![4.0, 5.0, 10.0, 11.0]);
    }

    #[test]
    fn elementwise_ops() {
        let a = sample();
        let b = Matrix::filled(2, 3, 2.0);
        assert_eq!((&a + &b).data, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!((&a - &b).data, vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.hadamard(&b).data, vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        assert_eq!(a.divide(&b).data, vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        assert_eq!((&a / 2.0).data, a.divide(&b).data);
        assert_eq!(Matrix::max(&a, &Matrix::filled(2, 3, 3.5)).data, vec![3.5, 3.5, 3.5, 4.0, 5.0, 6.0]);
        assert_eq!(a.sum(), 21.0);
    }

    #[test]
    fn in_place_ops_mutate_receiver() {
        let mut a = sample();
        a += &Matrix::filled(2, 3, 1.0);
        a -= &Matrix::filled(2, 3, 0.5);
        a *= 2.0;
        assert_eq!(a.data, vec![3.0, 5.0, 7.0, 9.0, 11.0, 13.0]);
        a.map_in_place(|x| x - 1.0);
        assert_eq!(a.get(1, 2), 12.0);
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn add_with_mismatched_shapes_panics() {
        let _ = &sample() + &Matrix::zeros(3, 2);
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn multiply_with_mismatched_inner_dimension_panics() {
        let _ = &sample() * &sample();
    }

    #[test]
    #[should_panic(expected = "divide a matrix by zero")]
    fn scalar_division_by_zero_panics() {
        let _ = sample() / 0.0;
    }

    #[test]
    fn binary_layout_is_header_then_row_major_values() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 8 + 6 * 8);
        assert_eq!(&buf[0..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..8], &3u32.to_le_bytes());
        assert_eq!(&buf[8..16], &1.0f64.to_le_bytes());
        let back = Matrix::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn truncated_matrix_is_an_io_error() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).unwrap();
        buf.truncate(20);
        let err = Matrix::read_from(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
