use ndarray::ArrayD;
use num::Complex;

pub mod complex;
pub mod error;
pub mod fft;
pub mod grid;
pub mod io;

/// A complex field over the grid (real space or Fourier space)
pub type Field = ArrayD<Complex<f64>>;

/// A real field over the grid
pub type RealField = ArrayD<f64>;
