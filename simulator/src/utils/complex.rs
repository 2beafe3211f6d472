use ndarray::IxDyn;
use num::Complex;

use super::{Field, RealField};

pub fn complex_constant(value: Complex<f64>, shape: &[usize]) -> Field {
    Field::from_elem(IxDyn(shape), value)
}

pub fn real_to_complex(array: &RealField) -> Field {
    array.mapv(|x| Complex::new(x, 0.0))
}

pub fn real_part(array: &Field) -> RealField {
    array.mapv(|z| z.re)
}

pub fn imag_part(array: &Field) -> RealField {
    array.mapv(|z| z.im)
}

/// Returns true if every entry is finite
pub fn check_complex_for_nans(array: &Field) -> bool {
    array.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

#[test]
fn test_nan_check() {
    let mut array = complex_constant(Complex::new(1.0, -1.0), &[4, 4]);
    assert!(check_complex_for_nans(&array));

    array[[2, 3]] = Complex::new(f64::NAN, 0.0);
    assert!(!check_complex_for_nans(&array));

    array[[2, 3]] = Complex::new(0.0, f64::INFINITY);
    assert!(!check_complex_for_nans(&array));
}
