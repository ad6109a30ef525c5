use feanor_math::algorithms::linsolve::LinSolveRingStore;
use feanor_math::matrix::OwnedMatrix;
use feanor_math::ring::RingStore;

use super::ring::*;
use super::*;

///
/// Inverts a square matrix, using the linear system solver of feanor-math. Returns `None` if
/// it is singular.
///
pub fn invert_matrix<F: Field>(field: &F, matrix: &[Vec<El<F>>]) -> Option<Vec<Vec<El<F>>>> {
    let n = matrix.len();
    let ring = FieldRingBase::new(field.clone());
    let mut lhs = OwnedMatrix::from_fn(n, n, |i, j| matrix[i][j].clone());
    let mut rhs = OwnedMatrix::identity(n, n, &ring);
    let mut result = OwnedMatrix::zero(n, n, &ring);
    if !ring.solve_right(lhs.data_mut(), rhs.data_mut(), result.data_mut()).is_solved() {
        return None;
    }
    return Some((0..n).map(|i| (0..n).map(|j| result.at(i, j).clone()).collect()).collect());
}

pub fn matrix_vector_product<F: Field>(field: &F, matrix: &[Vec<El<F>>], vector: &[El<F>]) -> Vec<El<F>> {
    matrix.iter().map(|row| field.sum(row.iter().zip(vector.iter()).map(|(a, b)| field.mul(a, b)))).collect()
}

///
/// Solves a small real linear system by Gaussian elimination with partial pivoting.
///
/// The result is only used as approximation, which callers refine and check with exact
/// arithmetic. Systems whose pivots fall below `1e-12` are treated as singular.
///
pub fn solve_real_system(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = matrix.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|i, j| matrix[*i][col].abs().total_cmp(&matrix[*j][col].abs()))?;
        if matrix[pivot][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        for i in (col + 1)..n {
            let factor = matrix[i][col] / matrix[col][col];
            for k in col..n {
                matrix[i][k] -= factor * matrix[col][k];
            }
            rhs[i] -= factor * rhs[col];
        }
    }
    let mut result = vec![0.; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|k| matrix[i][k] * result[k]).sum();
        result[i] = (rhs[i] - tail) / matrix[i][i];
    }
    return Some(result);
}

#[cfg(test)]
use super::rational::RationalField;

#[test]
fn test_invert_matrix() {
    let QQ = RationalField;
    let matrix = vec![vec![QQ.from_int(2), QQ.from_int(1)], vec![QQ.from_int(1), QQ.from_int(1)]];
    let inverse = invert_matrix(&QQ, &matrix).unwrap();
    assert_eq!(vec![QQ.from_int(1), QQ.from_int(-1)], inverse[0]);
    assert_eq!(vec![QQ.from_int(-1), QQ.from_int(2)], inverse[1]);
    assert_eq!(vec![QQ.from_int(1), QQ.from_int(1)], matrix_vector_product(&QQ, &inverse, &[QQ.from_int(3), QQ.from_int(2)]));
    assert!(invert_matrix(&QQ, &[vec![QQ.from_int(1), QQ.from_int(2)], vec![QQ.from_int(2), QQ.from_int(4)]]).is_none());
}

#[test]
fn test_solve_real_system() {
    let solution = solve_real_system(vec![vec![0., 2.], vec![1., 1.]], vec![4., 3.]).unwrap();
    assert!((solution[0] - 1.).abs() < 1e-9);
    assert!((solution[1] - 2.).abs() < 1e-9);
}
