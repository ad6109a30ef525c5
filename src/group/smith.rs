use feanor_math::algorithms::linsolve::smith::pre_smith;
use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::integer::*;
use feanor_math::matrix::transform::{TransformCols, TransformRows, TransformTarget};
use feanor_math::matrix::OwnedMatrix;
use feanor_math::ordered::OrderedRingStore;
use feanor_math::pid::PrincipalIdealRingStore;
use feanor_math::ring::*;
use feanor_math::rings::zn::zn_64::{Zn, ZnBase, ZnEl};
use feanor_math::rings::zn::ZnRingStore;

use crate::{ZZbig, ZZi64};

use super::{gcd, lcm};

///
/// Records a sequence of column operations in a matrix `R`, and simultaneously the
/// inverse row operations in `R^-1`.
///
struct RightTransform<'a> {
    right: &'a mut OwnedMatrix<ZnEl>,
    right_inv: &'a mut OwnedMatrix<ZnEl>
}

impl<'a> TransformTarget<ZnBase> for RightTransform<'a> {

    fn transform<S: Copy + RingStore<Type = ZnBase>>(&mut self, ring: S, i: usize, j: usize, transform: &[ZnEl; 4]) {
        TransformCols(self.right.data_mut(), ring.get_ring()).transform(ring, i, j, transform);
        let [a, b, c, d] = transform;
        let det = ring.sub(ring.mul_ref(a, d), ring.mul_ref(b, c));
        let det_inv = ring.invert(&det).unwrap();
        let inverse = [
            ring.mul_ref(d, &det_inv),
            ring.negate(ring.mul_ref(c, &det_inv)),
            ring.negate(ring.mul_ref(b, &det_inv)),
            ring.mul_ref(a, &det_inv)
        ];
        TransformRows(self.right_inv.data_mut(), ring.get_ring()).transform(ring, i, j, &inverse);
    }
}

///
/// A diagonalization `L * A * R = D` of a matrix `A` over `Z/NZ`, where `L` and `R` are
/// invertible. The diagonal is not normalized, use [`smith_normal_form()`] for that.
///
struct Diagonalization {
    ring: Zn,
    rows: usize,
    cols: usize,
    diagonal: Vec<ZnEl>,
    left: OwnedMatrix<ZnEl>,
    right: OwnedMatrix<ZnEl>,
    right_inv: OwnedMatrix<ZnEl>
}

impl Diagonalization {

    fn compute(matrix: &[Vec<i64>], cols: usize, modulus: i64) -> Self {
        assert!(modulus > 1);
        let ring = Zn::new(modulus as u64);
        let rows = matrix.len();
        let mut A = OwnedMatrix::from_fn(rows, cols, |i, j| {
            assert_eq!(cols, matrix[i].len());
            ring.coerce(&ZZi64, matrix[i][j])
        });
        let mut left = OwnedMatrix::identity(rows, rows, ring);
        let mut right = OwnedMatrix::identity(cols, cols, ring);
        let mut right_inv = OwnedMatrix::identity(cols, cols, ring);
        pre_smith(
            ring,
            &mut TransformRows(left.data_mut(), ring.get_ring()),
            &mut RightTransform { right: &mut right, right_inv: &mut right_inv },
            A.data_mut()
        );
        let diagonal = (0..rows.min(cols)).map(|i| *A.at(i, i)).collect();
        return Self { ring, rows, cols, diagonal, left, right, right_inv };
    }

    fn modulus(&self) -> i64 {
        *self.ring.modulus()
    }

    fn lift(&self, x: &ZnEl) -> i64 {
        self.ring.smallest_positive_lift(*x)
    }

    ///
    /// The order of the `j`-th cyclic factor of `(Z/NZ)^cols / rowspace(D)`.
    ///
    fn cyclic_order(&self, j: usize) -> i64 {
        match self.diagonal.get(j) {
            Some(d) => gcd(self.lift(d), self.modulus()),
            None => self.modulus()
        }
    }
}

///
/// Smith normal form of the group `Z^cols / (rowspace(A) + N Z^cols)`.
///
/// The group is `Z/d_1 x ... x Z/d_cols` with a divisibility chain `d_1 | d_2 | ... | N`, where
/// the first factors may be trivial. An element `x` of `Z^cols` has the coordinates `(x * right)_j mod d_j`,
/// and the `j`-th generator of the Smith normal form is represented by the `j`-th row of `right_inv`.
/// All matrix entries are in `[0, N)`.
///
#[derive(Debug, Clone)]
pub struct SmithForm {
    pub modulus: i64,
    pub invariants: Vec<i64>,
    pub right: Vec<Vec<i64>>,
    pub right_inv: Vec<Vec<i64>>
}

///
/// Computes the Smith normal form of `Z^cols / (rowspace(A) + N Z^cols)`. If `N` is a multiple of
/// the exponent of `Z^cols / rowspace(A)`, this is just the Smith normal form of `Z^cols / rowspace(A)`.
///
/// All computations happen in `Z/NZ`, so entries stay bounded.
///
pub fn smith_normal_form(matrix: &[Vec<i64>], cols: usize, modulus: i64) -> SmithForm {
    assert!(modulus >= 1);
    if modulus == 1 {
        let identity = (0..cols).map(|i| (0..cols).map(|j| if i == j { 1 } else { 0 }).collect::<Vec<_>>()).collect::<Vec<_>>();
        return SmithForm { modulus, invariants: vec![1; cols], right: identity.clone(), right_inv: identity };
    }
    let mut diag = Diagonalization::compute(matrix, cols, modulus);
    let ring = diag.ring;
    let mut invariants = (0..cols).map(|j| diag.cyclic_order(j)).collect::<Vec<_>>();

    // Z/a x Z/b -> Z/gcd(a, b) x Z/lcm(a, b) is given by the unimodular column transform
    // [[1, -t b/d], [1, s a/d]] where s a + t b = d
    for i in 0..cols {
        for j in (i + 1)..cols {
            let (a, b) = (invariants[i], invariants[j]);
            if b % a == 0 {
                continue;
            }
            let (mut s, mut t, mut d) = ZZi64.extended_ideal_gen(&a, &b);
            if d < 0 {
                (s, t, d) = (-s, -t, -d);
            }
            let transform = [
                ring.one(),
                ring.one(),
                ring.coerce(&ZZi64, -t * (b / d)),
                ring.coerce(&ZZi64, s * (a / d))
            ];
            RightTransform { right: &mut diag.right, right_inv: &mut diag.right_inv }.transform(ring, i, j, &transform);
            invariants[i] = d;
            invariants[j] = lcm(a, b);
        }
    }
    let to_rows = |matrix: &OwnedMatrix<ZnEl>| (0..cols).map(|i| (0..cols).map(|j| diag.lift(matrix.at(i, j))).collect()).collect();
    return SmithForm {
        modulus,
        invariants,
        right: to_rows(&diag.right),
        right_inv: to_rows(&diag.right_inv)
    };
}

///
/// Returns the index of the lattice spanned by the rows of `A` in `Z^cols`, or `None` if the
/// lattice does not have full rank.
///
pub fn lattice_index(matrix: &[Vec<i64>], cols: usize) -> Option<i64> {
    if cols == 0 {
        return Some(1);
    }
    if matrix.len() < cols {
        return None;
    }
    let mut A = OwnedMatrix::from_fn(matrix.len(), cols, |i, j| int_cast(matrix[i][j], ZZbig, ZZi64));
    pre_smith(ZZbig, &mut (), &mut (), A.data_mut());
    let mut index = ZZbig.one();
    for i in 0..cols {
        if ZZbig.is_zero(A.at(i, i)) {
            return None;
        }
        ZZbig.mul_assign_ref(&mut index, A.at(i, i));
    }
    return Some(int_cast(ZZbig.abs(index), ZZi64, ZZbig));
}

///
/// Returns generators of the module `{ x in (Z/NZ)^rows | x * A = 0 }`, as vectors with
/// entries in `[0, N)`.
///
pub fn left_kernel(matrix: &[Vec<i64>], cols: usize, modulus: i64) -> Vec<Vec<i64>> {
    let rows = matrix.len();
    if modulus == 1 {
        return (0..rows).map(|i| (0..rows).map(|k| if i == k { 1 } else { 0 }).collect()).collect();
    }
    let diag = Diagonalization::compute(matrix, cols, modulus);
    let mut result = Vec::new();
    // with x = y * L, we have x * A = y * D * R^-1, so the conditions are y_i d_i = 0
    for i in 0..diag.rows {
        let factor = if i < diag.cols { modulus / diag.cyclic_order(i) } else { 1 };
        if factor == modulus {
            continue;
        }
        result.push((0..rows).map(|k| (factor * diag.lift(diag.left.at(i, k))) % modulus).collect());
    }
    return result;
}

///
/// Finds a vector `x` with `x * A = y` over `Z/NZ`, if one exists.
///
pub fn solve_left(matrix: &[Vec<i64>], cols: usize, y: &[i64], modulus: i64) -> Option<Vec<i64>> {
    assert_eq!(cols, y.len());
    let rows = matrix.len();
    if modulus == 1 {
        return Some(vec![0; rows]);
    }
    let diag = Diagonalization::compute(matrix, cols, modulus);
    let ring = diag.ring;
    let y = y.iter().map(|c| ring.coerce(&ZZi64, *c)).collect::<Vec<_>>();
    let y_transformed = (0..cols).map(|j| ring.sum((0..cols).map(|k| ring.mul_ref(&y[k], diag.right.at(k, j))))).collect::<Vec<_>>();
    let mut z = vec![ring.zero(); rows];
    for j in 0..cols {
        if j < rows {
            z[j] = ring.checked_div(&y_transformed[j], &diag.diagonal[j])?;
        } else if !ring.is_zero(&y_transformed[j]) {
            return None;
        }
    }
    let result = (0..rows).map(|k| diag.lift(&ring.sum((0..rows).map(|i| ring.mul_ref(&z[i], diag.left.at(i, k)))))).collect();
    return Some(result);
}

#[cfg(test)]
fn mat_mul_mod(lhs: &[Vec<i64>], rhs: &[Vec<i64>], modulus: i64) -> Vec<Vec<i64>> {
    (0..lhs.len()).map(|i| (0..rhs[0].len()).map(|j| (0..rhs.len()).map(|k| lhs[i][k] * rhs[k][j]).sum::<i64>().rem_euclid(modulus)).collect()).collect()
}

#[test]
fn test_smith_normal_form() {
    let matrix = vec![vec![2, 4, 4], vec![-6, 6, 12], vec![10, -4, -16]];
    assert_eq!(Some(144), lattice_index(&matrix, 3));
    let snf = smith_normal_form(&matrix, 3, 144);
    assert_eq!(vec![2, 6, 12], snf.invariants);

    let identity = (0..3).map(|i| (0..3).map(|j| if i == j { 1 } else { 0 }).collect::<Vec<i64>>()).collect::<Vec<_>>();
    assert_eq!(identity, mat_mul_mod(&snf.right, &snf.right_inv, 144));
    // every relation maps to zero in the normal form coordinates
    for row in mat_mul_mod(&matrix, &snf.right, 144) {
        for (c, d) in row.iter().zip(snf.invariants.iter()) {
            assert_eq!(0, c % d);
        }
    }
}

#[test]
fn test_smith_normal_form_non_square() {
    let matrix = vec![vec![4, 0], vec![0, 6], vec![2, 2]];
    // Z^2 / <(4, 0), (0, 6), (2, 2)> has order 4
    assert_eq!(Some(4), lattice_index(&matrix, 2));
    let snf = smith_normal_form(&matrix, 2, 4);
    assert_eq!(4, snf.invariants.iter().product::<i64>());
    assert_eq!(None, lattice_index(&[vec![1, 2], vec![2, 4]], 2));
    assert_eq!(None, lattice_index(&[vec![1, 2]], 2));
}

#[test]
fn test_smith_normal_form_chain() {
    // Z/4 x Z/6 x Z/10 = Z/2 x Z/2 x Z/60
    let matrix = vec![vec![4, 0, 0], vec![0, 6, 0], vec![0, 0, 10]];
    let snf = smith_normal_form(&matrix, 3, 60);
    assert_eq!(vec![2, 2, 60], snf.invariants);
    let identity = (0..3).map(|i| (0..3).map(|j| if i == j { 1 } else { 0 }).collect::<Vec<i64>>()).collect::<Vec<_>>();
    assert_eq!(identity, mat_mul_mod(&snf.right, &snf.right_inv, 60));
}

#[test]
fn test_smith_normal_form_large_entries() {
    // entries whose products overflow i64, but the group is small
    let big = 3 * (1 << 40);
    let matrix = vec![vec![big + 1, big], vec![big, big - 1], vec![5, 0], vec![0, 5]];
    let snf = smith_normal_form(&matrix, 2, 5);
    assert_eq!(vec![1, 1], snf.invariants);
    let matrix = vec![vec![5 * big, 7], vec![7, 0], vec![0, 7]];
    let snf = smith_normal_form(&matrix, 2, 7);
    assert_eq!(vec![1, 7], snf.invariants);
}

#[test]
fn test_left_kernel_and_solve() {
    let matrix = vec![vec![1, 2], vec![2, 4], vec![3, 1]];
    let kernel = left_kernel(&matrix, 2, 35);
    assert!(kernel.len() >= 1);
    for x in &kernel {
        for j in 0..2 {
            assert_eq!(0, (0..3).map(|i| x[i] * matrix[i][j]).sum::<i64>() % 35);
        }
    }
    assert!(kernel.iter().any(|x| x.iter().any(|c| *c != 0)));
    let x = solve_left(&matrix, 2, &[5, 5], 35).unwrap();
    for j in 0..2 {
        assert_eq!(5, (0..3).map(|i| x[i] * matrix[i][j]).sum::<i64>() % 35);
    }
    assert!(solve_left(&vec![vec![2, 0], vec![0, 2]], 2, &[1, 0], 4).is_none());
    assert!(solve_left(&vec![vec![2, 0], vec![0, 2]], 2, &[2, 0], 4).is_some());
}
