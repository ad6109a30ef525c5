use std::fmt::Debug;

use tracing::trace;

use crate::error::*;
use crate::field::poly::*;
use crate::field::residue::PrimeField;
use crate::field::*;
use crate::group::{lcm, GroupEl};

///
/// A cyclic piece of prime-power degree of a class field, given by a defining polynomial over
/// the base field.
///
#[derive(Clone)]
pub struct PieceField<K: NumberField> {
    pub degree: u64,
    pub prime: i64,
    pub polynomial: Poly<K>,
    ///
    /// The order `o` of the radicand of the radical extension the piece was descended from.
    ///
    pub radical_order: i64,
    pub defect: i64,
    pub target_generator: GroupEl
}

impl<K: NumberField> Debug for PieceField<K> {

    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceField")
            .field("degree", &self.degree)
            .field("prime", &self.prime)
            .field("polynomial", &self.polynomial)
            .field("radical_order", &self.radical_order)
            .finish()
    }
}

///
/// The class field, as compositum of its cyclic prime-power pieces. The pieces are linearly
/// disjoint, so the degree is the product of their degrees.
///
pub struct NonSimpleExtension<K: NumberField> {
    base: K,
    pieces: Vec<PieceField<K>>
}

impl<K: NumberField> NonSimpleExtension<K> {

    pub fn new(base: K, pieces: Vec<PieceField<K>>) -> Self {
        Self { base, pieces }
    }

    pub fn base_field(&self) -> &K {
        &self.base
    }

    pub fn pieces(&self) -> &[PieceField<K>] {
        &self.pieces
    }

    pub fn degree(&self) -> u64 {
        self.pieces.iter().map(|piece| piece.degree).product()
    }

    ///
    /// Returns one defining polynomial per piece. The trivial extension is defined by `y - 1`.
    ///
    pub fn defining_polynomials(&self) -> Vec<Poly<K>> {
        if self.pieces.is_empty() {
            let poly_ring = DensePolyRing::new(self.base.clone());
            return vec![poly_ring.sub(&poly_ring.indeterminate(), &poly_ring.one())];
        }
        self.pieces.iter().map(|piece| piece.polynomial.clone()).collect()
    }

    ///
    /// Computes the order of the Frobenius at an unramified degree-one prime `p` of `k`,
    /// i.e. the residue degree of `p` in the class field.
    ///
    pub fn frobenius_order(&self, prime: &K::Ideal) -> PrimeEval<u64> {
        let ell = self.base.ideal_minimum(prime);
        if self.base.ideal_norm(prime) != ell {
            return Err(BadPrime::new(ell, BadPrimeReason::HigherDegree));
        }
        let Fp = PrimeField::new(ell);
        let FpX = DensePolyRing::new(Fp);
        let mut result = 1;
        for piece in &self.pieces {
            let reduced = piece.polynomial.iter()
                .map(|c| self.base.reduce_mod_prime(c, prime).map(|c| Fp.from_int(c)))
                .collect::<Option<Vec<_>>>()
                .ok_or(BadPrime::new(ell, BadPrimeReason::NotIntegral))?;
            let f = FpX.from_coefficients(reduced);
            if FpX.degree(&f) != Some(piece.degree as usize) || !FpX.is_squarefree(&f) {
                return Err(BadPrime::new(ell, BadPrimeReason::NotSquarefree));
            }
            let x = FpX.rem(&FpX.indeterminate(), &f);
            let mut current = FpX.pow_mod(&x, ell as u64, &f);
            let mut order = 1;
            while !FpX.eq_el(&current, &x) {
                current = FpX.pow_mod(&current, ell as u64, &f);
                order += 1;
            }
            trace!("Frobenius at {:?} has order {} on piece of degree {}", prime, order, piece.degree);
            result = lcm(result, order);
        }
        return Ok(result as u64);
    }
}

impl<K: NumberField> Debug for NonSimpleExtension<K> {

    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pieces.iter().map(|piece| &piece.polynomial)).finish()
    }
}

#[cfg(test)]
use crate::field::rational::RationalField;

#[cfg(test)]
fn piece(degree: u64, prime: i64, polynomial: Vec<i64>) -> PieceField<RationalField> {
    PieceField {
        degree,
        prime,
        polynomial: polynomial.into_iter().map(|c| RationalField.from_int(c)).collect(),
        radical_order: degree as i64,
        defect: 1,
        target_generator: crate::group::FinAbGroup::cyclic(degree as i64).gen(0)
    }
}

#[test]
fn test_trivial_extension() {
    let extension = NonSimpleExtension::new(RationalField, Vec::new());
    assert_eq!(1, extension.degree());
    let QQ = RationalField;
    let polys = extension.defining_polynomials();
    assert_eq!(1, polys.len());
    assert_eq!(vec![QQ.from_int(-1), QQ.one()], polys[0]);
    assert_eq!(1, extension.frobenius_order(&7).unwrap());
}

#[test]
fn test_frobenius_order() {
    // Q(i, sqrt(5))
    let extension = NonSimpleExtension::new(RationalField, vec![piece(2, 2, vec![1, 0, 1]), piece(2, 2, vec![-5, 0, 1])]);
    assert_eq!(4, extension.degree());
    // 3 is inert in both, 29 splits in both, 11 splits only in Q(sqrt(5))
    assert_eq!(2, extension.frobenius_order(&3).unwrap());
    assert_eq!(1, extension.frobenius_order(&29).unwrap());
    assert_eq!(2, extension.frobenius_order(&11).unwrap());
    assert_eq!(BadPrimeReason::NotSquarefree, extension.frobenius_order(&5).unwrap_err().reason);
    assert_eq!(BadPrimeReason::NotSquarefree, extension.frobenius_order(&2).unwrap_err().reason);
}

#[test]
fn test_frobenius_order_cubic() {
    // the cubic subfield of Q(zeta_7), defined by y^3 + y^2 - 2y - 1
    let extension = NonSimpleExtension::new(RationalField, vec![piece(3, 3, vec![-1, -2, 1, 1])]);
    assert_eq!(3, extension.frobenius_order(&2).unwrap());
    assert_eq!(1, extension.frobenius_order(&13).unwrap());
    assert_eq!(3, extension.frobenius_order(&3).unwrap());
}
