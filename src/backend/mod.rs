use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::cyclotomic::*;
use crate::error::*;
use crate::field::factored::FacElem;
use crate::field::*;
use crate::group::*;

///
/// Contains an implementation of [`ClassFieldBackend`] and [`RayClassGroupMap`] over the
/// rational numbers.
///
pub mod rational;

///
/// A modulus of a number field, consisting of a finite part (an ideal, given by its
/// factorization) and a set of real places, given by their index.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modulus<I> {
    pub finite: Vec<(I, usize)>,
    pub real_places: Vec<usize>
}

impl<I> Modulus<I> {

    pub fn trivial() -> Self {
        Self { finite: Vec::new(), real_places: Vec::new() }
    }

    pub fn is_trivial(&self) -> bool {
        self.finite.is_empty() && self.real_places.is_empty()
    }

    pub fn finite_primes(&self) -> impl Iterator<Item = &I> {
        self.finite.iter().map(|(p, _)| p)
    }
}

///
/// A map from a finite abelian group to the ideals coprime to a fixed modulus, realizing
/// the group as ray class group.
///
pub trait RayClassGroupMap<K: NumberField>: Send + Sync {

    fn group(&self) -> &FinAbGroup;

    fn modulus(&self) -> &Modulus<K::Ideal>;

    ///
    /// Computes the class of a prime ideal. This fails with a [`BadPrime`] if the ideal
    /// is not coprime to the modulus.
    ///
    fn preimage(&self, ideal: &K::Ideal) -> PrimeEval<GroupEl>;

    ///
    /// Returns some prime ideal in the given class.
    ///
    fn image(&self, class: &GroupEl) -> K::Ideal;

    ///
    /// Returns generators of the subgroup of the ray class group that corresponds to
    /// the norms from `k(zeta_e)`.
    ///
    fn cyclotomic_norm_subgroup(&self, e: u64) -> Vec<GroupEl>;
}

///
/// A basis of the S-unit group of a cyclotomic field `C`. The first basis element is a
/// generator of the torsion subgroup, followed by the fundamental units and then one
/// element per prime in `S`.
///
#[derive(Clone, Debug)]
pub struct SUnitGroup<K: NumberField> {
    basis: Vec<El<CycloField<K>>>,
    torsion_order: i64,
    unit_rank: usize
}

impl<K: NumberField> SUnitGroup<K> {

    pub fn new(basis: Vec<El<CycloField<K>>>, torsion_order: i64, unit_rank: usize) -> Self {
        assert!(basis.len() >= unit_rank + 1);
        Self { basis, torsion_order, unit_rank }
    }

    pub fn basis(&self) -> &[El<CycloField<K>>] {
        &self.basis
    }

    pub fn torsion_generator(&self) -> &El<CycloField<K>> {
        &self.basis[0]
    }

    pub fn torsion_order(&self) -> i64 {
        self.torsion_order
    }

    pub fn unit_rank(&self) -> usize {
        self.unit_rank
    }

    pub fn support_size(&self) -> usize {
        self.basis.len() - self.unit_rank - 1
    }

    pub fn rank(&self) -> usize {
        self.basis.len()
    }

    pub fn fundamental_units(&self) -> &[El<CycloField<K>>] {
        &self.basis[1..(self.unit_rank + 1)]
    }

    ///
    /// Returns the factored element with the given exponents over the basis.
    ///
    pub fn as_factored(&self, exponents: &[i64]) -> FacElem<El<CycloField<K>>> {
        assert_eq!(self.basis.len(), exponents.len());
        FacElem::from_factors(self.basis.iter().cloned().zip(exponents.iter().copied()).collect())
    }

    ///
    /// Brings the torsion exponent into `[0, torsion_order)`.
    ///
    pub fn normalize(&self, mut exponents: Vec<i64>) -> Vec<i64> {
        exponents[0] = exponents[0].rem_euclid(self.torsion_order);
        return exponents;
    }

    ///
    /// Given the exponent vector of an S-unit `x`, returns an `n`-th root of `x` as factored
    /// element, or `None` if `x` is not an `n`-th power.
    ///
    pub fn root(&self, exponents: &[i64], n: i64) -> Option<FacElem<El<CycloField<K>>>> {
        let exponents = self.normalize(exponents.to_vec());
        if exponents.iter().any(|k| k % n != 0) {
            return None;
        }
        return Some(self.as_factored(&exponents.iter().map(|k| k / n).collect::<Vec<_>>()));
    }
}

///
/// The arithmetic of cyclotomic extensions `k(zeta_e)` of a fixed base field `k`, as far as
/// it is required for class field computations via Kummer theory.
///
pub trait ClassFieldBackend: Send + Sync {

    type BaseField: NumberField;
    type Prime: Clone + Debug + PartialEq + Eq + Hash + Ord + Send + Sync;

    fn base_field(&self) -> &Self::BaseField;

    ///
    /// Creates `k(zeta_e)`, or fails with [`ClassFieldError::Unsupported`] if the backend
    /// cannot do S-unit computations in it.
    ///
    fn cyclotomic_extension(&self, e: u64) -> Result<CyclotomicExtension<Self::BaseField>>;

    fn cyclotomic_primes_above(&self, cyclotomic: &CyclotomicExtension<Self::BaseField>, p: i64) -> Result<Vec<Self::Prime>>;

    ///
    /// The rational prime below the given prime.
    ///
    fn cyclotomic_prime_minimum(&self, prime: &Self::Prime) -> i64;

    fn cyclotomic_prime_norm(&self, prime: &Self::Prime) -> i64;

    fn cyclotomic_class_group(&self, cyclotomic: &CyclotomicExtension<Self::BaseField>) -> Result<FinAbGroup>;

    fn cyclotomic_class_of(&self, cyclotomic: &CyclotomicExtension<Self::BaseField>, prime: &Self::Prime) -> Result<GroupEl>;

    fn s_unit_group(&self, cyclotomic: &CyclotomicExtension<Self::BaseField>, support: &[Self::Prime]) -> Result<SUnitGroup<Self::BaseField>>;

    ///
    /// Writes `x` in terms of the basis of `units`, or returns `None` if `x` is not an S-unit.
    /// The torsion exponent is in `[0, torsion_order)`.
    ///
    fn s_unit_dlog(&self, cyclotomic: &CyclotomicExtension<Self::BaseField>, units: &SUnitGroup<Self::BaseField>, x: &El<CycloField<Self::BaseField>>) -> Option<Vec<i64>>;
}
