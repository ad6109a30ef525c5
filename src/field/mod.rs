use std::fmt::Debug;
use std::hash::Hash;

use rational::Rational;

///
/// Dense univariate polynomials over a [`Field`].
///
pub mod poly;

///
/// Simple algebraic extensions `F[x]/(f)`.
///
pub mod extension;

///
/// The field `Q` of rational numbers, as [`NumberField`].
///
pub mod rational;

///
/// Prime fields `Fp`, built on the `Zn` implementation of feanor-math.
///
pub mod residue;

///
/// Formal products of powers of field elements.
///
pub mod factored;

pub mod linalg;

///
/// The adapter that makes a [`Field`] usable as feanor-math ring.
///
pub mod ring;

///
/// A field, with the arithmetic done by the field object and elements being plain values.
///
/// This mirrors the separation between rings and their elements that is common in feanor-math,
/// but in a much reduced form, since we only need exact arithmetic in small number fields and
/// their residue fields. Through [`ring::FieldRingBase`], every such field is also a feanor-math
/// ring, which is how polynomials, extensions and linear algebra are implemented.
///
pub trait Field: Clone + Debug + PartialEq + Send + Sync {

    type El: Clone + Debug + Send + Sync;

    fn characteristic(&self) -> i64;

    fn zero(&self) -> Self::El;

    fn one(&self) -> Self::El;

    fn from_int(&self, value: i64) -> Self::El;

    fn add(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El;

    fn neg(&self, value: &Self::El) -> Self::El;

    fn mul(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El;

    ///
    /// Returns the inverse of `value`, or `None` if `value` is zero.
    ///
    fn inv(&self, value: &Self::El) -> Option<Self::El>;

    fn is_zero(&self, value: &Self::El) -> bool;

    fn sub(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        self.add(lhs, &self.neg(rhs))
    }

    fn eq_el(&self, lhs: &Self::El, rhs: &Self::El) -> bool {
        self.is_zero(&self.sub(lhs, rhs))
    }

    fn is_one(&self, value: &Self::El) -> bool {
        self.eq_el(value, &self.one())
    }

    fn div(&self, lhs: &Self::El, rhs: &Self::El) -> Option<Self::El> {
        Some(self.mul(lhs, &self.inv(rhs)?))
    }

    fn pow(&self, base: &Self::El, power: u64) -> Self::El {
        let mut result = self.one();
        let mut current = base.clone();
        let mut remaining = power;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = self.mul(&result, &current);
            }
            remaining >>= 1;
            if remaining > 0 {
                current = self.mul(&current, &current);
            }
        }
        return result;
    }

    ///
    /// Computes `base^power` for a possibly negative exponent, which fails only for `base = 0`
    /// and `power < 0`.
    ///
    fn pow_signed(&self, base: &Self::El, power: i64) -> Option<Self::El> {
        if power >= 0 {
            Some(self.pow(base, power as u64))
        } else {
            self.inv(&self.pow(base, power.unsigned_abs()))
        }
    }

    fn sum<I>(&self, it: I) -> Self::El
        where I: IntoIterator<Item = Self::El>
    {
        it.into_iter().fold(self.zero(), |a, b| self.add(&a, &b))
    }

    fn prod<I>(&self, it: I) -> Self::El
        where I: IntoIterator<Item = Self::El>
    {
        it.into_iter().fold(self.one(), |a, b| self.mul(&a, &b))
    }
}

pub type El<F> = <F as Field>::El;

///
/// The arithmetic of a number field `k` that the class field computations rely on. This
/// is the base field over which class fields are constructed.
///
/// Prime ideals are only ever used through their norm and minimum, and through reduction of
/// elements modulo degree-one primes. All other ideal arithmetic is left to the implementor.
///
pub trait NumberField: Field {

    type Ideal: Clone + Debug + PartialEq + Eq + Hash + Send + Sync;

    fn degree(&self) -> usize;

    fn from_rational(&self, value: &Rational) -> Self::El;

    ///
    /// Returns the primes above `p`, with their ramification indices.
    ///
    fn prime_decomposition(&self, p: i64) -> Vec<(Self::Ideal, usize)>;

    fn ideal_norm(&self, ideal: &Self::Ideal) -> i64;

    ///
    /// The positive generator of `ideal ∩ Z`.
    ///
    fn ideal_minimum(&self, ideal: &Self::Ideal) -> i64;

    ///
    /// The index of the equation order in the maximal order; primes dividing it are avoided
    /// in all prime searches.
    ///
    fn ring_index(&self) -> i64;

    fn roots_of_unity_order(&self) -> u64;

    ///
    /// Reduces `value` modulo the degree-one prime `prime`, giving its image in `Z/pZ` as
    /// an integer in `[0, p)`. Returns `None` if `value` is not integral at `prime`.
    ///
    fn reduce_mod_prime(&self, value: &Self::El, prime: &Self::Ideal) -> Option<i64>;

    ///
    /// Returns the (monic) minimal polynomial of a primitive `e`-th root of unity over
    /// this field, as coefficient list starting with the constant coefficient.
    ///
    fn cyclotomic_polynomial_factor(&self, e: u64) -> Vec<Self::El>;
}
