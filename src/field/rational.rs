use std::fmt::{Debug, Formatter};

use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::integer::*;
use feanor_math::ordered::OrderedRingStore;
use feanor_math::pid::PrincipalIdealRingStore;
use feanor_math::ring::RingStore;
use feanor_math::rings::rational::{RationalField as FractionFieldOf, RationalFieldEl};

use crate::cyclotomic::cyclotomic_polynomial;
use crate::{ZZbig, ZZi64};

use super::residue::PrimeField;
use super::*;

pub type BigInt = feanor_math::ring::El<BigIntRing>;

const QQbig: FractionFieldOf<BigIntRing> = FractionFieldOf::new(ZZbig);

///
/// A rational number, as element of the feanor-math field of fractions of [`BigIntRing`].
/// The wrapper only adds value equality, so that rationals can be compared with `==`.
///
#[derive(Clone)]
pub struct Rational(RationalFieldEl<BigIntRing>);

impl Rational {

    pub fn new(numerator: i64, denominator: i64) -> Self {
        let result = QQbig.checked_div(&QQbig.coerce(&ZZi64, numerator), &QQbig.coerce(&ZZi64, denominator));
        Rational(result.expect("denominator is zero"))
    }

    pub fn from_integer(value: BigInt) -> Self {
        Rational(QQbig.coerce(&ZZbig, value))
    }

    pub fn numerator(&self) -> BigInt {
        ZZbig.clone_el(QQbig.num(&self.0))
    }

    ///
    /// The denominator of the reduced fraction, which is always positive.
    ///
    pub fn denominator(&self) -> BigInt {
        ZZbig.clone_el(QQbig.den(&self.0))
    }

    pub fn is_integer(&self) -> bool {
        ZZbig.is_one(QQbig.den(&self.0))
    }

    ///
    /// Returns the value as `i64`, if it is an integer of that size.
    ///
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() || ZZbig.abs_log2_ceil(QQbig.num(&self.0)).unwrap_or(0) >= 63 {
            return None;
        }
        Some(int_cast(self.numerator(), ZZi64, ZZbig))
    }

    pub fn abs(&self) -> Self {
        Rational(QQbig.abs(QQbig.clone_el(&self.0)))
    }

    pub fn to_f64(&self) -> f64 {
        ZZbig.to_float_approx(QQbig.num(&self.0)) / ZZbig.to_float_approx(QQbig.den(&self.0))
    }
}

impl PartialEq for Rational {

    fn eq(&self, other: &Self) -> bool {
        QQbig.eq_el(&self.0, &other.0)
    }
}

impl Eq for Rational {}

impl Debug for Rational {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", QQbig.format(&self.0))
    }
}

///
/// The rational numbers. Ideals of `Z` are represented by their positive generator.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RationalField;

impl Field for RationalField {

    type El = Rational;

    fn characteristic(&self) -> i64 {
        0
    }

    fn zero(&self) -> Self::El {
        Rational(QQbig.zero())
    }

    fn one(&self) -> Self::El {
        Rational(QQbig.one())
    }

    fn from_int(&self, value: i64) -> Self::El {
        Rational(QQbig.coerce(&ZZi64, value))
    }

    fn add(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        Rational(QQbig.add_ref(&lhs.0, &rhs.0))
    }

    fn sub(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        Rational(QQbig.sub_ref(&lhs.0, &rhs.0))
    }

    fn neg(&self, value: &Self::El) -> Self::El {
        Rational(QQbig.negate(QQbig.clone_el(&value.0)))
    }

    fn mul(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        Rational(QQbig.mul_ref(&lhs.0, &rhs.0))
    }

    fn inv(&self, value: &Self::El) -> Option<Self::El> {
        QQbig.invert(&value.0).map(Rational)
    }

    fn is_zero(&self, value: &Self::El) -> bool {
        QQbig.is_zero(&value.0)
    }

    fn eq_el(&self, lhs: &Self::El, rhs: &Self::El) -> bool {
        QQbig.eq_el(&lhs.0, &rhs.0)
    }
}

impl NumberField for RationalField {

    type Ideal = i64;

    fn degree(&self) -> usize {
        1
    }

    fn from_rational(&self, value: &Rational) -> Self::El {
        value.clone()
    }

    fn prime_decomposition(&self, p: i64) -> Vec<(Self::Ideal, usize)> {
        vec![(p, 1)]
    }

    fn ideal_norm(&self, ideal: &Self::Ideal) -> i64 {
        ideal.abs()
    }

    fn ideal_minimum(&self, ideal: &Self::Ideal) -> i64 {
        ideal.abs()
    }

    fn ring_index(&self) -> i64 {
        1
    }

    fn roots_of_unity_order(&self) -> u64 {
        2
    }

    fn reduce_mod_prime(&self, value: &Self::El, prime: &Self::Ideal) -> Option<i64> {
        let Fp = PrimeField::new(*prime);
        let result = Fp.div(&Fp.from_big_int(QQbig.num(&value.0)), &Fp.from_big_int(QQbig.den(&value.0)))?;
        return Some(Fp.lift(&result));
    }

    fn cyclotomic_polynomial_factor(&self, e: u64) -> Vec<Self::El> {
        cyclotomic_polynomial(e).into_iter().map(|c| self.from_int(c)).collect()
    }
}

///
/// Writes a vector of rationals as `d^-1 * v` with `v` integral and `d > 0` minimal.
///
pub fn clear_denominators(values: &[Rational]) -> (Vec<BigInt>, BigInt) {
    let denominator = values.iter().fold(ZZbig.one(), |current, x| ZZbig.lcm(&current, QQbig.den(&x.0)));
    let denominator = ZZbig.abs(denominator);
    let numerators = values.iter().map(|x| {
        let cofactor = ZZbig.checked_div(&denominator, QQbig.den(&x.0)).unwrap();
        ZZbig.mul_ref_snd(cofactor, QQbig.num(&x.0))
    }).collect();
    return (numerators, denominator);
}

pub fn is_integral(values: &[Rational]) -> bool {
    values.iter().all(|x| x.is_integer())
}

#[test]
fn test_reduce_mod_prime() {
    let QQ = RationalField;
    let x = Rational::new(3, 4);
    // 4^-1 = 2 mod 7
    assert_eq!(Some(6), QQ.reduce_mod_prime(&x, &7));
    assert_eq!(None, QQ.reduce_mod_prime(&x, &2));
    assert_eq!(Some(0), QQ.reduce_mod_prime(&QQ.from_int(21), &7));
    assert_eq!(Some(4), QQ.reduce_mod_prime(&QQ.from_int(-3), &7));
}

#[test]
fn test_clear_denominators() {
    let values = [Rational::new(1, 6), Rational::new(-3, 4)];
    let (numerators, denominator) = clear_denominators(&values);
    assert_eq!(Some(12), Rational::from_integer(denominator).to_i64());
    assert_eq!(vec![Some(2), Some(-9)], numerators.into_iter().map(|x| Rational::from_integer(x).to_i64()).collect::<Vec<_>>());
    assert!(!is_integral(&values));
}

#[test]
fn test_rational_arithmetic() {
    let QQ = RationalField;
    let x = QQ.div(&QQ.from_int(6), &QQ.from_int(-4)).unwrap();
    assert_eq!(Rational::new(-3, 2), x);
    assert_eq!(Rational::new(3, 2), x.abs());
    assert_eq!(Some(2), Rational::from_integer(x.denominator()).to_i64());
    assert!((x.to_f64() + 1.5).abs() < 1e-12);
    assert_eq!(None, x.to_i64());
    assert_eq!(Some(-7), QQ.from_int(-7).to_i64());
    assert!(QQ.inv(&QQ.zero()).is_none());
    assert_eq!(QQ.one(), QQ.mul(&x, &QQ.inv(&x).unwrap()));
}
