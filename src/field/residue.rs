use std::fmt::{Debug, Formatter};

use feanor_math::algorithms::unity_root::get_prim_root_of_unity_gen;
use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::integer::BigIntRing;
use feanor_math::ring::*;
use feanor_math::rings::zn::zn_64::*;
use feanor_math::rings::zn::*;

use crate::{ZZbig, ZZi64};

use super::*;

///
/// The prime field `Fp`, as thin wrapper around [`feanor_math::rings::zn::zn_64::Zn`].
/// This is used for residue fields of degree-one primes.
///
#[derive(Clone, Copy)]
pub struct PrimeField {
    ring: Zn,
    p: i64
}

impl Debug for PrimeField {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "F_{}", self.p)
    }
}

impl PrimeField {

    pub fn new(p: i64) -> Self {
        assert!(p >= 2);
        Self { ring: Zn::new(p as u64), p }
    }

    ///
    /// Returns the representative of `value` in `[0, p)`.
    ///
    pub fn lift(&self, value: &ZnEl) -> i64 {
        self.ring.smallest_positive_lift(*value).rem_euclid(self.p)
    }

    ///
    /// Returns a primitive `e`-th root of unity, if `e | p - 1`.
    ///
    pub fn primitive_root_of_unity(&self, e: u64) -> Option<ZnEl> {
        get_prim_root_of_unity_gen(&self.ring, &(e as i64), ZZi64, &(self.p - 1))
    }

    ///
    /// Reduces an integer modulo `p`.
    ///
    pub fn from_big_int(&self, value: &feanor_math::ring::El<BigIntRing>) -> ZnEl {
        self.ring.coerce(&ZZbig, ZZbig.clone_el(value))
    }
}

impl PartialEq for PrimeField {

    fn eq(&self, other: &Self) -> bool {
        self.p == other.p
    }
}

impl Field for PrimeField {

    type El = ZnEl;

    fn characteristic(&self) -> i64 {
        self.p
    }

    fn zero(&self) -> Self::El {
        self.ring.zero()
    }

    fn one(&self) -> Self::El {
        self.ring.one()
    }

    fn from_int(&self, value: i64) -> Self::El {
        self.ring.coerce(&ZZi64, value)
    }

    fn add(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        self.ring.add(*lhs, *rhs)
    }

    fn sub(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        self.ring.sub(*lhs, *rhs)
    }

    fn neg(&self, value: &Self::El) -> Self::El {
        self.ring.negate(*value)
    }

    fn mul(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        self.ring.mul(*lhs, *rhs)
    }

    fn inv(&self, value: &Self::El) -> Option<Self::El> {
        self.ring.invert(value)
    }

    fn is_zero(&self, value: &Self::El) -> bool {
        self.ring.is_zero(value)
    }

    fn eq_el(&self, lhs: &Self::El, rhs: &Self::El) -> bool {
        self.ring.eq_el(lhs, rhs)
    }

    fn pow(&self, base: &Self::El, power: u64) -> Self::El {
        self.ring.pow(*base, power as usize)
    }
}

#[test]
fn test_prime_field_arithmetic() {
    let F13 = PrimeField::new(13);
    let x = F13.from_int(-3);
    assert_eq!(10, F13.lift(&x));
    assert_eq!(4, F13.lift(&F13.inv(&x).unwrap()));
    assert!(F13.inv(&F13.zero()).is_none());
    assert_eq!(1, F13.lift(&F13.pow(&x, 12)));
}

#[test]
fn test_primitive_root_of_unity() {
    let F13 = PrimeField::new(13);
    let zeta = F13.primitive_root_of_unity(4).unwrap();
    assert!(F13.eq_el(&F13.from_int(-1), &F13.pow(&zeta, 2)));
    let zeta = F13.primitive_root_of_unity(12).unwrap();
    assert!((1..12).all(|k| !F13.is_one(&F13.pow(&zeta, k))));
    assert!(F13.primitive_root_of_unity(5).is_none());
}
