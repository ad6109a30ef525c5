use feanor_math::divisibility::{DivisibilityRing, Domain};
use feanor_math::homomorphism::{CanHomFrom, CanIsoFromTo};
use feanor_math::integer::{int_cast, IntegerRing};
use feanor_math::pid::PrincipalIdealRing;
use feanor_math::ring::{EnvBindingStrength, RingBase, RingStore, RingValue};

use crate::ZZi64;

use super::Field;

///
/// A [`Field`] as feanor-math ring, so that the generic polynomial, free algebra and linear
/// algebra implementations of feanor-math can be used over it.
///
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRingBase<F: Field> {
    field: F
}

pub type FieldRing<F> = RingValue<FieldRingBase<F>>;

impl<F: Field> FieldRingBase<F> {

    pub fn new(field: F) -> FieldRing<F> {
        RingValue::from(Self { field })
    }

    pub fn field(&self) -> &F {
        &self.field
    }
}

impl<F: Field> RingBase for FieldRingBase<F> {

    type Element = F::El;

    fn clone_el(&self, val: &Self::Element) -> Self::Element {
        val.clone()
    }

    fn add_assign(&self, lhs: &mut Self::Element, rhs: Self::Element) {
        *lhs = self.field.add(lhs, &rhs);
    }

    fn add_assign_ref(&self, lhs: &mut Self::Element, rhs: &Self::Element) {
        *lhs = self.field.add(lhs, rhs);
    }

    fn sub_assign_ref(&self, lhs: &mut Self::Element, rhs: &Self::Element) {
        *lhs = self.field.sub(lhs, rhs);
    }

    fn negate_inplace(&self, lhs: &mut Self::Element) {
        *lhs = self.field.neg(lhs);
    }

    fn mul_assign(&self, lhs: &mut Self::Element, rhs: Self::Element) {
        *lhs = self.field.mul(lhs, &rhs);
    }

    fn mul_assign_ref(&self, lhs: &mut Self::Element, rhs: &Self::Element) {
        *lhs = self.field.mul(lhs, rhs);
    }

    fn zero(&self) -> Self::Element {
        self.field.zero()
    }

    fn one(&self) -> Self::Element {
        self.field.one()
    }

    fn from_int(&self, value: i32) -> Self::Element {
        self.field.from_int(value as i64)
    }

    fn eq_el(&self, lhs: &Self::Element, rhs: &Self::Element) -> bool {
        self.field.eq_el(lhs, rhs)
    }

    fn is_zero(&self, value: &Self::Element) -> bool {
        self.field.is_zero(value)
    }

    fn is_commutative(&self) -> bool { true }
    fn is_noetherian(&self) -> bool { true }
    fn is_approximate(&self) -> bool { false }

    fn dbg_within<'a>(&self, value: &Self::Element, out: &mut std::fmt::Formatter<'a>, _: EnvBindingStrength) -> std::fmt::Result {
        write!(out, "{:?}", value)
    }

    fn characteristic<I: RingStore + Copy>(&self, ZZ: I) -> Option<feanor_math::ring::El<I>>
        where I::Type: IntegerRing
    {
        Some(int_cast(self.field.characteristic(), ZZ, ZZi64))
    }
}

impl<F: Field> DivisibilityRing for FieldRingBase<F> {

    fn checked_left_div(&self, lhs: &Self::Element, rhs: &Self::Element) -> Option<Self::Element> {
        if self.field.is_zero(lhs) {
            return Some(self.field.zero());
        }
        self.field.div(lhs, rhs)
    }
}

impl<F: Field> Domain for FieldRingBase<F> {}

impl<F: Field> PrincipalIdealRing for FieldRingBase<F> {

    fn checked_div_min(&self, lhs: &Self::Element, rhs: &Self::Element) -> Option<Self::Element> {
        if self.field.is_zero(lhs) && self.field.is_zero(rhs) {
            return Some(self.field.one());
        }
        self.field.div(lhs, rhs)
    }

    fn extended_ideal_gen(&self, lhs: &Self::Element, rhs: &Self::Element) -> (Self::Element, Self::Element, Self::Element) {
        if let Some(lhs_inv) = self.field.inv(lhs) {
            (lhs_inv, self.field.zero(), self.field.one())
        } else if let Some(rhs_inv) = self.field.inv(rhs) {
            (self.field.zero(), rhs_inv, self.field.one())
        } else {
            (self.field.zero(), self.field.zero(), self.field.zero())
        }
    }
}

impl<F: Field> CanHomFrom<Self> for FieldRingBase<F> {

    type Homomorphism = ();

    fn has_canonical_hom(&self, from: &Self) -> Option<()> {
        if self == from { Some(()) } else { None }
    }

    fn map_in(&self, _from: &Self, el: Self::Element, _: &()) -> Self::Element {
        el
    }
}

impl<F: Field> CanIsoFromTo<Self> for FieldRingBase<F> {

    type Isomorphism = ();

    fn has_canonical_iso(&self, from: &Self) -> Option<()> {
        if self == from { Some(()) } else { None }
    }

    fn map_out(&self, _from: &Self, el: Self::Element, _: &()) -> Self::Element {
        el
    }
}

#[cfg(test)]
use super::rational::RationalField;
#[cfg(test)]
use super::residue::PrimeField;

#[test]
fn test_ring_axioms() {
    let QQ = FieldRingBase::new(RationalField);
    let elements = [0, 1, -1, 2, 7, -12].map(|x| QQ.get_ring().field().from_int(x));
    feanor_math::ring::generic_tests::test_ring_axioms(&QQ, elements.iter().cloned());
    feanor_math::divisibility::generic_tests::test_divisibility_axioms(&QQ, elements.iter().cloned());
    feanor_math::pid::generic_tests::test_principal_ideal_ring_axioms(&QQ, elements.iter().cloned());

    let F7 = FieldRingBase::new(PrimeField::new(7));
    feanor_math::ring::generic_tests::test_ring_axioms(&F7, (0..7).map(|x| F7.get_ring().field().from_int(x)));
    assert_eq!(Some(7), F7.characteristic(&ZZi64));
    assert_eq!(Some(0), QQ.characteristic(&ZZi64));
}
