use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::ring::RingStore;
use feanor_math::rings::extension::extension_impl::FreeAlgebraImpl;
use feanor_math::rings::extension::FreeAlgebraStore;
use feanor_math::seq::VectorFn;

use super::poly::*;
use super::ring::*;
use super::*;

type PowerBasisRing<F> = FreeAlgebraImpl<FieldRing<F>, Vec<El<F>>>;

///
/// The field `F[x]/(f)` for an irreducible monic polynomial `f`. Elements are represented by
/// their coefficient vectors w.r.t. the power basis `1, x, ..., x^(n - 1)`.
///
/// Irreducibility of `f` is not checked, but inversion of a zero divisor returns `None`.
/// The arithmetic is done by a feanor-math [`FreeAlgebraImpl`] over the base field.
///
#[derive(Clone)]
pub struct SimpleExtension<F: Field> {
    base: F,
    modulus: Arc<Vec<El<F>>>,
    ring: Arc<PowerBasisRing<F>>
}

impl<F: Field> PartialEq for SimpleExtension<F> {

    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.modulus.len() == other.modulus.len() &&
            self.modulus.iter().zip(other.modulus.iter()).all(|(a, b)| self.base.eq_el(a, b))
    }
}

impl<F: Field> Debug for SimpleExtension<F> {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[x]/({:?})", self.base, self.modulus)
    }
}

impl<F: Field> SimpleExtension<F> {

    pub fn new(base: F, modulus: Vec<El<F>>) -> Self {
        let modulus = DensePolyRing::new(base.clone()).from_coefficients(modulus);
        assert!(modulus.len() >= 2, "modulus must have positive degree");
        assert!(base.is_one(&modulus[modulus.len() - 1]), "modulus must be monic");
        let degree = modulus.len() - 1;
        let x_pow_rank = modulus[..degree].iter().map(|c| base.neg(c)).collect::<Vec<_>>();
        let ring = FreeAlgebraImpl::new(FieldRingBase::new(base.clone()), degree, x_pow_rank);
        Self { base, modulus: Arc::new(modulus), ring: Arc::new(ring) }
    }

    fn to_ring(&self, value: &El<Self>) -> feanor_math::ring::El<PowerBasisRing<F>> {
        self.ring.from_canonical_basis(value.iter().cloned())
    }

    fn from_ring(&self, value: &feanor_math::ring::El<PowerBasisRing<F>>) -> El<Self> {
        self.ring.wrt_canonical_basis(value).iter().collect()
    }

    pub fn base_field(&self) -> &F {
        &self.base
    }

    pub fn degree(&self) -> usize {
        self.modulus.len() - 1
    }

    pub fn modulus(&self) -> &[El<F>] {
        &self.modulus
    }

    pub fn poly_ring(&self) -> DensePolyRing<F> {
        DensePolyRing::new(self.base.clone())
    }

    ///
    /// The residue class of `x`.
    ///
    pub fn generator(&self) -> El<Self> {
        self.from_coefficients(vec![self.base.zero(), self.base.one()])
    }

    pub fn from_base(&self, value: El<F>) -> El<Self> {
        let mut result = vec![self.base.zero(); self.degree()];
        result[0] = value;
        return result;
    }

    ///
    /// Returns the residue class of the polynomial with the given coefficients, which may have
    /// arbitrary length.
    ///
    pub fn from_coefficients(&self, coefficients: Vec<El<F>>) -> El<Self> {
        self.from_ring(&self.ring.from_canonical_basis_extended(coefficients))
    }

    pub fn coefficients<'a>(&self, value: &'a El<Self>) -> &'a [El<F>] {
        value
    }

    ///
    /// Returns the element of the base field represented by `value`, if it is in the base field.
    ///
    pub fn as_base(&self, value: &El<Self>) -> Option<El<F>> {
        if value[1..].iter().all(|c| self.base.is_zero(c)) {
            Some(value[0].clone())
        } else {
            None
        }
    }
}

impl<F: Field> Field for SimpleExtension<F> {

    type El = Vec<El<F>>;

    fn characteristic(&self) -> i64 {
        self.base.characteristic()
    }

    fn zero(&self) -> Self::El {
        vec![self.base.zero(); self.degree()]
    }

    fn one(&self) -> Self::El {
        self.from_base(self.base.one())
    }

    fn from_int(&self, value: i64) -> Self::El {
        self.from_base(self.base.from_int(value))
    }

    fn add(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        lhs.iter().zip(rhs.iter()).map(|(a, b)| self.base.add(a, b)).collect()
    }

    fn sub(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        lhs.iter().zip(rhs.iter()).map(|(a, b)| self.base.sub(a, b)).collect()
    }

    fn neg(&self, value: &Self::El) -> Self::El {
        value.iter().map(|a| self.base.neg(a)).collect()
    }

    fn mul(&self, lhs: &Self::El, rhs: &Self::El) -> Self::El {
        self.from_ring(&self.ring.mul(self.to_ring(lhs), self.to_ring(rhs)))
    }

    fn inv(&self, value: &Self::El) -> Option<Self::El> {
        if self.is_zero(value) {
            return None;
        }
        self.ring.invert(&self.to_ring(value)).map(|x| self.from_ring(&x))
    }

    fn is_zero(&self, value: &Self::El) -> bool {
        value.iter().all(|c| self.base.is_zero(c))
    }

    fn eq_el(&self, lhs: &Self::El, rhs: &Self::El) -> bool {
        lhs.iter().zip(rhs.iter()).all(|(a, b)| self.base.eq_el(a, b))
    }
}

#[cfg(test)]
use super::rational::RationalField;

#[test]
fn test_gaussian_numbers() {
    let QQ = RationalField;
    let K = SimpleExtension::new(QQ, vec![QQ.one(), QQ.zero(), QQ.one()]);
    let i = K.generator();
    assert!(K.eq_el(&K.from_int(-1), &K.mul(&i, &i)));
    let x = K.add(&K.from_int(2), &i);
    let x_inv = K.inv(&x).unwrap();
    assert!(K.is_one(&K.mul(&x, &x_inv)));
    assert!(K.as_base(&K.mul(&x, &K.sub(&K.from_int(2), &i))).is_some());
    assert!(K.inv(&K.zero()).is_none());
}

#[test]
fn test_degree_one_extension() {
    let QQ = RationalField;
    // Q[x]/(x + 1), so the generator is -1
    let K = SimpleExtension::new(QQ, vec![QQ.one(), QQ.one()]);
    assert!(K.eq_el(&K.from_int(-1), &K.generator()));
    assert!(K.is_one(&K.mul(&K.generator(), &K.generator())));
}

#[test]
fn test_tower() {
    let QQ = RationalField;
    let K = SimpleExtension::new(QQ, vec![QQ.one(), QQ.zero(), QQ.one()]);
    // K[y]/(y^2 - i)
    let L = SimpleExtension::new(K.clone(), vec![K.neg(&K.generator()), K.zero(), K.one()]);
    let alpha = L.generator();
    let alpha4 = L.pow(&alpha, 4);
    assert!(L.eq_el(&L.from_int(-1), &alpha4));
    assert!(L.is_one(&L.pow(&alpha, 8)));
    let inv = L.inv(&L.add(&alpha, &L.one())).unwrap();
    assert!(L.is_one(&L.mul(&inv, &L.add(&alpha, &L.one()))));
}
