use std::convert::Infallible;

use feanor_math::algorithms::poly_div::poly_div_rem;
use feanor_math::ring::RingStore;
use feanor_math::ring::RingExtensionStore;
use feanor_math::rings::poly::*;

use super::ring::*;
use super::*;

///
/// Polynomials are stored as coefficient vectors, starting with the constant coefficient.
/// They are always normalized, i.e. the last entry is nonzero, so the zero polynomial is
/// the empty vector.
///
pub type Poly<F> = Vec<El<F>>;

///
/// Polynomials over a [`Field`], using the feanor-math [`dense_poly::DensePolyRing`] over the
/// corresponding [`FieldRing`] for multiplication, division, derivation and evaluation.
///
#[derive(Clone, Debug)]
pub struct DensePolyRing<F: Field> {
    base: F,
    ring: dense_poly::DensePolyRing<FieldRing<F>>
}

impl<F: Field> DensePolyRing<F> {

    pub fn new(base: F) -> Self {
        let ring = dense_poly::DensePolyRing::new(FieldRingBase::new(base.clone()), "X");
        Self { base, ring }
    }

    pub fn base_field(&self) -> &F {
        &self.base
    }

    fn to_ring(&self, f: &Poly<F>) -> feanor_math::ring::El<dense_poly::DensePolyRing<FieldRing<F>>> {
        self.ring.from_terms(f.iter().enumerate().map(|(i, c)| (c.clone(), i)))
    }

    fn from_ring(&self, f: &feanor_math::ring::El<dense_poly::DensePolyRing<FieldRing<F>>>) -> Poly<F> {
        match self.ring.degree(f) {
            Some(d) => self.from_coefficients((0..=d).map(|i| self.ring.coefficient_at(f, i).clone()).collect()),
            None => self.zero()
        }
    }

    pub fn from_coefficients(&self, mut coefficients: Vec<El<F>>) -> Poly<F> {
        while coefficients.last().map(|c| self.base.is_zero(c)).unwrap_or(false) {
            coefficients.pop();
        }
        return coefficients;
    }

    pub fn zero(&self) -> Poly<F> {
        Vec::new()
    }

    pub fn one(&self) -> Poly<F> {
        self.constant(self.base.one())
    }

    pub fn constant(&self, value: El<F>) -> Poly<F> {
        self.from_coefficients(vec![value])
    }

    pub fn indeterminate(&self) -> Poly<F> {
        self.from_coefficients(vec![self.base.zero(), self.base.one()])
    }

    pub fn degree(&self, f: &Poly<F>) -> Option<usize> {
        f.len().checked_sub(1)
    }

    pub fn is_zero(&self, f: &Poly<F>) -> bool {
        f.is_empty()
    }

    pub fn coefficient(&self, f: &Poly<F>, i: usize) -> El<F> {
        f.get(i).cloned().unwrap_or_else(|| self.base.zero())
    }

    pub fn eq_el(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> bool {
        lhs.len() == rhs.len() && lhs.iter().zip(rhs.iter()).all(|(a, b)| self.base.eq_el(a, b))
    }

    pub fn add(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> Poly<F> {
        let len = lhs.len().max(rhs.len());
        self.from_coefficients((0..len).map(|i| self.base.add(&self.coefficient(lhs, i), &self.coefficient(rhs, i))).collect())
    }

    pub fn sub(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> Poly<F> {
        let len = lhs.len().max(rhs.len());
        self.from_coefficients((0..len).map(|i| self.base.sub(&self.coefficient(lhs, i), &self.coefficient(rhs, i))).collect())
    }

    pub fn neg(&self, f: &Poly<F>) -> Poly<F> {
        f.iter().map(|c| self.base.neg(c)).collect()
    }

    pub fn scale(&self, f: &Poly<F>, factor: &El<F>) -> Poly<F> {
        self.from_coefficients(f.iter().map(|c| self.base.mul(c, factor)).collect())
    }

    pub fn mul(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> Poly<F> {
        if lhs.is_empty() || rhs.is_empty() {
            return self.zero();
        }
        return self.from_ring(&self.ring.mul(self.to_ring(lhs), self.to_ring(rhs)));
    }

    ///
    /// Polynomial division with remainder. Panics if `rhs` is zero.
    ///
    pub fn div_rem(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> (Poly<F>, Poly<F>) {
        let rhs_degree = self.degree(rhs).expect("division by the zero polynomial");
        let lc_inv = self.base.inv(&rhs[rhs_degree]).expect("leading coefficient is nonzero");
        let (quotient, remainder) = poly_div_rem(&self.ring, self.to_ring(lhs), &self.to_ring(rhs), |c| Ok::<_, Infallible>(self.base.mul(c, &lc_inv)))
            .unwrap_or_else(|e| match e {});
        return (self.from_ring(&quotient), self.from_ring(&remainder));
    }

    pub fn rem(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> Poly<F> {
        self.div_rem(lhs, rhs).1
    }

    pub fn monic(&self, f: &Poly<F>) -> Poly<F> {
        match f.last() {
            Some(lc) => self.scale(f, &self.base.inv(lc).expect("leading coefficient is nonzero")),
            None => self.zero()
        }
    }

    ///
    /// Returns `(d, s, t)` with `d = s * lhs + t * rhs` a greatest common divisor. The gcd is
    /// not normalized.
    ///
    pub fn xgcd(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> (Poly<F>, Poly<F>, Poly<F>) {
        let (mut r0, mut r1) = (lhs.clone(), rhs.clone());
        let (mut s0, mut s1) = (self.one(), self.zero());
        let (mut t0, mut t1) = (self.zero(), self.one());
        while !self.is_zero(&r1) {
            let (q, r) = self.div_rem(&r0, &r1);
            let s = self.sub(&s0, &self.mul(&q, &s1));
            let t = self.sub(&t0, &self.mul(&q, &t1));
            r0 = std::mem::replace(&mut r1, r);
            s0 = std::mem::replace(&mut s1, s);
            t0 = std::mem::replace(&mut t1, t);
        }
        return (r0, s0, t0);
    }

    pub fn gcd(&self, lhs: &Poly<F>, rhs: &Poly<F>) -> Poly<F> {
        self.monic(&self.xgcd(lhs, rhs).0)
    }

    pub fn derivative(&self, f: &Poly<F>) -> Poly<F> {
        self.from_ring(&derive_poly(&self.ring, &self.to_ring(f)))
    }

    ///
    /// Checks whether the nonzero polynomial `f` has no repeated factors, via `gcd(f, f')`.
    ///
    pub fn is_squarefree(&self, f: &Poly<F>) -> bool {
        assert!(!self.is_zero(f));
        self.degree(&self.gcd(f, &self.derivative(f))) == Some(0)
    }

    pub fn evaluate(&self, f: &Poly<F>, x: &El<F>) -> El<F> {
        self.ring.evaluate(&self.to_ring(f), x, self.ring.base_ring().identity())
    }

    pub fn mul_mod(&self, lhs: &Poly<F>, rhs: &Poly<F>, modulus: &Poly<F>) -> Poly<F> {
        self.rem(&self.mul(lhs, rhs), modulus)
    }

    pub fn pow_mod(&self, base: &Poly<F>, power: u64, modulus: &Poly<F>) -> Poly<F> {
        let mut result = self.rem(&self.one(), modulus);
        let mut current = self.rem(base, modulus);
        let mut remaining = power;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = self.mul_mod(&result, &current, modulus);
            }
            remaining >>= 1;
            if remaining > 0 {
                current = self.mul_mod(&current, &current, modulus);
            }
        }
        return result;
    }

    ///
    /// Computes `prod_i (y - roots[i])`.
    ///
    pub fn from_roots(&self, roots: &[El<F>]) -> Poly<F> {
        roots.iter().fold(self.one(), |current, root| {
            self.mul(&current, &self.from_coefficients(vec![self.base.neg(root), self.base.one()]))
        })
    }

    pub fn map_coefficients<G, M>(&self, f: &Poly<F>, target: &DensePolyRing<G>, mut map: M) -> Poly<G>
        where G: Field,
            M: FnMut(&El<F>) -> El<G>
    {
        target.from_coefficients(f.iter().map(|c| map(c)).collect())
    }
}

#[cfg(test)]
use super::rational::RationalField;
#[cfg(test)]
use super::residue::PrimeField;

#[test]
fn test_div_rem_and_gcd() {
    let QQX = DensePolyRing::new(RationalField);
    let QQ = QQX.base_field().clone();
    let poly = |coeffs: &[i64]| QQX.from_coefficients(coeffs.iter().map(|c| QQ.from_int(*c)).collect());

    // (x^2 - 1)(x + 2) = x^3 + 2x^2 - x - 2
    let f = poly(&[-2, -1, 2, 1]);
    let g = poly(&[1, 1]);
    let (q, r) = QQX.div_rem(&f, &g);
    assert!(QQX.eq_el(&poly(&[-2, 1, 1]), &q));
    assert!(QQX.is_zero(&r));

    let h = poly(&[-1, 0, 1]);
    assert!(QQX.eq_el(&h, &QQX.gcd(&f, &QQX.scale(&h, &QQ.from_int(3)))));
    assert!(QQX.is_squarefree(&f));
    assert!(!QQX.is_squarefree(&QQX.mul(&g, &f)));

    let (d, s, t) = QQX.xgcd(&f, &poly(&[3, 1]));
    assert!(QQX.eq_el(&d, &QQX.add(&QQX.mul(&s, &f), &QQX.mul(&t, &poly(&[3, 1])))));
    assert_eq!(Some(0), QQX.degree(&d));
}

#[test]
fn test_pow_mod_over_prime_field() {
    let FpX = DensePolyRing::new(PrimeField::new(7));
    let Fp = FpX.base_field().clone();
    // x^2 + 1 is irreducible mod 7, so x^49 = x mod (x^2 + 1)
    let modulus = FpX.from_coefficients(vec![Fp.one(), Fp.zero(), Fp.one()]);
    let x = FpX.indeterminate();
    let x7 = FpX.pow_mod(&x, 7, &modulus);
    assert!(!FpX.eq_el(&x, &x7));
    assert!(FpX.eq_el(&x, &FpX.pow_mod(&x7, 7, &modulus)));
    assert!(FpX.is_squarefree(&modulus));
    assert!(FpX.eq_el(&FpX.from_roots(&[Fp.from_int(1), Fp.from_int(6)]), &FpX.from_coefficients(vec![Fp.from_int(6), Fp.zero(), Fp.one()])));
}
