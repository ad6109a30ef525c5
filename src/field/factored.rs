use super::*;

///
/// A formal product `prod_i b_i^(n_i)` of field elements. Keeping elements in this form
/// avoids expanding large powers, and makes reduction modulo `n`-th powers a matter of
/// reducing exponents.
///
#[derive(Clone, Debug)]
pub struct FacElem<E> {
    factors: Vec<(E, i64)>
}

impl<E: Clone> FacElem<E> {

    pub fn one() -> Self {
        Self { factors: Vec::new() }
    }

    pub fn from_base(base: E) -> Self {
        Self { factors: vec![(base, 1)] }
    }

    pub fn from_factors(factors: Vec<(E, i64)>) -> Self {
        Self { factors: factors.into_iter().filter(|(_, k)| *k != 0).collect() }
    }

    pub fn factors(&self) -> &[(E, i64)] {
        &self.factors
    }

    pub fn is_one(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { factors: self.factors.iter().chain(other.factors.iter()).cloned().collect() }
    }

    pub fn pow(&self, power: i64) -> Self {
        Self::from_factors(self.factors.iter().map(|(b, k)| (b.clone(), k * power)).collect())
    }

    pub fn inv(&self) -> Self {
        self.pow(-1)
    }

    pub fn map_bases<E2, M>(&self, mut map: M) -> FacElem<E2>
        where M: FnMut(&E) -> E2
    {
        FacElem { factors: self.factors.iter().map(|(b, k)| (map(b), *k)).collect() }
    }

    ///
    /// Writes `self = reduced * cofactor^n` where all exponents of `reduced` are in `[0, n)`.
    ///
    pub fn reduce_exponents(&self, n: i64) -> (Self, Self) {
        let reduced = Self::from_factors(self.factors.iter().map(|(b, k)| (b.clone(), k.rem_euclid(n))).collect());
        let cofactor = Self::from_factors(self.factors.iter().map(|(b, k)| (b.clone(), k.div_euclid(n))).collect());
        return (reduced, cofactor);
    }

    ///
    /// Merges factors with equal bases.
    ///
    pub fn simplify<F>(&self, field: &F) -> Self
        where F: Field<El = E>
    {
        let mut result: Vec<(E, i64)> = Vec::new();
        for (b, k) in &self.factors {
            match result.iter_mut().find(|(c, _)| field.eq_el(b, c)) {
                Some((_, l)) => *l += k,
                None => result.push((b.clone(), *k))
            }
        }
        return Self::from_factors(result);
    }

    ///
    /// Expands the product. Returns `None` if some base with negative exponent is zero.
    ///
    pub fn evaluate<F>(&self, field: &F) -> Option<E>
        where F: Field<El = E>
    {
        let mut result = field.one();
        for (b, k) in &self.factors {
            result = field.mul(&result, &field.pow_signed(b, *k)?);
        }
        return Some(result);
    }
}

#[cfg(test)]
use super::rational::RationalField;

#[test]
fn test_reduce_and_evaluate() {
    let QQ = RationalField;
    let x = FacElem::from_factors(vec![(QQ.from_int(2), 7), (QQ.from_int(3), -1), (QQ.from_int(2), -2)]);
    let simplified = x.simplify(&QQ);
    assert_eq!(2, simplified.factors().len());
    assert_eq!(QQ.div(&QQ.from_int(32), &QQ.from_int(3)).unwrap(), x.evaluate(&QQ).unwrap());

    let (reduced, cofactor) = simplified.reduce_exponents(3);
    assert_eq!(QQ.from_int(4 * 9), reduced.evaluate(&QQ).unwrap());
    let recombined = reduced.mul(&cofactor.pow(3));
    assert_eq!(simplified.evaluate(&QQ).unwrap(), recombined.evaluate(&QQ).unwrap());
    assert!(FacElem::from_factors(vec![(QQ.zero(), -1)]).evaluate(&QQ).is_none());
}
