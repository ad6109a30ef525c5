use feanor_math::rings::zn::zn_64::ZnEl;

use crate::cyclotomic::*;
use crate::error::*;
use crate::field::factored::FacElem;
use crate::field::*;
use crate::group::*;

///
/// The Kummer extension `C(g_1^(1/e), ..., g_r^(1/e))` of the cyclotomic field `C = k(zeta_e)`.
/// If the `g_i` are independent modulo `e`-th powers, its Galois group over `C` is
/// `(Z/eZ)^r`, where `x` acts as `g_i^(1/e) -> zeta_e^(x_i) g_i^(1/e)`.
///
pub struct KummerExtension<K: NumberField> {
    degree: u64,
    generators: Vec<FacElem<El<CycloField<K>>>>,
    group: FinAbGroup
}

impl<K: NumberField> std::fmt::Debug for KummerExtension<K> {

    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KummerExtension(degree = {}, generators = {})", self.degree, self.generators.len())
    }
}

impl<K: NumberField> KummerExtension<K> {

    pub fn new(degree: u64, generators: Vec<FacElem<El<CycloField<K>>>>) -> Self {
        let group = FinAbGroup::from_invariants(vec![degree as i64; generators.len()]);
        Self { degree, generators, group }
    }

    pub fn degree(&self) -> u64 {
        self.degree
    }

    pub fn generators(&self) -> &[FacElem<El<CycloField<K>>>] {
        &self.generators
    }

    pub fn group(&self) -> &FinAbGroup {
        &self.group
    }

    fn reduce_generator(&self, cyclotomic: &CyclotomicExtension<K>, generator: &FacElem<El<CycloField<K>>>, prime: &DegreeOnePrime<K>) -> PrimeEval<ZnEl> {
        let Fp = &prime.residue_field;
        let mut result = Fp.one();
        for (base, exponent) in generator.factors() {
            let reduced = cyclotomic.reduce(base, prime)?;
            if Fp.is_zero(&reduced) {
                return Err(BadPrime::new(prime.characteristic(), BadPrimeReason::DividesGenerator));
            }
            result = Fp.mul(&result, &Fp.pow_signed(&reduced, *exponent).unwrap());
        }
        return Ok(result);
    }

    ///
    /// Computes the Frobenius element at the degree-one prime `P` of `C`, by evaluating the
    /// power residue symbols `g_i^((l - 1)/e) mod P`.
    ///
    pub fn frobenius(&self, cyclotomic: &CyclotomicExtension<K>, prime: &DegreeOnePrime<K>) -> PrimeEval<GroupEl> {
        assert_eq!(self.degree, cyclotomic.order());
        let Fp = &prime.residue_field;
        let ell = prime.characteristic();
        debug_assert!((ell - 1) % self.degree as i64 == 0);
        let power = ((ell - 1) / self.degree as i64) as u64;
        let zeta_powers = (0..self.degree).map(|k| Fp.pow(&prime.zeta_image, k)).collect::<Vec<_>>();
        let mut coords = Vec::with_capacity(self.generators.len());
        for generator in &self.generators {
            let symbol = Fp.pow(&self.reduce_generator(cyclotomic, generator, prime)?, power);
            let exponent = zeta_powers.iter().position(|z| Fp.eq_el(z, &symbol))
                .ok_or(BadPrime::new(ell, BadPrimeReason::NoCyclotomicRoot))?;
            coords.push(exponent as i64);
        }
        return Ok(self.group.element(coords));
    }
}

#[cfg(test)]
use crate::field::rational::RationalField;

#[test]
fn test_frobenius_quadratic() {
    let C = CyclotomicExtension::new(RationalField, 2);
    let field = C.field();
    let generators = [-1, 2, 5].into_iter().map(|x| FacElem::from_base(field.from_int(x))).collect();
    let kummer = KummerExtension::new(2, generators);
    assert_eq!(8, kummer.group().order());
    // Legendre symbols (-1/11) = -1, (2/11) = -1, (5/11) = 1
    let prime = C.degree_one_prime(&11).unwrap();
    assert_eq!(vec![1, 1, 0], kummer.frobenius(&C, &prime).unwrap().coords().to_vec());
    let prime = C.degree_one_prime(&5).unwrap();
    assert_eq!(BadPrimeReason::DividesGenerator, kummer.frobenius(&C, &prime).unwrap_err().reason);
}

#[test]
fn test_frobenius_quartic_residue() {
    // 2 is a square, but not a fourth power mod 17
    let C = CyclotomicExtension::new(RationalField, 4);
    let field = C.field();
    let kummer = KummerExtension::new(4, vec![FacElem::from_base(field.from_int(2)), FacElem::from_base(field.from_int(16))]);
    let prime = C.degree_one_prime(&17).unwrap();
    let frobenius = kummer.frobenius(&C, &prime).unwrap();
    assert_eq!(2, frobenius.coords()[0]);
    assert_eq!(0, frobenius.coords()[1]);
}
