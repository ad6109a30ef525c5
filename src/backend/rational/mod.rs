use std::collections::HashMap;
use std::sync::RwLock;

use feanor_math::algorithms::discrete_log::multiplicative_order;
use feanor_math::ring::*;
use feanor_math::rings::float_complex::{Complex64, Complex64El};
use feanor_math::rings::zn::zn_64::Zn;
use tracing::{debug, instrument};

use crate::backend::*;
use crate::cyclotomic::*;
use crate::error::*;
use crate::field::rational::*;
use crate::field::*;
use crate::field::El;
use crate::group::*;
use crate::ZZi64;

///
/// The ray class groups of `Q`.
///
pub mod ray_class;
///
/// S-unit bases and discrete logarithms in `Q(zeta_e)`.
///
pub mod sunits;

///
/// The prime powers `e` for which `Q(zeta_e)` has class number one and the cyclotomic
/// units generate the full unit group.
///
pub const SUPPORTED_CYCLOTOMIC_ORDERS: [u64; 15] = [2, 3, 4, 5, 7, 8, 9, 11, 13, 16, 17, 19, 25, 27, 32];

const CC: Complex64 = Complex64::RING;

///
/// The largest coefficient used when searching for generators of prime ideals.
///
const MAX_GENERATOR_COEFFICIENT: i64 = 8;
const MAX_CANDIDATES_PER_BOUND: i64 = 1 << 20;
///
/// A bound on the rounding error of one term `c * exp(2 pi i k / e)` of a complex embedding,
/// relative to `|c|`.
///
const EMBEDDING_ERROR: f64 = 8. * f64::EPSILON;

///
/// A prime ideal of `Q(zeta_e)`, given by a generator.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RationalCyclotomicPrime {
    minimum: i64,
    residue_degree: usize,
    index: usize,
    generator: Vec<i64>
}

impl RationalCyclotomicPrime {

    pub fn minimum(&self) -> i64 {
        self.minimum
    }

    pub fn residue_degree(&self) -> usize {
        self.residue_degree
    }

    pub fn norm(&self) -> i64 {
        self.minimum.pow(self.residue_degree as u32)
    }

    pub fn generator(&self, cyclotomic: &CyclotomicExtension<RationalField>) -> El<CycloField<RationalField>> {
        cyclotomic.field().from_coefficients(self.generator.iter().map(|c| RationalField.from_int(*c)).collect())
    }
}

///
/// Backend for class fields over `Q`. All cyclotomic fields it supports have class number one,
/// so primes are represented by a generator, and the S-units are generated by the roots of unity,
/// the cyclotomic units and the prime generators.
///
pub struct RationalBackend {
    field: RationalField,
    primes: RwLock<HashMap<(u64, i64), Vec<RationalCyclotomicPrime>>>
}

impl Default for RationalBackend {

    fn default() -> Self {
        Self::new()
    }
}

impl RationalBackend {

    pub fn new() -> Self {
        Self { field: RationalField, primes: RwLock::new(HashMap::new()) }
    }

    pub fn is_supported(e: u64) -> bool {
        SUPPORTED_CYCLOTOMIC_ORDERS.contains(&e)
    }

    #[instrument(skip_all)]
    fn compute_primes_above(cyclotomic: &CyclotomicExtension<RationalField>, p: i64) -> Result<Vec<RationalCyclotomicPrime>> {
        let e = cyclotomic.order() as i64;
        let field = cyclotomic.field();
        let phi = cyclotomic.degree();
        if e % p == 0 {
            let generator = field.sub(&field.one(), &cyclotomic.zeta());
            return Ok(vec![RationalCyclotomicPrime { minimum: p, residue_degree: 1, index: 0, generator: integer_coefficients(&generator) }]);
        }
        let residue_degree = residue_degree(p, e);
        if residue_degree == phi {
            return Ok(vec![RationalCyclotomicPrime { minimum: p, residue_degree, index: 0, generator: integer_coefficients(&field.from_int(p)) }]);
        }
        let generator = find_generator(cyclotomic, p.pow(residue_degree as u32))?;
        let result = coset_representatives(cyclotomic, p).into_iter().enumerate().map(|(index, r)| RationalCyclotomicPrime {
            minimum: p,
            residue_degree,
            index,
            generator: integer_coefficients(&cyclotomic.apply_galois(&generator, r))
        }).collect::<Vec<_>>();
        debug!("found {} primes of degree {} above {} in Q(zeta_{})", result.len(), residue_degree, p, e);
        assert_eq!(phi, result.len() * residue_degree);
        return Ok(result);
    }
}

fn integer_coefficients(value: &[Rational]) -> Vec<i64> {
    assert!(is_integral(value));
    value.iter().map(|c| c.to_i64().expect("generator coefficients fit into i64")).collect()
}

fn residue_degree(p: i64, e: i64) -> usize {
    let Zn = Zn::new(e as u64);
    multiplicative_order(Zn.coerce(&ZZi64, p), Zn) as usize
}

///
/// Representatives of `Gal(Q(zeta_e)/Q) / <p>`, the latter being the decomposition group of `p`.
///
fn coset_representatives(cyclotomic: &CyclotomicExtension<RationalField>, p: i64) -> Vec<u64> {
    let e = cyclotomic.order();
    let mut covered = Vec::new();
    let mut result = Vec::new();
    for r in cyclotomic.automorphisms() {
        if covered.contains(r) {
            continue;
        }
        result.push(*r);
        let mut current = *r;
        loop {
            covered.push(current);
            current = (current * p as u64) % e;
            if current == *r {
                break;
            }
        }
    }
    return result;
}

///
/// Evaluates the element with the given coefficients at `exp(2 pi i r / e)`.
///
pub(crate) fn complex_embedding(coefficients: &[f64], e: u64, r: u64) -> Complex64El {
    let mut result = CC.zero();
    for (i, c) in coefficients.iter().enumerate() {
        let root = CC.root_of_unity(((r * i as u64) % e) as i64, e as i64);
        result = CC.add(result, CC.mul(root, CC.from_f64(*c)));
    }
    return result;
}

pub(crate) fn absolute_norm(cyclotomic: &CyclotomicExtension<RationalField>, value: &El<CycloField<RationalField>>) -> Rational {
    let field = cyclotomic.field();
    let norm = field.prod(cyclotomic.automorphisms().iter().map(|r| cyclotomic.apply_galois(value, *r)));
    return field.as_base(&norm).unwrap();
}

///
/// Searches for an element of absolute norm `+/- norm` with small coefficients. The candidates
/// are filtered by their approximate norm, computed from complex embeddings, and the remaining
/// ones are checked exactly.
///
/// A candidate is only rejected if its approximate norm differs from `norm` by more than the
/// propagated rounding error: every embedding is a sum of `phi` terms of size at most
/// `|c|_max`, so it has absolute error below `phi * |c|_max * EMBEDDING_ERROR`, and the
/// relative errors of the factors add up in the product. Candidates with an embedding close
/// to zero are therefore never rejected, but checked exactly.
///
fn find_generator(cyclotomic: &CyclotomicExtension<RationalField>, norm: i64) -> Result<El<CycloField<RationalField>>> {
    let phi = cyclotomic.degree();
    let e = cyclotomic.order();
    let target = RationalField.from_int(norm);
    let mut examined = 0;
    for bound in 1..=MAX_GENERATOR_COEFFICIENT {
        let base = 2 * bound + 1;
        let width = (1..=phi).take_while(|w| base.checked_pow(*w as u32).map(|count| count <= MAX_CANDIDATES_PER_BOUND).unwrap_or(false)).last().unwrap_or(0);
        if width == 0 {
            break;
        }
        for index in 0..base.pow(width as u32) {
            let mut coefficients = vec![0i64; phi];
            let mut rest = index;
            for c in coefficients.iter_mut().take(width) {
                *c = rest % base - bound;
                rest /= base;
            }
            if coefficients.iter().all(|c| c.abs() < bound) {
                continue;
            }
            examined += 1;
            let approximation = coefficients.iter().map(|c| *c as f64).collect::<Vec<_>>();
            let embeddings = cyclotomic.automorphisms().iter().map(|r| CC.abs(complex_embedding(&approximation, e, *r))).collect::<Vec<_>>();
            let approximate_norm: f64 = embeddings.iter().product();
            let embedding_error = phi as f64 * bound as f64 * EMBEDDING_ERROR;
            let norm_error = approximate_norm * (embeddings.iter().map(|x| embedding_error / x).sum::<f64>() + phi as f64 * f64::EPSILON);
            if norm_error.is_finite() && (approximate_norm - norm as f64).abs() > norm_error + 0.5 {
                continue;
            }
            let candidate = cyclotomic.field().from_coefficients(coefficients.iter().map(|c| RationalField.from_int(*c)).collect());
            if absolute_norm(cyclotomic, &candidate).abs() == target {
                return Ok(candidate);
            }
        }
    }
    return Err(ClassFieldError::SearchExhausted { examined, context: "searching a generator of a prime ideal" });
}

impl ClassFieldBackend for RationalBackend {

    type BaseField = RationalField;
    type Prime = RationalCyclotomicPrime;

    fn base_field(&self) -> &RationalField {
        &self.field
    }

    fn cyclotomic_extension(&self, e: u64) -> Result<CyclotomicExtension<RationalField>> {
        if !Self::is_supported(e) {
            return Err(ClassFieldError::Unsupported(format!("S-units of Q(zeta_{})", e)));
        }
        Ok(CyclotomicExtension::new(self.field, e))
    }

    fn cyclotomic_primes_above(&self, cyclotomic: &CyclotomicExtension<RationalField>, p: i64) -> Result<Vec<RationalCyclotomicPrime>> {
        let key = (cyclotomic.order(), p);
        if let Some(result) = self.primes.read().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return Ok(result.clone());
        }
        let result = Self::compute_primes_above(cyclotomic, p)?;
        self.primes.write().unwrap_or_else(|e| e.into_inner()).entry(key).or_insert(result.clone());
        return Ok(result);
    }

    fn cyclotomic_prime_minimum(&self, prime: &RationalCyclotomicPrime) -> i64 {
        prime.minimum()
    }

    fn cyclotomic_prime_norm(&self, prime: &RationalCyclotomicPrime) -> i64 {
        prime.norm()
    }

    fn cyclotomic_class_group(&self, _cyclotomic: &CyclotomicExtension<RationalField>) -> Result<FinAbGroup> {
        Ok(FinAbGroup::trivial())
    }

    fn cyclotomic_class_of(&self, _cyclotomic: &CyclotomicExtension<RationalField>, _prime: &RationalCyclotomicPrime) -> Result<GroupEl> {
        Ok(FinAbGroup::trivial().zero())
    }

    fn s_unit_group(&self, cyclotomic: &CyclotomicExtension<RationalField>, support: &[RationalCyclotomicPrime]) -> Result<SUnitGroup<RationalField>> {
        if !Self::is_supported(cyclotomic.order()) {
            return Err(ClassFieldError::Unsupported(format!("S-units of Q(zeta_{})", cyclotomic.order())));
        }
        Ok(sunits::s_unit_basis(cyclotomic, support))
    }

    fn s_unit_dlog(&self, cyclotomic: &CyclotomicExtension<RationalField>, units: &SUnitGroup<RationalField>, x: &El<CycloField<RationalField>>) -> Option<Vec<i64>> {
        sunits::dlog(cyclotomic, units, x)
    }
}

#[test]
fn test_primes_above_split() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(4).unwrap();
    let primes = backend.cyclotomic_primes_above(&C, 5).unwrap();
    assert_eq!(2, primes.len());
    assert_ne!(primes[0], primes[1]);
    for prime in &primes {
        assert_eq!(5, prime.norm());
        assert_eq!(RationalField.from_int(5), absolute_norm(&C, &prime.generator(&C)).abs());
    }
}

#[test]
fn test_primes_above_inert_and_ramified() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(5).unwrap();
    let primes = backend.cyclotomic_primes_above(&C, 2).unwrap();
    assert_eq!(1, primes.len());
    assert_eq!(16, primes[0].norm());
    let primes = backend.cyclotomic_primes_above(&C, 5).unwrap();
    assert_eq!(1, primes.len());
    assert_eq!(RationalField.from_int(5), absolute_norm(&C, &primes[0].generator(&C)));
    // 19 = -1 mod 5 has residue degree 2
    let primes = backend.cyclotomic_primes_above(&C, 19).unwrap();
    assert_eq!(2, primes.len());
    assert_eq!(361, primes[1].norm());
}

#[test]
fn test_residue_degree() {
    assert_eq!(1, residue_degree(11, 5));
    assert_eq!(4, residue_degree(2, 5));
    assert_eq!(8, residue_degree(2, 17));
    assert_eq!(16, residue_degree(3, 17));
}

#[test]
fn test_primes_above_split_in_degree_eight() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(16).unwrap();
    let primes = backend.cyclotomic_primes_above(&C, 17).unwrap();
    assert_eq!(8, primes.len());
    for prime in &primes {
        assert_eq!(RationalField.from_int(17), absolute_norm(&C, &prime.generator(&C)).abs());
    }
}

#[test]
fn test_unsupported() {
    let backend = RationalBackend::new();
    assert!(matches!(backend.cyclotomic_extension(23), Err(ClassFieldError::Unsupported(_))));
    assert!(backend.cyclotomic_extension(3).is_ok());
}
