use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::backend::*;
use crate::error::*;
use crate::field::linalg::*;
use crate::field::poly::*;
use crate::field::residue::PrimeField;
use crate::field::*;
use crate::group::*;
use crate::primes::*;

use super::compose::PieceField;
use super::decompose::PieceInit;
use super::radical::*;
use super::ClassFieldContext;

///
/// The elements of the fixed field whose characteristic polynomials are tried as defining
/// polynomial of the piece, in this order.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbitSum {
    /// `Tr_H(theta)`
    Trace,
    /// `Tr_H(theta^2)`
    TraceOfSquare,
    /// `Tr_H(sum_i j^i theta^(i + 1))`
    Mixed(i64)
}

impl OrbitSum {

    pub fn candidates() -> impl Iterator<Item = OrbitSum> {
        [OrbitSum::Trace, OrbitSum::TraceOfSquare].into_iter().chain((1..).map(OrbitSum::Mixed))
    }

    fn summand<K: NumberField>(&self, radical: &RadicalExtension<K>, theta: &El<RadicalField<K>>) -> El<RadicalField<K>> {
        let field = radical.field();
        match self {
            OrbitSum::Trace => theta.clone(),
            OrbitSum::TraceOfSquare => field.mul(theta, theta),
            OrbitSum::Mixed(j) => {
                let j = field.from_int(*j);
                let mut result = field.zero();
                let mut theta_power = theta.clone();
                let mut j_power = field.one();
                for _ in 0..radical.degree() {
                    result = field.add(&result, &field.mul(&j_power, &theta_power));
                    theta_power = field.mul(&theta_power, theta);
                    j_power = field.mul(&j_power, &j);
                }
                result
            }
        }
    }
}

fn all_distinct<F: Field>(field: &F, values: &[El<F>]) -> bool {
    values.iter().enumerate().all(|(i, x)| values[(i + 1)..].iter().all(|y| !field.eq_el(x, y)))
}

///
/// Finds `theta = alpha + j zeta` for the smallest `j >= 0` such that all conjugates of `theta`
/// are distinct, i.e. `theta` generates `K/k`. Returns `theta` and its conjugates, ordered as
/// the elements of the automorphism group.
///
pub fn primitive_element<K: NumberField>(radical: &RadicalExtension<K>, automorphisms: &AutomorphismGroup<K>) -> (El<RadicalField<K>>, Vec<El<RadicalField<K>>>) {
    let field = radical.field();
    let zeta = radical.from_cyclotomic(radical.cyclotomic().zeta());
    for j in 0.. {
        let theta = field.add(&radical.alpha(), &field.mul(&field.from_int(j), &zeta));
        let conjugates = automorphisms.elements().map(|(_, tau)| radical.apply(tau, &theta)).collect::<Vec<_>>();
        if all_distinct(field, &conjugates) {
            trace!("primitive element alpha + {} zeta", j);
            return (theta, conjugates);
        }
    }
    unreachable!()
}

fn reduce_poly<K: NumberField>(base: &K, Fp: &PrimeField, poly: &Poly<K>, prime: &K::Ideal) -> PrimeEval<Poly<PrimeField>> {
    let coefficients = poly.iter()
        .map(|c| base.reduce_mod_prime(c, prime).map(|c| Fp.from_int(c)))
        .collect::<Option<Vec<_>>>()
        .ok_or(BadPrime::new(Fp.characteristic(), BadPrimeReason::NotIntegral))?;
    return Ok(DensePolyRing::new(*Fp).from_coefficients(coefficients));
}

///
/// Identifies the Frobenius automorphism at a degree-one prime `p` of `k` by comparing
/// `x^l mod F` with the polynomials `g_tau` that satisfy `tau(theta) = g_tau(theta)`.
///
struct FrobeniusMatcher<K: NumberField> {
    minpoly: Poly<K>,
    conjugate_polys: Vec<(GroupEl, Poly<K>)>
}

impl<K: NumberField> FrobeniusMatcher<K> {

    fn new(radical: &RadicalExtension<K>, automorphisms: &AutomorphismGroup<K>, theta: &El<RadicalField<K>>, conjugates: &[El<RadicalField<K>>]) -> Self {
        let base = radical.cyclotomic().base_field();
        let field = radical.field();
        let n = radical.degree();

        let minpoly = DensePolyRing::new(field.clone()).from_roots(conjugates).iter()
            .map(|c| radical.as_base(c))
            .collect::<Option<Vec<_>>>()
            .expect("minimal polynomial of the primitive element is not defined over the base field");

        let mut theta_powers = Vec::with_capacity(n);
        let mut current = field.one();
        for _ in 0..n {
            theta_powers.push(radical.flatten(&current));
            current = field.mul(&current, theta);
        }
        let matrix = (0..n).map(|j| theta_powers.iter().map(|column| column[j].clone()).collect()).collect::<Vec<Vec<_>>>();
        let inverse = invert_matrix(base, &matrix).expect("powers of the primitive element are linearly dependent");

        let poly_ring = DensePolyRing::new(base.clone());
        let conjugate_polys = automorphisms.elements().zip(conjugates.iter())
            .map(|((x, _), conjugate)| (x, poly_ring.from_coefficients(matrix_vector_product(base, &inverse, &radical.flatten(conjugate)))))
            .collect();
        Self { minpoly, conjugate_polys }
    }

    fn frobenius(&self, base: &K, prime: &K::Ideal, ell: i64) -> PrimeEval<GroupEl> {
        let Fp = PrimeField::new(ell);
        let FpX = DensePolyRing::new(Fp);
        let minpoly = reduce_poly(base, &Fp, &self.minpoly, prime)?;
        if !FpX.is_squarefree(&minpoly) {
            return Err(BadPrime::new(ell, BadPrimeReason::NotSquarefree));
        }
        let x_power = FpX.pow_mod(&FpX.indeterminate(), ell as u64, &minpoly);
        let mut result = None;
        for (x, g) in &self.conjugate_polys {
            let g = FpX.rem(&reduce_poly(base, &Fp, g, prime)?, &minpoly);
            if FpX.eq_el(&g, &x_power) {
                if result.is_some() {
                    return Err(BadPrime::new(ell, BadPrimeReason::AmbiguousFrobenius));
                }
                result = Some(x.clone());
            }
        }
        return result.ok_or(BadPrime::new(ell, BadPrimeReason::NoFrobeniusMatch));
    }
}

///
/// Computes generators of the subgroup `H` of `Aut(K/k)` that fixes the piece. If `Aut(K/k)` is
/// cyclic, this is the unique subgroup of index `e`. Otherwise, `H` is the kernel of the Artin map
/// `Aut(K/k) -> Z/eZ`, which is interpolated from Frobenius elements at sampled primes.
///
#[instrument(skip_all)]
pub fn fixed_subgroup<B, M>(ctx: &ClassFieldContext<B>, rcg: &M, piece: &PieceInit, support_primes: &BTreeSet<i64>, radical: &RadicalExtension<B::BaseField>, automorphisms: &AutomorphismGroup<B::BaseField>, theta: &El<RadicalField<B::BaseField>>, conjugates: &[El<RadicalField<B::BaseField>>]) -> Result<Vec<GroupEl>>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    let group = automorphisms.group();
    let e = piece.degree as i64;
    if group.is_cyclic() {
        if group.is_trivial() {
            return Ok(Vec::new());
        }
        let generator = group.scale(&group.gen(0), e);
        return Ok(if group.is_zero(&generator) { Vec::new() } else { vec![generator] });
    }

    let base = ctx.base_field();
    let matcher = FrobeniusMatcher::new(radical, automorphisms, theta, conjugates);
    let target = piece.quotient.codomain();
    let cofactor = piece.rational_primes.union(support_primes).copied().collect::<Vec<_>>();
    let policy = PrimeSearchPolicy::new(cofactor, base.ring_index());
    let mut search = PrimeSearch::new(PrimeIter::all(), policy, ctx.config().prime_search_limit, "sampling Frobenius elements of the radical extension");
    let mut generating_set = GeneratingSet::new(group.clone());
    let mut pairs = Vec::new();
    while !generating_set.is_complete() {
        let ell = search.next_candidate()?;
        for (prime, _) in base.prime_decomposition(ell) {
            if base.ideal_norm(&prime) != ell {
                continue;
            }
            let pair = matcher.frobenius(base, &prime, ell).and_then(|frobenius| {
                let class = piece.quotient.apply(&rcg.preimage(&prime)?);
                Ok((frobenius, class))
            });
            match pair {
                Ok((frobenius, class)) => {
                    generating_set.offer(&frobenius);
                    pairs.push((frobenius, class));
                },
                Err(bad_prime) => trace!("discarding {:?}: {}", prime, bad_prime)
            }
        }
    }
    let artin = AbGroupHom::from_generating_pairs(group, target, &pairs)
        .unwrap_or_else(|err| panic!("Frobenius elements of the radical extension are inconsistent with the ray class group: {}", err));
    assert!(artin.is_surjective(), "radical extension does not contain the piece");
    let result = artin.kernel();
    assert_eq!(e, group.quotient(&result).0.order(), "fixed subgroup has wrong index");
    return Ok(result);
}

///
/// All elements of the subgroup generated by `generators`.
///
fn subgroup_elements(group: &FinAbGroup, generators: &[GroupEl]) -> Vec<GroupEl> {
    if generators.iter().all(|x| group.is_zero(x)) {
        return vec![group.zero()];
    }
    let (subgroup, inclusion) = group.subgroup(generators);
    return subgroup.elements().map(|x| inclusion.apply(&x)).collect();
}

///
/// Computes a defining polynomial of the fixed field of `H`, as characteristic polynomial of an
/// orbit sum over `H`. Its coefficients lie in `k` since the conjugates are indexed by a
/// transversal of `Aut(K/k)/H`.
///
pub fn fixed_field_polynomial<K: NumberField>(radical: &RadicalExtension<K>, automorphisms: &AutomorphismGroup<K>, fixed: &[GroupEl], theta: &El<RadicalField<K>>) -> (OrbitSum, Poly<K>) {
    let field = radical.field();
    let group = automorphisms.group();
    let base = radical.cyclotomic().base_field();
    let poly_ring = DensePolyRing::new(field.clone());
    let base_poly_ring = DensePolyRing::new(base.clone());

    let fixing_automorphisms = subgroup_elements(group, fixed).into_iter().map(|x| automorphisms.automorphism_of(&x).clone()).collect::<Vec<_>>();
    let (quotient, projection) = group.quotient(fixed);
    let transversal = quotient.elements().map(|x| automorphisms.automorphism_of(&projection.preimage(&x).unwrap()).clone()).collect::<Vec<_>>();

    let max_candidates = 2 * radical.degree() + 10;
    for candidate in OrbitSum::candidates().take(max_candidates) {
        let summand = candidate.summand(radical, theta);
        let orbit_sum = field.sum(fixing_automorphisms.iter().map(|tau| radical.apply(tau, &summand)));
        let conjugates = transversal.iter().map(|tau| radical.apply(tau, &orbit_sum)).collect::<Vec<_>>();
        let poly = poly_ring.from_roots(&conjugates).iter()
            .map(|c| radical.as_base(c))
            .collect::<Option<Vec<_>>>()
            .expect("characteristic polynomial of an orbit sum is not defined over the base field");
        let poly = base_poly_ring.from_coefficients(poly);
        if base_poly_ring.is_squarefree(&poly) {
            debug!("found defining polynomial of degree {} from {:?}", quotient.order(), candidate);
            return (candidate, poly);
        }
        trace!("orbit sum {:?} does not generate the fixed field", candidate);
    }
    panic!("none of the first {} orbit sums generates the fixed field", max_candidates)
}

///
/// Computes the piece as subfield of the radical extension `K`.
///
#[instrument(skip_all)]
pub fn descend<B, M>(ctx: &ClassFieldContext<B>, rcg: &M, piece: &PieceInit, support_primes: &BTreeSet<i64>, radical: &RadicalExtension<B::BaseField>, automorphisms: &AutomorphismGroup<B::BaseField>) -> Result<PieceField<B::BaseField>>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    let (theta, conjugates) = primitive_element(radical, automorphisms);
    let fixed = fixed_subgroup(ctx, rcg, piece, support_primes, radical, automorphisms, &theta, &conjugates)?;
    debug!("fixed subgroup is generated by {:?}", fixed.iter().map(|x| x.coords()).collect::<Vec<_>>());
    let (_, polynomial) = fixed_field_polynomial(radical, automorphisms, &fixed, &theta);
    assert_eq!(Some(piece.degree as usize), polynomial.len().checked_sub(1));
    return Ok(PieceField {
        degree: piece.degree,
        prime: piece.prime,
        polynomial,
        radical_order: radical.order(),
        defect: radical.defect(),
        target_generator: piece.target_generator.clone()
    });
}

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use crate::field::rational::RationalField;
#[cfg(test)]
use super::decompose::decompose;
#[cfg(test)]
use super::reduce::ReducedRadicand;
#[cfg(test)]
use super::ClassFieldConfig;

#[test]
fn test_orbit_sum_candidates() {
    let candidates = OrbitSum::candidates().take(4).collect::<Vec<_>>();
    assert_eq!(vec![OrbitSum::Trace, OrbitSum::TraceOfSquare, OrbitSum::Mixed(1), OrbitSum::Mixed(2)], candidates);
}

#[test]
fn test_descend_quadratic() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let backend = ctx.backend();
    let rcg = RationalRayClassGroup::new(5, false);
    let piece = decompose(&ctx, &rcg, &AbGroupHom::identity(rcg.group().clone())).unwrap().pop().unwrap();
    let C = Arc::new(backend.cyclotomic_extension(2).unwrap());
    let primes = backend.cyclotomic_primes_above(&C, 5).unwrap();
    let units = backend.s_unit_group(&C, &primes).unwrap();
    let radicand = ReducedRadicand { factored: units.as_factored(&[0, 1]), exponents: Some(vec![0, 1]) };
    let radical = RadicalExtension::new(C, radicand, 2, 1);
    let automorphisms = AutomorphismGroup::compute(&radical, backend, &units).unwrap();
    let piece_field = descend(&ctx, &rcg, &piece, &[5].into_iter().collect(), &radical, &automorphisms).unwrap();
    let QQ = RationalField;
    assert_eq!(vec![QQ.from_int(-5), QQ.zero(), QQ.one()], piece_field.polynomial);
    assert_eq!(2, piece_field.radical_order);
}

#[test]
fn test_frobenius_matcher() {
    let backend = RationalBackend::new();
    let C = Arc::new(backend.cyclotomic_extension(4).unwrap());
    let mut primes = backend.cyclotomic_primes_above(&C, 2).unwrap();
    primes.extend(backend.cyclotomic_primes_above(&C, 5).unwrap());
    let units = backend.s_unit_group(&C, &primes).unwrap();
    // a = pi pi'^3, as in the radical tests
    let radicand = ReducedRadicand { factored: units.as_factored(&[0, 0, 1, 3]), exponents: Some(vec![0, 0, 1, 3]) };
    let radical = RadicalExtension::new(C, radicand, 4, 1);
    let automorphisms = AutomorphismGroup::compute(&radical, &backend, &units).unwrap();
    assert_eq!(8, automorphisms.group().order());
    let (theta, conjugates) = primitive_element(&radical, &automorphisms);
    let matcher = FrobeniusMatcher::new(&radical, &automorphisms, &theta, &conjugates);
    assert_eq!(9, matcher.minpoly.len());

    assert_eq!(BadPrimeReason::NotSquarefree, matcher.frobenius(&RationalField, &5, 5).unwrap_err().reason);
    let mut matched = 0;
    for ell in [3, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43] {
        if let Ok(frobenius) = matcher.frobenius(&RationalField, &ell, ell) {
            // the Frobenius restricts to the Frobenius of Q(i), which is i -> i^ell
            assert_eq!(ell as u64 % 4, automorphisms.automorphism_of(&frobenius).galois_element() % 4);
            matched += 1;
        }
    }
    assert!(matched >= 8);
}
