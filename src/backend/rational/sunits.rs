use feanor_math::ring::*;
use tracing::trace;

use crate::backend::SUnitGroup;
use crate::cyclotomic::*;
use crate::field::linalg::solve_real_system;
use crate::field::rational::*;
use crate::field::*;
use crate::field::El;

use super::*;

const MAX_REFINEMENT_STEPS: usize = 8;

///
/// Returns a generator of the roots of unity in `Q(zeta_e)` and their number.
///
pub fn torsion(cyclotomic: &CyclotomicExtension<RationalField>) -> (El<CycloField<RationalField>>, i64) {
    let e = cyclotomic.order() as i64;
    if e % 2 == 0 {
        (cyclotomic.zeta(), e)
    } else {
        (cyclotomic.field().neg(&cyclotomic.zeta()), 2 * e)
    }
}

///
/// The cyclotomic units `(1 - zeta^a) / (1 - zeta)` for `1 < a < e/2` coprime to `e`. For the
/// supported `e`, they form a basis of the unit group modulo torsion.
///
pub fn cyclotomic_units(cyclotomic: &CyclotomicExtension<RationalField>) -> Vec<El<CycloField<RationalField>>> {
    let e = cyclotomic.order() as i64;
    let field = cyclotomic.field();
    (2..).take_while(|a| 2 * a < e)
        .filter(|a| cyclotomic.full_galois_group().from_representative(*a).is_some())
        .map(|a| field.sum((0..a).map(|i| cyclotomic.zeta_power(i))))
        .collect()
}

pub fn s_unit_basis(cyclotomic: &CyclotomicExtension<RationalField>, support: &[RationalCyclotomicPrime]) -> SUnitGroup<RationalField> {
    let (torsion_generator, torsion_order) = torsion(cyclotomic);
    let units = cyclotomic_units(cyclotomic);
    let unit_rank = units.len();
    assert_eq!(unit_rank + 1, (cyclotomic.degree() + 1) / 2);
    let mut basis = vec![torsion_generator];
    basis.extend(units);
    basis.extend(support.iter().map(|prime| prime.generator(cyclotomic)));
    return SUnitGroup::new(basis, torsion_order, unit_rank);
}

///
/// The embeddings `zeta -> exp(2 pi i r / e)` used to compute the logarithmic embedding, one
/// per pair of complex conjugate embeddings, without the last one.
///
fn log_embedding_indices(cyclotomic: &CyclotomicExtension<RationalField>, unit_rank: usize) -> Vec<u64> {
    cyclotomic.automorphisms().iter().copied().filter(|r| 2 * r < cyclotomic.order()).take(unit_rank).collect()
}

fn log_embedding(cyclotomic: &CyclotomicExtension<RationalField>, value: &El<CycloField<RationalField>>, indices: &[u64]) -> Vec<f64> {
    let approximation = value.iter().map(Rational::to_f64).collect::<Vec<_>>();
    indices.iter().map(|r| CC.abs(complex_embedding(&approximation, cyclotomic.order(), *r)).ln()).collect()
}

///
/// Writes an algebraic integer `value` in terms of the basis of `units`, or returns `None`
/// if it is not an S-unit.
///
fn integral_dlog(cyclotomic: &CyclotomicExtension<RationalField>, units: &SUnitGroup<RationalField>, value: &El<CycloField<RationalField>>) -> Option<Vec<i64>> {
    let field = cyclotomic.field();
    let mut result = vec![0; units.rank()];
    let mut current = value.clone();

    let prime_offset = units.unit_rank() + 1;
    for (j, generator) in units.basis()[prime_offset..].iter().enumerate() {
        loop {
            let quotient = field.div(&current, generator)?;
            if !is_integral(&quotient) {
                break;
            }
            current = quotient;
            result[prime_offset + j] += 1;
        }
    }
    if absolute_norm(cyclotomic, &current).abs() != RationalField.one() {
        trace!("element is not an S-unit");
        return None;
    }

    if units.unit_rank() > 0 {
        let indices = log_embedding_indices(cyclotomic, units.unit_rank());
        let matrix_columns = units.fundamental_units().iter().map(|u| log_embedding(cyclotomic, u, &indices)).collect::<Vec<_>>();
        let matrix = (0..indices.len()).map(|i| matrix_columns.iter().map(|column| column[i]).collect::<Vec<_>>()).collect::<Vec<_>>();
        // the division by the rounded solution is exact, so repeating the step with the
        // remaining unit recovers exponents that were rounded wrongly
        for _ in 0..MAX_REFINEMENT_STEPS {
            let solution = solve_real_system(matrix.clone(), log_embedding(cyclotomic, &current, &indices))?;
            let exponents = solution.iter().map(|x| x.round() as i64).collect::<Vec<_>>();
            if exponents.iter().all(|x| *x == 0) {
                break;
            }
            for (a, (exponent, unit)) in exponents.iter().zip(units.fundamental_units().iter()).enumerate() {
                current = field.mul(&current, &field.pow_signed(unit, -exponent)?);
                result[1 + a] += exponent;
            }
        }
    }

    let mut power = field.one();
    for k in 0..units.torsion_order() {
        if field.eq_el(&power, &current) {
            result[0] = k;
            return Some(result);
        }
        power = field.mul(&power, units.torsion_generator());
    }
    trace!("rounding the logarithmic embedding did not give a root of unity");
    return None;
}

pub fn dlog(cyclotomic: &CyclotomicExtension<RationalField>, units: &SUnitGroup<RationalField>, value: &El<CycloField<RationalField>>) -> Option<Vec<i64>> {
    let field = cyclotomic.field();
    if field.is_zero(value) {
        return None;
    }
    let (numerator, denominator) = clear_denominators(value);
    let numerator = numerator.into_iter().map(Rational::from_integer).collect();
    let denominator = field.from_base(Rational::from_integer(denominator));
    let numerator_dlog = integral_dlog(cyclotomic, units, &numerator)?;
    let denominator_dlog = integral_dlog(cyclotomic, units, &denominator)?;
    let result = numerator_dlog.iter().zip(denominator_dlog.iter()).map(|(a, b)| a - b).collect();
    return Some(units.normalize(result));
}

#[cfg(test)]
use crate::backend::ClassFieldBackend;

#[test]
fn test_unit_dlog() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(5).unwrap();
    let field = C.field();
    let units = backend.s_unit_group(&C, &[]).unwrap();
    assert_eq!(1, units.unit_rank());
    assert_eq!(10, units.torsion_order());

    let golden_ratio = &units.fundamental_units()[0];
    let x = field.mul(&field.pow_signed(golden_ratio, -3).unwrap(), &field.pow(&C.zeta(), 2));
    let exponents = backend.s_unit_dlog(&C, &units, &x).unwrap();
    assert_eq!(-3, exponents[1]);
    assert!(field.eq_el(&x, &units.as_factored(&exponents).evaluate(field).unwrap()));

    assert!(backend.s_unit_dlog(&C, &units, &field.from_int(2)).is_none());
}

#[test]
fn test_unit_dlog_large_exponents() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(16).unwrap();
    let field = C.field();
    let units = backend.s_unit_group(&C, &[]).unwrap();
    assert_eq!(3, units.unit_rank());

    let exponents = [5, 60, -45, 70];
    let x = units.as_factored(&exponents).evaluate(field).unwrap();
    let result = backend.s_unit_dlog(&C, &units, &x).unwrap();
    assert_eq!(exponents[1..].to_vec(), result[1..].to_vec());
    assert!(field.eq_el(&x, &units.as_factored(&result).evaluate(field).unwrap()));
}

#[test]
fn test_s_unit_dlog() {
    let backend = RationalBackend::new();
    let C = backend.cyclotomic_extension(4).unwrap();
    let field = C.field();
    let mut support = backend.cyclotomic_primes_above(&C, 5).unwrap();
    support.extend(backend.cyclotomic_primes_above(&C, 2).unwrap());
    let units = backend.s_unit_group(&C, &support).unwrap();
    assert_eq!(4, units.rank());

    // 10 / i is (2 + i)(2 - i)(1 - i)^2 up to a root of unity
    let x = field.div(&field.from_int(10), &C.zeta()).unwrap();
    let exponents = backend.s_unit_dlog(&C, &units, &x).unwrap();
    assert_eq!(vec![1, 1, 2], exponents[1..].to_vec());
    assert!(field.eq_el(&x, &units.as_factored(&exponents).evaluate(field).unwrap()));

    let y = field.div(&field.from_int(5), &field.from_int(8)).unwrap();
    let exponents = backend.s_unit_dlog(&C, &units, &y).unwrap();
    assert_eq!(vec![1, 1, -6], exponents[1..].to_vec());
    assert!(field.eq_el(&y, &units.as_factored(&exponents).evaluate(field).unwrap()));

    assert!(backend.s_unit_dlog(&C, &units, &field.from_int(3)).is_none());
}
