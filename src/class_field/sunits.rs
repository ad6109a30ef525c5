use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::backend::*;
use crate::cache::*;
use crate::cyclotomic::*;
use crate::error::*;
use crate::field::factored::FacElem;
use crate::field::NumberField;
use crate::group::*;
use crate::kummer::KummerExtension;
use crate::primes::*;

use super::decompose::*;
use super::ClassFieldContext;

///
/// A piece together with the S-units of `C = k(zeta_e)` from which its Kummer generator is
/// built.
///
pub struct SUnitsComputed<B: ClassFieldBackend> {
    pub init: PieceInit,
    pub cyclotomic: Arc<CyclotomicCacheEntry<B::BaseField, B::Prime>>,
    pub entry: Arc<KummerCacheEntry<B::BaseField, B::Prime>>
}

fn kummer_extension<K: NumberField>(units: &SUnitGroup<K>, e: u64) -> KummerExtension<K> {
    KummerExtension::new(e, units.basis().iter().cloned().map(FacElem::from_base).collect())
}

fn primes_above<B: ClassFieldBackend>(ctx: &ClassFieldContext<B>, cyclotomic: &CyclotomicExtension<B::BaseField>, rational_primes: &BTreeSet<i64>) -> Result<Vec<B::Prime>> {
    let mut result = Vec::new();
    for p in rational_primes {
        result.extend(ctx.backend().cyclotomic_primes_above(cyclotomic, *p)?);
    }
    return Ok(result);
}

///
/// Adds primes to `support` until their classes generate `Cl(C)/eCl(C)`. Accepting a prime
/// adds all primes above the same rational prime, so that the support stays Galois-stable.
///
fn complete_class_group_generators<B: ClassFieldBackend>(ctx: &ClassFieldContext<B>, cyclotomic: &CyclotomicExtension<B::BaseField>, e: u64, rational_primes: &mut BTreeSet<i64>, support: &mut Vec<B::Prime>) -> Result<()> {
    let backend = ctx.backend();
    let class_group = backend.cyclotomic_class_group(cyclotomic)?;
    let e_multiples = (0..class_group.rank()).map(|i| class_group.scale(&class_group.gen(i), e as i64)).collect::<Vec<_>>();
    let (class_group_mod_e, projection) = class_group.quotient(&e_multiples);
    if class_group_mod_e.is_trivial() {
        return Ok(());
    }
    let mut initial = Vec::with_capacity(support.len());
    for prime in support.iter() {
        initial.push(projection.apply(&backend.cyclotomic_class_of(cyclotomic, prime)?));
    }
    let mut generating_set = GeneratingSet::with_initial(class_group_mod_e, &initial);
    let policy = PrimeSearchPolicy::new(rational_primes.iter().copied(), ctx.base_field().ring_index());
    let mut search = PrimeSearch::new(PrimeIter::all(), policy, ctx.config().prime_search_limit, "collecting generators of the class group modulo e-th powers");
    while !generating_set.is_complete() {
        let ell = search.next_candidate()?;
        let primes = backend.cyclotomic_primes_above(cyclotomic, ell)?;
        let mut accepted = false;
        for prime in &primes {
            accepted |= generating_set.offer(&projection.apply(&backend.cyclotomic_class_of(cyclotomic, prime)?));
        }
        if accepted {
            trace!("adding the primes above {} to S", ell);
            support.extend(primes);
            rational_primes.insert(ell);
        }
    }
    return Ok(());
}

#[instrument(skip_all)]
fn direct_s_units<B: ClassFieldBackend>(ctx: &ClassFieldContext<B>, cyclotomic: &CyclotomicCacheEntry<B::BaseField, B::Prime>, init: &PieceInit) -> Result<Arc<KummerCacheEntry<B::BaseField, B::Prime>>> {
    let C = cyclotomic.extension();
    let mut rational_primes = init.rational_primes.clone();
    let mut support = primes_above(ctx, C, &rational_primes)?;
    complete_class_group_generators(ctx, C, init.degree, &mut rational_primes, &mut support)?;
    let s_units = ctx.backend().s_unit_group(C, &support)?;
    debug!("computed S-units of {:?} with |S| = {}", C, s_units.support_size());
    let kummer = kummer_extension(&s_units, init.degree);
    return Ok(cyclotomic.insert(KummerCacheEntry { rational_primes, support, s_units, kummer }));
}

///
/// Finds S-units whose Kummer extension contains the piece, reusing cached ones if possible.
/// `S` consists of the primes above the rational primes of the piece, enlarged until it
/// generates the class group of `C` modulo `e`-th powers.
///
#[instrument(skip_all)]
pub fn compute_s_units<B: ClassFieldBackend>(ctx: &ClassFieldContext<B>, init: PieceInit) -> Result<SUnitsComputed<B>> {
    let cyclotomic = ctx.cyclotomic(init.degree)?;
    if let Some(entry) = cyclotomic.lookup(&init.rational_primes) {
        debug!("reusing cached S-units for primes {:?}", entry.rational_primes);
        return Ok(SUnitsComputed { init, cyclotomic, entry });
    }
    let entry = direct_s_units(ctx, &cyclotomic, &init)?;
    return Ok(SUnitsComputed { init, cyclotomic, entry });
}

#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use super::ClassFieldConfig;

#[test]
fn test_direct_s_units() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let rcg = RationalRayClassGroup::new(5, false);
    let init = decompose(&ctx, &rcg, &AbGroupHom::identity(rcg.group().clone())).unwrap().pop().unwrap();
    let computed = compute_s_units(&ctx, init.clone()).unwrap();
    assert_eq!(init.rational_primes, computed.entry.rational_primes);
    // -1, 2 and 5
    assert_eq!(3, computed.entry.s_units.rank());
    assert_eq!(2, computed.entry.kummer.degree());

    let again = compute_s_units(&ctx, init).unwrap();
    assert!(Arc::ptr_eq(&computed.entry, &again.entry));
    assert_eq!(1, computed.cyclotomic.len());
}

#[test]
fn test_s_units_non_cyclic_galois_group() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    // the piece of degree 8 of (Z/17Z)* needs Q(zeta_8), whose Galois group is not cyclic
    let rcg = RationalRayClassGroup::new(17, true);
    let (quotient, projection) = rcg.group().quotient(&[rcg.group().scale(&rcg.group().gen(0), 8)]);
    assert_eq!(8, quotient.order());
    let init = decompose(&ctx, &rcg, &projection).unwrap().pop().unwrap();
    let computed = compute_s_units(&ctx, init).unwrap();
    assert_eq!(8, computed.entry.kummer.degree());
    // zeta_8, 1 + sqrt(2), 1 - zeta_8 and the four primes above 17
    assert_eq!(7, computed.entry.s_units.rank());
}
