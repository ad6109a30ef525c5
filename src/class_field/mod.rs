use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use feanor_math::algorithms::int_factor::factor;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::backend::*;
use crate::cache::*;
use crate::cyclotomic::euler_phi;
use crate::error::*;
use crate::field::NumberField;
use crate::group::*;
use crate::primes::*;
use crate::ZZi64;

use compose::NonSimpleExtension;
use decompose::{decompose, PieceInit};
use stages::ClassFieldPrimePower;

pub mod config;
pub mod decompose;
pub mod sunits;
pub mod artin;
pub mod reduce;
pub mod radical;
pub mod descent;
pub mod stages;
pub mod compose;

pub use config::ClassFieldConfig;

///
/// Everything a class field computation needs besides its input: the backend providing the
/// arithmetic of cyclotomic extensions, the cache of S-unit computations and the configuration.
///
pub struct ClassFieldContext<B: ClassFieldBackend> {
    backend: B,
    cache: CyclotomicCache<B::BaseField, B::Prime>,
    config: ClassFieldConfig
}

impl<B: ClassFieldBackend> ClassFieldContext<B> {

    pub fn new(backend: B, config: ClassFieldConfig) -> Self {
        Self { backend, cache: CyclotomicCache::new(), config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn base_field(&self) -> &B::BaseField {
        self.backend.base_field()
    }

    pub fn cache(&self) -> &CyclotomicCache<B::BaseField, B::Prime> {
        &self.cache
    }

    pub fn config(&self) -> &ClassFieldConfig {
        &self.config
    }

    pub fn cyclotomic(&self, e: u64) -> Result<Arc<CyclotomicCacheEntry<B::BaseField, B::Prime>>> {
        self.cache.cyclotomic(e, || self.backend.cyclotomic_extension(e))
    }
}

///
/// An abelian extension of `k`, given by a surjection `rcg -> Q` from a ray class group.
/// The class field is the fixed field of the kernel, so its Galois group is `Q`.
///
pub struct ClassFieldDescriptor<K, M>
    where K: NumberField,
        M: ?Sized + RayClassGroupMap<K>
{
    rcg: Arc<M>,
    quotient: AbGroupHom,
    number_field: Mutex<Option<Arc<NonSimpleExtension<K>>>>
}

impl<K, M> ClassFieldDescriptor<K, M>
    where K: NumberField,
        M: ?Sized + RayClassGroupMap<K>
{
    pub fn new(rcg: Arc<M>, quotient: AbGroupHom) -> Self {
        assert_eq!(rcg.group(), quotient.domain());
        assert!(quotient.is_surjective());
        Self { rcg, quotient, number_field: Mutex::new(None) }
    }

    pub fn ray_class_group(&self) -> &M {
        &*self.rcg
    }

    pub fn quotient(&self) -> &AbGroupHom {
        &self.quotient
    }

    pub fn degree(&self) -> i64 {
        self.quotient.codomain().order()
    }

    pub fn prime_power_pieces<B>(&self, ctx: &ClassFieldContext<B>) -> Result<Vec<PieceInit>>
        where B: ClassFieldBackend<BaseField = K>
    {
        decompose(ctx, &*self.rcg, &self.quotient)
    }

    ///
    /// Computes the class field as compositum of its cyclic prime-power pieces. The result is
    /// cached, and only recomputed if `redo` is set.
    ///
    #[instrument(skip_all)]
    pub fn number_field<B>(&self, ctx: &ClassFieldContext<B>, redo: bool) -> Result<Arc<NonSimpleExtension<K>>>
        where B: ClassFieldBackend<BaseField = K>
    {
        if !redo {
            if let Some(result) = &*self.number_field.lock().unwrap_or_else(|e| e.into_inner()) {
                return Ok(result.clone());
            }
        }
        let pieces = self.prime_power_pieces(ctx)?;
        info!("computing class field of degree {} from {} pieces", self.degree(), pieces.len());
        let rcg = &*self.rcg;
        let fields = if ctx.config().parallel_pieces {
            pieces.into_par_iter().map(|init| ClassFieldPrimePower::<B>::new(init).run(ctx, rcg)).collect::<Result<Vec<_>>>()?
        } else {
            pieces.into_iter().map(|init| ClassFieldPrimePower::<B>::new(init).run(ctx, rcg)).collect::<Result<Vec<_>>>()?
        };
        let result = Arc::new(NonSimpleExtension::new(ctx.base_field().clone(), fields));
        assert_eq!(self.degree() as u64, result.degree(), "class field has wrong degree");
        *self.number_field.lock().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());
        return Ok(result);
    }
}

///
/// The ray class field of the modulus of `rcg`, or its maximal subfield of exponent `n`.
///
pub fn ray_class_field<K, M>(rcg: Arc<M>, n: Option<u64>) -> ClassFieldDescriptor<K, M>
    where K: NumberField,
        M: ?Sized + RayClassGroupMap<K>
{
    let group = rcg.group().clone();
    let quotient = match n {
        Some(n) => group.quotient(&(0..group.rank()).map(|i| group.scale(&group.gen(i), n as i64)).collect::<Vec<_>>()).1,
        None => AbGroupHom::identity(group)
    };
    return ClassFieldDescriptor::new(rcg, quotient);
}

///
/// The Hilbert class field, i.e. the ray class field of the trivial modulus.
///
pub fn hilbert_class_field<K, M>(class_group: Arc<M>) -> ClassFieldDescriptor<K, M>
    where K: NumberField,
        M: ?Sized + RayClassGroupMap<K>
{
    assert!(class_group.modulus().is_trivial(), "the Hilbert class field requires the class group, not a ray class group");
    ray_class_field(class_group, None)
}

///
/// The multiplicative closure of `generators` in `(Z/fZ)*`.
///
fn generated_residues(f: i64, generators: &[i64]) -> BTreeSet<i64> {
    let mut result = BTreeSet::from([1 % f]);
    let mut queue = vec![1 % f];
    while let Some(x) = queue.pop() {
        for g in generators {
            let y = (x * g).rem_euclid(f);
            if result.insert(y) {
                queue.push(y);
            }
        }
    }
    return result;
}

///
/// The ring class field of the order of conductor `f`. Its Galois group is the quotient of the
/// ray class group modulo `f` by the classes of the ideals `l O_k` for rational `l` coprime to `f`.
/// These are generated by the classes of finitely many `l`, whose residues generate `(Z/fZ)*`.
///
#[instrument(skip_all)]
pub fn ring_class_field<B, M>(ctx: &ClassFieldContext<B>, rcg: Arc<M>, f: i64) -> Result<ClassFieldDescriptor<B::BaseField, M>>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    assert!(f >= 1);
    let base = ctx.base_field();
    let group = rcg.group().clone();
    let f_factorization = if f == 1 { Vec::new() } else { factor(ZZi64, f) };
    let unit_group_order = euler_phi(&f_factorization);
    let cofactor = f_factorization.iter().map(|(p, _)| *p).chain(rcg.modulus().finite_primes().map(|prime| base.ideal_minimum(prime))).collect::<Vec<_>>();
    let mut search = PrimeSearch::new(PrimeIter::all(), PrimeSearchPolicy::new(cofactor, base.ring_index()), ctx.config().prime_search_limit, "generating the rational classes of a ring class group");

    let mut residues = Vec::new();
    let mut rational_classes = Vec::new();
    while (generated_residues(f, &residues).len() as i64) < unit_group_order {
        let ell = search.next_candidate()?;
        let class = base.prime_decomposition(ell).into_iter()
            .map(|(prime, ramification)| rcg.preimage(&prime).map(|x| group.scale(&x, ramification as i64)))
            .collect::<PrimeEval<Vec<_>>>();
        match class {
            Ok(class) => {
                rational_classes.push(group.sum(class));
                residues.push(ell.rem_euclid(f));
            },
            Err(bad_prime) => debug!("skipping {}: {}", ell, bad_prime)
        }
    }
    let (_, quotient) = group.quotient(&rational_classes);
    debug!("ring class group of conductor {} has order {}", f, quotient.codomain().order());
    return Ok(ClassFieldDescriptor::new(rcg, quotient));
}

#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use crate::field::*;
#[cfg(test)]
use crate::field::rational::RationalField;

#[cfg(test)]
fn rational_context() -> ClassFieldContext<RationalBackend> {
    ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default())
}

///
/// Checks that the residue degree of small primes in the class field is the order of their
/// class in the Galois group `Q` of the descriptor.
///
#[cfg(test)]
fn assert_frobenius_orders(field: &NonSimpleExtension<RationalField>, descriptor: &ClassFieldDescriptor<RationalField, RationalRayClassGroup>) {
    let mut checked = 0;
    for ell in PrimeIter::all().take(40) {
        let Some(class) = descriptor.ray_class_group().class_of_residue(ell) else { continue };
        if let Ok(order) = field.frobenius_order(&ell) {
            let galois_element = descriptor.quotient().apply(class);
            assert_eq!(descriptor.quotient().codomain().order_of(&galois_element) as u64, order, "wrong Frobenius order at {}", ell);
            checked += 1;
        }
    }
    assert!(checked >= 15);
}

#[test]
fn test_quadratic_without_infinity() {
    let ctx = rational_context();
    let rcg = Arc::new(RationalRayClassGroup::new(5, false));
    let descriptor = ray_class_field(rcg.clone(), None);
    assert_eq!(2, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    let QQ = RationalField;
    assert_eq!(vec![vec![QQ.from_int(-5), QQ.zero(), QQ.one()]], field.defining_polynomials());
    assert!(Arc::ptr_eq(&field, &descriptor.number_field(&ctx, false).unwrap()));
    assert!(!Arc::ptr_eq(&field, &descriptor.number_field(&ctx, true).unwrap()));
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_cyclic_quartic() {
    crate::init_test_logging();
    let ctx = rational_context();
    // Q(zeta_5)
    let rcg = Arc::new(RationalRayClassGroup::new(5, true));
    let descriptor = ray_class_field(rcg.clone(), None);
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(1, field.pieces().len());
    assert_eq!(4, field.degree());
    assert_eq!(5, field.defining_polynomials()[0].len());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_two_quadratic_pieces() {
    let ctx = rational_context();
    // Q(zeta_8) = Q(i, sqrt(2))
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(8, true)), None);
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(2, field.pieces().len());
    assert!(field.pieces().iter().all(|piece| piece.degree == 2));
    assert_eq!(4, field.degree());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_coprime_pieces() {
    crate::init_test_logging();
    let ctx = rational_context();
    // Q(zeta_7) = Q(sqrt(-7)) Q(zeta_7)^+
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(7, true)), None);
    let field = descriptor.number_field(&ctx, false).unwrap();
    let QQ = RationalField;
    assert_eq!(vec![2, 3], field.pieces().iter().map(|piece| piece.degree).collect::<Vec<_>>());
    assert_eq!(vec![QQ.from_int(7), QQ.zero(), QQ.one()], field.pieces()[0].polynomial);
    assert_eq!(6, field.degree());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_parallel_pieces() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig { parallel_pieces: true, ..ClassFieldConfig::default() });
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(7, true)), None);
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(6, field.degree());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_exponent_bound() {
    let ctx = rational_context();
    let QQ = RationalField;
    // the maximal subfield of exponent 2 of Q(zeta_7) is Q(sqrt(-7))
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(7, true)), Some(2));
    assert_eq!(2, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(1, field.pieces().len());
    assert_eq!(vec![vec![QQ.from_int(7), QQ.zero(), QQ.one()]], field.defining_polynomials());
    assert_frobenius_orders(&field, &descriptor);

    // the maximal subfield of exponent 2 of Q(zeta_5) is Q(sqrt(5))
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(5, true)), Some(2));
    assert_eq!(2, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(vec![vec![QQ.from_int(-5), QQ.zero(), QQ.one()]], field.defining_polynomials());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_quartic_subfield() {
    let ctx = rational_context();
    // the quartic subfield of Q(zeta_13)
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(13, true)), Some(4));
    assert_eq!(4, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(1, field.pieces().len());
    assert_eq!(4, field.degree());
    assert_eq!(5, field.defining_polynomials()[0].len());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_ray_class_field_11() {
    let ctx = rational_context();
    // Q(zeta_11), with pieces Q(sqrt(-11)) and the quintic subfield
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(11, true)), None);
    assert_eq!(10, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(vec![2, 5], field.pieces().iter().map(|piece| piece.degree).collect::<Vec<_>>());
    assert_eq!(10, field.degree());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_ray_class_field_17() {
    let ctx = rational_context();
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(17, true)), Some(8));
    assert_eq!(8, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(8, field.degree());
    assert_eq!(9, field.defining_polynomials()[0].len());
    assert_frobenius_orders(&field, &descriptor);

    // Q(zeta_17)
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(17, true)), None);
    assert_eq!(16, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    assert_eq!(1, field.pieces().len());
    assert_eq!(16, field.degree());
    assert_frobenius_orders(&field, &descriptor);
}

#[test]
fn test_number_field_after_poisoned_lock() {
    let ctx = rational_context();
    let descriptor = ray_class_field(Arc::new(RationalRayClassGroup::new(5, false)), None);
    let field = descriptor.number_field(&ctx, false).unwrap();
    let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = descriptor.number_field.lock().unwrap();
        panic!("poisoning the cached number field");
    }));
    assert!(poisoned.is_err());
    assert!(descriptor.number_field.is_poisoned());
    assert!(Arc::ptr_eq(&field, &descriptor.number_field(&ctx, false).unwrap()));
    assert_eq!(2, descriptor.number_field(&ctx, true).unwrap().degree());
}

#[test]
fn test_hilbert_class_field() {
    let ctx = rational_context();
    let descriptor = hilbert_class_field(Arc::new(RationalRayClassGroup::class_group()));
    assert_eq!(1, descriptor.degree());
    let field = descriptor.number_field(&ctx, false).unwrap();
    let QQ = RationalField;
    assert_eq!(1, field.degree());
    assert_eq!(vec![vec![QQ.from_int(-1), QQ.one()]], field.defining_polynomials());
}

#[test]
#[should_panic]
fn test_hilbert_class_field_nontrivial_modulus() {
    hilbert_class_field::<RationalField, _>(Arc::new(RationalRayClassGroup::new(5, true)));
}

#[test]
fn test_ring_class_field() {
    let ctx = rational_context();
    // all classes of the ray class group of Q are rational, so the ring class field is Q
    let descriptor = ring_class_field(&ctx, Arc::new(RationalRayClassGroup::new(15, true)), 15).unwrap();
    assert_eq!(1, descriptor.degree());
    assert_eq!(1, descriptor.number_field(&ctx, false).unwrap().degree());
}

#[test]
fn test_generated_residues() {
    assert_eq!(BTreeSet::from([1, 2, 4]), generated_residues(7, &[2]));
    assert_eq!(4, generated_residues(5, &[2]).len());
    assert_eq!(BTreeSet::from([0]), generated_residues(1, &[]));
}

#[test]
#[ignore]
fn time_ray_class_field_17() {
    use tracing_subscriber::prelude::*;
    let (chrome_layer, _guard) = tracing_chrome::ChromeLayerBuilder::new().build();
    tracing_subscriber::registry().with(chrome_layer).init();

    let ctx = rational_context();
    let rcg = Arc::new(RationalRayClassGroup::new(17, true));
    let field = ray_class_field(rcg, None).number_field(&ctx, false).unwrap();
    assert_eq!(16, field.degree());
    crate::profiling::print_all_timings();
}
