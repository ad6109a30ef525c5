use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::backend::*;
use crate::cyclotomic::*;
use crate::error::*;
use crate::field::NumberField;
use crate::group::*;
use crate::kummer::KummerExtension;
use crate::primes::*;

use super::decompose::PieceInit;
use super::ClassFieldContext;

///
/// The map `h: Gal(L/C) -> Z/eZ` from the Galois group of a Kummer extension `L/C` to the
/// cyclic piece, which maps the Frobenius at a degree-one prime `P` to the class of `N(P)`.
///
#[derive(Clone, Debug)]
pub struct ArtinMap {
    hom: AbGroupHom,
    largest_prime: i64
}

impl ArtinMap {

    pub fn hom(&self) -> &AbGroupHom {
        &self.hom
    }

    ///
    /// The largest rational prime used to build the map; verification continues above it.
    ///
    pub fn largest_prime(&self) -> i64 {
        self.largest_prime
    }
}

///
/// A Kummer generator `prod g_i^(w_i)` of the piece over `C`, where `g_i` are the generators
/// of the Kummer extension. The piece is (after adjoining `zeta_e`) obtained by adjoining an
/// `o`-th root of this element, and `c = e/o` is the defect.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KummerGenerator {
    pub exponents: Vec<i64>,
    pub order: i64,
    pub defect: i64
}

impl KummerGenerator {

    pub fn is_trivial(&self) -> bool {
        self.order == 1
    }
}

pub struct ArtinMapBuilder<'a, B, M>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    ctx: &'a ClassFieldContext<B>,
    rcg: &'a M,
    cyclotomic: &'a CyclotomicExtension<B::BaseField>,
    kummer: &'a KummerExtension<B::BaseField>,
    piece: &'a PieceInit,
    policy: PrimeSearchPolicy
}

impl<'a, B, M> ArtinMapBuilder<'a, B, M>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    ///
    /// Creates the builder; `support_primes` are the rational primes below the support of the
    /// Kummer generators, which are never sampled.
    ///
    pub fn new(ctx: &'a ClassFieldContext<B>, rcg: &'a M, cyclotomic: &'a CyclotomicExtension<B::BaseField>, kummer: &'a KummerExtension<B::BaseField>, piece: &'a PieceInit, support_primes: &BTreeSet<i64>) -> Self {
        assert_eq!(piece.degree, kummer.degree());
        let cofactor = piece.rational_primes.union(support_primes).copied().collect::<Vec<_>>();
        let policy = PrimeSearchPolicy::new(cofactor, ctx.base_field().ring_index());
        Self { ctx, rcg, cyclotomic, kummer, piece, policy }
    }

    fn evaluate_prime(&self, prime: &<B::BaseField as NumberField>::Ideal) -> PrimeEval<(GroupEl, GroupEl)> {
        let cyclotomic_prime = self.cyclotomic.degree_one_prime(prime)?;
        let frobenius = self.kummer.frobenius(self.cyclotomic, &cyclotomic_prime)?;
        let class = self.piece.quotient.apply(&self.rcg.preimage(prime)?);
        return Ok((frobenius, class));
    }

    ///
    /// Returns the pairs `(Frob_P, class of p)` for all degree-one primes `p` of `k` above `ell`.
    ///
    fn sample(&self, ell: i64) -> Vec<(GroupEl, GroupEl)> {
        let base = self.ctx.base_field();
        base.prime_decomposition(ell).into_iter()
            .filter(|(prime, _)| base.ideal_norm(prime) == ell)
            .filter_map(|(prime, _)| match self.evaluate_prime(&prime) {
                Ok(pair) => Some(pair),
                Err(bad_prime) => {
                    trace!("discarding {:?}: {}", prime, bad_prime);
                    None
                }
            })
            .collect()
    }

    fn search(&self, above: i64, context: &'static str) -> PrimeSearch {
        PrimeSearch::new(PrimeIter::congruent_to_one(self.piece.degree as i64).above(above), self.policy.clone(), self.ctx.config().prime_search_limit, context)
    }

    ///
    /// Samples primes until their Frobenius elements generate `Gal(L/C)`, and interpolates the
    /// Artin map from them. Fails with [`ClassFieldError::InsufficientKummerGenerators`] if the
    /// samples are inconsistent, or if the image of the map is smaller than the image of the
    /// norms from `C`, since then `L` does not contain the piece.
    ///
    #[instrument(skip_all)]
    pub fn build(&self) -> Result<ArtinMap> {
        let galois_group = self.kummer.group();
        let target = self.piece.quotient.codomain();
        let mut generating_set = GeneratingSet::new(galois_group.clone());
        let mut pairs = Vec::new();
        let mut search = self.search(0, "sampling Frobenius elements for an Artin map");
        let mut largest_prime = 0;
        while !generating_set.is_complete() {
            let ell = search.next_candidate()?;
            for (frobenius, class) in self.sample(ell) {
                if generating_set.offer(&frobenius) {
                    trace!("accepted Frobenius at {} with image {:?}", ell, class.coords());
                }
                pairs.push((frobenius, class));
            }
            largest_prime = ell;
        }
        let hom = AbGroupHom::from_generating_pairs(galois_group, target, &pairs)
            .map_err(|err| ClassFieldError::InsufficientKummerGenerators(err.to_string()))?;

        let expected_image = self.rcg.cyclotomic_norm_subgroup(self.piece.degree).iter().map(|x| self.piece.quotient.apply(x)).collect::<Vec<_>>();
        let image = hom.image();
        let image_matches = expected_image.iter().all(|x| target.contains(&image, x)) && image.iter().all(|x| target.contains(&expected_image, x));
        if !image_matches {
            return Err(ClassFieldError::InsufficientKummerGenerators(format!("image {:?} of the Artin map differs from the norm image {:?}", image, expected_image)));
        }
        debug!("built Artin map from {} samples, primes up to {}", pairs.len(), largest_prime);
        return Ok(ArtinMap { hom, largest_prime });
    }

    ///
    /// Checks the Artin map against `count` further degree-one primes.
    ///
    #[instrument(skip_all)]
    pub fn verify(&self, map: &ArtinMap, count: usize) -> Result<()> {
        let mut search = self.search(map.largest_prime(), "verifying an Artin map");
        let mut checked = 0;
        while checked < count {
            let ell = search.next_candidate()?;
            for (frobenius, class) in self.sample(ell) {
                if map.hom().apply(&frobenius) != class {
                    return Err(ClassFieldError::InsufficientKummerGenerators(format!("the Artin map disagrees with the class of a prime above {}", ell)));
                }
                checked += 1;
            }
        }
        return Ok(());
    }
}

///
/// Computes the Kummer generator of the fixed field of `ker h`. This is the annihilator
/// of `ker h` w.r.t. the standard pairing `(Z/eZ)^r x (Z/eZ)^r -> Z/eZ`, which is cyclic
/// since it is dual to the image of `h`.
///
pub fn extract_generator(map: &ArtinMap) -> KummerGenerator {
    let hom = map.hom();
    let galois_group = hom.domain();
    let target = hom.codomain();
    let e = target.exponent();
    let r = galois_group.rank();
    let image_order = target.order() / target.quotient(&hom.image()).0.order();

    let kernel = hom.kernel();
    let annihilator_generators = if kernel.is_empty() {
        (0..r).map(|i| galois_group.gen(i)).collect::<Vec<_>>()
    } else {
        let pairing_codomain = FinAbGroup::from_invariants(vec![e; kernel.len()]);
        let images = (0..r).map(|i| pairing_codomain.element(kernel.iter().map(|k| k.coords()[i]).collect())).collect();
        AbGroupHom::new(galois_group.clone(), pairing_codomain, images).kernel()
    };
    if annihilator_generators.is_empty() {
        assert_eq!(1, image_order, "Artin map is nonzero, but has a trivial annihilator");
        return KummerGenerator { exponents: vec![0; r], order: 1, defect: e };
    }

    let (annihilator, inclusion) = galois_group.subgroup(&annihilator_generators);
    assert!(annihilator.is_cyclic(), "annihilator {:?} of the kernel is not cyclic", annihilator.invariants());
    let order = annihilator.order();
    assert_eq!(image_order, order, "annihilator of the kernel and image of the Artin map have different orders");
    let defect = e / order;
    let generator = inclusion.apply(&annihilator.gen(0));
    assert!(generator.coords().iter().all(|x| x % defect == 0));
    let exponents = generator.coords().iter().map(|x| x / defect).collect();
    debug!("Kummer generator has order {} and defect {}", order, defect);
    return KummerGenerator { exponents, order, defect };
}

#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use crate::field::factored::FacElem;
#[cfg(test)]
use crate::field::*;
#[cfg(test)]
use super::decompose::decompose;
#[cfg(test)]
use super::ClassFieldConfig;

#[test]
fn test_artin_map_quadratic() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    // the quadratic subfield of Q(zeta_5) is Q(sqrt(5))
    let rcg = RationalRayClassGroup::new(5, false);
    let piece = decompose(&ctx, &rcg, &AbGroupHom::identity(rcg.group().clone())).unwrap().pop().unwrap();
    let cyclotomic = ctx.cyclotomic(2).unwrap();
    let C = cyclotomic.extension();
    let field = C.field();
    let generators = [-1, 2, 5].into_iter().map(|x| FacElem::from_base(field.from_int(x))).collect();
    let kummer = KummerExtension::new(2, generators);
    let builder = ArtinMapBuilder::new(&ctx, &rcg, C, &kummer, &piece, &[2, 5].into_iter().collect());
    let map = builder.build().unwrap();
    builder.verify(&map, 10).unwrap();
    assert_eq!(FinAbGroup::cyclic(2).element(vec![1]), map.hom().apply(&kummer.group().element(vec![0, 0, 1])));
    assert!(map.hom().codomain().is_zero(&map.hom().apply(&kummer.group().element(vec![1, 0, 0]))));

    let generator = extract_generator(&map);
    assert_eq!(vec![0, 0, 1], generator.exponents);
    assert_eq!(2, generator.order);
    assert_eq!(1, generator.defect);
}

#[test]
fn test_artin_map_insufficient() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let rcg = RationalRayClassGroup::new(5, false);
    let piece = decompose(&ctx, &rcg, &AbGroupHom::identity(rcg.group().clone())).unwrap().pop().unwrap();
    let cyclotomic = ctx.cyclotomic(2).unwrap();
    let C = cyclotomic.extension();
    let field = C.field();
    // Q(sqrt(-1), sqrt(2)) does not contain Q(sqrt(5)); the samples at 3 and 7 happen to be
    // consistent, but 11 is not
    let generators = [-1, 2].into_iter().map(|x| FacElem::from_base(field.from_int(x))).collect();
    let kummer = KummerExtension::new(2, generators);
    let builder = ArtinMapBuilder::new(&ctx, &rcg, C, &kummer, &piece, &[2, 5].into_iter().collect());
    let map = builder.build().unwrap();
    assert_eq!(7, map.largest_prime());
    assert!(matches!(builder.verify(&map, 10), Err(ClassFieldError::InsufficientKummerGenerators(_))));
}

#[test]
fn test_extract_trivial_generator() {
    let galois_group = FinAbGroup::from_invariants(vec![4, 4]);
    let target = FinAbGroup::cyclic(4);
    let map = ArtinMap { hom: AbGroupHom::zero(galois_group, target), largest_prime: 0 };
    let generator = extract_generator(&map);
    assert!(generator.is_trivial());
    assert_eq!(4, generator.defect);
    assert_eq!(vec![0, 0], generator.exponents);
}

#[test]
fn test_extract_generator_with_defect() {
    // h(x, y) = 2y, with image of order 2 in Z/4
    let galois_group = FinAbGroup::from_invariants(vec![4, 4]);
    let target = FinAbGroup::cyclic(4);
    let hom = AbGroupHom::new(galois_group, target.clone(), vec![target.zero(), target.element(vec![2])]);
    let generator = extract_generator(&ArtinMap { hom, largest_prime: 0 });
    assert_eq!(2, generator.order);
    assert_eq!(2, generator.defect);
    assert_eq!(vec![0, 1], generator.exponents);
}
