use std::collections::BTreeSet;

use feanor_math::algorithms::int_factor::factor;
use tracing::{debug, instrument};

use crate::backend::*;
use crate::error::*;
use crate::field::NumberField;
use crate::group::*;
use crate::ZZi64;

use super::ClassFieldContext;

///
/// The input of the computation of one cyclic piece of prime-power degree `e = p^k` of
/// a class field.
///
#[derive(Clone, Debug)]
pub struct PieceInit {
    pub index: usize,
    pub prime: i64,
    pub degree: u64,
    ///
    /// The projection from the ray class group onto `Z/eZ`.
    ///
    pub quotient: AbGroupHom,
    ///
    /// The element of order `e` of the target group of the descriptor whose cyclic subgroup
    /// corresponds to this piece.
    ///
    pub target_generator: GroupEl,
    ///
    /// The rational primes below the primes that may ramify in the Kummer extension.
    ///
    pub rational_primes: BTreeSet<i64>
}

///
/// Splits the quotient `rcg -> Q` into its cyclic prime-power pieces. For every invariant
/// `d_i` of `Q` and every prime power `p^k || d_i`, the piece is the quotient of `Q` by the
/// subgroup generated by the other generators and `p^k * gen_i`.
///
#[instrument(skip_all)]
pub fn decompose<B, M>(ctx: &ClassFieldContext<B>, rcg: &M, quotient: &AbGroupHom) -> Result<Vec<PieceInit>>
    where B: ClassFieldBackend,
        M: ?Sized + RayClassGroupMap<B::BaseField>
{
    let base = ctx.base_field();
    let target = quotient.codomain();
    let modulus_primes: BTreeSet<i64> = rcg.modulus().finite_primes().map(|prime| base.ideal_minimum(prime)).collect();
    let mut result = Vec::new();
    for (i, d) in target.invariants().iter().enumerate() {
        let mut prime_powers = factor(ZZi64, *d);
        prime_powers.sort();
        for (p, k) in prime_powers {
            let e = p.pow(k as u32);
            let mut complement = (0..target.rank()).filter(|j| *j != i).map(|j| target.gen(j)).collect::<Vec<_>>();
            complement.push(target.scale(&target.gen(i), e));
            let (piece_group, projection) = target.quotient(&complement);
            assert_eq!(&[e][..], piece_group.invariants());

            let mut rational_primes = modulus_primes.clone();
            rational_primes.insert(p);
            let init = PieceInit {
                index: result.len(),
                prime: p,
                degree: e as u64,
                quotient: quotient.then(&projection),
                target_generator: target.scale(&target.gen(i), d / e),
                rational_primes
            };
            debug!("piece {} has degree {} and primes {:?}", init.index, e, init.rational_primes);
            result.push(init);
        }
    }
    return Ok(result);
}

#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use super::ClassFieldConfig;

#[test]
fn test_decompose() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    // (Z/21Z)* = Z/2 x Z/6 has pieces of degree 2, 2 and 3
    let rcg = RationalRayClassGroup::new(21, true);
    let quotient = AbGroupHom::identity(rcg.group().clone());
    let pieces = decompose(&ctx, &rcg, &quotient).unwrap();
    assert_eq!(vec![2, 2, 3], pieces.iter().map(|piece| piece.degree).collect::<Vec<_>>());
    for piece in &pieces {
        assert!(piece.quotient.is_surjective());
        assert_eq!(piece.degree as i64, rcg.group().order_of(&piece.target_generator));
        assert!(piece.rational_primes.contains(&3) && piece.rational_primes.contains(&7));
        assert!(piece.rational_primes.contains(&piece.prime));
    }
    let total: i64 = pieces.iter().map(|piece| piece.degree as i64).product();
    assert_eq!(rcg.group().order(), total);
}

#[test]
fn test_decompose_trivial() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let rcg = RationalRayClassGroup::new(5, true);
    let quotient = AbGroupHom::zero(rcg.group().clone(), FinAbGroup::trivial());
    assert!(decompose(&ctx, &rcg, &quotient).unwrap().is_empty());
}
