use std::collections::HashMap;

use feanor_math::algorithms::int_factor::factor;

use crate::backend::*;
use crate::error::*;
use crate::field::rational::RationalField;
use crate::group::*;
use crate::primes::PrimeIter;
use crate::ZZi64;

///
/// The generators of `(Z/q^kZ)*` together with their orders.
///
fn local_generators(q: i64, k: usize) -> Vec<(i64, i64)> {
    let n = q.pow(k as u32);
    if q == 2 {
        return match k {
            1 => Vec::new(),
            2 => vec![(n - 1, 2)],
            _ => vec![(n - 1, 2), (5, n / 4)]
        };
    }
    let phi = (q - 1) * n / q;
    let generator = (2..n).find(|g| residue_order(*g, n) == phi).unwrap();
    return vec![(generator, phi)];
}

fn residue_order(x: i64, n: i64) -> i64 {
    let mut current = x.rem_euclid(n);
    let mut result = 1;
    while current != 1 {
        if current == 0 || result > n {
            return 0;
        }
        current = (current * x).rem_euclid(n);
        result += 1;
    }
    return result;
}

///
/// Finds exponents `a_i` with `x = prod g_i^(a_i) mod n`.
///
fn local_dlog(x: i64, n: i64, generators: &[(i64, i64)]) -> Vec<i64> {
    let x = x.rem_euclid(n);
    let count: i64 = generators.iter().map(|(_, order)| order).product();
    for index in 0..count {
        let mut rest = index;
        let mut value = 1 % n;
        let mut exponents = Vec::with_capacity(generators.len());
        for (g, order) in generators {
            let a = rest % order;
            rest /= order;
            for _ in 0..a {
                value = (value * g).rem_euclid(n);
            }
            exponents.push(a);
        }
        if value == x {
            return exponents;
        }
    }
    unreachable!("{} is not a unit modulo {}", x, n)
}

///
/// The ray class group of `Q` modulo `m` or `m * oo`, i.e. `(Z/mZ)*/{1, -1}` resp. `(Z/mZ)*`.
/// Ideals of `Z` are represented by their positive generator.
///
pub struct RationalRayClassGroup {
    m: i64,
    modulus: Modulus<i64>,
    group: FinAbGroup,
    classes: HashMap<i64, GroupEl>
}

impl RationalRayClassGroup {

    pub fn new(m: i64, with_infinity: bool) -> Self {
        assert!(m >= 1);
        let factorization: Vec<(i64, usize)> = if m == 1 { Vec::new() } else { factor(ZZi64, m) };
        let local_factors = factorization.iter().map(|(q, k)| (q.pow(*k as u32), local_generators(*q, *k))).collect::<Vec<_>>();
        let global_dlog = |x: i64| local_factors.iter().flat_map(|(n, generators)| local_dlog(x, *n, generators)).collect::<Vec<_>>();

        let generator_orders = local_factors.iter().flat_map(|(_, generators)| generators.iter().map(|(_, order)| *order)).collect::<Vec<_>>();
        let generator_count = generator_orders.len();
        let mut relations = (0..generator_count).map(|i| (0..generator_count).map(|j| if i == j { generator_orders[i] } else { 0 }).collect()).collect::<Vec<Vec<i64>>>();
        if !with_infinity && generator_count > 0 {
            relations.push(global_dlog(-1));
        }
        let exponent = generator_orders.iter().fold(1, |current, order| lcm(current, *order));
        let (group, presentation) = FinAbGroup::from_relations_mod(generator_count, &relations, exponent);
        let classes = (0..m).filter(|x| gcd(*x, m) == 1).map(|x| (x, presentation.evaluate_word(&group, &global_dlog(x)))).collect();

        let modulus = Modulus {
            finite: factorization,
            real_places: if with_infinity { vec![0] } else { Vec::new() }
        };
        return Self { m, modulus, group, classes };
    }

    ///
    /// The class group of `Q`, which is trivial.
    ///
    pub fn class_group() -> Self {
        Self::new(1, false)
    }

    pub fn finite_modulus(&self) -> i64 {
        self.m
    }

    pub fn class_of_residue(&self, x: i64) -> Option<&GroupEl> {
        self.classes.get(&x.rem_euclid(self.m))
    }
}

impl RayClassGroupMap<RationalField> for RationalRayClassGroup {

    fn group(&self) -> &FinAbGroup {
        &self.group
    }

    fn modulus(&self) -> &Modulus<i64> {
        &self.modulus
    }

    fn preimage(&self, ideal: &i64) -> PrimeEval<GroupEl> {
        let n = ideal.abs();
        if gcd(n, self.m) != 1 {
            return Err(BadPrime::new(n, BadPrimeReason::DividesModulus));
        }
        Ok(self.classes[&n.rem_euclid(self.m)].clone())
    }

    fn image(&self, class: &GroupEl) -> i64 {
        PrimeIter::all().find(|q| self.m % q != 0 && self.classes[&q.rem_euclid(self.m)] == *class).unwrap()
    }

    fn cyclotomic_norm_subgroup(&self, e: u64) -> Vec<GroupEl> {
        let g = gcd(self.m, e as i64);
        let mut result = self.classes.iter().filter(|(x, _)| (*x - 1) % g == 0).map(|(_, class)| class.clone()).collect::<Vec<_>>();
        result.sort();
        result.dedup();
        return result;
    }
}

#[test]
fn test_ray_class_group_structure() {
    assert_eq!(&[4][..], RationalRayClassGroup::new(5, true).group().invariants());
    assert_eq!(&[2][..], RationalRayClassGroup::new(5, false).group().invariants());
    assert_eq!(&[2, 2][..], RationalRayClassGroup::new(8, true).group().invariants());
    assert_eq!(&[2][..], RationalRayClassGroup::new(8, false).group().invariants());
    assert_eq!(&[2, 6][..], RationalRayClassGroup::new(21, true).group().invariants());
    assert_eq!(&[2, 4][..], RationalRayClassGroup::new(16, true).group().invariants());
    assert!(RationalRayClassGroup::class_group().group().is_trivial());
}

#[test]
fn test_ray_class_group_map() {
    let rcg = RationalRayClassGroup::new(7, true);
    let group = rcg.group();
    assert_eq!(BadPrimeReason::DividesModulus, rcg.preimage(&7).unwrap_err().reason);
    // 3 is a primitive root modulo 7
    let generator = rcg.preimage(&3).unwrap();
    assert_eq!(6, group.order_of(&generator));
    assert_eq!(rcg.preimage(&2).unwrap(), group.scale(&generator, 2));
    assert_eq!(rcg.preimage(&29).unwrap(), group.zero());
    for x in group.elements() {
        let prime = rcg.image(&x);
        assert_eq!(x, rcg.preimage(&prime).unwrap());
    }
    assert_eq!(3, rcg.image(&generator));
    assert_eq!(2, rcg.image(&group.scale(&generator, 2)));
}

#[test]
fn test_cyclotomic_norm_subgroup() {
    // norms from Q(i) are the classes of 1 mod 4
    let rcg = RationalRayClassGroup::new(20, true);
    let norms = rcg.cyclotomic_norm_subgroup(4);
    let (quotient, _) = rcg.group().quotient(&norms);
    assert_eq!(2, quotient.order());
    // without the infinite place, -1 is trivial, so all classes are norms
    let rcg = RationalRayClassGroup::new(20, false);
    let (quotient, _) = rcg.group().quotient(&rcg.cyclotomic_norm_subgroup(4));
    assert!(quotient.is_trivial());
    let rcg = RationalRayClassGroup::new(5, true);
    let (quotient, _) = rcg.group().quotient(&rcg.cyclotomic_norm_subgroup(4));
    assert!(quotient.is_trivial());
}
