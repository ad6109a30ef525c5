use std::collections::HashMap;
use std::fmt::Debug;

use feanor_math::algorithms::discrete_log::multiplicative_order;
use feanor_math::algorithms::int_factor::factor;
use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::ring::*;
use feanor_math::rings::poly::dense_poly;
use feanor_math::rings::poly::PolyRingStore;
use feanor_math::rings::zn::zn_64::*;
use feanor_math::rings::zn::*;

use crate::error::*;
use crate::field::extension::SimpleExtension;
use crate::field::poly::DensePolyRing;
use crate::field::residue::PrimeField;
use crate::field::*;
use crate::field::El;
use crate::group::*;
use crate::ZZi64;

pub fn euler_phi(factorization: &[(i64, usize)]) -> i64 {
    factorization.iter().map(|(p, e)| (p - 1) * p.pow(*e as u32 - 1)).product()
}

///
/// Computes the `n`-th cyclotomic polynomial over `Z`, starting with the constant coefficient.
///
pub fn cyclotomic_polynomial(n: u64) -> Vec<i64> {
    assert!(n >= 1);
    let ZZX = dense_poly::DensePolyRing::new(ZZi64, "X");
    let phi = feanor_math::algorithms::cyclotomic::cyclotomic_polynomial(&ZZX, n as usize);
    let degree = ZZX.degree(&phi).unwrap();
    return (0..=degree).map(|i| *ZZX.coefficient_at(&phi, i)).collect();
}

///
/// The group `(Z/nZ)*`, which is the Galois group of `Q(zeta_n)/Q`.
///
#[derive(Clone, Copy)]
pub struct CyclotomicGaloisGroup {
    ring: Zn,
    order: usize
}

impl CyclotomicGaloisGroup {

    pub fn new(n: u64) -> Self {
        Self {
            ring: Zn::new(n),
            order: euler_phi(&factor(ZZi64, n as i64)) as usize
        }
    }

    pub fn identity(&self) -> CyclotomicGaloisGroupEl {
        CyclotomicGaloisGroupEl { value: self.ring.one() }
    }

    pub fn mul(&self, lhs: CyclotomicGaloisGroupEl, rhs: CyclotomicGaloisGroupEl) -> CyclotomicGaloisGroupEl {
        CyclotomicGaloisGroupEl { value: self.ring.mul(lhs.value, rhs.value) }
    }

    pub fn pow(&self, base: CyclotomicGaloisGroupEl, power: usize) -> CyclotomicGaloisGroupEl {
        CyclotomicGaloisGroupEl { value: self.ring.pow(base.value, power) }
    }

    pub fn representative(&self, value: CyclotomicGaloisGroupEl) -> u64 {
        self.ring.smallest_positive_lift(value.value) as u64 % self.n()
    }

    ///
    /// Returns the element `zeta -> zeta^value`, or `None` if `value` is not coprime to `n`.
    ///
    pub fn from_representative(&self, value: i64) -> Option<CyclotomicGaloisGroupEl> {
        let value = self.ring.coerce(&ZZi64, value);
        if self.ring.is_unit(&value) {
            Some(CyclotomicGaloisGroupEl { value })
        } else {
            None
        }
    }

    pub fn is_identity(&self, value: CyclotomicGaloisGroupEl) -> bool {
        self.ring.is_one(&value.value)
    }

    pub fn eq_el(&self, lhs: CyclotomicGaloisGroupEl, rhs: CyclotomicGaloisGroupEl) -> bool {
        self.ring.eq_el(&lhs.value, &rhs.value)
    }

    pub fn n(&self) -> u64 {
        *self.ring.modulus() as u64
    }

    pub fn group_order(&self) -> usize {
        self.order
    }

    pub fn element_order(&self, value: CyclotomicGaloisGroupEl) -> usize {
        multiplicative_order(value.value, self.ring) as usize
    }

    ///
    /// All elements, ordered by their smallest positive representative.
    ///
    pub fn elements(&self) -> impl '_ + Iterator<Item = CyclotomicGaloisGroupEl> {
        (1..=self.n() as i64).filter_map(move |r| self.from_representative(r))
    }
}

impl Debug for CyclotomicGaloisGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(Z/{}Z)*", self.ring.modulus())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CyclotomicGaloisGroupEl {
    value: ZnEl
}

pub type CycloField<K> = SimpleExtension<K>;

///
/// A prime of degree one of `k(zeta_e)`, lying over the degree-one prime `base_prime` of `k`.
/// It is determined by the image of `zeta` in the residue field `Fp`.
///
#[derive(Clone, Debug)]
pub struct DegreeOnePrime<K: NumberField> {
    pub base_prime: K::Ideal,
    pub residue_field: PrimeField,
    pub zeta_image: ZnEl
}

impl<K: NumberField> DegreeOnePrime<K> {

    pub fn characteristic(&self) -> i64 {
        self.residue_field.characteristic()
    }
}

///
/// The cyclotomic extension `C = k(zeta_e)` of a number field `k`, together with the action
/// of `Gal(C/k)` on it. The Galois group is a subgroup of `(Z/eZ)*`, its elements are given
/// by their representatives `r`, acting as `zeta -> zeta^r`.
///
pub struct CyclotomicExtension<K: NumberField> {
    order: u64,
    field: CycloField<K>,
    zeta_powers: Vec<El<CycloField<K>>>,
    galois_group: CyclotomicGaloisGroup,
    automorphisms: Vec<u64>,
    structure: FinAbGroup,
    structure_dlog: HashMap<u64, GroupEl>,
    generators: Vec<(u64, i64)>
}

impl<K: NumberField> Debug for CyclotomicExtension<K> {

    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(zeta_{})", self.field.base_field(), self.order)
    }
}

impl<K: NumberField> CyclotomicExtension<K> {

    pub fn new(base: K, e: u64) -> Self {
        assert!(e >= 2);
        let field = SimpleExtension::new(base.clone(), base.cyclotomic_polynomial_factor(e));
        let zeta = field.generator();
        let mut zeta_powers = Vec::with_capacity(e as usize);
        let mut current = field.one();
        for _ in 0..e {
            zeta_powers.push(current.clone());
            current = field.mul(&current, &zeta);
        }
        assert!(field.is_one(&current), "generator is not an {}-th root of unity", e);

        let galois_group = CyclotomicGaloisGroup::new(e);
        let automorphisms: Vec<u64> = galois_group.elements().map(|g| galois_group.representative(g)).filter(|r| {
            let value = field.sum(field.modulus().iter().enumerate().map(|(i, c)| field.mul(&field.from_base(c.clone()), &zeta_powers[(*r as usize * i) % e as usize])));
            field.is_zero(&value)
        }).collect();
        assert_eq!(field.degree(), automorphisms.len());

        let (structure, structure_dlog, generators) = Self::compute_galois_structure(&galois_group, &automorphisms);
        return Self { order: e, field, zeta_powers, galois_group, automorphisms, structure, structure_dlog, generators };
    }

    ///
    /// Computes the abstract structure of the subgroup `automorphisms` of `(Z/eZ)*`, by presenting
    /// it with all its elements as generators and the multiplication table as relations.
    ///
    fn compute_galois_structure(galois_group: &CyclotomicGaloisGroup, automorphisms: &[u64]) -> (FinAbGroup, HashMap<u64, GroupEl>, Vec<(u64, i64)>) {
        let n = automorphisms.len();
        let index_of: HashMap<u64, usize> = automorphisms.iter().enumerate().map(|(i, r)| (*r, i)).collect();
        let mut relations = Vec::new();
        for (i, r) in automorphisms.iter().enumerate() {
            for (j, s) in automorphisms.iter().enumerate().skip(i) {
                let rs = (r * s) % galois_group.n();
                let mut row = vec![0; n];
                row[i] += 1;
                row[j] += 1;
                row[index_of[&rs]] -= 1;
                relations.push(row);
            }
        }
        let (structure, presentation) = FinAbGroup::from_relations_mod(n, &relations, n as i64);
        let dlog = automorphisms.iter().enumerate().map(|(i, r)| (*r, presentation.image_of_generator(i).clone())).collect();
        let generators = (0..structure.rank()).map(|j| {
            let word = presentation.word_of(&structure.gen(j));
            let element = galois_group.pow_signed_product(automorphisms, &word);
            (element, structure.invariants()[j])
        }).collect();
        return (structure, dlog, generators);
    }

    pub fn base_field(&self) -> &K {
        self.field.base_field()
    }

    ///
    /// The order `e` of the adjoined root of unity.
    ///
    pub fn order(&self) -> u64 {
        self.order
    }

    ///
    /// The degree `[C : k]`.
    ///
    pub fn degree(&self) -> usize {
        self.field.degree()
    }

    pub fn field(&self) -> &CycloField<K> {
        &self.field
    }

    pub fn zeta(&self) -> El<CycloField<K>> {
        self.zeta_power(1)
    }

    pub fn zeta_power(&self, k: i64) -> El<CycloField<K>> {
        self.zeta_powers[k.rem_euclid(self.order as i64) as usize].clone()
    }

    pub fn full_galois_group(&self) -> &CyclotomicGaloisGroup {
        &self.galois_group
    }

    ///
    /// The representatives `r` of the elements of `Gal(C/k)`.
    ///
    pub fn automorphisms(&self) -> &[u64] {
        &self.automorphisms
    }

    pub fn galois_structure(&self) -> &FinAbGroup {
        &self.structure
    }

    ///
    /// The representatives of the Smith normal form generators of `Gal(C/k)`, with their orders.
    ///
    pub fn galois_generators(&self) -> &[(u64, i64)] {
        &self.generators
    }

    pub fn galois_element(&self, r: u64) -> Option<&GroupEl> {
        self.structure_dlog.get(&(r % self.order))
    }

    pub fn apply_galois(&self, value: &El<CycloField<K>>, r: u64) -> El<CycloField<K>> {
        let base = self.base_field();
        let mut result = self.field.zero();
        for (i, c) in value.iter().enumerate() {
            if base.is_zero(c) {
                continue;
            }
            let power = &self.zeta_powers[(r as usize * i) % self.order as usize];
            result = self.field.add(&result, &power.iter().map(|x| base.mul(x, c)).collect::<Vec<_>>());
        }
        return result;
    }

    ///
    /// Finds a degree-one prime of `C` above the degree-one prime `prime` of `k`. This requires
    /// that the norm `p` of `prime` satisfies `p = 1 mod e`.
    ///
    pub fn degree_one_prime(&self, prime: &K::Ideal) -> PrimeEval<DegreeOnePrime<K>> {
        let base = self.base_field();
        let p = base.ideal_norm(prime);
        if base.ideal_minimum(prime) != p {
            return Err(BadPrime::new(p, BadPrimeReason::HigherDegree));
        }
        let residue_field = PrimeField::new(p);
        let minpoly = self.field.modulus().iter()
            .map(|c| base.reduce_mod_prime(c, prime).map(|c| residue_field.from_int(c)))
            .collect::<Option<Vec<_>>>()
            .ok_or(BadPrime::new(p, BadPrimeReason::NotIntegral))?;
        let omega = residue_field.primitive_root_of_unity(self.order).ok_or(BadPrime::new(p, BadPrimeReason::NotSplit))?;
        let poly_ring = DensePolyRing::new(residue_field);
        for g in self.galois_group.elements() {
            let candidate = residue_field.pow(&omega, self.galois_group.representative(g));
            if residue_field.is_zero(&poly_ring.evaluate(&minpoly, &candidate)) {
                return Ok(DegreeOnePrime { base_prime: prime.clone(), residue_field, zeta_image: candidate });
            }
        }
        return Err(BadPrime::new(p, BadPrimeReason::NoCyclotomicRoot));
    }

    ///
    /// Reduces an element of `C` modulo a degree-one prime.
    ///
    pub fn reduce(&self, value: &El<CycloField<K>>, prime: &DegreeOnePrime<K>) -> PrimeEval<ZnEl> {
        let base = self.base_field();
        let Fp = &prime.residue_field;
        let mut result = Fp.zero();
        let mut zeta_power = Fp.one();
        for c in value {
            let reduced = base.reduce_mod_prime(c, &prime.base_prime).ok_or(BadPrime::new(prime.characteristic(), BadPrimeReason::NotIntegral))?;
            result = Fp.add(&result, &Fp.mul(&Fp.from_int(reduced), &zeta_power));
            zeta_power = Fp.mul(&zeta_power, &prime.zeta_image);
        }
        return Ok(result);
    }
}

impl CyclotomicGaloisGroup {

    ///
    /// Computes `prod_i elements[i]^word[i]` as representative.
    ///
    fn pow_signed_product(&self, elements: &[u64], word: &[i64]) -> u64 {
        let order = self.group_order() as i64;
        let result = elements.iter().zip(word.iter()).fold(self.identity(), |current, (r, k)| {
            let element = CyclotomicGaloisGroupEl { value: self.ring.coerce(&ZZi64, *r as i64) };
            self.mul(current, self.pow(element, k.rem_euclid(order) as usize))
        });
        return self.representative(result);
    }
}

#[cfg(test)]
use crate::field::rational::RationalField;

#[test]
fn test_cyclotomic_polynomial() {
    assert_eq!(vec![1, 1], cyclotomic_polynomial(2));
    assert_eq!(vec![1, 0, 1], cyclotomic_polynomial(4));
    assert_eq!(vec![1, 1, 1, 1, 1], cyclotomic_polynomial(5));
    assert_eq!(vec![1, 0, 0, 1, 0, 0, 1], cyclotomic_polynomial(9));
    assert_eq!(vec![1, -1, 0, 1, -1, 1, 0, -1, 1], cyclotomic_polynomial(15));
    assert_eq!(vec![-1, 1], cyclotomic_polynomial(1));
}

#[test]
fn test_galois_group() {
    let group = CyclotomicGaloisGroup::new(16);
    assert_eq!(8, group.group_order());
    assert_eq!(8, group.elements().count());
    assert_eq!(4, group.element_order(group.from_representative(3).unwrap()));
    assert_eq!(2, group.element_order(group.from_representative(15).unwrap()));
    assert_eq!(1, group.element_order(group.identity()));
    assert_eq!(16, CyclotomicGaloisGroup::new(17).element_order(CyclotomicGaloisGroup::new(17).from_representative(3).unwrap()));
    assert!(group.from_representative(6).is_none());
}

#[test]
fn test_cyclotomic_extension() {
    let C = CyclotomicExtension::new(RationalField, 8);
    assert_eq!(4, C.degree());
    assert_eq!(&[1, 3, 5, 7][..], C.automorphisms());
    assert_eq!(&[2, 2][..], C.galois_structure().invariants());
    let field = C.field();
    let zeta = C.zeta();
    assert!(field.eq_el(&field.pow(&zeta, 3), &C.apply_galois(&zeta, 3)));
    assert!(field.eq_el(&field.neg(&zeta), &C.apply_galois(&zeta, 5)));
    for (r, order) in C.galois_generators() {
        assert_eq!(2, *order);
        assert!(C.galois_element(*r).is_some());
    }
    // sqrt(2) = zeta + zeta^7 is fixed by 7, but not by 3
    let sqrt2 = field.add(&zeta, &C.zeta_power(7));
    assert!(field.eq_el(&sqrt2, &C.apply_galois(&sqrt2, 7)));
    assert!(!field.eq_el(&sqrt2, &C.apply_galois(&sqrt2, 3)));
    assert!(field.eq_el(&field.from_int(2), &field.mul(&sqrt2, &sqrt2)));
}

#[test]
fn test_degree_one_prime() {
    let C = CyclotomicExtension::new(RationalField, 5);
    let prime = C.degree_one_prime(&11).unwrap();
    assert_eq!(11, prime.characteristic());
    let field = C.field();
    let reduced = C.reduce(&field.pow(&C.zeta(), 5), &prime).unwrap();
    assert!(prime.residue_field.is_one(&reduced));
    assert!(!prime.residue_field.is_one(&prime.zeta_image));
    assert_eq!(BadPrimeReason::NotSplit, C.degree_one_prime(&7).unwrap_err().reason);
}
