use feanor_math::pid::PrincipalIdealRingStore;
use serde::{Deserialize, Serialize};

use crate::ZZi64;

use self::smith::*;

///
/// Smith normal form over `Z/NZ`, together with the derived lattice operations.
///
pub mod smith;

///
/// Homomorphisms between finite abelian groups.
///
pub mod hom;

pub use hom::*;

pub(crate) fn gcd(a: i64, b: i64) -> i64 {
    ZZi64.ideal_gen(&a, &b).abs()
}

pub(crate) fn lcm(a: i64, b: i64) -> i64 {
    ZZi64.lcm(&a, &b).abs()
}

///
/// An element of a [`FinAbGroup`], given by its coordinates w.r.t. the Smith normal form basis.
/// Coordinates are always reduced, i.e. the `i`-th coordinate is in `[0, d_i)`.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupEl {
    coords: Vec<i64>
}

impl GroupEl {

    pub fn coords(&self) -> &[i64] {
        &self.coords
    }
}

///
/// A finite abelian group `Z/d_1 x ... x Z/d_r` in Smith normal form, i.e. `d_1 | d_2 | ... | d_r`
/// and all `d_i > 1`.
///
/// Since each group is stored in Smith normal form, operations that produce new groups (quotients,
/// subgroups) also return the map that relates the new group to the old one.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinAbGroup {
    invariants: Vec<i64>
}

///
/// Relates a presentation `Z^n / R` of a group to its Smith normal form.
///
#[derive(Clone, Debug)]
pub struct Presentation {
    generator_images: Vec<GroupEl>,
    snf_generator_words: Vec<Vec<i64>>,
    modulus: i64
}

impl Presentation {

    ///
    /// The group element represented by the `i`-th generator of the presentation.
    ///
    pub fn image_of_generator(&self, i: usize) -> &GroupEl {
        &self.generator_images[i]
    }

    pub fn evaluate_word(&self, group: &FinAbGroup, word: &[i64]) -> GroupEl {
        assert_eq!(self.generator_images.len(), word.len());
        group.sum(word.iter().zip(self.generator_images.iter()).map(|(k, g)| group.scale(g, *k)))
    }

    ///
    /// A word in the generators of the presentation that evaluates to the given element.
    ///
    pub fn word_of(&self, x: &GroupEl) -> Vec<i64> {
        let mut result = vec![0; self.generator_images.len()];
        for (j, c) in x.coords().iter().enumerate() {
            for (i, w) in self.snf_generator_words[j].iter().enumerate() {
                result[i] = (result[i] + c * w) % self.modulus;
            }
        }
        return result;
    }
}

impl FinAbGroup {

    pub fn trivial() -> Self {
        Self { invariants: Vec::new() }
    }

    pub fn cyclic(n: i64) -> Self {
        Self::from_invariants(vec![n])
    }

    ///
    /// Creates the group with the given invariants, which must form a divisibility chain.
    /// Invariants equal to `1` are dropped.
    ///
    pub fn from_invariants(invariants: Vec<i64>) -> Self {
        let invariants: Vec<i64> = invariants.into_iter().filter(|d| *d != 1).collect();
        assert!(invariants.iter().all(|d| *d > 1), "invariants must be positive");
        for pair in invariants.windows(2) {
            assert!(pair[1] % pair[0] == 0, "invariants {:?} do not form a divisibility chain", invariants);
        }
        Self { invariants }
    }

    ///
    /// Computes the group `Z^n / <relations>`, which is required to be finite.
    ///
    pub fn from_relations(generator_count: usize, relations: &[Vec<i64>]) -> (Self, Presentation) {
        let index = lattice_index(relations, generator_count).expect("relations do not define a finite group");
        return Self::from_relations_mod(generator_count, relations, index);
    }

    ///
    /// Computes the group `Z^n / <relations>`, where `modulus` must be a multiple of its exponent,
    /// e.g. a known multiple of its order. All intermediate values are reduced modulo `modulus`.
    ///
    pub fn from_relations_mod(generator_count: usize, relations: &[Vec<i64>], modulus: i64) -> (Self, Presentation) {
        let snf = smith_normal_form(relations, generator_count, modulus);
        let kept: Vec<usize> = (0..generator_count).filter(|j| snf.invariants[*j] != 1).collect();
        let group = FinAbGroup { invariants: kept.iter().map(|j| snf.invariants[*j]).collect() };
        let generator_images = (0..generator_count).map(|i| GroupEl {
            coords: kept.iter().map(|j| snf.right[i][*j] % snf.invariants[*j]).collect()
        }).collect();
        let snf_generator_words = kept.iter().map(|j| snf.right_inv[*j].clone()).collect();
        return (group, Presentation { generator_images, snf_generator_words, modulus });
    }

    pub fn invariants(&self) -> &[i64] {
        &self.invariants
    }

    pub fn rank(&self) -> usize {
        self.invariants.len()
    }

    pub fn order(&self) -> i64 {
        self.invariants.iter().product()
    }

    pub fn exponent(&self) -> i64 {
        self.invariants.last().copied().unwrap_or(1)
    }

    pub fn is_trivial(&self) -> bool {
        self.invariants.is_empty()
    }

    pub fn is_cyclic(&self) -> bool {
        self.invariants.len() <= 1
    }

    pub fn element(&self, coords: Vec<i64>) -> GroupEl {
        assert_eq!(self.rank(), coords.len());
        GroupEl { coords: coords.into_iter().zip(self.invariants.iter()).map(|(c, d)| c.rem_euclid(*d)).collect() }
    }

    pub fn zero(&self) -> GroupEl {
        GroupEl { coords: vec![0; self.rank()] }
    }

    pub fn gen(&self, i: usize) -> GroupEl {
        self.element((0..self.rank()).map(|j| if i == j { 1 } else { 0 }).collect())
    }

    pub fn add(&self, lhs: &GroupEl, rhs: &GroupEl) -> GroupEl {
        self.element(lhs.coords.iter().zip(rhs.coords.iter()).map(|(a, b)| a + b).collect())
    }

    pub fn sub(&self, lhs: &GroupEl, rhs: &GroupEl) -> GroupEl {
        self.element(lhs.coords.iter().zip(rhs.coords.iter()).map(|(a, b)| a - b).collect())
    }

    pub fn neg(&self, value: &GroupEl) -> GroupEl {
        self.element(value.coords.iter().map(|a| -a).collect())
    }

    pub fn scale(&self, value: &GroupEl, factor: i64) -> GroupEl {
        self.element(value.coords.iter().zip(self.invariants.iter()).map(|(a, d)| (a * factor.rem_euclid(*d)) % d).collect())
    }

    pub fn sum<I>(&self, it: I) -> GroupEl
        where I: IntoIterator<Item = GroupEl>
    {
        it.into_iter().fold(self.zero(), |a, b| self.add(&a, &b))
    }

    pub fn is_zero(&self, value: &GroupEl) -> bool {
        value.coords.iter().all(|c| *c == 0)
    }

    pub fn order_of(&self, value: &GroupEl) -> i64 {
        value.coords.iter().zip(self.invariants.iter()).fold(1, |current, (c, d)| lcm(current, d / gcd(*c, *d)))
    }

    ///
    /// Iterates over all elements of the group. Only sensible for small groups.
    ///
    pub fn elements(&self) -> impl '_ + Iterator<Item = GroupEl> {
        (0..self.order()).map(move |mut index| {
            let mut coords = Vec::with_capacity(self.rank());
            for d in &self.invariants {
                coords.push(index % d);
                index /= d;
            }
            GroupEl { coords }
        })
    }

    fn relation_rows(&self) -> Vec<Vec<i64>> {
        (0..self.rank()).map(|i| (0..self.rank()).map(|j| if i == j { self.invariants[i] } else { 0 }).collect()).collect()
    }

    ///
    /// Returns the quotient by the subgroup generated by `generators`, and the projection onto it.
    ///
    pub fn quotient(&self, generators: &[GroupEl]) -> (FinAbGroup, AbGroupHom) {
        let mut relations = self.relation_rows();
        relations.extend(generators.iter().map(|g| g.coords.clone()));
        let (quotient, presentation) = FinAbGroup::from_relations_mod(self.rank(), &relations, self.exponent());
        let projection = AbGroupHom::new(self.clone(), quotient.clone(), presentation.generator_images);
        return (quotient, projection);
    }

    ///
    /// Returns the subgroup generated by `generators` as abstract group, together with its inclusion.
    ///
    pub fn subgroup(&self, generators: &[GroupEl]) -> (FinAbGroup, AbGroupHom) {
        let mut matrix: Vec<Vec<i64>> = generators.iter().map(|g| g.coords.clone()).collect();
        matrix.extend(self.relation_rows());
        let relations: Vec<Vec<i64>> = left_kernel(&matrix, self.rank(), self.exponent()).into_iter()
            .map(|row| row[..generators.len()].to_vec())
            .collect();
        let (subgroup, presentation) = FinAbGroup::from_relations_mod(generators.len(), &relations, self.exponent());
        let images = (0..subgroup.rank()).map(|j| {
            let word = &presentation.snf_generator_words[j];
            self.sum(word.iter().zip(generators.iter()).map(|(k, g)| self.scale(g, *k)))
        }).collect();
        let inclusion = AbGroupHom::new(subgroup.clone(), self.clone(), images);
        return (subgroup, inclusion);
    }

    ///
    /// Checks whether `value` lies in the subgroup generated by `generators`.
    ///
    pub fn contains(&self, generators: &[GroupEl], value: &GroupEl) -> bool {
        let mut matrix: Vec<Vec<i64>> = generators.iter().map(|g| g.coords.clone()).collect();
        matrix.extend(self.relation_rows());
        solve_left(&matrix, self.rank(), value.coords(), self.exponent()).is_some()
    }
}

#[test]
fn test_from_relations() {
    // Z^2 / <(2, 0), (0, 3)> = Z/6
    let (group, presentation) = FinAbGroup::from_relations(2, &[vec![2, 0], vec![0, 3]]);
    assert_eq!(&[6][..], group.invariants());
    assert_eq!(2, group.order_of(presentation.image_of_generator(0)));
    assert_eq!(3, group.order_of(presentation.image_of_generator(1)));
    for x in group.elements() {
        let word = presentation.word_of(&x);
        assert_eq!(x, presentation.evaluate_word(&group, &word));
    }
}

#[test]
fn test_quotient() {
    let group = FinAbGroup::from_invariants(vec![2, 4]);
    let (quotient, projection) = group.quotient(&[group.element(vec![1, 2])]);
    assert_eq!(4, quotient.order());
    assert!(quotient.is_cyclic());
    assert!(projection.is_surjective());
    assert!(quotient.is_zero(&projection.apply(&group.element(vec![1, 2]))));
    assert!(!quotient.is_zero(&projection.apply(&group.element(vec![0, 2]))));
}

#[test]
fn test_subgroup() {
    let group = FinAbGroup::from_invariants(vec![2, 4]);
    let (subgroup, inclusion) = group.subgroup(&[group.element(vec![1, 2]), group.element(vec![0, 2])]);
    assert_eq!(4, subgroup.order());
    assert_eq!(&[2, 2][..], subgroup.invariants());
    for x in subgroup.elements() {
        let y = inclusion.apply(&x);
        assert_eq!(0, y.coords()[1] % 2);
    }
    assert!(group.contains(&[group.element(vec![1, 2])], &group.zero()));
    assert!(group.contains(&[group.element(vec![1, 1])], &group.element(vec![1, 3])));
    assert!(!group.contains(&[group.element(vec![1, 2])], &group.element(vec![0, 2])));
}

#[test]
fn test_elements_and_orders() {
    let group = FinAbGroup::from_invariants(vec![2, 6]);
    assert_eq!(12, group.elements().count());
    assert_eq!(6, group.exponent());
    assert_eq!(6, group.order_of(&group.element(vec![1, 1])));
    assert_eq!(3, group.order_of(&group.element(vec![0, 2])));
    assert_eq!(1, group.order_of(&group.zero()));
    assert!(FinAbGroup::trivial().is_cyclic());
    assert_eq!(1, FinAbGroup::trivial().elements().count());
}

#[test]
fn test_from_relations_large_entries() {
    // the relation matrix has determinant 12, but its entries do not fit into 32 bits
    let big = 1 << 45;
    let (group, presentation) = FinAbGroup::from_relations(2, &[vec![2, 2 * big], vec![6, 6 * big + 6]]);
    assert_eq!(&[2, 6][..], group.invariants());
    for x in group.elements() {
        assert_eq!(x, presentation.evaluate_word(&group, &presentation.word_of(&x)));
    }
}

#[test]
fn test_repeated_quotients() {
    let mut group = FinAbGroup::from_invariants(vec![2, 2 * 3 * 5 * 7 * 11 * 13 * 16]);
    for divisor in [2, 3, 5, 7] {
        let generator = group.scale(&group.gen(group.rank() - 1), group.exponent() / divisor);
        let (quotient, projection) = group.quotient(&[generator]);
        assert!(projection.is_surjective());
        assert_eq!(group.order() / divisor, quotient.order());
        let (kernel, _) = group.subgroup(&projection.kernel());
        assert_eq!(divisor, kernel.order());
        group = quotient;
    }
}
