use thiserror::Error;

use super::smith::*;
use super::*;

///
/// Raised by [`AbGroupHom::from_generating_pairs()`] if the prescribed images do not
/// define a homomorphism.
///
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InconsistentImages(pub &'static str);

///
/// A homomorphism of finite abelian groups, given by the images of the Smith normal form
/// generators of the domain.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbGroupHom {
    domain: FinAbGroup,
    codomain: FinAbGroup,
    images: Vec<GroupEl>
}

impl AbGroupHom {

    pub fn new(domain: FinAbGroup, codomain: FinAbGroup, images: Vec<GroupEl>) -> Self {
        assert_eq!(domain.rank(), images.len());
        for (d, image) in domain.invariants().iter().zip(images.iter()) {
            assert!(codomain.is_zero(&codomain.scale(image, *d)), "images do not define a homomorphism");
        }
        Self { domain, codomain, images }
    }

    pub fn identity(group: FinAbGroup) -> Self {
        let images = (0..group.rank()).map(|i| group.gen(i)).collect();
        Self::new(group.clone(), group, images)
    }

    pub fn zero(domain: FinAbGroup, codomain: FinAbGroup) -> Self {
        let images = (0..domain.rank()).map(|_| codomain.zero()).collect();
        Self::new(domain, codomain, images)
    }

    ///
    /// Computes the unique homomorphism that maps `pairs[i].0` to `pairs[i].1`. The first
    /// components must generate the domain, and the assignment must respect all relations
    /// between them.
    ///
    pub fn from_generating_pairs(domain: &FinAbGroup, codomain: &FinAbGroup, pairs: &[(GroupEl, GroupEl)]) -> Result<Self, InconsistentImages> {
        let exponent = lcm(domain.exponent(), codomain.exponent());
        if exponent == 1 {
            return Ok(Self::zero(domain.clone(), codomain.clone()));
        }
        let free = FinAbGroup::from_invariants(vec![exponent; pairs.len()]);
        let from_free = AbGroupHom::new(free.clone(), domain.clone(), pairs.iter().map(|(x, _)| x.clone()).collect());
        let to_codomain = AbGroupHom::new(free, codomain.clone(), pairs.iter().map(|(_, y)| y.clone()).collect());
        for relation in from_free.kernel() {
            if !codomain.is_zero(&to_codomain.apply(&relation)) {
                return Err(InconsistentImages("the prescribed images violate a relation"));
            }
        }
        let mut images = Vec::with_capacity(domain.rank());
        for i in 0..domain.rank() {
            let word = from_free.preimage(&domain.gen(i)).ok_or(InconsistentImages("the given elements do not generate the domain"))?;
            images.push(to_codomain.apply(&word));
        }
        return Ok(Self::new(domain.clone(), codomain.clone(), images));
    }

    pub fn domain(&self) -> &FinAbGroup {
        &self.domain
    }

    pub fn codomain(&self) -> &FinAbGroup {
        &self.codomain
    }

    pub fn images(&self) -> &[GroupEl] {
        &self.images
    }

    pub fn apply(&self, x: &GroupEl) -> GroupEl {
        self.codomain.sum(x.coords().iter().zip(self.images.iter()).map(|(c, image)| self.codomain.scale(image, *c)))
    }

    ///
    /// Returns the composition `next o self`.
    ///
    pub fn then(&self, next: &AbGroupHom) -> AbGroupHom {
        assert_eq!(&self.codomain, next.domain());
        AbGroupHom::new(self.domain.clone(), next.codomain.clone(), self.images.iter().map(|x| next.apply(x)).collect())
    }

    ///
    /// A common multiple of the exponents of domain and codomain, modulo which all
    /// lattice computations are performed.
    ///
    fn modulus(&self) -> i64 {
        lcm(self.domain.exponent(), self.codomain.exponent())
    }

    fn stacked_matrix(&self) -> Vec<Vec<i64>> {
        let mut result: Vec<Vec<i64>> = self.images.iter().map(|x| x.coords().to_vec()).collect();
        let rank = self.codomain.rank();
        result.extend((0..rank).map(|i| (0..rank).map(|j| if i == j { self.codomain.invariants()[i] } else { 0 }).collect()));
        return result;
    }

    ///
    /// Returns a generating set of the kernel.
    ///
    pub fn kernel(&self) -> Vec<GroupEl> {
        let mut result: Vec<GroupEl> = left_kernel(&self.stacked_matrix(), self.codomain.rank(), self.modulus()).into_iter()
            .map(|row| self.domain.element(row[..self.domain.rank()].to_vec()))
            .filter(|x| !self.domain.is_zero(x))
            .collect();
        result.sort();
        result.dedup();
        return result;
    }

    ///
    /// Returns a generating set of the image.
    ///
    pub fn image(&self) -> Vec<GroupEl> {
        self.images.iter().filter(|x| !self.codomain.is_zero(x)).cloned().collect()
    }

    pub fn is_zero(&self) -> bool {
        self.images.iter().all(|x| self.codomain.is_zero(x))
    }

    pub fn is_surjective(&self) -> bool {
        self.codomain.quotient(&self.images).0.is_trivial()
    }

    pub fn preimage(&self, y: &GroupEl) -> Option<GroupEl> {
        let solution = solve_left(&self.stacked_matrix(), self.codomain.rank(), y.coords(), self.modulus())?;
        Some(self.domain.element(solution[..self.domain.rank()].to_vec()))
    }
}

#[test]
fn test_kernel_and_preimage() {
    let domain = FinAbGroup::from_invariants(vec![4, 4]);
    let codomain = FinAbGroup::cyclic(4);
    let hom = AbGroupHom::new(domain.clone(), codomain.clone(), vec![codomain.element(vec![1]), codomain.element(vec![2])]);
    let (kernel, _) = domain.subgroup(&hom.kernel());
    assert_eq!(4, kernel.order());
    for x in hom.kernel() {
        assert!(codomain.is_zero(&hom.apply(&x)));
    }
    assert!(hom.is_surjective());
    let y = codomain.element(vec![3]);
    assert_eq!(y, hom.apply(&hom.preimage(&y).unwrap()));

    let not_surjective = AbGroupHom::new(domain.clone(), codomain.clone(), vec![codomain.element(vec![2]), codomain.zero()]);
    assert!(!not_surjective.is_surjective());
    assert!(not_surjective.preimage(&codomain.element(vec![1])).is_none());
}

#[test]
fn test_from_generating_pairs() {
    let domain = FinAbGroup::from_invariants(vec![2, 2]);
    let codomain = FinAbGroup::cyclic(2);
    let a = domain.element(vec![1, 1]);
    let b = domain.element(vec![0, 1]);
    let one = codomain.element(vec![1]);
    let hom = AbGroupHom::from_generating_pairs(&domain, &codomain, &[(a.clone(), one.clone()), (b.clone(), codomain.zero())]).unwrap();
    assert_eq!(one, hom.apply(&domain.element(vec![1, 0])));
    assert_eq!(codomain.zero(), hom.apply(&domain.element(vec![0, 1])));

    // a + b + (1, 0) = 0, but the images sum to 1
    let c = domain.element(vec![1, 0]);
    assert!(AbGroupHom::from_generating_pairs(&domain, &codomain, &[(a.clone(), one.clone()), (b.clone(), codomain.zero()), (c, codomain.zero())]).is_err());
    assert!(AbGroupHom::from_generating_pairs(&domain, &codomain, &[(a, one)]).is_err());
}

#[test]
fn test_compose() {
    let group = FinAbGroup::from_invariants(vec![2, 6]);
    let (quotient, projection) = group.quotient(&[group.element(vec![0, 3])]);
    let composed = AbGroupHom::identity(group.clone()).then(&projection);
    assert_eq!(&quotient, composed.codomain());
    for x in group.elements() {
        assert_eq!(projection.apply(&x), composed.apply(&x));
    }
}

#[test]
fn test_kernel_of_large_free_group() {
    // many generators of large order, as they occur when interpolating Artin maps
    let domain = FinAbGroup::from_invariants(vec![2, 2 * 3 * 5 * 7 * 11 * 13]);
    let codomain = FinAbGroup::cyclic(3 * 5 * 7);
    let free = FinAbGroup::from_invariants(vec![domain.exponent(); 4]);
    let pairs = (0..4).map(|i| {
        let x = domain.element(vec![i % 2, 37 * i * i + 5 * i + 1]);
        let y = codomain.element(vec![37 * i * i + 5 * i + 1]);
        (x, y)
    }).collect::<Vec<_>>();
    let from_free = AbGroupHom::new(free.clone(), domain.clone(), pairs.iter().map(|(x, _)| x.clone()).collect());
    for x in from_free.kernel() {
        assert!(domain.is_zero(&from_free.apply(&x)));
    }
    let (kernel, _) = free.subgroup(&from_free.kernel());
    assert_eq!(free.order() / domain.order(), kernel.order());

    let hom = AbGroupHom::from_generating_pairs(&domain, &codomain, &pairs).unwrap();
    assert_eq!(codomain.element(vec![1]), hom.apply(&domain.element(vec![0, 1])));
    assert!(codomain.is_zero(&hom.apply(&domain.element(vec![1, 0]))));
}
