use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::*;
use crate::cyclotomic::*;
use crate::error::*;
use crate::field::extension::SimpleExtension;
use crate::field::factored::FacElem;
use crate::field::*;
use crate::group::*;

use super::reduce::ReducedRadicand;

///
/// The field `K = C[y]/(y^o - a)`, elements are given by their coefficients w.r.t. `1, alpha, ..., alpha^(o - 1)`.
///
pub type RadicalField<K> = SimpleExtension<CycloField<K>>;

///
/// The radical extension `K = C(a^(1/o))` of the cyclotomic field `C = k(zeta_e)`, where `o | e`.
/// Since `K` is abelian over `k`, its automorphisms are all of the form described by
/// [`KummerAutomorphism`].
///
pub struct RadicalExtension<K: NumberField> {
    cyclotomic: Arc<CyclotomicExtension<K>>,
    order: i64,
    defect: i64,
    radicand: ReducedRadicand<K>,
    radicand_value: El<CycloField<K>>,
    field: RadicalField<K>
}

impl<K: NumberField> std::fmt::Debug for RadicalExtension<K> {

    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(a^(1/{}))", self.cyclotomic, self.order)
    }
}

///
/// An automorphism `tau` of a [`RadicalExtension`] over `k`, given by `tau(zeta) = zeta^r` and
/// `tau(alpha) = gamma * alpha^s`, where `alpha^o = a`.
///
#[derive(Clone, Debug)]
pub struct KummerAutomorphism<K: NumberField> {
    r: u64,
    s: i64,
    gamma: El<CycloField<K>>
}

impl<K: NumberField> KummerAutomorphism<K> {

    pub fn galois_element(&self) -> u64 {
        self.r
    }

    pub fn alpha_exponent(&self) -> i64 {
        self.s
    }

    pub fn gamma(&self) -> &El<CycloField<K>> {
        &self.gamma
    }
}

impl<K: NumberField> RadicalExtension<K> {

    pub fn new(cyclotomic: Arc<CyclotomicExtension<K>>, radicand: ReducedRadicand<K>, order: i64, defect: i64) -> Self {
        assert_eq!(cyclotomic.order() as i64, order * defect);
        let C = cyclotomic.field();
        let radicand_value = if order == 1 {
            C.one()
        } else {
            radicand.factored.evaluate(C).expect("Kummer generators are nonzero")
        };
        let mut modulus = vec![C.zero(); order as usize + 1];
        modulus[0] = C.neg(&radicand_value);
        modulus[order as usize] = C.one();
        let field = SimpleExtension::new(C.clone(), modulus);
        Self { cyclotomic, order, defect, radicand, radicand_value, field }
    }

    pub fn cyclotomic(&self) -> &Arc<CyclotomicExtension<K>> {
        &self.cyclotomic
    }

    pub fn field(&self) -> &RadicalField<K> {
        &self.field
    }

    pub fn order(&self) -> i64 {
        self.order
    }

    pub fn defect(&self) -> i64 {
        self.defect
    }

    pub fn radicand(&self) -> &El<CycloField<K>> {
        &self.radicand_value
    }

    pub fn radicand_factored(&self) -> &FacElem<El<CycloField<K>>> {
        &self.radicand.factored
    }

    pub fn alpha(&self) -> El<RadicalField<K>> {
        self.field.generator()
    }

    ///
    /// The degree `[K : k] = o [C : k]`.
    ///
    pub fn degree(&self) -> usize {
        self.order as usize * self.cyclotomic.degree()
    }

    pub fn from_cyclotomic(&self, value: El<CycloField<K>>) -> El<RadicalField<K>> {
        self.field.from_base(value)
    }

    ///
    /// The coordinates of `value` w.r.t. the `k`-basis `zeta^j alpha^i` of `K`.
    ///
    pub fn flatten(&self, value: &El<RadicalField<K>>) -> Vec<El<K>> {
        value.iter().flat_map(|c| c.iter().cloned()).collect()
    }

    ///
    /// Returns the element of `k` represented by `value`, if it lies in `k`.
    ///
    pub fn as_base(&self, value: &El<RadicalField<K>>) -> Option<El<K>> {
        self.cyclotomic.field().as_base(&self.field.as_base(value)?)
    }

    pub fn identity(&self) -> KummerAutomorphism<K> {
        KummerAutomorphism { r: 1, s: 1 % self.order, gamma: self.cyclotomic.field().one() }
    }

    ///
    /// The generator `alpha -> zeta_e^c alpha` of `Gal(K/C)`.
    ///
    pub fn vertical(&self) -> KummerAutomorphism<K> {
        if self.order == 1 {
            return self.identity();
        }
        KummerAutomorphism { r: 1, s: 1, gamma: self.cyclotomic.zeta_power(self.defect) }
    }

    pub fn apply(&self, tau: &KummerAutomorphism<K>, value: &El<RadicalField<K>>) -> El<RadicalField<K>> {
        let K = &self.field;
        let C = self.cyclotomic.field();
        let mut beta = vec![C.zero(); self.order as usize];
        beta[tau.s as usize] = tau.gamma.clone();
        let mut result = K.zero();
        let mut beta_power = K.one();
        for c in value.iter() {
            let image = self.cyclotomic.apply_galois(c, tau.r);
            result = K.add(&result, &K.mul(&beta_power, &self.from_cyclotomic(image)));
            beta_power = K.mul(&beta_power, &beta);
        }
        return result;
    }

    ///
    /// Computes `lhs o rhs`, using `alpha^(s_l s_r) = a^q alpha^s` with `s_l s_r = q o + s`.
    ///
    pub fn compose(&self, lhs: &KummerAutomorphism<K>, rhs: &KummerAutomorphism<K>) -> KummerAutomorphism<K> {
        let C = self.cyclotomic.field();
        let r = (lhs.r * rhs.r) % self.cyclotomic.order();
        let product = lhs.s * rhs.s;
        let (q, s) = (product / self.order, product % self.order);
        let gamma = C.prod([
            self.cyclotomic.apply_galois(&rhs.gamma, lhs.r),
            C.pow(&lhs.gamma, rhs.s as u64),
            C.pow(&self.radicand_value, q as u64)
        ]);
        return KummerAutomorphism { r, s, gamma };
    }

    pub fn pow(&self, tau: &KummerAutomorphism<K>, power: u64) -> KummerAutomorphism<K> {
        let mut result = self.identity();
        let mut current = tau.clone();
        let mut remaining = power;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = self.compose(&result, &current);
            }
            remaining >>= 1;
            if remaining > 0 {
                current = self.compose(&current, &current);
            }
        }
        return result;
    }

    pub fn eq_automorphism(&self, lhs: &KummerAutomorphism<K>, rhs: &KummerAutomorphism<K>) -> bool {
        lhs.r == rhs.r && lhs.s == rhs.s && self.cyclotomic.field().eq_el(&lhs.gamma, &rhs.gamma)
    }

    ///
    /// Extends `zeta -> zeta^r` to `K`, by finding `gamma` with `sigma_r(a) = gamma^o a^s`, where
    /// `s = r mod o`. This is done on exponent vectors over the S-unit basis, so the support of
    /// `units` must be Galois-stable.
    ///
    pub fn lift<B>(&self, backend: &B, units: &SUnitGroup<K>, r: u64) -> Result<KummerAutomorphism<K>>
        where B: ClassFieldBackend<BaseField = K>
    {
        if self.order == 1 {
            return Ok(KummerAutomorphism { r, s: 0, gamma: self.cyclotomic.field().one() });
        }
        let error = |reason: &str| ClassFieldError::ExtendAutomorphism { galois_element: r, reason: reason.to_owned() };
        let C = &*self.cyclotomic;
        let s = r as i64 % self.order;
        let radicand_exponents = match &self.radicand.exponents {
            Some(exponents) => exponents.clone(),
            None => backend.s_unit_dlog(C, units, &self.radicand_value).ok_or_else(|| error("radicand is not an S-unit"))?
        };
        let mut exponents = radicand_exponents.iter().map(|w| -s * w).collect::<Vec<_>>();
        for (w, g) in radicand_exponents.iter().zip(units.basis().iter()) {
            if *w == 0 {
                continue;
            }
            let conjugate = backend.s_unit_dlog(C, units, &C.apply_galois(g, r)).ok_or_else(|| error("support of the S-units is not Galois-stable"))?;
            for (x, y) in exponents.iter_mut().zip(conjugate.iter()) {
                *x += w * y;
            }
        }
        let gamma = units.root(&exponents, self.order).ok_or_else(|| error("sigma(a) / a^s is not an o-th power"))?;
        let gamma = gamma.evaluate(C.field()).expect("S-units are nonzero");
        return Ok(KummerAutomorphism { r, s, gamma });
    }
}

///
/// The group `Aut(K/k)` of a [`RadicalExtension`], as abstract group together with the
/// automorphism corresponding to each element.
///
pub struct AutomorphismGroup<K: NumberField> {
    group: FinAbGroup,
    presentation: Presentation,
    generators: Vec<KummerAutomorphism<K>>,
    elements: Vec<KummerAutomorphism<K>>,
    element_index: HashMap<GroupEl, usize>
}

impl<K: NumberField> AutomorphismGroup<K> {

    ///
    /// Computes the automorphism group from the vertical generator and lifts of the generators
    /// of `Gal(C/k)`. The relations are `v^o = 1` and `tau_j^(d_j) = v^(m_j)`, where `d_j` is the
    /// order of the `j`-th generator of `Gal(C/k)`.
    ///
    #[instrument(skip_all)]
    pub fn compute<B>(radical: &RadicalExtension<K>, backend: &B, units: &SUnitGroup<K>) -> Result<Self>
        where B: ClassFieldBackend<BaseField = K>
    {
        let C = radical.cyclotomic();
        let o = radical.order();
        let mut generators = vec![radical.vertical()];
        let mut relations = Vec::new();
        let galois_generators = C.galois_generators();
        let generator_count = galois_generators.len() + 1;
        let mut vertical_relation = vec![0; generator_count];
        vertical_relation[0] = o;
        relations.push(vertical_relation);

        for (j, (r, d)) in galois_generators.iter().enumerate() {
            let tau = radical.lift(backend, units, *r)?;
            let power = radical.pow(&tau, *d as u64);
            assert!(power.r == 1 && power.s == 1 % o, "tau^{} does not fix C", d);
            let m = (0..o).find(|m| C.field().eq_el(&power.gamma, &C.zeta_power(radical.defect() * m)))
                .unwrap_or_else(|| panic!("tau^{} is not a power of the vertical automorphism", d));
            let mut relation = vec![0; generator_count];
            relation[0] = -m;
            relation[j + 1] = *d;
            relations.push(relation);
            generators.push(tau);
        }

        let (group, presentation) = FinAbGroup::from_relations_mod(generator_count, &relations, radical.degree() as i64);
        assert_eq!(radical.degree() as i64, group.order(), "automorphism group has wrong order");
        let group_order = group.order();
        let mut elements = Vec::with_capacity(group_order as usize);
        let mut element_index = HashMap::new();
        for (index, x) in group.elements().enumerate() {
            let word = presentation.word_of(&x);
            let automorphism = word.iter().zip(generators.iter()).fold(radical.identity(), |current, (k, tau)| {
                radical.compose(&current, &radical.pow(tau, k.rem_euclid(group_order) as u64))
            });
            elements.push(automorphism);
            element_index.insert(x, index);
        }
        debug!("automorphism group of {:?} has invariants {:?}", radical, group.invariants());
        return Ok(Self { group, presentation, generators, elements, element_index });
    }

    pub fn group(&self) -> &FinAbGroup {
        &self.group
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    ///
    /// The vertical generator, followed by the lifts of the generators of `Gal(C/k)`.
    ///
    pub fn generators(&self) -> &[KummerAutomorphism<K>] {
        &self.generators
    }

    pub fn automorphism_of(&self, x: &GroupEl) -> &KummerAutomorphism<K> {
        &self.elements[self.element_index[x]]
    }

    ///
    /// All pairs of group elements and automorphisms.
    ///
    pub fn elements(&self) -> impl '_ + Iterator<Item = (GroupEl, &KummerAutomorphism<K>)> {
        self.group.elements().map(move |x| {
            let index = self.element_index[&x];
            (x, &self.elements[index])
        })
    }
}

#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use crate::field::rational::RationalField;

#[cfg(test)]
fn radical_extension(backend: &RationalBackend, e: u64, order: i64, support: &[i64], exponents: Vec<i64>) -> (RadicalExtension<RationalField>, SUnitGroup<RationalField>) {
    let C = Arc::new(backend.cyclotomic_extension(e).unwrap());
    let mut primes = Vec::new();
    for p in support {
        primes.extend(backend.cyclotomic_primes_above(&C, *p).unwrap());
    }
    let units = backend.s_unit_group(&C, &primes).unwrap();
    let radicand = ReducedRadicand { factored: units.as_factored(&exponents), exponents: Some(exponents) };
    (RadicalExtension::new(C, radicand, order, e as i64 / order), units)
}

#[test]
fn test_radical_arithmetic() {
    let backend = RationalBackend::new();
    // Q(sqrt(5))
    let (radical, _) = radical_extension(&backend, 2, 2, &[5], vec![0, 1]);
    let K = radical.field();
    let alpha = radical.alpha();
    assert!(K.eq_el(&K.from_int(5), &K.mul(&alpha, &alpha)));
    assert_eq!(2, radical.degree());
    let vertical = radical.vertical();
    assert!(K.eq_el(&K.neg(&alpha), &radical.apply(&vertical, &alpha)));
    assert!(radical.eq_automorphism(&radical.identity(), &radical.pow(&vertical, 2)));
    assert!(radical.eq_automorphism(&vertical, &radical.compose(&vertical, &radical.identity())));
}

#[test]
fn test_compose_matches_apply() {
    let backend = RationalBackend::new();
    // the S-unit basis of Q(i) for S above 2 and 5 is i, 1 - i, pi, pi', and a = pi pi'^3
    // satisfies sigma(a) = a^3 modulo fourth powers, so Q(i, a^(1/4)) is abelian over Q
    let (radical, units) = radical_extension(&backend, 4, 4, &[2, 5], vec![0, 0, 1, 3]);
    let K = radical.field();
    let C = radical.cyclotomic();
    let tau = radical.lift(&backend, &units, 3).unwrap();
    assert_eq!(3, tau.alpha_exponent());
    let vertical = radical.vertical();
    let x = K.add(&radical.alpha(), &radical.from_cyclotomic(C.zeta()));
    for (a, b) in [(&tau, &vertical), (&vertical, &tau), (&tau, &tau)] {
        let composed = radical.compose(a, b);
        assert!(K.eq_el(&radical.apply(a, &radical.apply(b, &x)), &radical.apply(&composed, &x)));
    }
    // tau maps alpha to a root of y^4 - sigma(a)
    let image = radical.apply(&tau, &radical.alpha());
    let sigma_a = radical.from_cyclotomic(C.apply_galois(radical.radicand(), 3));
    assert!(K.eq_el(&sigma_a, &K.pow(&image, 4)));

    let group = AutomorphismGroup::compute(&radical, &backend, &units).unwrap();
    assert_eq!(8, group.group().order());
}

#[test]
fn test_lift_fails_for_non_abelian() {
    let backend = RationalBackend::new();
    // Q(i, (1 - i)^(1/4)) is not abelian over Q, since sigma(1 - i) / (1 - i)^3 = -1/2 is not a fourth power
    let (radical, units) = radical_extension(&backend, 4, 4, &[2], vec![0, 1]);
    assert!(matches!(radical.lift(&backend, &units, 3), Err(ClassFieldError::ExtendAutomorphism { galois_element: 3, .. })));
}

#[test]
fn test_automorphism_group() {
    let backend = RationalBackend::new();
    let (radical, units) = radical_extension(&backend, 2, 2, &[5], vec![0, 1]);
    let group = AutomorphismGroup::compute(&radical, &backend, &units).unwrap();
    assert_eq!(&[2][..], group.group().invariants());
    let K = radical.field();
    let alpha = radical.alpha();
    let images = group.elements().map(|(_, tau)| radical.apply(tau, &alpha)).collect::<Vec<_>>();
    assert_eq!(2, images.len());
    assert!(!K.eq_el(&images[0], &images[1]));
    assert!(group.elements().all(|(x, tau)| radical.eq_automorphism(tau, group.automorphism_of(&x))));
}
