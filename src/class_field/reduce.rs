use crate::backend::SUnitGroup;
use crate::cyclotomic::*;
use crate::field::factored::FacElem;
use crate::field::*;
use crate::kummer::KummerExtension;

use super::artin::KummerGenerator;

///
/// Reduces a Kummer generator modulo `o`-th powers.
///
pub enum GeneratorReducer<'a, K: NumberField> {
    ///
    /// The Kummer generators are exactly the S-unit basis, so reduction happens on the
    /// exponent vector, which is kept for the later extension of automorphisms.
    ///
    WithSupport(&'a SUnitGroup<K>),
    ///
    /// Works for arbitrary factored Kummer generators by merging identical bases.
    ///
    Generic(&'a KummerExtension<K>)
}

///
/// A Kummer generator, reduced to exponents in `[0, o)`.
///
#[derive(Clone, Debug)]
pub struct ReducedRadicand<K: NumberField> {
    pub factored: FacElem<El<CycloField<K>>>,
    ///
    /// The exponents over the S-unit basis, if known.
    ///
    pub exponents: Option<Vec<i64>>
}

impl<'a, K: NumberField> GeneratorReducer<'a, K> {

    pub fn for_kummer_extension(units: &'a SUnitGroup<K>, kummer: &'a KummerExtension<K>, field: &CycloField<K>) -> Self {
        let is_basis = kummer.generators().len() == units.rank() && kummer.generators().iter().zip(units.basis().iter()).all(|(generator, b)| match generator.factors() {
            [(base, 1)] => field.eq_el(base, b),
            _ => false
        });
        if is_basis {
            GeneratorReducer::WithSupport(units)
        } else {
            GeneratorReducer::Generic(kummer)
        }
    }

    pub fn reduce(&self, field: &CycloField<K>, generator: &KummerGenerator) -> ReducedRadicand<K> {
        let order = generator.order;
        match self {
            GeneratorReducer::WithSupport(units) => {
                let exponents = generator.exponents.iter().map(|w| w.rem_euclid(order)).collect::<Vec<_>>();
                ReducedRadicand { factored: units.as_factored(&exponents), exponents: Some(exponents) }
            },
            GeneratorReducer::Generic(kummer) => {
                assert_eq!(kummer.generators().len(), generator.exponents.len());
                let product = kummer.generators().iter().zip(generator.exponents.iter())
                    .fold(FacElem::one(), |current, (g, w)| current.mul(&g.pow(*w)));
                ReducedRadicand { factored: reduce_generic(field, &product, order), exponents: None }
            }
        }
    }
}

///
/// Merges identical bases and reduces all exponents into `[0, n)`.
///
pub fn reduce_generic<F: Field>(field: &F, value: &FacElem<El<F>>, n: i64) -> FacElem<El<F>> {
    value.simplify(field).reduce_exponents(n).0
}

#[cfg(test)]
use crate::field::rational::RationalField;

#[test]
fn test_reduce_with_support() {
    let C = CyclotomicExtension::new(RationalField, 2);
    let field = C.field();
    let units = SUnitGroup::new(vec![field.from_int(-1), field.from_int(2), field.from_int(5)], 2, 0);
    let kummer = KummerExtension::new(2, units.basis().iter().cloned().map(FacElem::from_base).collect());
    let reducer = GeneratorReducer::for_kummer_extension(&units, &kummer, field);
    assert!(matches!(reducer, GeneratorReducer::WithSupport(_)));
    let generator = KummerGenerator { exponents: vec![2, -1, 3], order: 2, defect: 1 };
    let reduced = reducer.reduce(field, &generator);
    assert_eq!(Some(vec![0, 1, 1]), reduced.exponents);
    assert!(field.eq_el(&field.from_int(10), &reduced.factored.evaluate(field).unwrap()));
}

#[test]
fn test_reduce_generic() {
    let C = CyclotomicExtension::new(RationalField, 2);
    let field = C.field();
    let units = SUnitGroup::new(vec![field.from_int(-1), field.from_int(3)], 2, 0);
    // the Kummer generators are 3 and 3^2 * 7, which is not the S-unit basis
    let kummer = KummerExtension::new(3, vec![
        FacElem::from_base(field.from_int(3)),
        FacElem::from_factors(vec![(field.from_int(3), 2), (field.from_int(7), 1)])
    ]);
    let reducer = GeneratorReducer::for_kummer_extension(&units, &kummer, field);
    assert!(matches!(reducer, GeneratorReducer::Generic(_)));
    // 3^2 * (3^2 * 7)^2 = 3^6 * 7^2
    let reduced = reducer.reduce(field, &KummerGenerator { exponents: vec![2, 2], order: 3, defect: 1 });
    assert!(reduced.exponents.is_none());
    assert!(field.eq_el(&field.from_int(49), &reduced.factored.evaluate(field).unwrap()));
}
