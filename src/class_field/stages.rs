use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::*;
use crate::cache::*;
use crate::error::*;

use super::artin::*;
use super::compose::PieceField;
use super::decompose::PieceInit;
use super::descent::descend;
use super::radical::*;
use super::reduce::GeneratorReducer;
use super::sunits::*;
use super::ClassFieldContext;

pub struct KummerFound<B: ClassFieldBackend> {
    pub init: PieceInit,
    pub cyclotomic: Arc<CyclotomicCacheEntry<B::BaseField, B::Prime>>,
    pub entry: Arc<KummerCacheEntry<B::BaseField, B::Prime>>,
    pub generator: KummerGenerator
}

pub struct GeneratorReduced<B: ClassFieldBackend> {
    pub init: PieceInit,
    pub entry: Arc<KummerCacheEntry<B::BaseField, B::Prime>>,
    pub radical: RadicalExtension<B::BaseField>
}

///
/// The state of the computation of one cyclic piece of prime-power degree. Each call to
/// [`ClassFieldPrimePower::advance()`] performs one step, until the piece is
/// [`ClassFieldPrimePower::Descended`].
///
pub enum ClassFieldPrimePower<B: ClassFieldBackend> {
    Init(PieceInit),
    SUnitsComputed(SUnitsComputed<B>),
    KummerFound(KummerFound<B>),
    GeneratorReduced(GeneratorReduced<B>),
    Descended(PieceField<B::BaseField>)
}

impl<B: ClassFieldBackend> ClassFieldPrimePower<B> {

    pub fn new(init: PieceInit) -> Self {
        ClassFieldPrimePower::Init(init)
    }

    pub fn stage_name(&self) -> &'static str {
        match self {
            ClassFieldPrimePower::Init(_) => "Init",
            ClassFieldPrimePower::SUnitsComputed(_) => "SUnitsComputed",
            ClassFieldPrimePower::KummerFound(_) => "KummerFound",
            ClassFieldPrimePower::GeneratorReduced(_) => "GeneratorReduced",
            ClassFieldPrimePower::Descended(_) => "Descended"
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ClassFieldPrimePower::Descended(_))
    }

    #[instrument(skip_all)]
    pub fn advance<M>(self, ctx: &ClassFieldContext<B>, rcg: &M) -> Result<Self>
        where M: ?Sized + RayClassGroupMap<B::BaseField>
    {
        debug!("advancing piece from stage {}", self.stage_name());
        match self {
            ClassFieldPrimePower::Init(init) => {
                let computed = record_time!("ClassFieldPrimePower::s_units", || compute_s_units(ctx, init))?;
                Ok(ClassFieldPrimePower::SUnitsComputed(computed))
            },
            ClassFieldPrimePower::SUnitsComputed(SUnitsComputed { init, cyclotomic, entry }) => {
                let artin = record_time!("ClassFieldPrimePower::artin_map", || -> Result<ArtinMap> {
                    let builder = ArtinMapBuilder::new(ctx, rcg, cyclotomic.extension(), &entry.kummer, &init, &entry.rational_primes);
                    let artin = builder.build()?;
                    builder.verify(&artin, ctx.config().verification_primes)?;
                    Ok(artin)
                })?;
                let generator = extract_generator(&artin);
                debug!("piece {} has Kummer generator of order {} and defect {}", init.index, generator.order, generator.defect);
                Ok(ClassFieldPrimePower::KummerFound(KummerFound { init, cyclotomic, entry, generator }))
            },
            ClassFieldPrimePower::KummerFound(KummerFound { init, cyclotomic, entry, generator }) => {
                let C = cyclotomic.extension();
                let radicand = GeneratorReducer::for_kummer_extension(&entry.s_units, &entry.kummer, C.field()).reduce(C.field(), &generator);
                let radical = RadicalExtension::new(C.clone(), radicand, generator.order, generator.defect);
                Ok(ClassFieldPrimePower::GeneratorReduced(GeneratorReduced { init, entry, radical }))
            },
            ClassFieldPrimePower::GeneratorReduced(GeneratorReduced { init, entry, radical }) => {
                let piece = record_time!("ClassFieldPrimePower::descend", || {
                    let automorphisms = AutomorphismGroup::compute(&radical, ctx.backend(), &entry.s_units)?;
                    descend(ctx, rcg, &init, &entry.rational_primes, &radical, &automorphisms)
                })?;
                Ok(ClassFieldPrimePower::Descended(piece))
            },
            ClassFieldPrimePower::Descended(piece) => Ok(ClassFieldPrimePower::Descended(piece))
        }
    }

    ///
    /// Advances the piece until it is descended, and returns its defining polynomial.
    ///
    pub fn run<M>(self, ctx: &ClassFieldContext<B>, rcg: &M) -> Result<PieceField<B::BaseField>>
        where M: ?Sized + RayClassGroupMap<B::BaseField>
    {
        let mut current = self;
        loop {
            current = current.advance(ctx, rcg)?;
            if let ClassFieldPrimePower::Descended(piece) = current {
                return Ok(piece);
            }
        }
    }
}

#[cfg(test)]
use crate::backend::rational::ray_class::RationalRayClassGroup;
#[cfg(test)]
use crate::backend::rational::RationalBackend;
#[cfg(test)]
use crate::field::*;
#[cfg(test)]
use crate::group::AbGroupHom;
#[cfg(test)]
use super::decompose::decompose;
#[cfg(test)]
use super::ClassFieldConfig;

#[test]
fn test_stages() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let rcg = RationalRayClassGroup::new(5, false);
    let init = decompose(&ctx, &rcg, &AbGroupHom::identity(rcg.group().clone())).unwrap().pop().unwrap();
    let mut stage = ClassFieldPrimePower::<RationalBackend>::new(init);
    let mut names = vec![stage.stage_name()];
    while !stage.is_finished() {
        stage = stage.advance(&ctx, &rcg).unwrap();
        names.push(stage.stage_name());
    }
    assert_eq!(vec!["Init", "SUnitsComputed", "KummerFound", "GeneratorReduced", "Descended"], names);
    let ClassFieldPrimePower::Descended(piece) = stage else { unreachable!() };
    let QQ = crate::field::rational::RationalField;
    assert_eq!(vec![QQ.from_int(-5), QQ.zero(), QQ.one()], piece.polynomial);
}

#[test]
fn test_run_cubic() {
    let ctx = ClassFieldContext::new(RationalBackend::new(), ClassFieldConfig::default());
    let rcg = RationalRayClassGroup::new(7, true);
    let (_, projection) = rcg.group().quotient(&[rcg.group().scale(&rcg.group().gen(0), 3)]);
    let init = decompose(&ctx, &rcg, &projection).unwrap().pop().unwrap();
    assert_eq!(3, init.degree);
    let piece = ClassFieldPrimePower::<RationalBackend>::new(init).run(&ctx, &rcg).unwrap();
    assert_eq!(3, piece.radical_order);
    assert_eq!(4, piece.polynomial.len());
}
