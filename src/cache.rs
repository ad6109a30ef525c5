use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::backend::SUnitGroup;
use crate::cyclotomic::CyclotomicExtension;
use crate::error::*;
use crate::field::NumberField;
use crate::kummer::KummerExtension;

///
/// The result of an S-unit computation in a cyclotomic field `C`, which can be reused by all
/// computations that only require primes above a subset of `rational_primes`.
///
pub struct KummerCacheEntry<K: NumberField, P> {
    pub rational_primes: BTreeSet<i64>,
    pub support: Vec<P>,
    pub s_units: SUnitGroup<K>,
    pub kummer: KummerExtension<K>
}

///
/// A cyclotomic extension `k(zeta_e)` together with all S-unit computations done in it so far.
///
pub struct CyclotomicCacheEntry<K: NumberField, P> {
    extension: Arc<CyclotomicExtension<K>>,
    kummer: RwLock<Vec<Arc<KummerCacheEntry<K, P>>>>
}

impl<K: NumberField, P> CyclotomicCacheEntry<K, P> {

    pub fn extension(&self) -> &Arc<CyclotomicExtension<K>> {
        &self.extension
    }

    ///
    /// Returns an entry whose prime set contains `needed`, if there is one.
    ///
    pub fn lookup(&self, needed: &BTreeSet<i64>) -> Option<Arc<KummerCacheEntry<K, P>>> {
        self.kummer.read().unwrap().iter().find(|entry| entry.rational_primes.is_superset(needed)).cloned()
    }

    ///
    /// Stores a new entry and returns it. If, in the meantime, another entry was stored that
    /// covers all primes of the new one, the new one is dropped and the existing one returned.
    ///
    pub fn insert(&self, entry: KummerCacheEntry<K, P>) -> Arc<KummerCacheEntry<K, P>> {
        let mut locked = self.kummer.write().unwrap();
        if let Some(existing) = locked.iter().find(|existing| existing.rational_primes.is_superset(&entry.rational_primes)) {
            return existing.clone();
        }
        debug!("caching S-units of {:?} for primes {:?}", self.extension, entry.rational_primes);
        let result = Arc::new(entry);
        locked.push(result.clone());
        return result;
    }

    pub fn len(&self) -> usize {
        self.kummer.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// Cache of cyclotomic extensions of the base field, one per degree, each with the S-unit
/// groups computed in it. The cache only grows. It is passed explicitly to all computations
/// that use it, and can be shared between threads.
///
pub struct CyclotomicCache<K: NumberField, P> {
    entries: RwLock<HashMap<u64, Arc<CyclotomicCacheEntry<K, P>>>>
}

impl<K: NumberField, P> Default for CyclotomicCache<K, P> {

    fn default() -> Self {
        Self::new()
    }
}

impl<K: NumberField, P> CyclotomicCache<K, P> {

    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    ///
    /// Returns the entry for `k(zeta_e)`, and creates it using `create` if it does not exist yet.
    ///
    pub fn cyclotomic<F>(&self, e: u64, create: F) -> Result<Arc<CyclotomicCacheEntry<K, P>>>
        where F: FnOnce() -> Result<CyclotomicExtension<K>>
    {
        if let Some(entry) = self.entries.read().unwrap().get(&e) {
            return Ok(entry.clone());
        }
        let extension = Arc::new(create()?);
        let mut locked = self.entries.write().unwrap();
        let entry = locked.entry(e).or_insert_with(|| Arc::new(CyclotomicCacheEntry { extension, kummer: RwLock::new(Vec::new()) }));
        return Ok(entry.clone());
    }

    pub fn get(&self, e: u64) -> Option<Arc<CyclotomicCacheEntry<K, P>>> {
        self.entries.read().unwrap().get(&e).cloned()
    }
}

#[cfg(test)]
use crate::field::rational::RationalField;
#[cfg(test)]
use crate::field::*;
#[cfg(test)]
use crate::field::factored::FacElem;

#[cfg(test)]
fn dummy_entry(C: &CyclotomicExtension<RationalField>, primes: &[i64]) -> KummerCacheEntry<RationalField, i64> {
    let basis = vec![C.field().from_int(-1)];
    KummerCacheEntry {
        rational_primes: primes.iter().copied().collect(),
        support: primes.to_vec(),
        s_units: SUnitGroup::new(basis.clone(), 2, 0),
        kummer: KummerExtension::new(2, basis.into_iter().map(FacElem::from_base).collect())
    }
}

#[test]
fn test_subset_reuse() {
    let cache: CyclotomicCache<RationalField, i64> = CyclotomicCache::new();
    let entry = cache.cyclotomic(2, || Ok(CyclotomicExtension::new(RationalField, 2))).unwrap();
    let again = cache.cyclotomic(2, || panic!("extension is recomputed")).unwrap();
    assert!(Arc::ptr_eq(&entry, &again));

    assert!(entry.lookup(&[2].into_iter().collect()).is_none());
    let inserted = entry.insert(dummy_entry(entry.extension(), &[2, 5, 7]));
    let found = entry.lookup(&[2, 7].into_iter().collect()).unwrap();
    assert!(Arc::ptr_eq(&inserted, &found));
    assert!(entry.lookup(&[2, 3].into_iter().collect()).is_none());

    // a subset of an existing entry is not stored again
    let not_inserted = entry.insert(dummy_entry(entry.extension(), &[5]));
    assert!(Arc::ptr_eq(&inserted, &not_inserted));
    assert_eq!(1, entry.len());
    entry.insert(dummy_entry(entry.extension(), &[3]));
    assert_eq!(2, entry.len());
}
