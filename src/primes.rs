use std::collections::BTreeSet;

use feanor_math::algorithms::miller_rabin::is_prime;
use tracing::trace;

use crate::error::*;
use crate::group::*;
use crate::ZZi64;

///
/// Lazy iterator over the primes `p = 1 mod q`, in ascending order. With `q = 1`, this
/// iterates over all primes. It never ends.
///
#[derive(Clone, Debug)]
pub struct PrimeIter {
    current: i64,
    modulus: i64
}

impl PrimeIter {

    pub fn all() -> Self {
        Self::congruent_to_one(1)
    }

    ///
    /// Iterates over the primes that split completely in the `q`-th cyclotomic field.
    ///
    pub fn congruent_to_one(q: i64) -> Self {
        assert!(q >= 1);
        Self { current: 1, modulus: q }
    }

    ///
    /// Skips all primes `<= bound`.
    ///
    pub fn above(mut self, bound: i64) -> Self {
        self.current = std::cmp::max(self.current, bound);
        return self;
    }

    pub fn next_prime(&mut self) -> i64 {
        loop {
            self.current += 1;
            if self.current.rem_euclid(self.modulus) == 1 % self.modulus && is_prime(ZZi64, &self.current, 10) {
                return self.current;
            }
        }
    }
}

impl Iterator for PrimeIter {

    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        Some(self.next_prime())
    }
}

///
/// The skip predicates of a prime search: primes dividing a cofactor (usually the modulus,
/// the degree and the support of the current S-units) or the index of the equation order
/// are never returned.
///
#[derive(Clone, Debug, Default)]
pub struct PrimeSearchPolicy {
    cofactor: BTreeSet<i64>,
    ring_index: i64
}

impl PrimeSearchPolicy {

    pub fn new<I>(cofactor: I, ring_index: i64) -> Self
        where I: IntoIterator<Item = i64>
    {
        Self { cofactor: cofactor.into_iter().collect(), ring_index }
    }

    pub fn cofactor(&self) -> &BTreeSet<i64> {
        &self.cofactor
    }

    pub fn skips(&self, p: i64) -> bool {
        self.cofactor.iter().any(|q| q % p == 0) || (self.ring_index != 0 && self.ring_index % p == 0)
    }
}

///
/// A resumable search over an infinite prime sequence, controlled by a [`PrimeSearchPolicy`].
/// If a limit is given, the search fails with [`ClassFieldError::SearchExhausted`] once that
/// many candidates have been drawn.
///
#[derive(Clone, Debug)]
pub struct PrimeSearch {
    primes: PrimeIter,
    policy: PrimeSearchPolicy,
    limit: Option<usize>,
    examined: usize,
    context: &'static str
}

impl PrimeSearch {

    pub fn new(primes: PrimeIter, policy: PrimeSearchPolicy, limit: Option<usize>, context: &'static str) -> Self {
        Self { primes, policy, limit, examined: 0, context }
    }

    pub fn policy(&self) -> &PrimeSearchPolicy {
        &self.policy
    }

    pub fn examined(&self) -> usize {
        self.examined
    }

    pub fn next_candidate(&mut self) -> Result<i64> {
        loop {
            if let Some(limit) = self.limit {
                if self.examined >= limit {
                    return Err(ClassFieldError::SearchExhausted { examined: self.examined, context: self.context });
                }
            }
            let p = self.primes.next_prime();
            self.examined += 1;
            if self.policy.skips(p) {
                trace!("skipping prime {} while {}", p, self.context);
                continue;
            }
            return Ok(p);
        }
    }
}

///
/// The acceptance predicate used when collecting generators of a finite abelian group
/// from sampled elements. A candidate is accepted iff its image in the quotient by the
/// already accepted elements has a coordinate that is invertible modulo the corresponding
/// invariant. This guarantees that every accepted element strictly shrinks the quotient.
///
#[derive(Clone, Debug)]
pub struct GeneratingSet {
    group: FinAbGroup,
    accepted: Vec<GroupEl>,
    quotient: FinAbGroup,
    projection: AbGroupHom
}

impl GeneratingSet {

    pub fn new(group: FinAbGroup) -> Self {
        Self::with_initial(group, &[])
    }

    ///
    /// Starts the search with a given set of elements, which are not checked against the
    /// acceptance predicate.
    ///
    pub fn with_initial(group: FinAbGroup, initial: &[GroupEl]) -> Self {
        let (quotient, projection) = if initial.is_empty() {
            (group.clone(), AbGroupHom::identity(group.clone()))
        } else {
            group.quotient(initial)
        };
        Self { group, accepted: initial.to_vec(), quotient, projection }
    }

    pub fn group(&self) -> &FinAbGroup {
        &self.group
    }

    pub fn accepted(&self) -> &[GroupEl] {
        &self.accepted
    }

    pub fn remaining(&self) -> &FinAbGroup {
        &self.quotient
    }

    pub fn is_complete(&self) -> bool {
        self.quotient.is_trivial()
    }

    pub fn accepts(&self, candidate: &GroupEl) -> bool {
        let image = self.projection.apply(candidate);
        image.coords().iter().zip(self.quotient.invariants().iter()).any(|(c, d)| gcd(*c, *d) == 1)
    }

    ///
    /// Adds `candidate` if it is accepted, and returns whether this was the case.
    ///
    pub fn offer(&mut self, candidate: &GroupEl) -> bool {
        if !self.accepts(candidate) {
            return false;
        }
        self.accepted.push(candidate.clone());
        let (quotient, projection) = self.group.quotient(&self.accepted);
        self.quotient = quotient;
        self.projection = projection;
        return true;
    }
}

#[test]
fn test_prime_iter() {
    assert_eq!(vec![2, 3, 5, 7, 11, 13], PrimeIter::all().take(6).collect::<Vec<_>>());
    assert_eq!(vec![5, 13, 17, 29], PrimeIter::congruent_to_one(4).take(4).collect::<Vec<_>>());
    assert_eq!(vec![31, 37], PrimeIter::congruent_to_one(3).above(20).take(2).collect::<Vec<_>>());
}

#[test]
fn test_prime_search_policy() {
    let policy = PrimeSearchPolicy::new([15, 7], 4);
    assert!(policy.skips(3));
    assert!(policy.skips(5));
    assert!(policy.skips(2));
    assert!(!policy.skips(11));

    let mut search = PrimeSearch::new(PrimeIter::all(), policy, Some(6), "testing");
    assert_eq!(11, search.next_candidate().unwrap());
    assert_eq!(13, search.next_candidate().unwrap());
    // 2, 3, 5, 7, 11, 13 are drawn, so the next call hits the limit
    assert!(matches!(search.next_candidate(), Err(ClassFieldError::SearchExhausted { examined: 6, .. })));
}

#[test]
fn test_generating_set() {
    let group = FinAbGroup::from_invariants(vec![2, 4]);
    let mut generating_set = GeneratingSet::new(group.clone());
    assert!(!generating_set.offer(&group.zero()));
    // (0, 2) has no invertible coordinate
    assert!(!generating_set.offer(&group.element(vec![0, 2])));
    assert!(generating_set.offer(&group.element(vec![1, 1])));
    assert!(!generating_set.is_complete());
    // the remaining quotient has order 2 and is generated by the image of (0, 1)
    assert!(!generating_set.offer(&group.element(vec![1, 1])));
    assert!(generating_set.offer(&group.element(vec![0, 1])));
    assert!(generating_set.is_complete());
    assert_eq!(2, generating_set.accepted().len());
}
