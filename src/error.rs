use thiserror::Error;

///
/// Why a sampled prime cannot be used by one of the prime searches.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadPrimeReason {
    /// the prime divides the modulus of the ray class group
    DividesModulus,
    /// the prime divides the index of the equation order
    DividesIndex,
    /// the prime is not of degree one over the base field
    HigherDegree,
    /// the prime does not split completely in the cyclotomic field
    NotSplit,
    /// some coefficient has a denominator divisible by the prime
    NotIntegral,
    /// a Kummer generator vanishes modulo the prime
    DividesGenerator,
    NoCyclotomicRoot,
    /// the reduction of the defining polynomial has repeated factors
    NotSquarefree,
    /// more than one automorphism matches the Frobenius
    AmbiguousFrobenius,
    NoFrobeniusMatch
}

///
/// A sampled prime that is unusable. This is never returned by the top-level entry points,
/// the searches discard the candidate and continue with the next prime.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bad prime {prime}: {reason:?}")]
pub struct BadPrime {
    pub prime: i64,
    pub reason: BadPrimeReason
}

impl BadPrime {

    pub fn new(prime: i64, reason: BadPrimeReason) -> Self {
        Self { prime, reason }
    }
}

///
/// Result of evaluating a single sampled prime: either the value computed from it, or
/// the reason why it has to be discarded.
///
pub type PrimeEval<T> = std::result::Result<T, BadPrime>;

#[derive(Debug, Error)]
pub enum ClassFieldError {
    #[error("cannot extend the automorphism zeta -> zeta^{galois_element} of the cyclotomic field to the Kummer extension: {reason}")]
    ExtendAutomorphism { galois_element: u64, reason: String },
    #[error("prime search exhausted after {examined} candidates while {context}")]
    SearchExhausted { examined: usize, context: &'static str },
    #[error("the Kummer generators do not reach the class field: {0}")]
    InsufficientKummerGenerators(String),
    #[error("not supported by the arithmetic backend: {0}")]
    Unsupported(String)
}

pub type Result<T> = std::result::Result<T, ClassFieldError>;
