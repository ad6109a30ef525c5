#![feature(allocator_api)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

#![doc = include_str!("../Readme.md")]

use feanor_math::integer::BigIntRing;
use feanor_math::primitive_int::StaticRing;

extern crate feanor_math;

///
/// The ring of `i64` integers, used for factoring and gcd computations on small integers.
///
pub const ZZi64: StaticRing<i64> = StaticRing::RING;

///
/// Arbitrary-precision integers, used for rationals and for lattice determinants.
///
pub const ZZbig: BigIntRing = BigIntRing::RING;

#[macro_use]
pub mod profiling;

///
/// Error types, and the distinction between bad primes (recoverable during prime searches)
/// and failures of a whole computation.
///
pub mod error;

///
/// Finite abelian groups in Smith normal form, and homomorphisms between them.
///
pub mod group;

///
/// Minimal exact field arithmetic: the [`field::Field`] and [`field::NumberField`] traits,
/// polynomials, simple extensions, residue fields and factored elements.
///
pub mod field;

///
/// Cyclotomic extensions `k(zeta_e)` of a number field `k`, together with their Galois groups.
///
pub mod cyclotomic;

///
/// Iteration over rational primes and the greedy search for primes with prescribed properties.
///
pub mod primes;

///
/// Kummer extensions of a cyclotomic field, and their Frobenius elements.
///
pub mod kummer;

///
/// The interface to the arithmetic that is not done by this crate, i.e. ray class groups,
/// S-unit groups and prime decomposition in cyclotomic fields, and an implementation for `Q`.
///
pub mod backend;

///
/// The process-wide cache of S-unit computations in cyclotomic fields.
///
pub mod cache;

///
/// The computation of class fields from ray class group quotients.
///
pub mod class_field;

#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}
