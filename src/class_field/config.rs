use serde::{Deserialize, Serialize};

///
/// Parameters controlling the prime searches of class field computations.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassFieldConfig {
    /// Maximal number of primes drawn by a single prime search, or `None` for no limit.
    pub prime_search_limit: Option<usize>,
    /// Number of additional primes on which an Artin map is checked before it is trusted.
    pub verification_primes: usize,
    /// Whether to process the cyclic prime-power pieces in parallel, using rayon.
    pub parallel_pieces: bool
}

impl Default for ClassFieldConfig {

    fn default() -> Self {
        Self {
            prime_search_limit: None,
            verification_primes: 10,
            parallel_pieces: false
        }
    }
}

#[test]
fn test_config_serialization() {
    let config = ClassFieldConfig {
        prime_search_limit: Some(1000),
        parallel_pieces: true,
        ..ClassFieldConfig::default()
    };
    let serialized = serde_json::to_string(&config).unwrap();
    let deserialized: ClassFieldConfig = serde_json::from_str(&serialized).unwrap();
    assert_eq!(config, deserialized);

    let partial: ClassFieldConfig = serde_json::from_str("{\"verification_primes\": 3}").unwrap();
    assert_eq!(3, partial.verification_primes);
    assert_eq!(ClassFieldConfig::default().parallel_pieces, partial.parallel_pieces);
}
