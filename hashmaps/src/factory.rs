//! Constructs a table engine behind the uniform [`Map`] capability surface.
//!
//! Keeps variant selection decoupled from the engines: callers that pick an engine through
//! configuration receive a boxed trait object and never name a concrete type. Code that knows
//! which engine it wants should instantiate it directly instead.

use crate::chained::Chained;
use crate::hashing::hashers::MixHasher;
use crate::hopscotch::Hopscotch;
use crate::linear::Linear;
use crate::robin_hood::RobinHood;
use hashmaps_core::{Hasher, Map, MapError};

/// The table engines a [`Config`] can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Separate chaining; see [`Chained`].
    #[default]
    Chained,
    /// Linear probing with an empty sentinel; see [`Linear`].
    Linear,
    /// Robin Hood probing; see [`RobinHood`].
    RobinHood,
    /// Bounded-neighborhood probing; see [`Hopscotch`].
    Hopscotch,
}

/// Configuration consumed by [`new_map`].
///
/// # Examples
///
/// ```rust
/// use hashmaps::factory::{new_map, Config, Variant};
///
/// let mut words = new_map::<u64, String>(Config {
///     variant: Variant::RobinHood,
///     size: 100,
///     max_load: Some(0.8),
///     ..Config::default()
/// })
/// .unwrap();
///
/// words.put(1, "one".to_string());
/// assert_eq!(words.get(&1).map(String::as_str), Some("one"));
/// ```
pub struct Config<K> {
    /// Which engine to construct.
    pub variant: Variant,
    /// Pre-size the table for this many entries. Zero leaves the default capacity.
    pub size: usize,
    /// Maximum load factor, validated against the open interval (0, 1). `None` keeps the
    /// engine's default.
    pub max_load: Option<f32>,
    /// The empty-sentinel key for [`Variant::Linear`]; ignored by the other engines. The
    /// sentinel value can never be stored as a live key.
    pub empty: K,
}

impl<K: Default> Default for Config<K> {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            size: 0,
            max_load: None,
            empty: K::default(),
        }
    }
}

/// Construct the configured table engine behind the [`Map`] capability surface.
///
/// Fails with [`MapError::LoadFactorOutOfRange`] when the configured `max_load` is invalid.
pub fn new_map<K, V>(config: Config<K>) -> Result<Box<dyn Map<K, V>>, MapError>
where
    K: Eq + Clone + 'static,
    V: 'static,
    MixHasher<K>: Hasher<K>,
{
    let mut map: Box<dyn Map<K, V>> = match config.variant {
        Variant::Chained => Box::new(Chained::<K, V>::new()),
        Variant::Linear => Box::new(Linear::<K, V>::with_empty(config.empty)),
        Variant::RobinHood => Box::new(RobinHood::<K, V>::new()),
        Variant::Hopscotch => Box::new(Hopscotch::<K, V>::new()),
    };

    if let Some(max_load) = config.max_load {
        map.set_max_load(max_load)?;
    }

    if config.size > 0 {
        map.reserve(config.size);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARIANTS: [Variant; 4] = [
        Variant::Chained,
        Variant::Linear,
        Variant::RobinHood,
        Variant::Hopscotch,
    ];

    #[test]
    fn test_every_variant_honors_the_contract() {
        for variant in ALL_VARIANTS {
            let mut table = new_map::<u64, u64>(Config {
                variant,
                empty: u64::MAX,
                ..Config::default()
            })
            .unwrap();

            assert_eq!(table.len(), 0, "{:?}", variant);
            assert!(table.put(5, 5), "{:?}", variant);
            assert_eq!(table.len(), 1, "{:?}", variant);
            assert!(!table.put(5, 5), "{:?}", variant);
            assert_eq!(table.len(), 1, "{:?}", variant);
            assert_eq!(table.get(&5), Some(&5), "{:?}", variant);
            assert!(table.remove(&5), "{:?}", variant);
            assert_eq!(table.len(), 0, "{:?}", variant);
            assert!(!table.remove(&5), "{:?}", variant);
            assert_eq!(table.get(&5), None, "{:?}", variant);
        }
    }

    #[test]
    fn test_size_and_max_load_are_applied() {
        for variant in ALL_VARIANTS {
            let mut table = new_map::<u64, u64>(Config {
                variant,
                size: 1000,
                max_load: Some(0.5),
                empty: u64::MAX,
            })
            .unwrap();

            for i in 0..1000 {
                table.put(i, i);
            }
            assert_eq!(table.len(), 1000, "{:?}", variant);
            // 1000 entries were reserved up front at max load 0.5, so at least 2048 buckets
            // exist and the load can never pass the threshold.
            assert!(table.load_factor() <= 0.5, "{:?}", variant);
        }
    }

    #[test]
    fn test_invalid_max_load_is_rejected() {
        let result = new_map::<u64, u64>(Config {
            variant: Variant::RobinHood,
            max_load: Some(1.0),
            ..Config::default()
        });
        assert_eq!(result.err(), Some(MapError::LoadFactorOutOfRange(1.0)));
    }

    #[test]
    fn test_string_keys_work_through_the_surface() {
        for variant in ALL_VARIANTS {
            let mut table = new_map::<String, u64>(Config {
                variant,
                ..Config::default()
            })
            .unwrap();

            assert!(table.put("alpha".to_string(), 1));
            assert!(table.put("beta".to_string(), 2));
            assert_eq!(table.get(&"alpha".to_string()), Some(&1), "{:?}", variant);

            let mut visited = 0;
            table.each(&mut |_, _| {
                visited += 1;
                false
            });
            assert_eq!(visited, 2, "{:?}", variant);
        }
    }
}
