//! Differential testing of table engines against the standard library map.
use hashmaps_core::Map;
use rand::Rng;
use std::collections::HashMap as StdHashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Verifies that a table and a reference map hold exactly the same entries.
///
/// Checks both directions: every entry the table visits must be in the reference, every
/// reference entry must be retrievable from the table, and the sizes must match.
///
/// # Panics
///
/// On any disagreement between the table and the reference.
pub fn check_equivalent<K, V, M>(table: &M, reference: &StdHashMap<K, V>)
where
    K: Eq + Hash + Debug,
    V: PartialEq + Debug,
    M: Map<K, V> + ?Sized,
{
    assert_eq!(
        table.len(),
        reference.len(),
        "sizes diverged: {} != {}",
        table.len(),
        reference.len()
    );

    let mut visited = 0_usize;
    table.each(&mut |key, value| {
        match reference.get(key) {
            None => panic!("table visited key {:?} that is not in the reference", key),
            Some(expected) => assert_eq!(
                value, expected,
                "value mismatch for key {:?}: {:?} != {:?}",
                key, value, expected
            ),
        }
        visited += 1;
        false
    });
    assert_eq!(
        visited,
        reference.len(),
        "each() visited {} entries, expected {}",
        visited,
        reference.len()
    );

    for (key, value) in reference {
        assert_eq!(table.get(key), Some(value), "lookup failed for key {:?}", key);
    }
}

/// Drives a table and a reference map through a random operation sequence.
///
/// Each step performs a lookup, an insert-or-update or a removal on both maps and asserts that
/// the observable state (membership, values, size) stays identical. A full two-way equivalence
/// check runs periodically and once more at the end.
///
/// # Parameters
///
/// - `rng`: Source of operations and values.
/// - `table`: The engine under test. May already contain entries as long as `reference`
///   agrees with it.
/// - `reference`: Reference map driven through the same operations.
/// - `keys`: Key domain to draw from. Smaller domains exercise collisions and
///   update/remove paths harder.
/// - `num_ops`: Number of operations to perform.
///
/// # Panics
///
/// On the first observable divergence.
pub fn cross_check<R, K, M>(
    rng: &mut R,
    table: &mut M,
    reference: &mut StdHashMap<K, u64>,
    keys: &[K],
    num_ops: usize,
) where
    R: Rng,
    K: Eq + Hash + Clone + Debug,
    M: Map<K, u64> + ?Sized,
{
    for op_idx in 0..num_ops {
        let key = keys[rng.random_range(0..keys.len())].clone();

        match rng.random_range(0..4_u8) {
            0 => {
                assert_eq!(
                    table.get(&key),
                    reference.get(&key),
                    "lookup diverged for key {:?}",
                    key
                );
            }
            // Insertion is given twice the weight of the other operations so that the maps
            // keep growing and keep hitting the resize paths.
            1 | 2 => {
                let value = rng.random::<u64>();
                let was_in = reference.insert(key.clone(), value).is_some();
                let is_new = table.put(key.clone(), value);
                assert_ne!(
                    is_new, was_in,
                    "put reported the wrong novelty for key {:?}",
                    key
                );
                assert_eq!(
                    table.get(&key),
                    Some(&value),
                    "lookup failed right after put for key {:?}",
                    key
                );
            }
            _ => {
                let Some(del) = reference.keys().next().cloned() else {
                    continue;
                };
                reference.remove(&del);
                assert!(table.remove(&del), "remove missed present key {:?}", del);
                assert_eq!(table.get(&del), None, "key {:?} survived removal", del);
                assert!(!table.remove(&del), "second removal of key {:?} succeeded", del);
            }
        }

        assert_eq!(
            table.len(),
            reference.len(),
            "sizes diverged after {} operations",
            op_idx + 1
        );

        if op_idx % 512 == 0 {
            check_equivalent(table, reference);
        }
    }

    check_equivalent(table, reference);
}

/// Generates differential tests for a table type over a list of integer key types.
///
/// `$Map` must be constructible as `$Map::<$type, u64>::new()`. For key types narrower than
/// 32 bits the key domain is capped at half the type's range so that unique-key generation
/// terminates.
#[macro_export]
macro_rules! generate_cross_check_tests {
    ($Map:ident, $($type:ty),* $(,)?) => {
        $(
            compose_idents::compose_idents!(
                test_fn = [test_cross_check_, normalize($type)],
                {
                    #[test]
                    fn test_fn() {
                        use rand::SeedableRng;
                        use rand_chacha::ChaCha20Rng;
                        use $crate::Generate;

                        let mut rng = ChaCha20Rng::from_os_rng();

                        let num_keys: usize = if <$type>::BITS >= u32::BITS {
                            500
                        } else {
                            (1_usize << <$type>::BITS) / 2
                        };
                        let keys = <$type as Generate<ChaCha20Rng>>::generate_many(
                            &mut rng,
                            &Default::default(),
                            num_keys,
                        );

                        let mut table = $Map::<$type, u64>::new();
                        let mut reference = std::collections::HashMap::new();
                        $crate::cross_check(&mut rng, &mut table, &mut reference, &keys, 10_000);
                    }
                }
            );
        )*
    };
}
pub use generate_cross_check_tests;

/// Same as [`generate_cross_check_tests!`] but excludes the key type's default value from the
/// key domain, for engines that reserve it as the empty sentinel.
#[macro_export]
macro_rules! generate_cross_check_nonzero_tests {
    ($Map:ident, $($type:ty),* $(,)?) => {
        $(
            compose_idents::compose_idents!(
                test_fn = [test_cross_check_nonzero_, normalize($type)],
                {
                    #[test]
                    fn test_fn() {
                        use rand::SeedableRng;
                        use rand_chacha::ChaCha20Rng;
                        use $crate::Generate;

                        let mut rng = ChaCha20Rng::from_os_rng();

                        let num_keys: usize = if <$type>::BITS >= u32::BITS {
                            500
                        } else {
                            (1_usize << <$type>::BITS) / 2
                        };
                        let keys: Vec<$type> = <$type as Generate<ChaCha20Rng>>::generate_many(
                            &mut rng,
                            &Default::default(),
                            num_keys,
                        )
                        .into_vec()
                        .into_iter()
                        .filter(|key| *key != <$type>::default())
                        .collect();

                        let mut table = $Map::<$type, u64>::new();
                        let mut reference = std::collections::HashMap::new();
                        $crate::cross_check(&mut rng, &mut table, &mut reference, &keys, 10_000);
                    }
                }
            );
        )*
    };
}
pub use generate_cross_check_nonzero_tests;

/// Generates a differential test for a table type with string keys.
#[macro_export]
macro_rules! generate_cross_check_str_tests {
    ($Map:ident) => {
        #[test]
        fn test_cross_check_string() {
            use rand::SeedableRng;
            use rand_chacha::ChaCha20Rng;
            use $crate::Generate;

            let mut rng = ChaCha20Rng::from_os_rng();
            let keys = <String as Generate<ChaCha20Rng>>::generate_many(
                &mut rng,
                &Default::default(),
                500,
            );

            let mut table = $Map::<String, u64>::new();
            let mut reference = std::collections::HashMap::new();
            $crate::cross_check(&mut rng, &mut table, &mut reference, &keys, 10_000);
        }
    };
}
pub use generate_cross_check_str_tests;
