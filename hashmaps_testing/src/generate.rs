//! Data generation utilities useful for testing and benchmarking.
use rand::distr::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use std::hash::Hash;

/// Provides capabilities to generate random values of the implementer-type.
pub trait Generate<R: Rng>: Sized {
    /// Parameters for data-generation specific for the type.
    type GenerateParams: Default;

    /// Generates a single random value of the type.
    fn generate(rng: &mut R, params: &Self::GenerateParams) -> Self;

    /// Generates a slice of **unique** random values of the type.
    fn generate_many(rng: &mut R, params: &Self::GenerateParams, size: usize) -> Box<[Self]>
    where
        Self: Hash + Eq,
    {
        let mut seen = HashSet::new();
        while seen.len() < size {
            seen.insert(Self::generate(rng, params));
        }
        seen.into_iter().collect()
    }
}

/// Parameters for [`Generate`] implementations that generate numeric values.
pub struct NumParams<T> {
    min: T,
    max: T,
}

impl<T> NumParams<T> {
    /// Creates a new instance of [`NumParams`] with the specified minimum and maximum values.
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

macro_rules! impl_generate_num {
    ($($type:ty),*) => {
        $(
            impl Default for NumParams<$type> {
                fn default() -> Self {
                    Self { min: <$type>::MIN, max: <$type>::MAX }
                }
            }

            impl<R: Rng> Generate<R> for $type
            {
                type GenerateParams = NumParams<$type>;

                fn generate(rng: &mut R, params: &Self::GenerateParams) -> Self {
                    rng.random_range(params.min..=params.max)
                }
            }
        )*
    };
}

impl_generate_num!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize);

/// Parameters for [`Generate`] implementations that generate strings.
pub struct StringParams {
    min_length: usize,
    max_length: usize,
}

impl StringParams {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }
}

impl Default for StringParams {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 64,
        }
    }
}

impl<R: Rng> Generate<R> for String {
    type GenerateParams = StringParams;

    fn generate(rng: &mut R, params: &Self::GenerateParams) -> Self {
        let length = rng.random_range(params.min_length..=params.max_length);
        let iter = rng.sample_iter(&Alphanumeric);
        iter.take(length).map(char::from).collect()
    }
}
