use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for primary key types.
pub trait ModelKey:
    Clone + Eq + Ord + Hash + Display + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// True for the null-equivalent value of the key type. Such keys never
    /// identify a persisted row.
    fn is_null(&self) -> bool;
}

impl ModelKey for String {
    fn is_null(&self) -> bool {
        self.trim().is_empty()
    }
}

macro_rules! integer_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ModelKey for $ty {
                fn is_null(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

integer_keys!(u16, u32, u64, u128, i16, i32, i64, i128, usize);
