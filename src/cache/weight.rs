use serde_json::Value;

//
// CacheWeight
//

/// Cache weight.
pub trait CacheWeight {
    /// Cache weight as a byte count.
    ///
    /// It is *not* the amount of memory used, but rather an indicator of
    /// *potential* storage requirements.
    ///
    /// Its intended use is for apples-to-apples comparisons, e.g. to find out
    /// which of two items of the same type weighs more, and for bounding the
    /// total weight of a cache. Sums of weights can be misleading in terms of
    /// memory use because values may share memory via [Arc](std::sync::Arc).
    fn cache_weight(&self) -> usize;
}

impl CacheWeight for Value {
    fn cache_weight(&self) -> usize {
        const SELF_SIZE: usize = size_of::<Value>();

        SELF_SIZE
            + match self {
                Value::String(string) => string.len(),

                Value::Array(items) => items.iter().map(CacheWeight::cache_weight).sum(),

                Value::Object(fields) => fields
                    .iter()
                    .map(|(key, value)| key.len() + value.cache_weight())
                    .sum(),

                _ => 0,
            }
    }
}
