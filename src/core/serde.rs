/// Serde helper functions for `skip_serializing_if`
use std::collections::BTreeMap;

/// Skip serializing if Option is None
pub fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Skip serializing if Vec is empty
pub fn is_empty_vec<T>(value: &Vec<T>) -> bool {
    value.is_empty()
}

/// Skip serializing if map is empty
pub fn is_empty_map<K, V>(value: &BTreeMap<K, V>) -> bool {
    value.is_empty()
}

/// Skip serializing if value is zero
pub fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

/// Skip serializing if value is zero
pub fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}
