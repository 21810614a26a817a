//! Deterministic cache key derivation.

use crate::constants::cache_keys::{ARGUMENT_SEPARATOR, IDENTITY_SEPARATOR, NULL_SENTINEL};
use crate::models::{Arguments, MethodIdentity};
use serde_json::Value;

/// Renders `Type.name(params)_arg1|arg2|...`.
///
/// Arguments are rendered as compact JSON, so strings keep their quotes and
/// escapes and cannot collide with numbers, other strings containing the
/// separator, or the null sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    pub fn key(identity: &MethodIdentity, arguments: &Arguments) -> String {
        let mut key = identity.to_string();
        key.push(IDENTITY_SEPARATOR);

        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                key.push(ARGUMENT_SEPARATOR);
            }
            key.push_str(&Self::render(argument.value()));
        }

        key
    }

    fn render(value: &Value) -> String {
        match value {
            Value::Null => NULL_SENTINEL.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> MethodIdentity {
        MethodIdentity::new("Catalog", "search").params(["String", "Option<u32>"])
    }

    #[test]
    fn test_key_is_deterministic() {
        let args = Arguments::from_values(vec![json!("shoes"), json!(10)]);
        assert_eq!(
            CacheKeyGenerator::key(&identity(), &args),
            CacheKeyGenerator::key(&identity(), &args.clone())
        );
        assert_eq!(
            CacheKeyGenerator::key(&identity(), &args),
            r#"Catalog.search(String, Option<u32>)_"shoes"|10"#
        );
    }

    #[test]
    fn test_null_is_not_the_empty_string() {
        let null = Arguments::from_values(vec![Value::Null]);
        let empty = Arguments::from_values(vec![json!("")]);
        let none = Arguments::new();

        let keys = [
            CacheKeyGenerator::key(&identity(), &null),
            CacheKeyGenerator::key(&identity(), &empty),
            CacheKeyGenerator::key(&identity(), &none),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
        assert!(keys[0].ends_with(NULL_SENTINEL));
    }

    #[test]
    fn test_argument_order_matters() {
        let ab = Arguments::from_values(vec![json!("a"), json!("b")]);
        let ba = Arguments::from_values(vec![json!("b"), json!("a")]);
        assert_ne!(
            CacheKeyGenerator::key(&identity(), &ab),
            CacheKeyGenerator::key(&identity(), &ba)
        );
    }

    #[test]
    fn test_separator_inside_string_does_not_collide() {
        let joined = Arguments::from_values(vec![json!("a|b")]);
        let split = Arguments::from_values(vec![json!("a"), json!("b")]);
        assert_ne!(
            CacheKeyGenerator::key(&identity(), &joined),
            CacheKeyGenerator::key(&identity(), &split)
        );
    }
}
