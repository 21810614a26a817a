use interceptor_core::models::MethodIdentity;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating identifier-like names
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,31}"
}

/// Strategy for generating method identities with up to three parameters
pub fn method_identity_strategy() -> impl Strategy<Value = MethodIdentity> {
    (
        identifier_strategy(),
        identifier_strategy(),
        prop::collection::vec(identifier_strategy(), 0..3),
    )
        .prop_map(|(declaring_type, name, params)| {
            MethodIdentity::new(declaring_type, name).params(params)
        })
}

/// Strategy for generating scalar and nested JSON argument values,
/// including strings that contain the key separators
pub fn argument_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z|_<>\"]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for generating positional argument lists
pub fn argument_list_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(argument_value_strategy(), 0..5)
}
