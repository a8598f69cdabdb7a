use figure_kit::core::{merge_into, merged_dict};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-d]{1,2}", inner, 0..4)
            .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
    })
}

fn object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-d]{1,2}", nested(), 0..5)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn merge_leaves_inputs_untouched(base in object(), overrides in object()) {
        let (base_value, override_value) = (Value::Object(base.clone()), Value::Object(overrides.clone()));
        let _ = merged_dict(&base_value, &override_value);
        prop_assert_eq!(base_value, Value::Object(base));
        prop_assert_eq!(override_value, Value::Object(overrides));
    }

    #[test]
    fn merge_of_disjoint_maps_is_union(base in object(), overrides in object()) {
        let overrides: Map<String, Value> = overrides
            .into_iter()
            .map(|(key, value)| (format!("z{key}"), value))
            .collect();
        let merged = merged_dict(&Value::Object(base.clone()), &Value::Object(overrides.clone()));
        let merged = merged.as_object().expect("object");

        prop_assert_eq!(merged.len(), base.len() + overrides.len());
        for (key, value) in base.iter().chain(overrides.iter()) {
            prop_assert_eq!(merged.get(key), Some(value));
        }
    }

    #[test]
    fn override_wins_on_non_object_values(base in object(), overrides in object()) {
        let merged = merged_dict(&Value::Object(base.clone()), &Value::Object(overrides.clone()));
        for (key, value) in &overrides {
            let both_objects = value.is_object() && base.get(key).is_some_and(Value::is_object);
            if !both_objects {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        for (key, value) in &base {
            if !overrides.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
    }

    #[test]
    fn in_place_merge_matches_copying_merge(base in object(), overrides in object()) {
        let overrides = Value::Object(overrides);
        let expected = merged_dict(&Value::Object(base.clone()), &overrides);
        let mut in_place = Value::Object(base);
        merge_into(&mut in_place, &overrides);
        prop_assert_eq!(in_place, expected);
    }

    #[test]
    fn merging_twice_is_idempotent(base in object(), overrides in object()) {
        let overrides = Value::Object(overrides);
        let once = merged_dict(&Value::Object(base), &overrides);
        let twice = merged_dict(&once, &overrides);
        prop_assert_eq!(once, twice);
    }
}
