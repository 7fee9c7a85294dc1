//! Property-based tests for identifier parsing.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{ObjectRef, TypeRestriction, UserRef};

    /// Strategy to generate valid object identifiers in type:id format
    fn object_strategy() -> impl Strategy<Value = (String, String)> {
        ("[a-z][a-z_]{0,9}", "[a-zA-Z0-9_.:-]{1,20}")
            .prop_filter("id must not be a wildcard", |(_, id)| id != "*")
    }

    /// Strategy to generate valid relation names
    fn relation_strategy() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,12}"
    }

    proptest! {
        #[test]
        fn test_object_parse_display_agree((object_type, object_id) in object_strategy()) {
            let input = format!("{object_type}:{object_id}");
            let parsed = ObjectRef::parse(&input);
            prop_assert!(parsed.is_ok(), "Failed for object: {}", input);
            let obj = parsed.unwrap();
            prop_assert_eq!(&obj.object_type, &object_type);
            prop_assert_eq!(&obj.object_id, &object_id);
            prop_assert_eq!(obj.to_string(), input);
        }

        #[test]
        fn test_direct_user_parses_as_direct((user_type, user_id) in object_strategy()) {
            let input = format!("{user_type}:{user_id}");
            let user = UserRef::parse(&input).unwrap();
            prop_assert_eq!(&user, &UserRef::direct(user_type, user_id));
            prop_assert_eq!(user.to_string(), input);
        }

        #[test]
        fn test_userset_reference_parses_as_userset(
            (object_type, object_id) in object_strategy(),
            relation in relation_strategy()
        ) {
            let input = format!("{object_type}:{object_id}#{relation}");
            let user = UserRef::parse(&input).unwrap();
            prop_assert!(user.is_userset());
            prop_assert_eq!(user.user_type(), object_type.as_str());
            prop_assert_eq!(user.to_string(), input);
        }

        #[test]
        fn test_wildcard_parses_as_wildcard(user_type in "[a-z][a-z_]{0,9}") {
            let user = UserRef::parse(&format!("{user_type}:*")).unwrap();
            prop_assert_eq!(user, UserRef::wildcard(user_type));
        }

        #[test]
        fn test_user_without_colon_is_invalid(s in "[a-z]{1,20}") {
            prop_assert!(UserRef::parse(&s).is_err(), "Should reject: {}", s);
            prop_assert!(ObjectRef::parse(&s).is_err(), "Should reject: {}", s);
        }

        #[test]
        fn test_whitespace_is_rejected(
            (object_type, object_id) in object_strategy(),
            ws in "[ \t\n]"
        ) {
            let input = format!("{object_type}:{object_id}{ws}");
            prop_assert!(ObjectRef::parse(&input).is_err());
            prop_assert!(UserRef::parse(&input).is_err());
        }

        #[test]
        fn test_type_restriction_display_agrees(
            type_name in "[a-z][a-z_]{0,9}",
            relation in proptest::option::of(relation_strategy()),
            wildcard in any::<bool>()
        ) {
            let input = match (&relation, wildcard) {
                (Some(relation), _) => format!("{type_name}#{relation}"),
                (None, true) => format!("{type_name}:*"),
                (None, false) => type_name.clone(),
            };
            let restriction = TypeRestriction::parse(&input).unwrap();
            prop_assert_eq!(restriction.type_name(), type_name.as_str());
            prop_assert_eq!(restriction.to_string(), input);
        }
    }
}
