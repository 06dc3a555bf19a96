//! Macros for reducing boilerplate when defining records
//!
//! Every CRM collection is a flat camelCase document with the same identity
//! columns, so the struct and its trait implementations are generated here.

/// Define a record type with its `Entity` and `Record` implementations
///
/// The generated struct carries `id`, `created_at` and `updated_at` plus the
/// listed fields, serializes as camelCase and tolerates missing keys.
/// Field attributes pass through, which is how lenient parsers are attached.
///
/// # Example
///
/// ```rust,ignore
/// impl_record!(
///     Memo,
///     "memo",
///     "memos",
///     label: "Memos",
///     path: "/memos",
///     text: ["title"],
///     numeric: ["words"],
///     dates: ["due"],
///     {
///         title: String,
///         #[serde(deserialize_with = "crate::core::field::lenient::number")]
///         words: f64,
///         #[serde(deserialize_with = "crate::core::field::lenient::date")]
///         due: Option<DateValue>,
///     },
///     refresh: Memo::recount
/// );
/// ```
#[macro_export]
macro_rules! impl_record {
    (
        $(#[$type_meta:meta])*
        $type:ident,
        $singular:expr,
        $plural:expr,
        label: $label:expr,
        path: $path:expr,
        text: [ $( $text_field:expr ),* $(,)? ],
        numeric: [ $( $numeric_field:expr ),* $(,)? ],
        dates: [ $( $date_field:expr ),* $(,)? ],
        {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $field_type:ty
            ),* $(,)?
        }
        $(, refresh: $refresh:path )?
        $(,)?
    ) => {
        $(#[$type_meta])*
        #[derive(Debug, Clone, PartialEq, Default, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        pub struct $type {
            /// Unique identifier for this record
            pub id: ::uuid::Uuid,

            /// When this record was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this record was last updated
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            $(
                $(#[$field_meta])*
                pub $field : $field_type,
            )*
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }

        impl $crate::core::entity::Record for $type {
            fn label() -> &'static str {
                $label
            }

            fn ui_path() -> &'static str {
                $path
            }

            fn text_fields() -> &'static [&'static str] {
                &[ $( $text_field ),* ]
            }

            fn numeric_fields() -> &'static [&'static str] {
                &[ $( $numeric_field ),* ]
            }

            fn date_fields() -> &'static [&'static str] {
                &[ $( $date_field ),* ]
            }

            $(
                fn refresh(&mut self) {
                    $refresh(self)
                }
            )?
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::entity::{Entity, Record};
    use crate::core::field::DateValue;
    use serde_json::json;

    impl_record!(
        Memo,
        "memo",
        "memos",
        label: "Memos",
        path: "/memos",
        text: ["title"],
        numeric: ["words"],
        dates: ["due"],
        {
            title: String,
            #[serde(deserialize_with = "crate::core::field::lenient::number")]
            words: f64,
            #[serde(deserialize_with = "crate::core::field::lenient::date")]
            due: Option<DateValue>,
        }
    );

    impl_record!(
        Tally,
        "tally",
        "tallies",
        label: "Tallies",
        path: "/tallies",
        text: [],
        numeric: ["left", "right", "sum"],
        dates: [],
        {
            #[serde(deserialize_with = "crate::core::field::lenient::number")]
            left: f64,
            #[serde(deserialize_with = "crate::core::field::lenient::number")]
            right: f64,
            sum: f64,
        },
        refresh: Tally::add
    );

    impl Tally {
        fn add(&mut self) {
            self.sum = self.left + self.right;
        }
    }

    #[test]
    fn test_generated_metadata() {
        assert_eq!(Memo::resource_name(), "memos");
        assert_eq!(Memo::resource_name_singular(), "memo");
        assert_eq!(Memo::label(), "Memos");
        assert_eq!(Memo::text_fields(), &["title"]);
        assert_eq!(Tally::resource_name(), "tallies");
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let memo = Memo::from_payload(json!({"title": "Call", "words": "12"})).unwrap();
        let doc = memo.to_document().unwrap();
        assert!(doc.get("createdAt").is_some());
        assert_eq!(doc["words"], 12.0);
        assert!(doc["due"].is_null());
    }

    #[test]
    fn test_refresh_hook_runs_on_create_and_merge() {
        let tally = Tally::from_payload(json!({"left": 2, "right": "3", "sum": 99})).unwrap();
        assert_eq!(tally.sum, 5.0);

        let tally = tally.merge(json!({"left": 10})).unwrap();
        assert_eq!(tally.sum, 13.0);
    }
}
