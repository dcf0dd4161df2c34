/// Registration and build validation tests

mod common;

mod register_tests {
    use super::common::*;
    use tablegraph::engine::Engine;
    use tablegraph::error::TablegraphError;
    use tablegraph::metadata::{ColumnKind, ColumnMeta, EntityMetadata};
    use tablegraph::registration::RegisterOptions;
    use tablegraph::store::Order;

    fn build_error(options: RegisterOptions) -> TablegraphError {
        let mut engine = Engine::new();
        engine.register(sample_table(), options).unwrap();
        engine.build_schema().unwrap_err()
    }

    #[test]
    fn test_register_same_table_twice() {
        let mut engine = Engine::new();
        engine.register(sample_table(), RegisterOptions::default()).unwrap();

        let err = engine
            .register(
                sample_table(),
                RegisterOptions {
                    graphql_name: Some("other".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_register_same_name_twice() {
        let container = sample_tables();
        let mut engine = Engine::new();
        let options = RegisterOptions {
            graphql_name: Some("sample".to_string()),
            ..Default::default()
        };

        engine.register(container.get(T1).unwrap(), options.clone()).unwrap();
        let err = engine.register(container.get(T2).unwrap(), options).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(engine.tables().len(), 1);
    }

    #[test]
    fn test_register_all_tables() {
        let mut container = tablegraph::metadata::MetadataContainer::new();
        container.add(sample_table());
        let mut engine = Engine::new();
        engine.register_all_tables(&container).unwrap();
        assert_eq!(engine.tables().len(), 1);

        let mut engine = Engine::new();
        engine.register_all_tables(&sample_tables()).unwrap();
        assert_eq!(engine.tables().len(), 3);
        assert_eq!(
            engine.tables().keys().collect::<Vec<_>>(),
            vec!["sample_table_1", "sample_table_2", "sample_table_3"]
        );
        engine.build_schema().unwrap();
    }

    #[test]
    fn test_default_name_and_description() {
        let mut engine = Engine::new();
        engine.register(sample_table(), RegisterOptions::default()).unwrap();

        let table = &engine.tables()["sample_table"];
        assert_eq!(table.entity.name, SAMPLE_TABLE);
        assert_eq!(table.description.as_deref(), Some(SAMPLE_TABLE));
        assert_eq!(table.root_field_name(), "sample_tables");
    }

    #[test]
    fn test_register_after_build() {
        let mut engine = Engine::new();
        engine.register(sample_table(), sample_options()).unwrap();
        engine.build_schema().unwrap();

        let err = engine
            .register(sample_tables().get(T1).unwrap(), RegisterOptions::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_without_tables() {
        assert!(Engine::new().build_schema().unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_field_reference() {
        let err = build_error(RegisterOptions {
            include_fields: Some(vec!["does_not_exist".to_string()]),
            ..Default::default()
        });
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Field does_not_exist does not exist in sample_table!"));

        for options in [
            RegisterOptions {
                exclude_fields: vec!["dne".to_string()],
                ..Default::default()
            },
            RegisterOptions {
                filter_fields: vec!["dne".to_string()],
                ..Default::default()
            },
            RegisterOptions {
                order_fields: vec!["dne".to_string()],
                ..Default::default()
            },
            RegisterOptions {
                relationships: vec!["dne".to_string()],
                ..Default::default()
            },
        ] {
            assert!(build_error(options).is_configuration());
        }
    }

    #[test]
    fn test_unfilterable_columns() {
        for field in ["bytes_field", "json_field"] {
            let err = build_error(RegisterOptions {
                filter_fields: vec![field.to_string()],
                ..Default::default()
            });
            assert!(err.to_string().contains("cannot be filtered"), "{}", err);
        }
    }

    #[test]
    fn test_default_order_must_be_orderable() {
        let err = build_error(RegisterOptions {
            order_fields: vec!["string_field".to_string()],
            default_order: [("int_field".to_string(), Order::Desc)].into_iter().collect(),
            ..Default::default()
        });
        assert!(err.is_configuration());
    }

    #[test]
    fn test_limit_bounds_validated() {
        for (default_limit, max_limit) in [(Some(0), None), (None, Some(0)), (Some(20), Some(10))] {
            let err = build_error(RegisterOptions {
                pagination: true,
                default_limit,
                max_limit,
                ..Default::default()
            });
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn test_unregistered_relationship_target() {
        let container = related_tables();
        let t1 = container.get(T1).unwrap();
        let options = related_options(&t1);

        let mut engine = Engine::new();
        engine.register(t1, options).unwrap();
        let err = engine.build_schema().unwrap_err();
        assert!(err.to_string().contains("not registered"), "{}", err);
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in ["Query", "Order", "IntFilter", "__hidden", "things_filter", "not valid"] {
            let mut engine = Engine::new();
            engine
                .register(
                    sample_table(),
                    RegisterOptions {
                        graphql_name: Some(name.to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert!(engine.build_schema().unwrap_err().is_configuration(), "{}", name);
        }
    }

    #[test]
    fn test_excluded_unsupported_column() {
        let entity = EntityMetadata::new("INTERVALS")
            .column(ColumnMeta::new("id", ColumnKind::Integer).primary_key())
            .column(ColumnMeta::new("span", ColumnKind::Other("interval".to_string())));

        let mut engine = Engine::new();
        engine
            .register(
                entity.clone(),
                RegisterOptions {
                    exclude_fields: vec!["span".to_string()],
                    ..Default::default()
                },
            )
            .unwrap();
        engine.build_schema().unwrap();

        let mut engine = Engine::new();
        engine.register(entity, RegisterOptions::default()).unwrap();
        assert!(matches!(
            engine.build_schema().unwrap_err(),
            TablegraphError::UnsupportedType(_)
        ));
    }

    #[test]
    fn test_enum_declared_twice_with_different_variants() {
        let other = EntityMetadata::new("OTHER")
            .column(ColumnMeta::new("id", ColumnKind::Integer).primary_key())
            .column(ColumnMeta::new(
                "parity",
                ColumnKind::enumeration(tablegraph::metadata::EnumType::new(
                    "SampleEnum",
                    ["ODD", "EVEN", "NEITHER"],
                )),
            ));

        let mut engine = Engine::new();
        engine.register(sample_table(), RegisterOptions::default()).unwrap();
        engine.register(other, RegisterOptions::default()).unwrap();
        assert!(engine.build_schema().unwrap_err().is_configuration());
    }
}
