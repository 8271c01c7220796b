use super::*;

#[test]
fn test_synonyms_map_to_one_tag() {
    assert_eq!(TypeTag::from(&DataType::Tuple), TypeTag::Struct);
    assert_eq!(TypeTag::from(&DataType::Array), TypeTag::List);
    assert_eq!(
        TypeTag::from(&DataType::DoublePrecision),
        TypeTag::from(&DataType::Float64)
    );
    assert_eq!(
        TypeTag::from(&DataType::Numeric {
            precision: Some(5),
            scale: Some(2)
        }),
        TypeTag::Decimal {
            precision: Some(5),
            scale: Some(2)
        }
    );
}

#[test]
fn test_display_names() {
    assert_eq!(
        TypeTag::from(&DataType::Varchar { length: Some(20) }).to_string(),
        "VARCHAR(20)"
    );
    assert_eq!(
        TypeTag::from(&DataType::TimestampWithTz { precision: Some(3) }).to_string(),
        "TIMESTAMP(3) WITH TIME ZONE"
    );
    assert_eq!(TypeTag::from(&DataType::Int8).to_string(), "BIGINT");
}

#[test]
fn test_predicates() {
    assert!(TypeTag::Int.is_numeric());
    assert!(TypeTag::Symbol.is_text());
    assert!(!TypeTag::Date.is_numeric());
    assert_eq!(PlanType::default(), PlanType::Dynamic);
}
