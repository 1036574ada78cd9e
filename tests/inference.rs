use proptest::prelude::*;
use sheet_entry::normalize::{is_numeric, normalize_number};
use sheet_entry::rule::{DuplicatePolicy, NumericFormat, RuleSet, ValueType, infer_rule};
use sheet_entry::value::CellValue;
use tempfile::tempdir;

#[test]
fn price_headers_are_decimal_numeric() {
    for header in ["Price", "Unit Price", "price_per_kg", "RETAIL PRICE"] {
        let rule = infer_rule(header);
        assert_eq!(rule.value_type, ValueType::Numeric, "{header}");
        assert_eq!(rule.numeric_format, Some(NumericFormat::Decimal), "{header}");
    }
}

#[test]
fn integer_keywords_give_integer_format() {
    for header in ["Qty", "Quantity", "Item Count", "Age", "Order Number"] {
        let rule = infer_rule(header);
        assert_eq!(rule.value_type, ValueType::Numeric, "{header}");
        assert_eq!(rule.numeric_format, Some(NumericFormat::Integer), "{header}");
    }
}

#[test]
fn optional_headers_are_not_required_regardless_of_type() {
    for header in ["Middle Name (optional)", "optional date", "Amount [optional]"] {
        assert!(!infer_rule(header).required, "{header}");
    }
}

#[test]
fn id_headers_are_strict_and_optional() {
    for header in ["ID", "Employee ID", "Invoice Id", "Product Code"] {
        let rule = infer_rule(header);
        assert_eq!(rule.duplicate_policy, DuplicatePolicy::Strict, "{header}");
        assert!(!rule.required, "{header}");
    }
}

#[test]
fn plain_headers_default_to_required_text() {
    let rule = infer_rule("City");
    assert_eq!(rule.value_type, ValueType::Text);
    assert!(rule.required);
    assert_eq!(rule.duplicate_policy, DuplicatePolicy::None);
    assert_eq!(rule.numeric_format, None);
}

#[test]
fn ruleset_round_trips_through_yaml() {
    let headers = vec![
        "Employee ID".to_string(),
        "Full Name".to_string(),
        "Email".to_string(),
        "Salary Amount".to_string(),
        "Start Date".to_string(),
        "Notes".to_string(),
    ];
    let mut rules = RuleSet::infer(&headers);
    rules.set_duplicate_policy(2, DuplicatePolicy::Warn).unwrap();
    rules.set_required(6, true).unwrap();

    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("rules.yaml");
    rules.save(&path).expect("save rules");
    let loaded = RuleSet::load(&path).expect("load rules");
    assert_eq!(loaded, rules);
    loaded.ensure_matches(&headers).expect("headers still match");
}

#[test]
fn load_rejects_rules_file_with_bad_positions() {
    // Hand-edited rules files can drift; a zero or shuffled position would
    // otherwise send the validator indexing the wrong field.
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("rules.yaml");
    let yaml = "\
columns:
- name: Name
  position: 0
  value_type: Text
  required: true
  duplicate_policy: None
";
    std::fs::write(&path, yaml).expect("write rules");
    let err = RuleSet::load(&path).expect_err("position 0 must be rejected");
    assert!(err.to_string().contains("position 0"), "{err}");

    let yaml = "\
columns:
- name: Name
  position: 2
  value_type: Text
  required: true
  duplicate_policy: None
- name: Email
  position: 1
  value_type: Email
  required: true
  duplicate_policy: None
";
    std::fs::write(&path, yaml).expect("write rules");
    assert!(RuleSet::load(&path).is_err());
}

proptest! {
    #[test]
    fn any_header_containing_price_is_decimal(prefix in "[a-z ]{0,8}", suffix in "[a-z ]{0,8}") {
        let header = format!("{prefix}price{suffix}");
        let rule = infer_rule(&header);
        prop_assert_eq!(rule.value_type, ValueType::Numeric);
        prop_assert_eq!(rule.numeric_format, Some(NumericFormat::Decimal));
    }

    #[test]
    fn inference_is_deterministic(header in "\\PC{0,24}") {
        prop_assert_eq!(infer_rule(&header), infer_rule(&header));
        infer_rule(&header).ensure_valid().unwrap();
    }

    #[test]
    fn integer_normalization_round_trips_through_display(n in -1_000_000i64..1_000_000) {
        let text = n.to_string();
        prop_assert!(is_numeric(&text));
        let value = normalize_number(&text, Some(NumericFormat::Integer)).unwrap();
        prop_assert_eq!(&value, &CellValue::Integer(n));
        // Re-parsing the display projection lands on the same value.
        let again = normalize_number(&value.as_display(), Some(NumericFormat::Integer)).unwrap();
        prop_assert_eq!(again, value);
    }

    #[test]
    fn decimal_normalization_is_stable_after_rounding(cents in -100_000_000i64..100_000_000) {
        // Any value with at most 2 fractional digits survives unchanged.
        let text = format!("{}.{:02}", cents / 100, (cents % 100).abs());
        prop_assert!(is_numeric(&text));
        let value = normalize_number(&text, Some(NumericFormat::Decimal)).unwrap();
        let again = normalize_number(&value.as_display(), Some(NumericFormat::Decimal)).unwrap();
        prop_assert_eq!(again, value);
    }
}
