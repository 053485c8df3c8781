use bon::Builder;
use regex::Regex;
use serde_json::Value;
use strum_macros::Display;
use thiserror::Error;

/// Machine-readable validation failure codes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub enum ValidationCode {
    /// The value has the wrong type for its declared rule.
    #[strum(to_string = "TYPE_INVALID")]
    TypeInvalid,
    /// A numeric value is below the declared minimum.
    #[strum(to_string = "VALUE_UNDERFLOW")]
    ValueUnderflow,
    /// A numeric value is above the declared maximum.
    #[strum(to_string = "VALUE_OVERFLOW")]
    ValueOverflow,
    /// A string or array is shorter than the declared minimum length.
    #[strum(to_string = "LENGTH_UNDERFLOW")]
    LengthUnderflow,
    /// A string or array is longer than the declared maximum length.
    #[strum(to_string = "LENGTH_OVERFLOW")]
    LengthOverflow,
    /// A string does not match the declared pattern.
    #[strum(to_string = "PATTERN_UNMATCH")]
    PatternUnmatch,
    /// A value is not a member of the declared enumeration.
    #[strum(to_string = "ENUM_UNMATCH")]
    EnumUnmatch,
    /// A required object or field is absent.
    #[strum(to_string = "MISSING_REQUIRED")]
    MissingRequired,
    /// The rule declares a type this validator does not know.
    #[strum(to_string = "TYPE_UNKNOWN")]
    TypeUnknown,
}

/// First rule violation found while checking an argument object.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("[{code}] {message}")]
pub struct ValidationError {
    /// Machine-readable failure code.
    pub code: ValidationCode,
    /// Human-readable description of the violation.
    pub message: String,
    /// Name of the offending field, when the violation is field-scoped.
    pub field: Option<String>,
}

impl ValidationError {
    fn new(code: ValidationCode, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: field.map(str::to_string),
        }
    }
}

/// Bounds and enumeration constraints for `float` and `integer` rules.
///
/// Absent bounds disable the corresponding check. All bounds are inclusive.
#[derive(Debug, Clone, Builder)]
pub struct NumberRule {
    min: Option<f64>,
    max: Option<f64>,
    allowed: Option<Vec<f64>>,
}

/// Element-count bounds for `array` rules.
#[derive(Debug, Clone, Builder)]
pub struct LengthRule {
    min: Option<usize>,
    max: Option<usize>,
}

/// Constraints for `string` rules.
///
/// Character-length bounds and UTF-8 byte-length bounds are independent
/// checks; multi-byte characters make them diverge.
#[derive(Debug, Clone, Builder)]
pub struct StringRule {
    min_chars: Option<usize>,
    max_chars: Option<usize>,
    min_bytes: Option<usize>,
    max_bytes: Option<usize>,
    pattern: Option<Regex>,
    allowed: Option<Vec<String>>,
}

/// Type-specific constraint attached to one declared field.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Any JSON number within the declared bounds.
    Float(NumberRule),
    /// A JSON number whose fractional part is exactly zero.
    Integer(NumberRule),
    /// A strict boolean.
    Boolean,
    /// A structured (non-null, non-array) value.
    Object,
    /// A sequence with element-count bounds.
    Array(LengthRule),
    /// A string with length, byte-length, pattern and enum constraints.
    String(StringRule),
    /// A declared type name this validator does not recognise.
    ///
    /// Checking a field with an unknown type always fails with
    /// `TYPE_UNKNOWN`; this is a caller programming error surfaced the
    /// same way as a data error.
    Unknown(String),
}

/// One declared field: its constraint and whether the field is mandatory.
#[derive(Debug, Clone)]
pub struct FieldRule {
    required: bool,
    kind: RuleKind,
}

impl FieldRule {
    /// Declares an optional field.
    #[must_use]
    pub fn new(kind: RuleKind) -> Self {
        Self {
            required: false,
            kind,
        }
    }

    /// Declares a mandatory field.
    #[must_use]
    pub fn required(kind: RuleKind) -> Self {
        Self {
            required: true,
            kind,
        }
    }
}

/// Ordered per-field constraints evaluated against one argument object.
///
/// Evaluation is purely functional: each call returns its own outcome and
/// no state is retained between calls.
///
/// ```
/// use serde_json::json;
/// use switchmote::{FieldRule, NumberRule, RuleKind, RuleSet};
///
/// let rules = RuleSet::new().field(
///     "percentage",
///     FieldRule::required(RuleKind::Integer(
///         NumberRule::builder().min(0.0).max(100.0).build(),
///     )),
/// );
///
/// assert!(rules.check(Some(&json!({"percentage": 50})), true).is_ok());
/// assert!(rules.check(Some(&json!({"percentage": 101})), true).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, FieldRule)>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one declared field. Fields are checked in declaration order.
    #[must_use]
    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }

    /// Builds a rule set from a JSON declaration.
    ///
    /// The declaration is an array of field records:
    /// `[{"field": "x", "type": "integer", "required": true, "min": 0}]`.
    /// Unrecognised `type` names are preserved and fail at check time with
    /// `TYPE_UNKNOWN`. Non-numeric `min`/`max`/`minBytes`/`maxBytes` values
    /// are ignored rather than treated as zero.
    ///
    /// # Errors
    ///
    /// Returns an error when the declaration itself is malformed (not an
    /// array of objects, a missing field name, or an invalid pattern).
    pub fn from_declaration(declaration: &Value) -> Result<Self, ValidationError> {
        let Some(records) = declaration.as_array() else {
            return Err(ValidationError::new(
                ValidationCode::TypeInvalid,
                None,
                "rule declaration must be an array of field records",
            ));
        };

        let mut rules = Self::new();
        for record in records {
            let Some(attrs) = record.as_object() else {
                return Err(ValidationError::new(
                    ValidationCode::TypeInvalid,
                    None,
                    "each rule declaration record must be an object",
                ));
            };
            let Some(name) = attrs.get("field").and_then(Value::as_str) else {
                return Err(ValidationError::new(
                    ValidationCode::TypeInvalid,
                    None,
                    "rule declaration record is missing a `field` name",
                ));
            };
            let type_name = attrs.get("type").and_then(Value::as_str).unwrap_or("");
            let kind = declared_kind(name, type_name, attrs)?;
            let required = attrs.get("required").and_then(Value::as_bool).unwrap_or(false);
            rules.fields.push((
                name.to_string(),
                FieldRule {
                    required,
                    kind,
                },
            ));
        }
        Ok(rules)
    }

    /// Checks one argument object against the declared rules.
    ///
    /// Returns the first violation in declaration order; later rules are
    /// not evaluated. An absent (or null) object succeeds trivially unless
    /// `object_required` is set.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule's error with its field name attached.
    pub fn check(
        &self,
        object: Option<&Value>,
        object_required: bool,
    ) -> Result<(), ValidationError> {
        let object = match object {
            Some(value) if !value.is_null() => value,
            _ => {
                if object_required {
                    return Err(ValidationError::new(
                        ValidationCode::MissingRequired,
                        None,
                        "argument object is required but absent",
                    ));
                }
                return Ok(());
            }
        };

        let Some(map) = object.as_object() else {
            return Err(ValidationError::new(
                ValidationCode::TypeInvalid,
                None,
                "argument must be an object",
            ));
        };

        for (name, rule) in &self.fields {
            let value = match map.get(name) {
                Some(value) if !value.is_null() => value,
                _ => {
                    if rule.required {
                        return Err(ValidationError::new(
                            ValidationCode::MissingRequired,
                            Some(name),
                            format!("field `{name}` is required but absent"),
                        ));
                    }
                    continue;
                }
            };
            check_value(name, &rule.kind, value)?;
        }
        Ok(())
    }
}

fn check_value(name: &str, kind: &RuleKind, value: &Value) -> Result<(), ValidationError> {
    match kind {
        RuleKind::Float(rule) => check_number(name, rule, value, false),
        RuleKind::Integer(rule) => check_number(name, rule, value, true),
        RuleKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ValidationError::new(
                    ValidationCode::TypeInvalid,
                    Some(name),
                    format!("field `{name}` must be a boolean"),
                ))
            }
        }
        RuleKind::Object => {
            if value.is_object() {
                Ok(())
            } else {
                Err(ValidationError::new(
                    ValidationCode::TypeInvalid,
                    Some(name),
                    format!("field `{name}` must be an object"),
                ))
            }
        }
        RuleKind::Array(rule) => check_array(name, rule, value),
        RuleKind::String(rule) => check_string(name, rule, value),
        RuleKind::Unknown(type_name) => Err(ValidationError::new(
            ValidationCode::TypeUnknown,
            Some(name),
            format!("field `{name}` declares unknown type `{type_name}`"),
        )),
    }
}

fn check_number(
    name: &str,
    rule: &NumberRule,
    value: &Value,
    integral: bool,
) -> Result<(), ValidationError> {
    let Some(number) = value.as_f64() else {
        return Err(ValidationError::new(
            ValidationCode::TypeInvalid,
            Some(name),
            format!("field `{name}` must be a number"),
        ));
    };
    if integral && number.fract() != 0.0 {
        return Err(ValidationError::new(
            ValidationCode::TypeInvalid,
            Some(name),
            format!("field `{name}` must be an integer"),
        ));
    }
    if let Some(min) = rule.min
        && number < min
    {
        return Err(ValidationError::new(
            ValidationCode::ValueUnderflow,
            Some(name),
            format!("field `{name}` is below the minimum {min}"),
        ));
    }
    if let Some(max) = rule.max
        && number > max
    {
        return Err(ValidationError::new(
            ValidationCode::ValueOverflow,
            Some(name),
            format!("field `{name}` is above the maximum {max}"),
        ));
    }
    if let Some(allowed) = &rule.allowed
        && !allowed.contains(&number)
    {
        return Err(ValidationError::new(
            ValidationCode::EnumUnmatch,
            Some(name),
            format!("field `{name}` is not one of the allowed values"),
        ));
    }
    Ok(())
}

fn check_array(name: &str, rule: &LengthRule, value: &Value) -> Result<(), ValidationError> {
    let Some(items) = value.as_array() else {
        return Err(ValidationError::new(
            ValidationCode::TypeInvalid,
            Some(name),
            format!("field `{name}` must be an array"),
        ));
    };
    if let Some(min) = rule.min
        && items.len() < min
    {
        return Err(ValidationError::new(
            ValidationCode::LengthUnderflow,
            Some(name),
            format!("field `{name}` has fewer than {min} elements"),
        ));
    }
    if let Some(max) = rule.max
        && items.len() > max
    {
        return Err(ValidationError::new(
            ValidationCode::LengthOverflow,
            Some(name),
            format!("field `{name}` has more than {max} elements"),
        ));
    }
    Ok(())
}

fn check_string(name: &str, rule: &StringRule, value: &Value) -> Result<(), ValidationError> {
    let Some(text) = value.as_str() else {
        return Err(ValidationError::new(
            ValidationCode::TypeInvalid,
            Some(name),
            format!("field `{name}` must be a string"),
        ));
    };

    let char_count = text.chars().count();
    if let Some(min) = rule.min_chars
        && char_count < min
    {
        return Err(ValidationError::new(
            ValidationCode::LengthUnderflow,
            Some(name),
            format!("field `{name}` is shorter than {min} characters"),
        ));
    }
    if let Some(max) = rule.max_chars
        && char_count > max
    {
        return Err(ValidationError::new(
            ValidationCode::LengthOverflow,
            Some(name),
            format!("field `{name}` is longer than {max} characters"),
        ));
    }

    // Byte bounds are computed from the UTF-8 encoding, not char count.
    if let Some(min) = rule.min_bytes
        && text.len() < min
    {
        return Err(ValidationError::new(
            ValidationCode::LengthUnderflow,
            Some(name),
            format!("field `{name}` encodes to fewer than {min} bytes"),
        ));
    }
    if let Some(max) = rule.max_bytes
        && text.len() > max
    {
        return Err(ValidationError::new(
            ValidationCode::LengthOverflow,
            Some(name),
            format!("field `{name}` encodes to more than {max} bytes"),
        ));
    }

    if let Some(pattern) = &rule.pattern
        && !pattern.is_match(text)
    {
        return Err(ValidationError::new(
            ValidationCode::PatternUnmatch,
            Some(name),
            format!("field `{name}` does not match pattern `{pattern}`"),
        ));
    }
    if let Some(allowed) = &rule.allowed
        && !allowed.iter().any(|candidate| candidate == text)
    {
        return Err(ValidationError::new(
            ValidationCode::EnumUnmatch,
            Some(name),
            format!("field `{name}` is not one of the allowed values"),
        ));
    }
    Ok(())
}

fn declared_kind(
    name: &str,
    type_name: &str,
    attrs: &serde_json::Map<String, Value>,
) -> Result<RuleKind, ValidationError> {
    let kind = match type_name {
        "float" => RuleKind::Float(declared_number_rule(attrs)),
        "integer" => RuleKind::Integer(declared_number_rule(attrs)),
        "boolean" => RuleKind::Boolean,
        "object" => RuleKind::Object,
        "array" => RuleKind::Array(LengthRule {
            min: length_bound(attrs, "min"),
            max: length_bound(attrs, "max"),
        }),
        "string" => RuleKind::String(StringRule {
            min_chars: length_bound(attrs, "min"),
            max_chars: length_bound(attrs, "max"),
            min_bytes: length_bound(attrs, "minBytes"),
            max_bytes: length_bound(attrs, "maxBytes"),
            pattern: declared_pattern(name, attrs)?,
            allowed: attrs.get("enum").and_then(Value::as_array).map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
        }),
        other => RuleKind::Unknown(other.to_string()),
    };
    Ok(kind)
}

fn declared_number_rule(attrs: &serde_json::Map<String, Value>) -> NumberRule {
    NumberRule {
        min: attrs.get("min").and_then(Value::as_f64),
        max: attrs.get("max").and_then(Value::as_f64),
        allowed: attrs
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect()),
    }
}

fn length_bound(attrs: &serde_json::Map<String, Value>, key: &str) -> Option<usize> {
    let bound = attrs.get(key)?.as_u64()?;
    usize::try_from(bound).ok()
}

fn declared_pattern(
    name: &str,
    attrs: &serde_json::Map<String, Value>,
) -> Result<Option<Regex>, ValidationError> {
    let Some(raw) = attrs.get("pattern").and_then(Value::as_str) else {
        return Ok(None);
    };
    Regex::new(raw).map(Some).map_err(|_invalid| {
        ValidationError::new(
            ValidationCode::TypeInvalid,
            Some(name),
            format!("field `{name}` declares an invalid pattern `{raw}`"),
        )
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn percentage_rules() -> RuleSet {
        RuleSet::new().field(
            "percentage",
            FieldRule::required(RuleKind::Integer(
                NumberRule::builder().min(0.0).max(100.0).build(),
            )),
        )
    }

    #[rstest]
    #[case(json!({"percentage": 0}))]
    #[case(json!({"percentage": 50}))]
    #[case(json!({"percentage": 100}))]
    #[case(json!({"percentage": 2.0}))]
    fn integer_rule_accepts_inclusive_bounds(#[case] object: Value) {
        assert_eq!(Ok(()), percentage_rules().check(Some(&object), true));
    }

    #[rstest]
    #[case(json!({"percentage": -1}), ValidationCode::ValueUnderflow)]
    #[case(json!({"percentage": 101}), ValidationCode::ValueOverflow)]
    #[case(json!({"percentage": 2.5}), ValidationCode::TypeInvalid)]
    #[case(json!({"percentage": "50"}), ValidationCode::TypeInvalid)]
    #[case(json!({}), ValidationCode::MissingRequired)]
    fn integer_rule_rejects_with_matching_code(
        #[case] object: Value,
        #[case] expected: ValidationCode,
    ) {
        let error = percentage_rules()
            .check(Some(&object), true)
            .expect_err("violation should be rejected");
        assert_eq!(expected, error.code);
    }

    #[test]
    fn rejected_field_name_is_attached() {
        let error = percentage_rules()
            .check(Some(&json!({"percentage": 101})), true)
            .expect_err("overflow should be rejected");
        assert_eq!(Some("percentage".to_string()), error.field);
    }

    #[rstest]
    #[case(None, true, Some(ValidationCode::MissingRequired))]
    #[case(None, false, None)]
    #[case(Some(json!(null)), false, None)]
    #[case(Some(json!(42)), false, Some(ValidationCode::TypeInvalid))]
    fn object_presence_is_checked_first(
        #[case] object: Option<Value>,
        #[case] object_required: bool,
        #[case] expected: Option<ValidationCode>,
    ) {
        let outcome = percentage_rules().check(object.as_ref(), object_required);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[test]
    fn optional_field_absence_is_accepted() {
        let rules = RuleSet::new().field(
            "mode",
            FieldRule::new(RuleKind::Float(NumberRule::builder().build())),
        );
        assert_eq!(Ok(()), rules.check(Some(&json!({})), true));
    }

    #[test]
    fn first_violation_in_declaration_order_wins() {
        let rules = RuleSet::new()
            .field("first", FieldRule::required(RuleKind::Boolean))
            .field("second", FieldRule::required(RuleKind::Boolean));
        let error = rules
            .check(Some(&json!({"first": 1, "second": 2})), true)
            .expect_err("both fields violate; the first must be reported");
        assert_eq!(Some("first".to_string()), error.field);
    }

    #[rstest]
    #[case(json!({"flag": true}), None)]
    #[case(json!({"flag": false}), None)]
    #[case(json!({"flag": 1}), Some(ValidationCode::TypeInvalid))]
    #[case(json!({"flag": "true"}), Some(ValidationCode::TypeInvalid))]
    fn boolean_rule_is_strict(#[case] object: Value, #[case] expected: Option<ValidationCode>) {
        let rules = RuleSet::new().field("flag", FieldRule::required(RuleKind::Boolean));
        let outcome = rules.check(Some(&object), true);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[rstest]
    #[case(json!({"items": [1, 2]}), None)]
    #[case(json!({"items": [1]}), Some(ValidationCode::LengthUnderflow))]
    #[case(json!({"items": [1, 2, 3, 4]}), Some(ValidationCode::LengthOverflow))]
    #[case(json!({"items": {"a": 1}}), Some(ValidationCode::TypeInvalid))]
    fn array_rule_bounds_element_count(
        #[case] object: Value,
        #[case] expected: Option<ValidationCode>,
    ) {
        let rules = RuleSet::new().field(
            "items",
            FieldRule::required(RuleKind::Array(
                LengthRule::builder().min(2).max(3).build(),
            )),
        );
        let outcome = rules.check(Some(&object), true);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[rstest]
    #[case(json!({"name": "ab"}), None)]
    #[case(json!({"name": "a"}), Some(ValidationCode::LengthUnderflow))]
    #[case(json!({"name": "abcdef"}), Some(ValidationCode::LengthOverflow))]
    #[case(json!({"name": 7}), Some(ValidationCode::TypeInvalid))]
    fn string_rule_bounds_character_count(
        #[case] object: Value,
        #[case] expected: Option<ValidationCode>,
    ) {
        let rules = RuleSet::new().field(
            "name",
            FieldRule::required(RuleKind::String(
                StringRule::builder().min_chars(2).max_chars(5).build(),
            )),
        );
        let outcome = rules.check(Some(&object), true);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[test]
    fn string_byte_bound_diverges_from_character_bound() {
        // Four characters, twelve UTF-8 bytes.
        let rules = RuleSet::new().field(
            "name",
            FieldRule::required(RuleKind::String(
                StringRule::builder().max_chars(4).max_bytes(8).build(),
            )),
        );
        let error = rules
            .check(Some(&json!({"name": "ふじさん"})), true)
            .expect_err("byte bound should reject multi-byte text");
        assert_eq!(ValidationCode::LengthOverflow, error.code);
    }

    #[rstest]
    #[case("AA:BB:CC", None)]
    #[case("not-an-address", Some(ValidationCode::PatternUnmatch))]
    fn string_pattern_is_matched(#[case] text: &str, #[case] expected: Option<ValidationCode>) {
        let pattern = Regex::new("^[0-9A-F]{2}(:[0-9A-F]{2})*$").expect("test pattern is valid");
        let rules = RuleSet::new().field(
            "address",
            FieldRule::required(RuleKind::String(
                StringRule::builder().pattern(pattern).build(),
            )),
        );
        let outcome = rules.check(Some(&json!({"address": text})), true);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[rstest]
    #[case(json!({"gear": 101}), None)]
    #[case(json!({"gear": 104}), Some(ValidationCode::EnumUnmatch))]
    fn number_enum_membership_is_checked(
        #[case] object: Value,
        #[case] expected: Option<ValidationCode>,
    ) {
        let rules = RuleSet::new().field(
            "gear",
            FieldRule::required(RuleKind::Integer(
                NumberRule::builder()
                    .allowed(vec![101.0, 102.0, 103.0])
                    .build(),
            )),
        );
        let outcome = rules.check(Some(&object), true);
        assert_eq!(expected, outcome.err().map(|error| error.code));
    }

    #[test]
    fn declared_unknown_type_fails_at_check_time() {
        let declaration = json!([{"field": "speed", "type": "velocity", "required": true}]);
        let rules = RuleSet::from_declaration(&declaration)
            .expect("unknown type names are preserved, not rejected at parse");
        let error = rules
            .check(Some(&json!({"speed": 3})), true)
            .expect_err("unknown declared type must fail");
        assert_eq!(ValidationCode::TypeUnknown, error.code);
        assert_eq!(Some("speed".to_string()), error.field);
    }

    #[test]
    fn declared_non_numeric_bounds_are_ignored() {
        let declaration = json!([
            {"field": "level", "type": "integer", "min": "zero", "max": "many"}
        ]);
        let rules =
            RuleSet::from_declaration(&declaration).expect("declaration should parse cleanly");
        assert_eq!(Ok(()), rules.check(Some(&json!({"level": -40})), true));
    }

    #[test]
    fn declared_pattern_must_be_valid() {
        let declaration = json!([{"field": "name", "type": "string", "pattern": "("}]);
        let error = RuleSet::from_declaration(&declaration)
            .expect_err("invalid pattern should be rejected at parse");
        assert_matches!(
            error,
            ValidationError {
                code: ValidationCode::TypeInvalid,
                ..
            }
        );
    }

    #[test]
    fn declaration_order_is_preserved() {
        let declaration = json!([
            {"field": "zulu", "type": "boolean", "required": true},
            {"field": "alpha", "type": "boolean", "required": true}
        ]);
        let rules =
            RuleSet::from_declaration(&declaration).expect("declaration should parse cleanly");
        let error = rules
            .check(Some(&json!({})), true)
            .expect_err("missing required fields must fail");
        assert_eq!(Some("zulu".to_string()), error.field);
    }
}
