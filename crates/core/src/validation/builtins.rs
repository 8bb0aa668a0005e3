//! Built-in rule catalog.
//!
//! Each rule compiles its declared arguments eagerly ([`Builtin::compile`]),
//! so malformed configuration surfaces when the model is defined, and
//! evaluates as a pure predicate over one attribute value
//! ([`Builtin::eval`]).

use std::borrow::Cow;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use uuid::Uuid;
use validator::{ValidateCreditCard, ValidateEmail, ValidateUrl};

static ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid regex"));
static ALPHANUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("valid regex"));
static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:0|[1-9][0-9]*)$").expect("valid regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]*\.?[0-9]+$").expect("valid regex"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?$").expect("valid regex"));

/// All built-in rule names, as written in validation maps.
pub(crate) const BUILTIN_NAMES: &[&str] = &[
    "is",
    "not",
    "regex",
    "notRegex",
    "isEmail",
    "isUrl",
    "isIP",
    "isIPv6",
    "isAlpha",
    "isAlphanumeric",
    "isNumeric",
    "isInt",
    "isLowercase",
    "isUppercase",
    "isDecimal",
    "isFloat",
    "isDate",
    "isCreditCard",
    "isArray",
    "notNull",
    "isNull",
    "notEmpty",
    "equals",
    "contains",
    "notContains",
    "len",
    "isUUID",
    "isAfter",
    "isBefore",
    "isIn",
    "notIn",
    "max",
    "min",
];

/// A built-in rule compiled against its declared arguments.
#[derive(Debug, Clone)]
pub(crate) enum Builtin {
    Is(Regex),
    Not(Regex),
    IsEmail,
    IsUrl,
    IsIp,
    IsIpv6,
    IsAlpha,
    IsAlphanumeric,
    IsNumeric,
    IsInt,
    IsLowercase,
    IsUppercase,
    IsDecimal,
    IsFloat,
    IsDate,
    IsCreditCard,
    IsArray,
    NotNull,
    IsNull,
    NotEmpty,
    Equals(Value),
    Contains(String),
    NotContains(String),
    Len { min: usize, max: usize },
    IsUuid(usize),
    IsAfter(NaiveDateTime),
    IsBefore(NaiveDateTime),
    IsIn(Membership),
    NotIn(Membership),
    Max(f64),
    Min(f64),
}

/// Argument shape for `isIn` / `notIn`: a haystack string (substring
/// membership) or an explicit allow-list (whole-value membership).
#[derive(Debug, Clone)]
pub(crate) enum Membership {
    Substring(String),
    OneOf(Vec<Value>),
}

impl Builtin {
    /// Compile a rule by name against its positional arguments.
    ///
    /// Returns `None` for names that are not built-in rules, and
    /// `Some(Err(reason))` when the arguments do not fit the rule.
    pub(crate) fn compile(name: &str, args: &[Value]) -> Option<Result<Builtin, String>> {
        let compiled = match name {
            "is" | "regex" => compile_regex(args).map(Builtin::Is),
            "not" | "notRegex" => compile_regex(args).map(Builtin::Not),
            "isEmail" => no_args(args).map(|()| Builtin::IsEmail),
            "isUrl" => no_args(args).map(|()| Builtin::IsUrl),
            "isIP" => no_args(args).map(|()| Builtin::IsIp),
            "isIPv6" => no_args(args).map(|()| Builtin::IsIpv6),
            "isAlpha" => no_args(args).map(|()| Builtin::IsAlpha),
            "isAlphanumeric" => no_args(args).map(|()| Builtin::IsAlphanumeric),
            "isNumeric" => no_args(args).map(|()| Builtin::IsNumeric),
            "isInt" => no_args(args).map(|()| Builtin::IsInt),
            "isLowercase" => no_args(args).map(|()| Builtin::IsLowercase),
            "isUppercase" => no_args(args).map(|()| Builtin::IsUppercase),
            "isDecimal" => no_args(args).map(|()| Builtin::IsDecimal),
            "isFloat" => no_args(args).map(|()| Builtin::IsFloat),
            "isDate" => no_args(args).map(|()| Builtin::IsDate),
            "isCreditCard" => no_args(args).map(|()| Builtin::IsCreditCard),
            "isArray" => no_args(args).map(|()| Builtin::IsArray),
            "notNull" => no_args(args).map(|()| Builtin::NotNull),
            "isNull" => no_args(args).map(|()| Builtin::IsNull),
            "notEmpty" => no_args(args).map(|()| Builtin::NotEmpty),
            "equals" => one_arg(args).map(|v| Builtin::Equals(v.clone())),
            "contains" => string_arg(args).map(Builtin::Contains),
            "notContains" => string_arg(args).map(Builtin::NotContains),
            "len" => compile_len(args),
            "isUUID" => compile_uuid_version(args),
            "isAfter" => date_arg(args).map(Builtin::IsAfter),
            "isBefore" => date_arg(args).map(Builtin::IsBefore),
            "isIn" => membership_arg(args).map(Builtin::IsIn),
            "notIn" => membership_arg(args).map(Builtin::NotIn),
            "max" => numeric_arg(args).map(Builtin::Max),
            "min" => numeric_arg(args).map(Builtin::Min),
            _ => return None,
        };
        Some(compiled)
    }

    /// Evaluate the compiled rule against one attribute value.
    pub(crate) fn eval(&self, value: &Value) -> bool {
        match self {
            Builtin::Is(re) => matches_pattern(value, re),
            Builtin::Not(re) => !matches_pattern(value, re),
            Builtin::IsEmail => {
                string_form(value).is_some_and(|s| (&*s).validate_email())
            }
            Builtin::IsUrl => string_form(value).is_some_and(|s| (&*s).validate_url()),
            Builtin::IsIp => {
                string_form(value).is_some_and(|s| s.parse::<IpAddr>().is_ok())
            }
            Builtin::IsIpv6 => {
                string_form(value).is_some_and(|s| s.parse::<Ipv6Addr>().is_ok())
            }
            Builtin::IsAlpha => matches_pattern(value, &ALPHA_RE),
            Builtin::IsAlphanumeric => matches_pattern(value, &ALPHANUMERIC_RE),
            Builtin::IsNumeric => matches_pattern(value, &NUMERIC_RE),
            Builtin::IsInt => matches_pattern(value, &INT_RE),
            Builtin::IsLowercase => string_form(value).is_some_and(|s| {
                let s: &str = &s;
                s == s.to_lowercase()
            }),
            Builtin::IsUppercase => string_form(value).is_some_and(|s| {
                let s: &str = &s;
                s == s.to_uppercase()
            }),
            Builtin::IsDecimal => matches_pattern(value, &DECIMAL_RE),
            Builtin::IsFloat => matches_pattern(value, &FLOAT_RE),
            Builtin::IsDate => string_form(value).is_some_and(|s| parse_date(&s).is_some()),
            Builtin::IsCreditCard => {
                string_form(value).is_some_and(|s| (&*s).validate_credit_card())
            }
            Builtin::IsArray => value.is_array(),
            Builtin::NotNull => !value.is_null(),
            Builtin::IsNull => value.is_null(),
            Builtin::NotEmpty => string_form(value).is_some_and(|s| !s.trim().is_empty()),
            Builtin::Equals(expected) => value == expected,
            Builtin::Contains(needle) => {
                string_form(value).is_some_and(|s| s.contains(needle.as_str()))
            }
            Builtin::NotContains(needle) => {
                !string_form(value).is_some_and(|s| s.contains(needle.as_str()))
            }
            Builtin::Len { min, max } => {
                length_form(value).is_some_and(|n| n >= *min && n <= *max)
            }
            Builtin::IsUuid(version) => string_form(value).is_some_and(|s| {
                Uuid::parse_str(&s).is_ok_and(|u| u.get_version_num() == *version)
            }),
            // Boundary dates pass both directions: "after" means not before.
            Builtin::IsAfter(bound) => date_form(value).is_some_and(|d| d >= *bound),
            Builtin::IsBefore(bound) => date_form(value).is_some_and(|d| d <= *bound),
            Builtin::IsIn(membership) => is_member(value, membership),
            Builtin::NotIn(membership) => !is_member(value, membership),
            Builtin::Max(limit) => numeric_form(value).is_some_and(|n| n <= *limit),
            Builtin::Min(limit) => numeric_form(value).is_some_and(|n| n >= *limit),
        }
    }
}

/* --------------------------------------------------------------------------
   Value coercion
   -------------------------------------------------------------------------- */

/// String form of a scalar value. Arrays, objects, and null have none, so
/// string-shaped rules fail on them (and their negations pass vacuously).
fn string_form(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Numeric form: a JSON number, or a string that parses as one.
fn numeric_form(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Length for `len`: element count for arrays, character count otherwise.
fn length_form(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        _ => string_form(value).map(|s| s.chars().count()),
    }
}

fn date_form(value: &Value) -> Option<NaiveDateTime> {
    string_form(value).and_then(|s| parse_date(&s))
}

/// Lenient date parsing: RFC 3339, common datetime layouts, then bare dates.
fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn matches_pattern(value: &Value, re: &Regex) -> bool {
    string_form(value).is_some_and(|s| re.is_match(&s))
}

fn is_member(value: &Value, membership: &Membership) -> bool {
    match membership {
        Membership::Substring(haystack) => {
            string_form(value).is_some_and(|s| haystack.contains(&*s))
        }
        Membership::OneOf(allowed) => allowed.contains(value),
    }
}

/* --------------------------------------------------------------------------
   Argument compilation
   -------------------------------------------------------------------------- */

fn no_args(args: &[Value]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no arguments, got {}", args.len()))
    }
}

fn one_arg(args: &[Value]) -> Result<&Value, String> {
    match args {
        [single] => Ok(single),
        _ => Err(format!("expected exactly one argument, got {}", args.len())),
    }
}

fn string_arg(args: &[Value]) -> Result<String, String> {
    one_arg(args)?
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| "argument must be a string".to_string())
}

fn numeric_arg(args: &[Value]) -> Result<f64, String> {
    numeric_form(one_arg(args)?).ok_or_else(|| "argument must be numeric".to_string())
}

fn date_arg(args: &[Value]) -> Result<NaiveDateTime, String> {
    let raw = one_arg(args)?
        .as_str()
        .ok_or_else(|| "argument must be a date string".to_string())?;
    parse_date(raw).ok_or_else(|| format!("`{raw}` is not a recognized date"))
}

fn membership_arg(args: &[Value]) -> Result<Membership, String> {
    match one_arg(args)? {
        Value::String(haystack) => Ok(Membership::Substring(haystack.clone())),
        Value::Array(allowed) => Ok(Membership::OneOf(allowed.clone())),
        _ => Err("argument must be a string or an array".to_string()),
    }
}

fn compile_regex(args: &[Value]) -> Result<Regex, String> {
    if args.is_empty() || args.len() > 2 {
        return Err(format!(
            "expected [pattern] or [pattern, flags], got {} arguments",
            args.len()
        ));
    }
    let pattern = args[0]
        .as_str()
        .ok_or_else(|| "pattern must be a string".to_string())?;
    let mut builder = RegexBuilder::new(pattern);
    if let Some(flags) = args.get(1) {
        let flags = flags
            .as_str()
            .ok_or_else(|| "flags must be a string".to_string())?;
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                other => return Err(format!("unsupported regex flag `{other}`")),
            }
        }
    }
    builder.build().map_err(|e| e.to_string())
}

fn compile_len(args: &[Value]) -> Result<Builtin, String> {
    match args {
        [min, max] => {
            let min = min
                .as_u64()
                .ok_or_else(|| "minimum length must be a non-negative integer".to_string())?;
            let max = max
                .as_u64()
                .ok_or_else(|| "maximum length must be a non-negative integer".to_string())?;
            if min > max {
                return Err(format!("minimum length {min} exceeds maximum {max}"));
            }
            Ok(Builtin::Len {
                min: min as usize,
                max: max as usize,
            })
        }
        _ => Err(format!(
            "expected [min, max] arguments, got {}",
            args.len()
        )),
    }
}

fn compile_uuid_version(args: &[Value]) -> Result<Builtin, String> {
    let version = one_arg(args)?
        .as_u64()
        .ok_or_else(|| "UUID version must be an integer".to_string())?;
    if !(1..=5).contains(&version) {
        return Err(format!("unsupported UUID version {version}"));
    }
    Ok(Builtin::IsUuid(version as usize))
}
