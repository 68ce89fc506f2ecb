//! Fixed conversion tables.

use crate::symbols::SpecialType;
use SpecialType::*;

/// C# implicit numeric conversions (ECMA-334 §10.2.3), excluding identity.
pub const IMPLICIT_NUMERIC_CONVERSIONS: &[(SpecialType, &[SpecialType])] = &[
    (SByte, &[Int16, Int32, Int64, Single, Double, Decimal]),
    (
        Byte,
        &[Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
    ),
    (Int16, &[Int32, Int64, Single, Double, Decimal]),
    (UInt16, &[Int32, UInt32, Int64, UInt64, Single, Double, Decimal]),
    (Int32, &[Int64, Single, Double, Decimal]),
    (UInt32, &[Int64, UInt64, Single, Double, Decimal]),
    (Int64, &[Single, Double, Decimal]),
    (UInt64, &[Single, Double, Decimal]),
    (
        Char,
        &[UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
    ),
    (Single, &[Double]),
];

/// Primitive and well-known pairs the mapper cannot convert without a
/// configured type converter.
pub const CONVERTER_REQUIRED: &[(SpecialType, SpecialType)] = &[
    (String, DateTime),
    (DateTime, String),
    (String, DateTimeOffset),
    (DateTimeOffset, String),
    (String, DateOnly),
    (DateOnly, String),
    (String, TimeOnly),
    (TimeOnly, String),
    (String, TimeSpan),
    (TimeSpan, String),
    (String, Guid),
    (Guid, String),
    (String, Decimal),
    (Decimal, String),
    (String, Double),
    (Double, String),
    (String, Single),
    (Single, String),
    (String, Boolean),
    (Boolean, String),
];

pub fn has_implicit_numeric_conversion(from: SpecialType, to: SpecialType) -> bool {
    from == to
        || IMPLICIT_NUMERIC_CONVERSIONS
            .iter()
            .any(|(source, targets)| *source == from && targets.contains(&to))
}

/// Both numeric and the conversion loses range or precision.
pub fn is_numeric_narrowing(from: SpecialType, to: SpecialType) -> bool {
    from.is_numeric() && to.is_numeric() && !has_implicit_numeric_conversion(from, to)
}

pub fn requires_type_converter(from: SpecialType, to: SpecialType) -> bool {
    CONVERTER_REQUIRED.contains(&(from, to))
}

/// Types with a static `Parse(string)` method.
pub fn is_parsable(ty: SpecialType) -> bool {
    ty.is_numeric()
        || matches!(
            ty,
            Boolean | Char | DateTime | DateTimeOffset | DateOnly | TimeOnly | TimeSpan | Guid
        )
}

/// `System.Convert` method producing `ty`, for numeric targets.
pub fn convert_method(ty: SpecialType) -> Option<&'static str> {
    Some(match ty {
        SByte => "ToSByte",
        Byte => "ToByte",
        Int16 => "ToInt16",
        UInt16 => "ToUInt16",
        Int32 => "ToInt32",
        UInt32 => "ToUInt32",
        Int64 => "ToInt64",
        UInt64 => "ToUInt64",
        Single => "ToSingle",
        Double => "ToDouble",
        Decimal => "ToDecimal",
        Char => "ToChar",
        _ => return None,
    })
}
