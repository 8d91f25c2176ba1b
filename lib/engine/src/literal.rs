use crate::MappingRules;
use rdb2rdf_common::error::{EncodingError, UnknownDatatypeError};
use rdb2rdf_common::MappingError;
use rdb2rdf_model::vocab::xsd;
use rdb2rdf_model::xsd::{Boolean, Date, DateTime, Decimal, Double, Integer, Time};
use rdb2rdf_model::{Column, Literal, NamedNodeRef, Row, SqlType};
use std::fmt::Display;
use std::str::FromStr;

/// The RDF representation of the values of an SQL type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Plain,
    Boolean,
    Integer,
    Decimal,
    Double,
    Date,
    Time,
    DateTime,
    HexBinary,
}

impl ValueKind {
    fn of(sql_type: &SqlType) -> Option<Self> {
        Some(match sql_type {
            SqlType::Bit | SqlType::Boolean => Self::Boolean,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                Self::Integer
            }
            SqlType::Decimal | SqlType::Numeric => Self::Decimal,
            SqlType::Real | SqlType::Float | SqlType::Double => Self::Double,
            SqlType::Char
            | SqlType::VarChar
            | SqlType::LongVarChar
            | SqlType::NChar
            | SqlType::NVarChar
            | SqlType::Clob => Self::Plain,
            SqlType::Date => Self::Date,
            SqlType::Time => Self::Time,
            SqlType::Timestamp => Self::DateTime,
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob => {
                Self::HexBinary
            }
            SqlType::Other(_) => return None,
        })
    }

    fn datatype(self) -> Option<NamedNodeRef<'static>> {
        match self {
            Self::Plain => None,
            Self::Boolean => Some(xsd::BOOLEAN),
            Self::Integer => Some(xsd::INTEGER),
            Self::Decimal => Some(xsd::DECIMAL),
            Self::Double => Some(xsd::DOUBLE),
            Self::Date => Some(xsd::DATE),
            Self::Time => Some(xsd::TIME),
            Self::DateTime => Some(xsd::DATE_TIME),
            Self::HexBinary => Some(xsd::HEX_BINARY),
        }
    }
}

/// Builds the literal for the non-null value of `column` in `row`.
///
/// Fails with [MappingError::UnknownDatatype] if the column type has no XSD equivalent and with
/// [MappingError::Encoding] if the value is null, not UTF-8 text, or not a valid lexical form of
/// its datatype.
pub(crate) fn literal(
    rules: &MappingRules,
    row: &Row,
    column: &Column,
) -> Result<Literal, MappingError> {
    let kind = value_kind(row.table().name(), column)?;
    let lexical = lexical_form(rules, kind, row, column)?;
    Ok(match kind.datatype() {
        Some(datatype) => Literal::new_typed_literal(lexical, datatype),
        None => Literal::new_simple_literal(lexical),
    })
}

/// The lexical form of the non-null value of `column` in `row`, as used in row IRIs.
pub(crate) fn key_value(
    rules: &MappingRules,
    row: &Row,
    column: &Column,
) -> Result<String, MappingError> {
    let kind = value_kind(row.table().name(), column)?;
    lexical_form(rules, kind, row, column)
}

fn value_kind(table: &str, column: &Column) -> Result<ValueKind, UnknownDatatypeError> {
    ValueKind::of(&column.sql_type).ok_or_else(|| UnknownDatatypeError {
        table: table.to_owned(),
        column: column.name.clone(),
        sql_type: column.sql_type.to_string(),
    })
}

fn lexical_form(
    rules: &MappingRules,
    kind: ValueKind,
    row: &Row,
    column: &Column,
) -> Result<String, MappingError> {
    let table = row.table().name();
    let null_value = || encoding_error(table, column, "value is null".to_owned());
    if kind == ValueKind::HexBinary {
        let value = row.value(&column.name).ok_or_else(null_value)?;
        return Ok(hex::encode_upper(value));
    }
    let text = row.text(&column.name)?.ok_or_else(null_value)?;
    let normalized = if kind == ValueKind::DateTime {
        // SQL renders timestamps with a space between date and time.
        normalize(rules, kind, &text.replacen(' ', "T", 1))
    } else {
        normalize(rules, kind, text)
    };
    normalized.map_err(|reason| encoding_error(table, column, reason).into())
}

fn normalize(rules: &MappingRules, kind: ValueKind, text: &str) -> Result<String, String> {
    if !rules.canonical_literals() {
        return Ok(text.to_owned());
    }
    match kind {
        ValueKind::Plain | ValueKind::HexBinary => Ok(text.to_owned()),
        ValueKind::Boolean => canonical::<Boolean>(text),
        ValueKind::Integer => canonical::<Integer>(text),
        ValueKind::Decimal => canonical::<Decimal>(text),
        ValueKind::Double => canonical::<Double>(text),
        ValueKind::Date => canonical::<Date>(text),
        ValueKind::Time => canonical::<Time>(text),
        ValueKind::DateTime => canonical::<DateTime>(text),
    }
}

fn canonical<T>(text: &str) -> Result<String, String>
where
    T: FromStr + Display,
    T::Err: Display,
{
    text.trim()
        .parse::<T>()
        .map(|value| value.to_string())
        .map_err(|error| format!("'{text}' is not a valid lexical form: {error}"))
}

fn encoding_error(table: &str, column: &Column, reason: String) -> EncodingError {
    EncodingError {
        table: table.to_owned(),
        column: column.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdb2rdf_common::MappingVersion;
    use rdb2rdf_model::{Header, Table};
    use std::sync::Arc;

    fn row_of(column: &Column, value: &[u8]) -> Row {
        let table = Table::try_new(
            "t",
            Header::new(vec![column.clone()]),
            None,
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        Row::try_new(Arc::new(table), None, vec![Some(value.to_vec())]).unwrap()
    }

    fn try_convert(
        version: MappingVersion,
        sql_type: SqlType,
        value: &[u8],
    ) -> Result<Literal, MappingError> {
        let column = Column::new("c", sql_type);
        literal(&MappingRules::new(version), &row_of(&column, value), &column)
    }

    fn convert(version: MappingVersion, sql_type: SqlType, value: &str) -> Literal {
        try_convert(version, sql_type, value.as_bytes()).unwrap()
    }

    #[test]
    fn maps_sql_types_to_xsd() {
        let v = MappingVersion::Wd20120529;
        assert_eq!(
            convert(v, SqlType::VarChar, "Bob"),
            Literal::new_simple_literal("Bob")
        );
        assert_eq!(
            convert(v, SqlType::Integer, "42"),
            Literal::new_typed_literal("42", xsd::INTEGER)
        );
        assert_eq!(
            convert(v, SqlType::Date, "2011-03-24"),
            Literal::new_typed_literal("2011-03-24", xsd::DATE)
        );
        assert_eq!(
            convert(v, SqlType::Timestamp, "2011-03-24 10:15:00"),
            Literal::new_typed_literal("2011-03-24T10:15:00", xsd::DATE_TIME)
        );
        assert_eq!(
            try_convert(v, SqlType::VarBinary, &[0x01, 0xC2, 0xFF]).unwrap(),
            Literal::new_typed_literal("01C2FF", xsd::HEX_BINARY)
        );
    }

    #[test]
    fn canonicalizes_only_in_2012() {
        assert_eq!(
            convert(MappingVersion::Wd20120529, SqlType::Integer, "+007"),
            Literal::new_typed_literal("7", xsd::INTEGER)
        );
        assert_eq!(
            convert(MappingVersion::Wd20120529, SqlType::Boolean, "1"),
            Literal::new_typed_literal("true", xsd::BOOLEAN)
        );
        assert_eq!(
            convert(MappingVersion::Wd20120529, SqlType::Decimal, "1.50"),
            Literal::new_typed_literal("1.5", xsd::DECIMAL)
        );
        assert_eq!(
            convert(MappingVersion::Wd20110324, SqlType::Integer, "+007"),
            Literal::new_typed_literal("+007", xsd::INTEGER)
        );
        assert_eq!(
            convert(MappingVersion::Wd20110324, SqlType::Boolean, "1"),
            Literal::new_typed_literal("1", xsd::BOOLEAN)
        );
    }

    #[test]
    fn rejects_invalid_lexical_forms() {
        let result = try_convert(MappingVersion::Wd20120529, SqlType::Integer, b"twelve");
        assert!(matches!(result, Err(MappingError::Encoding(_))));
    }

    #[test]
    fn rejects_text_that_is_not_utf8() {
        let result = try_convert(MappingVersion::Wd20110324, SqlType::VarChar, &[0x66, 0xFF]);
        let Err(MappingError::Encoding(error)) = result else {
            panic!("expected an encoding error");
        };
        assert_eq!(error.column, "c");
    }

    #[test]
    fn rejects_unknown_types() {
        let result = try_convert(
            MappingVersion::Wd20120529,
            SqlType::Other("GEOMETRY".to_owned()),
            b"POINT(0 0)",
        );
        let Err(MappingError::UnknownDatatype(error)) = result else {
            panic!("expected an unknown datatype error");
        };
        assert_eq!(error.sql_type, "GEOMETRY");
    }
}
