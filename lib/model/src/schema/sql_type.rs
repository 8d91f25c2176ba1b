use std::fmt::{Display, Formatter};

/// The source datatype of a column, following the JDBC type families.
///
/// Database specific type names are folded into these families by [SqlType::from_type_name]. Names
/// that cannot be folded are kept as [SqlType::Other] and have no XSD equivalent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Real,
    Float,
    Double,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    Clob,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Other(String),
}

impl SqlType {
    /// Parses a declared type name such as `VARCHAR(255)` or `double precision`.
    ///
    /// Length, precision and modifiers like `UNSIGNED` are ignored.
    pub fn from_type_name(name: &str) -> Self {
        let base = name.split('(').next().unwrap_or_default();
        let normalized = base
            .split_whitespace()
            .filter(|word| {
                !matches!(
                    word.to_ascii_uppercase().as_str(),
                    "UNSIGNED" | "SIGNED" | "ZEROFILL"
                )
            })
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "BIT" => Self::Bit,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TINYINT" | "INT1" => Self::TinyInt,
            "SMALLINT" | "INT2" | "SMALLSERIAL" => Self::SmallInt,
            "INTEGER" | "INT" | "INT4" | "MEDIUMINT" | "SERIAL" => Self::Integer,
            "BIGINT" | "INT8" | "BIGSERIAL" => Self::BigInt,
            "DECIMAL" | "DEC" => Self::Decimal,
            "NUMERIC" | "NUMBER" => Self::Numeric,
            "REAL" | "FLOAT4" => Self::Real,
            "FLOAT" => Self::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Self::Double,
            "CHAR" | "CHARACTER" => Self::Char,
            "VARCHAR" | "CHARACTER VARYING" | "VARCHAR2" | "VARYING CHARACTER" => Self::VarChar,
            "LONGVARCHAR" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "TINYTEXT" => Self::LongVarChar,
            "NCHAR" | "NATIVE CHARACTER" | "NATIONAL CHARACTER" => Self::NChar,
            "NVARCHAR" | "NVARCHAR2" | "NATIONAL CHARACTER VARYING" => Self::NVarChar,
            "CLOB" | "NCLOB" => Self::Clob,
            "DATE" => Self::Date,
            "TIME" | "TIME WITHOUT TIME ZONE" => Self::Time,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP WITHOUT TIME ZONE" => Self::Timestamp,
            "BINARY" => Self::Binary,
            "VARBINARY" | "BINARY VARYING" | "BYTEA" => Self::VarBinary,
            "LONGVARBINARY" => Self::LongVarBinary,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => Self::Blob,
            _ => Self::Other(name.trim().to_owned()),
        }
    }

    /// Returns whether values of this type are large binary objects that never become literals.
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob)
    }

    /// Returns whether values of this type are raw bytes rather than text.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::Binary | Self::VarBinary | Self::LongVarBinary | Self::Blob
        )
    }

    /// Returns whether this is an exact whole-number type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt
        )
    }

    /// Returns whether this is a date or timestamp type, the types affected by epoch-based
    /// temporal extraction.
    pub fn is_epoch_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameterized_names() {
        assert_eq!(SqlType::from_type_name("VARCHAR(255)"), SqlType::VarChar);
        assert_eq!(SqlType::from_type_name("decimal(10, 2)"), SqlType::Decimal);
        assert_eq!(SqlType::from_type_name("int unsigned"), SqlType::Integer);
        assert_eq!(
            SqlType::from_type_name("double precision"),
            SqlType::Double
        );
    }

    #[test]
    fn keeps_unknown_names() {
        assert_eq!(
            SqlType::from_type_name(" GEOMETRY "),
            SqlType::Other("GEOMETRY".to_owned())
        );
    }

    #[test]
    fn classifies_families() {
        assert!(SqlType::Blob.is_blob());
        assert!(SqlType::VarBinary.is_binary());
        assert!(!SqlType::VarBinary.is_blob());
        assert!(SqlType::BigInt.is_integer());
        assert!(SqlType::Timestamp.is_epoch_temporal());
        assert!(!SqlType::Time.is_epoch_temporal());
    }
}
