//! Tagged column values and their Postgres parameter encoding.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::net::IpAddr;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A single column or parameter value.
///
/// This is the value set the model layer exchanges with the database: every
/// attribute of a [`Model`](crate::Model) and every bound parameter of a
/// [`BuiltQuery`](crate::BuiltQuery) is one of these.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in encode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_bytes(v),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

type BoxError = Box<dyn Error + Sync + Send>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot encode {} value as Postgres type {}", value.kind(), ty).into()
}

fn is_enum(ty: &Type) -> bool {
    matches!(ty.kind(), Kind::Enum(_))
}

/// Encode text for a column type without a native variant, parsing it the
/// way [`Value`]'s `FromSql` renders that type.
fn text_to_sql(text: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::UUID => Uuid::parse_str(text)?.to_sql(ty, out),
        Type::TIMESTAMP => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .or_else(|_| text.parse::<NaiveDateTime>())?
            .to_sql(ty, out),
        Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z"))?
            .with_timezone(&Utc)
            .to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIME => NaiveTime::parse_from_str(text, TIME_FORMAT)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => {
            serde_json::from_str::<serde_json::Value>(text)?.to_sql(ty, out)
        }
        Type::NUMERIC => text.parse::<Decimal>()?.to_sql(ty, out),
        Type::INET => text.parse::<IpAddr>()?.to_sql(ty, out),
        _ => Err(format!("cannot encode text value as Postgres type {ty}").into()),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) if *ty == Type::BOOL => v.to_sql(ty, out),
            Value::Int(v) => match *ty {
                Type::CHAR => i8::try_from(*v)?.to_sql(ty, out),
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Text(v) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    v.as_str().to_sql(ty, out)
                }
                // enum labels travel as their text in the binary protocol
                _ if is_enum(ty) => v.as_str().to_sql(ty, out),
                _ => text_to_sql(v, ty, out),
            },
            Value::Bytes(v) if *ty == Type::BYTEA => v.as_slice().to_sql(ty, out),
            _ => Err(mismatch(self, ty)),
        }
    }

    // Type compatibility is checked per value in `to_sql`, so NULL binds to any column.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Column decoding.
///
/// Types without a native variant (numeric, temporal, uuid, json, inet and
/// enums) decode to [`Value::Text`] in a form `to_sql` parses back for the
/// same column type.
impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => i8::from_sql(ty, raw)?.into(),
            Type::INT2 => i16::from_sql(ty, raw)?.into(),
            Type::INT4 => i32::from_sql(ty, raw)?.into(),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => u32::from_sql(ty, raw)?.into(),
            Type::FLOAT4 => f32::from_sql(ty, raw)?.into(),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Text(Decimal::from_sql(ty, raw)?.to_string()),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                Value::Text(String::from_sql(ty, raw)?)
            }
            Type::BYTEA => Value::Bytes(raw.to_vec()),
            Type::TIMESTAMP => {
                Value::Text(NaiveDateTime::from_sql(ty, raw)?.format(TIMESTAMP_FORMAT).to_string())
            }
            Type::TIMESTAMPTZ => Value::Text(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
            Type::DATE => Value::Text(NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string()),
            Type::TIME => {
                Value::Text(NaiveTime::from_sql(ty, raw)?.format(TIME_FORMAT).to_string())
            }
            Type::UUID => Value::Text(Uuid::from_sql(ty, raw)?.to_string()),
            Type::JSON | Type::JSONB => {
                Value::Text(serde_json::Value::from_sql(ty, raw)?.to_string())
            }
            Type::INET => Value::Text(IpAddr::from_sql(ty, raw)?.to_string()),
            _ if is_enum(ty) => Value::Text(std::str::from_utf8(raw)?.to_string()),
            _ => return Err(format!("unsupported column type {ty}").into()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_expected_variant() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(5u8), Value::Int(5));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("y")), Value::Text("y".into()));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(3).as_i64(), Some(3));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Text("a".into()).as_i64(), None);
        assert_eq!(Value::Text("a".into()).as_str(), Some("a"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bytes(vec![9]).as_bytes(), Some(&[9u8][..]));
    }

    #[test]
    fn int_narrows_to_int4() {
        let mut buf = BytesMut::new();
        let is_null = Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&buf[..], &7i32.to_be_bytes());
    }

    #[test]
    fn int_overflowing_int2_is_an_error() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_into_integer_column_is_rejected() {
        let mut buf = BytesMut::new();
        let err = Value::Text("1".into())
            .to_sql(&Type::INT8, &mut buf)
            .err()
            .expect("expected an encoding error");
        assert!(err.to_string().contains("cannot encode text"));
    }

    #[test]
    fn null_encodes_for_any_type() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn serializes_as_plain_json() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Int(1),
            Value::Text("a".into()),
            Value::Bool(false),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1,"a",false]"#);
    }

    fn reencode<T: ToSql>(native: T, ty: Type) -> Value {
        let mut raw = BytesMut::new();
        native.to_sql(&ty, &mut raw).unwrap();
        let decoded = Value::from_sql(&ty, &raw).unwrap();

        let mut again = BytesMut::new();
        decoded.to_sql(&ty, &mut again).unwrap();
        assert_eq!(raw, again, "{ty} changed after decode and re-encode");
        decoded
    }

    #[test]
    fn native_columns_reencode() {
        assert_eq!(reencode(true, Type::BOOL), Value::Bool(true));
        assert_eq!(reencode(7i16, Type::INT2), Value::Int(7));
        assert_eq!(reencode(-42i32, Type::INT4), Value::Int(-42));
        assert_eq!(reencode(1.25f64, Type::FLOAT8), Value::Float(1.25));
        assert_eq!(reencode(vec![0u8, 255], Type::BYTEA), Value::Bytes(vec![0, 255]));
        assert_eq!(reencode("hi", Type::VARCHAR), Value::Text("hi".into()));
    }

    #[test]
    fn uuid_column_reencodes_from_text() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            reencode(id, Type::UUID),
            Value::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into())
        );
    }

    #[test]
    fn temporal_columns_reencode_from_text() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:30:00.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let decoded = reencode(at, Type::TIMESTAMPTZ);
        assert!(decoded.as_str().unwrap().starts_with("2024-05-01T12:30:00.123456"));

        let naive = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(8, 0, 1, 250)
            .unwrap();
        let decoded = reencode(naive, Type::TIMESTAMP);
        assert!(decoded.as_str().unwrap().starts_with("2024-05-01 08:00:01."));

        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(reencode(day, Type::DATE), Value::Text("2024-02-29".into()));

        let time = NaiveTime::from_hms_opt(23, 59, 58).unwrap();
        assert_eq!(reencode(time, Type::TIME), Value::Text("23:59:58".into()));
    }

    #[test]
    fn json_columns_reencode_from_text() {
        let doc = serde_json::json!({"tags": ["a", "b"], "n": 1});
        let text = doc.to_string();
        assert_eq!(reencode(doc.clone(), Type::JSONB), Value::Text(text.clone()));
        assert_eq!(reencode(doc, Type::JSON), Value::Text(text));
    }

    #[test]
    fn numeric_column_keeps_its_scale() {
        let price: Decimal = "12.50".parse().unwrap();
        assert_eq!(reencode(price, Type::NUMERIC), Value::Text("12.50".into()));
    }

    #[test]
    fn numbers_encode_for_numeric_parameters() {
        let mut expected = BytesMut::new();
        Decimal::from(5).to_sql(&Type::NUMERIC, &mut expected).unwrap();
        let mut buf = BytesMut::new();
        Value::Int(5).to_sql(&Type::NUMERIC, &mut buf).unwrap();
        assert_eq!(buf, expected);

        let mut expected = BytesMut::new();
        Decimal::try_from(2.5f64).unwrap().to_sql(&Type::NUMERIC, &mut expected).unwrap();
        let mut buf = BytesMut::new();
        Value::Float(2.5).to_sql(&Type::NUMERIC, &mut buf).unwrap();
        assert_eq!(buf, expected);
    }

    #[test]
    fn inet_and_enum_columns_reencode_from_text() {
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(reencode(addr, Type::INET), Value::Text("10.0.0.1".into()));

        let mood = Type::new(
            "mood".into(),
            90_001,
            Kind::Enum(vec!["happy".into(), "sad".into()]),
            "public".into(),
        );
        let decoded = Value::from_sql(&mood, b"happy").unwrap();
        assert_eq!(decoded, Value::Text("happy".into()));
        let mut buf = BytesMut::new();
        decoded.to_sql(&mood, &mut buf).unwrap();
        assert_eq!(&buf[..], b"happy");
    }

    #[test]
    fn malformed_text_for_typed_parameter_is_an_error() {
        let mut buf = BytesMut::new();
        assert!(Value::Text("not-a-uuid".into()).to_sql(&Type::UUID, &mut buf).is_err());
        assert!(Value::Text("{".into()).to_sql(&Type::JSONB, &mut buf).is_err());
        assert!(Value::Text("yesterday".into()).to_sql(&Type::DATE, &mut buf).is_err());
    }

    #[test]
    fn null_and_unsupported_columns() {
        assert_eq!(Value::from_sql_null(&Type::NUMERIC).unwrap(), Value::Null);
        let err = Value::from_sql(&Type::POINT, &[0u8; 16]).unwrap_err();
        assert!(err.to_string().contains("unsupported column type point"));
    }
}
