use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::{Result, TwinError};

/// Primitive value type of a Property or Range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "xs:string")]
    String,
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:int")]
    Int,
    #[serde(rename = "xs:long")]
    Long,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:float")]
    Float,
    #[serde(rename = "xs:decimal")]
    Decimal,
    #[serde(rename = "xs:dateTime")]
    DateTime,
    #[serde(rename = "xs:date")]
    Date,
    #[serde(rename = "xs:anyURI")]
    AnyUri,
}

impl DataType {
    /// XSD name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "xs:string",
            DataType::Boolean => "xs:boolean",
            DataType::Int => "xs:int",
            DataType::Long => "xs:long",
            DataType::Integer => "xs:integer",
            DataType::Double => "xs:double",
            DataType::Float => "xs:float",
            DataType::Decimal => "xs:decimal",
            DataType::DateTime => "xs:dateTime",
            DataType::Date => "xs:date",
            DataType::AnyUri => "xs:anyURI",
        }
    }

    fn is_integral(&self) -> bool {
        matches!(self, DataType::Int | DataType::Long | DataType::Integer)
    }

    fn is_floating(&self) -> bool {
        matches!(self, DataType::Double | DataType::Float | DataType::Decimal)
    }

    /// Convert a JSON scalar into this type without losing its value
    ///
    /// `parameter` names the argument in the error. Conversions that would
    /// change the value (`2.5` into `xs:int`, `"abc"` into `xs:double`) fail
    /// with `ValueCoercion`. `null` passes through unchanged.
    ///
    /// # Errors
    /// * `ValueCoercion` - If no value-preserving conversion exists
    pub fn coerce(&self, parameter: &str, value: &Value) -> Result<Value> {
        let fail = || TwinError::ValueCoercion {
            parameter: parameter.to_string(),
            value_type: self.as_str().to_string(),
            value: value.to_string(),
        };

        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            DataType::String | DataType::DateTime | DataType::Date | DataType::AnyUri => {
                match value {
                    Value::String(_) => Ok(value.clone()),
                    Value::Bool(b) if *self == DataType::String => Ok(Value::String(b.to_string())),
                    Value::Number(n) if *self == DataType::String => {
                        Ok(Value::String(n.to_string()))
                    }
                    _ => Err(fail()),
                }
            }
            DataType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => match s.trim() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Ok(Value::Bool(true)),
                    Some(0) => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            t if t.is_integral() => {
                let integral = match value {
                    Value::Number(n) => n.as_i64().or_else(|| {
                        n.as_f64()
                            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                            .map(|f| f as i64)
                    }),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                let integral = integral.ok_or_else(fail)?;
                if *t == DataType::Int && i32::try_from(integral).is_err() {
                    return Err(fail());
                }
                Ok(Value::Number(Number::from(integral)))
            }
            t if t.is_floating() => {
                let floating = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                floating
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(fail)
            }
            _ => Err(fail()),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
