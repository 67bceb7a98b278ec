use serde::{Deserialize, Serialize};

use crate::ast::Type;

/// Kind of answer the dialogue is waiting for. The input layer uses it to
/// route raw input (a yes/no button, a number, a picked choice) without a
/// round trip through the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "unit", rename_all = "snake_case")]
pub enum ValueCategory {
    YesNo,
    MultipleChoice,
    Number,
    Measure(String),
    RawString,
    Password,
    Date,
    Time,
    Location,
    PhoneNumber,
    EmailAddress,
    Contact,
    Picture,
    Command,
    Generic,
}

impl ValueCategory {
    pub fn from_type(ty: &Type) -> Self {
        match ty {
            Type::Boolean => ValueCategory::YesNo,
            Type::Number => ValueCategory::Number,
            Type::Measure(unit) => ValueCategory::Measure(unit.clone()),
            Type::String => ValueCategory::RawString,
            Type::Date => ValueCategory::Date,
            Type::Time => ValueCategory::Time,
            Type::Location => ValueCategory::Location,
            Type::Entity(kind) => match kind.as_str() {
                "tt:phone_number" => ValueCategory::PhoneNumber,
                "tt:email_address" => ValueCategory::EmailAddress,
                "tt:contact" | "tt:username" => ValueCategory::Contact,
                "tt:picture" => ValueCategory::Picture,
                "tt:password" => ValueCategory::Password,
                _ => ValueCategory::Generic,
            },
            _ => ValueCategory::Generic,
        }
    }
}
