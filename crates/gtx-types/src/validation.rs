//! Structural validation of TOML configuration.
//!
//! Configuration is checked against a [`Schema`] before it is deserialized so
//! that a bad router address or an out-of-range domain is reported with the
//! full path of the offending field (`networks.pharos.router`) instead of a
//! generic serde error.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// `0x`-prefixed 20-byte hex address.
	Address,
	Array(Box<FieldType>),
	Table(Schema),
	/// Table with arbitrary keys whose values all share one type.
	Map(Box<FieldType>),
}

/// Custom check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.validate_at("", config)
	}

	fn validate_at(&self, prefix: &str, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| type_mismatch(prefix_or_root(prefix), "table", config))?;

		for field in &self.required {
			let path = join(prefix, &field.name);
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(path.clone()))?;
			check_field(&path, value, field)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(&join(prefix, &field.name), value, field)?;
			}
		}

		Ok(())
	}
}

/// Implemented by every schema the configuration loader checks.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

/// Returns true for `0x` followed by exactly 40 hex digits.
pub fn is_hex_address(value: &str) -> bool {
	value
		.strip_prefix("0x")
		.map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
		.unwrap_or(false)
}

fn check_field(path: &str, value: &toml::Value, field: &Field) -> Result<(), ValidationError> {
	check_type(path, value, &field.field_type)?;

	if let Some(validator) = &field.validator {
		validator(value).map_err(|message| ValidationError::InvalidValue {
			field: path.to_string(),
			message,
		})?;
	}

	Ok(())
}

fn check_type(path: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(path, "string", value));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(path, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch(path, "boolean", value));
			}
		}
		FieldType::Address => {
			let text = value
				.as_str()
				.ok_or_else(|| type_mismatch(path, "address string", value))?;
			if !is_hex_address(text) {
				return Err(ValidationError::InvalidValue {
					field: path.to_string(),
					message: format!("'{}' is not a 0x-prefixed 20-byte address", text),
				});
			}
		}
		FieldType::Array(inner) => {
			let array = value
				.as_array()
				.ok_or_else(|| type_mismatch(path, "array", value))?;
			for (i, item) in array.iter().enumerate() {
				check_type(&format!("{}[{}]", path, i), item, inner)?;
			}
		}
		FieldType::Table(schema) => schema.validate_at(path, value)?,
		FieldType::Map(inner) => {
			let table = value
				.as_table()
				.ok_or_else(|| type_mismatch(path, "table", value))?;
			for (key, item) in table {
				check_type(&join(path, key), item, inner)?;
			}
		}
	}

	Ok(())
}

fn type_mismatch(path: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: path.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn join(prefix: &str, name: &str) -> String {
	if prefix.is_empty() {
		name.to_string()
	} else {
		format!("{}.{}", prefix, name)
	}
}

fn prefix_or_root(prefix: &str) -> &str {
	if prefix.is_empty() {
		"root"
	} else {
		prefix
	}
}
