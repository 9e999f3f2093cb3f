//! Structure of the configuration file.

use gtx_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};

/// Schema for the whole configuration file.
pub struct GtxConfigSchema;

impl ConfigSchema for GtxConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new(
				"networks",
				FieldType::Map(Box::new(FieldType::Table(network_schema()))),
			)],
			// Optional fields
			vec![
				Field::new(
					"tokens",
					FieldType::Map(Box::new(FieldType::Table(token_schema()))),
				),
				Field::new("client", FieldType::Table(client_schema())),
				Field::new("logging", FieldType::Table(logging_schema())),
			],
		);

		schema.validate(config)
	}
}

fn network_schema() -> Schema {
	Schema::new(
		vec![
			Field::new(
				"chain_id",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			),
			Field::new(
				"domain",
				FieldType::Integer {
					min: Some(1),
					max: Some(u32::MAX as i64),
				},
			),
			Field::new("router", FieldType::Address).with_validator(|value| {
				match value.as_str() {
					Some(router) if router.trim_start_matches("0x").chars().all(|c| c == '0') => {
						Err("Router must not be the zero address".to_string())
					}
					_ => Ok(()),
				}
			}),
		],
		vec![
			Field::new("rpc_url", FieldType::String).with_validator(|value| {
				let url = value.as_str().unwrap_or_default();
				if is_http_url(url) {
					Ok(())
				} else {
					Err("RPC URL must start with http:// or https://".to_string())
				}
			}),
			Field::new("domain_accessor", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some("local_domain") | Some("host_chain_id") => Ok(()),
					_ => Err("domain_accessor must be 'local_domain' or 'host_chain_id'".to_string()),
				}
			}),
		],
	)
}

fn token_schema() -> Schema {
	Schema::new(
		vec![
			Field::new(
				"decimals",
				FieldType::Integer {
					min: Some(0),
					max: Some(36),
				},
			),
			Field::new("addresses", FieldType::Map(Box::new(FieldType::Address))),
		],
		vec![],
	)
}

fn client_schema() -> Schema {
	let seconds = |name: &str| {
		Field::new(
			name,
			FieldType::Integer {
				min: Some(1),
				max: None,
			},
		)
	};

	Schema::new(
		vec![],
		vec![
			seconds("confirmation_timeout_secs"),
			seconds("rpc_timeout_secs"),
			Field::new(
				"approval_retries",
				FieldType::Integer {
					min: Some(0),
					max: Some(10),
				},
			),
			Field::new(
				"default_gas_payment_wei",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			),
			seconds("fill_deadline_secs"),
			seconds("poll_interval_secs"),
			seconds("max_poll_secs"),
			Field::new("serialize_submissions", FieldType::Boolean),
		],
	)
}

fn logging_schema() -> Schema {
	Schema::new(vec![], vec![Field::new("level", FieldType::String)])
}

pub(crate) fn is_http_url(url: &str) -> bool {
	url.starts_with("http://") || url.starts_with("https://")
}
