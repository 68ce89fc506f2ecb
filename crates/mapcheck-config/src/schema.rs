use schemars::schema::{RootSchema, Schema};
use schemars::schema_for;
use serde_json::json;

use crate::MapcheckConfig;

/// JSON schema for `mapcheck.toml`, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(MapcheckConfig);
    constrain_rule_ids(&mut schema);
    schema
}

fn constrain_rule_ids(schema: &mut RootSchema) {
    // `rules` is a free-form map in Rust; restrict its keys to rule ids.
    let Some(object) = schema.schema.object.as_mut() else {
        return;
    };
    if let Some(Schema::Object(rules)) = object.properties.get_mut("rules") {
        rules.extensions.insert(
            "propertyNames".to_owned(),
            json!({ "pattern": "^AM[0-9]{3}$" }),
        );
    }
}
