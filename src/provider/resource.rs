//! Resource metadata shared by all three pipelines.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

use crate::config::KitConfig;
use crate::keys;

/// Build the resource describing this process.
///
/// The SDK's default detectors (`telemetry.sdk.*`, `OTEL_RESOURCE_ATTRIBUTES`)
/// are kept; service identity from the config wins over them.
pub fn build_resource(config: &KitConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new(keys::service::VERSION, config.service_version.clone()),
            KeyValue::new(keys::deployment::ENVIRONMENT_NAME, config.environment.clone()),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, Value};

    #[test]
    fn resource_carries_service_identity() {
        let config = KitConfig {
            service_name: "checkout".into(),
            service_version: "2.3.4".into(),
            environment: "staging".into(),
            ..KitConfig::default()
        };
        let resource = build_resource(&config);

        assert_eq!(
            resource.get(&Key::from_static_str("service.name")),
            Some(Value::from("checkout"))
        );
        assert_eq!(
            resource.get(&Key::from_static_str(keys::service::VERSION)),
            Some(Value::from("2.3.4"))
        );
        assert_eq!(
            resource.get(&Key::from_static_str(keys::deployment::ENVIRONMENT_NAME)),
            Some(Value::from("staging"))
        );
    }
}
