//! Launch request assembly.

use std::collections::BTreeMap;

use crate::config::RunConfig;
use crate::providers::{LaunchRequest, Offer};

/// Build the container environment.
///
/// Keys whose value is empty are left out entirely, never sent as `""`.
/// Callers rely on unset meaning "use the container default".
#[must_use]
pub fn build_env_vars(config: &RunConfig, instance_id: &str) -> BTreeMap<String, String> {
    let secrets = &config.secrets;
    [
        ("WANDB_API_KEY", secrets.wandb_key.as_str()),
        ("AWS_ACCESS_KEY_ID", secrets.aws_key.as_str()),
        ("AWS_SECRET_ACCESS_KEY", secrets.aws_secret.as_str()),
        ("AWS_DEFAULT_REGION", secrets.aws_region.as_str()),
        ("S3_DATA_PATH", secrets.s3_path.as_str()),
        ("VAST_API_KEY", config.api_key.as_str()),
        ("CONTAINER_ID", instance_id),
        ("CONFIG_FILE", config.config_file.as_str()),
        ("EXTRA_ARGS", config.extra_args.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Turn the winning offer and run configuration into a launch request.
///
/// Image, disk and startup command are passed through as given.
#[must_use]
pub fn build_launch_request(offer: &Offer, config: &RunConfig) -> LaunchRequest {
    LaunchRequest {
        offer_id: offer.id.clone(),
        image: config.docker_image.clone(),
        disk: config.disk_space,
        onstart: config.onstart.clone(),
        env: build_env_vars(config, &offer.id.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secrets;
    use crate::providers::OfferId;

    fn full_config() -> RunConfig {
        RunConfig {
            api_key: "vast".to_string(),
            docker_image: "ghcr.io/acme/trainer:latest".to_string(),
            disk_space: 80.0,
            onstart: "bash /workspace/start.sh".to_string(),
            config_file: "configs/exp.yaml".to_string(),
            extra_args: "--epochs 3".to_string(),
            secrets: Secrets {
                wandb_key: "wandb".to_string(),
                aws_key: "AKIA".to_string(),
                aws_secret: "secret".to_string(),
                aws_region: "us-east-1".to_string(),
                s3_path: "s3://bucket/data".to_string(),
            },
            ..RunConfig::default()
        }
    }

    fn offer() -> Offer {
        Offer {
            id: OfferId::from(1234),
            price_per_hour: 1.0,
            reliability: 0.95,
            disk_space: 60.0,
            gpu_name: "RTX 4090".to_string(),
            num_gpus: 1,
            gpu_ram: 24_564.0,
            inet_down: 150.0,
            inet_up: 150.0,
            geolocation: None,
            rentable: true,
        }
    }

    #[test]
    fn test_all_keys_present() {
        let env = build_env_vars(&full_config(), "1234");
        assert_eq!(env.len(), 9);
        assert_eq!(env["WANDB_API_KEY"], "wandb");
        assert_eq!(env["AWS_ACCESS_KEY_ID"], "AKIA");
        assert_eq!(env["AWS_SECRET_ACCESS_KEY"], "secret");
        assert_eq!(env["AWS_DEFAULT_REGION"], "us-east-1");
        assert_eq!(env["S3_DATA_PATH"], "s3://bucket/data");
        assert_eq!(env["VAST_API_KEY"], "vast");
        assert_eq!(env["CONTAINER_ID"], "1234");
        assert_eq!(env["CONFIG_FILE"], "configs/exp.yaml");
        assert_eq!(env["EXTRA_ARGS"], "--epochs 3");
    }

    #[test]
    fn test_each_empty_value_omitted() {
        let blankers: [(&str, fn(&mut RunConfig)); 8] = [
            ("WANDB_API_KEY", |c| c.secrets.wandb_key.clear()),
            ("AWS_ACCESS_KEY_ID", |c| c.secrets.aws_key.clear()),
            ("AWS_SECRET_ACCESS_KEY", |c| c.secrets.aws_secret.clear()),
            ("AWS_DEFAULT_REGION", |c| c.secrets.aws_region.clear()),
            ("S3_DATA_PATH", |c| c.secrets.s3_path.clear()),
            ("VAST_API_KEY", |c| c.api_key.clear()),
            ("CONFIG_FILE", |c| c.config_file.clear()),
            ("EXTRA_ARGS", |c| c.extra_args.clear()),
        ];

        for (key, blank) in blankers {
            let mut config = full_config();
            blank(&mut config);
            let env = build_env_vars(&config, "1234");
            assert!(!env.contains_key(key), "{key} should be omitted");
            assert_eq!(env.len(), 8, "only {key} should be omitted");
        }

        let env = build_env_vars(&full_config(), "");
        assert!(!env.contains_key("CONTAINER_ID"));
        assert_eq!(env.len(), 8);
    }

    #[test]
    fn test_no_empty_values_ever() {
        let env = build_env_vars(&RunConfig::default(), "");
        assert!(env.values().all(|v| !v.is_empty()));
        let keys: Vec<_> = env.keys().map(String::as_str).collect();
        assert_eq!(keys, ["AWS_DEFAULT_REGION", "CONFIG_FILE"]);
    }

    #[test]
    fn test_launch_request_passthrough() {
        let req = build_launch_request(&offer(), &full_config());
        assert_eq!(req.offer_id, OfferId::from(1234));
        assert_eq!(req.image, "ghcr.io/acme/trainer:latest");
        assert!((req.disk - 80.0).abs() < f64::EPSILON);
        assert_eq!(req.onstart, "bash /workspace/start.sh");
        assert_eq!(req.env["CONTAINER_ID"], "1234");
    }
}
