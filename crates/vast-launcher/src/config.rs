//! Run configuration.
//!
//! A [`RunConfig`] is built once at startup (from CLI flags and their
//! environment fallbacks) and passed by reference through the pipeline.
//! [`RunConfig::validate`] must succeed before any marketplace call.

use thiserror::Error;

/// Default hourly price ceiling in USD.
pub const DEFAULT_MAX_PRICE_PER_HOUR: f64 = 2.0;

/// Default minimum host reliability.
pub const DEFAULT_MIN_RELIABILITY: f64 = 0.9;

/// Default minimum free disk in GB.
pub const DEFAULT_MIN_DISK_SPACE: f64 = 50.0;

/// Default minimum download/upload bandwidth in Mbps.
pub const DEFAULT_MIN_INET: f64 = 100.0;

/// Default GPU type.
pub const DEFAULT_GPU_NAME: &str = "RTX 4090";

/// Default container image.
pub const DEFAULT_DOCKER_IMAGE: &str = "pytorch/pytorch:2.1.0-cuda12.1-cudnn8-runtime";

/// Default disk allocation in GB.
pub const DEFAULT_DISK_ALLOCATION: f64 = 50.0;

/// Default training config path inside the container.
pub const DEFAULT_CONFIG_FILE: &str = "configs/config.yaml";

/// Default AWS region.
pub const DEFAULT_AWS_REGION: &str = "ap-northeast-2";

/// Invalid or missing configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric option is out of range.
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },

    /// GPU count is zero.
    #[error("GPU count must be at least 1")]
    ZeroGpuCount,

    /// No acceptable GPU names given.
    #[error("At least one GPU type is required, and none may be blank")]
    NoGpuTypes,

    /// A required string option is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Required credentials are missing.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

/// Hard constraints an offer must satisfy to be eligible.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementSet {
    /// Maximum price per hour in USD. Must be positive.
    pub max_price_per_hour: f64,
    /// Minimum host reliability in `[0, 1]`.
    pub min_reliability: f64,
    /// Minimum free disk in GB.
    pub min_disk_space: f64,
    /// Minimum download bandwidth in Mbps.
    pub min_inet_down: f64,
    /// Minimum upload bandwidth in Mbps.
    pub min_inet_up: f64,
    /// Exact number of GPUs.
    pub num_gpus: u32,
    /// Acceptable GPU models (exact match).
    pub gpu_names: Vec<String>,
}

impl Default for RequirementSet {
    fn default() -> Self {
        Self {
            max_price_per_hour: DEFAULT_MAX_PRICE_PER_HOUR,
            min_reliability: DEFAULT_MIN_RELIABILITY,
            min_disk_space: DEFAULT_MIN_DISK_SPACE,
            min_inet_down: DEFAULT_MIN_INET,
            min_inet_up: DEFAULT_MIN_INET,
            num_gpus: 1,
            gpu_names: vec![DEFAULT_GPU_NAME.to_string()],
        }
    }
}

impl RequirementSet {
    /// Check that every constraint is usable.
    ///
    /// # Errors
    /// Returns the first invalid constraint. A zero price ceiling is rejected
    /// here so scoring never divides by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_price_per_hour.is_finite() && self.max_price_per_hour > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "max price per hour",
                expected: "a positive number",
                value: self.max_price_per_hour,
            });
        }
        if !(0.0..=1.0).contains(&self.min_reliability) {
            return Err(ConfigError::OutOfRange {
                name: "min reliability",
                expected: "between 0 and 1",
                value: self.min_reliability,
            });
        }
        for (name, value) in [
            ("min disk space", self.min_disk_space),
            ("min download", self.min_inet_down),
            ("min upload", self.min_inet_up),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    name,
                    expected: "zero or more",
                    value,
                });
            }
        }
        if self.num_gpus == 0 {
            return Err(ConfigError::ZeroGpuCount);
        }
        if self.gpu_names.is_empty() || self.gpu_names.iter().any(|g| g.trim().is_empty()) {
            return Err(ConfigError::NoGpuTypes);
        }
        Ok(())
    }
}

/// Secret values injected into the container environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Secrets {
    /// Weights & Biases API key.
    pub wandb_key: String,
    /// AWS access key ID.
    pub aws_key: String,
    /// AWS secret access key.
    pub aws_secret: String,
    /// AWS region.
    pub aws_region: String,
    /// S3 path of the training data.
    pub s3_path: String,
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Vast.ai API key.
    pub api_key: String,
    /// Container image.
    pub docker_image: String,
    /// Offer constraints.
    pub requirements: RequirementSet,
    /// Disk allocation for the instance in GB.
    pub disk_space: f64,
    /// Startup command. Empty means the image default.
    pub onstart: String,
    /// Training config path passed to the container.
    pub config_file: String,
    /// Extra arguments for the training script.
    pub extra_args: String,
    /// Injected credentials.
    pub secrets: Secrets,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            requirements: RequirementSet::default(),
            disk_space: DEFAULT_DISK_ALLOCATION,
            onstart: String::new(),
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            extra_args: String::new(),
            secrets: Secrets {
                aws_region: DEFAULT_AWS_REGION.to_string(),
                ..Secrets::default()
            },
        }
    }
}

impl RunConfig {
    /// Validate options needed for searching and listing.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or any requirement is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredentials(vec!["VAST_API_KEY"]));
        }
        self.requirements.validate()
    }

    /// Validate options needed to actually launch an instance.
    ///
    /// # Errors
    /// Returns an error listing every missing credential, or the first
    /// invalid option.
    pub fn validate_for_launch(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("VAST_API_KEY");
        }
        if self.secrets.wandb_key.trim().is_empty() {
            missing.push("WANDB_API_KEY");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        self.requirements.validate()?;

        if self.docker_image.trim().is_empty() {
            return Err(ConfigError::Empty("docker image"));
        }
        if !(self.disk_space.is_finite() && self.disk_space > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "disk allocation",
                expected: "a positive number",
                value: self.disk_space,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launchable() -> RunConfig {
        RunConfig {
            api_key: "vast-key".to_string(),
            secrets: Secrets {
                wandb_key: "wandb-key".to_string(),
                ..Secrets::default()
            },
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(RequirementSet::default().validate().is_ok());
        assert!(launchable().validate_for_launch().is_ok());
    }

    #[test]
    fn test_zero_price_ceiling_rejected() {
        let req = RequirementSet {
            max_price_per_hour: 0.0,
            ..RequirementSet::default()
        };
        assert!(matches!(
            req.validate(),
            Err(ConfigError::OutOfRange {
                name: "max price per hour",
                ..
            })
        ));
    }

    #[test]
    fn test_reliability_out_of_range() {
        for value in [-0.1, 1.1, f64::NAN] {
            let req = RequirementSet {
                min_reliability: value,
                ..RequirementSet::default()
            };
            assert!(req.validate().is_err(), "accepted {value}");
        }
    }

    #[test]
    fn test_negative_minimums_rejected() {
        let req = RequirementSet {
            min_inet_up: -1.0,
            ..RequirementSet::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_gpu_count_and_names() {
        let req = RequirementSet {
            num_gpus: 0,
            ..RequirementSet::default()
        };
        assert_eq!(req.validate(), Err(ConfigError::ZeroGpuCount));

        let req = RequirementSet {
            gpu_names: vec![String::new()],
            ..RequirementSet::default()
        };
        assert_eq!(req.validate(), Err(ConfigError::NoGpuTypes));

        let req = RequirementSet {
            gpu_names: Vec::new(),
            ..RequirementSet::default()
        };
        assert_eq!(req.validate(), Err(ConfigError::NoGpuTypes));
    }

    #[test]
    fn test_blank_gpu_name_among_valid_ones_rejected() {
        let req = RequirementSet {
            gpu_names: vec!["RTX 4090".to_string(), String::new()],
            ..RequirementSet::default()
        };
        assert_eq!(req.validate(), Err(ConfigError::NoGpuTypes));

        let req = RequirementSet {
            gpu_names: vec!["RTX 4090".to_string(), " ".to_string()],
            ..RequirementSet::default()
        };
        assert_eq!(req.validate(), Err(ConfigError::NoGpuTypes));
    }

    #[test]
    fn test_missing_credentials_listed_together() {
        let err = RunConfig::default().validate_for_launch().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredentials(vec!["VAST_API_KEY", "WANDB_API_KEY"])
        );
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: VAST_API_KEY, WANDB_API_KEY"
        );
    }

    #[test]
    fn test_search_does_not_need_wandb() {
        let config = RunConfig {
            api_key: "vast-key".to_string(),
            ..RunConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.validate_for_launch().is_err());
    }

    #[test]
    fn test_zero_disk_allocation_rejected() {
        let config = RunConfig {
            disk_space: 0.0,
            ..launchable()
        };
        assert!(config.validate_for_launch().is_err());
    }
}
