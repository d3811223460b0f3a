use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`GeneratorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which judge the output is sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Public,
    Mutual,
}

impl Mode {
    /// Hard ceiling on output lines.
    #[must_use]
    pub const fn max_lines(self) -> usize {
        match self {
            Self::Public => 10_000,
            Self::Mutual => 3_000,
        }
    }

    /// Largest bulk load.
    #[must_use]
    pub const fn max_load_persons(self) -> usize {
        match self {
            Self::Public => 300,
            Self::Mutual => 100,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Mutual => "mutual",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Knobs of the selection policy and the driver's stop conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Chance per step of steering towards uncovered outcomes.
    #[serde(default = "default_coverage_attempt_percent")]
    pub coverage_attempt_percent: u8,
    /// Within a coverage step, chance of preferring a missing success.
    #[serde(default = "default_prioritize_success_percent")]
    pub prioritize_success_percent: u8,
    /// Chance a weighted pick aims at one of the command's failures.
    #[serde(default = "default_error_attempt_percent")]
    pub error_attempt_percent: u8,
    /// Progress at which the build phase ends.
    #[serde(default = "default_build_phase_end_percent")]
    pub build_phase_end_percent: u8,
    /// Progress at which the random-mix phase ends.
    #[serde(default = "default_mix_phase_end_percent")]
    pub mix_phase_end_percent: u8,
    /// Main-loop attempts allowed per target instruction.
    #[serde(default = "default_max_attempts_factor")]
    pub max_attempts_factor: usize,
    /// Floor of the consecutive-miss limit.
    #[serde(default = "default_min_stall_limit")]
    pub min_stall_limit: usize,
    /// The consecutive-miss limit is `target / stall_divisor` above the floor.
    #[serde(default = "default_stall_divisor")]
    pub stall_divisor: usize,
    /// Sweep attempts per missing success, per pass.
    #[serde(default = "default_sweep_success_multiplier")]
    pub sweep_success_multiplier: usize,
    /// Sweep attempts per missing failure, per pass.
    #[serde(default = "default_sweep_failure_multiplier")]
    pub sweep_failure_multiplier: usize,
    /// Instructions the sweep may add, as a percent of the target.
    #[serde(default = "default_sweep_allowance_percent")]
    pub sweep_allowance_percent: u16,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            coverage_attempt_percent: default_coverage_attempt_percent(),
            prioritize_success_percent: default_prioritize_success_percent(),
            error_attempt_percent: default_error_attempt_percent(),
            build_phase_end_percent: default_build_phase_end_percent(),
            mix_phase_end_percent: default_mix_phase_end_percent(),
            max_attempts_factor: default_max_attempts_factor(),
            min_stall_limit: default_min_stall_limit(),
            stall_divisor: default_stall_divisor(),
            sweep_success_multiplier: default_sweep_success_multiplier(),
            sweep_failure_multiplier: default_sweep_failure_multiplier(),
            sweep_allowance_percent: default_sweep_allowance_percent(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeneratorConfig
// ---------------------------------------------------------------------------

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub mode: Mode,
    /// Requested instruction count. Clamped to the mode's line ceiling.
    #[serde(default = "default_target")]
    pub target: usize,
    #[serde(default)]
    pub seed: u64,
    /// Run the invariant oracle after every applied instruction.
    #[serde(default)]
    pub check_invariants: bool,
    #[serde(default)]
    pub tuning: Tuning,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            target: default_target(),
            seed: 0,
            check_invariants: false,
            tuning: Tuning::default(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults for `mode` with the given count and seed.
    #[must_use]
    pub fn new(mode: Mode, target: usize, seed: u64) -> Self {
        Self {
            mode,
            target,
            seed,
            ..Self::default()
        }
    }

    /// Load from a TOML file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate that the configuration is sensible.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero target, a percent above
    /// 100, inverted phase boundaries, or zero multipliers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;
        if self.target == 0 {
            return Err(invalid("target must be > 0"));
        }
        for (name, value) in [
            ("coverage_attempt_percent", t.coverage_attempt_percent),
            ("prioritize_success_percent", t.prioritize_success_percent),
            ("error_attempt_percent", t.error_attempt_percent),
            ("build_phase_end_percent", t.build_phase_end_percent),
            ("mix_phase_end_percent", t.mix_phase_end_percent),
        ] {
            if value > 100 {
                return Err(invalid(format!("{name} must be <= 100, got {value}")));
            }
        }
        if t.build_phase_end_percent > t.mix_phase_end_percent {
            return Err(invalid(format!(
                "build_phase_end_percent ({}) must not exceed mix_phase_end_percent ({})",
                t.build_phase_end_percent, t.mix_phase_end_percent
            )));
        }
        if t.max_attempts_factor == 0 {
            return Err(invalid("max_attempts_factor must be > 0"));
        }
        if t.stall_divisor == 0 {
            return Err(invalid("stall_divisor must be > 0"));
        }
        if t.sweep_success_multiplier == 0 || t.sweep_failure_multiplier == 0 {
            return Err(invalid("sweep multipliers must be > 0"));
        }
        Ok(())
    }

    /// Target after clamping to the mode ceiling.
    #[must_use]
    pub fn effective_target(&self) -> usize {
        self.target.min(self.mode.max_lines())
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.effective_target()
            .saturating_mul(self.tuning.max_attempts_factor)
    }

    #[must_use]
    pub fn stall_limit(&self) -> usize {
        self.tuning
            .min_stall_limit
            .max(self.effective_target() / self.tuning.stall_divisor.max(1))
    }

    /// Instructions the guarantee sweep may add beyond the main loop.
    #[must_use]
    pub fn sweep_allowance(&self) -> usize {
        self.effective_target() * usize::from(self.tuning.sweep_allowance_percent) / 100
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

const fn default_target() -> usize {
    1_000
}

const fn default_coverage_attempt_percent() -> u8 {
    15
}

const fn default_prioritize_success_percent() -> u8 {
    60
}

const fn default_error_attempt_percent() -> u8 {
    40
}

const fn default_build_phase_end_percent() -> u8 {
    30
}

const fn default_mix_phase_end_percent() -> u8 {
    75
}

const fn default_max_attempts_factor() -> usize {
    25
}

const fn default_min_stall_limit() -> usize {
    500
}

const fn default_stall_divisor() -> usize {
    4
}

const fn default_sweep_success_multiplier() -> usize {
    25
}

const fn default_sweep_failure_multiplier() -> usize {
    15
}

const fn default_sweep_allowance_percent() -> u16 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn derived_limits() {
        let config = GeneratorConfig::new(Mode::Public, 4_000, 1);
        assert_eq!(config.max_attempts(), 100_000);
        assert_eq!(config.stall_limit(), 1_000);
        assert_eq!(config.sweep_allowance(), 2_000);

        let small = GeneratorConfig::new(Mode::Mutual, 100, 1);
        assert_eq!(small.stall_limit(), 500);
        assert_eq!(
            GeneratorConfig::new(Mode::Mutual, 1, 1).sweep_allowance(),
            0
        );
    }

    #[test]
    fn target_is_clamped_to_mode_ceiling() {
        assert_eq!(
            GeneratorConfig::new(Mode::Mutual, 50_000, 0).effective_target(),
            3_000
        );
        assert_eq!(
            GeneratorConfig::new(Mode::Public, 50_000, 0).effective_target(),
            10_000
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = GeneratorConfig::default();
        config.target = 0;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.tuning.error_attempt_percent = 101;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.tuning.build_phase_end_percent = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: GeneratorConfig = toml::from_str(
            r#"
mode = "mutual"
target = 200

[tuning]
error_attempt_percent = 10
"#,
        )
        .expect("parse");
        assert_eq!(config.mode, Mode::Mutual);
        assert_eq!(config.target, 200);
        assert_eq!(config.tuning.error_attempt_percent, 10);
        assert_eq!(config.tuning.coverage_attempt_percent, 15);
        assert!(!config.check_invariants);
    }

    #[test]
    fn load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("netgen.toml");
        std::fs::write(&path, "target = \"many\"").expect("write");
        let err = GeneratorConfig::load(&path).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("netgen.toml"));
    }
}
