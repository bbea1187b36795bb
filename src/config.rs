use serde::{de::Error as _, Deserialize, Serialize};

/// Hard ceiling on enumerated inputs, whatever the configuration asks for.
pub const INPUT_CEILING: usize = 20;

/// Allowed fan-in per gate kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArityBounds {
    pub not: usize,
    pub min_fan_in: usize,
    pub max_fan_in: usize,
}

impl Default for ArityBounds {
    fn default() -> Self {
        ArityBounds {
            not: 1,
            min_fan_in: 2,
            max_fan_in: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub arity: ArityBounds,
    /// Label of the output column in generated truth tables.
    pub output_label: String,
    /// Upper bound on enumerated inputs; the table has `2^n` rows. Never
    /// above [`INPUT_CEILING`].
    pub max_inputs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            arity: ArityBounds::default(),
            output_label: "Y".to_string(),
            max_inputs: 16,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if config.max_inputs > INPUT_CEILING {
            return Err(serde_json::Error::custom(format!(
                "maxInputs {} is above the ceiling of {INPUT_CEILING}",
                config.max_inputs
            )));
        }
        Ok(config)
    }

    /// `max_inputs`, clamped to [`INPUT_CEILING`] for configs built in code.
    pub fn input_limit(&self) -> usize {
        self.max_inputs.min(INPUT_CEILING)
    }
}
