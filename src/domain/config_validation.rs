//! Rules file validation.
//!
//! Structural checks on `[signal.*]` and `[indicator.*]` sections: required
//! keys, known types, numeric fields. Operator tokens and max-guard pairing
//! are checked by the registry itself during registration.

use crate::domain::error::SignalbookError;
use crate::ports::config_port::ConfigPort;

pub const SIGNAL_PREFIX: &str = "signal.";
pub const INDICATOR_PREFIX: &str = "indicator.";
pub const EVALUATION_SECTION: &str = "evaluation";

pub fn validate_rules_config(config: &dyn ConfigPort) -> Result<(), SignalbookError> {
    for section in config.sections() {
        if let Some(name) = section.strip_prefix(SIGNAL_PREFIX) {
            validate_section_name(&section, name)?;
            validate_signal_section(config, &section)?;
        } else if let Some(name) = section.strip_prefix(INDICATOR_PREFIX) {
            validate_section_name(&section, name)?;
            validate_indicator_section(config, &section)?;
        }
    }
    Ok(())
}

fn validate_section_name(section: &str, name: &str) -> Result<(), SignalbookError> {
    if name.trim().is_empty() {
        return Err(SignalbookError::ConfigInvalid {
            section: section.to_string(),
            key: "name".to_string(),
            reason: "section name after the prefix must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_signal_section(config: &dyn ConfigPort, section: &str) -> Result<(), SignalbookError> {
    let kind = require_string(config, section, "type")?;
    match kind.as_str() {
        "threshold" => {
            require_number(config, section, "buy")?;
            require_number(config, section, "sell")?;
            require_string(config, section, "buy_operator")?;
            require_string(config, section, "sell_operator")?;
            optional_number(config, section, "buy_max")?;
            optional_number(config, section, "sell_max")?;
        }
        "comparison" => {
            require_string(config, section, "indicator_a")?;
            require_string(config, section, "indicator_b")?;
            require_string(config, section, "buy_operator")?;
            require_string(config, section, "sell_operator")?;
        }
        other => {
            return Err(SignalbookError::ConfigInvalid {
                section: section.to_string(),
                key: "type".to_string(),
                reason: format!("unknown signal type '{other}', expected threshold or comparison"),
            });
        }
    }
    Ok(())
}

fn validate_indicator_section(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<(), SignalbookError> {
    let kind = require_string(config, section, "kind")?;
    if kind != "lr_proj" {
        return Err(SignalbookError::ConfigInvalid {
            section: section.to_string(),
            key: "kind".to_string(),
            reason: format!("unknown indicator kind '{kind}', expected lr_proj"),
        });
    }
    let period = require_string(config, section, "period")?;
    match period.parse::<usize>() {
        Ok(p) if p >= 2 => Ok(()),
        _ => Err(SignalbookError::ConfigInvalid {
            section: section.to_string(),
            key: "period".to_string(),
            reason: "period must be an integer of at least 2".to_string(),
        }),
    }
}

/// A present, non-blank string value.
pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SignalbookError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SignalbookError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

pub fn require_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<f64, SignalbookError> {
    optional_number(config, section, key)?.ok_or_else(|| SignalbookError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

/// Blank or absent is `None`; anything else must parse as a number.
pub fn optional_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SignalbookError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => {
            s.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| SignalbookError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("expected a number, got '{}'", s.trim()),
                })
        }
        _ => Ok(None),
    }
}

/// A present, non-blank string value or `None`.
pub fn optional_string(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_rules_config_passes() {
        let config = make_config(
            r#"
[signal.TSF]
type = threshold
buy = 10
sell = 5
buy_operator = >
sell_operator = <
buy_max = 20
buy_max_operator = >

[signal.cross]
type = comparison
indicator_a = Fast_TSF
indicator_b = Slow_TSF
buy_operator = >
sell_operator = <

[indicator.Fast_TSF]
kind = lr_proj
source = close
period = 5

[evaluation]
latest_only = true
"#,
        );
        assert!(validate_rules_config(&config).is_ok());
    }

    #[test]
    fn missing_type_is_reported() {
        let config = make_config("[signal.TSF]\nbuy = 10\n");
        let err = validate_rules_config(&config).unwrap_err();
        assert!(
            matches!(err, SignalbookError::ConfigMissing { ref section, ref key }
                if section == "signal.TSF" && key == "type")
        );
    }

    #[test]
    fn unknown_type_is_invalid() {
        let config = make_config("[signal.TSF]\ntype = crossover\n");
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigInvalid { key, .. } if key == "type"));
    }

    #[test]
    fn threshold_requires_cutoffs_and_operators() {
        let config = make_config(
            "[signal.TSF]\ntype = threshold\nbuy = 10\nbuy_operator = >\nsell_operator = <\n",
        );
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigMissing { key, .. } if key == "sell"));

        let config = make_config("[signal.TSF]\ntype = threshold\nbuy = 10\nsell = 5\n");
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigMissing { key, .. } if key == "buy_operator"));
    }

    #[test]
    fn non_numeric_cutoff_is_invalid() {
        let config = make_config(
            "[signal.TSF]\ntype = threshold\nbuy = ten\nsell = 5\nbuy_operator = >\nsell_operator = <\n",
        );
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigInvalid { key, .. } if key == "buy"));
    }

    #[test]
    fn non_numeric_max_is_invalid() {
        let config = make_config(
            "[signal.TSF]\ntype = threshold\nbuy = 1\nsell = 5\nbuy_operator = >\nsell_operator = <\nsell_max = lots\n",
        );
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigInvalid { key, .. } if key == "sell_max"));
    }

    #[test]
    fn comparison_requires_both_indicators() {
        let config = make_config(
            "[signal.x]\ntype = comparison\nindicator_a = A\nbuy_operator = >\nsell_operator = <\n",
        );
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigMissing { key, .. } if key == "indicator_b"));
    }

    #[test]
    fn indicator_period_checked() {
        let config = make_config("[indicator.TSF]\nkind = lr_proj\nperiod = 1\n");
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigInvalid { key, .. } if key == "period"));

        let config = make_config("[indicator.TSF]\nkind = ema\nperiod = 10\n");
        let err = validate_rules_config(&config).unwrap_err();
        assert!(matches!(err, SignalbookError::ConfigInvalid { key, .. } if key == "kind"));
    }

    #[test]
    fn empty_section_name_is_invalid() {
        let config = make_config("[signal.]\ntype = threshold\n");
        assert!(validate_rules_config(&config).is_err());
    }

    #[test]
    fn optional_number_treats_blank_as_absent() {
        let config = make_config("[s]\na =\nb = 2.5\n");
        assert_eq!(optional_number(&config, "s", "a").unwrap(), None);
        assert_eq!(optional_number(&config, "s", "b").unwrap(), Some(2.5));
        assert_eq!(optional_number(&config, "s", "c").unwrap(), None);
    }
}
