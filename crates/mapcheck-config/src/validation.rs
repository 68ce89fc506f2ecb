use std::sync::OnceLock;

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{LoggingConfig, MapcheckConfig};

const MAX_INDENT_WIDTH: usize = 16;

fn rule_id_pattern() -> &'static regex::Regex {
    static RULE_ID_RE: OnceLock<regex::Regex> = OnceLock::new();
    RULE_ID_RE.get_or_init(|| {
        regex::Regex::new(r"^AM[0-9]{3}$").expect("rule id regex should compile")
    })
}

impl MapcheckConfig {
    /// Validate semantic invariants, reporting as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_rules(self, &mut out);
        validate_analysis(self, &mut out);
        validate_fixes(self, &mut out);
        validate_logging(self, &mut out);

        out
    }
}

fn validate_rules(config: &MapcheckConfig, out: &mut ValidationDiagnostics) {
    for (id, rule) in &config.rules {
        if !rule_id_pattern().is_match(id) {
            out.warnings
                .push(ConfigWarning::UnknownRuleId { id: id.clone() });
        }
        if !rule.enabled && rule.severity.is_some() {
            out.warnings
                .push(ConfigWarning::RuleSeverityIgnored { id: id.clone() });
        }
    }
}

fn validate_analysis(config: &MapcheckConfig, out: &mut ValidationDiagnostics) {
    if config.analysis.max_linq_nesting == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "analysis.max_linq_nesting".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
    for (idx, suffix) in config.analysis.service_suffixes.iter().enumerate() {
        if suffix.trim().is_empty() {
            out.warnings.push(ConfigWarning::InvalidValue {
                toml_path: format!("analysis.service_suffixes[{idx}]"),
                message: "empty suffix matches every field and is ignored".to_string(),
            });
        }
    }
}

fn validate_fixes(config: &MapcheckConfig, out: &mut ValidationDiagnostics) {
    if config.fixes.indent_width == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "fixes.indent_width".to_string(),
            message: "must be >= 1".to_string(),
        });
    } else if config.fixes.indent_width > MAX_INDENT_WIDTH {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "fixes.indent_width".to_string(),
            message: format!("unusually large indentation; expected <= {MAX_INDENT_WIDTH}"),
        });
    }
    if config.fixes.suggested_max_depth == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "fixes.suggested_max_depth".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}

fn validate_logging(config: &MapcheckConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
