use serde_json::Value;

use crate::errors::{Result, VanceError};
use crate::scale::EnlargeScale;

/// Job templates shipped with the crate, keyed by name.
const TEMPLATES: &[(&str, &str)] = &[(
    "image-enlarger",
    include_str!("templates/image-enlarger.json"),
)];

/// Preset files saved from the web console sometimes start with a UTF-8 BOM,
/// which the service rejects inside `jconfig`.
const BOM: char = '\u{feff}';

/// Caller-facing knobs for the image enlarger module.
#[derive(Debug, Clone)]
pub struct EnlargeOptions {
    /// Magnification factor. Default: 2x.
    pub scale: EnlargeScale,
    /// Noise suppression level, 0-100. Default: 26.
    pub suppress_noise: u8,
    /// Blur removal level, 0-100. Default: 26.
    pub remove_blur: u8,
}

impl Default for EnlargeOptions {
    fn default() -> Self {
        Self {
            scale: EnlargeScale::X2,
            suppress_noise: 26,
            remove_blur: 26,
        }
    }
}

/// An immutable, validated transformation job configuration.
///
/// A config is a named template (a default parameter set for one
/// transformation module) with caller overrides applied on top. It is
/// constructed once via [`JobConfig::builder`] or
/// [`JobConfigBuilder::from_json`] and only read afterwards; the serialized
/// form returned by [`to_wire`](Self::to_wire) is transmitted byte-for-byte
/// as the `jconfig` request field.
///
/// # Example
///
/// ```
/// use vanceai::JobConfig;
///
/// # fn example() -> vanceai::Result<()> {
/// let config = JobConfig::builder("image-enlarger")?
///     .param("scale", "4x")
///     .param("suppress_noise", 60)
///     .build()?;
/// assert_eq!(config.module(), "enlarge");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JobConfig {
    doc: Value,
}

impl JobConfig {
    /// Start building from a named built-in template.
    ///
    /// Returns [`VanceError::Config`] if no template with that name ships
    /// with the crate.
    pub fn builder(template: &str) -> Result<JobConfigBuilder> {
        let raw = TEMPLATES
            .iter()
            .find(|(name, _)| *name == template)
            .map(|(_, raw)| *raw)
            .ok_or_else(|| VanceError::Config(format!("unknown template {template:?}")))?;
        JobConfigBuilder::from_json(raw)
    }

    /// Build the image-enlarger config from typed options.
    pub fn enlarge(opts: &EnlargeOptions) -> Result<JobConfig> {
        JobConfig::builder("image-enlarger")?
            .param("scale", opts.scale.as_wire())
            .param("suppress_noise", opts.suppress_noise)
            .param("remove_blur", opts.remove_blur)
            .build()
    }

    /// The transformation module this config drives.
    pub fn module(&self) -> &str {
        self.doc
            .pointer("/config/module")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Read a module parameter.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.doc.pointer(&format!("/config/module_params/{key}"))
    }

    /// The compact JSON encoding transmitted as the `jconfig` field.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(&self.doc).expect("JSON value serialization does not fail")
    }

    fn validate(&self) -> Result<()> {
        if self.module() != "enlarge" {
            return Ok(());
        }

        if let Some(scale) = self.param("scale") {
            let known = scale
                .as_str()
                .is_some_and(|s| EnlargeScale::from_wire(s).is_some());
            if !known {
                return Err(VanceError::Config(format!(
                    "scale {scale} not available, use one of 2x, 4x, 6x, 8x"
                )));
            }
        }
        for key in ["suppress_noise", "remove_blur"] {
            if let Some(level) = self.param(key) {
                if !level.as_u64().is_some_and(|v| v <= 100) {
                    return Err(VanceError::Config(format!(
                        "{key} must be an integer between 0 and 100, got {level}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Applies caller overrides to a template, then validates and freezes the
/// result into a [`JobConfig`].
#[derive(Debug)]
pub struct JobConfigBuilder {
    doc: Value,
    overrides: Vec<(String, Value)>,
}

impl JobConfigBuilder {
    /// Start from a caller-supplied template blob, for presets not shipped
    /// with the crate. A leading UTF-8 BOM is stripped before parsing.
    ///
    /// Returns [`VanceError::Config`] if the blob is not valid JSON or has
    /// no `config.module_params` object.
    pub fn from_json(raw: &str) -> Result<JobConfigBuilder> {
        let raw = raw.trim_start_matches(BOM);
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| VanceError::Config(format!("template is not valid JSON: {e}")))?;

        if !doc
            .pointer("/config/module_params")
            .is_some_and(Value::is_object)
        {
            return Err(VanceError::Config(
                "template has no config.module_params object".into(),
            ));
        }

        Ok(JobConfigBuilder {
            doc,
            overrides: Vec::new(),
        })
    }

    /// Override a module parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Apply the overrides and validate the module's documented constraints.
    pub fn build(mut self) -> Result<JobConfig> {
        let params = self
            .doc
            .pointer_mut("/config/module_params")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                VanceError::Config("template has no config.module_params object".into())
            })?;
        for (key, value) in self.overrides {
            params.insert(key, value);
        }

        let config = JobConfig { doc: self.doc };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_over_template_defaults() {
        let opts = EnlargeOptions {
            scale: EnlargeScale::X4,
            suppress_noise: 10,
            remove_blur: 75,
        };
        let config = JobConfig::enlarge(&opts).unwrap();

        // Serialize and parse back: overrides win, untouched defaults survive.
        let parsed: Value = serde_json::from_str(&config.to_wire()).unwrap();
        let params = parsed.pointer("/config/module_params").unwrap();
        assert_eq!(params["scale"], "4x");
        assert_eq!(params["suppress_noise"], 10);
        assert_eq!(params["remove_blur"], 75);
        assert_eq!(params["model_name"], "EnlargeStable");
    }

    #[test]
    fn wire_encoding_is_compact_and_bom_free() {
        let config = JobConfig::enlarge(&EnlargeOptions::default()).unwrap();
        let wire = config.to_wire();
        assert!(wire.starts_with('{'));
        assert!(!wire.contains('\n'));
    }

    #[test]
    fn unknown_template_is_a_config_error() {
        let err = JobConfig::builder("video-enlarger").unwrap_err();
        assert!(matches!(err, VanceError::Config(_)));
    }

    #[test]
    fn scale_outside_the_set_is_a_config_error() {
        let err = JobConfig::builder("image-enlarger")
            .unwrap()
            .param("scale", "3x")
            .build()
            .unwrap_err();
        assert!(matches!(err, VanceError::Config(_)));
    }

    #[test]
    fn noise_level_above_range_is_a_config_error() {
        let err = JobConfig::builder("image-enlarger")
            .unwrap()
            .param("suppress_noise", 101)
            .build()
            .unwrap_err();
        assert!(matches!(err, VanceError::Config(_)));
    }

    #[test]
    fn caller_templates_are_bom_stripped() {
        let raw = "\u{feff}{\"config\": {\"module\": \"sharpen\", \"module_params\": {\"level\": 3}}}";
        let config = JobConfigBuilder::from_json(raw).unwrap().build().unwrap();
        assert_eq!(config.module(), "sharpen");
        assert_eq!(config.param("level"), Some(&Value::from(3)));
        assert!(!config.to_wire().starts_with('\u{feff}'));
    }

    #[test]
    fn template_without_module_params_is_rejected() {
        let err = JobConfigBuilder::from_json("{\"config\": {}}").unwrap_err();
        assert!(matches!(err, VanceError::Config(_)));
    }
}
