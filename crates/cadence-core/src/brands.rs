use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::platform::CtaType;
use crate::ConfigError;

/// URL-safe slug: lowercase ASCII alphanumerics joined by single dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn default_language() -> String {
    "fr-FR".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_duration_days() -> u32 {
    30
}

/// Positioning and voice for one brand whose content is planned and posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub name: String,
    pub positioning: String,
    pub target_audience: String,
    #[serde(default)]
    pub value_propositions: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub cta_targets: Vec<String>,
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    #[serde(default)]
    pub startup_name: Option<String>,
    #[serde(default)]
    pub startup_url: Option<String>,
    /// Picked up by the server's daily cron job.
    #[serde(default)]
    pub schedule: bool,
}

impl BrandProfile {
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// CTA targets as typed values. Unknown names are rejected at load time,
    /// so anything that slips through here is dropped.
    #[must_use]
    pub fn cta_types(&self) -> Vec<CtaType> {
        self.cta_targets
            .iter()
            .filter_map(|raw| raw.parse().ok())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandProfile>,
}

impl BrandsFile {
    /// Look a brand up by name, compared by slug.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&BrandProfile> {
        let slug = slugify(name);
        self.brands.iter().find(|b| b.slug() == slug)
    }

    /// The brand flagged for scheduled daily runs, if any.
    #[must_use]
    pub fn scheduled(&self) -> Option<&BrandProfile> {
        self.brands.iter().find(|b| b.schedule)
    }
}

/// Load and validate brand profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile = serde_yaml::from_str(&content)?;
    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut scheduled = Vec::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let slug = brand.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' produces an empty slug",
                brand.name
            )));
        }

        if !seen_names.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        if brand.duration_days == 0 {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has duration_days 0",
                brand.name
            )));
        }

        for raw in &brand.cta_targets {
            if raw.parse::<CtaType>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has unknown cta target '{raw}'",
                    brand.name
                )));
            }
        }

        if brand.schedule {
            scheduled.push(brand.name.as_str());
        }
    }

    // Run records are keyed by date alone, so only one brand may own the daily slot.
    if scheduled.len() > 1 {
        return Err(ConfigError::Validation(format!(
            "only one brand may set schedule: true, found {}",
            scheduled.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str) -> BrandProfile {
        BrandProfile {
            name: name.to_string(),
            positioning: "The fastest way to find sponsors".to_string(),
            target_audience: "Startup founders".to_string(),
            value_propositions: vec!["Save time".to_string()],
            language: default_language(),
            tone: default_tone(),
            cta_targets: vec!["demo".to_string()],
            duration_days: 30,
            startup_name: None,
            startup_url: None,
            schedule: false,
        }
    }

    #[test]
    fn slug_simple_name() {
        assert_eq!(slugify("Acme Robotics"), "acme-robotics");
    }

    #[test]
    fn slug_special_characters() {
        assert_eq!(slugify("Arnie's  Apps!"), "arnies-apps");
    }

    #[test]
    fn slug_accented_characters() {
        // Non-ASCII chars are stripped; no dash inserted between adjacent ASCII chars
        assert_eq!(slugify("Señorita Labs"), "seorita-labs");
    }

    #[test]
    fn validate_rejects_empty_name() {
        let file = BrandsFile {
            brands: vec![brand("  ")],
        };
        let err = validate_brands(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_name() {
        let file = BrandsFile {
            brands: vec![brand("Acme"), brand("acme")],
        };
        let err = validate_brands(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate brand name"));
    }

    #[test]
    fn validate_rejects_duplicate_slug() {
        let file = BrandsFile {
            brands: vec![brand("Acme Labs"), brand("Acme--Labs")],
        };
        let err = validate_brands(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate brand slug"));
    }

    #[test]
    fn validate_rejects_unknown_cta() {
        let mut b = brand("Acme");
        b.cta_targets.push("billboard".to_string());
        let file = BrandsFile { brands: vec![b] };
        let err = validate_brands(&file).unwrap_err();
        assert!(err.to_string().contains("unknown cta target 'billboard'"));
    }

    #[test]
    fn validate_rejects_two_scheduled_brands() {
        let mut a = brand("Acme");
        a.schedule = true;
        let mut b = brand("Globex");
        b.schedule = true;
        let file = BrandsFile {
            brands: vec![a, b],
        };
        let err = validate_brands(&file).unwrap_err();
        assert!(err.to_string().contains("only one brand"));
    }

    #[test]
    fn find_matches_by_slug() {
        let mut a = brand("Acme Robotics");
        a.schedule = true;
        let file = BrandsFile {
            brands: vec![a, brand("Globex")],
        };
        assert!(validate_brands(&file).is_ok());
        assert_eq!(file.find("acme robotics").map(|b| b.name.as_str()), Some("Acme Robotics"));
        assert!(file.find("Initech").is_none());
        assert_eq!(file.scheduled().map(|b| b.name.as_str()), Some("Acme Robotics"));
    }

    #[test]
    fn cta_types_parse_spaced_names() {
        let mut b = brand("Acme");
        b.cta_targets = vec!["Free Trial".to_string(), "newsletter".to_string()];
        assert_eq!(b.cta_types(), vec![CtaType::FreeTrial, CtaType::Newsletter]);
    }

    #[test]
    fn load_brands_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("brands.yaml");
        assert!(path.exists(), "brands.yaml missing at {path:?}");
        let result = load_brands(&path);
        assert!(result.is_ok(), "failed to load brands.yaml: {result:?}");
        assert!(!result.unwrap().brands.is_empty());
    }

    #[test]
    fn load_brands_reports_missing_file() {
        let err = load_brands(Path::new("/nonexistent/brands.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileIo { .. }));
    }
}
