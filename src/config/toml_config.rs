use crate::core::catalog::IntegrityOptions;
use crate::core::export::DEFAULT_BUNDLE_NAME;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{current_year, validate_path, Validate, ValidationRules};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub storage: StorageConfig,
    pub validation: ValidationConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            snapshot_file: "market.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_year: i32,
    /// 未設定時為今年 + 1
    pub max_year: Option<i32>,
    pub max_mileage: u32,
    pub strict_references: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let rules = ValidationRules::default();
        Self {
            min_year: rules.min_year,
            max_year: None,
            max_mileage: rules.max_mileage,
            strict_references: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 預設與 storage.data_dir 相同
    pub output_path: Option<String>,
    pub bundle_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            bundle_name: DEFAULT_BUNDLE_NAME.to_string(),
        }
    }
}

impl MarketConfig {
    pub const DEFAULT_FILE: &'static str = "auto-market.toml";

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 指定檔案 > 工作目錄下的 auto-market.toml > 預設值
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(Self::DEFAULT_FILE).exists() => Self::from_file(Self::DEFAULT_FILE),
            None => Ok(Self::default()),
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKET_DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("storage.data_dir", &self.storage.data_dir)?;
        validate_path("storage.snapshot_file", &self.storage.snapshot_file)?;
        if let Some(output_path) = &self.export.output_path {
            validate_path("export.output_path", output_path)?;
        }

        if !self.export.bundle_name.ends_with(".zip") {
            return Err(MarketError::InvalidConfigValueError {
                field: "export.bundle_name".to_string(),
                value: self.export.bundle_name.clone(),
                reason: "Bundle name must end with .zip".to_string(),
            });
        }

        let rules = self.validation_rules();
        if rules.min_year > rules.max_year {
            return Err(MarketError::InvalidConfigValueError {
                field: "validation.min_year".to_string(),
                value: rules.min_year.to_string(),
                reason: format!("Must not be after max_year ({})", rules.max_year),
            });
        }
        if rules.max_mileage == 0 {
            return Err(MarketError::InvalidConfigValueError {
                field: "validation.max_mileage".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            min_year: self.validation.min_year,
            max_year: self.validation.max_year.unwrap_or_else(|| current_year() + 1),
            max_mileage: self.validation.max_mileage,
        }
    }

    pub fn integrity_options(&self) -> IntegrityOptions {
        IntegrityOptions {
            rules: self.validation_rules(),
            strict_references: self.validation.strict_references,
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.storage.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(&self.storage.snapshot_file)
    }

    pub fn export_dir(&self) -> &str {
        self.export
            .output_path
            .as_deref()
            .unwrap_or(&self.storage.data_dir)
    }
}

impl Validate for MarketConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
