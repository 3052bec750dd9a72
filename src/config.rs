//! 配置模块，负责从JSON配置文件加载字段注册表

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::field::{FieldConfig, FieldConfigRegistry, FieldType, OperatorSet};

/// 字段配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON字段配置: {0}")]
    Json(#[from] serde_json::Error),
}

/// 单个字段的JSON定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 输出到谓词片段中的名称，缺省时使用键名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 缺省时按字段类型使用默认的运算符集合
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<OperatorSet>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub not_null_guard: bool,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            model_name: None,
            field_type,
            operators: None,
            case_insensitive: false,
            not_null_guard: false,
        }
    }

    fn to_field_config(&self, key: &str) -> FieldConfig {
        let model_name = self.model_name.clone().unwrap_or_else(|| key.to_string());
        FieldConfig {
            model_name,
            field_type: self.field_type,
            allowed_operators: self
                .operators
                .unwrap_or_else(|| OperatorSet::defaults_for(self.field_type)),
            to_upper_for_comparison: self.case_insensitive,
            require_not_null_guard: self.not_null_guard,
        }
    }
}

/// 字段注册表配置结构：过滤名 → 字段定义
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldDefinition>,
}

impl RegistryConfig {
    /// 从JSON文件加载字段配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn into_registry(self) -> FieldConfigRegistry {
        let mut registry = FieldConfigRegistry::new();
        for (key, definition) in &self.fields {
            registry.insert(key, definition.to_field_config(key));
        }
        registry
    }

    /// 创建演示配置（用于 REPL 或测试的 fallback）
    pub fn demo() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "name".to_string(),
            FieldDefinition {
                model_name: Some("Name".to_string()),
                not_null_guard: true,
                ..FieldDefinition::new(FieldType::String)
            },
        );
        fields.insert(
            "email".to_string(),
            FieldDefinition {
                model_name: Some("Email".to_string()),
                case_insensitive: true,
                not_null_guard: true,
                ..FieldDefinition::new(FieldType::String)
            },
        );
        fields.insert(
            "age".to_string(),
            FieldDefinition {
                model_name: Some("Age".to_string()),
                ..FieldDefinition::new(FieldType::Int32)
            },
        );
        fields.insert(
            "active".to_string(),
            FieldDefinition {
                model_name: Some("Active".to_string()),
                ..FieldDefinition::new(FieldType::Boolean)
            },
        );
        fields.insert(
            "created".to_string(),
            FieldDefinition {
                model_name: Some("CreatedAt".to_string()),
                ..FieldDefinition::new(FieldType::DateTime)
            },
        );
        Self { fields }
    }
}

impl FieldConfigRegistry {
    /// 从JSON文件加载字段注册表
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        RegistryConfig::from_json_file(path).map(RegistryConfig::into_registry)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        RegistryConfig::from_json_str(content).map(RegistryConfig::into_registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldRegistry;
    use crate::token::TokenKind;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "name": { "model_name": "Name", "type": "string", "not_null_guard": true },
        "email": { "model_name": "Email", "type": "string", "case_insensitive": true },
        "age": { "type": "int32", "operators": ["eq", "gt", "in"] }
    }"#;

    #[test]
    fn test_load_valid_json_config() {
        // 创建临时配置文件
        let temp_file = std::env::temp_dir().join("query_filter_test_fields.json");
        let mut file = fs::File::create(&temp_file).unwrap();
        writeln!(file, "{}", SAMPLE).unwrap();

        // 测试加载
        let registry = FieldConfigRegistry::from_json_file(&temp_file).unwrap();
        assert_eq!(registry.len(), 3);
        let name = registry.resolve("Name").unwrap();
        assert_eq!(name.model_name, "Name");
        assert!(name.require_not_null_guard);
        assert!(name.permits(TokenKind::StartsWith));

        // 清理
        fs::remove_file(&temp_file).ok();
    }

    #[test]
    fn test_defaults_from_key_and_type() {
        let registry = FieldConfigRegistry::from_json_str(SAMPLE).unwrap();
        let age = registry.resolve("age").unwrap();
        assert_eq!(age.model_name, "age");
        assert!(age.permits(TokenKind::GreaterThan));
        assert!(!age.permits(TokenKind::LessThan));

        let email = registry.resolve("email").unwrap();
        assert!(email.folds_case());
        assert!(!email.require_not_null_guard);
    }

    #[test]
    fn test_invalid_json_config() {
        let result = RegistryConfig::from_json_str("invalid json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = RegistryConfig::from_json_str(r#"{"age": {"type": "int32", "operators": ["between"]}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = RegistryConfig::from_json_file("non_existent_file.json");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_demo_config() {
        let config = RegistryConfig::demo();
        let json = serde_json::to_string(&config).unwrap();
        let reloaded = RegistryConfig::from_json_str(&json).unwrap();
        assert_eq!(reloaded, config);

        let registry = config.into_registry();
        assert_eq!(registry.resolve("created").unwrap().field_type, FieldType::DateTime);
    }
}
