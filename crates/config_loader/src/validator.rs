//! 配置校验模块
//!
//! 校验规则：
//! - 字段约束 (validator derive): project/dataset/table/topic 非空, endpoint 为 URL, 并发数范围
//! - endpoint 只允许 http / https
//! - project_id / dataset_id / table_id 只允许 `[A-Za-z0-9_-]` (会被拼入 URL 与 SQL)
//! - topic_id 额外允许 `.` `~` `+` (会被拼入 URL)
//! - credentials_path 若配置则必须存在

use contracts::{ContractError, GatewayConfig};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 GatewayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &GatewayConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_identifiers(config)?;
    validate_credentials(config)?;
    Ok(())
}

/// 校验 derive 声明的字段约束
fn validate_fields(config: &GatewayConfig) -> Result<(), ContractError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();

    match flat.into_iter().next() {
        Some((field, message)) => Err(ContractError::config_validation(field, message)),
        None => Err(ContractError::config_validation("config", errors.to_string())),
    }
}

/// 将嵌套的 ValidationErrors 展开为 (路径, 消息)
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// 校验 project / dataset / table / topic 标识符字符集
fn validate_identifiers(config: &GatewayConfig) -> Result<(), ContractError> {
    let checks = [
        ("gcp.project_id", config.gcp.project_id.as_str(), ""),
        ("gcp.dataset_id", config.gcp.dataset_id.as_str(), ""),
        ("bigquery.table_id", config.bigquery.table_id.as_str(), ""),
        ("pubsub.topic_id", config.pubsub.topic_id.as_str(), ".~+"),
    ];

    for (field, value, extra) in checks {
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || extra.contains(*c)))
        {
            return Err(ContractError::config_validation(
                field,
                format!("invalid character '{bad}' in '{value}'"),
            ));
        }
    }
    Ok(())
}

/// 校验凭据文件存在
fn validate_credentials(config: &GatewayConfig) -> Result<(), ContractError> {
    if let Some(path) = &config.gcp.credentials_path {
        if !path.exists() {
            return Err(ContractError::config_validation(
                "gcp.credentials_path",
                format!("credentials file not found: {}", path.display()),
            ));
        }
    }
    Ok(())
}
