//! 邮件模板系统

use eztax_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

const VERIFICATION_HTML: &str = include_str!("../templates/verification.html");
const VERIFICATION_TXT: &str = include_str!("../templates/verification.txt");

/// 目录模板必须提供的文件
const REQUIRED_TEMPLATES: &[&str] = &["verification.html", "verification.txt"];

/// 渲染后的邮件正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

/// 邮件模板，每个模板一个实现
///
/// 模板引擎会查找 `{name}.html` 与 `{name}.txt` 两个文件。
pub trait EmailTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    fn context(&self) -> serde_json::Value;
}

/// 验证码邮件
#[derive(Debug, Clone)]
pub struct VerificationEmail {
    pub username: String,
    pub otp: String,
}

impl VerificationEmail {
    pub fn new(username: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            otp: otp.into(),
        }
    }
}

impl EmailTemplate for VerificationEmail {
    fn name(&self) -> &'static str {
        "verification"
    }

    fn context(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "otp": self.otp,
        })
    }
}

/// 模板渲染接口
pub trait TemplateRenderer: Send + Sync {
    fn render_email(&self, template: &dyn EmailTemplate) -> AppResult<RenderedEmail>;
}

/// 基于 Tera 的模板管理器
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// 从目录加载模板，缺少内置模板对应的文件时报错
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*", template_dir.trim_end_matches('/'));
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::template(format!("Failed to load email templates: {}", e)))?;

        let engine = Self { tera };
        engine.ensure_templates(REQUIRED_TEMPLATES)?;

        debug!(template_dir = %template_dir, "Email templates loaded");

        Ok(engine)
    }

    /// 检查模板是否都已加载
    pub fn ensure_templates(&self, names: &[&str]) -> AppResult<()> {
        let loaded: Vec<&str> = self.tera.get_template_names().collect();
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !loaded.contains(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::template(format!(
                "Missing email templates: {}",
                missing.join(", ")
            )))
        }
    }

    /// 使用编译进二进制的内置模板
    pub fn builtin() -> AppResult<Self> {
        let mut templates = HashMap::new();
        templates.insert("verification.html".to_string(), VERIFICATION_HTML.to_string());
        templates.insert("verification.txt".to_string(), VERIFICATION_TXT.to_string());
        Self::from_strings(templates)
    }

    /// 配置了目录则从目录加载，否则使用内置模板
    pub fn from_config(template_dir: Option<&str>) -> AppResult<Self> {
        match template_dir {
            Some(dir) => Self::new(dir),
            None => Self::builtin(),
        }
    }

    /// 从内存中的模板字符串创建
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::template(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// 渲染单个模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::template(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::template(format!("Failed to render template {}: {}", template_name, e))
        })
    }
}

impl TemplateRenderer for TemplateEngine {
    fn render_email(&self, template: &dyn EmailTemplate) -> AppResult<RenderedEmail> {
        let name = template.name();
        let context = template.context();

        let html = self.render(&format!("{}.html", name), &context)?;
        let text = self.render(&format!("{}.txt", name), &context)?;

        Ok(RenderedEmail { html, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 避免 `.tmp` 前缀的隐藏目录被 glob 跳过
    fn template_dir() -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix("eztax-templates-")
            .tempdir()
            .unwrap()
    }

    #[test]
    fn test_render_from_strings() {
        let mut templates = HashMap::new();
        templates.insert(
            "test.html".to_string(),
            "<h1>Hello {{ name }}!</h1>".to_string(),
        );

        let engine = TemplateEngine::from_strings(templates).unwrap();

        let context = serde_json::json!({
            "name": "World"
        });

        let result = engine.render("test.html", &context).unwrap();
        assert_eq!(result, "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_builtin_verification_contains_username_and_code() {
        let engine = TemplateEngine::builtin().unwrap();
        let rendered = engine
            .render_email(&VerificationEmail::new("alice", "123456"))
            .unwrap();

        assert!(rendered.html.contains("alice"));
        assert!(rendered.html.contains("123456"));
        assert!(rendered.text.contains("Hello alice,"));
        assert!(rendered.text.contains("123456"));
    }

    #[test]
    fn test_html_is_escaped_but_text_is_not() {
        let engine = TemplateEngine::builtin().unwrap();
        let rendered = engine
            .render_email(&VerificationEmail::new("<b>mallory</b>", "654321"))
            .unwrap();

        assert!(!rendered.html.contains("<b>mallory</b>"));
        assert!(rendered.html.contains("&lt;b&gt;mallory"));
        assert!(rendered.text.contains("<b>mallory</b>"));
    }

    #[test]
    fn test_missing_template_is_error() {
        let engine = TemplateEngine::from_strings(HashMap::new()).unwrap();
        let result = engine.render_email(&VerificationEmail::new("alice", "123456"));

        assert!(matches!(result, Err(AppError::Template(_))));
    }

    #[test]
    fn test_builtin_has_required_templates() {
        let engine = TemplateEngine::builtin().unwrap();
        assert!(engine.ensure_templates(REQUIRED_TEMPLATES).is_ok());
    }

    #[test]
    fn test_empty_template_dir_is_rejected() {
        let dir = template_dir();

        let result = TemplateEngine::from_config(dir.path().to_str());
        match result {
            Err(AppError::Template(msg)) => {
                assert!(msg.contains("verification.html"));
                assert!(msg.contains("verification.txt"));
            }
            Err(other) => panic!("Expected Template error, got {:?}", other),
            Ok(_) => panic!("Expected empty template dir to be rejected"),
        }
    }

    #[test]
    fn test_partial_template_dir_is_rejected() {
        let dir = template_dir();
        std::fs::write(dir.path().join("verification.html"), VERIFICATION_HTML).unwrap();

        let result = TemplateEngine::new(dir.path().to_str().unwrap());
        match result {
            Err(AppError::Template(msg)) => {
                assert_eq!(msg, "Missing email templates: verification.txt");
            }
            Err(other) => panic!("Expected Template error, got {:?}", other),
            Ok(_) => panic!("Expected partial template dir to be rejected"),
        }
    }

    #[test]
    fn test_template_dir_overrides_builtin() {
        let dir = template_dir();
        std::fs::write(
            dir.path().join("verification.html"),
            "<p>Hi {{ username }}, code {{ otp }}</p>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("verification.txt"),
            "Hi {{ username }}, code {{ otp }}",
        )
        .unwrap();

        let engine = TemplateEngine::from_config(dir.path().to_str()).unwrap();
        let rendered = engine
            .render_email(&VerificationEmail::new("alice", "123456"))
            .unwrap();

        assert_eq!(rendered.html, "<p>Hi alice, code 123456</p>");
        assert_eq!(rendered.text, "Hi alice, code 123456");
    }

    #[test]
    fn test_missing_template_dir_falls_back_to_builtin() {
        let engine = TemplateEngine::from_config(None).unwrap();
        assert!(engine
            .render_email(&VerificationEmail::new("bob", "000111"))
            .is_ok());
    }
}
