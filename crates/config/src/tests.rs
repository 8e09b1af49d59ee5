use crate::{AppConfig, ConfigError, EmailProvider, ResendConfig};
use figment::{
    Figment, Jail,
    providers::{Format, Toml},
};
use secrecy::{ExposeSecret, Secret};

fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
    AppConfig::from_figment(Figment::from(Toml::string(toml)))
}

#[test]
fn test_secret_redaction() {
    let secret = Secret::new("re_live_key".to_string());
    let debug_output = format!("{:?}", secret);
    assert!(debug_output.contains("Secret([REDACTED"));
    assert!(!debug_output.contains("re_live_key"));
}

#[test]
fn test_config_struct_redaction() {
    let config = ResendConfig {
        api_key: Secret::new("re_123456789".to_string()),
        base_url: "https://api.resend.com".to_string(),
    };
    let debug_output = format!("{:?}", config);
    assert!(!debug_output.contains("re_123456789"));
    assert!(debug_output.contains("Secret([REDACTED"));
}

#[test]
fn test_defaults_from_empty_config() {
    let config = from_toml("").unwrap();

    assert_eq!(config.app_name, "eztax-notify");
    assert!(config.is_development());
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.telemetry.log_level, "info");
    assert_eq!(config.email.provider, EmailProvider::Log);
    assert_eq!(config.email.from_address, "onboarding@resend.dev");
    assert_eq!(config.email.verification_subject, "EZTax | Verification Code");
    assert!(config.email.template_dir.is_none());
}

#[test]
fn test_resend_section() {
    let config = from_toml(
        r#"
        app_env = "production"

        [email]
        provider = "resend"

        [email.resend]
        api_key = "re_abc"
        "#,
    )
    .unwrap();

    assert!(config.is_production());
    assert_eq!(config.email.provider, EmailProvider::Resend);
    let resend = config.email.resend.unwrap();
    assert_eq!(resend.api_key.expose_secret(), "re_abc");
    assert_eq!(resend.base_url, "https://api.resend.com");
}

#[test]
fn test_smtp_section_defaults() {
    let config = from_toml(
        r#"
        [email]
        provider = "smtp"

        [email.smtp]
        host = "smtp.example.com"
        username = "mailer"
        password = "hunter2"
        "#,
    )
    .unwrap();

    let smtp = config.email.smtp.unwrap();
    assert_eq!(smtp.port, 587);
    assert!(smtp.use_tls);
}

#[test]
fn test_missing_provider_section_is_rejected() {
    let err = from_toml(
        r#"
        [email]
        provider = "resend"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("email.resend")));
}

#[test]
fn test_unknown_provider_is_rejected() {
    let err = from_toml(
        r#"
        [email]
        provider = "carrier-pigeon"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_smtp_tls_can_be_disabled() {
    let config = from_toml(
        r#"
        [email]
        provider = "smtp"

        [email.smtp]
        host = "localhost"
        port = 1025
        username = "mailer"
        password = "hunter2"
        use_tls = false
        "#,
    )
    .unwrap();

    assert!(!config.email.smtp.unwrap().use_tls);
}

#[test]
fn test_load_layers_env_over_files() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "default.toml",
            r#"
            app_env = "development"

            [server]
            port = 8080

            [telemetry]
            log_level = "debug"

            [email]
            provider = "log"
            "#,
        )?;
        jail.create_file(
            "production.toml",
            r#"
            app_env = "production"

            [server]
            port = 8081

            [telemetry]
            log_level = "info"

            [email]
            provider = "resend"

            [email.resend]
            base_url = "https://api.resend.com"
            "#,
        )?;

        jail.set_env("APP_ENV", "production");
        jail.set_env("EZTAX_EMAIL__RESEND__API_KEY", "re_from_env");
        jail.set_env("EZTAX_SERVER__PORT", "9090");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;

        assert!(config.is_production());
        // {APP_ENV}.toml 覆盖 default.toml
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.email.provider, EmailProvider::Resend);
        // 环境变量覆盖文件
        assert_eq!(config.server.port, 9090);

        let resend = config.email.resend.expect("resend section");
        assert_eq!(resend.api_key.expose_secret(), "re_from_env");
        assert_eq!(resend.base_url, "https://api.resend.com");

        Ok(())
    });
}

#[test]
fn test_load_without_api_key_fails() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "production.toml",
            r#"
            [email]
            provider = "resend"

            [email.resend]
            base_url = "https://api.resend.com"
            "#,
        )?;
        jail.set_env("APP_ENV", "production");

        let result = AppConfig::load(".");
        assert!(matches!(result, Err(ConfigError::Load(_))));

        Ok(())
    });
}
