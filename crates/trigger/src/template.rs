//! Minijinja rendering for webhook body templates.
//!
//! Templates are arbitrary strings from configuration (not pre-registered
//! files), so a fresh [`minijinja::Environment`] is built per render call.
//! The template sees every trigger setting as a top-level variable plus
//! `objects`, the workloads accumulated for this dispatch.

use std::collections::HashMap;

use lightsout_scanner::Object;

use crate::error::TriggerError;

/// Render `template` with the trigger settings and accumulated objects.
pub fn render(
    template: &str,
    settings: &HashMap<String, String>,
    objects: &[Object],
) -> Result<String, TriggerError> {
    let mut ctx: HashMap<&str, minijinja::Value> = settings
        .iter()
        .map(|(k, v)| (k.as_str(), minijinja::Value::from(v.as_str())))
        .collect();
    ctx.insert("objects", minijinja::Value::from_serialize(objects));

    build_env()
        .render_str(template, ctx)
        .map_err(|e| TriggerError::Template(e.to_string()))
}

/// Validate template syntax without rendering, for construction-time checks.
pub fn validate(template: &str) -> Result<(), TriggerError> {
    build_env()
        .template_from_str(template)
        .map(|_| ())
        .map_err(|e| TriggerError::Template(e.to_string()))
}

fn build_env() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();
    env.add_function("env", env_function);
    env.add_function("epoch", epoch_function);
    env
}

/// `env("NAME")`: value of an environment variable, empty when unset.
fn env_function(name: String) -> String {
    std::env::var(&name).unwrap_or_default()
}

/// `epoch()`: current time as Unix seconds.
fn epoch_function() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use lightsout_scanner::ScannerConfig;

    use super::*;

    fn objects() -> Vec<Object> {
        let mut obj = Object::for_scanner(&ScannerConfig {
            namespace: "dev".into(),
            kind: "deployment".into(),
            ..Default::default()
        });
        obj.uid = "uid-1".into();
        obj.name = "frontend".into();
        obj.replicas = 3;
        vec![obj]
    }

    #[test]
    fn render_settings_as_variables() {
        let settings = HashMap::from([("channel".to_string(), "#ops".to_string())]);
        let out = render("notify {{ channel }}", &settings, &[]).unwrap();
        assert_eq!(out, "notify #ops");
    }

    #[test]
    fn render_objects_list() {
        let out = render(
            "{% for o in objects %}{{ o.namespace }}/{{ o.name }}={{ o.replicas }}{% endfor %}",
            &HashMap::new(),
            &objects(),
        )
        .unwrap();
        assert_eq!(out, "dev/frontend=3");
    }

    #[test]
    fn render_env_function() {
        std::env::set_var("LIGHTSOUT_TPL_TEST", "hello");
        let out = render("{{ env(\"LIGHTSOUT_TPL_TEST\") }}", &HashMap::new(), &[]).unwrap();
        assert_eq!(out, "hello");
        std::env::remove_var("LIGHTSOUT_TPL_TEST");
    }

    #[test]
    fn render_invalid_template_errors() {
        let result = render("{{ unclosed", &HashMap::new(), &[]);
        assert!(matches!(result, Err(TriggerError::Template(_))));
    }

    #[test]
    fn validate_catches_syntax_errors() {
        assert!(validate("{% for x in %}").is_err());
        assert!(validate("plain body").is_ok());
    }
}
