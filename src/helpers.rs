use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, JsonValue, Output, RenderContext,
    RenderErrorReason,
};

/// Install every helper templates can rely on.
pub(crate) fn register(engine: &mut Handlebars<'_>) {
    #[cfg(feature = "helpers")]
    handlebars_misc_helpers::setup_handlebars(engine);
    engine.register_helper("module_name", Box::new(ModuleNameHelper));
}

/// Turn a distribution name into something importable:
/// `My-Package.core` becomes `my_package_core`.
pub fn to_module_name(name: &str) -> String {
    let mut module: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if module.starts_with(|c: char| c.is_ascii_digit()) {
        module.insert(0, '_');
    }
    module
}

/// `{{module_name package_name}}`
#[derive(Clone, Copy)]
pub struct ModuleNameHelper;

impl HelperDef for ModuleNameHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h
            .param(0)
            .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex("module_name", 0))?;

        match value.value() {
            JsonValue::String(name) => {
                out.write(&to_module_name(name))?;
                Ok(())
            }
            other => Err(RenderErrorReason::Other(format!(
                "module_name expects a string, got {other}"
            ))
            .into()),
        }
    }
}
