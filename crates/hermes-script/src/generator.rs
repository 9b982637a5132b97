//! Module emission.

use std::fmt::Write as _;

use hermes_core::{CompiledInterface, CompiledRoute, NamingStyle, TypeDesc};
use tracing::debug;

use crate::descriptor::{FieldDescriptor, PathPiece, RouteDescriptor};
use crate::runtime::{RUNTIME, RUNTIME_EXPORTS};
use crate::writer::ScriptWriter;

/// How the generated module exposes its classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleFormat {
    /// `export { ... };`
    #[default]
    EsModule,
    /// `module.exports = { ... };`
    CommonJs,
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Export syntax.
    pub format: ModuleFormat,
    /// Appended to every generated class name.
    pub class_suffix: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            format: ModuleFormat::default(),
            class_suffix: "Client".to_string(),
        }
    }
}

impl ScriptOptions {
    /// Sets the export syntax.
    #[must_use]
    pub fn with_format(mut self, format: ModuleFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the class name suffix.
    #[must_use]
    pub fn with_class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_suffix = suffix.into();
        self
    }
}

/// Emits a JavaScript `fetch` client for a compiled interface.
///
/// One class is generated per contract in the tree, nested contracts
/// included. Each class holds a frozen table of [`RouteDescriptor`]s and one
/// method per route that hands its descriptor to a shared `invoke`.
///
/// # Example
///
/// ```rust
/// use hermes_core::{fixtures, ContractCompiler};
/// use hermes_script::ScriptGenerator;
///
/// let interface = ContractCompiler::default()
///     .compile(&fixtures::profile_contract())
///     .unwrap();
/// let source = ScriptGenerator::default().generate(&interface);
///
/// assert!(source.contains("class ProfileClient {"));
/// assert!(source.contains(r#""method":"GET","path":["/",{"name":"id","type":"integer"},"/name"]"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    options: ScriptOptions,
}

/// One class to emit.
struct ClassPlan<'a> {
    name: String,
    table: String,
    interface: &'a CompiledInterface,
    nested: Vec<NestedAccessor>,
}

struct NestedAccessor {
    method: String,
    class: String,
    contract: String,
    mount_path: String,
}

impl ScriptGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(options: ScriptOptions) -> Self {
        Self { options }
    }

    /// Returns the settings.
    #[must_use]
    pub fn options(&self) -> &ScriptOptions {
        &self.options
    }

    /// Generates the module source for `interface`.
    #[must_use]
    pub fn generate(&self, interface: &CompiledInterface) -> String {
        let mut plans = Vec::new();
        let base = NamingStyle::PascalCase.apply(interface.contract_name());
        self.plan(interface, &base, &mut plans);

        let mut w = ScriptWriter::new("  ");
        w.line(&format!(
            "// Client for the `{}` contract. Generated by hermes-script; do not edit.",
            interface.contract_name()
        ));
        w.blank();
        w.lines(RUNTIME);

        for plan in &plans {
            w.blank();
            write_table(&mut w, plan);
            w.blank();
            write_class(&mut w, plan);
        }

        let exports: Vec<&str> = RUNTIME_EXPORTS
            .iter()
            .copied()
            .chain(plans.iter().map(|p| p.name.as_str()))
            .collect();
        w.blank();
        match self.options.format {
            ModuleFormat::EsModule => w.line(&format!("export {{ {} }};", exports.join(", "))),
            ModuleFormat::CommonJs => {
                w.line(&format!("module.exports = {{ {} }};", exports.join(", ")));
            }
        }

        let source = w.finish();
        debug!(
            contract = %interface.contract_name(),
            classes = plans.len(),
            routes = interface.all_routes().len(),
            bytes = source.len(),
            "script client generated"
        );
        source
    }

    fn plan<'a>(&self, interface: &'a CompiledInterface, base: &str, out: &mut Vec<ClassPlan<'a>>) {
        let index = out.len();
        out.push(ClassPlan {
            name: format!("{base}{}", self.options.class_suffix),
            table: format!("{}_ROUTES", NamingStyle::SnakeUpper.apply(base)),
            interface,
            nested: Vec::new(),
        });

        for binding in interface.bindings() {
            let nested_base = format!("{base}{}", NamingStyle::PascalCase.apply(binding.name()));
            let accessor = NestedAccessor {
                method: binding.name().to_string(),
                class: format!("{nested_base}{}", self.options.class_suffix),
                contract: binding.interface().contract_name().to_string(),
                mount_path: binding.mount_path().to_string(),
            };
            out[index].nested.push(accessor);
            self.plan(binding.interface(), &nested_base, out);
        }
    }
}

fn write_table(w: &mut ScriptWriter, plan: &ClassPlan<'_>) {
    w.line(&format!("const {} = Object.freeze({{", plan.table));
    w.indented(|w| {
        for route in plan.interface.routes() {
            let descriptor = RouteDescriptor::from_route(route);
            w.line(&format!("{}: {},", route.name(), descriptor.to_literal()));
        }
    });
    w.line("});");
}

fn write_class(w: &mut ScriptWriter, plan: &ClassPlan<'_>) {
    w.doc(&format!(
        "Client for the `{}` contract.\n\n\
         @param {{string}} baseUrl prepended to every path\n\
         @param {{{{headers?: Object<string, string>, fetch?: typeof fetch, timeoutMs?: number}}}} [options]",
        plan.interface.contract_name()
    ));
    w.block(&format!("class {}", plan.name), "", |w| {
        w.block("constructor(baseUrl, options = {})", "", |w| {
            w.line("this.baseUrl = baseUrl;");
            w.line("this.options = options;");
        });

        for route in plan.interface.routes() {
            w.blank();
            write_method(w, &plan.table, route);
        }

        for nested in &plan.nested {
            w.blank();
            w.doc(&format!(
                "The nested `{}` contract, mounted at `{}`.",
                nested.contract, nested.mount_path
            ));
            w.block(&format!("{}()", nested.method), "", |w| {
                w.line(&format!("return new {}(this.baseUrl, this.options);", nested.class));
            });
        }
    });
}

fn write_method(w: &mut ScriptWriter, table: &str, route: &CompiledRoute) {
    let descriptor = RouteDescriptor::from_route(route);

    let mut args = Vec::new();
    let mut any_required = false;
    for piece in &descriptor.path {
        if let PathPiece::Placeholder { name, ty } = piece {
            any_required = true;
            args.push(format!("{name}: {}", js_type(*ty)));
        }
    }
    for field in descriptor
        .query
        .iter()
        .chain(&descriptor.headers)
        .chain(&descriptor.body)
    {
        any_required |= field.required;
        args.push(js_field(field));
    }
    let outputs: Vec<String> = descriptor.outputs.iter().map(js_field).collect();
    let returns = descriptor.returns.map_or("null", js_type);

    let mut doc = String::new();
    let _ = writeln!(doc, "{} {}", route.http_method(), route.full_pattern());
    doc.push('\n');
    let param = if any_required { "args" } else { "[args]" };
    let _ = writeln!(doc, "@param {{{{{}}}}} {param}", args.join(", "));
    let _ = write!(
        doc,
        "@returns {{Promise<{{status: number, value: {returns}, outputs: {{{}}}}}>}}",
        outputs.join(", ")
    );
    w.doc(&doc);

    w.block(&format!("{}(args)", route.name()), "", |w| {
        w.line(&format!(
            "return invoke(this.baseUrl, this.options, {table}.{}, args);",
            route.name()
        ));
    });
}

fn js_field(field: &FieldDescriptor) -> String {
    let mark = if field.required { "" } else { "?" };
    format!("{}{mark}: {}", field.name, js_type(field.ty))
}

const fn js_type(ty: TypeDesc) -> &'static str {
    match ty {
        TypeDesc::String => "string",
        TypeDesc::Integer | TypeDesc::Float => "number",
        TypeDesc::Boolean => "boolean",
        TypeDesc::Json => "*",
    }
}
