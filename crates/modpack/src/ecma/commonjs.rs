//! ES module syntax lowered to CommonJS
//!
//! Import and export declarations are removed from the statement list. Their
//! runtime effect is emitted as a prologue placed after any directives:
//!
//! 1. a `"use strict";` directive, unless the module already has one
//! 2. `exports.__esModule` marker
//! 3. one getter per named export, so exports stay live bindings
//! 4. the `require` calls of imports and re-exports, in source order
//!
//! `export default <expr>` stays in place as an `exports.default` assignment.
//! Everything else in the module is copied byte-for-byte.

use oxc_ast::ast::{
    BindingIdentifier, Declaration, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, Expression, ImportDeclaration,
    ImportDeclarationSpecifier, Program, Statement,
};
use oxc_ast_visit::Visit;
use oxc_span::{GetSpan, Span};

use super::{Edit, apply_edits, quote};

/// Prefix of bindings introduced for imported module objects
const TEMP_PREFIX: &str = "__modpack_dep";

/// Rewrite `source` (already parsed into `program`) into CommonJS
///
/// Source without any module declarations is returned unchanged apart from a
/// leading hashbang, which is always dropped.
pub fn to_commonjs(source: &str, program: &Program<'_>) -> String {
    let mut lowering = Lowering {
        strict: program
            .directives
            .iter()
            .any(|directive| directive.directive.as_str() == "use strict"),
        ..Lowering::default()
    };

    if let Some(hashbang) = &program.hashbang {
        lowering
            .edits
            .push(Edit::new(hashbang.span.start, hashbang.span.end, ""));
    }

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => lowering.import(decl),
            Statement::ExportNamedDeclaration(decl) => lowering.export_named(decl),
            Statement::ExportDefaultDeclaration(decl) => lowering.export_default(decl),
            Statement::ExportAllDeclaration(decl) => lowering.export_all(decl),
            _ => {}
        }
    }

    if !lowering.is_module {
        return apply_edits(source, lowering.edits);
    }

    let prologue_at = program
        .directives
        .last()
        .map_or(0, |directive| directive.span.end);
    let prologue = lowering.prologue();
    let inserted = if prologue_at == 0 {
        format!("{prologue}\n")
    } else {
        format!("\n{prologue}")
    };
    lowering
        .edits
        .push(Edit::new(prologue_at, prologue_at, inserted));

    apply_edits(source, lowering.edits)
}

#[derive(Debug, Default)]
struct Lowering {
    edits: Vec<Edit>,
    /// (exported name, expression) pairs
    getters: Vec<(String, String)>,
    /// Statements that load dependencies, in source order
    loads: Vec<String>,
    temps: usize,
    is_module: bool,
    /// Source already opts into strict mode
    strict: bool,
}

impl Lowering {
    fn prologue(&self) -> String {
        let mut lines = Vec::with_capacity(2 + self.getters.len() + self.loads.len());
        if !self.strict {
            lines.push(r#""use strict";"#.to_owned());
        }
        lines.push(r#"Object.defineProperty(exports, "__esModule", { value: true });"#.to_owned());
        for (name, expr) in &self.getters {
            lines.push(format!(
                "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ \
                 return {expr}; }} }});",
                quote(name)
            ));
        }
        lines.extend(self.loads.iter().cloned());
        lines.join("\n")
    }

    fn remove(&mut self, span: Span) {
        self.edits.push(Edit::new(span.start, span.end, ""));
    }

    fn temp(&mut self) -> String {
        let name = format!("{TEMP_PREFIX}{}", self.temps);
        self.temps += 1;
        name
    }

    /// `var <temp> = require("<specifier>");`, returning the temp name
    fn load(&mut self, specifier: &str) -> String {
        let temp = self.temp();
        self.loads
            .push(format!("var {temp} = require({});", quote(specifier)));
        temp
    }

    fn import(&mut self, decl: &ImportDeclaration<'_>) {
        self.is_module = true;
        self.remove(decl.span);
        if decl.import_kind.is_type() {
            return;
        }

        let specifier = decl.source.value.as_str();
        let Some(specifiers) = decl
            .specifiers
            .as_ref()
            .filter(|specifiers| !specifiers.is_empty())
        else {
            self.loads.push(format!("require({});", quote(specifier)));
            return;
        };

        let temp = self.load(specifier);
        for spec in specifiers {
            let line = match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                    format!("const {} = {};", spec.local.name, default_of(&temp))
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                    format!("const {} = {temp};", spec.local.name)
                }
                ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                    if spec.import_kind.is_type() {
                        continue;
                    }
                    format!(
                        "const {} = {};",
                        spec.local.name,
                        imported(&temp, &spec.imported.name())
                    )
                }
            };
            self.loads.push(line);
        }
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration<'_>) {
        self.is_module = true;
        if decl.export_kind.is_type() {
            self.remove(decl.span);
            return;
        }

        if let Some(declaration) = &decl.declaration {
            // Keep the declaration itself, drop the `export` keyword
            self.edits
                .push(Edit::new(decl.span.start, declaration.span().start, ""));
            for name in declared_names(declaration) {
                self.getters.push((name.clone(), name));
            }
            return;
        }

        self.remove(decl.span);
        let source = decl
            .source
            .as_ref()
            .map(|source| self.load(source.value.as_str()));
        for spec in &decl.specifiers {
            if spec.export_kind.is_type() {
                continue;
            }
            let local = spec.local.name();
            let expr = match &source {
                Some(temp) => imported(temp, &local),
                None => local.to_string(),
            };
            self.getters.push((spec.exported.name().to_string(), expr));
        }
    }

    fn export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        self.is_module = true;
        let body_start = decl.declaration.span().start;
        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => func.id.as_ref(),
            ExportDefaultDeclarationKind::ClassDeclaration(class) => class.id.as_ref(),
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                self.remove(decl.span);
                return;
            }
            _ => None,
        };

        if let Some(BindingIdentifier { name, .. }) = named {
            self.edits.push(Edit::new(decl.span.start, body_start, ""));
            self.getters.push(("default".to_owned(), name.to_string()));
            return;
        }

        self.edits
            .push(Edit::new(decl.span.start, body_start, "exports.default = "));
        if matches!(
            decl.declaration,
            ExportDefaultDeclarationKind::FunctionDeclaration(_)
                | ExportDefaultDeclarationKind::ClassDeclaration(_)
        ) {
            // Anonymous declarations carry no trailing semicolon of their own
            let end = decl.declaration.span().end;
            self.edits.push(Edit::new(end, end, ";"));
        }
    }

    fn export_all(&mut self, decl: &ExportAllDeclaration<'_>) {
        self.is_module = true;
        self.remove(decl.span);
        if decl.export_kind.is_type() {
            return;
        }

        let temp = self.load(decl.source.value.as_str());
        match &decl.exported {
            Some(exported) => self.getters.push((exported.name().to_string(), temp)),
            None => self.loads.push(format!(
                "Object.keys({temp}).forEach(function (key) {{ if (key === \"default\" || key === \
                 \"__esModule\" || Object.prototype.hasOwnProperty.call(exports, key)) return; \
                 Object.defineProperty(exports, key, {{ enumerable: true, get: function () {{ \
                 return {temp}[key]; }} }}); }});"
            )),
        }
    }
}

/// Default export of a required module, treating plain CommonJS exports as the default
fn default_of(temp: &str) -> String {
    format!("{temp} && {temp}.__esModule ? {temp}.default : {temp}")
}

fn imported(temp: &str, name: &str) -> String {
    if name == "default" {
        format!("({})", default_of(temp))
    } else if is_identifier_name(name) {
        format!("{temp}.{name}")
    } else {
        format!("{temp}[{}]", quote(name))
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            let mut collector = BindingCollector::default();
            for declarator in &var.declarations {
                collector.visit_binding_pattern(&declarator.id);
            }
            collector.names
        }
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

/// Names bound by a destructuring pattern; default-value expressions are skipped
#[derive(Debug, Default)]
struct BindingCollector {
    names: Vec<String>,
}

impl<'a> Visit<'a> for BindingCollector {
    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        self.names.push(it.name.to_string());
    }

    fn visit_expression(&mut self, _it: &Expression<'a>) {}
}
