use oxc_ast::ast::{Program, Statement};

/// Specifiers of every value import and re-export, in source order
///
/// Only static module declarations are considered. `import type` and
/// `export type ... from` are skipped because they produce no runtime code.
pub fn collect_specifiers(program: &Program<'_>) -> Vec<String> {
    program
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::ImportDeclaration(decl) if !decl.import_kind.is_type() => {
                Some(decl.source.value.to_string())
            }
            Statement::ExportNamedDeclaration(decl) if !decl.export_kind.is_type() => {
                decl.source.as_ref().map(|source| source.value.to_string())
            }
            Statement::ExportAllDeclaration(decl) if !decl.export_kind.is_type() => {
                Some(decl.source.value.to_string())
            }
            _ => None,
        })
        .collect()
}
