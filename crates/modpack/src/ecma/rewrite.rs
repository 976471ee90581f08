use log::trace;
use oxc_ast::ast::{Argument, CallExpression, Expression, Program};
use oxc_ast_visit::{Visit, walk};

use super::{Edit, apply_edits};
use crate::asset::ResolutionMap;

/// Replace the specifier argument of `require("<specifier>")` calls with the
/// asset id from `resolution_map`
///
/// Matching is done on call expressions, so every call site is rewritten and a
/// specifier that merely contains another one is left alone. Calls with a
/// specifier outside the map keep their string argument.
pub fn rewrite_requires(
    code: &str,
    program: &Program<'_>,
    resolution_map: &ResolutionMap,
) -> String {
    let mut finder = RequireSites {
        resolution_map,
        edits: Vec::new(),
    };
    finder.visit_program(program);
    trace!("Rewriting {} require call sites", finder.edits.len());
    apply_edits(code, finder.edits)
}

struct RequireSites<'m> {
    resolution_map: &'m ResolutionMap,
    edits: Vec<Edit>,
}

impl<'a> Visit<'a> for RequireSites<'_> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee {
            if callee.name.as_str() == "require" && it.arguments.len() == 1 {
                if let Some(Argument::StringLiteral(literal)) = it.arguments.first() {
                    if let Some(id) = self.resolution_map.get(literal.value.as_str()) {
                        self.edits.push(Edit::new(
                            literal.span.start,
                            literal.span.end,
                            id.to_string(),
                        ));
                    }
                }
            }
        }
        walk::walk_call_expression(self, it);
    }
}
