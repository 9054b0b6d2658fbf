use super::EngineOptions;
use crate::error::BundleError;
use crate::resolver::LoadedModule;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::Transformer;
use std::fmt::Display;
use std::path::Path;

/// Turns one loaded TS/TSX/JS/JSX module into plain ES module JavaScript.
///
/// Types are stripped and JSX is lowered; imports and exports are left in
/// place for the linker.
pub(super) fn transpile(
    module: &LoadedModule,
    options: &EngineOptions,
) -> Result<String, BundleError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(module.loader.is_typescript())
        .with_jsx(module.loader.is_jsx());

    let ret = Parser::new(&allocator, &module.contents, source_type).parse();
    if !ret.errors.is_empty() || ret.panicked {
        return Err(syntax_error(&module.path, &ret.errors));
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transform_options = options.transform_options();
    let ret = Transformer::new(&allocator, Path::new(&module.path), &transform_options)
        .build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(syntax_error(&module.path, &ret.errors));
    }

    Ok(Codegen::new().build(&program).code)
}

/// Reparses the assembled bundle and prints it once more so the output has a
/// single canonical formatting.
pub(super) fn print_bundle(source: &str, minify: bool) -> Result<String, BundleError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::default().with_module(true)).parse();
    if !ret.errors.is_empty() || ret.panicked {
        return Err(syntax_error("<bundle>", &ret.errors));
    }
    let codegen_options = CodegenOptions {
        minify,
        ..CodegenOptions::default()
    };
    Ok(Codegen::new()
        .with_options(codegen_options)
        .build(&ret.program)
        .code)
}

pub(super) fn syntax_error<E: Display>(path: &str, errors: &[E]) -> BundleError {
    let mut messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    if messages.is_empty() {
        messages.push("parser aborted".to_string());
    }
    BundleError::EngineSyntax {
        path: path.to_string(),
        messages,
    }
}
