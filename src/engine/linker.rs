//! Rewrites one ES module into a factory body for the bundle's module registry.
//!
//! The module is parsed once, every top-level `import`/`export` statement and
//! every `import()`/`require()` call is turned into a span replacement, and the
//! replacements are spliced into the source back to front. Specifiers are
//! resolved through the caller's resolve hook while rewriting, so the
//! resulting body only ever names resolved module paths.
//!
//! Imported bindings stay live: every reference to a default or named import
//! is rewritten into a property read on the imported module's exports object,
//! so the importer always sees the exporter's current value.

use super::bootstrap::{DEFAULT_LOCAL, EXPORT_FN, EXPORT_STAR_FN, EXPORTS, REQUIRE_FN};
use super::transpile::syntax_error;
use crate::error::BundleError;
use crate::resolver::ImportKind;
use ahash::AHashMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::{GetSpan, SourceType, Span};
use oxc_syntax::scope::ScopeFlags;
use oxc_syntax::symbol::SymbolId;

/// A module body ready to be wrapped in a registry factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LinkedModule {
    pub body: String,
    /// Resolved paths this module requires, in source order, without repeats.
    pub dependencies: Vec<String>,
}

struct Replacement {
    start: u32,
    end: u32,
    text: String,
}

/// One named export: the exported name and a JS expression producing its value.
struct ExportGetter {
    exported: String,
    value: String,
}

struct DynamicRequest {
    start: u32,
    end: u32,
    specifier: String,
    kind: ImportKind,
}

/// Collects `import("x")` and `require("x")` with string literal specifiers.
#[derive(Default)]
struct DynamicRequestCollector {
    requests: Vec<DynamicRequest>,
}

impl<'a> Visit<'a> for DynamicRequestCollector {
    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &it.source {
            self.requests.push(DynamicRequest {
                start: it.span.start,
                end: it.span.end,
                specifier: lit.value.to_string(),
                kind: ImportKind::DynamicImport,
            });
        }
        walk::walk_import_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee {
            if callee.name.as_str() == "require" && it.arguments.len() == 1 {
                if let Some(Argument::StringLiteral(lit)) = it.arguments.first() {
                    self.requests.push(DynamicRequest {
                        start: it.span.start,
                        end: it.span.end,
                        specifier: lit.value.to_string(),
                        kind: ImportKind::RequireCall,
                    });
                }
            }
        }
        walk::walk_call_expression(self, it);
    }
}

/// Rewrites references to imported bindings into reads on the exporting
/// module's exports object.
struct ImportReferenceRewriter<'s> {
    scoping: &'s Scoping,
    access: &'s AHashMap<SymbolId, String>,
    replacements: Vec<Replacement>,
}

impl<'s> ImportReferenceRewriter<'s> {
    fn access_for(&self, ident: &IdentifierReference<'_>) -> Option<&'s str> {
        let reference_id = ident.reference_id.get()?;
        let symbol_id = self.scoping.get_reference(reference_id).symbol_id()?;
        self.access.get(&symbol_id).map(String::as_str)
    }

    fn replace(&mut self, span: Span, text: String) {
        self.replacements.push(Replacement {
            start: span.start,
            end: span.end,
            text,
        });
    }
}

impl<'a> Visit<'a> for ImportReferenceRewriter<'_> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if let Some(access) = self.access_for(it) {
            self.replace(it.span, access.to_string());
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.shorthand {
            if let Expression::Identifier(ident) = &it.value {
                if let Some(access) = self.access_for(ident) {
                    self.replace(it.span, format!("{}: {}", ident.name, access));
                    return;
                }
            }
        }
        walk::walk_object_property(self, it);
    }

    // Calls through the exports object must not receive it as `this`.
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee {
            if let Some(access) = self.access_for(callee) {
                self.replace(callee.span, format!("(0, {})", access));
                for argument in &it.arguments {
                    self.visit_argument(argument);
                }
                return;
            }
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        if let Expression::Identifier(tag) = &it.tag {
            if let Some(access) = self.access_for(tag) {
                self.replace(tag.span, format!("(0, {})", access));
                self.visit_template_literal(&it.quasi);
                return;
            }
        }
        walk::walk_tagged_template_expression(self, it);
    }

    // Local export lists are turned into getters by the linker.
    fn visit_export_specifier(&mut self, _it: &ExportSpecifier<'a>) {}
}

/// Finds an `await` that is not inside any function body.
#[derive(Default)]
struct TopLevelAwait {
    found: Option<Span>,
}

impl<'a> Visit<'a> for TopLevelAwait {
    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_await_expression(&mut self, it: &AwaitExpression<'a>) {
        self.found.get_or_insert(it.span);
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        if it.r#await {
            self.found.get_or_insert(it.span);
        }
        walk::walk_for_of_statement(self, it);
    }
}

struct Linker<'r, R> {
    resolve: &'r mut R,
    replacements: Vec<Replacement>,
    getters: Vec<ExportGetter>,
    dependencies: Vec<String>,
    next_binding: usize,
    /// Symbol of each default or named import, mapped to its live read.
    imported: AHashMap<SymbolId, String>,
    /// The same reads keyed by local name, for `export { local }` getters.
    imported_locals: AHashMap<String, String>,
}

impl<'r, R> Linker<'r, R>
where
    R: FnMut(&str, ImportKind) -> Result<String, BundleError>,
{
    fn require(&mut self, specifier: &str, kind: ImportKind) -> Result<String, BundleError> {
        let resolved = (self.resolve)(specifier, kind)?;
        if !self.dependencies.contains(&resolved) {
            self.dependencies.push(resolved.clone());
        }
        Ok(format!("{}({})", REQUIRE_FN, quote(&resolved)))
    }

    fn fresh_binding(&mut self) -> String {
        let name = format!("__kestrel_m{}", self.next_binding);
        self.next_binding += 1;
        name
    }

    fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        self.replacements.push(Replacement {
            start,
            end,
            text: text.into(),
        });
    }

    fn export_local(&mut self, exported: impl Into<String>, local: impl Into<String>) {
        self.getters.push(ExportGetter {
            exported: exported.into(),
            value: local.into(),
        });
    }

    fn link_statement(&mut self, stmt: &Statement<'_>) -> Result<(), BundleError> {
        match stmt {
            Statement::ImportDeclaration(decl) => self.link_import(decl),
            Statement::ExportNamedDeclaration(decl) => self.link_export_named(decl),
            Statement::ExportDefaultDeclaration(decl) => {
                self.link_export_default(decl);
                Ok(())
            }
            Statement::ExportAllDeclaration(decl) => self.link_export_all(decl),
            _ => Ok(()),
        }
    }

    fn link_import(&mut self, decl: &ImportDeclaration<'_>) -> Result<(), BundleError> {
        if decl.import_kind.is_type() {
            self.replace(decl.span.start, decl.span.end, "");
            return Ok(());
        }
        let require = self.require(decl.source.value.as_str(), ImportKind::ImportStatement)?;

        let Some(specifiers) = &decl.specifiers else {
            self.replace(decl.span.start, decl.span.end, format!("{};", require));
            return Ok(());
        };

        let binding = self.fresh_binding();
        let mut declarators = vec![format!("{} = {}", binding, require)];
        for specifier in specifiers {
            let (local, access) = match specifier {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    (&s.local, format!("{}.default", binding))
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    // The namespace object is itself live.
                    declarators.push(format!("{} = {}", s.local.name, binding));
                    continue;
                }
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    if s.import_kind.is_type() {
                        continue;
                    }
                    (&s.local, format!("{}[{}]", binding, quote(s.imported.name().as_str())))
                }
            };
            if let Some(symbol_id) = local.symbol_id.get() {
                self.imported.insert(symbol_id, access.clone());
            }
            self.imported_locals.insert(local.name.to_string(), access);
        }
        self.replace(
            decl.span.start,
            decl.span.end,
            format!("const {};", declarators.join(", ")),
        );
        Ok(())
    }

    fn link_export_named(&mut self, decl: &ExportNamedDeclaration<'_>) -> Result<(), BundleError> {
        if decl.export_kind.is_type() {
            self.replace(decl.span.start, decl.span.end, "");
            return Ok(());
        }

        if let Some(declaration) = &decl.declaration {
            // Keep the declaration, drop the `export` keyword.
            self.replace(decl.span.start, declaration.span().start, "");
            let mut names = Vec::new();
            declared_names(declaration, &mut names);
            for name in names {
                self.export_local(name.clone(), name);
            }
            return Ok(());
        }

        match &decl.source {
            Some(source) => {
                let require = self.require(source.value.as_str(), ImportKind::ImportStatement)?;
                let binding = self.fresh_binding();
                for specifier in &decl.specifiers {
                    if specifier.export_kind.is_type() {
                        continue;
                    }
                    let value = format!("{}[{}]", binding, quote(specifier.local.name().as_str()));
                    self.export_local(specifier.exported.name().to_string(), value);
                }
                self.replace(
                    decl.span.start,
                    decl.span.end,
                    format!("const {} = {};", binding, require),
                );
            }
            None => {
                for specifier in &decl.specifiers {
                    if specifier.export_kind.is_type() {
                        continue;
                    }
                    self.export_local(
                        specifier.exported.name().to_string(),
                        specifier.local.name().to_string(),
                    );
                }
                self.replace(decl.span.start, decl.span.end, "");
            }
        }
        Ok(())
    }

    fn link_export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        let declaration_start = decl.declaration.span().start;
        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                func.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                self.replace(decl.span.start, decl.span.end, "");
                return;
            }
            _ => None,
        };

        match named {
            Some(name) => {
                self.replace(decl.span.start, declaration_start, "");
                self.export_local("default", name);
            }
            None => {
                self.replace(
                    decl.span.start,
                    declaration_start,
                    format!("const {} = ", DEFAULT_LOCAL),
                );
                let is_declaration = matches!(
                    decl.declaration,
                    ExportDefaultDeclarationKind::FunctionDeclaration(_)
                        | ExportDefaultDeclarationKind::ClassDeclaration(_)
                );
                if is_declaration {
                    self.replace(decl.span.end, decl.span.end, ";");
                }
                self.export_local("default", DEFAULT_LOCAL);
            }
        }
    }

    fn link_export_all(&mut self, decl: &ExportAllDeclaration<'_>) -> Result<(), BundleError> {
        if decl.export_kind.is_type() {
            self.replace(decl.span.start, decl.span.end, "");
            return Ok(());
        }
        let require = self.require(decl.source.value.as_str(), ImportKind::ImportStatement)?;
        match &decl.exported {
            Some(exported) => {
                let binding = self.fresh_binding();
                self.export_local(exported.name().to_string(), binding.clone());
                self.replace(
                    decl.span.start,
                    decl.span.end,
                    format!("const {} = {};", binding, require),
                );
            }
            None => {
                self.replace(
                    decl.span.start,
                    decl.span.end,
                    format!("{}({}, {});", EXPORT_STAR_FN, EXPORTS, require),
                );
            }
        }
        Ok(())
    }

    fn link_dynamic(&mut self, request: DynamicRequest) -> Result<(), BundleError> {
        let require = self.require(&request.specifier, request.kind)?;
        let text = match request.kind {
            ImportKind::DynamicImport => format!("Promise.resolve().then(() => {})", require),
            _ => require,
        };
        self.replace(request.start, request.end, text);
        Ok(())
    }
}

/// Links one transpiled module.
///
/// `resolve` maps a specifier and its request kind to a resolved module path.
pub(super) fn link_module<R>(
    path: &str,
    source: &str,
    resolve: &mut R,
) -> Result<LinkedModule, BundleError>
where
    R: FnMut(&str, ImportKind) -> Result<String, BundleError>,
{
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::default().with_module(true)).parse();
    if !ret.errors.is_empty() || ret.panicked {
        return Err(syntax_error(path, &ret.errors));
    }
    let program = ret.program;

    let mut awaits = TopLevelAwait::default();
    awaits.visit_program(&program);
    if awaits.found.is_some() {
        return Err(BundleError::EngineSyntax {
            path: path.to_string(),
            messages: vec![
                "top-level await is not supported in bundled modules; move it into an async function"
                    .to_string(),
            ],
        });
    }

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let mut linker = Linker {
        resolve,
        replacements: Vec::new(),
        getters: Vec::new(),
        dependencies: Vec::new(),
        next_binding: 0,
        imported: AHashMap::new(),
        imported_locals: AHashMap::new(),
    };

    for stmt in &program.body {
        linker.link_statement(stmt)?;
    }

    let mut rewriter = ImportReferenceRewriter {
        scoping: &scoping,
        access: &linker.imported,
        replacements: Vec::new(),
    };
    rewriter.visit_program(&program);
    let reference_replacements = rewriter.replacements;
    linker.replacements.extend(reference_replacements);

    let mut collector = DynamicRequestCollector::default();
    collector.visit_program(&program);
    for request in collector.requests {
        linker.link_dynamic(request)?;
    }

    // Apply back to front so earlier offsets stay valid.
    let mut replacements = linker.replacements;
    replacements.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    let mut body = source.to_string();
    for replacement in replacements {
        body.replace_range(
            replacement.start as usize..replacement.end as usize,
            &replacement.text,
        );
    }

    if !linker.getters.is_empty() {
        let getters = linker
            .getters
            .iter()
            .map(|g| {
                let value = linker.imported_locals.get(&g.value).unwrap_or(&g.value);
                format!("{}: () => {}", quote(&g.exported), value)
            })
            .collect::<Vec<_>>()
            .join(", ");
        body = format!("{}({}, {{ {} }});\n{}", EXPORT_FN, EXPORTS, getters, body);
    }

    Ok(LinkedModule {
        body,
        dependencies: linker.dependencies,
    })
}

/// A module body for content handled by the default loader: the raw text is
/// the default export.
pub(super) fn raw_module(contents: &str) -> LinkedModule {
    LinkedModule {
        body: format!(
            "{}({}, {{ \"default\": () => {} }});\nconst {} = {};\n",
            EXPORT_FN,
            EXPORTS,
            DEFAULT_LOCAL,
            DEFAULT_LOCAL,
            quote(contents)
        ),
        dependencies: Vec::new(),
    }
}

fn declared_names(declaration: &Declaration<'_>, names: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                collect_binding_pattern(&declarator.id, names);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                names.push(id.name.to_string());
            }
        }
        _ => {}
    }
}

fn collect_binding_pattern(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_pattern(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                collect_binding_pattern(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => collect_binding_pattern(&assign.left, names),
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

/// A JS string literal for `value`. JSON string syntax is valid JavaScript.
pub(super) fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_flat(specifier: &str, kind: ImportKind) -> Result<String, BundleError> {
        match kind {
            ImportKind::ImportStatement => Ok(crate::vfs::path::join("/", specifier)),
            kind => Err(BundleError::NotResolvable {
                path: specifier.to_string(),
                importer: "/index.js".to_string(),
                kind,
            }),
        }
    }

    fn link(source: &str) -> Result<LinkedModule, BundleError> {
        link_module("/index.js", source, &mut resolve_flat)
    }

    #[test]
    fn imported_bindings_are_read_through_the_exports_object() {
        let linked = link("import d, { x, y as z } from './a.js';\nx(z, d);\n").unwrap();
        assert_eq!(linked.dependencies, vec!["/a.js".to_string()]);
        assert!(linked.body.contains("const __kestrel_m0 = __kestrel_require(\"/a.js\");"));
        assert!(linked.body.contains(
            "(0, __kestrel_m0[\"x\"])(__kestrel_m0[\"y\"], __kestrel_m0.default);"
        ));
        assert!(!linked.body.contains("import"));
    }

    #[test]
    fn imported_let_is_never_copied() {
        let linked =
            link("import { count, inc } from './c.js';\ninc();\nconsole.log('live', count);\n")
                .unwrap();
        assert!(linked.body.contains("console.log('live', __kestrel_m0[\"count\"]);"));
        assert!(!linked.body.contains("count } ="));
    }

    #[test]
    fn shadowed_and_shorthand_references() {
        let linked = link(
            "import { x } from './a.js';\nconst o = { x };\nfunction f(x) { return x; }\n",
        )
        .unwrap();
        assert!(linked.body.contains("const o = { x: __kestrel_m0[\"x\"] };"));
        assert!(linked.body.contains("function f(x) { return x; }"));
    }

    #[test]
    fn re_exported_import_stays_live() {
        let linked = link("import { x } from './a.js';\nexport { x as y };\n").unwrap();
        assert!(linked.body.contains("\"y\": () => __kestrel_m0[\"x\"]"));
    }

    #[test]
    fn namespace_import_binds_the_exports_object() {
        let linked = link("import * as ns from './a.js';\nns.x;\n").unwrap();
        assert!(linked.body.contains(
            "const __kestrel_m0 = __kestrel_require(\"/a.js\"), ns = __kestrel_m0;"
        ));
        assert!(linked.body.contains("ns.x;"));
    }

    #[test]
    fn top_level_await_is_reported_against_the_module() {
        let err = link("const v = await Promise.resolve(1);\n").unwrap_err();
        match err {
            BundleError::EngineSyntax { path, messages } => {
                assert_eq!(path, "/index.js");
                assert!(messages[0].contains("top-level await"));
            }
            other => panic!("expected EngineSyntax, got {other:?}"),
        }
        assert!(link("async function f() { await g(); for await (const x of y) {} }\nconst h = async () => await g();\n").is_ok());
        assert!(link("for await (const x of y) {}\n").is_err());
    }

    #[test]
    fn side_effect_import_becomes_bare_require() {
        let linked = link("import './setup.js';\n").unwrap();
        assert!(linked.body.contains("__kestrel_require(\"/setup.js\");"));
    }

    #[test]
    fn exported_declarations_register_getters() {
        let linked = link("export const x = () => 1, { a, b: [c] } = obj;\nexport function f() {}\n").unwrap();
        assert!(linked.body.starts_with(
            "__kestrel_export(__kestrel_exports, { \"x\": () => x, \"a\": () => a, \"c\": () => c, \"f\": () => f });"
        ));
        assert!(linked.body.contains("const x = () => 1"));
        assert!(!linked.body.contains("export"));
    }

    #[test]
    fn anonymous_default_export_is_bound_to_a_local() {
        let linked = link("export default function () { return 1; }\n").unwrap();
        assert!(linked.body.contains("const __kestrel_default = function"));
        assert!(linked.body.contains("\"default\": () => __kestrel_default"));
    }

    #[test]
    fn re_exports_require_their_source() {
        let linked = link("export * from './a.js';\nexport { b as c } from './b.js';\n").unwrap();
        assert_eq!(
            linked.dependencies,
            vec!["/a.js".to_string(), "/b.js".to_string()]
        );
        assert!(linked.body.contains(
            "__kestrel_export_star(__kestrel_exports, __kestrel_require(\"/a.js\"));"
        ));
        assert!(linked.body.contains("\"c\": () => __kestrel_m0[\"b\"]"));
    }

    #[test]
    fn dynamic_import_is_reported_with_its_own_kind() {
        let err = link("const m = import('./lazy.js');\n").unwrap_err();
        match err {
            BundleError::NotResolvable { path, kind, .. } => {
                assert_eq!(path, "./lazy.js");
                assert_eq!(kind, ImportKind::DynamicImport);
            }
            other => panic!("expected NotResolvable, got {other:?}"),
        }
    }

    #[test]
    fn require_call_is_reported_with_its_own_kind() {
        let err = link("const fs = require('./fs.js');\n").unwrap_err();
        assert!(matches!(
            err,
            BundleError::NotResolvable {
                kind: ImportKind::RequireCall,
                ..
            }
        ));
    }

    #[test]
    fn raw_module_exports_content_as_default() {
        let linked = raw_module("hello \"world\"\n");
        assert!(linked.body.contains("const __kestrel_default = \"hello \\\"world\\\"\\n\";"));
        assert!(linked.dependencies.is_empty());
    }
}
