use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::path::Path;

use crate::types::{FileType, ImportInfo, ImportKind, ModuleStructure};

/// Result of structurally parsing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModule {
    pub structure: ModuleStructure,
    /// A more specific classification than `utility`, if one applies
    pub file_type: Option<FileType>,
}

/// Extracts imports, exports and JSX usage from a single file's text.
pub trait StructuralParser: Send + Sync {
    fn parse(&self, content: &str, path: &str) -> ParsedModule;
}

/// Structural parser backed by oxc.
///
/// Syntax errors are tolerated: whatever oxc recovers is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcStructuralParser;

impl StructuralParser for OxcStructuralParser {
    fn parse(&self, content: &str, path: &str) -> ParsedModule {
        let structure = module_structure(content, path);
        let file_type = classify(path, content, &structure);
        trace!("Classified {} as {:?}", path, file_type);
        ParsedModule { structure, file_type }
    }
}

pub fn module_structure(src: &str, path: &str) -> ModuleStructure {
    trace!("Parsing file structure: {}", path);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, .. } =
        OxcParser::new(&allocator, src, source_type_for(path)).parse();
    if !errors.is_empty() {
        debug!("Recovered from {} syntax errors in {}", errors.len(), path);
    }

    let mut structure = ModuleStructure::default();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                // import type { Foo } from 'bar' has no runtime edge
                if decl.import_kind.is_type() {
                    trace!("Skipping type-only import declaration in {}", path);
                    continue;
                }

                let mut names = Vec::new();
                let mut has_runtime_import = true;
                if let Some(specifiers) = &decl.specifiers {
                    for spec in specifiers {
                        match spec {
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                if !s.import_kind.is_type() {
                                    names.push(s.local.name.to_string());
                                }
                            }
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                names.push(s.local.name.to_string());
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                names.push(s.local.name.to_string());
                            }
                        }
                    }
                    // import { type Foo } from 'bar' is type-only too
                    has_runtime_import = specifiers.is_empty() || !names.is_empty();
                }

                if has_runtime_import {
                    let source = decl.source.value.to_string();
                    trace!("Found static import: '{}' in {}", source, path);
                    structure.imports.push(ImportInfo { source, kind: ImportKind::Static, names });
                }
            }
            Statement::ExportNamedDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    continue;
                }
                if let Some(source) = &decl.source {
                    structure.imports.push(ImportInfo {
                        source: source.value.to_string(),
                        kind: ImportKind::Static,
                        names: Vec::new(),
                    });
                }
                if let Some(declaration) = &decl.declaration {
                    collect_declared_names(declaration, &mut structure.exports);
                }
                for spec in &decl.specifiers {
                    structure.exports.push(spec.exported.name().to_string());
                }
            }
            Statement::ExportDefaultDeclaration(_) => {
                structure.exports.push("default".to_string());
            }
            Statement::ExportAllDeclaration(decl) => {
                structure.imports.push(ImportInfo {
                    source: decl.source.value.to_string(),
                    kind: ImportKind::Static,
                    names: Vec::new(),
                });
            }
            Statement::ExpressionStatement(es) => {
                extract_require_from_expression(&es.expression, &mut structure.imports);
            }
            Statement::VariableDeclaration(vd) => {
                // const x = require('...') or const x = someFunc(require('...'))
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        extract_require_from_expression(init, &mut structure.imports);
                    }
                }
            }
            _ => {}
        }
    }

    let mut jsx = JsxCollector::default();
    jsx.visit_program(&program);
    structure.has_jsx = jsx.has_jsx;
    structure.jsx_components = jsx.components;

    debug!(
        "{}: {} imports, {} exports, {} JSX components",
        path,
        structure.imports.len(),
        structure.exports.len(),
        structure.jsx_components.len()
    );
    structure
}

fn collect_declared_names(declaration: &Declaration, exports: &mut Vec<String>) {
    match declaration {
        Declaration::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                exports.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(id) = &c.id {
                exports.push(id.name.to_string());
            }
        }
        Declaration::VariableDeclaration(vd) => {
            for decl in &vd.declarations {
                if let Some(id) = decl.id.get_binding_identifier() {
                    exports.push(id.name.to_string());
                }
            }
        }
        _ => {}
    }
}

fn extract_require_from_expression(expr: &Expression, imports: &mut Vec<ImportInfo>) {
    match expr {
        Expression::CallExpression(ce) => {
            if let Expression::Identifier(callee_ident) = &ce.callee
                && callee_ident.name.as_str() == "require"
                && !ce.arguments.is_empty()
                && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
            {
                trace!("Found require() call: '{}'", sl.value);
                imports.push(ImportInfo {
                    source: sl.value.to_string(),
                    kind: ImportKind::Static,
                    names: Vec::new(),
                });
            }
            for arg in &ce.arguments {
                if let Some(arg_expr) = arg.as_expression() {
                    extract_require_from_expression(arg_expr, imports);
                }
            }
            extract_require_from_expression(&ce.callee, imports);
        }
        Expression::ImportExpression(ie) => {
            if let Expression::StringLiteral(sl) = &ie.source {
                trace!("Found dynamic import(): '{}'", sl.value);
                imports.push(ImportInfo {
                    source: sl.value.to_string(),
                    kind: ImportKind::Dynamic,
                    names: Vec::new(),
                });
            }
        }
        Expression::ArrayExpression(ae) => {
            for elem in &ae.elements {
                if let Some(expr) = elem.as_expression() {
                    extract_require_from_expression(expr, imports);
                }
            }
        }
        Expression::ObjectExpression(oe) => {
            for prop in &oe.properties {
                if let Some(expr) = prop.as_property() {
                    extract_require_from_expression(&expr.value, imports);
                }
            }
        }
        Expression::ConditionalExpression(ce) => {
            extract_require_from_expression(&ce.test, imports);
            extract_require_from_expression(&ce.consequent, imports);
            extract_require_from_expression(&ce.alternate, imports);
        }
        Expression::AssignmentExpression(ae) => {
            extract_require_from_expression(&ae.right, imports);
        }
        Expression::ParenthesizedExpression(pe) => {
            extract_require_from_expression(&pe.expression, imports);
        }
        Expression::ArrowFunctionExpression(af) => {
            // lazy(() => import('./Page'))
            for stmt in &af.body.statements {
                match stmt {
                    Statement::ExpressionStatement(es) => {
                        extract_require_from_expression(&es.expression, imports)
                    }
                    Statement::ReturnStatement(rs) => {
                        if let Some(arg) = &rs.argument {
                            extract_require_from_expression(arg, imports);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

#[derive(Default)]
struct JsxCollector {
    has_jsx: bool,
    components: Vec<String>,
}

impl<'a> Visit<'a> for JsxCollector {
    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        self.has_jsx = true;
        // Lowercase tags are intrinsic elements and parse as plain identifiers
        if let JSXElementName::IdentifierReference(ident) = &it.name {
            let name = ident.name.to_string();
            if name.starts_with(|c: char| c.is_ascii_uppercase()) && !self.components.contains(&name)
            {
                self.components.push(name);
            }
        }
        walk::walk_jsx_opening_element(self, it);
    }

    fn visit_jsx_fragment(&mut self, it: &JSXFragment<'a>) {
        self.has_jsx = true;
        walk::walk_jsx_fragment(self, it);
    }
}

fn classify(path: &str, content: &str, structure: &ModuleStructure) -> Option<FileType> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name.contains(".config.") {
        return Some(FileType::Config);
    }

    let stem = file_name.split('.').next().unwrap_or(file_name);
    if stem.len() > 3
        && stem.starts_with("use")
        && stem[3..].starts_with(|c: char| c.is_ascii_uppercase())
    {
        return Some(FileType::Hook);
    }

    if content.contains("createContext") {
        return Some(FileType::Context);
    }

    if structure.has_jsx {
        if path.contains("/pages/") {
            return Some(FileType::Page);
        }
        return Some(FileType::Component);
    }

    None
}

fn source_type_for(path: &str) -> SourceType {
    let ext = Path::new(path).extension().and_then(|e| e.to_str());

    // Vite projects routinely put JSX in plain .js files
    SourceType::default()
        .with_module(true)
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, content: &str) -> ParsedModule {
        OxcStructuralParser.parse(content, path)
    }

    fn sources(module: &ParsedModule) -> Vec<&str> {
        module.structure.imports.iter().map(|i| i.source.as_str()).collect()
    }

    #[test]
    fn test_static_import_default() {
        let module = parse("/src/a.js", "import foo from './foo';");
        assert_eq!(sources(&module), vec!["./foo"]);
        assert_eq!(module.structure.imports[0].names, vec!["foo"]);
        assert_eq!(module.structure.imports[0].kind, ImportKind::Static);
    }

    #[test]
    fn test_static_import_named_and_namespace() {
        let module = parse(
            "/src/a.js",
            "import { bar, baz } from './utils';\nimport * as all from './all';",
        );
        assert_eq!(sources(&module), vec!["./utils", "./all"]);
        assert_eq!(module.structure.imports[0].names, vec!["bar", "baz"]);
        assert_eq!(module.structure.imports[1].names, vec!["all"]);
    }

    #[test]
    fn test_side_effect_import() {
        let module = parse("/src/main.jsx", "import './index.css';");
        assert_eq!(sources(&module), vec!["./index.css"]);
        assert!(module.structure.imports[0].names.is_empty());
    }

    #[test]
    fn test_type_only_imports_skipped() {
        let module = parse(
            "/src/a.ts",
            "import type { Foo } from './types';\nimport { type Bar } from './bar';\nimport { type Baz, qux } from './mixed';",
        );
        assert_eq!(sources(&module), vec!["./mixed"]);
        assert_eq!(module.structure.imports[0].names, vec!["qux"]);
    }

    #[test]
    fn test_dynamic_and_require() {
        let module = parse(
            "/src/a.js",
            "const fs = require('fs');\nimport('./lazy');\nconst Page = lazy(() => import('./Page'));",
        );
        let imports = &module.structure.imports;
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].source, "fs");
        assert_eq!(imports[1].kind, ImportKind::Dynamic);
        assert_eq!(imports[2].source, "./Page");
        assert_eq!(imports[2].kind, ImportKind::Dynamic);
    }

    #[test]
    fn test_exports() {
        let module = parse(
            "/src/lib.js",
            "export function a() {}\nexport class B {}\nexport const c = 1, d = 2;\nconst e = 3;\nexport { e as f };\nexport default a;",
        );
        assert_eq!(module.structure.exports, vec!["a", "B", "c", "d", "f", "default"]);
    }

    #[test]
    fn test_reexports_count_as_imports() {
        let module =
            parse("/src/index.ts", "export * from './a';\nexport { b } from './b';");
        assert_eq!(sources(&module), vec!["./a", "./b"]);
        assert_eq!(module.structure.exports, vec!["b"]);
    }

    #[test]
    fn test_jsx_component_detection() {
        let module = parse(
            "/src/App.jsx",
            "import Header from './Header';\nexport default function App() {\n  return <div><Header /><Header /><main /></div>;\n}",
        );
        assert!(module.structure.has_jsx);
        assert_eq!(module.structure.jsx_components, vec!["Header"]);
        assert_eq!(module.file_type, Some(FileType::Component));
    }

    #[test]
    fn test_jsx_in_plain_js_file() {
        let module = parse("/src/Button.js", "export const Button = () => <button />;");
        assert!(module.structure.has_jsx);
        assert_eq!(module.file_type, Some(FileType::Component));
    }

    #[test]
    fn test_page_classification() {
        let module = parse("/src/pages/about.jsx", "export default () => <h1>About</h1>;");
        assert_eq!(module.file_type, Some(FileType::Page));
    }

    #[test]
    fn test_hook_context_config_classification() {
        assert_eq!(
            parse("/src/hooks/useAuth.js", "export function useAuth() {}").file_type,
            Some(FileType::Hook)
        );
        assert_eq!(
            parse("/src/ctx.js", "import { createContext } from 'react';\nexport const Ctx = createContext(null);")
                .file_type,
            Some(FileType::Context)
        );
        assert_eq!(
            parse("/vite.config.js", "export default {};").file_type,
            Some(FileType::Config)
        );
        assert_eq!(parse("/src/user.js", "export const user = 1;").file_type, None);
    }

    #[test]
    fn test_syntax_errors_are_tolerated() {
        let module = parse("/src/broken.js", "import a from './a';\nconst = ;");
        assert!(!module.structure.has_jsx);
        assert_eq!(module.file_type, None);
    }

    #[test]
    fn test_no_imports() {
        let module = parse("/src/x.js", "const x = 42;");
        assert!(module.structure.imports.is_empty());
        assert!(!module.structure.has_jsx);
    }
}
