//! Per-file symbol extraction via tree-sitter
//!
//! Extraction is deliberately tolerant: tree-sitter produces a tree even
//! for broken source, so a malformed file yields whatever definitions still
//! parse, plus a warning, never a failure.

use std::path::Path;

use tree_sitter::Node;

use crate::lang::{Lang, LangFamily};
use crate::schema::{SourceLocation, Symbol, SymbolKind};

/// Everything extracted from one file
#[derive(Debug, Default)]
pub struct FileSymbols {
    /// Path relative to the codebase root
    pub file: String,

    pub symbols: Vec<Symbol>,

    /// Imported module/crate names
    pub imports: Vec<String>,

    /// Call edges: (caller qualified name, callee name as written, line)
    pub calls: Vec<(String, String, usize)>,

    /// Set when the file parsed with errors or not at all
    pub parse_warning: Option<String>,
}

/// Module namespace from a relative path: `src/orders/cart.py` → `cart`
pub fn namespace_of(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Parse one file and extract its symbol table.
///
/// Never returns an error: parse trouble lands in `parse_warning` with a
/// best-effort (possibly empty) symbol set.
pub fn extract_file(file: &str, source: &str, lang: Lang) -> FileSymbols {
    let mut out = FileSymbols {
        file: file.to_string(),
        ..Default::default()
    };

    let mut parser = tree_sitter::Parser::new();
    if parser.set_language(&lang.tree_sitter_language()).is_err() {
        out.parse_warning = Some(format!("grammar unavailable for {}", lang.name()));
        return out;
    }

    let Some(tree) = parser.parse(source, None) else {
        out.parse_warning = Some("parser produced no tree".to_string());
        return out;
    };

    let root = tree.root_node();
    if root.has_error() {
        out.parse_warning = Some(format!(
            "{} syntax error(s); symbols are best-effort",
            count_errors(root)
        ));
    }

    let namespace = namespace_of(file);
    let mut stack: Vec<String> = Vec::new();
    walk(root, source.as_bytes(), lang.family(), &namespace, &mut stack, &mut out);

    out
}

fn count_errors(root: Node) -> usize {
    let mut count = 0;
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() {
            count += 1;
        }
        for child in node.children(&mut cursor) {
            if child.has_error() {
                stack.push(child);
            }
        }
    }
    count.max(1)
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn name_of(node: Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .filter(|n| !n.is_empty())
}

/// Rightmost identifier of a callee expression: `obj.attr.method` → `method`,
/// `mod::func` → `func`
fn callee_name(text: &str) -> String {
    let last = text.rsplit("::").next().unwrap_or(text);
    let last = last.rsplit('.').next().unwrap_or(last);
    last.trim().to_string()
}

fn push_symbol(
    out: &mut FileSymbols,
    namespace: &str,
    stack: &[String],
    name: &str,
    kind: SymbolKind,
    node: Node,
) -> String {
    let qualified = match stack.last() {
        Some(parent) => format!("{}.{}", parent, name),
        None => format!("{}.{}", namespace, name),
    };

    out.symbols.push(Symbol {
        qualified_name: qualified.clone(),
        kind,
        location: SourceLocation {
            file: out.file.clone(),
            line: node.start_position().row + 1,
            column: Some(node.start_position().column + 1),
        },
        end_line: node.end_position().row + 1,
        enclosing: stack.last().cloned(),
    });

    qualified
}

fn walk(
    node: Node,
    source: &[u8],
    family: LangFamily,
    namespace: &str,
    stack: &mut Vec<String>,
    out: &mut FileSymbols,
) {
    let mut entered: Option<String> = None;

    match family {
        LangFamily::Python => match node.kind() {
            "function_definition" => {
                if let Some(name) = name_of(node, source) {
                    let kind = if stack.is_empty() {
                        SymbolKind::Function
                    } else {
                        SymbolKind::Method
                    };
                    entered = Some(push_symbol(out, namespace, stack, &name, kind, node));
                }
            }
            "class_definition" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Class, node));
                }
            }
            "import_statement" | "import_from_statement" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "dotted_name" || child.kind() == "aliased_import" {
                        out.imports.push(node_text(child, source).to_string());
                    }
                }
            }
            "call" => record_call(node, source, stack, out),
            _ => {}
        },
        LangFamily::Rust => match node.kind() {
            "function_item" => {
                if let Some(name) = name_of(node, source) {
                    let kind = if stack.is_empty() {
                        SymbolKind::Function
                    } else {
                        SymbolKind::Method
                    };
                    entered = Some(push_symbol(out, namespace, stack, &name, kind, node));
                }
            }
            "struct_item" | "enum_item" | "trait_item" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Class, node));
                }
            }
            "impl_item" => {
                // functions inside an impl attach to the type name
                if let Some(ty) = node.child_by_field_name("type") {
                    let name = callee_name(node_text(ty, source));
                    entered = Some(match stack.last() {
                        Some(parent) => format!("{}.{}", parent, name),
                        None => format!("{}.{}", namespace, name),
                    });
                }
            }
            "mod_item" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Module, node));
                }
            }
            "use_declaration" => {
                out.imports.push(node_text(node, source).to_string());
            }
            "call_expression" => record_call(node, source, stack, out),
            _ => {}
        },
        LangFamily::JavaScript => match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(
                        out,
                        namespace,
                        stack,
                        &name,
                        SymbolKind::Function,
                        node,
                    ));
                }
            }
            "method_definition" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Method, node));
                }
            }
            "class_declaration" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Class, node));
                }
            }
            "variable_declarator" => {
                // const f = () => {} defines a function-valued binding
                if let (Some(name_node), Some(value)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("value"),
                ) {
                    if matches!(value.kind(), "arrow_function" | "function_expression") {
                        let name = node_text(name_node, source).to_string();
                        if !name.is_empty() {
                            entered = Some(push_symbol(
                                out,
                                namespace,
                                stack,
                                &name,
                                SymbolKind::Function,
                                node,
                            ));
                        }
                    }
                }
            }
            "import_statement" => {
                out.imports.push(node_text(node, source).to_string());
            }
            "call_expression" => record_call(node, source, stack, out),
            _ => {}
        },
        LangFamily::Go => match node.kind() {
            "function_declaration" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(
                        out,
                        namespace,
                        stack,
                        &name,
                        SymbolKind::Function,
                        node,
                    ));
                }
            }
            "method_declaration" => {
                if let Some(name) = name_of(node, source) {
                    entered = Some(push_symbol(out, namespace, stack, &name, SymbolKind::Method, node));
                }
            }
            "type_declaration" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "type_spec" {
                        if let Some(name) = name_of(child, source) {
                            push_symbol(out, namespace, stack, &name, SymbolKind::Class, child);
                        }
                    }
                }
            }
            "import_spec" => {
                out.imports.push(node_text(node, source).trim_matches('"').to_string());
            }
            "call_expression" => record_call(node, source, stack, out),
            _ => {}
        },
    }

    if let Some(qualified) = &entered {
        stack.push(qualified.clone());
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, family, namespace, stack, out);
    }

    if entered.is_some() {
        stack.pop();
    }
}

fn record_call(node: Node, source: &[u8], stack: &[String], out: &mut FileSymbols) {
    let Some(caller) = stack.last() else {
        return; // top-level call, no enclosing symbol to edge from
    };
    let Some(func) = node.child_by_field_name("function") else {
        return;
    };
    let name = callee_name(node_text(func, source));
    if name.is_empty() {
        return;
    }
    out.calls
        .push((caller.clone(), name, node.start_position().row + 1));
}
