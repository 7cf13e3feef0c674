//! Bounded C occurrence analyzer built on `tree_sitter::{Parser, Node}`:
//! a recursive `walk` matching on `node.kind()`, reading node text via
//! `child_by_field_name`/`utf8_text`. Reports every
//! read/write/address-of/pointee use, plus member accesses, not just
//! the one record per definition a plain symbol extractor would emit.
//!
//! This is intentionally not a full semantic analyzer: it has no
//! cross-function type inference. `field_expression`/pointer-expression
//! base-identifier-to-struct-tag resolution is limited to a per-function
//! local table built from declarations actually visible in that
//! function; anything it cannot resolve falls back to a `tag = "?"`
//! placeholder.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser};

use super::intern::Interner;
use super::{Position, Reporter, Symbol};
use crate::mode::{mode_bits, Triple};
use crate::store::records::Kind;

pub fn parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .context("failed to load tree-sitter-c grammar")?;
    Ok(parser)
}

/// Walks one C translation unit, reporting definitions and occurrences
/// to a `Reporter`.
pub struct CFrontend<'a> {
    stream: usize,
    source: &'a str,
    interner: Interner,
}

impl<'a> CFrontend<'a> {
    pub fn new(stream: usize, source: &'a str) -> Self {
        Self {
            stream,
            source,
            interner: Interner::new(),
        }
    }

    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Result<()> {
        let mut parser = parser()?;
        let tree = parser
            .parse(self.source, None)
            .context("failed to parse C source")?;
        let mut scope = Scope::default();
        self.walk_children(tree.root_node(), reporter, None, false, &mut scope)
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn pos(&self, node: Node) -> Position {
        let p = node.start_position();
        Position {
            stream: self.stream,
            line: p.row as i64 + 1,
            column: p.column as i64 + 1,
        }
    }

    fn walk_children(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        in_function: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, reporter, context, in_function, scope)?;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        in_function: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        match node.kind() {
            "function_definition" => self.visit_function_definition(node, reporter, context)?,
            "declaration" => self.visit_declaration(node, reporter, context, in_function, scope)?,
            "struct_specifier" | "union_specifier" => {
                self.visit_aggregate_specifier(node, reporter, context, in_function, scope)?
            }
            "identifier" => self.visit_identifier_use(node, reporter, context, scope)?,
            "field_expression" => self.visit_field_expression(node, reporter, context, scope)?,
            _ => self.walk_children(node, reporter, context, in_function, scope)?,
        }
        Ok(())
    }

    fn visit_function_definition(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
    ) -> Result<()> {
        let declarator = node.child_by_field_name("declarator");
        let name_node = declarator.and_then(identifier_in_declarator);

        let func_name = name_node.map(|n| self.interner.intern(self.text(n)));
        if let (Some(name_node), Some(func_name)) = (name_node, func_name.as_deref()) {
            let sym = Symbol {
                ident: Some(func_name),
                kind: Kind::Function,
                pos: self.pos(name_node),
                is_local: false,
            };
            reporter.r_symdef(context, &sym)?;
        }

        let mut scope = Scope::default();
        if let Some(declarator) = declarator {
            self.collect_parameter_types(declarator, &mut scope);
        }

        // Parameter declarator identifiers are type-position names, not
        // occurrences; only the body is walked for uses.
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body, reporter, func_name.as_deref(), true, &mut scope)?;
        }
        Ok(())
    }

    /// Record `name -> struct tag` for parameters declared with an
    /// aggregate type, so `field_expression` can resolve the tag later
    /// in the function body.
    fn collect_parameter_types(&mut self, declarator: Node, scope: &mut Scope) {
        if declarator.kind() != "function_declarator" {
            return;
        }
        let Some(params) = declarator.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            if param.kind() != "parameter_declaration" {
                continue;
            }
            let Some(decl) = param.child_by_field_name("declarator") else {
                continue;
            };
            let Some(ident) = identifier_in_declarator(decl) else {
                continue;
            };
            scope.locals.insert(self.text(ident).to_string());
            if let Some(tag) = struct_tag_of_type(param, self.source) {
                scope.var_tags.insert(self.text(ident).to_string(), tag);
            }
        }
    }

    fn visit_declaration(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        in_function: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        let tag = struct_tag_of_type(node, self.source);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "init_declarator" => {
                    let declarator = child.child_by_field_name("declarator");
                    if let Some(declarator) = declarator {
                        self.declare(declarator, reporter, context, in_function, &tag, scope)?;
                    }
                    if let Some(value) = child.child_by_field_name("value") {
                        self.walk_children(value, reporter, context, in_function, scope)?;
                    }
                }
                "identifier" | "pointer_declarator" | "array_declarator" | "function_declarator" => {
                    self.declare(child, reporter, context, in_function, &tag, scope)?;
                }
                "struct_specifier" | "union_specifier" | "enum_specifier" => {
                    self.visit(child, reporter, context, in_function, scope)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare(
        &mut self,
        declarator: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        in_function: bool,
        tag: &Option<String>,
        scope: &mut Scope,
    ) -> Result<()> {
        let Some(name_node) = identifier_in_declarator(declarator) else {
            return Ok(());
        };
        let name = self.interner.intern(self.text(name_node));

        if declarator.kind() == "function_declarator" {
            // A function prototype, not a definition.
            return Ok(());
        }

        if in_function {
            scope.locals.insert(name.clone());
        }
        if let Some(tag) = tag {
            scope.var_tags.insert(name.clone(), tag.clone());
        }

        let sym = Symbol {
            ident: Some(&name),
            kind: Kind::Variable,
            pos: self.pos(name_node),
            is_local: in_function,
        };
        reporter.r_symdef(context, &sym)
    }

    fn visit_aggregate_specifier(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        in_function: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        let name_node = node.child_by_field_name("name");
        let tag_name = name_node.map(|n| self.interner.intern(self.text(n)));

        if let (Some(name_node), Some(tag_name)) = (name_node, tag_name.as_deref()) {
            let sym = Symbol {
                ident: Some(tag_name),
                kind: Kind::Struct,
                pos: self.pos(name_node),
                is_local: false,
            };
            reporter.r_symdef(context, &sym)?;
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for field in body.children(&mut cursor) {
                if field.kind() != "field_declaration" {
                    continue;
                }
                let mut field_cursor = field.walk();
                for declarator in field.children(&mut field_cursor) {
                    let Some(member_node) = identifier_in_declarator(declarator) else {
                        continue;
                    };
                    if member_node.kind() != "field_identifier" && member_node.kind() != "identifier" {
                        continue;
                    }
                    let member_name = self.text(member_node);
                    reporter.r_memdef(context, self.pos(member_node), tag_name.as_deref(), Some(member_name))?;
                }
            }
        }

        // Recurse to pick up nested declarations/expressions (e.g. an
        // anonymous struct used inline in a declaration).
        self.walk_children(node, reporter, context, in_function, scope)
    }

    fn visit_identifier_use(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        scope: &Scope,
    ) -> Result<()> {
        let Some(parent) = node.parent() else {
            return Ok(());
        };
        // Declarator identifiers are handled by visit_declaration /
        // visit_function_definition, never as plain uses.
        if matches!(
            parent.kind(),
            "function_declarator" | "init_declarator" | "parameter_declaration"
        ) && parent.child_by_field_name("declarator") == Some(node)
        {
            return Ok(());
        }

        let name = self.text(node);
        let triple = use_triple(node, parent);
        let (read, write) = use_rw(node, parent);
        let mode = mode_bits(triple, read, write);

        let sym = Symbol {
            ident: Some(name),
            kind: Kind::Variable,
            pos: self.pos(node),
            is_local: scope.locals.contains(name),
        };
        reporter.r_symbol(context, mode, self.pos(node), &sym)
    }

    fn visit_field_expression(
        &mut self,
        node: Node,
        reporter: &mut dyn Reporter,
        context: Option<&str>,
        scope: &mut Scope,
    ) -> Result<()> {
        let base = node.child_by_field_name("argument");
        let field = node.child_by_field_name("field");

        let tag = base
            .filter(|n| n.kind() == "identifier")
            .and_then(|n| scope.var_tags.get(self.text(n)).cloned());

        let member = field.map(|f| self.text(f));

        let triple = Triple::Val;
        let parent = node.parent().unwrap_or(node);
        let (read, write) = use_rw(node, parent);
        let mode = mode_bits(triple, read, write);

        reporter.r_member(context, mode, self.pos(node), tag.as_deref(), member)?;

        // Still walk the base expression in case it contains further
        // occurrences (e.g. `a[i].b`).
        if let Some(base) = base {
            if base.kind() != "identifier" {
                self.visit(base, reporter, context, false, scope)?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Scope {
    /// `variable name -> struct/union tag`, built from declarations
    /// visible in the current function.
    var_tags: HashMap<String, String>,
    /// Every parameter/local name declared in the current function,
    /// regardless of type. Drives the locality filter for identifier
    /// *uses* (`var_tags` alone only covers aggregate-typed locals).
    locals: HashSet<String>,
}

/// Descend through `pointer_declarator`/`array_declarator`/
/// `function_declarator`/`init_declarator` wrappers to the bare
/// identifier they name.
fn identifier_in_declarator(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "field_identifier" => Some(node),
        "pointer_declarator" | "array_declarator" | "function_declarator" | "init_declarator" => {
            node.child_by_field_name("declarator")
                .and_then(identifier_in_declarator)
        }
        "parenthesized_declarator" => node
            .named_child(0)
            .and_then(identifier_in_declarator),
        _ => None,
    }
}

/// If `node` (a `declaration` or `parameter_declaration`) has a
/// `struct`/`union` type naming a tag, return that tag's text.
fn struct_tag_of_type(node: Node, source: &str) -> Option<String> {
    let type_node = node.child_by_field_name("type")?;
    match type_node.kind() {
        "struct_specifier" | "union_specifier" => {
            let name = type_node.child_by_field_name("name")?;
            Some(name.utf8_text(source.as_bytes()).ok()?.to_string())
        }
        _ => None,
    }
}

/// Which of the AOF/VAL/PTR triples this identifier/field use belongs
/// to, from its immediate syntactic context.
fn use_triple(node: Node, parent: Node) -> Triple {
    match parent.kind() {
        "pointer_expression" => {
            let operator = parent
                .child_by_field_name("operator")
                .map(|o| o.kind())
                .unwrap_or("");
            if operator == "&" {
                Triple::Aof
            } else {
                Triple::Ptr
            }
        }
        _ => {
            let _ = node;
            Triple::Val
        }
    }
}

/// Read/write classification for a use, from its immediate syntactic
/// context. Address-of and plain reads are read-only; assignment
/// targets and increment/decrement are write (or read+write for
/// compound forms); dereference-as-lvalue (`*p = ...`) is a pointee
/// write.
fn use_rw(node: Node, parent: Node) -> (bool, bool) {
    match parent.kind() {
        "assignment_expression" => {
            let is_left = parent.child_by_field_name("left") == Some(node);
            if !is_left {
                return (true, false);
            }
            let op = parent
                .child_by_field_name("operator")
                .map(|o| o.kind())
                .unwrap_or("=");
            if op == "=" {
                (false, true)
            } else {
                (true, true)
            }
        }
        "update_expression" => (true, true),
        "pointer_expression" if parent.child_by_field_name("operator").map(|o| o.kind()) == Some("&") => {
            (true, false)
        }
        "pointer_expression" => {
            // `*p` used as an lvalue if its own parent is an
            // assignment/update with this pointer_expression as the
            // target.
            if let Some(grandparent) = parent.parent() {
                match grandparent.kind() {
                    "assignment_expression" if grandparent.child_by_field_name("left") == Some(parent) => {
                        let op = grandparent
                            .child_by_field_name("operator")
                            .map(|o| o.kind())
                            .unwrap_or("=");
                        return if op == "=" { (false, true) } else { (true, true) };
                    }
                    "update_expression" => return (true, true),
                    _ => {}
                }
            }
            (true, false)
        }
        "field_expression" => {
            if let Some(grandparent) = parent.parent() {
                match grandparent.kind() {
                    "assignment_expression" if grandparent.child_by_field_name("left") == Some(parent) => {
                        let op = grandparent
                            .child_by_field_name("operator")
                            .map(|o| o.kind())
                            .unwrap_or("=");
                        return if op == "=" { (false, true) } else { (true, true) };
                    }
                    "update_expression" => return (true, true),
                    _ => {}
                }
            }
            (true, false)
        }
        _ => (true, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        defs: Vec<(String, char, Position, Option<String>)>,
        uses: Vec<(String, u32, Position, Option<String>, bool)>,
        member_defs: Vec<(Option<String>, Option<String>)>,
        member_uses: Vec<(Option<String>, Option<String>, u32)>,
    }

    impl Reporter for Recorder {
        fn r_symdef(&mut self, context: Option<&str>, sym: &Symbol) -> Result<()> {
            self.defs.push((
                sym.ident.unwrap_or("").to_string(),
                sym.kind.code(),
                sym.pos,
                context.map(|s| s.to_string()),
            ));
            Ok(())
        }

        fn r_symbol(&mut self, context: Option<&str>, mode: u32, pos: Position, sym: &Symbol) -> Result<()> {
            self.uses.push((
                sym.ident.unwrap_or("").to_string(),
                mode,
                pos,
                context.map(|s| s.to_string()),
                sym.is_local,
            ));
            Ok(())
        }

        fn r_memdef(&mut self, _context: Option<&str>, _pos: Position, tag: Option<&str>, member: Option<&str>) -> Result<()> {
            self.member_defs
                .push((tag.map(|s| s.to_string()), member.map(|s| s.to_string())));
            Ok(())
        }

        fn r_member(
            &mut self,
            _context: Option<&str>,
            mode: u32,
            _pos: Position,
            tag: Option<&str>,
            member: Option<&str>,
        ) -> Result<()> {
            self.member_uses.push((
                tag.map(|s| s.to_string()),
                member.map(|s| s.to_string()),
                mode,
            ));
            Ok(())
        }
    }

    fn run(source: &str) -> Recorder {
        let mut recorder = Recorder::default();
        let mut frontend = CFrontend::new(0, source);
        frontend.run(&mut recorder).unwrap();
        recorder
    }

    #[test]
    fn reports_global_variable_and_function_defs() {
        let rec = run("int x;\nint f(void) {\n  return x;\n}\n");
        assert!(rec.defs.iter().any(|(name, kind, _, ctx)| name == "x" && *kind == 'v' && ctx.is_none()));
        assert!(rec.defs.iter().any(|(name, kind, _, ctx)| name == "f" && *kind == 'f' && ctx.is_none()));
        let (name, mode, _, ctx, _) = rec
            .uses
            .iter()
            .find(|(name, ..)| name == "x")
            .expect("expected a use of x");
        assert_eq!(name, "x");
        assert_eq!(*mode, mode_bits(Triple::Val, true, false));
        assert_eq!(ctx.as_deref(), Some("f"));
    }

    #[test]
    fn classifies_assignment_as_write() {
        let rec = run("int x;\nvoid f(void) {\n  x = 1;\n}\n");
        let (_, mode, ..) = rec.uses.iter().find(|(name, ..)| name == "x").unwrap();
        assert_eq!(*mode, mode_bits(Triple::Val, false, true));
    }

    #[test]
    fn classifies_compound_assignment_as_read_write() {
        let rec = run("int x;\nvoid f(void) {\n  x += 1;\n}\n");
        let (_, mode, ..) = rec.uses.iter().find(|(name, ..)| name == "x").unwrap();
        assert_eq!(*mode, mode_bits(Triple::Val, true, true));
    }

    #[test]
    fn classifies_address_of_as_aof_read() {
        let rec = run("int x;\nint *f(void) {\n  return &x;\n}\n");
        let (_, mode, ..) = rec.uses.iter().find(|(name, ..)| name == "x").unwrap();
        assert_eq!(*mode, mode_bits(Triple::Aof, true, false));
    }

    #[test]
    fn classifies_dereference_write_as_ptr_write() {
        let rec = run("void f(int *p) {\n  *p = 1;\n}\n");
        let (_, mode, ..) = rec.uses.iter().find(|(name, ..)| name == "p").unwrap();
        assert_eq!(*mode, mode_bits(Triple::Ptr, false, true));
    }

    #[test]
    fn plain_local_variable_use_is_marked_local_not_just_its_def() {
        // A local with no aggregate type has no entry in the per-function
        // tag table; `is_local` on its *uses* must still come from having
        // been declared in this function, not from that table.
        let rec = run("void f(void) {\n  int local_var;\n  local_var = 1;\n}\n");
        let (_, _, _, _, use_is_local) = rec
            .uses
            .iter()
            .find(|(name, ..)| name == "local_var")
            .expect("expected a use of local_var");
        assert!(*use_is_local);
    }

    #[test]
    fn function_parameter_use_is_marked_local() {
        let rec = run("void f(int n) {\n  n = n + 1;\n}\n");
        assert!(rec
            .uses
            .iter()
            .filter(|(name, ..)| name == "n")
            .all(|(_, _, _, _, is_local)| *is_local));
    }

    #[test]
    fn reports_struct_member_defs() {
        let rec = run("struct point {\n  int x;\n  int y;\n};\n");
        assert!(rec.defs.iter().any(|(name, kind, ..)| name == "point" && *kind == 's'));
        assert!(rec
            .member_defs
            .iter()
            .any(|(tag, member)| tag.as_deref() == Some("point") && member.as_deref() == Some("x")));
        assert!(rec
            .member_defs
            .iter()
            .any(|(tag, member)| tag.as_deref() == Some("point") && member.as_deref() == Some("y")));
    }

    #[test]
    fn resolves_field_expression_tag_from_parameter_type() {
        let rec = run(
            "struct point { int x; };\nint f(struct point p) {\n  return p.x;\n}\n",
        );
        let (tag, member, mode) = rec
            .member_uses
            .iter()
            .find(|(_, member, _)| member.as_deref() == Some("x"))
            .unwrap();
        assert_eq!(tag.as_deref(), Some("point"));
        assert_eq!(member.as_deref(), Some("x"));
        assert_eq!(*mode, mode_bits(Triple::Val, true, false));
    }

    #[test]
    fn unresolvable_field_expression_tag_falls_back_to_none() {
        let rec = run("void f(void *p) {\n  int x = ((struct point *)p)->x;\n}\n");
        assert!(rec
            .member_uses
            .iter()
            .any(|(tag, member, _)| tag.is_none() && member.as_deref() == Some("x")));
    }
}
