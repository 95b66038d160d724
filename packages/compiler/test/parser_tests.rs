/**
 * Parser Tests
 *
 * Surface-grammar coverage: files, definitions, members, statements,
 * expressions, and fragment re-parsing under named rules.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::ast::printer::code;
    use quill_compiler::ast::{
        Ast, CallableKind, ClassKind, DeclKind, NodeId, NodeKind, Rule,
    };
    use quill_compiler::parser::Parser;

    fn parse(source: &str) -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let parser = Parser::new();
        let file = parser
            .parse(&mut ast, "test.q", source)
            .expect("source should parse");
        (ast, file)
    }

    fn definitions(ast: &Ast, file: NodeId) -> Vec<NodeId> {
        match &ast[file].kind {
            NodeKind::File(f) => f.definitions.clone(),
            _ => panic!("expected a file"),
        }
    }

    #[test]
    fn parses_function_with_body() {
        let (ast, file) = parse("void foo() { int x = 1; }");
        let defs = definitions(&ast, file);
        assert_eq!(defs.len(), 1);
        match &ast[defs[0]].kind {
            NodeKind::Callable(c) => {
                assert_eq!(c.kind, CallableKind::Function);
                assert_eq!(c.name, "foo");
                assert!(c.body.is_some());
            }
            other => panic!("expected a callable, got {:?}", other),
        }
    }

    #[test]
    fn parses_forward_declaration() {
        let (ast, file) = parse("int m();");
        let defs = definitions(&ast, file);
        match &ast[defs[0]].kind {
            NodeKind::Callable(c) => assert!(c.body.is_none()),
            other => panic!("expected a callable, got {:?}", other),
        }
    }

    #[test]
    fn parses_class_with_members() {
        let (ast, file) = parse(
            "class Point extends Base {
                 int x;
                 Point(int x) { self.x = x; }
                 int getx() { return self.x; }
             }",
        );
        let defs = definitions(&ast, file);
        let NodeKind::Class(class) = &ast[defs[0]].kind else {
            panic!("expected a class");
        };
        assert_eq!(class.kind, ClassKind::Class);
        assert_eq!(class.bases.len(), 1);
        assert_eq!(class.definitions.len(), 3);
        match &ast[class.definitions[1]].kind {
            NodeKind::Callable(c) => {
                assert_eq!(c.kind, CallableKind::Constructor);
                assert!(c.ty.is_none());
            }
            other => panic!("expected a constructor, got {:?}", other),
        }
    }

    #[test]
    fn parses_generic_type_reference() {
        let (ast, file) = parse("void f() { List<int> xs = []; }");
        let defs = definitions(&ast, file);
        let printed = code(&ast, defs[0]);
        assert!(printed.contains("List<int> xs = [];"), "got: {}", printed);
    }

    #[test]
    fn parses_new_as_type_receiver_call() {
        let (ast, file) = parse("void f() { Box b = new Box(1); }");
        let printed = code(&ast, definitions(&ast, file)[0]);
        assert!(printed.contains("new Box(1)"), "got: {}", printed);
    }

    #[test]
    fn equality_desugars_to_method_call() {
        let mut ast = Ast::new();
        let parser = Parser::new();
        let body = parser
            .rule(&mut ast, Rule::Body, "{ x == y; }")
            .expect("body should parse");
        let NodeKind::Block(stmts) = &ast[body].kind else { panic!("expected a block") };
        let NodeKind::ExprStmt(expr) = &ast[stmts[0]].kind else {
            panic!("expected an expression statement");
        };
        let NodeKind::Call(call) = &ast[*expr].kind else { panic!("expected a call") };
        match &ast[call.expr].kind {
            NodeKind::Attr(attr) => assert_eq!(attr.attr.text, "__eq__"),
            other => panic!("expected attribute access, got {:?}", other),
        }
    }

    #[test]
    fn parses_cast_expressions() {
        let mut ast = Ast::new();
        let parser = Parser::new();
        let body = parser
            .rule(&mut ast, Rule::Body, "{ return ?(helper(1)); }")
            .expect("body should parse");
        let NodeKind::Block(stmts) = &ast[body].kind else { panic!("expected a block") };
        let NodeKind::Return(Some(expr)) = &ast[stmts[0]].kind else {
            panic!("expected a return with a value");
        };
        assert!(matches!(ast[*expr].kind, NodeKind::Cast(_)));
    }

    #[test]
    fn parses_directives() {
        let (ast, file) = parse(
            "use \"other.q\";\ninclude \"runtime.js\";\nimport a.b as c;\nvoid f() {}",
        );
        let defs = definitions(&ast, file);
        assert!(matches!(ast[defs[0]].kind, NodeKind::Use(_)));
        assert!(matches!(ast[defs[1]].kind, NodeKind::Include(_)));
        match &ast[defs[2]].kind {
            NodeKind::Import(i) => {
                assert_eq!(i.alias.as_deref(), Some("c"));
                assert_eq!(i.path.len(), 2);
            }
            other => panic!("expected an import, got {:?}", other),
        }
    }

    #[test]
    fn parses_annotations() {
        let (ast, file) = parse("@delegate(helper, 1) void greet(int a);");
        let defs = definitions(&ast, file);
        let anns = &ast[defs[0]].annotations;
        assert_eq!(anns.len(), 1);
        match &ast[anns[0]].kind {
            NodeKind::Annotation(a) => {
                assert_eq!(a.name, "delegate");
                assert_eq!(a.arguments.len(), 2);
            }
            other => panic!("expected an annotation, got {:?}", other),
        }
    }

    #[test]
    fn parses_macros() {
        let (ast, file) = parse("macro void print(String msg);");
        let defs = definitions(&ast, file);
        match &ast[defs[0]].kind {
            NodeKind::Callable(c) => assert_eq!(c.kind, CallableKind::Macro),
            other => panic!("expected a macro, got {:?}", other),
        }
    }

    #[test]
    fn parses_map_literals_and_statics() {
        let (ast, file) = parse(
            "class C { static Map<String, int> table = {\"a\": 1}; }",
        );
        let defs = definitions(&ast, file);
        let NodeKind::Class(class) = &ast[defs[0]].kind else { panic!("expected a class") };
        match &ast[class.definitions[0]].kind {
            NodeKind::Declaration(d) => {
                assert_eq!(d.kind, DeclKind::Field);
                assert!(matches!(ast[d.value.unwrap()].kind, NodeKind::MapLit(_)));
            }
            other => panic!("expected a field, got {:?}", other),
        }
    }

    #[test]
    fn reports_errors_with_position() {
        let mut ast = Ast::new();
        let parser = Parser::new();
        let err = parser.parse(&mut ast, "bad.q", "class {").unwrap_err();
        assert_eq!(err.loc.line, 1);
        assert!(err.msg.contains("expected"), "got: {}", err.msg);
    }

    #[test]
    fn reparse_rules_cover_members() {
        let mut ast = Ast::new();
        let parser = Parser::new();
        let method = parser
            .rule(&mut ast, Rule::Method, "String _getClass() { return null; }")
            .expect("method fragment should parse");
        assert!(matches!(ast[method].kind, NodeKind::Callable(_)));
        let field = parser
            .rule(&mut ast, Rule::Field, "static reflect.Class x_ref = y.singleton;")
            .expect("field fragment should parse");
        assert!(matches!(ast[field].kind, NodeKind::Declaration(_)));
    }
}
