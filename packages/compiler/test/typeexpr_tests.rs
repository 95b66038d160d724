/**
 * Type Expression Tests
 *
 * Parametric instantiation, assignability, invocation checking and the
 * user-defined coercion discipline.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::ast::{Ast, NodeId, NodeKind};
    use quill_compiler::typeexpr::texpr;
    use quill_compiler::{Compiler, MemoryReader};

    fn parse_one(name: &str, source: &str) -> Compiler {
        let mut reader = MemoryReader::new();
        reader.insert(name, source);
        let mut compiler = Compiler::with_reader(Box::new(reader));
        compiler.url_parse(name, 0).expect("source should parse");
        compiler
    }

    fn compile_one(source: &str) -> Compiler {
        let mut compiler = parse_one("t", source);
        compiler.compile().expect("source should compile cleanly");
        compiler
    }

    fn compile_err(source: &str) -> String {
        let mut compiler = parse_one("t", source);
        compiler.compile().unwrap_err().to_string()
    }

    fn find<F: Fn(&Ast, NodeId) -> bool>(ast: &Ast, pred: F) -> Option<NodeId> {
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            if pred(ast, id) {
                return Some(id);
            }
            stack.extend(ast.children(id));
        }
        None
    }

    fn find_decl(ast: &Ast, name: &str) -> NodeId {
        find(ast, |ast, id| {
            matches!(&ast[id].kind, NodeKind::Declaration(d) if d.name == name)
        })
        .expect("declaration should exist")
    }

    fn find_class(ast: &Ast, name: &str) -> NodeId {
        find(ast, |ast, id| {
            matches!(&ast[id].kind, NodeKind::Class(c) if c.name == name)
        })
        .expect("class should exist")
    }

    #[test]
    fn generic_instantiation_specializes() {
        let compiler = compile_one("void f() { List<int> xs = [1, 2, 3]; }");
        let ast = &compiler.ast;
        let xs = find_decl(ast, "xs");
        let resolved = ast[xs].resolved.as_ref().expect("xs should be typed");
        assert_eq!(resolved.id(ast), "builtin.List<builtin.int>");
    }

    #[test]
    fn element_access_resolves_through_bindings() {
        let compiler =
            compile_one("void f() { List<int> xs = []; int y = xs.get(0); }");
        let ast = &compiler.ast;
        let get_call = find(ast, |ast, id| match &ast[id].kind {
            NodeKind::Call(c) => {
                matches!(&ast[c.expr].kind, NodeKind::Attr(a) if a.attr.text == "get")
            }
            _ => false,
        })
        .expect("the get call should exist");
        let resolved = ast[get_call].resolved.as_ref().expect("call should be typed");
        assert_eq!(resolved.id(ast), "builtin.int");
    }

    #[test]
    fn coercion_method_is_stamped() {
        let compiler = compile_one(
            "class A {}
             class B { A __to_A() { return new A(); } }
             void f() { A a = new B(); }",
        );
        let ast = &compiler.ast;
        let a = find_decl(ast, "a");
        let value = match &ast[a].kind {
            NodeKind::Declaration(d) => d.value.expect("a has an initializer"),
            _ => unreachable!(),
        };
        let coercion = ast[value].coercion.expect("the initializer should coerce");
        assert_eq!(ast.name_of(coercion), Some("__to_A"));
    }

    #[test]
    fn null_is_assignable_to_reference_types() {
        compile_one("void f() { String s = null; }");
    }

    #[test]
    fn empty_literals_narrow_to_the_declared_type() {
        let compiler = compile_one(
            "void f() { List<String> xs = []; Map<String, int> m = {}; }",
        );
        let ast = &compiler.ast;
        let xs = find_decl(ast, "xs");
        let value = match &ast[xs].kind {
            NodeKind::Declaration(d) => d.value.expect("xs has an initializer"),
            _ => unreachable!(),
        };
        let resolved = ast[value].resolved.as_ref().expect("literal should be typed");
        assert_eq!(resolved.id(ast), "builtin.List<builtin.String>");
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let message = compile_err("void f(int x) {} void g() { f(); }");
        assert!(message.contains("expected 1 args, got 0"), "got: {}", message);
    }

    #[test]
    fn assignment_mismatch_is_an_error() {
        let message = compile_err("void f() { int x = \"hi\"; }");
        assert!(
            message.contains("type mismatch: expected builtin.int, got builtin.String"),
            "got: {}",
            message
        );
    }

    #[test]
    fn constructor_arguments_are_checked() {
        let message =
            compile_err("class P { P(int x) {} } void f() { P p = new P(\"s\"); }");
        assert!(message.contains("type mismatch"), "got: {}", message);
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let message =
            compile_err("class A {} void f() { A a = new A(); a.nope; }");
        assert!(message.contains("has no such attribute: nope"), "got: {}", message);
    }

    #[test]
    fn return_in_non_void_requires_a_value() {
        let message = compile_err("int f() { return; }");
        assert!(message.contains("is not declared void"), "got: {}", message);
    }

    #[test]
    fn return_with_value_in_void_is_an_error() {
        let message = compile_err("void f() { return 1; }");
        assert!(message.contains("cannot return a value"), "got: {}", message);
    }

    #[test]
    fn assignability_is_reflexive_and_transitive() {
        let compiler = compile_one(
            "class A {} class B extends A {} class C extends B {} void f() {}",
        );
        let ast = &compiler.ast;
        let a = ast[find_class(ast, "A")].resolved.clone().expect("A is typed");
        let c = ast[find_class(ast, "C")].resolved.clone().expect("C is typed");
        assert!(a.assignable_from(ast, &a));
        assert!(a.assignable_from(ast, &c));
        assert!(!c.assignable_from(ast, &a));
    }

    #[test]
    fn texpr_is_idempotent() {
        let compiler = compile_one("void f() { List<int> xs = []; }");
        let ast = &compiler.ast;
        let xs = find_decl(ast, "xs");
        let once = ast[xs].resolved.clone().expect("xs should be typed");
        let twice = texpr(once.definition, &[&once.bindings]);
        assert_eq!(once.id(ast), twice.id(ast));
    }
}
