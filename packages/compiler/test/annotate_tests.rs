/**
 * Annotation Rewriter Tests
 *
 * Handler registration, the built-in delegate handler, trace chains and
 * fixed-point termination.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::annotate::Rewrite;
    use quill_compiler::ast::printer::code;
    use quill_compiler::ast::{Ast, NodeId, NodeKind};
    use quill_compiler::{Compiler, MemoryReader};

    fn parse_one(source: &str) -> Compiler {
        let mut reader = MemoryReader::new();
        reader.insert("t", source);
        let mut compiler = Compiler::with_reader(Box::new(reader));
        compiler.url_parse("t", 0).expect("source should parse");
        compiler
    }

    fn find_callable(ast: &Ast, name: &str) -> NodeId {
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            if matches!(&ast[id].kind, NodeKind::Callable(c) if c.name == name) {
                return id;
            }
            stack.extend(ast.children(id));
        }
        panic!("callable {} should exist", name);
    }

    #[test]
    fn delegate_rewrites_a_bodyless_function() {
        let mut compiler = parse_one(
            "void helper(String name, List<Object> args, List<Object> options) {}
             @delegate(helper) void greet(int a, int b);",
        );
        compiler.compile().expect("the rewritten stub should compile");
        let ast = &compiler.ast;
        let greet = find_callable(ast, "greet");
        match &ast[greet].kind {
            NodeKind::Callable(c) => assert!(c.body.is_some(), "the stub needs a body"),
            _ => unreachable!(),
        }
        assert!(
            ast[greet].annotations.is_empty(),
            "the delegate annotation is consumed by the rewrite"
        );
        let body = code(ast, greet);
        assert!(body.contains("helper(\"greet\", [a, b], [])"), "got: {}", body);
    }

    #[test]
    fn delegate_casts_non_void_results() {
        let mut compiler = parse_one(
            "Object helper(String name, List<Object> args, List<Object> options) {
                 return null;
             }
             @delegate(helper) int compute(int a, int b);",
        );
        compiler.compile().expect("the rewritten stub should compile");
        let ast = &compiler.ast;
        let body = code(ast, find_callable(ast, "compute"));
        assert!(body.contains("return ?("), "got: {}", body);
    }

    #[test]
    fn delegate_passes_annotation_options() {
        let mut compiler = parse_one(
            "void helper(String name, List<Object> args, List<Object> options) {}
             @delegate(helper, 1, 2) void greet(int a, int b);",
        );
        compiler.compile().expect("the rewritten stub should compile");
        let ast = &compiler.ast;
        let body = code(ast, find_callable(ast, "greet"));
        assert!(body.contains("[1, 2]"), "got: {}", body);
    }

    #[test]
    fn replacements_carry_a_trace_chain() {
        let mut compiler = parse_one(
            "void helper(String name, List<Object> args, List<Object> options) {}
             @delegate(helper) void greet(int a, int b);",
        );
        compiler.compile().expect("the rewritten stub should compile");
        let ast = &compiler.ast;
        let greet = find_callable(ast, "greet");
        let trace = ast[greet].trace.clone().expect("the replacement is traced");
        assert_eq!(trace.annotator, "delegate");
        assert!(trace.text.contains("helper"), "got: {}", trace.text);
    }

    #[test]
    fn custom_annotators_fire_by_name() {
        fn stub(ast: &Ast, node: NodeId) -> Option<Rewrite> {
            let NodeKind::Callable(c) = &ast[node].kind else { return None };
            if c.body.is_some() {
                return None;
            }
            let ty = c.ty.map(|t| code(ast, t))?;
            Some(Rewrite::Source(format!("{} {}() {{ }}", ty, c.name)))
        }

        let mut reader = MemoryReader::new();
        reader.insert("t", "@stub void s();");
        let mut compiler = Compiler::with_reader(Box::new(reader));
        compiler.annotator("stub", stub);
        compiler.url_parse("t", 0).expect("source should parse");
        compiler.compile().expect("the stubbed function should compile");
        let ast = &compiler.ast;
        let s = find_callable(ast, "s");
        match &ast[s].kind {
            NodeKind::Callable(c) => assert!(c.body.is_some()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn diagnostics_point_through_generated_code() {
        let mut compiler = parse_one("@delegate(missing) void greet(int a, int b);");
        let err = compiler.compile().unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("unresolved variable: missing"),
            "got: {}",
            message
        );
        assert!(message.contains("delegate:"), "got: {}", message);
        assert!(message.contains("<generated>"), "got: {}", message);
    }

    #[test]
    fn unregistered_annotations_are_inert() {
        let mut compiler = parse_one("@nothing void f() { }");
        compiler.compile().expect("unknown annotations are left in place");
        let ast = &compiler.ast;
        let f = find_callable(ast, "f");
        assert_eq!(ast[f].annotations.len(), 1);
        assert!(ast[f].trace.is_none());
    }
}
