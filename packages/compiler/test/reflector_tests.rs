/**
 * Reflector Tests
 *
 * Metadata synthesis: accessor grafting, per-class metadata classes,
 * the singleton registry package, and instantiation variants.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::ast::{Ast, CallableKind, NodeId, NodeKind};
    use quill_compiler::{Compiler, MemoryReader};

    fn compile_one(source: &str) -> Compiler {
        let mut reader = MemoryReader::new();
        reader.insert("app.q", source);
        let mut compiler = Compiler::with_reader(Box::new(reader));
        compiler.url_parse("app.q", 0).expect("source should parse");
        compiler.compile().expect("source should compile cleanly");
        compiler
    }

    fn find_class(ast: &Ast, name: &str) -> NodeId {
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            if matches!(&ast[id].kind, NodeKind::Class(c) if c.name == name) {
                return id;
            }
            stack.extend(ast.children(id));
        }
        panic!("class {} should exist", name);
    }

    fn member_names(ast: &Ast, class: NodeId) -> Vec<String> {
        match &ast[class].kind {
            NodeKind::Class(c) => c
                .definitions
                .iter()
                .filter_map(|d| ast.name_of(*d).map(str::to_string))
                .collect(),
            _ => panic!("expected a class"),
        }
    }

    const POINT: &str = "package app {
        class Point {
            int x;
            int y;
            Point(int x, int y) { self.x = x; self.y = y; }
            int getx() { return self.x; }
        }
    }";

    #[test]
    fn accessors_are_grafted_onto_concrete_classes() {
        let compiler = compile_one(POINT);
        let ast = &compiler.ast;
        let point = find_class(ast, "Point");
        let members = member_names(ast, point);
        assert!(members.contains(&"_getClass".to_string()), "got: {:?}", members);
        assert!(members.contains(&"_getField".to_string()), "got: {:?}", members);
        assert!(members.contains(&"_setField".to_string()), "got: {:?}", members);
    }

    #[test]
    fn metadata_singleton_package_is_compiled_in() {
        let compiler = compile_one(POINT);
        let ast = &compiler.ast;
        // The registry package is named after the entry's first package.
        let md_pkg = *ast
            .env(ast.root_env())
            .get("app_md")
            .expect("the metadata package should exist");
        let env = ast.env(ast[md_pkg].env);
        assert!(env.contains_key("Root"), "the registry class should exist");
        assert!(env.contains_key("app_Point"), "the metadata class should exist");
    }

    #[test]
    fn metadata_reference_field_is_grafted() {
        let compiler = compile_one(POINT);
        let ast = &compiler.ast;
        let point = find_class(ast, "Point");
        let members = member_names(ast, point);
        assert!(
            members.contains(&"app_Point_ref".to_string()),
            "got: {:?}",
            members
        );
    }

    #[test]
    fn method_descriptor_classes_are_synthesized() {
        let compiler = compile_one(POINT);
        let ast = &compiler.ast;
        let descriptor = find_class(ast, "app_Point_getx_Method");
        // Descriptors carry an invoke method dispatching to the original.
        let has_invoke = match &ast[descriptor].kind {
            NodeKind::Class(c) => c.definitions.iter().any(|d| {
                matches!(&ast[*d].kind,
                    NodeKind::Callable(m)
                        if m.kind == CallableKind::Method && m.name == "invoke")
            }),
            _ => false,
        };
        assert!(has_invoke);
    }

    #[test]
    fn interfaces_and_primitives_get_no_accessors() {
        let compiler = compile_one(
            "package app {
                interface Shape { int area(); }
                class Square extends Shape { int area() { return 1; } }
            }",
        );
        let ast = &compiler.ast;
        let shape = find_class(ast, "Shape");
        let members = member_names(ast, shape);
        assert!(
            !members.contains(&"_getField".to_string()),
            "interfaces stay abstract: {:?}",
            members
        );
        let square = find_class(ast, "Square");
        assert!(member_names(ast, square).contains(&"_getField".to_string()));
    }

    #[test]
    fn unpackaged_classes_get_accessors_but_no_metadata() {
        let compiler = compile_one("class Free { int x; } void main() { }");
        let ast = &compiler.ast;
        let free = find_class(ast, "Free");
        let members = member_names(ast, free);
        assert!(members.contains(&"_getField".to_string()));
        assert!(!members.iter().any(|m| m.ends_with("_ref")), "got: {:?}", members);
    }

    #[test]
    fn reflection_survives_a_second_compile_pass() {
        // The generated source re-enters the same pipeline; everything it
        // produces must satisfy the same invariants.
        let compiler = compile_one(POINT);
        let ast = &compiler.ast;
        let root_class = find_class(ast, "Root");
        let members = member_names(ast, root_class);
        assert!(
            members.contains(&"app_Point_md".to_string()),
            "got: {:?}",
            members
        );
    }
}
