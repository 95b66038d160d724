/**
 * Symbol Tests
 *
 * Definition and name-lookup coverage: duplicate detection, forward
 * declarations, package re-opening, imports and aliases.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::ast::walk::traverse;
    use quill_compiler::ast::NodeKind;
    use quill_compiler::definer::Definer;
    use quill_compiler::lookup::UsePass;
    use quill_compiler::{Compiler, MemoryReader};

    fn parse_one(name: &str, source: &str) -> Compiler {
        let mut reader = MemoryReader::new();
        reader.insert(name, source);
        let mut compiler = Compiler::with_reader(Box::new(reader));
        compiler.url_parse(name, 0).expect("source should parse");
        compiler
    }

    fn duplicates(compiler: &mut Compiler) -> Vec<String> {
        let root = compiler.ast.root;
        let mut definer = Definer::new();
        traverse(&mut compiler.ast, root, &mut definer);
        definer
            .duplicates
            .iter()
            .map(|(node, _, _)| compiler.ast[*node].id.clone())
            .collect()
    }

    fn unresolved(compiler: &mut Compiler) -> Vec<String> {
        let root = compiler.ast.root;
        let mut definer = Definer::new();
        traverse(&mut compiler.ast, root, &mut definer);
        let mut use_pass = UsePass::new();
        traverse(&mut compiler.ast, root, &mut use_pass);
        use_pass.unresolved.iter().map(|(_, name)| name.clone()).collect()
    }

    #[test]
    fn duplicate_functions_at_top_level() {
        let mut compiler = parse_one("asdf", "void foo(){} void foo(){}");
        assert_eq!(duplicates(&mut compiler), vec!["asdf.foo".to_string()]);
    }

    #[test]
    fn forward_declaration_is_not_a_duplicate() {
        let mut compiler = parse_one("t", "void m(); void m() { }");
        assert!(duplicates(&mut compiler).is_empty());
    }

    #[test]
    fn two_bodies_are_a_duplicate() {
        let mut compiler = parse_one("t", "void m() { } void m() { }");
        assert_eq!(duplicates(&mut compiler), vec!["t.m".to_string()]);
    }

    #[test]
    fn function_colliding_with_class_is_a_duplicate() {
        let mut compiler = parse_one("t", "class m {} void m();");
        assert_eq!(duplicates(&mut compiler), vec!["t.m".to_string()]);
    }

    #[test]
    fn unresolved_variable_is_recorded() {
        let mut compiler = parse_one("t", "void foo(){ bar; }");
        assert_eq!(unresolved(&mut compiler), vec!["bar".to_string()]);
    }

    #[test]
    fn reopened_package_shares_one_environment() {
        let mut compiler =
            parse_one("t", "package a { void f(){} } package a { void g(){} }");
        let root = compiler.ast.root;
        let mut definer = Definer::new();
        traverse(&mut compiler.ast, root, &mut definer);
        assert!(definer.duplicates.is_empty());

        let ast = &compiler.ast;
        let pkg = *ast.env(ast.root_env()).get("a").expect("package a is canonical");
        let env = ast.env(ast[pkg].env);
        assert!(env.contains_key("f"));
        assert!(env.contains_key("g"));
    }

    #[test]
    fn literals_resolve_against_builtin() {
        let mut compiler = parse_one(
            "t",
            "void f() { int a = 1; float b = 1.5; String c = \"x\"; bool d = true; }",
        );
        assert!(unresolved(&mut compiler).is_empty());
    }

    #[test]
    fn import_alias_resolves_types() {
        let mut compiler =
            parse_one("t", "import builtin.List as L; void f() { L<int> xs = []; }");
        assert!(unresolved(&mut compiler).is_empty());
    }

    #[test]
    fn variable_uses_link_to_their_declaration() {
        let mut compiler = parse_one("t", "void f(int width) { width; }");
        assert!(unresolved(&mut compiler).is_empty());
        let ast = &compiler.ast;
        let mut stack = vec![ast.root];
        let mut linked = false;
        while let Some(id) = stack.pop() {
            if let NodeKind::Var(v) = &ast[id].kind {
                if v.name.text == "width" {
                    let definition =
                        ast[id].definition.expect("the use should be linked");
                    assert_eq!(ast.name_of(definition), Some("width"));
                    linked = true;
                }
            }
            stack.extend(ast.children(id));
        }
        assert!(linked, "expected the body to contain the variable use");
    }

    #[test]
    fn ids_are_prefix_stable_under_their_parent() {
        let compiler = parse_one(
            "t",
            "package a { class C<T> { int x; int get(int i) { return self.x; } } }",
        );
        let ast = &compiler.ast;
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            if let Some(parent) = ast[id].parent {
                let parent_id = &ast[parent].id;
                assert!(
                    ast[id].id.starts_with(parent_id.as_str()),
                    "{} should extend {}",
                    ast[id].id,
                    parent_id
                );
            }
            stack.extend(ast.children(id));
        }
    }

    #[test]
    fn compile_reports_duplicates_as_errors() {
        let mut compiler = parse_one("asdf", "void foo(){} void foo(){}");
        let err = compiler.compile().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate definition of foo"), "got: {}", message);
        assert!(message.contains("asdf:1:"), "got: {}", message);
    }

    #[test]
    fn compile_reports_unresolved_as_errors() {
        let mut compiler = parse_one("t", "void foo(){ bar; }");
        let err = compiler.compile().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unresolved variable: bar"), "got: {}", message);
    }
}
