/**
 * Compiler Driver Tests
 *
 * End-to-end pipeline scenarios: dependency directives, includes,
 * error aggregation and backend emission.
 */

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use quill_compiler::ast::{Ast, NodeKind};
    use quill_compiler::{Backend, Compiler, Error, MemoryReader, BUILTIN};

    fn compiler_with(sources: &[(&str, &str)]) -> Compiler {
        let mut reader = MemoryReader::new();
        for (name, text) in sources {
            reader.insert(*name, *text);
        }
        Compiler::with_reader(Box::new(reader))
    }

    #[test]
    fn uses_pull_in_dependencies_transitively() {
        let mut compiler = compiler_with(&[
            ("main.q", "use \"lib.q\"; void main() { helpfn(); }"),
            ("lib.q", "use \"base.q\"; void helpfn() { basefn(); }"),
            ("base.q", "void basefn() { }"),
        ]);
        compiler.url_parse("main.q", 0).expect("main should parse");
        compiler.compile().expect("the program should compile");
        assert_eq!(
            compiler.dependencies,
            vec![BUILTIN.to_string(), "lib.q".to_string(), "base.q".to_string()]
        );
    }

    #[test]
    fn used_files_carry_their_depth() {
        let mut compiler = compiler_with(&[
            ("main.q", "use \"lib.q\"; void main() { }"),
            ("lib.q", "void helpfn() { }"),
        ]);
        compiler.url_parse("main.q", 0).expect("main should parse");
        let ast = &compiler.ast;
        let mut depths = IndexMap::new();
        for file in &ast.root_node().files {
            if let NodeKind::File(f) = &ast[*file].kind {
                depths.insert(f.name.clone(), f.depth);
            }
        }
        assert_eq!(depths.get("main.q"), Some(&0));
        assert_eq!(depths.get("lib.q"), Some(&1));
        assert_eq!(depths.get(BUILTIN), Some(&1));
    }

    #[test]
    fn cyclic_uses_terminate() {
        let mut compiler = compiler_with(&[
            ("a.q", "use \"b.q\"; void fa() { }"),
            ("b.q", "use \"a.q\"; void fb() { }"),
        ]);
        compiler.url_parse("a.q", 0).expect("the cycle should parse");
        compiler.compile().expect("the cycle should compile");
    }

    #[test]
    fn quill_includes_compile_at_the_same_depth() {
        let mut compiler = compiler_with(&[
            ("main.q", "include \"extra.q\"; void main() { extrafn(); }"),
            ("extra.q", "void extrafn() { }"),
        ]);
        compiler.url_parse("main.q", 0).expect("main should parse");
        compiler.compile().expect("the include should compile");
        let ast = &compiler.ast;
        for file in &ast.root_node().files {
            if let NodeKind::File(f) = &ast[*file].kind {
                if f.name == "extra.q" {
                    assert_eq!(f.depth, 0);
                }
            }
        }
    }

    #[test]
    fn native_includes_are_stored_verbatim() {
        let mut compiler = compiler_with(&[
            ("main.q", "include \"runtime.js\"; void main() { }"),
            ("runtime.js", "console.log('hi');\n"),
        ]);
        compiler.url_parse("main.q", 0).expect("main should parse");
        let included = &compiler.ast.root_node().included;
        assert_eq!(
            included.get("runtime.js").map(String::as_str),
            Some("console.log('hi');\n")
        );
    }

    #[test]
    fn parse_errors_carry_position() {
        let mut compiler = compiler_with(&[("bad.q", "class {")]);
        let err = compiler.url_parse("bad.q", 0).unwrap_err();
        match err {
            Error::Parse(message) => {
                assert!(message.starts_with("bad.q:1:"), "got: {}", message)
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_top_level_source_is_an_io_error() {
        let mut compiler = compiler_with(&[]);
        let err = compiler.url_parse("absent.q", 0).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "got: {:?}", err);
    }

    #[test]
    fn missing_use_reports_the_directive() {
        let mut compiler =
            compiler_with(&[("main.q", "use \"absent.q\"; void main() { }")]);
        let err = compiler.url_parse("main.q", 0).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("error reading file: absent.q"), "got: {}", message);
    }

    #[test]
    fn relative_uses_resolve_against_the_referrer() {
        let mut compiler = compiler_with(&[
            ("src/main.q", "use \"util.q\"; void main() { utilfn(); }"),
            ("src/util.q", "void utilfn() { }"),
        ]);
        compiler.url_parse("src/main.q", 0).expect("main should parse");
        compiler.compile().expect("the program should compile");
        assert!(compiler.dependencies.contains(&"src/util.q".to_string()));
    }

    struct ListingBackend;

    impl Backend for ListingBackend {
        fn name(&self) -> &'static str {
            "listing"
        }

        fn emit(&mut self, ast: &Ast) -> IndexMap<String, String> {
            let mut listing = String::new();
            for file in &ast.root_node().files {
                if let NodeKind::File(f) = &ast[*file].kind {
                    listing.push_str(&format!("{} depth={}\n", f.name, f.depth));
                }
            }
            let mut files = IndexMap::new();
            files.insert("listing.txt".to_string(), listing);
            files
        }
    }

    #[test]
    fn registered_backends_receive_the_compiled_root() {
        let mut compiler = compiler_with(&[("main.q", "void main() { }")]);
        compiler.emitter(Box::new(ListingBackend), "out");
        compiler.url_parse("main.q", 0).expect("main should parse");
        let outputs = compiler.compile().expect("the program should compile");
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].backend, "listing");
        assert_eq!(outputs[0].target, "out");
        let listing = outputs[0].files.get("listing.txt").expect("one emitted file");
        assert!(listing.contains("main.q depth=0"), "got: {}", listing);
    }
}
