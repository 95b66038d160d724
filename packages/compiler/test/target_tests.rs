/**
 * Target Name Model Tests
 *
 * Per-backend identifier choice, keyword escaping, namespace grouping,
 * filenames and reference/import recording.
 */

#[cfg(test)]
mod tests {
    use quill_compiler::target::{
        DefInfo, DefKind, DefName, Go, Java, Python, Ruby, Target,
    };

    fn class(package: &str, path: &[&str]) -> DefInfo {
        DefInfo {
            name: DefName::new(package, path.iter().map(|s| s.to_string()).collect()),
            kind: DefKind::Class,
        }
    }

    fn function(package: &str, path: &[&str]) -> DefInfo {
        DefInfo {
            name: DefName::new(package, path.iter().map(|s| s.to_string()).collect()),
            kind: DefKind::Function,
        }
    }

    fn check(package: &str, path: &[&str]) -> DefInfo {
        DefInfo {
            name: DefName::new(package, path.iter().map(|s| s.to_string()).collect()),
            kind: DefKind::Check,
        }
    }

    #[test]
    fn java_places_classes_by_namespace_path() {
        let mut target = Target::new(Box::new(Java));
        let point = class("app", &["app", "Point"]);
        let tgt = target.define(&point);
        assert_eq!(tgt.target_name, "Point");
        let module = target.module(&point);
        assert_eq!(module.filename, "src/main/java/app/Point.java");
    }

    #[test]
    fn java_groups_functions_and_tests() {
        let mut target = Target::new(Box::new(Java));
        let run = function("app", &["app", "run"]);
        target.define(&run);
        assert_eq!(target.module(&run).filename, "src/main/java/app/Functions.java");

        let probe = check("app", &["app", "probe"]);
        target.define(&probe);
        assert_eq!(target.module(&probe).filename, "src/test/java/app/Tests.java");
    }

    #[test]
    fn java_escapes_keywords() {
        let mut target = Target::new(Box::new(Java));
        let bad = function("app", &["app", "class"]);
        let tgt = target.define(&bad);
        assert_eq!(tgt.target_name, "class_");
    }

    #[test]
    fn colliding_identifiers_stay_unique() {
        let mut target = Target::new(Box::new(Java));
        // Both land in app.Functions: "new" escapes to "new_", which then
        // collides with an explicit "new_".
        target.define(&function("app", &["app", "new_"]));
        let tgt = target.define(&function("app", &["app", "new"]));
        assert_eq!(tgt.target_name, "new__");
    }

    #[test]
    fn java_references_are_fully_qualified() {
        let mut target = Target::new(Box::new(Java));
        let point = class("app", &["app", "Point"]);
        let shape = class("app", &["app", "Shape"]);
        target.define(&point);
        target.define(&shape);
        target.reference(&point, &shape);
        assert_eq!(target.nameof_ref("app.Point", "app.Shape"), Some("app.Shape.Shape"));
        assert!(target.module(&point).imports.is_empty());
    }

    #[test]
    fn python_references_import_with_alias() {
        let mut target = Target::new(Box::new(Python));
        let point = class("app", &["app", "Point"]);
        let shape = class("app", &["app", "Shape"]);
        target.define(&point);
        target.define(&shape);
        target.reference(&point, &shape);
        assert_eq!(
            target.nameof_ref("app.Point", "app.Shape"),
            Some("app_Shape.Shape")
        );
        let module = target.module(&point);
        assert_eq!(module.imports, vec!["import app.Shape as app_Shape".to_string()]);
        assert_eq!(module.filename, "app/Point.py");
    }

    #[test]
    fn python_tests_move_to_a_test_module() {
        let mut target = Target::new(Box::new(Python));
        let probe = check("app", &["app", "probe"]);
        target.define(&probe);
        assert_eq!(target.module(&probe).filename, "app/test_app.py");
    }

    #[test]
    fn ruby_upcases_and_requires_relative() {
        let mut target = Target::new(Box::new(Ruby));
        let point = class("app", &["app", "point"]);
        let shape = class("app", &["app", "shape"]);
        let tgt = target.define(&point);
        assert_eq!(tgt.target_name, "Point");
        target.define(&shape);
        target.reference(&point, &shape);
        assert_eq!(target.nameof_ref("app.point", "app.shape"), Some("App::Shape"));
        let module = target.module(&point);
        assert_eq!(module.filename, "lib/app/App.rb");
        assert!(
            module.imports.iter().any(|i| i.starts_with("require_relative")),
            "got: {:?}",
            module.imports
        );
    }

    #[test]
    fn go_flattens_nested_namespaces() {
        let mut target = Target::new(Box::new(Go));
        let helper = class("demo", &["app", "util", "helper"]);
        let tgt = target.define(&helper);
        assert_eq!(tgt.target_name, "Util_helper");
        assert_eq!(target.module(&helper).filename, "demo/app/util_helper.go");
    }

    #[test]
    fn go_checks_get_a_test_suffix() {
        let mut target = Target::new(Box::new(Go));
        let probe = check("demo", &["app", "probe"]);
        target.define(&probe);
        assert_eq!(target.module(&probe).filename, "demo/app/probe_test.go");
    }

    #[test]
    fn foreign_invocations_become_void_functions() {
        let mut target = Target::new(Box::new(Java));
        let point = class("app", &["app", "Point"]);
        target.define(&point);
        let foreign = function("", &["runtime", "log"]);
        target.reference(&point, &foreign);
        assert!(target.nameof("runtime.log").is_some());
        assert_eq!(
            target.nameof_ref("app.Point", "runtime.log"),
            Some("runtime.Functions.log")
        );
    }

    #[test]
    fn emitted_files_accumulate() {
        let mut target = Target::new(Box::new(Java));
        target.file("a.java", "one\n");
        target.file("a.java", "two\n");
        assert_eq!(target.files.get("a.java").map(String::as_str), Some("one\ntwo\n"));
    }
}
