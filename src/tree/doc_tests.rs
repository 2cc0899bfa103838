//! WDL document and task tests modelled on miniwdl's test_1doc.py
//!
//! These exercise the full front end: dialect selection, the concrete grammar
//! and lowering into the document tree.

use crate::error::{SourcePosition, WdlError};
use crate::expr::{Expression, StringPart};
use crate::parser;
use crate::tree::*;
use crate::types::Type;
use pretty_assertions::assert_eq;

/// Parse a complete WDL document from source
fn parse_document_from_str(source: &str, version: Option<&str>) -> Result<Document, WdlError> {
    parser::parse_document(source, version, "test.wdl", "/work/test.wdl")
}

/// Parse a single task from source
fn parse_single_task(task_source: &str, version: &str) -> Result<Task, WdlError> {
    let mut tasks = parser::parse_tasks(task_source, Some(version))?;
    assert_eq!(tasks.len(), 1, "expected exactly one task");
    Ok(tasks.remove(0))
}

/// Literal text of a command, with placeholders rendered back to source form
fn command_text(task: &Task) -> String {
    task.command
        .parts
        .iter()
        .map(|part| match part {
            StringPart::Text(text) => text.clone(),
            StringPart::Placeholder(ph) => ph.to_string(),
        })
        .collect()
}

fn placeholders(task: &Task) -> Vec<String> {
    task.command
        .parts
        .iter()
        .filter_map(|part| match part {
            StringPart::Placeholder(ph) => Some(ph.expr.to_string()),
            StringPart::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod task_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hello_world() {
        let doc_source = r#"
version 1.0

task hello {
    command {
        echo "Hello, World!"
    }

    output {
        String message = read_string(stdout())
    }
}
"#;
        let doc = parse_document_from_str(doc_source, None).unwrap();
        assert_eq!(doc.wdl_version.as_deref(), Some("1.0"));
        assert_eq!(doc.tasks.len(), 1);

        let task = &doc.tasks[0];
        assert_eq!(task.name, "hello");
        assert_eq!(task.pos.line, 4);
        assert_eq!(task.pos.uri, "test.wdl");
        assert_eq!(task.pos.abspath, "/work/test.wdl");
        assert!(command_text(task).contains(r#"echo "Hello, World!""#));
        assert_eq!(task.outputs[0].name, "message");
        assert_eq!(task.outputs[0].decl_type, Type::string(false));
        assert!(task.inputs.is_empty());
        assert!(doc.workflow.is_none());
    }

    #[test]
    fn test_draft2_declarations() {
        // draft-2 has no input section; every declaration is a post-input
        let task = parse_single_task(
            r#"
task wc {
    String in
    Int? n
    Boolean flag = true
    command {
        echo "${in}" | wc -l ${n}
    }
    output {
        Int ans = read_int(stdout())
    }
}
"#,
            "draft-2",
        )
        .unwrap();

        assert!(task.inputs.is_empty());
        let names: Vec<&str> = task.postinputs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["in", "n", "flag"]);
        assert_eq!(task.postinputs[1].decl_type, Type::int(true));
        assert!(task.postinputs[0].expr.is_none());
        assert!(task.postinputs[2].expr.is_some());
        assert_eq!(placeholders(&task), vec!["in", "n"]);
    }

    #[test]
    fn test_command_placeholder_styles() {
        let source = r#"
task t {
    input {
        String who
        Array[String] xs
    }
    command <<<
        echo ${HOME} ~{who} ~{sep=" " xs}
    >>>
}
"#;
        let task = parse_single_task(source, "1.0").unwrap();
        // `${}` is plain text inside <<< >>>
        assert_eq!(placeholders(&task), vec!["who", "xs"]);
        assert!(command_text(&task).contains("echo ${HOME} "));

        let sep = task
            .command
            .parts
            .iter()
            .find_map(|part| match part {
                StringPart::Placeholder(ph) if !ph.options.is_empty() => Some(ph),
                _ => None,
            })
            .unwrap();
        assert_eq!(sep.options.get("sep").map(String::as_str), Some(" "));
    }

    #[test]
    fn test_runtime_and_meta() {
        let task = parse_single_task(
            r#"
task t {
    input {
        File reads
    }
    command {}
    runtime {
        docker: "ubuntu:20.04"
        memory: "4 GB"
        cpu: 2
    }
    meta {
        description: "counts things"
        version: 2
    }
    parameter_meta {
        reads: { help: "input reads", optional: false }
    }
}
"#,
            "1.0",
        )
        .unwrap();

        assert_eq!(task.runtime.len(), 3);
        assert!(matches!(task.runtime["cpu"], Expression::Int { value: 2, .. }));
        assert_eq!(task.meta["description"], "counts things");
        assert_eq!(task.meta["version"], 2);
        assert_eq!(
            task.parameter_meta["reads"],
            serde_json::json!({"help": "input reads", "optional": false})
        );
    }

    #[test]
    fn test_env_inputs_by_version() {
        let source = r#"
task t {
    input {
        env String TOKEN
        Int n = 1
    }
    command <<< echo "$TOKEN" >>>
}
"#;
        let task = parse_single_task(source, "1.2").unwrap();
        assert!(task.inputs[0].is_env());
        assert!(!task.inputs[1].is_env());

        // before 1.2 `env` is just an (unknown) struct type name
        assert!(parse_single_task(source, "1.1").is_err());
    }

    #[test]
    fn test_task_keyword_names() {
        let err = parse_single_task("task t { Int scatter = 1\ncommand {} }", "1.0").unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.message(), "unexpected keyword scatter");
        assert_eq!(err.wdl_version(), Some("1.0"));
    }

    #[test]
    fn test_task_without_command() {
        let err = parse_single_task("task t { Int x = 1 }", "1.0").unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert!(err.message().starts_with("expected command"));
        assert_eq!(err.pos().uri, "(buffer)");
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_document() {
        for source in ["", "   \n\t\n"] {
            let doc = parse_document_from_str(source, None).unwrap();
            assert_eq!(doc.source_text, source);
            assert_eq!(doc.pos, SourcePosition::zero("test.wdl", "/work/test.wdl"));
            assert!(doc.tasks.is_empty() && doc.imports.is_empty());
            assert!(doc.workflow.is_none());
            assert!(doc.comments.is_empty());
            assert_eq!(doc.wdl_version, None);
        }
    }

    #[test]
    fn test_draft2_default() {
        let doc = parse_document_from_str("task t { command { ls } }", None).unwrap();
        assert_eq!(doc.wdl_version, None);
        assert_eq!(doc.tasks[0].name, "t");

        // `version` isn't a statement in draft-2
        let err = parse_document_from_str("version 1.0\ntask t { command {} }", Some("draft-2"))
            .unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.wdl_version(), Some("draft-2"));
        assert_eq!(err.declared_wdl_version(), Some("1.0"));
    }

    #[test]
    fn test_explicit_version_override() {
        let source = "version 1.0\nworkflow w { String s = <<<hi>>> }";
        assert!(parse_document_from_str(source, None).is_err());

        let doc = parse_document_from_str(source, Some("development")).unwrap();
        // the declared version is still reported
        assert_eq!(doc.wdl_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_unknown_version() {
        let err = parse_document_from_str("version 3.0\nworkflow w {}", None).unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(
            err.message(),
            "unknown WDL version 3.0; choices: draft-2, 1.0, 1.1, 1.2, development"
        );
        assert_eq!(err.pos(), &SourcePosition::zero("test.wdl", "/work/test.wdl"));
        assert_eq!(err.declared_wdl_version(), Some("3.0"));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parser::parse_document("version 1.0\ntask t {\n  command {}\n  ???\n}", None, "", "")
            .unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.pos().uri, "(buffer)");
        assert_eq!(err.pos().abspath, "(buffer)");
        assert_eq!((err.pos().line, err.pos().column), (4, 3));
        assert!(err.message().contains("line 4, column 3"));
    }

    #[test]
    fn test_bad_escape_in_document() {
        let err = parse_document_from_str(
            "version 1.0\nworkflow w {\n  String s = \"a\\qb\"\n}",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.message(), "Bad escape sequence in string literal");
        assert_eq!((err.pos().line, err.pos().column), (3, 14));
        assert_eq!(err.wdl_version(), Some("1.0"));
    }

    #[test]
    fn test_structs() {
        let doc = parse_document_from_str(
            r#"
version 1.1

struct Sample {
    String name
    Array[File]+ reads
    Map[String, Int]? counts
}

workflow w {
    Sample s = Sample { name: "a", reads: ["r1.fq"], counts: None }
}
"#,
            None,
        )
        .unwrap();

        let sample = &doc.struct_typedefs["Sample"];
        let members: Vec<(&str, String)> = sample
            .members
            .iter()
            .map(|(name, ty)| (name.as_str(), ty.to_string()))
            .collect();
        assert_eq!(
            members,
            vec![
                ("name", "String".to_string()),
                ("reads", "Array[File]+".to_string()),
                ("counts", "Map[String,Int]?".to_string()),
            ]
        );

        let workflow = doc.workflow.unwrap();
        match &workflow.body[0] {
            WorkflowElement::Declaration(decl) => {
                assert_eq!(
                    decl.decl_type,
                    Type::struct_instance("Sample".to_string(), false)
                );
                assert!(matches!(
                    decl.expr,
                    Some(Expression::Struct { ref type_name, .. }) if type_name.as_deref() == Some("Sample")
                ));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_member_with_initializer() {
        let err = parse_document_from_str("version 1.0\nstruct S { Int a = 1 }", None).unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }));
    }

    #[test]
    fn test_import_with_loaded_document() {
        let main = parse_document_from_str(
            "version 1.0\nimport \"lib/tools.wdl\"\nworkflow w { call tools.count }",
            None,
        )
        .unwrap();
        let import = &main.imports[0];
        assert_eq!(import.namespace, "tools");
        assert!(import.doc.is_none());

        let lib = parser::parse_document(
            "version 1.0\ntask count { command { wc -l } }",
            None,
            &import.uri,
            "/work/lib/tools.wdl",
        )
        .unwrap();
        let loaded = import.clone().with_document(Box::new(lib));
        let doc = loaded.doc.as_deref().unwrap();
        assert_eq!(doc.task("count").map(|t| t.pos.uri.as_str()), Some("lib/tools.wdl"));
        assert_eq!(loaded.namespace, "tools");
        assert_eq!(loaded.pos, import.pos);
    }

    #[test]
    fn test_comments() {
        let source = "# top\nversion 1.0\n\ntask t { # inside\n  command {} # after\n}\n";
        let doc = parse_document_from_str(source, None).unwrap();
        let comments: Vec<(&str, u32, u32)> = doc
            .comments
            .iter()
            .map(|c| (c.text.as_str(), c.pos.line, c.pos.column))
            .collect();
        assert_eq!(
            comments,
            vec![("# top", 1, 1), ("# inside", 4, 10), ("# after", 5, 14)]
        );
        assert_eq!(doc.comments[0].pos.end_column, 6);
    }
}
