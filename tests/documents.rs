use flowy_parse::{
    parse_document, parse_expression, Document, Expression, StringPart, WdlError, WorkflowElement,
};
use pretty_assertions::assert_eq;

const PIPELINE: &str = r#"version 1.1

import "dir/sub/pipeline.wdl?rev=2"
import "https://example.org/lib/util.wdl" as u alias Sample as LibSample

# per-sample settings
struct Settings {
    String label
    Int? threads
}

task align {
    input {
        File reads
        Settings settings
    }
    command <<<
        aligner --threads ~{default=1 settings.threads} ~{reads} > out.bam
    >>>
    output {
        File bam = "out.bam"
    }
    runtime {
        docker: "aligner:2.1"
    }
}

workflow main {
    input {
        Array[File] samples
    }
    scatter (s in samples) {
        call align { input: reads = s, settings = Settings { label: "x", threads: 4 } }
    }
    call u.summarize as summary after align { input: bams = align.bam }
    output {
        Array[File] bams = align.bam
    }
}
"#;

fn parse(source: &str) -> Result<Document, WdlError> {
    parse_document(source, None, "main.wdl", "/data/main.wdl")
}

#[test]
fn full_pipeline_document() {
    let doc = parse(PIPELINE).unwrap();
    assert_eq!(doc.wdl_version.as_deref(), Some("1.1"));
    assert_eq!(doc.source_text, PIPELINE);

    let imports: Vec<(&str, &str)> = doc
        .imports
        .iter()
        .map(|i| (i.uri.as_str(), i.namespace.as_str()))
        .collect();
    assert_eq!(
        imports,
        vec![
            ("dir/sub/pipeline.wdl?rev=2", "pipeline"),
            ("https://example.org/lib/util.wdl", "u"),
        ]
    );
    assert_eq!(
        doc.imports[1].aliases,
        vec![("Sample".to_string(), "LibSample".to_string())]
    );
    assert!(doc.imports.iter().all(|i| i.doc.is_none()));

    assert!(doc.struct_typedefs.contains_key("Settings"));
    let align = doc.task("align").unwrap();
    assert_eq!(align.inputs.len(), 2);
    assert_eq!(align.runtime["docker"].to_string(), "\"aligner:2.1\"");

    let workflow = doc.workflow.as_ref().unwrap();
    assert_eq!(workflow.name, "main");
    assert_eq!(workflow.body.len(), 2);
    match &workflow.body[1] {
        WorkflowElement::Call(call) => {
            assert_eq!(call.callee, vec!["u", "summarize"]);
            assert_eq!(call.name(), "summary");
            assert_eq!(call.afters, vec!["align"]);
        }
        other => panic!("Expected call, got {:?}", other),
    }

    let comments: Vec<&str> = doc.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(comments, vec!["# per-sample settings"]);
    assert_eq!(doc.comments[0].pos.line, 6);
    assert_eq!(doc.comments[0].pos.uri, "main.wdl");
}

#[test]
fn import_namespace_must_be_a_name() {
    for uri in ["1abc.wdl", "scatter.wdl", "my-lib.wdl"] {
        let source = format!("version 1.0\nimport \"{}\"\n", uri);
        let err = parse(&source).unwrap_err();
        assert!(matches!(err, WdlError::Syntax { .. }), "{}", uri);
        assert!(err.message().starts_with("declare an import namespace"));
        assert_eq!(err.pos().line, 2);
    }
    let doc = parse("version 1.0\nimport \"1abc.wdl\" as ok\n").unwrap();
    assert_eq!(doc.imports[0].namespace, "ok");
}

#[test]
fn parsing_is_deterministic() {
    let first = parse(PIPELINE).unwrap();
    let second = parse(PIPELINE).unwrap();
    assert_eq!(first, second);

    let json = serde_json::to_string(&first).unwrap();
    let restored: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, first);
}

#[test]
fn string_literal_text_is_kept_verbatim() {
    for source in [
        r#""tab\there""#,
        r#"'it\'s ~{name}'"#,
        r#""é\x41\101 and \\""#,
        r#""~{xs} $HOME""#,
    ] {
        let expr = parse_expression(source, Some("1.1")).unwrap();
        assert_eq!(expr.to_string(), source);
    }

    let expr = parse_expression(r#""a\nb ~{x} c""#, None).unwrap();
    let text: Vec<&str> = match &expr {
        Expression::String { parts, .. } => parts
            .iter()
            .filter_map(|part| match part {
                StringPart::Text(text) => Some(text.as_str()),
                StringPart::Placeholder(_) => None,
            })
            .collect(),
        other => panic!("Expected string, got {:?}", other),
    };
    assert_eq!(text, vec![r"a\nb ", " c"]);
}

#[test]
fn errors_carry_document_identity() {
    let source = "version 1.0\nworkflow w {\n  Int x = y.left\n  Int scatter = 1\n}\n";
    let err = parse(source).unwrap_err();
    assert!(matches!(err, WdlError::Syntax { .. }));
    assert_eq!(err.message(), "unexpected keyword scatter");
    assert_eq!(err.pos().line, 4);
    assert_eq!(err.pos().uri, "main.wdl");
    assert_eq!(err.pos().abspath, "/data/main.wdl");
    assert_eq!(err.wdl_version(), Some("1.0"));
}
