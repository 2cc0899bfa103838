use flowy_parse::{load_config, save_config, Parser, ParserConfig, WdlError};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn parser_uses_configured_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flowy-parse.toml");
    fs::write(
        &path,
        "default_document_version = \"1.1\"\n\
         default_expression_version = \"1.2\"\n\
         buffer_uri = \"<stdin>\"\n",
    )
    .unwrap();

    let parser = Parser::new(load_config(&path).unwrap());
    assert_eq!(parser.config().default_document_version, "1.1");

    // no version line, so 1.1 rules apply to the call
    let err = parser
        .parse_document("workflow w { call t { x = 1 } }", None, "", "")
        .unwrap_err();
    assert_eq!(err.message(), "WDL 1.1 calls require input: keyword");
    assert_eq!(err.wdl_version(), Some("1.1"));
    assert_eq!(err.declared_wdl_version(), None);

    // multi-line strings are accepted by the configured expression dialect
    assert!(parser.parse_expression("<<<x>>>", None).is_ok());

    let err = parser.parse_expression("1 +", None).unwrap_err();
    assert!(matches!(err, WdlError::Syntax { .. }));
    assert_eq!(err.pos().uri, "<stdin>");
}

#[test]
fn saved_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested.toml");
    let config = ParserConfig {
        default_document_version: "1.0".to_string(),
        ..ParserConfig::default()
    };
    save_config(&path, &config).unwrap();

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, config);
    let doc = Parser::new(loaded)
        .parse_document("workflow w { call t { x = 1 } }", None, "w.wdl", "/w.wdl")
        .unwrap();
    assert!(doc.workflow.is_some());
}
