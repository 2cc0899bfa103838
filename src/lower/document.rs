//! Lowering of declarations, tasks, workflows, structs, imports and whole
//! documents.
//!
//! The [`DocLowerer`] owns an [`ExprLowerer`] with the dialect's keyword set
//! switched on and hands every embedded expression to it.

use super::expr::ExprLowerer;
use crate::error::{ParseResult, SourcePosition, WdlError};
use crate::expr::{Expression, TaskCommand};
use crate::parser::cst::{CommentToken, ConcreteChild, ConcreteNode, Meta, Rule, TokenKind};
use crate::parser::keywords::KeywordSet;
use crate::tree::{
    Call, Conditional, Declaration, DocImport, Document, Scatter, SourceComment, StructTypeDef,
    Task, Workflow, WorkflowElement,
};
use crate::types::Type;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap());

/// Dialects in which `Directory` is not an atomic type
const NO_DIRECTORY: &[&str] = &["draft-2", "1.0", "1.1"];

/// Dialects whose call input blocks must start with `input:`
const INPUT_MARKER_REQUIRED: &[&str] = &["1.1", "1.2", "development"];

type MetaMap = IndexMap<String, Value>;

/// Sections a task may declare at most once
#[derive(Default)]
struct TaskSections {
    inputs: Option<Vec<Declaration>>,
    command: Option<TaskCommand>,
    outputs: Option<Vec<Declaration>>,
    runtime: Option<IndexMap<String, Expression>>,
    meta: Option<MetaMap>,
    parameter_meta: Option<MetaMap>,
}

/// Store `value` in an empty slot; `false` if the slot was already taken
fn fill<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// Lowering context for one document-level parse
#[derive(Debug, Clone, Copy)]
pub struct DocLowerer<'a> {
    expr: ExprLowerer<'a>,
    keywords: &'a KeywordSet,
}

impl<'a> DocLowerer<'a> {
    pub fn new(expr: ExprLowerer<'a>, keywords: &'a KeywordSet) -> Self {
        Self {
            expr: expr.with_keywords(keywords),
            keywords,
        }
    }

    fn sp(&self, node: &ConcreteNode) -> SourcePosition {
        self.expr.sp(node.meta)
    }

    fn word(&self, node: &ConcreteNode, index: usize) -> ParseResult<String> {
        Ok(self.expr.token_at(node, index)?.text.clone())
    }

    fn child_nodes<'n>(
        &self,
        node: &'n ConcreteNode,
        skip: usize,
    ) -> ParseResult<Vec<&'n ConcreteNode>> {
        node.children
            .iter()
            .skip(skip)
            .map(|child| match child {
                ConcreteChild::Node(child) => Ok(child),
                ConcreteChild::Token(_) => Err(self.expr.malformed(node)),
            })
            .collect()
    }

    fn expect_rule(&self, node: &ConcreteNode, rule: Rule) -> ParseResult<()> {
        if node.rule == rule {
            Ok(())
        } else {
            Err(self.expr.malformed(node))
        }
    }

    /// Lower a type node: name, parameters, then an optional quantifier
    pub fn lower_type(&self, node: &ConcreteNode) -> ParseResult<Type> {
        self.expect_rule(node, Rule::Type)?;
        let pos = self.sp(node);
        let name = self.word(node, 0)?;

        let mut optional = false;
        let mut nonempty = false;
        let mut params = Vec::new();
        for child in &node.children[1..] {
            match child {
                ConcreteChild::Node(param) => params.push(self.lower_type(param)?),
                ConcreteChild::Token(quantifier) if quantifier.kind == TokenKind::Symbol => {
                    match quantifier.text.as_str() {
                        "?" => optional = true,
                        "+" => nonempty = true,
                        "+?" | "?+" => {
                            optional = true;
                            nonempty = true;
                        }
                        _ => {
                            return Err(WdlError::validation_error(
                                pos,
                                format!("invalid type quantifier(s) for {}", name),
                            ))
                        }
                    }
                }
                ConcreteChild::Token(_) => return Err(self.expr.malformed(node)),
            }
        }

        if name == "Array" {
            let mut params = params.into_iter();
            return match (params.next(), params.next()) {
                (Some(item), None) => Ok(Type::array(item, optional, nonempty)),
                _ => Err(WdlError::invalid_type(
                    pos,
                    "Array must have one type parameter".to_string(),
                )),
            };
        }
        if nonempty {
            return Err(WdlError::invalid_type(
                pos,
                format!("invalid type quantifier(s) for {}", name),
            ));
        }

        let atomic = match name.as_str() {
            "Int" => Some(Type::int(optional)),
            "Float" => Some(Type::float(optional)),
            "Boolean" => Some(Type::boolean(optional)),
            "String" => Some(Type::string(optional)),
            "File" => Some(Type::file(optional)),
            "Directory" if !NO_DIRECTORY.contains(&self.expr.version()) => {
                Some(Type::directory(optional))
            }
            _ => None,
        };
        if let Some(atomic) = atomic {
            if !params.is_empty() {
                return Err(WdlError::invalid_type(
                    pos,
                    format!("{} type doesn't accept parameters", name),
                ));
            }
            return Ok(atomic);
        }

        if name == "Map" || name == "Pair" {
            let mut two = params.into_iter();
            return match (two.next(), two.next(), two.next()) {
                (Some(first), Some(second), None) if name == "Map" => {
                    Ok(Type::map(first, second, optional))
                }
                (Some(first), Some(second), None) => Ok(Type::pair(first, second, optional)),
                _ => Err(WdlError::invalid_type(
                    pos,
                    format!("{} must have two type parameters", name),
                )),
            };
        }
        if !params.is_empty() {
            return Err(WdlError::invalid_type(
                pos,
                "Unexpected type parameter(s)".to_string(),
            ));
        }
        Ok(Type::struct_instance(name, optional))
    }

    /// Lower a bound or unbound declaration, honouring a leading `env` marker
    pub fn lower_decl(&self, node: &ConcreteNode) -> ParseResult<Declaration> {
        if !matches!(node.rule, Rule::BoundDecl | Rule::UnboundDecl) {
            return Err(self.expr.malformed(node));
        }
        let pos = self.sp(node);
        let env = matches!(
            node.children.first(),
            Some(ConcreteChild::Token(token)) if token.text == "env"
        );
        let base = usize::from(env);

        let decl_type = self.lower_type(self.expr.node_at(node, base)?)?;
        let name = self.word(node, base + 1)?;
        self.expr.check_keyword(&pos, &name)?;
        let expr = match node.children.get(base + 2) {
            Some(ConcreteChild::Node(expr)) => Some(self.expr.lower(expr)?),
            Some(ConcreteChild::Token(_)) => return Err(self.expr.malformed(node)),
            None => None,
        };

        let decl = Declaration::new(pos, decl_type, name, expr);
        Ok(if env { decl.with_env() } else { decl })
    }

    fn lower_decls(&self, node: &ConcreteNode) -> ParseResult<Vec<Declaration>> {
        self.child_nodes(node, 0)?
            .into_iter()
            .map(|decl| self.lower_decl(decl))
            .collect()
    }

    fn lower_meta_value(&self, node: &ConcreteNode) -> ParseResult<Value> {
        match node.rule {
            Rule::StringLiteral => Ok(Value::String(self.expr.lower_string_literal(node)?)),
            Rule::Int | Rule::Float => match self.expr.lower(node)? {
                Expression::Int { value, .. } => Ok(Value::from(value)),
                Expression::Float { value, .. } => serde_json::Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| self.expr.malformed(node)),
                _ => Err(self.expr.malformed(node)),
            },
            Rule::BooleanTrue => Ok(Value::Bool(true)),
            Rule::BooleanFalse => Ok(Value::Bool(false)),
            Rule::Null => Ok(Value::Null),
            Rule::MetaObject => Ok(Value::Object(self.lower_meta_object(node)?.into_iter().collect())),
            Rule::MetaArray => Ok(Value::Array(
                self.child_nodes(node, 0)?
                    .into_iter()
                    .map(|item| self.lower_meta_value(item))
                    .collect::<ParseResult<_>>()?,
            )),
            _ => Err(self.expr.malformed(node)),
        }
    }

    fn lower_meta_object(&self, node: &ConcreteNode) -> ParseResult<MetaMap> {
        self.expect_rule(node, Rule::MetaObject)?;
        let mut map = MetaMap::new();
        for kv in self.child_nodes(node, 0)? {
            self.expect_rule(kv, Rule::MetaKv)?;
            let key = self.word(kv, 0)?;
            let value = self.lower_meta_value(self.expr.node_at(kv, 1)?)?;
            if map.insert(key, value).is_some() {
                return Err(WdlError::multiple_definitions(
                    self.sp(node),
                    "duplicate keys in meta object".to_string(),
                ));
            }
        }
        Ok(map)
    }

    /// Lower a runtime section. Repeated keys are allowed; the last one wins.
    fn lower_runtime(&self, node: &ConcreteNode) -> ParseResult<IndexMap<String, Expression>> {
        let mut runtime = IndexMap::new();
        for kv in self.child_nodes(node, 0)? {
            self.expect_rule(kv, Rule::RuntimeKv)?;
            let key = self.word(kv, 0)?;
            let value = self.expr.lower(self.expr.node_at(kv, 1)?)?;
            runtime.insert(key, value);
        }
        Ok(runtime)
    }

    fn lower_command(&self, node: &ConcreteNode) -> ParseResult<TaskCommand> {
        let parts = self.expr.lower_parts(node.children.iter(), None)?;
        Ok(TaskCommand::new(self.sp(node), parts))
    }

    /// Lower a task definition
    pub fn lower_task(&self, node: &ConcreteNode) -> ParseResult<Task> {
        self.expect_rule(node, Rule::Task)?;
        let pos = self.sp(node);
        let name = self.word(node, 0)?;
        let redundant = || {
            WdlError::multiple_definitions(pos.clone(), "redundant sections in task".to_string())
        };

        let mut sections = TaskSections::default();
        let mut postinputs = Vec::new();
        for element in self.child_nodes(node, 1)? {
            let unique = match element.rule {
                Rule::NoninputDecl => {
                    postinputs.push(self.lower_decl(self.expr.node_at(element, 0)?)?);
                    true
                }
                Rule::InputDecls => fill(&mut sections.inputs, self.lower_decls(element)?),
                Rule::OutputDecls => fill(&mut sections.outputs, self.lower_decls(element)?),
                Rule::Command => fill(&mut sections.command, self.lower_command(element)?),
                Rule::RuntimeSection => fill(&mut sections.runtime, self.lower_runtime(element)?),
                Rule::MetaSection => {
                    let kind = self.word(element, 0)?;
                    let object = self.lower_meta_object(self.expr.node_at(element, 1)?)?;
                    if kind == "meta" {
                        fill(&mut sections.meta, object)
                    } else {
                        fill(&mut sections.parameter_meta, object)
                    }
                }
                _ => return Err(self.expr.malformed(element)),
            };
            if !unique {
                return Err(redundant());
            }
        }
        self.expr.check_keyword(&pos, &name)?;

        let command = sections.command.ok_or_else(|| self.expr.malformed(node))?;
        Ok(Task::new(
            pos,
            name,
            sections.inputs.unwrap_or_default(),
            postinputs,
            command,
            sections.outputs.unwrap_or_default(),
            sections.parameter_meta.unwrap_or_default(),
            sections.runtime.unwrap_or_default(),
            sections.meta.unwrap_or_default(),
        ))
    }

    /// Lower the top node of a task-list parse
    pub fn lower_tasks(&self, node: &ConcreteNode) -> ParseResult<Vec<Task>> {
        self.expect_rule(node, Rule::Tasks)?;
        self.child_nodes(node, 0)?
            .into_iter()
            .map(|task| self.lower_task(task))
            .collect()
    }

    /// Lower the top node of a bound declaration parse
    pub fn lower_bound_decl(&self, node: &ConcreteNode) -> ParseResult<Declaration> {
        self.expect_rule(node, Rule::BoundDecl)?;
        self.lower_decl(node)
    }

    fn lower_call_inputs(&self, node: &ConcreteNode) -> ParseResult<IndexMap<String, Expression>> {
        let pos = self.sp(node);
        let mut entries = self.child_nodes(node, 0)?;
        let marked = entries.first().map(|first| first.rule) == Some(Rule::InputColon);
        if marked {
            entries.remove(0);
        }
        if !entries.is_empty() && !marked && INPUT_MARKER_REQUIRED.contains(&self.expr.version()) {
            return Err(self.expr.syntax_error(
                pos,
                format!("WDL {} calls require input: keyword", self.expr.version()),
            ));
        }

        let mut inputs = IndexMap::new();
        for entry in entries {
            self.expect_rule(entry, Rule::CallInput)?;
            let key = self.word(entry, 0)?;
            let value = match entry.children.get(1) {
                Some(ConcreteChild::Node(expr)) => self.expr.lower(expr)?,
                Some(ConcreteChild::Token(_)) => return Err(self.expr.malformed(entry)),
                None => Expression::ident(self.sp(entry), key.clone()),
            };
            if inputs.contains_key(&key) {
                return Err(WdlError::multiple_definitions(
                    pos,
                    format!("duplicate call input '{}'", key),
                ));
            }
            inputs.insert(key, value);
        }
        Ok(inputs)
    }

    fn lower_call(&self, node: &ConcreteNode) -> ParseResult<Call> {
        let pos = self.sp(node);
        let mut callee = Vec::new();
        let mut alias = None;
        let mut afters = Vec::new();
        let mut inputs = IndexMap::new();

        for child in self.child_nodes(node, 0)? {
            match child.rule {
                Rule::NamespacedIdent => {
                    callee = (0..child.children.len())
                        .map(|i| self.word(child, i))
                        .collect::<ParseResult<_>>()?;
                }
                Rule::CallAlias => {
                    let name = self.word(child, 0)?;
                    self.expr.check_keyword(&pos, &name)?;
                    alias = Some(name);
                }
                Rule::CallAfter => afters.push(self.word(child, 0)?),
                Rule::CallInputs => inputs = self.lower_call_inputs(child)?,
                _ => return Err(self.expr.malformed(node)),
            }
        }
        Ok(Call::new(pos, callee, alias, inputs, afters))
    }

    fn lower_workflow_element(&self, node: &ConcreteNode) -> ParseResult<WorkflowElement> {
        match node.rule {
            Rule::BoundDecl | Rule::UnboundDecl => {
                Ok(WorkflowElement::Declaration(self.lower_decl(node)?))
            }
            Rule::Call => Ok(WorkflowElement::Call(self.lower_call(node)?)),
            Rule::Scatter => {
                let pos = self.sp(node);
                let variable = self.word(node, 0)?;
                self.expr.check_keyword(&pos, &variable)?;
                let expr = self.expr.lower(self.expr.node_at(node, 1)?)?;
                let body = self.lower_body(node, 2)?;
                Ok(WorkflowElement::Scatter(Box::new(Scatter::new(
                    pos, variable, expr, body,
                ))))
            }
            Rule::Conditional => {
                let expr = self.expr.lower(self.expr.node_at(node, 0)?)?;
                let body = self.lower_body(node, 1)?;
                Ok(WorkflowElement::Conditional(Box::new(Conditional::new(
                    self.sp(node),
                    expr,
                    body,
                ))))
            }
            _ => Err(self.expr.malformed(node)),
        }
    }

    fn lower_body(&self, node: &ConcreteNode, skip: usize) -> ParseResult<Vec<WorkflowElement>> {
        self.child_nodes(node, skip)?
            .into_iter()
            .map(|element| self.lower_workflow_element(element))
            .collect()
    }

    /// Lower an output section into declarations plus legacy identifier paths
    fn lower_workflow_outputs(
        &self,
        node: &ConcreteNode,
    ) -> ParseResult<(Vec<Declaration>, Vec<Vec<String>>)> {
        let mut decls = Vec::new();
        let mut idents = Vec::new();
        for entry in self.child_nodes(node, 0)? {
            if entry.rule == Rule::OutputIdent {
                let path = entry
                    .children
                    .iter()
                    .map(|child| match child {
                        ConcreteChild::Token(token) => Ok(token.text.clone()),
                        ConcreteChild::Node(_) => Err(self.expr.malformed(entry)),
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                idents.push(path);
            } else {
                decls.push(self.lower_decl(entry)?);
            }
        }
        Ok((decls, idents))
    }

    /// Lower a workflow definition
    pub fn lower_workflow(&self, node: &ConcreteNode) -> ParseResult<Workflow> {
        self.expect_rule(node, Rule::Workflow)?;
        let pos = self.sp(node);
        let name = self.word(node, 0)?;
        let redundant = |what: &str| {
            WdlError::multiple_definitions(
                pos.clone(),
                format!("redundant workflow {} sections", what),
            )
        };

        let mut inputs = None;
        let mut outputs = None;
        let mut output_idents = Vec::new();
        let mut output_idents_pos = None;
        let mut meta = None;
        let mut parameter_meta = None;
        let mut body = Vec::new();

        for element in self.child_nodes(node, 1)? {
            match element.rule {
                Rule::InputDecls => {
                    if !fill(&mut inputs, self.lower_decls(element)?) {
                        return Err(redundant("input"));
                    }
                }
                Rule::WorkflowOutputDecls => {
                    let (decls, idents) = self.lower_workflow_outputs(element)?;
                    if !fill(&mut outputs, decls) {
                        return Err(redundant("output"));
                    }
                    output_idents = idents;
                    output_idents_pos = Some(self.sp(element));
                }
                Rule::MetaSection => {
                    let kind = self.word(element, 0)?;
                    let object = self.lower_meta_object(self.expr.node_at(element, 1)?)?;
                    let slot = if kind == "meta" {
                        &mut meta
                    } else {
                        &mut parameter_meta
                    };
                    if !fill(slot, object) {
                        return Err(redundant(&kind));
                    }
                }
                _ => body.push(self.lower_workflow_element(element)?),
            }
        }
        self.expr.check_keyword(&pos, &name)?;

        Ok(Workflow::new(
            pos,
            name,
            inputs.unwrap_or_default(),
            body,
            outputs.unwrap_or_default(),
            parameter_meta.unwrap_or_default(),
            meta.unwrap_or_default(),
            output_idents,
            output_idents_pos,
        ))
    }

    /// Lower a struct definition
    pub fn lower_struct(&self, node: &ConcreteNode) -> ParseResult<StructTypeDef> {
        self.expect_rule(node, Rule::Struct)?;
        let pos = self.sp(node);
        let name = self.word(node, 0)?;
        self.expr.check_keyword(&pos, &name)?;

        let mut members = IndexMap::new();
        for member in self.child_nodes(node, 1)? {
            let decl = self.lower_decl(member)?;
            if decl.expr.is_some() {
                return Err(self.expr.malformed(member));
            }
            if members.contains_key(&decl.name) {
                return Err(WdlError::multiple_definitions(
                    pos,
                    format!("duplicate struct member '{}'", decl.name),
                ));
            }
            members.insert(decl.name, decl.decl_type);
        }
        Ok(StructTypeDef::new(pos, name, members))
    }

    /// Lower an import, inferring the namespace from the URI when no `as`
    /// clause is given
    pub fn lower_import(&self, node: &ConcreteNode) -> ParseResult<DocImport> {
        self.expect_rule(node, Rule::Import)?;
        let pos = self.sp(node);
        let uri = self
            .expr
            .lower_string_literal(self.expr.node_at(node, 0)?)?;

        let mut namespace = None;
        let mut aliases = Vec::new();
        for child in self.child_nodes(node, 1)? {
            match child.rule {
                Rule::ImportAs => namespace = Some(self.word(child, 0)?),
                Rule::ImportAlias => {
                    let source = self.word(child, 0)?;
                    let local = self.word(child, 1)?;
                    self.expr.check_keyword(&self.sp(child), &local)?;
                    aliases.push((source, local));
                }
                _ => return Err(self.expr.malformed(node)),
            }
        }

        let namespace = namespace.unwrap_or_else(|| infer_namespace(&uri));
        if !NAMESPACE_RE.is_match(&namespace) || self.keywords.contains(namespace.as_str()) {
            return Err(self.expr.syntax_error(
                pos,
                "declare an import namespace that follows WDL name rules and isn't a language \
                 keyword (import \"filename\" as some_namespace)"
                    .to_string(),
            ));
        }
        Ok(DocImport::new(pos, uri, namespace, aliases))
    }

    fn lower_comment(&self, comment: CommentToken) -> SourceComment {
        let pos = self.expr.sp(Meta::new(
            comment.line,
            comment.column,
            comment.end_line.unwrap_or(comment.line),
            comment.end_column.unwrap_or(comment.column),
        ));
        SourceComment {
            pos,
            text: comment.text,
        }
    }

    /// Lower the top node of a document parse
    pub fn lower_document(
        &self,
        node: &ConcreteNode,
        source_text: &str,
        comments: Vec<CommentToken>,
        declared: Option<&str>,
    ) -> ParseResult<Document> {
        self.expect_rule(node, Rule::Document)?;
        let pos = self.sp(node);

        let mut imports = Vec::new();
        let mut structs: IndexMap<String, StructTypeDef> = IndexMap::new();
        let mut tasks = Vec::new();
        let mut workflow = None;

        for item in self.child_nodes(node, 0)? {
            match item.rule {
                Rule::Version => {}
                Rule::Import => imports.push(self.lower_import(item)?),
                Rule::Task => tasks.push(self.lower_task(item)?),
                Rule::Workflow => {
                    if !fill(&mut workflow, self.lower_workflow(item)?) {
                        return Err(WdlError::multiple_definitions(
                            pos,
                            "Document has multiple workflows".to_string(),
                        ));
                    }
                }
                Rule::Struct => {
                    let def = self.lower_struct(item)?;
                    if structs.contains_key(&def.name) {
                        return Err(WdlError::multiple_definitions(
                            pos,
                            format!("multiple structs named {}", def.name),
                        ));
                    }
                    structs.insert(def.name.clone(), def);
                }
                _ => return Err(self.expr.malformed(item)),
            }
        }

        let comments = comments
            .into_iter()
            .map(|comment| self.lower_comment(comment))
            .collect();

        Ok(Document::new(
            source_text.to_string(),
            pos,
            imports,
            structs,
            tasks,
            workflow,
            comments,
            declared.map(str::to_string),
        ))
    }
}

/// Namespace implied by an import URI: the file name up to its first `.`,
/// ignoring any query string
fn infer_namespace(uri: &str) -> String {
    let file = uri.rsplit('/').next().unwrap_or(uri);
    let file = file.split('?').next().unwrap_or(file);
    file.split('.').next().unwrap_or(file).to_string()
}
