//! WDL Abstract Syntax Tree (AST) for documents, tasks, and workflows
//!
//! This module contains the AST representation for WDL documents, including tasks,
//! workflows, declarations, calls, and control flow sections. Nodes are built once
//! by the lowering pass, strictly bottom-up, and are plain owned values afterwards.
//! Constructors perform no validation; that is the lowering pass's job.

use crate::error::SourcePosition;
use crate::expr::{Expression, TaskCommand};
use crate::types::Type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(test)]
mod doc_tests;


/// WDL struct type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructTypeDef {
    pub pos: SourcePosition,
    pub name: String,
    pub members: IndexMap<String, Type>,
}

impl StructTypeDef {
    pub fn new(pos: SourcePosition, name: String, members: IndexMap<String, Type>) -> Self {
        Self { pos, name, members }
    }
}

/// Value declaration within a task, workflow or struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub pos: SourcePosition,
    pub decl_type: Type,
    pub name: String,
    pub expr: Option<Expression>,
    /// Decorations such as `"env": true` for environment-sourced inputs
    pub decor: HashMap<String, serde_json::Value>,
}

impl Declaration {
    pub fn new(
        pos: SourcePosition,
        decl_type: Type,
        name: String,
        expr: Option<Expression>,
    ) -> Self {
        Self {
            pos,
            decl_type,
            name,
            expr,
            decor: HashMap::new(),
        }
    }

    /// Tag the declaration as sourced from the process environment.
    pub fn with_env(mut self) -> Self {
        self.decor
            .insert("env".to_string(), serde_json::Value::Bool(true));
        self
    }

    pub fn is_env(&self) -> bool {
        matches!(self.decor.get("env"), Some(serde_json::Value::Bool(true)))
    }
}

/// WDL Task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub pos: SourcePosition,
    pub name: String,
    pub inputs: Vec<Declaration>,
    /// Non-input declarations, in source order
    pub postinputs: Vec<Declaration>,
    pub command: TaskCommand,
    pub outputs: Vec<Declaration>,
    pub parameter_meta: IndexMap<String, serde_json::Value>,
    pub runtime: IndexMap<String, Expression>,
    pub meta: IndexMap<String, serde_json::Value>,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: SourcePosition,
        name: String,
        inputs: Vec<Declaration>,
        postinputs: Vec<Declaration>,
        command: TaskCommand,
        outputs: Vec<Declaration>,
        parameter_meta: IndexMap<String, serde_json::Value>,
        runtime: IndexMap<String, Expression>,
        meta: IndexMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            pos,
            name,
            inputs,
            postinputs,
            command,
            outputs,
            parameter_meta,
            runtime,
            meta,
        }
    }
}

/// Task or workflow call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub pos: SourcePosition,
    /// Namespaced callee, e.g. `["lib", "align"]` for `call lib.align`
    pub callee: Vec<String>,
    pub alias: Option<String>,
    pub inputs: IndexMap<String, Expression>,
    pub afters: Vec<String>,
}

impl Call {
    pub fn new(
        pos: SourcePosition,
        callee: Vec<String>,
        alias: Option<String>,
        inputs: IndexMap<String, Expression>,
        afters: Vec<String>,
    ) -> Self {
        Self {
            pos,
            callee,
            alias,
            inputs,
            afters,
        }
    }

    /// Name the call is addressable by within the workflow
    pub fn name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.callee.last().map(String::as_str).unwrap_or_default(),
        }
    }
}

/// Workflow body element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowElement {
    Declaration(Declaration),
    Call(Call),
    Scatter(Box<Scatter>),
    Conditional(Box<Conditional>),
}

impl WorkflowElement {
    pub fn pos(&self) -> &SourcePosition {
        match self {
            WorkflowElement::Declaration(decl) => &decl.pos,
            WorkflowElement::Call(call) => &call.pos,
            WorkflowElement::Scatter(scatter) => &scatter.pos,
            WorkflowElement::Conditional(cond) => &cond.pos,
        }
    }
}

/// Scatter section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scatter {
    pub pos: SourcePosition,
    pub variable: String,
    pub expr: Expression,
    pub body: Vec<WorkflowElement>,
}

impl Scatter {
    pub fn new(
        pos: SourcePosition,
        variable: String,
        expr: Expression,
        body: Vec<WorkflowElement>,
    ) -> Self {
        Self {
            pos,
            variable,
            expr,
            body,
        }
    }
}

/// Conditional (`if`) section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub pos: SourcePosition,
    pub expr: Expression,
    pub body: Vec<WorkflowElement>,
}

impl Conditional {
    pub fn new(pos: SourcePosition, expr: Expression, body: Vec<WorkflowElement>) -> Self {
        Self { pos, expr, body }
    }
}

/// WDL Workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub pos: SourcePosition,
    pub name: String,
    pub inputs: Vec<Declaration>,
    pub body: Vec<WorkflowElement>,
    pub outputs: Vec<Declaration>,
    pub parameter_meta: IndexMap<String, serde_json::Value>,
    pub meta: IndexMap<String, serde_json::Value>,
    /// Legacy draft-2 output identifiers, e.g. `call1.*` becomes `["call1", "*"]`
    pub output_idents: Vec<Vec<String>>,
    /// Position of the output section, if there is one
    pub output_idents_pos: Option<SourcePosition>,
}

impl Workflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: SourcePosition,
        name: String,
        inputs: Vec<Declaration>,
        body: Vec<WorkflowElement>,
        outputs: Vec<Declaration>,
        parameter_meta: IndexMap<String, serde_json::Value>,
        meta: IndexMap<String, serde_json::Value>,
        output_idents: Vec<Vec<String>>,
        output_idents_pos: Option<SourcePosition>,
    ) -> Self {
        Self {
            pos,
            name,
            inputs,
            body,
            outputs,
            parameter_meta,
            meta,
            output_idents,
            output_idents_pos,
        }
    }
}

/// Import statement in a WDL document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocImport {
    pub pos: SourcePosition,
    pub uri: String,
    pub namespace: String,
    /// (struct name in imported document, local name) pairs
    pub aliases: Vec<(String, String)>,
    /// Imported document, filled in by whoever loads imports
    pub doc: Option<Box<Document>>,
}

impl DocImport {
    pub fn new(
        pos: SourcePosition,
        uri: String,
        namespace: String,
        aliases: Vec<(String, String)>,
    ) -> Self {
        Self {
            pos,
            uri,
            namespace,
            aliases,
            doc: None,
        }
    }

    pub fn with_document(mut self, doc: Box<Document>) -> Self {
        self.doc = Some(doc);
        self
    }
}

/// Comment preserved from the source text, including its leading `#`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceComment {
    pub pos: SourcePosition,
    pub text: String,
}

/// WDL Document (top-level container)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source_text: String,
    pub pos: SourcePosition,
    pub imports: Vec<DocImport>,
    pub struct_typedefs: IndexMap<String, StructTypeDef>,
    pub tasks: Vec<Task>,
    pub workflow: Option<Workflow>,
    pub comments: Vec<SourceComment>,
    /// Version declared by a `version` statement, if any
    pub wdl_version: Option<String>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_text: String,
        pos: SourcePosition,
        imports: Vec<DocImport>,
        struct_typedefs: IndexMap<String, StructTypeDef>,
        tasks: Vec<Task>,
        workflow: Option<Workflow>,
        comments: Vec<SourceComment>,
        wdl_version: Option<String>,
    ) -> Self {
        Self {
            source_text,
            pos,
            imports,
            struct_typedefs,
            tasks,
            workflow,
            comments,
            wdl_version,
        }
    }

    /// Document with nothing in it, as produced for blank source text
    pub fn empty(source_text: String, pos: SourcePosition) -> Self {
        Self::new(
            source_text,
            pos,
            Vec::new(),
            IndexMap::new(),
            Vec::new(),
            None,
            Vec::new(),
            None,
        )
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }
}
